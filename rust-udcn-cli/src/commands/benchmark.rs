//! Pipelined-fetch benchmarking command implementation for µDCN CLI

use crate::utils::{format_bytes, Timer};
use anyhow::{Context, Result};
use log::info;
use rust_udcn_common::ndn::Name;
use rust_udcn_face::pipeline::PipelinedFetcher;
use rust_udcn_face::{ConnectionInfo, Face};

/// Runs the pipelined, congestion-controlled fetcher against `name`
/// (which must already include the object's version component) and
/// reports throughput and window statistics.
pub async fn run_benchmark(connection_info: ConnectionInfo, name_str: String) -> Result<()> {
    info!("Benchmarking pipelined fetch of {}", name_str);

    let name = Name::from_string(&name_str);
    println!("Connecting to {}...", connection_info);
    let face = Face::spawn(connection_info);

    let fetcher = PipelinedFetcher::new(face.clone(), name);

    let timer = Timer::new("pipelined fetch");
    let (segments, stats) = fetcher.run().await.context("pipelined fetch failed")?;
    let elapsed = timer.elapsed_str();

    let total_bytes: usize = segments.iter().map(|d| d.content.len()).sum();

    println!("\nBenchmark Results");
    println!("=================");
    println!("Segments received: {}", segments.len());
    println!("Total size:        {}", format_bytes(total_bytes));
    println!("Elapsed:           {}", elapsed);
    println!("Interests sent:    {}", stats.interest_sent);
    println!("Timeouts:          {}", stats.timed_out);
    println!("Duplicates:        {}", stats.dups);

    face.close().await;
    Ok(())
}
