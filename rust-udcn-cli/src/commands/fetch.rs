//! Segment-fetch command implementation for µDCN CLI

use crate::utils::{format_bytes, Timer};
use anyhow::{Context, Result};
use log::info;
use rust_udcn_common::ndn::Name;
use rust_udcn_face::{ConnectionInfo, Face, SegmentFetcher};
use std::sync::Arc;

/// Fetches every segment of the object under `prefix`, whose version is
/// discovered on the wire, and reports the assembled size.
pub async fn fetch_object(connection_info: ConnectionInfo, prefix_str: String) -> Result<()> {
    info!("Fetching object under {}", prefix_str);

    let prefix = Name::from_string(&prefix_str);
    println!("Connecting to {}...", connection_info);
    let face = Face::spawn(connection_info);

    // No application-level verification backend is wired up here; accept
    // every segment as-is.
    let fetcher = SegmentFetcher::new(face.clone(), Arc::new(|_| true));

    let timer = Timer::new("segment fetch");
    let content = fetcher.fetch(prefix).await.context("fetch failed")?;
    let elapsed = timer.elapsed_str();

    println!("Fetched {} in {}", format_bytes(content.len()), elapsed);

    face.close().await;
    Ok(())
}
