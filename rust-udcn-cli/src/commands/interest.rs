//! Interest sending command implementation for µDCN CLI

use crate::utils::Timer;
use anyhow::{Context, Result};
use log::info;
use rust_udcn_common::ndn::{Interest, Name};
use rust_udcn_face::{ConnectionInfo, Face};

/// Send an Interest and print the Data response
pub async fn send_interest(
    connection_info: ConnectionInfo,
    name_str: String,
    lifetime_ms: u32,
) -> Result<()> {
    info!("Sending Interest: name={}, lifetime={}ms", name_str, lifetime_ms);

    let name = Name::from_string(&name_str);
    let mut interest = Interest::new(name);
    interest.set_must_be_fresh(true);
    interest.set_lifetime_ms(lifetime_ms);

    println!("Connecting to {}...", connection_info);
    let face = Face::spawn(connection_info);

    let timer = Timer::new("expressInterest");
    let data = face
        .express_interest(interest)
        .await
        .context("Interest failed")?;
    let rtt = timer.elapsed_str();

    println!("\nReceived Data:");
    println!("  Name: {}", data.name);
    println!("  RTT: {}", rtt);

    let content = data.content;
    if content.len() <= 100 {
        if let Ok(text) = std::str::from_utf8(&content) {
            println!("  Content: {}", text);
        } else {
            println!("  Content: {:?}", content.as_ref());
        }
    } else {
        println!("  Content: {} bytes", content.len());
    }

    face.close().await;
    Ok(())
}
