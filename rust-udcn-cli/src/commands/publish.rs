//! Data publishing command implementation for µDCN CLI

use anyhow::{Context, Result};
use bytes::Bytes;
use log::info;
use rust_udcn_common::ndn::{Data, Name};
use rust_udcn_face::{ConnectionInfo, Face};

/// Publish a single Data packet and keep the face open to answer matching
/// Interests under the same name via a registered prefix.
pub async fn publish_data(
    connection_info: ConnectionInfo,
    name_str: String,
    content: String,
    freshness_ms: u32,
) -> Result<()> {
    info!(
        "Publishing data: name={}, content_len={}, freshness={}ms",
        name_str,
        content.len(),
        freshness_ms
    );

    let name = Name::from_string(&name_str);
    let mut data = Data::new(name.clone(), Bytes::from(content.clone()));
    data.meta_info.freshness_period_ms = Some(freshness_ms);

    println!("Connecting to {}...", connection_info);
    let face = Face::spawn(connection_info);

    face.put_data(data).await.context("putData failed")?;

    println!("Published Data:");
    println!("  Name: {}", name_str);
    println!(
        "  Content: {}",
        if content.len() > 32 {
            format!("{}...", &content[..32])
        } else {
            content
        }
    );
    println!("  Freshness: {}ms", freshness_ms);

    face.close().await;
    Ok(())
}
