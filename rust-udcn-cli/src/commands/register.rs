//! Prefix registration command implementation for µDCN CLI

use anyhow::{Context, Result};
use log::info;
use rust_udcn_common::ndn::Name;
use rust_udcn_face::testing::InMemoryKeychain;
use rust_udcn_face::{ConnectionInfo, Face};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Registers `prefix` with the forwarder and blocks until the forwarder
/// acknowledges (or rejects) the registration.
///
/// No real signing backend is wired into the CLI; this uses the same
/// in-memory keychain the face's own tests use. Talking to a production
/// forwarder requires a real identity and is out of scope for this demo.
pub async fn register_prefix(connection_info: ConnectionInfo, prefix_str: String) -> Result<()> {
    info!("Registering prefix {}", prefix_str);

    let prefix = Name::from_string(&prefix_str);
    println!("Connecting to {}...", connection_info);
    let face = Face::spawn(connection_info);
    face.set_command_signing_info(Arc::new(InMemoryKeychain::new()), "/demo/identity")
        .await;

    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(std::sync::Mutex::new(Some(tx)));
    let tx_success = Arc::clone(&tx);
    let tx_failure = Arc::clone(&tx);

    face.register_prefix(
        prefix.clone(),
        None,
        Box::new(move |name| {
            if let Some(tx) = tx_success.lock().unwrap().take() {
                let _ = tx.send(Ok(name));
            }
        }),
        Box::new(move |name, reason| {
            if let Some(tx) = tx_failure.lock().unwrap().take() {
                let _ = tx.send(Err((name, reason)));
            }
        }),
    )
    .await
    .context("registerPrefix failed")?;

    match rx.await {
        Ok(Ok(name)) => println!("Registered prefix: {}", name),
        Ok(Err((name, reason))) => println!("Registration of {} failed: {:?}", name, reason),
        Err(_) => println!("Registration outcome channel closed unexpectedly"),
    }

    face.close().await;
    Ok(())
}
