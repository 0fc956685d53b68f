//! Find a Tradfri gateway on the local network and print its address.
//!
//! With `TRADFRI_PSK` set, also opens a session to verify the handshake:
//!
//! ```sh
//! TRADFRI_PSK=the-key-on-the-gateway cargo run --example discover
//! ```

use std::time::Duration;

use tradfri_bridge::{HubLocator, HubSession, CLIENT_IDENTITY};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let locator = HubLocator::new().with_timeout(Duration::from_secs(30));
    let address = locator.locate().await?;
    println!("Found gateway at {}", address);

    if let Ok(secret) = std::env::var("TRADFRI_PSK") {
        let session = HubSession::connect(&address, CLIENT_IDENTITY, &secret).await?;
        println!("Handshake complete with {}", session.host());
        session.close().await?;
    } else {
        println!("Set TRADFRI_PSK to also test the DTLS handshake");
    }

    Ok(())
}
