//! Rust library for bridging IKEA Tradfri smart lighting to home-automation
//! accessory controllers
//!
//! This library discovers a Tradfri gateway on the local network, establishes
//! a secure CoAP-over-DTLS session to it, and translates accessory-level
//! characteristic changes into gateway commands. It supports:
//!
//! - Gateway discovery via mDNS/DNS-SD (`_coap._udp`)
//! - A single shared DTLS session with PSK authentication
//! - Power, brightness, and color temperature control per bulb
//! - Status queries decoding the gateway's numeric-keyed JSON
//! - One change-callback handler per bulb for the accessory layer
//!
//! # Quick Start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::time::Duration;
//! use tradfri_bridge::{Bridge, BridgeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut bulbs = BTreeMap::new();
//!     bulbs.insert("Floor Lamp".to_string(), "65538".to_string());
//!     bulbs.insert("Bedside Lamp".to_string(), "65537".to_string());
//!
//!     // Reads the gateway's pre-shared key from TRADFRI_PSK
//!     let config = BridgeConfig::from_env("Testlamp Bridge", "12344321", bulbs)?;
//!     let bridge = Bridge::assemble(config, Some(Duration::from_secs(60))).await?;
//!
//!     // The accessory layer invokes these callbacks on characteristic
//!     // changes; drive one directly here.
//!     let handler = bridge.handler("Floor Lamp")?;
//!     handler.on_power(true).await;
//!
//!     tokio::signal::ctrl_c().await?;
//!     bridge.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Direct Connection
//!
//! If you know the gateway's address, you can skip discovery:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tradfri_bridge::{Bulb, HubAddress, HubSession, CLIENT_IDENTITY};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let address = HubAddress {
//!         ip: "192.168.1.2".parse()?,
//!         port: 5684,
//!     };
//!     let session = HubSession::connect(&address, CLIENT_IDENTITY, "the-psk").await?;
//!     let bulb = Bulb::new(Arc::new(session), "Floor Lamp", "65538");
//!     bulb.set_brightness(80).await?;
//!     println!("on: {}", bulb.status().await?.is_on());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Discovery**: mDNS browsing for the gateway's `_coap._udp` service
//! - **Session**: shared CoAP-over-DTLS connection, one exchange at a time
//! - **Protocol**: translation between semantic commands and the gateway's
//!   numeric-keyed JSON payloads
//! - **Bulb**: per-bulb control API over the shared session
//! - **Handler**: change-callback surface the accessory layer invokes
//! - **Bridge**: configuration and assembly of the above

mod bridge;
mod bulb;
mod discovery;
mod error;
mod handler;
mod protocol;
mod session;
mod transport;

// Public exports
pub use bridge::{Bridge, BridgeConfig, PSK_ENV};
pub use bulb::Bulb;
pub use discovery::{HubAddress, HubLocator, COAP_SERVICE_TYPE};
pub use error::{Result, TradfriError};
pub use handler::{BulbHandler, CharacteristicEvent};
pub use protocol::{
    decode_status, encode_brightness, encode_power, encode_temperature, resource_path,
    BulbCommand, BulbId, HubPayload, HubStatusResponse, LightStatus, COLOR_COOL, COLOR_NEUTRAL,
    COLOR_WARM,
};
pub use session::{HubSession, CLIENT_IDENTITY};
pub use transport::{CoapTransport, DtlsTransport};
