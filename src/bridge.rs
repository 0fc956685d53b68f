use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bulb::Bulb;
use crate::discovery::HubLocator;
use crate::error::{Result, TradfriError};
use crate::handler::BulbHandler;
use crate::session::{HubSession, CLIENT_IDENTITY};
use crate::transport::{CoapTransport, DtlsTransport};

/// Environment variable holding the gateway's pre-shared key
pub const PSK_ENV: &str = "TRADFRI_PSK";

/// Static bridge configuration
///
/// The bulb table maps display names to gateway identifiers; identifiers
/// are never discovered from the gateway itself. The table is loaded once
/// at startup and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Human-readable bridge name shown to controllers
    pub name: String,

    /// Pairing pin for the accessory transport
    pub pin: String,

    /// Pre-shared key for gateway authentication
    pub secret: String,

    /// Bulb display name to gateway identifier table
    pub bulbs: BTreeMap<String, String>,
}

impl BridgeConfig {
    /// Create a configuration from explicit values
    pub fn new(
        name: impl Into<String>,
        pin: impl Into<String>,
        secret: impl Into<String>,
        bulbs: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            pin: pin.into(),
            secret: secret.into(),
            bulbs,
        }
    }

    /// Create a configuration taking the pre-shared key from `TRADFRI_PSK`
    pub fn from_env(
        name: impl Into<String>,
        pin: impl Into<String>,
        bulbs: BTreeMap<String, String>,
    ) -> Result<Self> {
        let secret = std::env::var(PSK_ENV)
            .map_err(|_| TradfriError::Config(format!("{} is not set", PSK_ENV)))?;
        Ok(Self::new(name, pin, secret, bulbs))
    }
}

/// Assembled bridge: one shared gateway session and one handler per
/// configured bulb
///
/// The accessory layer registers each handler for its bulb's characteristic
/// callbacks; everything else here is wiring.
pub struct Bridge<T = DtlsTransport> {
    config: BridgeConfig,
    session: Arc<HubSession<T>>,
    handlers: Vec<BulbHandler<T>>,
}

impl Bridge<DtlsTransport> {
    /// Discover the gateway, connect the shared session, and build the
    /// bulb handlers
    ///
    /// `discovery_timeout` bounds the wait for a gateway advertisement;
    /// with `None` discovery waits indefinitely.
    pub async fn assemble(
        config: BridgeConfig,
        discovery_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut locator = HubLocator::new();
        if let Some(limit) = discovery_timeout {
            locator = locator.with_timeout(limit);
        }

        let address = locator.locate().await?;
        let session = HubSession::connect(&address, CLIENT_IDENTITY, &config.secret).await?;
        Ok(Self::with_session(config, Arc::new(session)))
    }
}

impl<T: CoapTransport> Bridge<T> {
    /// Build a bridge over an already-connected session
    pub fn with_session(config: BridgeConfig, session: Arc<HubSession<T>>) -> Self {
        let handlers = config
            .bulbs
            .iter()
            .map(|(name, id)| {
                BulbHandler::new(Bulb::new(session.clone(), name.clone(), id.clone()))
            })
            .collect();

        Self {
            config,
            session,
            handlers,
        }
    }

    /// Bridge name shown to controllers
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Pairing pin for the accessory transport
    pub fn pin(&self) -> &str {
        &self.config.pin
    }

    /// The shared gateway session
    pub fn session(&self) -> Arc<HubSession<T>> {
        self.session.clone()
    }

    /// Handlers for all configured bulbs, one per bulb
    pub fn handlers(&self) -> &[BulbHandler<T>] {
        &self.handlers
    }

    /// Look up the handler for a bulb by display name
    pub fn handler(&self, name: &str) -> Result<&BulbHandler<T>> {
        self.handlers
            .iter()
            .find(|h| h.bulb().name() == name)
            .ok_or_else(|| TradfriError::BulbNotFound(name.to_string()))
    }

    /// Close the gateway session for orderly shutdown
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down bridge {}", self.config.name);
        self.session.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::MockTransport;

    fn two_bulb_config() -> BridgeConfig {
        let mut bulbs = BTreeMap::new();
        bulbs.insert("Floor Lamp".to_string(), "65538".to_string());
        bulbs.insert("Bedside Lamp".to_string(), "65537".to_string());
        BridgeConfig::new("Testlamp Bridge", "12344321", "secret", bulbs)
    }

    fn bridge_with(transport: MockTransport) -> Bridge<MockTransport> {
        let session = Arc::new(HubSession::with_transport(transport, "192.168.1.2:5684"));
        Bridge::with_session(two_bulb_config(), session)
    }

    #[tokio::test]
    async fn assembles_one_handler_per_configured_bulb() {
        let bridge = bridge_with(MockTransport::new());

        assert_eq!(bridge.handlers().len(), 2);
        assert_eq!(bridge.handler("Floor Lamp").unwrap().bulb().id(), "65538");
        assert_eq!(bridge.handler("Bedside Lamp").unwrap().bulb().id(), "65537");
        assert!(matches!(
            bridge.handler("Garage Lamp"),
            Err(TradfriError::BulbNotFound(_)),
        ));
    }

    #[tokio::test]
    async fn power_event_reaches_only_the_addressed_bulb() {
        let transport = MockTransport::new();
        let log = transport.log();
        let bridge = bridge_with(transport);

        bridge.handler("Floor Lamp").unwrap().on_power(true).await;

        assert_eq!(log.paths(), vec!["/15001/65538".to_string()]);
        assert_eq!(
            log.bodies_for("/15001/65538"),
            vec![br#"{"3311":[{"5850":1}]}"#.to_vec()],
        );
        assert!(log.bodies_for("/15001/65537").is_empty());
    }

    #[tokio::test]
    async fn shutdown_closes_the_shared_session() {
        let bridge = bridge_with(MockTransport::new());

        bridge.shutdown().await.unwrap();
        let err = bridge.session().get("/15001/65538").await.unwrap_err();
        assert!(matches!(err, TradfriError::ConnectionClosed), "got {:?}", err);
    }

    #[test]
    fn from_env_reads_the_shared_secret() {
        std::env::set_var(PSK_ENV, "hub-psk");
        let config =
            BridgeConfig::from_env("Testlamp Bridge", "12344321", BTreeMap::new()).unwrap();
        assert_eq!(config.secret, "hub-psk");
        std::env::remove_var(PSK_ENV);
    }
}
