use std::fmt;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use mdns_sd::{Receiver, ServiceDaemon, ServiceEvent};

use crate::error::{Result, TradfriError};

/// DNS-SD service type the gateway advertises on the local segment
pub const COAP_SERVICE_TYPE: &str = "_coap._udp.local.";

/// Network address of a discovered gateway
///
/// Produced once by the locator and consumed by session construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl HubAddress {
    /// The address as a socket address for transport construction
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for HubAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Locator for Tradfri gateways on the local network
///
/// Browses for the `_coap._udp` service and resolves the first instance
/// that answers. Multiple gateways on the same segment are not
/// disambiguated; the first responder wins. With no timeout configured,
/// `locate` waits indefinitely for a gateway to appear.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tradfri_bridge::HubLocator;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let locator = HubLocator::new().with_timeout(Duration::from_secs(30));
///     let address = locator.locate().await?;
///     println!("Gateway at {}", address);
///     Ok(())
/// }
/// ```
pub struct HubLocator {
    service_type: String,
    timeout: Option<Duration>,
}

impl HubLocator {
    /// Create a locator for the standard gateway service type, waiting
    /// indefinitely
    pub fn new() -> Self {
        Self {
            service_type: COAP_SERVICE_TYPE.to_string(),
            timeout: None,
        }
    }

    /// Bound the wait for a gateway to appear
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Browse until a gateway is found
    ///
    /// Fails with a discovery error if the browser cannot start or, when a
    /// timeout is configured, if no gateway answers in time.
    pub async fn locate(&self) -> Result<HubAddress> {
        tracing::info!("Browsing for {} on the local network", self.service_type);

        let daemon = ServiceDaemon::new()?;
        let receiver = daemon.browse(&self.service_type)?;

        let result = bounded(self.timeout, wait_for_hub(&receiver)).await;

        let _ = daemon.stop_browse(&self.service_type);
        let _ = daemon.shutdown();
        result
    }
}

impl Default for HubLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Bound the wait for a gateway, mapping expiry to a discovery error
async fn bounded<F>(limit: Option<Duration>, wait: F) -> Result<HubAddress>
where
    F: Future<Output = Result<HubAddress>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, wait).await.unwrap_or_else(|_| {
            Err(TradfriError::Discovery(format!(
                "no gateway answered within {:?}",
                limit
            )))
        }),
        None => wait.await,
    }
}

async fn wait_for_hub(receiver: &Receiver<ServiceEvent>) -> Result<HubAddress> {
    loop {
        let event = receiver
            .recv_async()
            .await
            .map_err(|e| TradfriError::Discovery(e.to_string()))?;

        if let ServiceEvent::ServiceResolved(info) = event {
            let Some(ip) = info.get_addresses().iter().next().copied().map(IpAddr::from)
            else {
                tracing::warn!("Resolved {} without any address", info.get_fullname());
                continue;
            };

            let address = HubAddress {
                ip,
                port: info.get_port(),
            };
            tracing::info!("Found gateway {} at {}", info.get_fullname(), address);
            return Ok(address);
        }
    }
}
