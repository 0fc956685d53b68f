use crate::bulb::Bulb;
use crate::transport::{CoapTransport, DtlsTransport};

/// A characteristic change reported by the accessory layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicEvent {
    /// On/off characteristic changed
    Power(bool),
    /// Brightness percentage changed
    Brightness(u8),
    /// Color temperature changed, in mireds
    ColorTemperature(u16),
}

/// Change-callback handler for one bulb
///
/// The accessory layer invokes these callbacks whenever a controller changes
/// a characteristic; it owns the scheduling and may call handlers for
/// different bulbs concurrently. A failed gateway command is logged and
/// swallowed: lighting control is best effort, and a later command
/// supersedes an earlier failed one.
pub struct BulbHandler<T = DtlsTransport> {
    bulb: Bulb<T>,
}

impl<T: CoapTransport> BulbHandler<T> {
    /// Wrap a bulb controller in a callback handler
    pub fn new(bulb: Bulb<T>) -> Self {
        Self { bulb }
    }

    /// The underlying bulb controller
    pub fn bulb(&self) -> &Bulb<T> {
        &self.bulb
    }

    /// Dispatch a characteristic change to the bulb
    pub async fn handle(&self, event: CharacteristicEvent) {
        match event {
            CharacteristicEvent::Power(on) => self.on_power(on).await,
            CharacteristicEvent::Brightness(level) => self.on_brightness(level).await,
            CharacteristicEvent::ColorTemperature(mireds) => {
                self.on_color_temperature(mireds).await
            }
        }
    }

    /// On/off characteristic callback
    pub async fn on_power(&self, on: bool) {
        tracing::info!("Light state for {}: {}", self.bulb.name(), on);
        if let Err(e) = self.bulb.set_power(on).await {
            tracing::warn!("Failed to set power for {}: {}", self.bulb.name(), e);
        }
    }

    /// Brightness characteristic callback
    pub async fn on_brightness(&self, level: u8) {
        tracing::info!("Light brightness for {}: {}", self.bulb.name(), level);
        if let Err(e) = self.bulb.set_brightness(level).await {
            tracing::warn!("Failed to set brightness for {}: {}", self.bulb.name(), e);
        }
    }

    /// Color temperature characteristic callback
    pub async fn on_color_temperature(&self, mireds: u16) {
        tracing::info!("Light temp for {}: {}", self.bulb.name(), mireds);
        if let Err(e) = self.bulb.set_temperature(mireds).await {
            tracing::warn!("Failed to set temperature for {}: {}", self.bulb.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::HubSession;
    use crate::transport::testing::MockTransport;
    use std::sync::Arc;

    fn handler_with(transport: MockTransport) -> BulbHandler<MockTransport> {
        let session = Arc::new(HubSession::with_transport(transport, "192.168.1.2:5684"));
        BulbHandler::new(Bulb::new(session, "Floor Lamp", "65538"))
    }

    #[tokio::test]
    async fn events_dispatch_to_the_matching_command() {
        let transport = MockTransport::new();
        let log = transport.log();
        let handler = handler_with(transport);

        handler.handle(CharacteristicEvent::Power(true)).await;
        handler.handle(CharacteristicEvent::Brightness(80)).await;
        handler
            .handle(CharacteristicEvent::ColorTemperature(350))
            .await;

        assert_eq!(
            log.bodies_for("/15001/65538"),
            vec![
                br#"{"3311":[{"5850":1}]}"#.to_vec(),
                br#"{"3311":[{"5851":80}]}"#.to_vec(),
                br#"{"3311":[{"5706":"efd275"}]}"#.to_vec(),
            ],
        );
    }

    #[tokio::test]
    async fn gateway_failures_are_swallowed() {
        let transport = MockTransport::new().fail_path("/15001/65538");
        let log = transport.log();
        let handler = handler_with(transport);

        // Must not panic or propagate; the command is logged and dropped.
        handler.on_power(true).await;
        assert_eq!(log.request_count(), 1);
    }
}
