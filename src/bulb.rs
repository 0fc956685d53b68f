use std::sync::Arc;

use crate::error::Result;
use crate::protocol::{decode_status, resource_path, BulbCommand, BulbId, HubStatusResponse};
use crate::session::HubSession;
use crate::transport::{CoapTransport, DtlsTransport};

/// Controller for one physical bulb
///
/// Binds a bulb identifier to the shared gateway session. Controllers share
/// nothing but the session, so a failed command on one bulb cannot affect
/// another bulb's subsequent commands.
pub struct Bulb<T = DtlsTransport> {
    name: String,
    id: BulbId,
    session: Arc<HubSession<T>>,
}

impl<T> Clone for Bulb<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            id: self.id.clone(),
            session: self.session.clone(),
        }
    }
}

impl<T: CoapTransport> Bulb<T> {
    /// Create a controller for the bulb with the given gateway identifier
    pub fn new(
        session: Arc<HubSession<T>>,
        name: impl Into<String>,
        id: impl Into<BulbId>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            session,
        }
    }

    /// Display name of the bulb
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gateway identifier of the bulb
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Turn the bulb on or off
    pub async fn set_power(&self, on: bool) -> Result<()> {
        self.apply(BulbCommand::Power { on }).await
    }

    /// Set the brightness level
    pub async fn set_brightness(&self, level: u8) -> Result<()> {
        self.apply(BulbCommand::Brightness { level }).await
    }

    /// Set the color temperature in mireds
    pub async fn set_temperature(&self, mireds: u16) -> Result<()> {
        self.apply(BulbCommand::Temperature { mireds }).await
    }

    /// Translate a command and send it to the gateway
    pub async fn apply(&self, command: BulbCommand) -> Result<()> {
        let body = serde_json::to_vec(&command.encode())?;
        self.session.put(&resource_path(&self.id), body).await
    }

    /// Query the current bulb state from the gateway
    pub async fn status(&self) -> Result<HubStatusResponse> {
        let payload = self.session.get(&resource_path(&self.id)).await?;
        decode_status(&payload)
    }
}
