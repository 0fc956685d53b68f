use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, TradfriError>;

/// Errors that can occur when interacting with a Tradfri gateway
#[derive(Error, Debug)]
pub enum TradfriError {
    /// Discovery finished without finding a gateway
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// The mDNS browser could not be started
    #[error("mDNS error: {0}")]
    Mdns(#[from] mdns_sd::Error),

    /// The DTLS handshake with the gateway failed (wrong secret,
    /// unreachable host, protocol mismatch)
    #[error("DTLS handshake failed: {0}")]
    Handshake(#[from] webrtc_dtls::Error),

    /// Datagram send/receive failed on an established session
    #[error("transport error: {0}")]
    Transport(#[from] webrtc_util::Error),

    /// The gateway answered with a non-success CoAP code
    #[error("gateway rejected request: {detail}")]
    Request {
        /// Response code and message id reported by the gateway
        detail: String,
    },

    /// Request timed out waiting for the matching response
    #[error("request timeout")]
    Timeout,

    /// Session was used after being closed
    #[error("connection closed")]
    ConnectionClosed,

    /// CoAP message encoding/decoding error
    #[error("CoAP message error: {0}")]
    Coap(#[from] coap_lite::error::MessageError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required configuration value is missing
    #[error("missing configuration: {0}")]
    Config(String),

    /// No bulb with the given name is configured
    #[error("bulb not found: {0}")]
    BulbNotFound(String),
}
