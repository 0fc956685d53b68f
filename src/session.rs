use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;

use coap_lite::{CoapRequest, MessageClass, MessageType, Packet, RequestType, ResponseType};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::discovery::HubAddress;
use crate::error::{Result, TradfriError};
use crate::transport::{CoapTransport, DtlsTransport};

/// Fixed client identity string the gateway expects during the PSK handshake
pub const CLIENT_IDENTITY: &str = "Client_identity";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Secure session to a Tradfri gateway
///
/// The session owns the connection to the gateway exclusively and is shared
/// by all bulb controllers. The gateway speaks one request/response exchange
/// at a time over the connection, so the transport sits behind a mutex that
/// is held for the whole exchange; concurrent `get`/`put` calls from
/// different bulbs serialize and never interleave datagrams on the wire.
pub struct HubSession<T = DtlsTransport> {
    host: String,
    transport: Mutex<T>,
    message_id: AtomicU16,
    closed: AtomicBool,
}

impl HubSession<DtlsTransport> {
    /// Connect to the gateway and complete the DTLS handshake
    ///
    /// Called once per process lifetime; all bulb controllers share the
    /// resulting session.
    pub async fn connect(address: &HubAddress, identity: &str, secret: &str) -> Result<Self> {
        let host = address.to_string();
        tracing::info!("Connecting to gateway on {}...", host);

        let transport = DtlsTransport::connect(address.socket_addr(), identity, secret).await?;
        Ok(Self::with_transport(transport, host))
    }
}

impl<T: CoapTransport> HubSession<T> {
    /// Create a session over an already-established transport
    pub fn with_transport(transport: T, host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            transport: Mutex::new(transport),
            message_id: AtomicU16::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// The gateway host this session is connected to, as `ip:port`
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Fetch a resource with a confirmable GET
    ///
    /// Returns the response payload on a success code.
    pub async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let request = self.build_request(RequestType::Get, path, Vec::new());
        let response = self.exchange(request).await?;
        Ok(response.payload)
    }

    /// Mutate a resource with a confirmable PUT
    ///
    /// Failures are reported to the caller and not retried here; a dropped
    /// lighting command is superseded by the next one.
    pub async fn put(&self, path: &str, body: Vec<u8>) -> Result<()> {
        let request = self.build_request(RequestType::Put, path, body);
        self.exchange(request).await?;
        Ok(())
    }

    /// Close the connection; subsequent requests fail with `ConnectionClosed`
    pub async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let mut transport = self.transport.lock().await;
        transport.close().await
    }

    fn build_request(&self, method: RequestType, path: &str, body: Vec<u8>) -> Packet {
        let mut request: CoapRequest<SocketAddr> = CoapRequest::new();
        request.set_method(method);
        request.set_path(path);

        let id = self.message_id.fetch_add(1, Ordering::Relaxed);
        let mut message = request.message;
        message.header.message_id = id;
        message.header.set_type(MessageType::Confirmable);
        message.set_token(id.to_be_bytes().to_vec());
        message.payload = body;
        message
    }

    async fn exchange(&self, request: Packet) -> Result<Packet> {
        let datagram = request.to_bytes()?;

        // Held across the whole request/response pair.
        let mut transport = self.transport.lock().await;

        // Checked under the lock: a close racing this request settles before
        // the lock is granted.
        if self.closed.load(Ordering::SeqCst) {
            return Err(TradfriError::ConnectionClosed);
        }

        let response = timeout(REQUEST_TIMEOUT, async {
            tracing::debug!("Sending mid {} to {}", request.header.message_id, self.host);
            transport.send(&datagram).await?;
            loop {
                let incoming = transport.recv().await?;
                match Packet::from_bytes(&incoming) {
                    Ok(packet) if packet.get_token() == request.get_token() => {
                        return Ok::<_, TradfriError>(packet)
                    }
                    Ok(packet) => tracing::debug!(
                        "Discarding response with unexpected token (mid {})",
                        packet.header.message_id
                    ),
                    Err(e) => tracing::debug!("Discarding undecodable datagram: {}", e),
                }
            }
        })
        .await
        .map_err(|_| TradfriError::Timeout)??;

        check_status(&response)?;
        Ok(response)
    }
}

fn check_status(response: &Packet) -> Result<()> {
    match response.header.code {
        MessageClass::Response(
            ResponseType::Created
            | ResponseType::Deleted
            | ResponseType::Valid
            | ResponseType::Changed
            | ResponseType::Content,
        ) => Ok(()),
        code => Err(TradfriError::Request {
            detail: format!("{:?} for mid {}", code, response.header.message_id),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::MockTransport;
    use std::sync::Arc;

    fn session(transport: MockTransport) -> HubSession<MockTransport> {
        HubSession::with_transport(transport, "192.168.1.2:5684")
    }

    #[tokio::test]
    async fn get_returns_response_payload() {
        let transport = MockTransport::new().status_payload(b"{\"9001\":\"Lamp\"}");
        let session = session(transport);

        let payload = session.get("/15001/65538").await.unwrap();
        assert_eq!(payload, b"{\"9001\":\"Lamp\"}");
    }

    #[tokio::test]
    async fn put_sends_body_to_requested_path() {
        let transport = MockTransport::new();
        let log = transport.log();
        let session = session(transport);

        session
            .put("/15001/65538", b"{\"3311\":[{\"5850\":1}]}".to_vec())
            .await
            .unwrap();

        assert_eq!(log.paths(), vec!["/15001/65538".to_string()]);
        assert_eq!(
            log.bodies_for("/15001/65538"),
            vec![b"{\"3311\":[{\"5850\":1}]}".to_vec()],
        );
    }

    #[tokio::test]
    async fn error_response_surfaces_as_request_error() {
        let transport = MockTransport::new().fail_path("/15001/65538");
        let session = session(transport);

        let err = session.put("/15001/65538", Vec::new()).await.unwrap_err();
        assert!(matches!(err, TradfriError::Request { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn concurrent_requests_never_interleave_on_the_wire() {
        let transport = MockTransport::new();
        let log = transport.log();
        let session = Arc::new(session(transport));

        let a = session.put("/15001/65538", b"{\"3311\":[{\"5850\":1}]}".to_vec());
        let b = session.put("/15001/65537", b"{\"3311\":[{\"5851\":50}]}".to_vec());
        let (ra, rb) = tokio::join!(a, b);

        ra.unwrap();
        rb.unwrap();
        assert!(!log.overlapped(), "exchanges interleaved on the wire");
        assert_eq!(log.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_connection_times_out() {
        let transport = MockTransport::new().unresponsive();
        let session = session(transport);

        let err = session.get("/15001/65538").await.unwrap_err();
        assert!(matches!(err, TradfriError::Timeout), "got {:?}", err);
    }

    #[tokio::test]
    async fn close_racing_a_request_yields_connection_closed() {
        let transport = MockTransport::new();
        let session = Arc::new(session(transport));

        // The close settles first; the request must observe it once it
        // acquires the transport, not fall through onto a dead connection.
        let (closed, requested) = tokio::join!(
            session.close(),
            session.put("/15001/65538", b"{\"3311\":[{\"5850\":1}]}".to_vec()),
        );

        closed.unwrap();
        let err = requested.unwrap_err();
        assert!(matches!(err, TradfriError::ConnectionClosed), "got {:?}", err);
    }

    #[tokio::test]
    async fn closed_session_rejects_requests() {
        let transport = MockTransport::new();
        let session = session(transport);

        session.close().await.unwrap();
        let err = session.get("/15001/65538").await.unwrap_err();
        assert!(matches!(err, TradfriError::ConnectionClosed), "got {:?}", err);
    }
}
