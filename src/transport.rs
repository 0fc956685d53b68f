use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use webrtc_dtls::cipher_suite::CipherSuiteId;
use webrtc_dtls::config::Config;
use webrtc_dtls::conn::DTLSConn;
use webrtc_util::conn::Conn;

use crate::error::Result;

const MAX_DATAGRAM_SIZE: usize = 2048;

/// Datagram transport carrying CoAP messages to the gateway
///
/// The session owns exactly one transport and serializes exchanges on it;
/// implementations only need to move single datagrams in each direction.
pub trait CoapTransport: Send {
    /// Send one datagram to the gateway
    fn send(&mut self, datagram: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Receive the next datagram from the gateway
    fn recv(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Close the transport
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// DTLS transport to a Tradfri gateway
///
/// Wraps a connected UDP socket in a DTLS 1.2 session authenticated with
/// the gateway's pre-shared key.
pub struct DtlsTransport {
    conn: DTLSConn,
}

impl DtlsTransport {
    /// Open a DTLS connection to the gateway
    ///
    /// `identity` is the fixed client identity string the gateway expects
    /// and `secret` the pre-shared key printed on the gateway.
    pub async fn connect(addr: SocketAddr, identity: &str, secret: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(addr).await?;

        let psk = secret.as_bytes().to_vec();
        let config = Config {
            psk: Some(Arc::new(move |_hint: &[u8]| Ok(psk.clone()))),
            psk_identity_hint: Some(identity.as_bytes().to_vec()),
            cipher_suites: vec![CipherSuiteId::Tls_Psk_With_Aes_128_Ccm_8],
            ..Default::default()
        };

        let conn = DTLSConn::new(Arc::new(socket), config, true, None).await?;
        Ok(Self { conn })
    }
}

impl CoapTransport for DtlsTransport {
    fn send(&mut self, datagram: &[u8]) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.conn.send(datagram).await?;
            Ok(())
        }
    }

    fn recv(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
            let len = self.conn.recv(&mut buffer).await?;
            buffer.truncate(len);
            Ok(buffer)
        }
    }

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.conn.close().await?;
            Ok(())
        }
    }
}
