//! Transport clients for device control. A factory hands out one stream (TCP)
//! or datagram (UDP) client per send so the controllers can be exercised
//! against fakes.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};

use super::cancel::CancelSignal;
use super::error::TransportError;

/// Connection-oriented client. Must be connected before writing.
#[async_trait]
pub trait StreamClient: Send {
    async fn connect(&mut self, address: &str, port: u16) -> Result<(), TransportError>;

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Release the connection. Also happens on drop.
    async fn close(&mut self);
}

/// Connectionless, fire-and-forget client
#[async_trait]
pub trait DatagramClient: Send {
    async fn send_to(&mut self, address: &str, port: u16, data: &[u8])
    -> Result<usize, TransportError>;
}

pub trait TransportFactory: Send + Sync {
    fn create_stream_client(&self) -> Box<dyn StreamClient>;

    fn create_datagram_client(&self) -> Box<dyn DatagramClient>;
}

/// Run a transport future under a timeout, abandoning it if `cancel` fires
pub async fn bounded<T, F>(
    fut: F,
    limit: Duration,
    cancel: &CancelSignal,
) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled),
        result = tokio::time::timeout(limit, fut) => match result {
            Ok(inner) => inner,
            Err(_) => Err(TransportError::Timeout(limit.as_millis() as u64)),
        },
    }
}

/// TCP client backed by tokio
#[derive(Default)]
pub struct TcpStreamClient {
    stream: Option<TcpStream>,
}

#[async_trait]
impl StreamClient for TcpStreamClient {
    async fn connect(&mut self, address: &str, port: u16) -> Result<(), TransportError> {
        let stream = TcpStream::connect((address, port))
            .await
            .map_err(|source| TransportError::Connect {
                address: format!("{}:{}", address, port),
                source,
            })?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "stream client is not connected",
            ))
        })?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}

/// UDP client backed by tokio. Binds an ephemeral local port per send.
#[derive(Default)]
pub struct UdpDatagramClient;

#[async_trait]
impl DatagramClient for UdpDatagramClient {
    async fn send_to(
        &mut self,
        address: &str,
        port: u16,
        data: &[u8],
    ) -> Result<usize, TransportError> {
        let ip: IpAddr = address
            .parse()
            .map_err(|_| TransportError::Resolve(address.to_string()))?;

        let local: SocketAddr = match ip {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local).await?;
        let sent = socket.send_to(data, SocketAddr::new(ip, port)).await?;
        Ok(sent)
    }
}

/// Factory producing real tokio sockets
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTransportFactory;

impl TransportFactory for TokioTransportFactory {
    fn create_stream_client(&self) -> Box<dyn StreamClient> {
        Box::new(TcpStreamClient::default())
    }

    fn create_datagram_client(&self) -> Box<dyn DatagramClient> {
        Box::new(UdpDatagramClient)
    }
}
