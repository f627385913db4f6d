use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::device_control::error::TransportError;
use crate::device_control::transport::{DatagramClient, StreamClient, TransportFactory};

/// How the fake stream client should misbehave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFailure {
    None,
    Refused,
    /// Connect reports a timeout straight away
    Timeout,
    /// Connect never completes
    Hang,
    Write,
}

#[derive(Debug, Default)]
struct Log {
    streams_created: usize,
    streams_closed: usize,
    datagrams_created: usize,
    stream_connects: Vec<(String, u16)>,
    stream_writes: Vec<Vec<u8>>,
    datagram_sends: Vec<(String, u16, Vec<u8>)>,
}

#[derive(Debug)]
struct Script {
    stream_failure: StreamFailure,
    fail_datagrams_containing: Option<String>,
}

/// Recording transport factory for controller tests
#[derive(Clone)]
pub struct FakeTransport {
    log: Arc<Mutex<Log>>,
    script: Arc<Script>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Log::default())),
            script: Arc::new(Script {
                stream_failure: StreamFailure::None,
                fail_datagrams_containing: None,
            }),
        }
    }

    pub fn with_stream_failure(self, failure: StreamFailure) -> Self {
        Self {
            log: self.log,
            script: Arc::new(Script {
                stream_failure: failure,
                fail_datagrams_containing: self.script.fail_datagrams_containing.clone(),
            }),
        }
    }

    /// Make datagram sends whose payload contains `needle` fail
    pub fn fail_datagrams_containing(self, needle: &str) -> Self {
        Self {
            log: self.log,
            script: Arc::new(Script {
                stream_failure: self.script.stream_failure,
                fail_datagrams_containing: Some(needle.to_string()),
            }),
        }
    }

    pub fn factory(&self) -> Arc<dyn TransportFactory> {
        Arc::new(self.clone())
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }

    pub fn factory_calls(&self) -> usize {
        let log = self.log();
        log.streams_created + log.datagrams_created
    }

    pub fn streams_created(&self) -> usize {
        self.log().streams_created
    }

    pub fn streams_closed(&self) -> usize {
        self.log().streams_closed
    }

    pub fn datagrams_created(&self) -> usize {
        self.log().datagrams_created
    }

    pub fn stream_connects(&self) -> Vec<(String, u16)> {
        self.log().stream_connects.clone()
    }

    pub fn stream_writes(&self) -> Vec<Vec<u8>> {
        self.log().stream_writes.clone()
    }

    pub fn datagram_sends(&self) -> Vec<(String, u16, Vec<u8>)> {
        self.log().datagram_sends.clone()
    }
}

impl TransportFactory for FakeTransport {
    fn create_stream_client(&self) -> Box<dyn StreamClient> {
        self.log().streams_created += 1;
        Box::new(FakeStream {
            owner: self.clone(),
            closed: false,
        })
    }

    fn create_datagram_client(&self) -> Box<dyn DatagramClient> {
        self.log().datagrams_created += 1;
        Box::new(FakeDatagram {
            owner: self.clone(),
        })
    }
}

struct FakeStream {
    owner: FakeTransport,
    closed: bool,
}

#[async_trait]
impl StreamClient for FakeStream {
    async fn connect(&mut self, address: &str, port: u16) -> Result<(), TransportError> {
        match self.owner.script.stream_failure {
            StreamFailure::Refused => Err(TransportError::Connect {
                address: format!("{}:{}", address, port),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }),
            StreamFailure::Timeout => Err(TransportError::Timeout(3000)),
            StreamFailure::Hang => futures::future::pending().await,
            StreamFailure::None | StreamFailure::Write => {
                self.owner
                    .log()
                    .stream_connects
                    .push((address.to_string(), port));
                Ok(())
            }
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.owner.script.stream_failure == StreamFailure::Write {
            return Err(TransportError::Io(std::io::Error::from(
                std::io::ErrorKind::BrokenPipe,
            )));
        }
        self.owner.log().stream_writes.push(data.to_vec());
        Ok(())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.owner.log().streams_closed += 1;
        }
    }
}

struct FakeDatagram {
    owner: FakeTransport,
}

#[async_trait]
impl DatagramClient for FakeDatagram {
    async fn send_to(
        &mut self,
        address: &str,
        port: u16,
        data: &[u8],
    ) -> Result<usize, TransportError> {
        if let Some(needle) = &self.owner.script.fail_datagrams_containing
            && String::from_utf8_lossy(data).contains(needle.as_str())
        {
            return Err(TransportError::Resolve(address.to_string()));
        }
        self.owner
            .log()
            .datagram_sends
            .push((address.to_string(), port, data.to_vec()));
        Ok(data.len())
    }
}

/// Route `tracing` output to the test harness, honouring RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_records_stream_traffic() {
        init_tracing();
        let fake = FakeTransport::new();
        let mut client = fake.factory().create_stream_client();

        client.connect("10.0.0.5", 5050).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        client.close().await;
        client.close().await;

        assert_eq!(fake.streams_created(), 1);
        assert_eq!(fake.streams_closed(), 1);
        assert_eq!(fake.stream_writes(), vec![b"abc".to_vec()]);
    }

    #[tokio::test]
    async fn test_fake_refused_connect() {
        let fake = FakeTransport::new().with_stream_failure(StreamFailure::Refused);
        let mut client = fake.factory().create_stream_client();

        assert!(client.connect("10.0.0.5", 5050).await.is_err());
        assert!(fake.stream_connects().is_empty());
    }

    #[tokio::test]
    async fn test_fake_datagram_filter() {
        let fake = FakeTransport::new().fail_datagrams_containing("ping");
        let mut client = fake.factory().create_datagram_client();

        assert!(client.send_to("10.0.0.5", 5050, b"ping").await.is_err());
        assert!(client.send_to("10.0.0.5", 5050, b"power_on").await.is_ok());
        assert_eq!(fake.datagram_sends().len(), 1);
    }
}
