//! # Microcontroller Links
//!
//! Byte links to the drive and arm microcontrollers.
//!
//! A link is opened once at startup and kept for the lifetime of the loop.
//! Two transports are supported:
//! - UDP: a socket bound locally and connected to the endpoint, one packet
//!   line per datagram
//! - Serial: a USB CDC or UART port, 8N1, no flow control

use async_trait::async_trait;
use std::io;
use tokio::net::UdpSocket;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

use crate::config::EndpointConfig;
use crate::error::{Result, RoverError};

/// Trait for link I/O operations, so links can be mocked in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkIo: Send {
    /// Write all data to the link
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Connected UDP socket
pub struct UdpPort {
    socket: UdpSocket,
}

impl UdpPort {
    /// Bind to `bind` and connect to `address`.
    pub async fn connect(bind: &str, address: &str) -> io::Result<Self> {
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(address).await?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl LinkIo for UdpPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(data).await?;
        if sent != data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: {} of {} bytes", sent, data.len()),
            ));
        }
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Wrapper around tokio_serial::SerialStream that implements LinkIo
pub struct SerialPort {
    port: tokio_serial::SerialStream,
}

impl SerialPort {
    /// Open a serial port at 8N1 without flow control
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|_| RoverError::SerialPortNotFound(path.to_string()))?;

        Ok(Self { port })
    }
}

#[async_trait]
impl LinkIo for SerialPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.flush().await
    }
}

/// A named link to one microcontroller
pub struct Link {
    name: &'static str,
    endpoint: String,
    io: Box<dyn LinkIo>,
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Link {
    /// Wrap an existing I/O implementation
    pub fn new(name: &'static str, endpoint: impl Into<String>, io: Box<dyn LinkIo>) -> Self {
        Self {
            name,
            endpoint: endpoint.into(),
            io,
        }
    }

    /// Open the link described by an endpoint config
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the UDP socket cannot be bound or connected,
    /// `SerialPortNotFound` if the serial port cannot be opened.
    pub async fn open(name: &'static str, endpoint: &EndpointConfig) -> Result<Self> {
        let link = match endpoint {
            EndpointConfig::Udp { address, bind } => {
                let port = UdpPort::connect(bind, address).await.map_err(|e| {
                    RoverError::Transport {
                        endpoint: format!("udp://{}", address),
                        message: format!("Failed to connect: {}", e),
                    }
                })?;
                Self::new(name, format!("udp://{}", address), Box::new(port))
            }
            EndpointConfig::Serial { port, baud_rate } => {
                let serial = SerialPort::open(port, *baud_rate)?;
                Self::new(name, format!("serial://{}@{}", port, baud_rate), Box::new(serial))
            }
        };

        info!("Opened {} link to {}", link.name, link.endpoint);
        Ok(link)
    }

    /// Send one encoded packet
    pub async fn send(&mut self, packet: &[u8]) -> Result<()> {
        self.io
            .write_all(packet)
            .await
            .map_err(|e| self.transport_error(format!("Failed to write packet: {}", e)))?;

        self.io
            .flush()
            .await
            .map_err(|e| self.transport_error(format!("Failed to flush: {}", e)))?;

        debug!("Sent {} bytes on {} link", packet.len(), self.name);
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, message: String) -> RoverError {
        RoverError::Transport {
            endpoint: self.endpoint.clone(),
            message,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_writes_and_flushes() {
        let mut io = MockLinkIo::new();
        io.expect_write_all()
            .withf(|data| data.iter().eq(b"DriveCommand_0_0_0_0_0_0\n".iter()))
            .times(1)
            .returning(|_| Ok(()));
        io.expect_flush().times(1).returning(|| Ok(()));

        let mut link = Link::new("drive", "mock://drive", Box::new(io));
        assert!(link.send(b"DriveCommand_0_0_0_0_0_0\n").await.is_ok());
    }

    #[tokio::test]
    async fn test_write_failure_is_transport_error() {
        let mut io = MockLinkIo::new();
        io.expect_write_all()
            .returning(|_| Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
        io.expect_flush().never();

        let mut link = Link::new("arm", "mock://arm", Box::new(io));
        match link.send(b"ArmCommand_0_0_0_0_0_0\n").await {
            Err(RoverError::Transport { endpoint, message }) => {
                assert_eq!(endpoint, "mock://arm");
                assert!(message.contains("Failed to write packet"));
            }
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flush_failure_is_transport_error() {
        let mut io = MockLinkIo::new();
        io.expect_write_all().returning(|_| Ok(()));
        io.expect_flush()
            .returning(|| Err(io::Error::new(io::ErrorKind::TimedOut, "stuck")));

        let mut link = Link::new("arm", "mock://arm", Box::new(io));
        let err = link.send(b"x").await.unwrap_err();
        assert!(err.to_string().contains("Failed to flush"));
    }

    #[tokio::test]
    async fn test_udp_link_delivers_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let address = receiver.local_addr().unwrap().to_string();

        let endpoint = EndpointConfig::Udp {
            address: address.clone(),
            bind: "127.0.0.1:0".to_string(),
        };
        let mut link = Link::open("drive", &endpoint).await.unwrap();
        assert_eq!(link.endpoint(), format!("udp://{}", address));

        link.send(b"DriveCommand_1_1_1_1_1_1\n").await.unwrap();

        let mut buf = [0u8; 64];
        let len = receiver.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"DriveCommand_1_1_1_1_1_1\n");
    }

    #[tokio::test]
    async fn test_udp_bad_address_fails_to_open() {
        let endpoint = EndpointConfig::Udp {
            address: "not an address".to_string(),
            bind: "127.0.0.1:0".to_string(),
        };
        let result = Link::open("drive", &endpoint).await;
        assert!(matches!(result, Err(RoverError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_serial_missing_port_fails_to_open() {
        let endpoint = EndpointConfig::Serial {
            port: "/dev/nonexistent_serial_device_12345".to_string(),
            baud_rate: 115200,
        };
        match Link::open("arm", &endpoint).await {
            Err(RoverError::SerialPortNotFound(path)) => {
                assert!(path.contains("nonexistent_serial_device_12345"));
            }
            other => panic!("Expected SerialPortNotFound, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recording_port() {
        let port = mocks::RecordingPort::new();
        let mut link = Link::new("drive", "mock://drive", Box::new(port.clone()));

        link.send(b"a\n").await.unwrap();
        port.set_write_error(Some(io::ErrorKind::ConnectionRefused));
        assert!(link.send(b"b\n").await.is_err());

        assert_eq!(port.get_written_data(), vec![b"a\n".to_vec()]);
    }
}
