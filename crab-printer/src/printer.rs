//! Printer adapters for sending ESC/POS data
//!
//! Supports network printers (raw TCP, usually port 9100).

use crate::error::{PrintError, PrintResult};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100.
/// Each [`Printer::print`] call opens its own connection.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
    probe_timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    ///
    /// `host` may be an IP address or a resolvable host name.
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(PrintError::InvalidConfig("Empty printer host".to_string()));
        }
        if port == 0 {
            return Err(PrintError::InvalidConfig(format!(
                "Invalid port for {}: 0",
                host
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            timeout: Duration::from_secs(20),
            probe_timeout: Duration::from_millis(500),
        })
    }

    /// Set connect/write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set liveness probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Get the printer address as `host:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self, timeout: Duration) -> PrintResult<TcpStream> {
        tokio::time::timeout(timeout, TcpStream::connect((self.host.as_str(), self.port)))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr())))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr(), e)))
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(self, data), fields(addr = %self.addr(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        info!("Connecting to printer");

        let mut stream = self.connect(self.timeout).await?;

        info!("Connected, sending {} bytes", data.len());

        let send = async {
            stream.write_all(data).await?;
            stream.flush().await?;
            stream.shutdown().await
        };

        tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| PrintError::Timeout(format!("Write timeout: {}", self.addr())))?
            .map_err(|e| {
                PrintError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Write failed: {}", e),
                ))
            })?;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(skip(self), fields(addr = %self.addr()))]
    async fn is_online(&self) -> bool {
        match self.connect(self.probe_timeout).await {
            Ok(_) => {
                info!("Printer online");
                true
            }
            Err(PrintError::Timeout(_)) => {
                warn!("Printer check timeout");
                false
            }
            Err(e) => {
                warn!(error = %e, "Printer offline");
                false
            }
        }
    }
}
