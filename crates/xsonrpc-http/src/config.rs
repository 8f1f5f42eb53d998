//! Configuration types for the HTTP server and client

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xsonrpc::format::{DEFAULT_REQUEST_PATH, FormatHandler};
use xsonrpc::{JsonFormatHandler, XmlFormatHandler};

/// Wire format spoken by a [`Client`](crate::Client)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Xml,
    Json,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Xml => "XML-RPC",
            Format::Json => "JSON-RPC",
        }
    }

    pub(crate) fn handler(&self, request_path: &str) -> Box<dyn FormatHandler> {
        match self {
            Format::Xml => Box::new(XmlFormatHandler::new(request_path)),
            Format::Json => Box::new(JsonFormatHandler::new(request_path)),
        }
    }
}

/// Configuration for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path served by the RPC endpoint
    pub path: String,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Accept XML-RPC requests (`text/xml`)
    pub enable_xml: bool,
    /// Accept JSON-RPC requests (`application/json`)
    pub enable_json: bool,
    /// Register `system.listMethods`, `system.methodSignature` and
    /// `system.methodHelp`
    pub introspection: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            path: DEFAULT_REQUEST_PATH.to_string(),
            max_body_size: 1024 * 1024, // 1MB
            enable_xml: true,
            enable_json: true,
            introspection: true,
        }
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub format: Format,

    /// Timeout for a whole call, connect included
    #[serde(with = "duration_serde")]
    pub timeout: Duration,

    pub user_agent: String,

    /// Maximum number of redirects followed
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            format: Format::Xml,
            timeout: Duration::from_secs(30),
            user_agent: concat!("xsonrpc/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 20,
        }
    }
}

impl ClientConfig {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Serialize durations as milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
