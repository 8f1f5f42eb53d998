//! HTTP client for calling XML-RPC and JSON-RPC servers

use std::sync::Once;
use std::sync::atomic::{AtomicI32, Ordering};

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use tracing::{debug, info};
use url::Url;
use xsonrpc::format::FormatHandler;
use xsonrpc::{Request, Value};

use crate::config::{ClientConfig, Format};
use crate::error::{ClientError, ClientResult};

static GLOBAL_INIT: Once = Once::new();

/// One-time process setup for clients. Safe to call any number of times;
/// [`Client::with_config`] calls it as well.
pub fn global_init() {
    GLOBAL_INIT.call_once(|| {
        info!(
            "xsonrpc client initialized (version {})",
            env!("CARGO_PKG_VERSION")
        );
    });
}

/// Client bound to one RPC endpoint
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    config: ClientConfig,
    handler: Box<dyn FormatHandler>,
    next_id: AtomicI32,
}

impl Client {
    /// XML-RPC client with default settings
    pub fn new(endpoint: &str) -> ClientResult<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: &str, config: ClientConfig) -> ClientResult<Self> {
        global_init();

        let url = Url::parse(endpoint).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            http,
            handler: config.format.handler(url.path()),
            endpoint: url,
            config,
            next_id: AtomicI32::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn format(&self) -> Format {
        self.config.format
    }

    /// Call `method_name` and wait for its result. A fault returned by the
    /// server is reported as [`ClientError::Fault`].
    pub async fn call(&self, method_name: &str, parameters: &[Value]) -> ClientResult<Value> {
        let id = if self.handler.uses_id() {
            Value::from(self.next_id.fetch_add(1, Ordering::Relaxed))
        } else {
            Value::Nil
        };

        let (status, body) = self.post(method_name, parameters, &id).await?;
        if status != StatusCode::OK {
            return Err(ClientError::Status(status.as_u16()));
        }

        let response = self
            .handler
            .create_reader(&body)
            .and_then(|mut reader| reader.get_response())
            .map_err(ClientError::InvalidResponse)?;
        if response.id() != &id {
            debug!(expected = %id, received = %response.id(), "response id mismatch");
        }
        response.into_result().map_err(ClientError::Fault)
    }

    /// Send a JSON-RPC notification; no result is returned
    pub async fn notify(&self, method_name: &str, parameters: &[Value]) -> ClientResult<()> {
        if !self.handler.uses_id() {
            return Err(ClientError::NotificationUnsupported(self.config.format.name()));
        }

        let (status, _) = self.post(method_name, parameters, &Value::Nil).await?;
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn post(
        &self,
        method_name: &str,
        parameters: &[Value],
        id: &Value,
    ) -> ClientResult<(StatusCode, bytes::Bytes)> {
        let body = {
            let mut writer = self.handler.create_writer();
            Request::write_call(method_name, parameters, id, writer.as_mut());
            writer.data().to_vec()
        };

        debug!(
            method = method_name,
            endpoint = %self.endpoint,
            bytes = body.len(),
            "sending {} request",
            self.config.format.name()
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, self.handler.content_type())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        Ok((status, body))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(Client::new("not a url"), Err(ClientError::InvalidUrl(_))));
        assert!(matches!(
            Client::new("ftp://localhost/RPC2"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_global_init_is_idempotent() {
        global_init();
        global_init();
        assert!(GLOBAL_INIT.is_completed());
    }

    #[tokio::test]
    async fn test_xml_client_rejects_notifications() {
        let client = Client::new("http://127.0.0.1:1/RPC2").unwrap();
        assert_eq!(client.format(), Format::Xml);
        let err = client.notify("ping", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::NotificationUnsupported("XML-RPC")));
    }
}
