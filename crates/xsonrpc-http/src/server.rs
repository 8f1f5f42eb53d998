//! HTTP server for XML-RPC and JSON-RPC
//!
//! Every request is a POST to the configured path. The content type selects
//! the wire format; the body is decoded, dispatched on a blocking thread and
//! the encoded response sent back with the matching content type.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use xsonrpc::format::{FormatHandler, process_request};
use xsonrpc::{Dispatcher, JsonFormatHandler, SystemMethods, XmlFormatHandler};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Builder for [`Server`]
pub struct ServerBuilder {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the RPC endpoint path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn xml(mut self, enable: bool) -> Self {
        self.config.enable_xml = enable;
        self
    }

    pub fn json(mut self, enable: bool) -> Self {
        self.config.enable_json = enable;
        self
    }

    pub fn introspection(mut self, enable: bool) -> Self {
        self.config.introspection = enable;
        self
    }

    /// Dispatcher to register methods on before the server is built
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Build the server, installing the system methods
    pub fn build(mut self) -> ServerResult<Server> {
        let mut handlers: Vec<Arc<dyn FormatHandler>> = Vec::new();
        if self.config.enable_xml {
            handlers.push(Arc::new(XmlFormatHandler::new(self.config.path.as_str())));
        }
        if self.config.enable_json {
            handlers.push(Arc::new(JsonFormatHandler::new(self.config.path.as_str())));
        }
        if handlers.is_empty() {
            return Err(ServerError::Config("no wire format enabled".to_string()));
        }

        let system_methods = SystemMethods::install(&mut self.dispatcher, self.config.introspection)?;

        Ok(Server {
            system_methods,
            shared: Arc::new(Shared {
                config: self.config,
                dispatcher: Arc::new(self.dispatcher),
                handlers,
            }),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by all connections
struct Shared {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    handlers: Vec<Arc<dyn FormatHandler>>,
}

/// XML-RPC / JSON-RPC server over HTTP/1.1
#[derive(Clone)]
pub struct Server {
    system_methods: SystemMethods,
    shared: Arc<Shared>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.shared.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.shared.dispatcher
    }

    /// Handle for adding or removing advertised capabilities
    pub fn system_methods(&self) -> &SystemMethods {
        &self.system_methods
    }

    /// Bind the configured address and serve until the process exits
    pub async fn run(&self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.shared.config.bind_address).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> ServerResult<()> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serve connections until `shutdown` completes. Connections already
    /// accepted are left to finish on their own tasks.
    pub async fn serve_with_shutdown(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        info!("RPC server listening on {}", local_addr);
        info!("RPC endpoint available at: {}", self.shared.config.path);

        tokio::pin!(shutdown);
        loop {
            let (stream, peer_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("RPC server on {} shutting down", local_addr);
                    return Ok(());
                }
            };
            debug!("New connection from {}", peer_addr);

            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| handle_request(req, Arc::clone(&shared)));

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}

fn response(status: StatusCode, content_type: Option<&str>, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

fn plain(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    response(status, Some("text/plain"), Bytes::from_static(message.as_bytes()))
}

async fn handle_request(
    req: Request<Incoming>,
    shared: Arc<Shared>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("Handling {} {}", method, path);

    if method != Method::POST {
        let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("POST"));
        return Ok(response);
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let Some(handler) = shared
        .handlers
        .iter()
        .find(|handler| handler.can_handle_request(&path, content_type))
        .cloned()
    else {
        debug!(path = %path, content_type, "no format handler for request");
        return Ok(plain(StatusCode::NOT_FOUND, "Not Found"));
    };

    let body = match Limited::new(req.into_body(), shared.config.max_body_size)
        .collect()
        .await
    {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            warn!(limit = shared.config.max_body_size, "request body too large");
            return Ok(plain(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large"));
        }
        Err(err) => {
            debug!("Failed to read request body: {}", err);
            return Ok(plain(StatusCode::BAD_REQUEST, "Bad Request"));
        }
    };

    // methods are synchronous and may block
    let dispatcher = Arc::clone(&shared.dispatcher);
    let format = Arc::clone(&handler);
    let result =
        tokio::task::spawn_blocking(move || process_request(&dispatcher, format.as_ref(), &body)).await;

    Ok(match result {
        Ok(Some(data)) => response(StatusCode::OK, Some(handler.content_type()), Bytes::from(data)),
        Ok(None) => response(StatusCode::NO_CONTENT, None, Bytes::new()),
        Err(err) => {
            error!("Request processing task failed: {}", err);
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    })
}
