//! # xsonrpc HTTP transport
//!
//! Serves an [`xsonrpc::Dispatcher`] over HTTP and calls remote servers.
//!
//! ## Features
//! - One endpoint path serving XML-RPC (`text/xml`) and JSON-RPC 2.0
//!   (`application/json`), selected by content type
//! - Request body size limit, `405` for non-POST requests, `204` for
//!   JSON-RPC notifications
//! - `system.*` introspection installed at build time
//! - Async client speaking either format
//!
//! ```no_run
//! use xsonrpc::Value;
//! use xsonrpc_http::{Client, ServerBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = ServerBuilder::new();
//! builder.dispatcher_mut().add_method("add", |a: i32, b: i32| a + b)?;
//! let server = builder.build()?;
//! tokio::spawn(async move { server.run().await });
//!
//! let client = Client::new("http://127.0.0.1:8080/RPC2")?;
//! let sum = client.call("add", &[Value::from(3), Value::from(2)]).await?;
//! assert_eq!(sum, Value::from(5));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod server;

// Re-export main types
pub use client::{Client, global_init};
pub use config::{ClientConfig, Format, ServerConfig};
pub use error::{ClientError, ClientResult, ServerError, ServerResult};
pub use server::{Server, ServerBuilder};
