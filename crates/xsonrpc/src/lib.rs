//! # xsonrpc
//!
//! XML-RPC and JSON-RPC 2.0 with one method registry behind both formats.
//! This crate holds the transport-agnostic core; the HTTP server and client
//! live in `xsonrpc-http`.
//!
//! ## Features
//! - Dynamically typed [`Value`] shared by both wire formats
//! - Native Rust closures registered as RPC methods with automatic
//!   parameter conversion and arity checks
//! - Fault taxonomy with stable codes in the reserved range
//!   `-32768..=-32000`
//! - `system.multicall` and optional XML-RPC introspection
//!   (`system.listMethods`, `system.methodSignature`, `system.methodHelp`)
//! - Streaming [`Writer`] / [`Reader`] contract implemented by the XML and
//!   JSON codecs
//!
//! ```rust
//! use xsonrpc::prelude::*;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add_method("add", |a: i32, b: i32| a + b).unwrap();
//!
//! let response = dispatcher.invoke("add", &[Value::from(2), Value::from(3)], Value::Nil);
//! assert_eq!(response.into_result(), Ok(Value::from(5)));
//! ```

pub mod dispatcher;
pub mod error;
pub mod format;
pub mod json;
pub mod method;
pub mod request;
pub mod response;
pub mod system_methods;
pub mod util;
pub mod value;
pub mod writer;
pub mod xml;

pub mod prelude;

// Re-export main types
pub use dispatcher::Dispatcher;
pub use error::{Error, Fault, FaultCode};
pub use format::{FormatHandler, JsonFormatHandler, XmlFormatHandler, process_request};
pub use method::{FromValue, Handler, IntoMethodResult, Method, MethodWrapper};
pub use request::{Parameters, Request};
pub use response::Response;
pub use system_methods::{Capability, SystemMethods};
pub use value::{Array, Binary, DateTime, Struct, Value, ValueError, ValueType};
pub use writer::{Reader, Writer};
