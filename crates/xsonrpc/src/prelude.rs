//! # xsonrpc Prelude
//!
//! Commonly used types for registering methods and encoding calls.
//!
//! ```rust
//! use xsonrpc::prelude::*;
//! ```

// Core types
pub use crate::dispatcher::Dispatcher;
pub use crate::error::{Fault, FaultCode};
pub use crate::method::MethodWrapper;
pub use crate::request::Request;
pub use crate::response::Response;
pub use crate::system_methods::SystemMethods;
pub use crate::value::{Array, Binary, DateTime, Struct, Value, ValueType};

// Codecs
pub use crate::format::{FormatHandler, JsonFormatHandler, XmlFormatHandler, process_request};
pub use crate::json::{JsonReader, JsonWriter};
pub use crate::writer::{Reader, Writer};
pub use crate::xml::{XmlReader, XmlWriter};
