//! Binding of wire formats to request paths and content types, and the
//! read → invoke → write pipeline shared by every transport.

use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::error::Fault;
use crate::json::{JsonReader, JsonWriter};
use crate::response::Response;
use crate::value::Value;
use crate::writer::{Reader, Writer};
use crate::xml::{XmlReader, XmlWriter};

pub const DEFAULT_REQUEST_PATH: &str = "/RPC2";

pub const TEXT_XML: &str = "text/xml";
pub const APPLICATION_JSON: &str = "application/json";

/// A wire format served on a request path
pub trait FormatHandler: Send + Sync {
    /// Whether a request to `path` with `content_type` is in this format.
    /// Parameters of the content type (such as `charset`) are ignored.
    fn can_handle_request(&self, path: &str, content_type: &str) -> bool;

    /// Content type of the responses this handler writes
    fn content_type(&self) -> &str;

    /// Whether requests carry a correlation id, and hence whether a request
    /// without one is a notification
    fn uses_id(&self) -> bool;

    fn create_reader(&self, data: &[u8]) -> Result<Box<dyn Reader>, Fault>;

    fn create_writer(&self) -> Box<dyn Writer>;
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

#[derive(Debug, Clone)]
pub struct XmlFormatHandler {
    request_path: String,
}

impl XmlFormatHandler {
    pub fn new(request_path: impl Into<String>) -> Self {
        Self {
            request_path: request_path.into(),
        }
    }
}

impl Default for XmlFormatHandler {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_PATH)
    }
}

impl FormatHandler for XmlFormatHandler {
    fn can_handle_request(&self, path: &str, content_type: &str) -> bool {
        path == self.request_path && media_type(content_type).eq_ignore_ascii_case(TEXT_XML)
    }

    fn content_type(&self) -> &str {
        TEXT_XML
    }

    fn uses_id(&self) -> bool {
        false
    }

    fn create_reader(&self, data: &[u8]) -> Result<Box<dyn Reader>, Fault> {
        Ok(Box::new(XmlReader::new(data)?))
    }

    fn create_writer(&self) -> Box<dyn Writer> {
        Box::new(XmlWriter::new())
    }
}

#[derive(Debug, Clone)]
pub struct JsonFormatHandler {
    request_path: String,
}

impl JsonFormatHandler {
    pub fn new(request_path: impl Into<String>) -> Self {
        Self {
            request_path: request_path.into(),
        }
    }
}

impl Default for JsonFormatHandler {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_PATH)
    }
}

impl FormatHandler for JsonFormatHandler {
    fn can_handle_request(&self, path: &str, content_type: &str) -> bool {
        path == self.request_path
            && media_type(content_type).eq_ignore_ascii_case(APPLICATION_JSON)
    }

    fn content_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn uses_id(&self) -> bool {
        true
    }

    fn create_reader(&self, data: &[u8]) -> Result<Box<dyn Reader>, Fault> {
        Ok(Box::new(JsonReader::new(data)?))
    }

    fn create_writer(&self) -> Box<dyn Writer> {
        Box::new(JsonWriter::new())
    }
}

/// Decode a request from `body`, invoke it and encode the response.
///
/// A body that cannot be decoded is answered with a fault response carrying
/// no id. Returns `None` for notifications, which get no response.
pub fn process_request(
    dispatcher: &Dispatcher,
    handler: &dyn FormatHandler,
    body: &[u8],
) -> Option<Vec<u8>> {
    let request = handler
        .create_reader(body)
        .and_then(|mut reader| reader.get_request());

    let response = match request {
        Ok(request) => {
            let (method_name, parameters, id) = request.into_parts();
            let notification = handler.uses_id() && id.is_nil();
            let response = dispatcher.invoke(&method_name, &parameters, id);
            if notification {
                debug!(method = %method_name, "notification processed, no response");
                return None;
            }
            response
        }
        Err(fault) => {
            debug!(code = fault.code(), fault = %fault, "could not decode request");
            Response::from_fault(fault, Value::Nil)
        }
    };

    let mut writer = handler.create_writer();
    response.write(writer.as_mut());
    Some(writer.data().to_vec())
}
