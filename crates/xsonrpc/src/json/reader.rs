use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::*;
use crate::error::Fault;
use crate::request::Request;
use crate::response::Response;
use crate::util::parse_iso8601;
use crate::value::Value;
use crate::writer::Reader;

/// Decodes one JSON-RPC 2.0 document
#[derive(Debug)]
pub struct JsonReader {
    document: JsonValue,
}

impl JsonReader {
    /// Parse `data`. Invalid UTF-8 yields `InvalidCharacterFault`, any other
    /// syntax error `NotWellFormedFault`.
    pub fn new(data: &[u8]) -> Result<Self, Fault> {
        let text = std::str::from_utf8(data).map_err(|err| {
            debug!(error = %err, "JSON-RPC document is not valid UTF-8");
            Fault::invalid_character()
        })?;
        let document = serde_json::from_str(text).map_err(|err| {
            debug!(error = %err, "malformed JSON");
            Fault::not_well_formed()
        })?;
        Ok(Self { document })
    }

    fn envelope(&self, what: &str) -> Result<&Map<String, JsonValue>, Fault> {
        let members = self
            .document
            .as_object()
            .ok_or_else(|| Fault::invalid_json_rpc(&format!("{} is not an object", what)))?;
        match members.get(JSONRPC_NAME).and_then(JsonValue::as_str) {
            Some(JSONRPC_VERSION) => Ok(members),
            _ => Err(Fault::invalid_json_rpc("missing or invalid jsonrpc version")),
        }
    }
}

impl Reader for JsonReader {
    fn get_request(&mut self) -> Result<Request, Fault> {
        let members = self.envelope("request")?;

        let method_name = members
            .get(METHOD_NAME)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Fault::invalid_json_rpc("missing or invalid method"))?;

        let parameters = match members.get(PARAMS_NAME) {
            None => Vec::new(),
            Some(JsonValue::Array(params)) => params.iter().map(decode).collect(),
            Some(JsonValue::Object(_)) => {
                return Err(Fault::invalid_json_rpc("params must be an array"));
            }
            Some(_) => return Err(Fault::invalid_json_rpc("invalid params")),
        };

        let id = decode_id(members.get(ID_NAME))?;
        Ok(Request::with_id(method_name, parameters, id))
    }

    fn get_response(&mut self) -> Result<Response, Fault> {
        let members = self.envelope("response")?;
        let id = decode_id(members.get(ID_NAME))?;

        if let Some(result) = members.get(RESULT_NAME) {
            return Ok(Response::success(decode(result), id));
        }

        let error = members
            .get(ERROR_NAME)
            .ok_or_else(|| Fault::invalid_json_rpc("missing result or error"))?
            .as_object()
            .ok_or_else(|| Fault::invalid_json_rpc("error is not an object"))?;
        let code = error
            .get(ERROR_CODE_NAME)
            .and_then(JsonValue::as_i64)
            .and_then(|code| i32::try_from(code).ok())
            .ok_or_else(|| Fault::invalid_json_rpc("missing or invalid error code"))?;
        let message = error
            .get(ERROR_MESSAGE_NAME)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Fault::invalid_json_rpc("missing or invalid error message"))?;
        Ok(Response::fault(code, message, id))
    }

    fn get_value(&mut self) -> Result<Value, Fault> {
        Ok(decode(&self.document))
    }
}

/// `null` and a missing id both mean "no id"
fn decode_id(id: Option<&JsonValue>) -> Result<Value, Fault> {
    match id {
        None | Some(JsonValue::Null) => Ok(Value::Nil),
        Some(id @ (JsonValue::String(_) | JsonValue::Number(_))) => Ok(decode(id)),
        Some(_) => Err(Fault::invalid_json_rpc("invalid id")),
    }
}

pub(crate) fn decode(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Nil,
        JsonValue::Bool(value) => Value::Boolean(*value),
        JsonValue::Number(number) => match number.as_i64() {
            Some(integer) => match i32::try_from(integer) {
                Ok(integer) => Value::Integer32(integer),
                Err(_) => Value::Integer64(integer),
            },
            None => Value::Double(number.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(text) => match parse_iso8601(text) {
            Some(datetime) if text.trim() == text => Value::DateTime(datetime),
            _ => Value::String(text.clone()),
        },
        JsonValue::Array(elements) => Value::Array(elements.iter().map(decode).collect()),
        JsonValue::Object(members) => Value::Struct(
            members
                .iter()
                .map(|(name, member)| (name.clone(), decode(member)))
                .collect(),
        ),
    }
}
