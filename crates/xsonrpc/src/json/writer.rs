use serde_json::{Map, Number, Value as JsonValue};

use super::*;
use crate::util::{base64_encode, format_iso8601};
use crate::value::{DateTime, Value};
use crate::writer::Writer;

#[derive(Debug)]
enum Frame {
    Array(Vec<JsonValue>),
    Object {
        members: Map<String, JsonValue>,
        key: Option<String>,
    },
}

/// Encodes JSON-RPC 2.0 documents.
///
/// The document is assembled as a `serde_json::Value` tree and serialized
/// when `end_document` is called.
#[derive(Debug, Default)]
pub struct JsonWriter {
    stack: Vec<Frame>,
    root: Option<JsonValue>,
    output: Vec<u8>,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    fn emit(&mut self, value: JsonValue) {
        match self.stack.last_mut() {
            Some(Frame::Array(elements)) => elements.push(value),
            Some(Frame::Object { members, key }) => {
                if let Some(key) = key.take() {
                    members.insert(key, value);
                }
            }
            None => self.root = Some(value),
        }
    }

    fn start_object(&mut self, members: Map<String, JsonValue>, key: Option<&str>) {
        self.stack.push(Frame::Object {
            members,
            key: key.map(str::to_string),
        });
    }

    fn end_frame(&mut self) {
        let value = match self.stack.pop() {
            Some(Frame::Array(elements)) => JsonValue::Array(elements),
            Some(Frame::Object { members, .. }) => JsonValue::Object(members),
            None => return,
        };
        self.emit(value);
    }

    fn envelope(id: Option<&Value>) -> Map<String, JsonValue> {
        let mut members = Map::new();
        members.insert(JSONRPC_NAME.to_string(), JsonValue::from(JSONRPC_VERSION));
        if let Some(id) = id {
            members.insert(ID_NAME.to_string(), encode(id));
        }
        members
    }
}

/// JSON form of a single value
pub(crate) fn encode(value: &Value) -> JsonValue {
    let mut writer = JsonWriter::new();
    value.write(&mut writer);
    writer.root.take().unwrap_or(JsonValue::Null)
}

impl Writer for JsonWriter {
    fn data(&self) -> &[u8] {
        &self.output
    }

    fn start_document(&mut self) {
        self.stack.clear();
        self.root = None;
        self.output.clear();
    }

    fn end_document(&mut self) {
        if let Some(root) = self.root.take() {
            self.output = root.to_string().into_bytes();
        }
    }

    fn start_request(&mut self, method_name: &str, id: &Value) {
        // a request without id is a notification
        let mut members = Self::envelope(Some(id).filter(|id| !id.is_nil()));
        members.insert(METHOD_NAME.to_string(), JsonValue::from(method_name));
        self.start_object(members, Some(PARAMS_NAME));
        self.stack.push(Frame::Array(Vec::new()));
    }

    fn end_request(&mut self) {
        self.end_frame();
        self.end_frame();
    }

    fn start_parameter(&mut self) {}

    fn end_parameter(&mut self) {}

    fn start_response(&mut self, id: &Value) {
        self.start_object(Self::envelope(Some(id)), Some(RESULT_NAME));
    }

    fn end_response(&mut self) {
        self.end_frame();
    }

    fn start_fault_response(&mut self, id: &Value) {
        self.start_object(Self::envelope(Some(id)), Some(ERROR_NAME));
    }

    fn end_fault_response(&mut self) {
        self.end_frame();
    }

    fn write_fault(&mut self, code: i32, message: &str) {
        let mut error = Map::new();
        error.insert(ERROR_CODE_NAME.to_string(), JsonValue::from(code));
        error.insert(ERROR_MESSAGE_NAME.to_string(), JsonValue::from(message));
        self.emit(JsonValue::Object(error));
    }

    fn start_array(&mut self) {
        self.stack.push(Frame::Array(Vec::new()));
    }

    fn end_array(&mut self) {
        self.end_frame();
    }

    fn start_struct(&mut self) {
        self.start_object(Map::new(), None);
    }

    fn end_struct(&mut self) {
        self.end_frame();
    }

    fn start_struct_element(&mut self, name: &str) {
        if let Some(Frame::Object { key, .. }) = self.stack.last_mut() {
            *key = Some(name.to_string());
        }
    }

    fn end_struct_element(&mut self) {}

    fn write_binary(&mut self, data: &[u8]) {
        self.emit(JsonValue::String(base64_encode(data)));
    }

    fn write_null(&mut self) {
        self.emit(JsonValue::Null);
    }

    fn write_bool(&mut self, value: bool) {
        self.emit(JsonValue::Bool(value));
    }

    fn write_double(&mut self, value: f64) {
        // NaN and infinities have no JSON representation
        self.emit(Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number));
    }

    fn write_i32(&mut self, value: i32) {
        self.emit(JsonValue::from(value));
    }

    fn write_i64(&mut self, value: i64) {
        self.emit(JsonValue::from(value));
    }

    fn write_string(&mut self, value: &str) {
        self.emit(JsonValue::from(value));
    }

    fn write_datetime(&mut self, value: &DateTime) {
        self.emit(JsonValue::String(format_iso8601(value)));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::request::Request;
    use crate::response::Response;
    use crate::value::Struct;

    fn parse(writer: JsonWriter) -> JsonValue {
        serde_json::from_slice(&writer.into_bytes()).unwrap()
    }

    #[test]
    fn test_request() {
        let mut writer = JsonWriter::new();
        Request::with_id("add", vec![Value::from(1), Value::from(2)], Value::from(7)).write(&mut writer);
        assert_eq!(
            parse(writer),
            json!({"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 7})
        );
    }

    #[test]
    fn test_notification_has_no_id() {
        let mut writer = JsonWriter::new();
        Request::new("log", vec![Value::from("started")]).write(&mut writer);
        assert_eq!(
            parse(writer),
            json!({"jsonrpc": "2.0", "method": "log", "params": ["started"]})
        );
    }

    #[test]
    fn test_responses() {
        let mut writer = JsonWriter::new();
        Response::success(Value::from(4), Value::from("a")).write(&mut writer);
        assert_eq!(parse(writer), json!({"jsonrpc": "2.0", "id": "a", "result": 4}));

        let mut writer = JsonWriter::new();
        Response::fault(-32601, "No such method x", Value::Nil).write(&mut writer);
        assert_eq!(
            parse(writer),
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32601, "message": "No such method x"}
            })
        );
    }

    #[test]
    fn test_nested_values() {
        let mut members = Struct::new();
        members.insert("bytes".to_string(), Value::from(vec![1u8, 2, 3]));
        members.insert("nothing".to_string(), Value::Nil);
        members.insert(
            "list".to_string(),
            Value::from(vec![Value::from(1.5), Value::from(false), Value::Array(vec![])]),
        );
        let value = Value::from(members);

        assert_eq!(
            encode(&value),
            json!({"bytes": "AQID", "nothing": null, "list": [1.5, false, []]})
        );
    }

    #[test]
    fn test_non_finite_double_is_null() {
        assert_eq!(encode(&Value::from(f64::NAN)), JsonValue::Null);
    }

    #[test]
    fn test_writer_is_reusable() {
        let mut writer = JsonWriter::new();
        Response::success(Value::from(1), Value::from(1)).write(&mut writer);
        Response::success(Value::from(2), Value::from(2)).write(&mut writer);
        assert_eq!(parse(writer), json!({"jsonrpc": "2.0", "id": 2, "result": 2}));
    }
}
