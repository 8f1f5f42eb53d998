use quick_xml::escape::escape;

use super::*;
use crate::error::{FAULT_CODE_NAME, FAULT_STRING_NAME};
use crate::util::{base64_encode_wrapped, format_iso8601};
use crate::value::{DateTime, Struct, Value};
use crate::writer::Writer;

/// Encodes XML-RPC documents into an in-memory buffer
#[derive(Debug, Default)]
pub struct XmlWriter {
    buffer: String,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_bytes()
    }

    fn open(&mut self, tag: &str) {
        self.buffer.push('<');
        self.buffer.push_str(tag);
        self.buffer.push('>');
    }

    fn close(&mut self, tag: &str) {
        self.buffer.push_str("</");
        self.buffer.push_str(tag);
        self.buffer.push('>');
    }

    fn text(&mut self, text: &str) {
        self.buffer.push_str(&escape(text));
    }

    fn scalar(&mut self, tag: &str, text: &str) {
        self.open(VALUE_TAG);
        self.open(tag);
        self.text(text);
        self.close(tag);
        self.close(VALUE_TAG);
    }
}

impl Writer for XmlWriter {
    fn data(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    fn start_document(&mut self) {
        self.buffer.push_str(XML_DECLARATION);
    }

    fn end_document(&mut self) {}

    fn start_request(&mut self, method_name: &str, _id: &Value) {
        self.open(METHOD_CALL_TAG);
        self.open(METHOD_NAME_TAG);
        self.text(method_name);
        self.close(METHOD_NAME_TAG);
        self.open(PARAMS_TAG);
    }

    fn end_request(&mut self) {
        self.close(PARAMS_TAG);
        self.close(METHOD_CALL_TAG);
    }

    fn start_parameter(&mut self) {
        self.open(PARAM_TAG);
    }

    fn end_parameter(&mut self) {
        self.close(PARAM_TAG);
    }

    fn start_response(&mut self, _id: &Value) {
        self.open(METHOD_RESPONSE_TAG);
        self.open(PARAMS_TAG);
        self.open(PARAM_TAG);
    }

    fn end_response(&mut self) {
        self.close(PARAM_TAG);
        self.close(PARAMS_TAG);
        self.close(METHOD_RESPONSE_TAG);
    }

    fn start_fault_response(&mut self, _id: &Value) {
        self.open(METHOD_RESPONSE_TAG);
        self.open(FAULT_TAG);
    }

    fn end_fault_response(&mut self) {
        self.close(FAULT_TAG);
        self.close(METHOD_RESPONSE_TAG);
    }

    fn write_fault(&mut self, code: i32, message: &str) {
        let mut fault = Struct::new();
        fault.insert(FAULT_CODE_NAME.to_string(), Value::Integer32(code));
        fault.insert(FAULT_STRING_NAME.to_string(), Value::from(message));
        Value::Struct(fault).write(self);
    }

    fn start_array(&mut self) {
        self.open(VALUE_TAG);
        self.open(ARRAY_TAG);
        self.open(DATA_TAG);
    }

    fn end_array(&mut self) {
        self.close(DATA_TAG);
        self.close(ARRAY_TAG);
        self.close(VALUE_TAG);
    }

    fn start_struct(&mut self) {
        self.open(VALUE_TAG);
        self.open(STRUCT_TAG);
    }

    fn end_struct(&mut self) {
        self.close(STRUCT_TAG);
        self.close(VALUE_TAG);
    }

    fn start_struct_element(&mut self, name: &str) {
        self.open(MEMBER_TAG);
        self.open(NAME_TAG);
        self.text(name);
        self.close(NAME_TAG);
    }

    fn end_struct_element(&mut self) {
        self.close(MEMBER_TAG);
    }

    fn write_binary(&mut self, data: &[u8]) {
        self.scalar(BASE_64_TAG, &base64_encode_wrapped(data));
    }

    fn write_null(&mut self) {
        self.open(VALUE_TAG);
        self.open(NIL_TAG);
        self.close(NIL_TAG);
        self.close(VALUE_TAG);
    }

    fn write_bool(&mut self, value: bool) {
        self.scalar(BOOLEAN_TAG, if value { "1" } else { "0" });
    }

    fn write_double(&mut self, value: f64) {
        self.scalar(DOUBLE_TAG, &value.to_string());
    }

    fn write_i32(&mut self, value: i32) {
        self.scalar(INTEGER_32_TAG, &value.to_string());
    }

    fn write_i64(&mut self, value: i64) {
        self.scalar(INTEGER_64_TAG, &value.to_string());
    }

    fn write_string(&mut self, value: &str) {
        self.scalar(STRING_TAG, value);
    }

    fn write_datetime(&mut self, value: &DateTime) {
        self.scalar(DATE_TIME_TAG, &format_iso8601(value));
    }
}
