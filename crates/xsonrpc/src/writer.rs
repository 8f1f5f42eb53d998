use crate::error::Fault;
use crate::request::Request;
use crate::response::Response;
use crate::value::{DateTime, Value};

/// Streaming encoder interface implemented by each wire format.
///
/// Requests, responses and values are emitted as an ordered sequence of
/// these primitive calls; the encoder decides what bytes they turn into.
/// The `id` arguments carry the JSON-RPC correlation id and are ignored by
/// formats that have none.
pub trait Writer {
    /// Encoded output, complete once `end_document` has been called
    fn data(&self) -> &[u8];

    fn start_document(&mut self);
    fn end_document(&mut self);

    fn start_request(&mut self, method_name: &str, id: &Value);
    fn end_request(&mut self);

    fn start_parameter(&mut self);
    fn end_parameter(&mut self);

    fn start_response(&mut self, id: &Value);
    fn end_response(&mut self);

    fn start_fault_response(&mut self, id: &Value);
    fn end_fault_response(&mut self);

    fn write_fault(&mut self, code: i32, message: &str);

    fn start_array(&mut self);
    fn end_array(&mut self);

    fn start_struct(&mut self);
    fn end_struct(&mut self);

    fn start_struct_element(&mut self, name: &str);
    fn end_struct_element(&mut self);

    fn write_binary(&mut self, data: &[u8]);
    fn write_null(&mut self);
    fn write_bool(&mut self, value: bool);
    fn write_double(&mut self, value: f64);
    fn write_i32(&mut self, value: i32);
    fn write_i64(&mut self, value: i64);
    fn write_string(&mut self, value: &str);
    fn write_datetime(&mut self, value: &DateTime);
}

/// Streaming decoder interface implemented by each wire format
pub trait Reader {
    fn get_request(&mut self) -> Result<Request, Fault>;
    fn get_response(&mut self) -> Result<Response, Fault>;
    fn get_value(&mut self) -> Result<Value, Fault>;
}
