//! JSON-RPC 2.0 codec.
//!
//! Values map onto JSON as follows: `Nil` is `null`, both integer widths are
//! numbers, `DateTime` is a `YYYYMMDDTHH:MM:SS` string and `Binary` is an
//! unwrapped base64 string. On input, strings in the date/time format become
//! `DateTime`, integers that fit in 32 bits become `Integer32` and base64
//! strings stay strings.

mod reader;
mod writer;

pub use reader::JsonReader;
pub use writer::JsonWriter;

pub const JSONRPC_NAME: &str = "jsonrpc";
pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_NAME: &str = "method";
pub const PARAMS_NAME: &str = "params";
pub const ID_NAME: &str = "id";
pub const RESULT_NAME: &str = "result";
pub const ERROR_NAME: &str = "error";
pub const ERROR_CODE_NAME: &str = "code";
pub const ERROR_MESSAGE_NAME: &str = "message";
