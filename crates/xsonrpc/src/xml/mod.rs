//! XML-RPC codec.
//!
//! [`XmlWriter`] produces compact documents with a UTF-8 declaration;
//! [`XmlReader`] parses a whole document up front and then decodes requests,
//! responses or bare values from it.

mod reader;
mod writer;

pub use reader::XmlReader;
pub use writer::XmlWriter;

pub const METHOD_CALL_TAG: &str = "methodCall";
pub const METHOD_NAME_TAG: &str = "methodName";
pub const METHOD_RESPONSE_TAG: &str = "methodResponse";
pub const FAULT_TAG: &str = "fault";
pub const PARAMS_TAG: &str = "params";
pub const PARAM_TAG: &str = "param";

pub const VALUE_TAG: &str = "value";

pub const ARRAY_TAG: &str = "array";
pub const BASE_64_TAG: &str = "base64";
pub const BOOLEAN_TAG: &str = "boolean";
pub const DATE_TIME_TAG: &str = "dateTime.iso8601";
pub const DOUBLE_TAG: &str = "double";
pub const INTEGER_32_TAG: &str = "i4";
pub const INTEGER_64_TAG: &str = "i8";
/// Legacy spelling of `i4`, accepted on input only
pub const INTEGER_INT_TAG: &str = "int";
pub const NIL_TAG: &str = "nil";
pub const STRING_TAG: &str = "string";
pub const STRUCT_TAG: &str = "struct";

pub const DATA_TAG: &str = "data";
pub const MEMBER_TAG: &str = "member";
pub const NAME_TAG: &str = "name";

pub(crate) const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
