use crate::value::Value;
use crate::writer::Writer;

/// Ordered positional parameters of a call
pub type Parameters = Vec<Value>;

/// A method call: name, positional parameters and an optional correlation id
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method_name: String,
    parameters: Parameters,
    id: Value,
}

impl Request {
    pub fn new(method_name: impl Into<String>, parameters: Parameters) -> Self {
        Self::with_id(method_name, parameters, Value::Nil)
    }

    pub fn with_id(method_name: impl Into<String>, parameters: Parameters, id: Value) -> Self {
        Self {
            method_name: method_name.into(),
            parameters,
            id,
        }
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Correlation id; `Nil` for XML-RPC and JSON-RPC notifications
    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_nil()
    }

    pub fn into_parts(self) -> (String, Parameters, Value) {
        (self.method_name, self.parameters, self.id)
    }

    pub fn write(&self, writer: &mut dyn Writer) {
        Self::write_call(&self.method_name, &self.parameters, &self.id, writer);
    }

    /// Encode a call without building a `Request` first
    pub fn write_call(method_name: &str, parameters: &[Value], id: &Value, writer: &mut dyn Writer) {
        writer.start_document();
        writer.start_request(method_name, id);
        for parameter in parameters {
            writer.start_parameter();
            parameter.write(writer);
            writer.end_parameter();
        }
        writer.end_request();
        writer.end_document();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlWriter;

    #[test]
    fn test_request_accessors() {
        let request = Request::new("add", vec![Value::from(1), Value::from(2)]);
        assert_eq!(request.method_name(), "add");
        assert_eq!(request.parameters().len(), 2);
        assert!(request.is_notification());

        let request = Request::with_id("ping", vec![], Value::from(7));
        assert_eq!(request.id(), &Value::from(7));
        let (name, params, id) = request.into_parts();
        assert_eq!((name.as_str(), params.len(), id), ("ping", 0, Value::from(7)));
    }

    #[test]
    fn test_request_write_xml() {
        let request = Request::new("echo", vec![Value::from("hi")]);
        let mut writer = XmlWriter::new();
        request.write(&mut writer);
        let xml = String::from_utf8(writer.data().to_vec()).unwrap();
        assert!(xml.ends_with(
            "<methodCall><methodName>echo</methodName><params><param>\
             <value><string>hi</string></value></param></params></methodCall>"
        ));
    }
}
