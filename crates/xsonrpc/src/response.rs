use crate::error::Fault;
use crate::value::Value;
use crate::writer::Writer;

/// Outcome of a call: a result value or a fault, plus the correlation id
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    result: Result<Value, Fault>,
    id: Value,
}

impl Response {
    pub fn success(value: Value, id: Value) -> Self {
        Self {
            result: Ok(value),
            id,
        }
    }

    pub fn from_fault(fault: Fault, id: Value) -> Self {
        Self {
            result: Err(fault),
            id,
        }
    }

    /// Fault response keeping `code` verbatim, reserved or not
    pub fn fault(code: i32, message: impl Into<String>, id: Value) -> Self {
        Self::from_fault(Fault::from_parts(code, message), id)
    }

    pub fn is_fault(&self) -> bool {
        self.result.is_err()
    }

    pub fn result(&self) -> &Result<Value, Fault> {
        &self.result
    }

    /// Success value, or the fault's struct form
    pub fn value(&self) -> Value {
        match &self.result {
            Ok(value) => value.clone(),
            Err(fault) => fault.to_value(),
        }
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn set_id(&mut self, id: Value) {
        self.id = id;
    }

    pub fn into_result(self) -> Result<Value, Fault> {
        self.result
    }

    pub fn write(&self, writer: &mut dyn Writer) {
        writer.start_document();
        match &self.result {
            Ok(value) => {
                writer.start_response(&self.id);
                value.write(writer);
                writer.end_response();
            }
            Err(fault) => {
                writer.start_fault_response(&self.id);
                writer.write_fault(fault.code(), fault.string());
                writer.end_fault_response();
            }
        }
        writer.end_document();
    }
}

impl From<Result<Value, Fault>> for Response {
    fn from(result: Result<Value, Fault>) -> Self {
        Self {
            result,
            id: Value::Nil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultCode;

    #[test]
    fn test_fault_response_keeps_reserved_code() {
        let response = Response::fault(-32601, "No such method x", Value::Nil);
        assert!(response.is_fault());
        let fault = response.result().as_ref().unwrap_err();
        assert_eq!(fault.kind(), Some(FaultCode::MethodNotFound));
    }

    #[test]
    fn test_value_of_fault_is_struct() {
        let response = Response::from_fault(Fault::new("oops", 3), Value::from(1));
        let value = response.value();
        assert_eq!(value.get("faultCode").unwrap(), &Value::from(3));
        assert_eq!(value.get("faultString").unwrap(), &Value::from("oops"));
        assert_eq!(response.id(), &Value::from(1));
    }

    #[test]
    fn test_success_response() {
        let response: Response = Ok(Value::from(true)).into();
        assert!(!response.is_fault());
        assert_eq!(response.into_result(), Ok(Value::from(true)));
    }
}
