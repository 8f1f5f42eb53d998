use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::value::{Struct, Value, ValueError};

/// Struct member carrying the numeric fault code
pub const FAULT_CODE_NAME: &str = "faultCode";
/// Struct member carrying the fault message
pub const FAULT_STRING_NAME: &str = "faultString";

/// Fault codes reserved for protocol-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    NotWellFormed,
    InvalidCharacter,
    InvalidXmlRpc,
    MethodNotFound,
    InvalidParameters,
    InternalError,
}

impl FaultCode {
    pub const RESERVED_MIN: i32 = -32768;
    pub const RESERVED_MAX: i32 = -32000;

    pub fn code(&self) -> i32 {
        match self {
            FaultCode::NotWellFormed => -32700,
            FaultCode::InvalidCharacter => -32702,
            FaultCode::InvalidXmlRpc => -32600,
            FaultCode::MethodNotFound => -32601,
            FaultCode::InvalidParameters => -32602,
            FaultCode::InternalError => -32603,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FaultCode::NotWellFormed => "Document not well formed",
            FaultCode::InvalidCharacter => "Invalid character for encoding",
            FaultCode::InvalidXmlRpc => "Invalid request",
            FaultCode::MethodNotFound => "No such method",
            FaultCode::InvalidParameters => "Invalid parameters",
            FaultCode::InternalError => "Internal error",
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -32700 => Some(FaultCode::NotWellFormed),
            -32702 => Some(FaultCode::InvalidCharacter),
            -32600 => Some(FaultCode::InvalidXmlRpc),
            -32601 => Some(FaultCode::MethodNotFound),
            -32602 => Some(FaultCode::InvalidParameters),
            -32603 => Some(FaultCode::InternalError),
            _ => None,
        }
    }

    pub fn is_reserved(code: i32) -> bool {
        (Self::RESERVED_MIN..=Self::RESERVED_MAX).contains(&code)
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// An RPC-level error that is sent back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Fault {
    code: i32,
    message: String,
}

impl Fault {
    /// Application fault. Codes inside the reserved range are reset to 0.
    pub fn new(message: impl Into<String>, code: i32) -> Self {
        let message = message.into();
        let code = if FaultCode::is_reserved(code) {
            warn!(
                code,
                message = %message,
                "application fault uses a reserved code, resetting to 0"
            );
            0
        } else {
            code
        };
        Self { code, message }
    }

    /// Application fault with code 0
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(message, 0)
    }

    /// Fault with an arbitrary code, reserved or not. Used when decoding a
    /// fault received from the wire.
    pub(crate) fn from_parts(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn protocol(code: FaultCode, message: String) -> Self {
        Self::from_parts(code.code(), message)
    }

    pub fn not_well_formed() -> Self {
        Self::protocol(
            FaultCode::NotWellFormed,
            FaultCode::NotWellFormed.message().to_string(),
        )
    }

    pub fn invalid_character() -> Self {
        Self::protocol(
            FaultCode::InvalidCharacter,
            FaultCode::InvalidCharacter.message().to_string(),
        )
    }

    pub fn invalid_xml_rpc(detail: &str) -> Self {
        Self::protocol(FaultCode::InvalidXmlRpc, format!("Invalid XML-RPC: {}", detail))
    }

    pub fn invalid_json_rpc(detail: &str) -> Self {
        Self::protocol(FaultCode::InvalidXmlRpc, format!("Invalid JSON-RPC: {}", detail))
    }

    pub fn method_not_found(name: &str) -> Self {
        Self::protocol(FaultCode::MethodNotFound, format!("No such method {}", name))
    }

    pub fn invalid_parameters() -> Self {
        Self::protocol(
            FaultCode::InvalidParameters,
            FaultCode::InvalidParameters.message().to_string(),
        )
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::protocol(FaultCode::InternalError, detail.into())
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn string(&self) -> &str {
        &self.message
    }

    /// The protocol fault this is, if its code is one of the named ones
    pub fn kind(&self) -> Option<FaultCode> {
        FaultCode::from_code(self.code)
    }

    /// Struct form `{faultCode, faultString}`
    pub fn to_value(&self) -> Value {
        let mut members = Struct::new();
        members.insert(FAULT_CODE_NAME.to_string(), Value::Integer32(self.code));
        members.insert(
            FAULT_STRING_NAME.to_string(),
            Value::String(self.message.clone()),
        );
        Value::Struct(members)
    }

    /// Inverse of [`Fault::to_value`]; `None` unless both members are present
    /// with the right types
    pub fn from_value(value: &Value) -> Option<Self> {
        let members = value.as_struct().ok()?;
        let code = members.get(FAULT_CODE_NAME)?.as_i32().ok()?;
        let message = members.get(FAULT_STRING_NAME)?.as_str().ok()?;
        Some(Self::from_parts(code, message))
    }
}

impl From<Fault> for Value {
    fn from(fault: Fault) -> Self {
        fault.to_value()
    }
}

impl From<ValueError> for Fault {
    fn from(_: ValueError) -> Self {
        Fault::invalid_parameters()
    }
}

/// Setup-time errors, never sent over the wire
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}: method already added")]
    MethodAlreadyAdded(String),

    #[error("{0}: capability already added")]
    CapabilityAlreadyAdded(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_codes() {
        assert_eq!(FaultCode::NotWellFormed.code(), -32700);
        assert_eq!(FaultCode::MethodNotFound.code(), -32601);
        assert_eq!(FaultCode::InvalidParameters.code(), -32602);
        assert_eq!(FaultCode::InternalError.code(), -32603);
        for kind in [
            FaultCode::NotWellFormed,
            FaultCode::InvalidCharacter,
            FaultCode::InvalidXmlRpc,
            FaultCode::MethodNotFound,
            FaultCode::InvalidParameters,
            FaultCode::InternalError,
        ] {
            assert!(FaultCode::is_reserved(kind.code()));
            assert_eq!(FaultCode::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn test_reserved_code_is_reset() {
        assert_eq!(Fault::new("clash", -32600).code(), 0);
        assert_eq!(Fault::new("low edge", -32768).code(), 0);
        assert_eq!(Fault::new("high edge", -32000).code(), 0);
        assert_eq!(Fault::new("below", -32769).code(), -32769);
        assert_eq!(Fault::new("custom", 42).code(), 42);
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_reserved_code_reset_is_logged() {
        let fault = Fault::new("clash", FaultCode::MethodNotFound.code());
        assert_eq!(fault.code(), 0);
        assert_eq!(fault.string(), "clash");
        assert!(logs_contain("reserved code"));
    }

    #[test]
    fn test_named_fault_messages() {
        assert_eq!(Fault::method_not_found("foo").string(), "No such method foo");
        assert_eq!(
            Fault::invalid_xml_rpc("missing value element").string(),
            "Invalid XML-RPC: missing value element"
        );
        assert_eq!(
            Fault::internal_error("boom").kind(),
            Some(FaultCode::InternalError)
        );
        assert_eq!(Fault::message("app").kind(), None);
    }

    #[test]
    fn test_fault_value_conversion() {
        let fault = Fault::method_not_found("x");
        let value = fault.to_value();
        let members = value.as_struct().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(
            members[FAULT_CODE_NAME],
            Value::Integer32(FaultCode::MethodNotFound.code())
        );
        assert_eq!(Fault::from_value(&value), Some(fault));

        assert_eq!(Fault::from_value(&Value::from("nope")), None);
    }
}
