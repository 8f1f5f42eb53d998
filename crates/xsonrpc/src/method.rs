//! Registered methods and the adapters that bind native Rust callables to the
//! uniform `&[Value] -> Result<Value, Fault>` call signature.

use std::fmt;

use crate::dispatcher::Dispatcher;
use crate::error::Fault;
use crate::value::{Array, Binary, DateTime, Struct, Value, ValueType};

/// Type-erased callable stored by the dispatcher
pub type Method = Box<dyn Fn(&[Value]) -> Result<Value, Fault> + Send + Sync>;

/// Callable that also needs the dispatcher it is registered on
pub(crate) type SystemMethod =
    Box<dyn Fn(&Dispatcher, &[Value]) -> Result<Value, Fault> + Send + Sync>;

pub(crate) enum Callable {
    Plain(Method),
    System(SystemMethod),
}

/// Extract a native parameter from a [`Value`]
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, Fault>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_bool()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_i32()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_double()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Binary {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_binary().map(<[u8]>::to_vec)
    }
}

impl FromValue for DateTime {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_datetime().copied()
    }
}

impl FromValue for Array {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_array().cloned()
    }
}

impl FromValue for Struct {
    fn from_value(value: &Value) -> Result<Self, Fault> {
        value.as_struct().cloned()
    }
}

/// Convert what a native callable returns into a call result
pub trait IntoMethodResult {
    fn into_method_result(self) -> Result<Value, Fault>;
}

macro_rules! impl_into_method_result {
    ($($ty:ty),*) => {
        $(
            impl IntoMethodResult for $ty {
                fn into_method_result(self) -> Result<Value, Fault> {
                    Ok(Value::from(self))
                }
            }

            impl IntoMethodResult for Result<$ty, Fault> {
                fn into_method_result(self) -> Result<Value, Fault> {
                    self.map(Value::from)
                }
            }
        )*
    };
}

impl_into_method_result!(
    (),
    Value,
    bool,
    i32,
    i64,
    f64,
    String,
    &'static str,
    Binary,
    DateTime,
    Array,
    Struct
);

/// A native callable that can be registered with
/// [`Dispatcher::add_method`](crate::Dispatcher::add_method).
///
/// Implemented for every `Fn(A1, .., An) -> R` with up to eight parameters
/// where each `Ai: FromValue` and `R: IntoMethodResult`. `Args` only
/// distinguishes the arities and is inferred at the registration site.
pub trait Handler<Args>: Send + Sync + 'static {
    fn call(&self, params: &[Value]) -> Result<Value, Fault>;
}

impl<F, R> Handler<()> for F
where
    F: Fn() -> R + Send + Sync + 'static,
    R: IntoMethodResult,
{
    fn call(&self, params: &[Value]) -> Result<Value, Fault> {
        if !params.is_empty() {
            return Err(Fault::invalid_parameters());
        }
        self().into_method_result()
    }
}

macro_rules! impl_handler {
    ($($arg:ident $param:ident),+) => {
        impl<F, R, $($arg),+> Handler<($($arg,)+)> for F
        where
            F: Fn($($arg),+) -> R + Send + Sync + 'static,
            R: IntoMethodResult,
            $($arg: FromValue,)+
        {
            fn call(&self, params: &[Value]) -> Result<Value, Fault> {
                let [$($param),+] = params else {
                    return Err(Fault::invalid_parameters());
                };
                self($($arg::from_value($param)?),+).into_method_result()
            }
        }
    };
}

impl_handler!(A1 p1);
impl_handler!(A1 p1, A2 p2);
impl_handler!(A1 p1, A2 p2, A3 p3);
impl_handler!(A1 p1, A2 p2, A3 p3, A4 p4);
impl_handler!(A1 p1, A2 p2, A3 p3, A4 p4, A5 p5);
impl_handler!(A1 p1, A2 p2, A3 p3, A4 p4, A5 p5, A6 p6);
impl_handler!(A1 p1, A2 p2, A3 p3, A4 p4, A5 p5, A6 p6, A7 p7);
impl_handler!(A1 p1, A2 p2, A3 p3, A4 p4, A5 p5, A6 p6, A7 p7, A8 p8);

/// One registered method: the callable plus its introspection metadata
pub struct MethodWrapper {
    callable: Callable,
    help_text: String,
    signatures: Vec<Vec<ValueType>>,
    hidden: bool,
}

impl MethodWrapper {
    pub fn new(method: Method) -> Self {
        Self::from_callable(Callable::Plain(method))
    }

    /// Wrap a typed native callable
    pub fn from_handler<H, Args>(handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        Self::new(Box::new(move |params: &[Value]| handler.call(params)))
    }

    pub(crate) fn from_callable(callable: Callable) -> Self {
        Self {
            callable,
            help_text: String::new(),
            signatures: Vec::new(),
            hidden: false,
        }
    }

    pub fn set_help_text(&mut self, help: impl Into<String>) -> &mut Self {
        self.help_text = help.into();
        self
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn has_help_text(&self) -> bool {
        !self.help_text.is_empty()
    }

    /// Declare one signature, return type first. Purely informational: it is
    /// not checked against the callable.
    pub fn add_signature(&mut self, return_type: ValueType, parameter_types: &[ValueType]) -> &mut Self {
        let mut signature = Vec::with_capacity(parameter_types.len() + 1);
        signature.push(return_type);
        signature.extend_from_slice(parameter_types);
        self.signatures.push(signature);
        self
    }

    pub fn signatures(&self) -> &[Vec<ValueType>] {
        &self.signatures
    }

    /// Hidden methods are left out of `system.listMethods` and refused by
    /// the other introspection methods
    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        self.hidden = hidden;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) fn invoke(&self, dispatcher: &Dispatcher, params: &[Value]) -> Result<Value, Fault> {
        match &self.callable {
            Callable::Plain(method) => method(params),
            Callable::System(method) => method(dispatcher, params),
        }
    }
}

impl fmt::Debug for MethodWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodWrapper")
            .field("help_text", &self.help_text)
            .field("signatures", &self.signatures)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultCode;

    fn call<Args: 'static>(handler: impl Handler<Args>, params: &[Value]) -> Result<Value, Fault> {
        MethodWrapper::from_handler(handler).invoke(&Dispatcher::new(), params)
    }

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    #[test]
    fn test_typed_arguments() {
        assert_eq!(call(add, &[Value::from(2), Value::from(3)]), Ok(Value::from(5)));
        assert_eq!(
            call(|a: String, b: String| a + &b, &[Value::from("ab"), Value::from("cd")]),
            Ok(Value::from("abcd"))
        );
        assert_eq!(call(|| true, &[]), Ok(Value::from(true)));
    }

    #[test]
    fn test_arity_mismatch() {
        let expected = FaultCode::InvalidParameters.code();
        assert_eq!(call(add, &[Value::from(1)]).unwrap_err().code(), expected);
        assert_eq!(
            call(add, &[Value::from(1), Value::from(2), Value::from(3)])
                .unwrap_err()
                .code(),
            expected
        );
        assert_eq!(call(|| 1, &[Value::Nil]).unwrap_err().code(), expected);
    }

    #[test]
    fn test_type_mismatch() {
        let fault = call(add, &[Value::from(1), Value::from(2i64)]).unwrap_err();
        assert_eq!(fault.kind(), Some(FaultCode::InvalidParameters));
    }

    #[test]
    fn test_unit_return_is_nil() {
        assert_eq!(call(|_: bool| (), &[Value::from(false)]), Ok(Value::Nil));
    }

    #[test]
    fn test_fault_return_propagates() {
        let divide = |a: f64, b: f64| -> Result<f64, Fault> {
            if b == 0.0 {
                Err(Fault::new("division by zero", 1))
            } else {
                Ok(a / b)
            }
        };
        assert_eq!(call(divide, &[Value::from(1.0), Value::from(4.0)]), Ok(Value::from(0.25)));
        assert_eq!(
            call(divide, &[Value::from(1.0), Value::from(0.0)]),
            Err(Fault::new("division by zero", 1))
        );
    }

    #[test]
    fn test_value_parameter_is_passed_through() {
        let echo = |value: Value| value;
        let input = Value::from(vec![Value::from(1), Value::from("x")]);
        assert_eq!(call(echo, std::slice::from_ref(&input)), Ok(input));
    }

    #[test]
    fn test_metadata() {
        let mut method = MethodWrapper::new(Box::new(|params: &[Value]| -> Result<Value, Fault> {
            Ok(params.first().cloned().unwrap_or(Value::from(true)))
        }));
        assert!(!method.has_help_text());
        method
            .set_help_text("test help")
            .add_signature(ValueType::Boolean, &[])
            .add_signature(ValueType::String, &[ValueType::String])
            .add_signature(ValueType::Integer32, &[ValueType::String, ValueType::Boolean]);

        assert!(method.has_help_text());
        assert_eq!(method.help_text(), "test help");
        assert_eq!(
            method.signatures(),
            &[
                vec![ValueType::Boolean],
                vec![ValueType::String, ValueType::String],
                vec![ValueType::Integer32, ValueType::String, ValueType::Boolean],
            ]
        );

        let dispatcher = Dispatcher::new();
        assert_eq!(method.invoke(&dispatcher, &[]), Ok(Value::from(true)));
        assert_eq!(
            method.invoke(&dispatcher, &[Value::from("foobar")]),
            Ok(Value::from("foobar"))
        );
    }
}
