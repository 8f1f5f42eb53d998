use std::any::Any;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::error::{Error, Fault};
use crate::method::{Callable, Handler, IntoMethodResult, MethodWrapper};
use crate::response::Response;
use crate::value::{Value, ValueError, ValueType};

pub const SYSTEM_MULTICALL: &str = "system.multicall";

/// Call descriptor member naming the method to run
pub const METHOD_NAME: &str = "methodName";
/// Call descriptor member holding the positional parameters
pub const PARAMS: &str = "params";

/// Registry of named methods and the single place where calls are executed.
///
/// Registration needs `&mut self` and is expected to finish before the
/// dispatcher is shared; [`Dispatcher::invoke`] only needs `&self`, so an
/// `Arc<Dispatcher>` can serve concurrent callers as long as the registered
/// callables are themselves safe to call concurrently.
pub struct Dispatcher {
    methods: BTreeMap<String, MethodWrapper>,
}

impl Dispatcher {
    /// New dispatcher with `system.multicall` already registered
    pub fn new() -> Self {
        let mut dispatcher = Self {
            methods: BTreeMap::new(),
        };
        dispatcher.methods.insert(
            SYSTEM_MULTICALL.to_string(),
            Self::multicall_wrapper(),
        );
        dispatcher
    }

    fn multicall_wrapper() -> MethodWrapper {
        let mut wrapper = MethodWrapper::from_callable(Callable::System(Box::new(
            |dispatcher: &Dispatcher, params: &[Value]| dispatcher.system_multicall(params),
        )));
        wrapper
            .set_help_text("Call multiple methods at once")
            .add_signature(ValueType::Array, &[ValueType::Array]);
        wrapper
    }

    /// Register a typed native callable.
    ///
    /// Arguments are converted from the call's parameters at invocation time;
    /// a count or type mismatch yields `InvalidParametersFault`.
    pub fn add_method<H, Args>(
        &mut self,
        name: impl Into<String>,
        handler: H,
    ) -> Result<&mut MethodWrapper, Error>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.insert(name.into(), MethodWrapper::from_handler(handler))
    }

    /// Register a callable that receives the raw parameter list and does its
    /// own count and type checks
    pub fn add_raw_method<F, R>(
        &mut self,
        name: impl Into<String>,
        method: F,
    ) -> Result<&mut MethodWrapper, Error>
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: IntoMethodResult,
    {
        self.insert(
            name.into(),
            MethodWrapper::new(Box::new(move |params: &[Value]| {
                method(params).into_method_result()
            })),
        )
    }

    pub(crate) fn add_system_method<F>(
        &mut self,
        name: &str,
        method: F,
    ) -> Result<&mut MethodWrapper, Error>
    where
        F: Fn(&Dispatcher, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        self.insert(
            name.to_string(),
            MethodWrapper::from_callable(Callable::System(Box::new(method))),
        )
    }

    fn insert(&mut self, name: String, wrapper: MethodWrapper) -> Result<&mut MethodWrapper, Error> {
        match self.methods.entry(name) {
            Entry::Occupied(entry) => Err(Error::MethodAlreadyAdded(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(method = %entry.key(), "registered method");
                Ok(entry.insert(wrapper))
            }
        }
    }

    /// Remove a method; unknown names are ignored
    pub fn remove_method(&mut self, name: &str) {
        if self.methods.remove(name).is_some() {
            debug!(method = name, "removed method");
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodWrapper> {
        self.methods.get(name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut MethodWrapper> {
        self.methods.get_mut(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Names of all registered methods that are not hidden, sorted
    pub fn method_names(&self) -> Vec<String> {
        self.methods
            .iter()
            .filter(|(_, method)| !method.is_hidden())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Run `name` with `parameters`.
    ///
    /// Always returns a response: unknown methods, faults raised by the
    /// callable and panics inside it all become fault responses.
    pub fn invoke(&self, name: &str, parameters: &[Value], id: Value) -> Response {
        let Some(method) = self.methods.get(name) else {
            debug!(method = name, "method not found");
            return Response::from_fault(Fault::method_not_found(name), id);
        };

        debug!(method = name, params = parameters.len(), "invoking method");
        let result = match panic::catch_unwind(AssertUnwindSafe(|| method.invoke(self, parameters))) {
            Ok(result) => result,
            Err(payload) => Err(panic_fault(name, payload)),
        };

        match result {
            Ok(value) => Response::success(value, id),
            Err(fault) => {
                debug!(method = name, code = fault.code(), fault = %fault, "method raised fault");
                Response::from_fault(fault, id)
            }
        }
    }

    fn system_multicall(&self, params: &[Value]) -> Result<Value, Fault> {
        let calls = params
            .first()
            .ok_or_else(Fault::invalid_parameters)?
            .as_array()?;
        debug!(calls = calls.len(), "system.multicall");

        let results = calls
            .iter()
            .map(|call| match self.multicall_entry(call) {
                Ok(value) => Value::Array(vec![value]),
                Err(fault) => fault.to_value(),
            })
            .collect();
        Ok(Value::Array(results))
    }

    fn multicall_entry(&self, call: &Value) -> Result<Value, Fault> {
        let method_name = call.get(METHOD_NAME)?.as_str()?;
        if method_name == SYSTEM_MULTICALL {
            return Err(Fault::internal_error("Recursive system.multicall forbidden"));
        }

        let params = match call.get(PARAMS) {
            Ok(params) => params.as_array()?.as_slice(),
            Err(ValueError::KeyNotFound(_)) => &[],
            Err(err) => return Err(err.into()),
        };
        self.invoke(method_name, params, Value::Nil).into_result()
    }
}

fn panic_fault(method: &str, payload: Box<dyn Any + Send>) -> Fault {
    let message = payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());

    match message {
        Some(message) if is_bounds_check(&message) => {
            debug!(method, panic = %message, "method indexed past its parameters");
            Fault::invalid_parameters()
        }
        Some(message) => {
            error!(method, panic = %message, "method panicked");
            Fault::message(message)
        }
        None => {
            error!(method, "method panicked with a non-string payload");
            Fault::message("unknown error")
        }
    }
}

/// Panic messages of the standard library's slice bounds checks
fn is_bounds_check(message: &str) -> bool {
    ["index out of bounds", "range start index", "range end index", "slice index starts"]
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
