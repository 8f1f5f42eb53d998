//! Standard `system.*` methods: capabilities and introspection.
//!
//! `system.multicall` is always present on a [`Dispatcher`]; the methods in
//! this module are opt-in through [`SystemMethods::install`].

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Fault};
use crate::value::{Struct, Value, ValueType};

pub const SYSTEM_GET_CAPABILITIES: &str = "system.getCapabilities";
pub const SYSTEM_LIST_METHODS: &str = "system.listMethods";
pub const SYSTEM_METHOD_SIGNATURE: &str = "system.methodSignature";
pub const SYSTEM_METHOD_HELP: &str = "system.methodHelp";

/// Returned by `system.methodSignature` for methods without signatures
pub const SIGNATURE_UNDEFINED: &str = "undef";

const SPEC_URL: &str = "specUrl";
const SPEC_VERSION: &str = "specVersion";

pub const CAPABILITY_XMLRPC: &str = "xmlrpc";
const CAPABILITY_XMLRPC_URL: &str = "http://www.xmlrpc.com/spec";
const CAPABILITY_XMLRPC_VERSION: i32 = 1;

pub const CAPABILITY_FAULTS_INTEROP: &str = "faults_interop";
const CAPABILITY_FAULTS_INTEROP_URL: &str =
    "http://xmlrpc-epi.sourceforge.net/specs/rfc.fault_codes.php";
const CAPABILITY_FAULTS_INTEROP_VERSION: i32 = 20010516;

pub const CAPABILITY_INTROSPECT: &str = "introspect";
const CAPABILITY_INTROSPECT_URL: &str =
    "http://xmlrpc-c.sourceforge.net/xmlrpc-c/introspection.html";
const CAPABILITY_INTROSPECT_VERSION: i32 = 1;

/// One entry of `system.getCapabilities`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub url: String,
    pub version: i32,
}

type Capabilities = Arc<RwLock<BTreeMap<String, Capability>>>;

/// Handle to the system methods registered on a dispatcher.
///
/// The capability table is shared with the registered `system.getCapabilities`
/// callable, so capabilities can be added or removed after installation.
#[derive(Debug, Clone)]
pub struct SystemMethods {
    capabilities: Capabilities,
    introspection: bool,
}

impl SystemMethods {
    /// Register `system.getCapabilities` and, when `introspection` is set,
    /// `system.listMethods`, `system.methodSignature` and `system.methodHelp`
    pub fn install(dispatcher: &mut Dispatcher, introspection: bool) -> Result<Self, Error> {
        let system = Self {
            capabilities: Arc::new(RwLock::new(BTreeMap::new())),
            introspection,
        };
        system.add_capability(
            CAPABILITY_XMLRPC,
            CAPABILITY_XMLRPC_URL,
            CAPABILITY_XMLRPC_VERSION,
        )?;
        system.add_capability(
            CAPABILITY_FAULTS_INTEROP,
            CAPABILITY_FAULTS_INTEROP_URL,
            CAPABILITY_FAULTS_INTEROP_VERSION,
        )?;

        let capabilities = Arc::clone(&system.capabilities);
        dispatcher
            .add_method(SYSTEM_GET_CAPABILITIES, move || {
                capabilities_value(&capabilities.read())
            })?
            .set_help_text("Get server capabilities")
            .add_signature(ValueType::Struct, &[]);

        if introspection {
            dispatcher
                .add_system_method(SYSTEM_LIST_METHODS, list_methods)?
                .set_help_text("Returns a list of the methods the server has")
                .add_signature(ValueType::Array, &[]);

            dispatcher
                .add_system_method(SYSTEM_METHOD_SIGNATURE, method_signature)?
                .set_help_text(
                    "Returns a description of the argument format a particular method expects",
                )
                .add_signature(ValueType::Array, &[ValueType::String]);

            dispatcher
                .add_system_method(SYSTEM_METHOD_HELP, method_help)?
                .set_help_text("Returns a text description of a particular method")
                .add_signature(ValueType::String, &[ValueType::String]);

            system.add_capability(
                CAPABILITY_INTROSPECT,
                CAPABILITY_INTROSPECT_URL,
                CAPABILITY_INTROSPECT_VERSION,
            )?;
        }

        debug!(introspection, "installed system methods");
        Ok(system)
    }

    /// Remove exactly the methods that [`SystemMethods::install`] registered
    pub fn uninstall(self, dispatcher: &mut Dispatcher) {
        if self.introspection {
            dispatcher.remove_method(SYSTEM_METHOD_HELP);
            dispatcher.remove_method(SYSTEM_METHOD_SIGNATURE);
            dispatcher.remove_method(SYSTEM_LIST_METHODS);
        }
        dispatcher.remove_method(SYSTEM_GET_CAPABILITIES);
        debug!("uninstalled system methods");
    }

    pub fn add_capability(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
        version: i32,
    ) -> Result<(), Error> {
        let name = name.into();
        let mut capabilities = self.capabilities.write();
        if capabilities.contains_key(&name) {
            return Err(Error::CapabilityAlreadyAdded(name));
        }
        capabilities.insert(
            name,
            Capability {
                url: url.into(),
                version,
            },
        );
        Ok(())
    }

    pub fn remove_capability(&self, name: &str) {
        self.capabilities.write().remove(name);
    }

    pub fn capability(&self, name: &str) -> Option<Capability> {
        self.capabilities.read().get(name).cloned()
    }

    pub fn has_introspection(&self) -> bool {
        self.introspection
    }
}

fn capabilities_value(capabilities: &BTreeMap<String, Capability>) -> Struct {
    capabilities
        .iter()
        .map(|(name, capability)| {
            let mut entry = Struct::new();
            entry.insert(SPEC_URL.to_string(), Value::from(capability.url.as_str()));
            entry.insert(SPEC_VERSION.to_string(), Value::from(capability.version));
            (name.clone(), Value::from(entry))
        })
        .collect()
}

fn list_methods(dispatcher: &Dispatcher, params: &[Value]) -> Result<Value, Fault> {
    if !params.is_empty() {
        return Err(Fault::invalid_parameters());
    }
    Ok(Value::Array(
        dispatcher.method_names().into_iter().map(Value::from).collect(),
    ))
}

fn method_signature(dispatcher: &Dispatcher, params: &[Value]) -> Result<Value, Fault> {
    let name = method_name_parameter(params)?;
    let method = dispatcher
        .method(name)
        .filter(|method| !method.is_hidden())
        .ok_or_else(|| no_such_method(name))?;

    if method.signatures().is_empty() {
        return Ok(Value::from(SIGNATURE_UNDEFINED));
    }

    let signatures = method
        .signatures()
        .iter()
        .map(|signature| {
            let mut types = Vec::with_capacity(signature.len());
            for value_type in signature {
                // nil only makes sense as a return type
                if *value_type == ValueType::Nil && !types.is_empty() {
                    continue;
                }
                types.push(Value::from(value_type.name()));
            }
            Value::Array(types)
        })
        .collect();
    Ok(Value::Array(signatures))
}

fn method_help(dispatcher: &Dispatcher, params: &[Value]) -> Result<Value, Fault> {
    let name = method_name_parameter(params)?;
    dispatcher
        .method(name)
        .filter(|method| !method.is_hidden())
        .map(|method| Value::from(method.help_text()))
        .ok_or_else(|| no_such_method(name))
}

fn method_name_parameter(params: &[Value]) -> Result<&str, Fault> {
    let [name] = params else {
        return Err(Fault::invalid_parameters());
    };
    name.as_str()
}

fn no_such_method(name: &str) -> Fault {
    Fault::message(format!("No method {}", name))
}
