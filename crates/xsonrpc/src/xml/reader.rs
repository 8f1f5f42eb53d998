use quick_xml::events::Event;
use tracing::debug;

use super::*;
use crate::error::{FAULT_CODE_NAME, FAULT_STRING_NAME, Fault};
use crate::request::Request;
use crate::response::Response;
use crate::util::{base64_decode, parse_iso8601};
use crate::value::{Struct, Value};
use crate::writer::Reader;

/// Deepest element nesting accepted; three levels per nested array
/// (`value`, `array`, `data`) keep this near 128 value levels
const MAX_DEPTH: usize = 384;

/// Element tree built from the token stream
#[derive(Debug)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn is(&self, tag: &str) -> bool {
        self.name == tag
    }

    fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }

    fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.is(tag))
    }

    fn last_child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().rev().find(|child| child.is(tag))
    }

    fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.is(tag))
    }
}

/// Decodes one XML-RPC document.
///
/// The document is parsed eagerly in [`XmlReader::new`], so syntax errors
/// surface there and the `Reader` methods only report structural problems.
#[derive(Debug)]
pub struct XmlReader {
    root: Element,
}

impl XmlReader {
    /// Parse `data`. Invalid UTF-8 yields `InvalidCharacterFault`, any other
    /// XML syntax error `NotWellFormedFault`.
    pub fn new(data: &[u8]) -> Result<Self, Fault> {
        let text = std::str::from_utf8(data).map_err(|err| {
            debug!(error = %err, "XML-RPC document is not valid UTF-8");
            Fault::invalid_character()
        })?;
        Ok(Self {
            root: parse_document(text)?,
        })
    }
}

fn parse_document(text: &str) -> Result<Element, Fault> {
    let mut reader = quick_xml::Reader::from_str(text);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.check_end_names = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if root.is_some() {
                    debug!("XML-RPC document has more than one root element");
                    return Err(Fault::not_well_formed());
                }
                if stack.len() >= MAX_DEPTH {
                    debug!(limit = MAX_DEPTH, "XML-RPC document nested too deeply");
                    return Err(Fault::invalid_xml_rpc("document nested too deeply"));
                }
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(Element::new(name));
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(Fault::not_well_formed)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|err| {
                    debug!(error = %err, "invalid XML text");
                    Fault::not_well_formed()
                })?;
                match stack.last_mut() {
                    Some(element) => element.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(Fault::not_well_formed()),
                }
            }
            Ok(Event::CData(data)) => {
                let data = data.into_inner();
                let text = std::str::from_utf8(&data).map_err(|_| Fault::invalid_character())?;
                match stack.last_mut() {
                    Some(element) => element.text.push_str(text),
                    None => return Err(Fault::not_well_formed()),
                }
            }
            Ok(Event::Eof) => break,
            // declaration, comments, processing instructions and doctype
            Ok(_) => {}
            Err(err) => {
                debug!(error = %err, position = reader.buffer_position(), "malformed XML");
                return Err(Fault::not_well_formed());
            }
        }
    }

    if !stack.is_empty() {
        debug!(open = stack.len(), "XML document ended with unclosed elements");
        return Err(Fault::not_well_formed());
    }
    root.ok_or_else(Fault::not_well_formed)
}

impl Reader for XmlReader {
    fn get_request(&mut self) -> Result<Request, Fault> {
        let root = &self.root;
        if !root.is(METHOD_CALL_TAG) {
            return Err(Fault::invalid_xml_rpc("missing method call element"));
        }

        let name = root
            .child(METHOD_NAME_TAG)
            .map(|name| name.text.trim())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Fault::invalid_xml_rpc("missing method name"))?;

        let mut parameters = Vec::new();
        if let Some(params) = root.child(PARAMS_TAG) {
            for param in params.children_named(PARAM_TAG) {
                parameters.push(parse_value(param.first_child())?);
            }
        }
        Ok(Request::new(name, parameters))
    }

    fn get_response(&mut self) -> Result<Response, Fault> {
        let root = &self.root;
        if !root.is(METHOD_RESPONSE_TAG) {
            return Err(Fault::invalid_xml_rpc("missing method response element"));
        }

        if let Some(params) = root.child(PARAMS_TAG) {
            let param = params
                .child(PARAM_TAG)
                .ok_or_else(|| Fault::invalid_xml_rpc("missing param or fault element"))?;
            return Ok(Response::success(parse_value(param.first_child())?, Value::Nil));
        }

        let fault = root
            .child(FAULT_TAG)
            .ok_or_else(|| Fault::invalid_xml_rpc("missing param or fault element"))?;
        let value = parse_value(fault.first_child())?;
        let Value::Struct(members) = value else {
            return Err(Fault::invalid_xml_rpc("fault is not a struct"));
        };
        let code = match members.get(FAULT_CODE_NAME) {
            Some(Value::Integer32(code)) => *code,
            _ => return Err(Fault::invalid_xml_rpc("missing or invalid fault code")),
        };
        let message = match members.get(FAULT_STRING_NAME) {
            Some(Value::String(message)) => message.as_str(),
            _ => return Err(Fault::invalid_xml_rpc("missing or invalid fault string")),
        };
        Ok(Response::fault(code, message, Value::Nil))
    }

    fn get_value(&mut self) -> Result<Value, Fault> {
        parse_value(Some(&self.root))
    }
}

fn parse_value(element: Option<&Element>) -> Result<Value, Fault> {
    let element = element
        .filter(|element| element.is(VALUE_TAG))
        .ok_or_else(|| Fault::invalid_xml_rpc("missing value element"))?;

    // a value without a type element is a string
    let Some(typed) = element.first_child() else {
        return Ok(Value::String(element.text.clone()));
    };
    let text = typed.text.trim();

    match typed.name.as_str() {
        ARRAY_TAG => {
            let data = typed
                .child(DATA_TAG)
                .ok_or_else(|| Fault::invalid_xml_rpc("missing data element in array"))?;
            let array = data
                .children
                .iter()
                .map(|child| parse_value(Some(child)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(array))
        }
        BASE_64_TAG => base64_decode(text)
            .map(Value::Binary)
            .ok_or_else(|| Fault::invalid_xml_rpc("value is not base64")),
        BOOLEAN_TAG => match text {
            "1" | "true" => Ok(Value::Boolean(true)),
            "0" | "false" => Ok(Value::Boolean(false)),
            _ => Err(Fault::invalid_xml_rpc("value is not a boolean")),
        },
        DATE_TIME_TAG => parse_iso8601(text)
            .map(Value::DateTime)
            .ok_or_else(|| Fault::invalid_xml_rpc("value is not a date/time")),
        DOUBLE_TAG => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| Fault::invalid_xml_rpc("value is not a double")),
        INTEGER_32_TAG | INTEGER_INT_TAG => text
            .parse::<i32>()
            .map(Value::Integer32)
            .map_err(|_| Fault::invalid_xml_rpc("value is not a 32-bit integer")),
        INTEGER_64_TAG => text
            .parse::<i64>()
            .map(Value::Integer64)
            .map_err(|_| Fault::invalid_xml_rpc("value is not a 64-bit integer")),
        NIL_TAG => Ok(Value::Nil),
        STRING_TAG => Ok(Value::String(typed.text.clone())),
        STRUCT_TAG => {
            let mut members = Struct::new();
            for member in typed.children_named(MEMBER_TAG) {
                let name = member
                    .child(NAME_TAG)
                    .map(|name| name.text.as_str())
                    .ok_or_else(|| Fault::invalid_xml_rpc("missing name element in struct"))?;
                let value = parse_value(member.last_child(VALUE_TAG))?;
                members.insert(name.to_string(), value);
            }
            Ok(Value::Struct(members))
        }
        _ => Err(Fault::invalid_xml_rpc("invalid type")),
    }
}
