//! Response decoding for the selectable API formats.
//!
//! JSON bodies become a `serde_json::Value`, XML bodies an owned
//! [`XmlElement`] tree, anything else is handed back untouched. Both
//! structured formats recognise the service's error envelope and turn it
//! into [`VimeoError::RemoteApi`].

use crate::error::{Result, VimeoError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Response format requested from the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
    /// Formats returned without processing (`jsonp`, `php`, ...).
    Other(String),
}

impl ResponseFormat {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for ResponseFormat {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "xml" => Self::Xml,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ResponseFormat {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ResponseFormat> for String {
    fn from(value: ResponseFormat) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Xml(XmlElement),
    Raw { format: String, body: Vec<u8> },
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Self::Xml(root) => Some(root),
            _ => None,
        }
    }

    pub fn raw_body(&self) -> Option<&[u8]> {
        match self {
            Self::Raw { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn into_json(self) -> Result<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Xml(_) => Err(VimeoError::decode("json", "response was decoded as xml")),
            Self::Raw { format, .. } => Err(VimeoError::decode(
                "json",
                format!("response was returned raw ({})", format),
            )),
        }
    }

    /// Deserialize a JSON payload into a typed model.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        let value = self.into_json()?;
        serde_json::from_value(value).map_err(|e| VimeoError::decode("json", e))
    }
}

/// An element of a parsed XML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlElement>,
    /// Concatenated character data directly inside this element.
    pub text: String,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8(start.name().as_ref().to_vec())
            .map_err(|e| VimeoError::decode("xml", e))?;
        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| VimeoError::decode("xml", e))?;
            let key = String::from_utf8(attr.key.as_ref().to_vec())
                .map_err(|e| VimeoError::decode("xml", e))?;
            let value = attr
                .unescape_value()
                .map_err(|e| VimeoError::decode("xml", e))?
                .into_owned();
            attributes.insert(key, value);
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }
}

/// Decode a raw body according to `format`.
///
/// Pure function of its inputs: decoding the same body twice gives equal
/// payloads, and a malformed body never yields a partial value.
pub fn decode(format: &ResponseFormat, body: &[u8]) -> Result<Payload> {
    match format {
        ResponseFormat::Json => {
            let value: Value =
                serde_json::from_slice(body).map_err(|e| VimeoError::decode("json", e))?;
            unwrap_json_envelope(value).map(Payload::Json)
        }
        ResponseFormat::Xml => {
            let root = parse_xml(body)?;
            check_xml_envelope(&root)?;
            Ok(Payload::Xml(root))
        }
        ResponseFormat::Other(name) => Ok(Payload::Raw {
            format: name.clone(),
            body: body.to_vec(),
        }),
    }
}

/// Strip `stat`/`generated_in` and unwrap the single content key.
fn unwrap_json_envelope(value: Value) -> Result<Value> {
    let mut map = match value {
        Value::Object(map) => map,
        other => return Ok(other),
    };
    let Some(stat) = map.remove("stat") else {
        return Ok(Value::Object(map));
    };
    map.remove("generated_in");

    if stat.as_str() == Some("fail") {
        let err = map.get("err");
        let field = |name: &str| err.and_then(|e| e.get(name)).map(scalar_to_string);
        return Err(VimeoError::RemoteApi {
            code: field("code").unwrap_or_default(),
            message: field("msg").unwrap_or_else(|| "unknown error".to_string()),
            explanation: field("expl"),
        });
    }

    if map.len() == 1 {
        if let Some((_, content)) = map.into_iter().next() {
            return Ok(content);
        }
        return Ok(Value::Null);
    }
    Ok(Value::Object(map))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_xml_envelope(root: &XmlElement) -> Result<()> {
    if root.name != "rsp" || root.attr("stat") != Some("fail") {
        return Ok(());
    }
    let err = root.child("err");
    let field = |name: &str| err.and_then(|e| e.attr(name)).map(str::to_string);
    Err(VimeoError::RemoteApi {
        code: field("code").unwrap_or_default(),
        message: field("msg").unwrap_or_else(|| "unknown error".to_string()),
        explanation: field("expl"),
    })
}

/// Parse a complete XML document into an element tree.
pub fn parse_xml(body: &[u8]) -> Result<XmlElement> {
    let text = std::str::from_utf8(body).map_err(|e| VimeoError::decode("xml", e))?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| VimeoError::decode("xml", format!("at byte {}: {}", reader.buffer_position(), e)))?;
        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(VimeoError::decode("xml", "multiple root elements"));
                }
                stack.push(XmlElement::from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| VimeoError::decode("xml", "unexpected closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| VimeoError::decode("xml", e))?;
                if text.trim().is_empty() {
                    continue;
                }
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None => return Err(VimeoError::decode("xml", "text outside the root element")),
                }
            }
            Event::CData(data) => {
                let data = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| VimeoError::decode("xml", e))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&data),
                    None => return Err(VimeoError::decode("xml", "CDATA outside the root element")),
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(VimeoError::decode("xml", "unclosed element at end of input"));
    }
    root.ok_or_else(|| VimeoError::decode("xml", "document has no root element"))
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(VimeoError::decode("xml", "multiple root elements")),
    }
    Ok(())
}
