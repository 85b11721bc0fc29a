//! XML building blocks shared by the tree and the streaming decoder.

use std::str;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use rust_decimal::Decimal;

use super::{parse_decimal, parse_id};
use crate::data::attributes::{self, AttributeValue, Attributes};
use crate::data::osm::{ElementKind, GeometryValue, MemberRef, OsmId, RelationMember};
use crate::errors::{Error, Result};

pub(crate) type XmlAttributes = IndexMap<String, String>;

/// Minimal owned XML element tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: XmlAttributes,
    pub children: Vec<XmlElement>,
    /// Concatenated text content of this element.
    pub text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            ..XmlElement::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Case-insensitive name check.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Parse a document and return its root element.
    pub fn parse(text: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true).expand_empty_elements(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let mut element = XmlElement::new(element_name(&start)?);
                    element.attributes = read_attributes(&start)?;
                    stack.push(element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::format("unbalanced closing tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(str::from_utf8(&data)?);
                    }
                }
                Event::Eof => return Err(Error::format("document has no root element")),
                _ => (),
            }
        }
    }
}

pub(crate) fn element_name(start: &BytesStart) -> Result<String> {
    Ok(str::from_utf8(start.name().as_ref())?.to_string())
}

pub(crate) fn read_attributes(start: &BytesStart) -> Result<XmlAttributes> {
    let mut attrs = XmlAttributes::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// Remove and parse the `id` attribute.
pub(crate) fn take_id(attrs: &mut XmlAttributes) -> Result<OsmId> {
    match attrs.shift_remove("id") {
        Some(id) => parse_id(&id, "id"),
        None => Err(Error::format("element without id")),
    }
}

pub(crate) fn take_decimal(attrs: &mut XmlAttributes, key: &str) -> Result<Option<Decimal>> {
    attrs
        .shift_remove(key)
        .map(|value| parse_decimal(&value, key))
        .transpose()
}

/// Turn the attributes left after the kind-specific ones were taken into element
/// attributes.
pub(crate) fn element_attributes(attrs: XmlAttributes) -> Result<Attributes> {
    attributes::normalize(raw_attributes(attrs))
}

fn raw_attributes(attrs: XmlAttributes) -> Attributes {
    attrs
        .into_iter()
        .map(|(key, value)| (key, AttributeValue::Text(value)))
        .collect()
}

/// `<tag k=".." v=".."/>`
pub(crate) fn parse_tag(attrs: &XmlAttributes) -> Result<(String, String)> {
    let key = attrs
        .get("k")
        .ok_or_else(|| Error::format("Tag without name/key."))?;
    let value = attrs.get("v").cloned().unwrap_or_default();
    Ok((key.clone(), value))
}

/// `<nd ref=".."/>` inside a way.
pub(crate) fn parse_node_ref(attrs: &XmlAttributes) -> Result<OsmId> {
    let node_ref = attrs
        .get("ref")
        .ok_or_else(|| Error::format("Unable to find required ref value."))?;
    parse_id(node_ref, "ref")
}

/// `<center lat=".." lon=".."/>`
pub(crate) fn parse_center(attrs: &XmlAttributes) -> Result<(Decimal, Decimal)> {
    match (attrs.get("lat"), attrs.get("lon")) {
        (Some(lat), Some(lon)) => Ok((parse_decimal(lat, "lat")?, parse_decimal(lon, "lon")?)),
        _ => Err(Error::format("Unable to get lat or lon of way center.")),
    }
}

/// `<nd lat=".." lon=".."/>` inside a way member.
pub(crate) fn parse_geometry_value(attrs: &XmlAttributes) -> Result<GeometryValue> {
    match (attrs.get("lat"), attrs.get("lon")) {
        (Some(lat), Some(lon)) => Ok(GeometryValue {
            lat: parse_decimal(lat, "lat")?,
            lon: parse_decimal(lon, "lon")?,
        }),
        _ => Err(Error::format("geometry value without lat or lon")),
    }
}

/// `<member type=".." ref=".." role=".."/>`; `None` if the type is unknown.
pub(crate) fn parse_member(attrs: &XmlAttributes) -> Result<Option<RelationMember>> {
    let kind = match attrs
        .get("type")
        .and_then(|value| ElementKind::from_type_value(value))
    {
        Some(kind) => kind,
        None => return Ok(None),
    };
    let mut attrs = attrs.clone();
    attrs.shift_remove("type");
    let ref_id = match attrs.shift_remove("ref") {
        Some(value) => parse_id(&value, "ref")?,
        None => return Err(Error::format("member without ref")),
    };
    let role = attrs.shift_remove("role").unwrap_or_default();

    let mut member = MemberRef::new(ref_id, role);
    member.attributes = raw_attributes(attrs);
    Ok(Some(RelationMember::new(kind, member)))
}
