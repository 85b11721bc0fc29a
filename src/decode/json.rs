//! Overpass JSON (`[out:json]`) decoder.

use std::rc::Rc;

use log::debug;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::{new_result, parse_decimal};
use crate::data::attributes::{self, AttributeValue, Attributes};
use crate::data::osm::{
    Area, Element, ElementKind, GeometryValue, MemberRef, Node, OsmId, Relation, RelationMember,
    Tags, Way,
};
use crate::data::ResultSet;
use crate::errors::{Error, Result};
use crate::overpass::Query;

type Object = Map<String, Value>;

/// Decode the `elements` array of a parsed document.
///
/// Elements are appended kind by kind (nodes, ways, relations, areas), each kind in
/// array order. An element of unknown type fails the whole document.
pub fn decode_document(data: &Value, api: Option<Rc<dyn Query>>) -> Result<ResultSet> {
    let elements = match data.get("elements") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(elements)) => elements.as_slice(),
        Some(_) => return Err(Error::format("'elements' must be an array")),
    };

    let kinds = elements
        .iter()
        .map(element_kind)
        .collect::<Result<Vec<_>>>()?;

    let result = new_result(api);
    for kind in ElementKind::ALL {
        for (element, _) in elements
            .iter()
            .zip(&kinds)
            .filter(|(_, element_kind)| **element_kind == kind)
        {
            result.append(decode_element(kind, element)?);
        }
    }

    debug!(
        nodes = result.count(ElementKind::Node),
        ways = result.count(ElementKind::Way),
        relations = result.count(ElementKind::Relation),
        areas = result.count(ElementKind::Area);
        "Decoded JSON document"
    );
    Ok(result)
}

fn element_kind(element: &Value) -> Result<ElementKind> {
    let type_value = element.get("type").and_then(Value::as_str);
    type_value
        .and_then(|value| ElementKind::from_type_value(&value.to_lowercase()))
        .ok_or_else(|| {
            Error::format(format!(
                "unknown element type '{}'",
                type_value.unwrap_or("None")
            ))
        })
}

fn decode_element(kind: ElementKind, data: &Value) -> Result<Element> {
    Ok(match kind {
        ElementKind::Node => Node::from_json(data)?.into(),
        ElementKind::Way => Way::from_json(data)?.into(),
        ElementKind::Relation => Relation::from_json(data)?.into(),
        ElementKind::Area => Area::from_json(data)?.into(),
    })
}

fn as_object(data: &Value) -> Result<&Object> {
    data.as_object()
        .ok_or_else(|| Error::format("element must be a JSON object"))
}

fn check_type(object: &Object, expected: ElementKind) -> Result<()> {
    match object.get("type").and_then(Value::as_str) {
        Some(provided) if provided == expected.as_str() => Ok(()),
        provided => Err(Error::WrongType {
            expected: expected.as_str().to_string(),
            provided: provided.map(str::to_string),
        }),
    }
}

fn read_integer(object: &Object, key: &str) -> Result<OsmId> {
    match object.get(key) {
        Some(value) => value
            .as_i64()
            .ok_or_else(|| Error::format(format!("'{key}' must be an integer, got {value}"))),
        None => Err(Error::format(format!("missing required '{key}'"))),
    }
}

fn read_tags(object: &Object) -> Result<Tags> {
    match object.get("tags") {
        None | Some(Value::Null) => Ok(Tags::new()),
        Some(Value::Object(tags)) => tags
            .iter()
            .map(|(key, value)| match value {
                Value::String(value) => Ok((key.clone(), value.clone())),
                other => Err(Error::format(format!("tag '{key}' has non-string value {other}"))),
            })
            .collect(),
        Some(other) => Err(Error::format(format!("'tags' must be an object, got {other}"))),
    }
}

fn decimal(value: &Value, field: &str) -> Result<Decimal> {
    match value {
        Value::Number(number) => parse_decimal(&number.to_string(), field),
        Value::String(text) => parse_decimal(text, field),
        other => Err(Error::format(format!("'{field}' must be a number, got {other}"))),
    }
}

fn optional_decimal(object: &Object, key: &str) -> Result<Option<Decimal>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decimal(value, key).map(Some),
    }
}

fn read_center(object: &Object) -> Result<(Option<Decimal>, Option<Decimal>)> {
    let center = match object.get("center") {
        None | Some(Value::Null) => return Ok((None, None)),
        Some(Value::Object(center)) => center,
        Some(other) => {
            return Err(Error::format(format!("'center' must be an object, got {other}")))
        }
    };
    match (optional_decimal(center, "lat")?, optional_decimal(center, "lon")?) {
        (Some(lat), Some(lon)) => Ok((Some(lat), Some(lon))),
        _ => Err(Error::format("Unable to get lat or lon of way center.")),
    }
}

/// Everything not in `consumed`, as received.
fn remaining(object: &Object, consumed: &[&str]) -> Attributes {
    object
        .iter()
        .filter(|(key, _)| !consumed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), AttributeValue::from(value.clone())))
        .collect()
}

fn element_attributes(object: &Object, consumed: &[&str]) -> Result<Attributes> {
    attributes::normalize(remaining(object, consumed))
}

impl Node {
    pub fn from_json(data: &Value) -> Result<Node> {
        let object = as_object(data)?;
        check_type(object, ElementKind::Node)?;

        let mut node = Node::new(
            read_integer(object, "id")?,
            optional_decimal(object, "lat")?,
            optional_decimal(object, "lon")?,
        );
        node.tags = read_tags(object)?;
        node.attributes = element_attributes(object, &["type", "id", "lat", "lon", "tags"])?;
        Ok(node)
    }
}

impl Way {
    pub fn from_json(data: &Value) -> Result<Way> {
        let object = as_object(data)?;
        check_type(object, ElementKind::Way)?;

        let node_ids = match object.get("nodes") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(ids)) => ids
                .iter()
                .map(|id| {
                    id.as_i64()
                        .ok_or_else(|| Error::format(format!("invalid node reference {id}")))
                })
                .collect::<Result<_>>()?,
            Some(other) => {
                return Err(Error::format(format!("'nodes' must be an array, got {other}")))
            }
        };

        let mut way = Way::new(read_integer(object, "id")?, node_ids);
        (way.center_lat, way.center_lon) = read_center(object)?;
        way.tags = read_tags(object)?;
        way.attributes = element_attributes(object, &["center", "id", "nodes", "tags", "type"])?;
        Ok(way)
    }
}

impl Relation {
    pub fn from_json(data: &Value) -> Result<Relation> {
        let object = as_object(data)?;
        check_type(object, ElementKind::Relation)?;

        let mut members = Vec::new();
        match object.get("members") {
            None | Some(Value::Null) => {}
            Some(Value::Array(entries)) => {
                for entry in entries {
                    if let Some(member) = RelationMember::from_json(entry)? {
                        members.push(member);
                    }
                }
            }
            Some(other) => {
                return Err(Error::format(format!("'members' must be an array, got {other}")))
            }
        }

        let mut relation = Relation::new(read_integer(object, "id")?, members);
        (relation.center_lat, relation.center_lon) = read_center(object)?;
        relation.tags = read_tags(object)?;
        relation.attributes =
            element_attributes(object, &["center", "id", "members", "tags", "type"])?;
        Ok(relation)
    }
}

impl Area {
    pub fn from_json(data: &Value) -> Result<Area> {
        let object = as_object(data)?;
        check_type(object, ElementKind::Area)?;

        let mut area = Area::new(read_integer(object, "id")?);
        area.tags = read_tags(object)?;
        area.attributes = element_attributes(object, &["id", "tags", "type"])?;
        Ok(area)
    }
}

impl RelationMember {
    /// Decode one entry of a relation's `members`; `None` for member types we
    /// do not model.
    pub fn from_json(data: &Value) -> Result<Option<RelationMember>> {
        let object = as_object(data)?;
        match object
            .get("type")
            .and_then(Value::as_str)
            .and_then(ElementKind::from_type_value)
        {
            Some(kind) => RelationMember::from_json_as(kind, data).map(Some),
            None => {
                debug!(member_type = object.get("type").and_then(Value::as_str).unwrap_or("None");
                    "Skipping relation member of unknown type");
                Ok(None)
            }
        }
    }

    /// Decode `data` as a member of the given kind.
    pub fn from_json_as(kind: ElementKind, data: &Value) -> Result<RelationMember> {
        let object = as_object(data)?;
        check_type(object, kind)?;

        let role = match object.get("role") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(role)) => role.clone(),
            Some(other) => {
                return Err(Error::format(format!("'role' must be a string, got {other}")))
            }
        };
        let mut member = MemberRef::new(read_integer(object, "ref")?, role);
        member.attributes = remaining(object, &["geometry", "type", "ref", "role"]);

        Ok(match kind {
            ElementKind::Way => RelationMember::Way {
                member,
                geometry: read_geometry(object)?,
            },
            kind => RelationMember::new(kind, member),
        })
    }
}

fn read_geometry(object: &Object) -> Result<Option<Vec<GeometryValue>>> {
    let entries = match object.get("geometry") {
        Some(Value::Array(entries)) => entries,
        _ => return Ok(None),
    };
    entries
        .iter()
        .map(|entry| {
            let point = entry
                .as_object()
                .ok_or_else(|| Error::format(format!("invalid geometry value {entry}")))?;
            match (optional_decimal(point, "lat")?, optional_decimal(point, "lon")?) {
                (Some(lat), Some(lon)) => Ok(GeometryValue { lat, lon }),
                _ => Err(Error::format("geometry value without lat or lon")),
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}
