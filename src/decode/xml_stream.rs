//! Streaming XML decoder.
//!
//! Works on start/end events in document order and only keeps the element being
//! read in memory. Element names are matched exactly and unknown names are an
//! error.

use std::io::BufRead;
use std::mem;
use std::rc::Rc;

use log::debug;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::new_result;
use super::xml::{
    element_attributes, element_name, parse_center, parse_geometry_value, parse_member,
    parse_node_ref, parse_tag, read_attributes, take_decimal, take_id, XmlAttributes,
};
use crate::data::osm::{Area, Element, ElementKind, Node, Relation, RelationMember, Tags, Way};
use crate::data::ResultSet;
use crate::errors::{Error, Result};
use crate::overpass::Query;

/// Opening tags without any effect.
const IGNORE_START: [&str; 5] = ["osm", "meta", "note", "bounds", "remark"];
/// Closing tags without any effect.
const IGNORE_END: [&str; 8] = [
    "osm", "meta", "note", "bounds", "remark", "tag", "nd", "center",
];

pub fn decode_text(text: &str, api: Option<Rc<dyn Query>>) -> Result<ResultSet> {
    decode_reader(text.as_bytes(), api)
}

pub fn decode_reader(input: impl BufRead, api: Option<Rc<dyn Query>>) -> Result<ResultSet> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true).expand_empty_elements(true);

    let mut decoder = StreamDecoder::new(new_result(api));
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(start) => {
                let name = element_name(&start)?;
                decoder.start(&name, read_attributes(&start)?)?;
            }
            Event::End(end) => {
                let name = std::str::from_utf8(end.name().as_ref())?.to_string();
                decoder.end(&name)?;
            }
            // remark and note text, declarations, comments
            _ => (),
        }
        buf.clear();
    }

    let result = decoder.finish()?;
    debug!(
        nodes = result.count(ElementKind::Node),
        ways = result.count(ElementKind::Way),
        relations = result.count(ElementKind::Relation),
        areas = result.count(ElementKind::Area);
        "Decoded XML stream"
    );
    Ok(result)
}

/// Element currently being read.
#[derive(Default)]
enum Current {
    #[default]
    Top,
    Node(Node),
    Way(Way),
    Relation(Relation),
    Area(Area),
}

impl Current {
    fn tags_mut(&mut self) -> Option<&mut Tags> {
        match self {
            Current::Top => None,
            Current::Node(node) => Some(&mut node.tags),
            Current::Way(way) => Some(&mut way.tags),
            Current::Relation(relation) => Some(&mut relation.tags),
            Current::Area(area) => Some(&mut area.tags),
        }
    }
}

struct StreamDecoder {
    result: ResultSet,
    current: Current,
    /// Inside a `<member>` of the current relation, which is its last member.
    in_member: bool,
}

impl StreamDecoder {
    fn new(result: ResultSet) -> Self {
        StreamDecoder {
            result,
            current: Current::Top,
            in_member: false,
        }
    }

    fn start(&mut self, name: &str, mut attrs: XmlAttributes) -> Result<()> {
        if IGNORE_START.contains(&name) {
            return Ok(());
        }
        match name {
            "node" => {
                let id = take_id(&mut attrs)?;
                let lat = take_decimal(&mut attrs, "lat")?;
                let lon = take_decimal(&mut attrs, "lon")?;
                let mut node = Node::new(id, lat, lon);
                node.attributes = element_attributes(attrs)?;
                self.current = Current::Node(node);
            }
            "way" => {
                let mut way = Way::new(take_id(&mut attrs)?, Vec::new());
                way.attributes = element_attributes(attrs)?;
                self.current = Current::Way(way);
            }
            "relation" => {
                let mut relation = Relation::new(take_id(&mut attrs)?, Vec::new());
                relation.attributes = element_attributes(attrs)?;
                self.current = Current::Relation(relation);
            }
            "area" => {
                let mut area = Area::new(take_id(&mut attrs)?);
                area.attributes = element_attributes(attrs)?;
                self.current = Current::Area(area);
            }
            "tag" => {
                let (key, value) = parse_tag(&attrs)?;
                self.current
                    .tags_mut()
                    .ok_or_else(|| Error::format("tag outside of an element"))?
                    .insert(key, value);
            }
            "nd" => self.start_nd(&attrs)?,
            "center" => {
                let (lat, lon) = parse_center(&attrs)?;
                match &mut self.current {
                    Current::Way(way) => {
                        way.center_lat = Some(lat);
                        way.center_lon = Some(lon);
                    }
                    Current::Relation(relation) => {
                        relation.center_lat = Some(lat);
                        relation.center_lon = Some(lon);
                    }
                    _ => return Err(Error::format("center outside of a way or relation")),
                }
            }
            "member" => {
                let Current::Relation(relation) = &mut self.current else {
                    return Err(Error::format("member outside of a relation"));
                };
                let member = parse_member(&attrs)?.ok_or_else(|| {
                    Error::format(format!(
                        "Undefined type for member: '{}'",
                        attrs.get("type").map(String::as_str).unwrap_or_default()
                    ))
                })?;
                relation.members.push(member);
                self.in_member = true;
            }
            other => return Err(Error::format(format!("Unknown element start '{other}'"))),
        }
        Ok(())
    }

    /// `<nd>` is a node reference inside a way but a coordinate inside a way member.
    fn start_nd(&mut self, attrs: &XmlAttributes) -> Result<()> {
        match &mut self.current {
            Current::Relation(relation) if self.in_member => match relation.members.last_mut() {
                Some(RelationMember::Way { geometry, .. }) => {
                    geometry
                        .get_or_insert_with(Vec::new)
                        .push(parse_geometry_value(attrs)?);
                    Ok(())
                }
                _ => Err(Error::format("nd inside a member that is not a way")),
            },
            Current::Way(way) => {
                way.node_ids.push(parse_node_ref(attrs)?);
                Ok(())
            }
            _ => Err(Error::format("nd outside of a way")),
        }
    }

    fn end(&mut self, name: &str) -> Result<()> {
        if IGNORE_END.contains(&name) {
            return Ok(());
        }
        match name {
            "node" | "way" | "relation" | "area" => self.flush(name),
            "member" => {
                self.in_member = false;
                Ok(())
            }
            other => Err(Error::format(format!("Unknown element end '{other}'"))),
        }
    }

    fn flush(&mut self, name: &str) -> Result<()> {
        let element: Element = match mem::take(&mut self.current) {
            Current::Node(node) if name == "node" => node.into(),
            Current::Way(way) if name == "way" => way.into(),
            Current::Relation(relation) if name == "relation" => relation.into(),
            Current::Area(area) if name == "area" => area.into(),
            _ => return Err(Error::format(format!("unexpected closing tag '{name}'"))),
        };
        self.in_member = false;
        self.result.append(element);
        Ok(())
    }

    fn finish(self) -> Result<ResultSet> {
        match self.current {
            Current::Top => Ok(self.result),
            _ => Err(Error::format("document ended inside an element")),
        }
    }
}
