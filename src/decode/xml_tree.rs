//! Tree-walking XML decoder.
//!
//! Child elements are matched case-insensitively; anything that is not part of the
//! vocabulary is ignored.

use std::rc::Rc;

use log::debug;

use super::new_result;
use super::xml::{
    element_attributes, parse_center, parse_geometry_value, parse_member, parse_node_ref,
    parse_tag, take_decimal, take_id, XmlElement,
};
use crate::data::osm::{Area, Element, ElementKind, Node, Relation, RelationMember, Tags, Way};
use crate::data::ResultSet;
use crate::errors::{Error, Result};
use crate::overpass::Query;

pub fn decode_tree(root: &XmlElement, api: Option<Rc<dyn Query>>) -> Result<ResultSet> {
    let result = new_result(api);
    for kind in ElementKind::ALL {
        for child in root.children.iter().filter(|child| child.is(kind.as_str())) {
            let element: Element = match kind {
                ElementKind::Node => Node::from_xml(child)?.into(),
                ElementKind::Way => Way::from_xml(child)?.into(),
                ElementKind::Relation => Relation::from_xml(child)?.into(),
                ElementKind::Area => Area::from_xml(child)?.into(),
            };
            result.append(element);
        }
    }
    debug!(
        nodes = result.count(ElementKind::Node),
        ways = result.count(ElementKind::Way),
        relations = result.count(ElementKind::Relation),
        areas = result.count(ElementKind::Area);
        "Decoded XML tree"
    );
    Ok(result)
}

fn check_name(element: &XmlElement, expected: ElementKind) -> Result<()> {
    if element.is(expected.as_str()) {
        Ok(())
    } else {
        Err(Error::WrongType {
            expected: expected.as_str().to_string(),
            provided: Some(element.name.to_lowercase()),
        })
    }
}

fn read_tags(element: &XmlElement) -> Result<Tags> {
    element
        .children
        .iter()
        .filter(|child| child.is("tag"))
        .map(|child| parse_tag(&child.attributes))
        .collect()
}

impl Node {
    pub fn from_xml(element: &XmlElement) -> Result<Node> {
        check_name(element, ElementKind::Node)?;
        let mut attrs = element.attributes.clone();

        let id = take_id(&mut attrs)?;
        let lat = take_decimal(&mut attrs, "lat")?;
        let lon = take_decimal(&mut attrs, "lon")?;
        let mut node = Node::new(id, lat, lon);
        node.tags = read_tags(element)?;
        node.attributes = element_attributes(attrs)?;
        Ok(node)
    }
}

impl Way {
    pub fn from_xml(element: &XmlElement) -> Result<Way> {
        check_name(element, ElementKind::Way)?;
        let mut attrs = element.attributes.clone();

        let mut way = Way::new(take_id(&mut attrs)?, Vec::new());
        for child in &element.children {
            if child.is("nd") {
                way.node_ids.push(parse_node_ref(&child.attributes)?);
            } else if child.is("center") {
                let (lat, lon) = parse_center(&child.attributes)?;
                way.center_lat = Some(lat);
                way.center_lon = Some(lon);
            }
        }
        way.tags = read_tags(element)?;
        way.attributes = element_attributes(attrs)?;
        Ok(way)
    }
}

impl Relation {
    pub fn from_xml(element: &XmlElement) -> Result<Relation> {
        check_name(element, ElementKind::Relation)?;
        let mut attrs = element.attributes.clone();

        let mut relation = Relation::new(take_id(&mut attrs)?, Vec::new());
        for child in &element.children {
            if child.is("member") {
                if let Some(member) = RelationMember::from_xml(child)? {
                    relation.members.push(member);
                }
            } else if child.is("center") {
                let (lat, lon) = parse_center(&child.attributes)?;
                relation.center_lat = Some(lat);
                relation.center_lon = Some(lon);
            }
        }
        relation.tags = read_tags(element)?;
        relation.attributes = element_attributes(attrs)?;
        Ok(relation)
    }
}

impl Area {
    pub fn from_xml(element: &XmlElement) -> Result<Area> {
        check_name(element, ElementKind::Area)?;
        let mut attrs = element.attributes.clone();

        let mut area = Area::new(take_id(&mut attrs)?);
        area.tags = read_tags(element)?;
        area.attributes = element_attributes(attrs)?;
        Ok(area)
    }
}

impl RelationMember {
    /// Decode a `<member>` element; `None` for member types we do not model.
    pub fn from_xml(element: &XmlElement) -> Result<Option<RelationMember>> {
        if !element.is("member") {
            return Err(Error::WrongType {
                expected: "member".to_string(),
                provided: Some(element.name.to_lowercase()),
            });
        }
        let mut member = match parse_member(&element.attributes)? {
            Some(member) => member,
            None => return Ok(None),
        };
        if let RelationMember::Way { geometry, .. } = &mut member {
            for child in element.children.iter().filter(|child| child.is("nd")) {
                geometry
                    .get_or_insert_with(Vec::new)
                    .push(parse_geometry_value(&child.attributes)?);
            }
        }
        Ok(Some(member))
    }
}
