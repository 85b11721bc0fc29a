//! OSM primitives as returned by the Overpass API.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;
use rust_decimal::Decimal;

use super::attributes::Attributes;
use super::{ResultSet, Store};
use crate::errors::{Error, Result};

pub type OsmId = i64;

pub type Tags = HashMap<String, String>;

/// Non-owning handle from an element back to the result it lives in.
pub(crate) type StoreRef = Weak<RefCell<Store>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
    Area,
}

impl ElementKind {
    /// Decoding order: nodes first so ways and relations can refer to them.
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Node,
        ElementKind::Way,
        ElementKind::Relation,
        ElementKind::Area,
    ];

    /// The `type` discriminator used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
            ElementKind::Area => "area",
        }
    }

    pub fn from_type_value(value: &str) -> Option<Self> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities shared by the four primitives.
pub trait OsmElement {
    const KIND: ElementKind;

    fn id(&self) -> OsmId;
    fn tags(&self) -> &Tags;
    fn attributes(&self) -> &Attributes;
}

fn upgrade(result: &StoreRef) -> Result<ResultSet> {
    result
        .upgrade()
        .map(ResultSet::from_store)
        .ok_or_else(|| Error::DataIncomplete("the owning result is no longer available".into()))
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: OsmId,
    pub lat: Option<Decimal>,
    pub lon: Option<Decimal>,
    pub tags: Tags,
    pub attributes: Attributes,
    pub(crate) result: StoreRef,
}

impl Node {
    pub fn new(id: OsmId, lat: Option<Decimal>, lon: Option<Decimal>) -> Self {
        Node {
            id,
            lat,
            lon,
            tags: Tags::new(),
            attributes: Attributes::new(),
            result: Weak::new(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.lat == other.lat
            && self.lon == other.lon
            && self.tags == other.tags
            && self.attributes == other.attributes
    }
}

#[derive(Debug, Clone)]
pub struct Way {
    pub id: OsmId,
    /// Ids of the nodes forming the way, in path order.
    pub node_ids: Vec<OsmId>,
    pub center_lat: Option<Decimal>,
    pub center_lon: Option<Decimal>,
    pub tags: Tags,
    pub attributes: Attributes,
    pub(crate) result: StoreRef,
}

impl Way {
    pub fn new(id: OsmId, node_ids: Vec<OsmId>) -> Self {
        Way {
            id,
            node_ids,
            center_lat: None,
            center_lon: None,
            tags: Tags::new(),
            attributes: Attributes::new(),
            result: Weak::new(),
        }
    }

    /// Nodes of the way, looked up in the owning result only.
    pub fn nodes(&self) -> Result<Vec<Rc<Node>>> {
        self.get_nodes(false)
    }

    /// Nodes of the way in `node_ids` order.
    ///
    /// With `resolve_missing` the first miss triggers exactly one follow-up query for
    /// all nodes of the way. Any node still missing after that is a
    /// [`Error::DataIncomplete`].
    pub fn get_nodes(&self, resolve_missing: bool) -> Result<Vec<Rc<Node>>> {
        let result = upgrade(&self.result)?;
        let mut nodes = Vec::with_capacity(self.node_ids.len());
        let mut resolved = false;

        for &node_id in &self.node_ids {
            if let Some(node) = result.lookup::<Node>(node_id) {
                nodes.push(node);
                continue;
            }
            if !resolve_missing {
                return Err(Error::DataIncomplete(
                    "Resolve missing nodes is disabled".into(),
                ));
            }
            if resolved {
                return Err(Error::DataIncomplete("Unable to resolve all nodes".into()));
            }

            debug!(way_id = self.id, node_id = node_id; "Way node missing, resolving whole way");
            let query = format!("\n[out:json];\nway({});\nnode(w);\nout body;\n", self.id);
            result.resolve_with(&query)?;
            resolved = true;

            match result.lookup::<Node>(node_id) {
                Some(node) => nodes.push(node),
                None => {
                    return Err(Error::DataIncomplete("Unable to resolve all nodes".into()))
                }
            }
        }
        Ok(nodes)
    }
}

impl PartialEq for Way {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.node_ids == other.node_ids
            && self.center_lat == other.center_lat
            && self.center_lon == other.center_lon
            && self.tags == other.tags
            && self.attributes == other.attributes
    }
}

#[derive(Debug, Clone)]
pub struct Relation {
    pub id: OsmId,
    /// Members in role order.
    pub members: Vec<RelationMember>,
    pub center_lat: Option<Decimal>,
    pub center_lon: Option<Decimal>,
    pub tags: Tags,
    pub attributes: Attributes,
    pub(crate) result: StoreRef,
}

impl Relation {
    pub fn new(id: OsmId, members: Vec<RelationMember>) -> Self {
        Relation {
            id,
            members,
            center_lat: None,
            center_lon: None,
            tags: Tags::new(),
            attributes: Attributes::new(),
            result: Weak::new(),
        }
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.members == other.members
            && self.center_lat == other.center_lat
            && self.center_lon == other.center_lon
            && self.tags == other.tags
            && self.attributes == other.attributes
    }
}

/// Named region; has no geometry of its own.
#[derive(Debug, Clone)]
pub struct Area {
    pub id: OsmId,
    pub tags: Tags,
    pub attributes: Attributes,
    pub(crate) result: StoreRef,
}

impl Area {
    pub fn new(id: OsmId) -> Self {
        Area {
            id,
            tags: Tags::new(),
            attributes: Attributes::new(),
            result: Weak::new(),
        }
    }
}

impl PartialEq for Area {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tags == other.tags && self.attributes == other.attributes
    }
}

macro_rules! impl_osm_element {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl OsmElement for $ty {
                const KIND: ElementKind = ElementKind::$kind;

                fn id(&self) -> OsmId {
                    self.id
                }

                fn tags(&self) -> &Tags {
                    &self.tags
                }

                fn attributes(&self) -> &Attributes {
                    &self.attributes
                }
            }
        )*
    };
}

impl_osm_element!(Node => Node, Way => Way, Relation => Relation, Area => Area);

/// Coordinate pair the server inlines for way members of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryValue {
    pub lat: Decimal,
    pub lon: Decimal,
}

/// Reference part shared by every member variant.
#[derive(Debug, Clone)]
pub struct MemberRef {
    pub ref_id: OsmId,
    /// Function of the member within the relation, possibly empty.
    pub role: String,
    pub attributes: Attributes,
    pub(crate) result: StoreRef,
}

impl MemberRef {
    pub fn new(ref_id: OsmId, role: impl Into<String>) -> Self {
        MemberRef {
            ref_id,
            role: role.into(),
            attributes: Attributes::new(),
            result: Weak::new(),
        }
    }
}

impl PartialEq for MemberRef {
    fn eq(&self, other: &Self) -> bool {
        self.ref_id == other.ref_id
            && self.role == other.role
            && self.attributes == other.attributes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelationMember {
    Node(MemberRef),
    Way {
        member: MemberRef,
        geometry: Option<Vec<GeometryValue>>,
    },
    Relation(MemberRef),
    Area(MemberRef),
}

impl RelationMember {
    pub fn new(kind: ElementKind, member: MemberRef) -> Self {
        match kind {
            ElementKind::Node => RelationMember::Node(member),
            ElementKind::Way => RelationMember::Way {
                member,
                geometry: None,
            },
            ElementKind::Relation => RelationMember::Relation(member),
            ElementKind::Area => RelationMember::Area(member),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            RelationMember::Node(_) => ElementKind::Node,
            RelationMember::Way { .. } => ElementKind::Way,
            RelationMember::Relation(_) => ElementKind::Relation,
            RelationMember::Area(_) => ElementKind::Area,
        }
    }

    pub fn member(&self) -> &MemberRef {
        match self {
            RelationMember::Node(member)
            | RelationMember::Way { member, .. }
            | RelationMember::Relation(member)
            | RelationMember::Area(member) => member,
        }
    }

    pub(crate) fn member_mut(&mut self) -> &mut MemberRef {
        match self {
            RelationMember::Node(member)
            | RelationMember::Way { member, .. }
            | RelationMember::Relation(member)
            | RelationMember::Area(member) => member,
        }
    }

    pub fn ref_id(&self) -> OsmId {
        self.member().ref_id
    }

    pub fn role(&self) -> &str {
        &self.member().role
    }

    /// Inline geometry, only ever present on way members.
    pub fn geometry(&self) -> Option<&[GeometryValue]> {
        match self {
            RelationMember::Way {
                geometry: Some(geometry),
                ..
            } => Some(geometry),
            _ => None,
        }
    }

    /// Look up the referenced element, with the same single retry as the
    /// `ResultSet::get_*` accessors.
    pub fn resolve(&self, resolve_missing: bool) -> Result<ElementRef> {
        let result = upgrade(&self.member().result)?;
        let ref_id = self.ref_id();
        Ok(match self.kind() {
            ElementKind::Node => ElementRef::Node(result.get_node(ref_id, resolve_missing)?),
            ElementKind::Way => ElementRef::Way(result.get_way(ref_id, resolve_missing)?),
            ElementKind::Relation => {
                ElementRef::Relation(result.get_relation(ref_id, resolve_missing)?)
            }
            ElementKind::Area => ElementRef::Area(result.get_area(ref_id, resolve_missing)?),
        })
    }
}

/// An element on its way into a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
    Area(Area),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Node(_) => ElementKind::Node,
            Element::Way(_) => ElementKind::Way,
            Element::Relation(_) => ElementKind::Relation,
            Element::Area(_) => ElementKind::Area,
        }
    }

    pub fn id(&self) -> OsmId {
        match self {
            Element::Node(node) => node.id,
            Element::Way(way) => way.id,
            Element::Relation(relation) => relation.id,
            Element::Area(area) => area.id,
        }
    }
}

impl From<Node> for Element {
    fn from(value: Node) -> Self {
        Element::Node(value)
    }
}

impl From<Way> for Element {
    fn from(value: Way) -> Self {
        Element::Way(value)
    }
}

impl From<Relation> for Element {
    fn from(value: Relation) -> Self {
        Element::Relation(value)
    }
}

impl From<Area> for Element {
    fn from(value: Area) -> Self {
        Element::Area(value)
    }
}

/// An element stored in a result.
#[derive(Debug, Clone)]
pub enum ElementRef {
    Node(Rc<Node>),
    Way(Rc<Way>),
    Relation(Rc<Relation>),
    Area(Rc<Area>),
}

impl ElementRef {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementRef::Node(_) => ElementKind::Node,
            ElementRef::Way(_) => ElementKind::Way,
            ElementRef::Relation(_) => ElementKind::Relation,
            ElementRef::Area(_) => ElementKind::Area,
        }
    }

    pub fn id(&self) -> OsmId {
        match self {
            ElementRef::Node(node) => node.id,
            ElementRef::Way(way) => way.id,
            ElementRef::Relation(relation) => relation.id,
            ElementRef::Area(area) => area.id,
        }
    }
}
