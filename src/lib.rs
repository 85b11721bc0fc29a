//! Client for the [Overpass API](https://wiki.openstreetmap.org/wiki/Overpass_API).
//!
//! Queries are sent with [`Overpass`], whose JSON or XML answers are decoded into a
//! [`ResultSet`]. Elements of a result can navigate to the elements they reference
//! and, if asked to, fetch missing ones from the server.

pub mod config;
pub mod data;
pub mod decode;
pub mod errors;
pub mod format;
pub mod helper;
pub mod overpass;

pub use crate::data::osm::{
    Area, Element, ElementKind, ElementRef, GeometryValue, MemberRef, Node, OsmElement, OsmId,
    Relation, RelationMember, Tags, Way,
};
pub use crate::data::ResultSet;
pub use crate::decode::{XmlElement, XmlStrategy};
pub use crate::errors::{Error, Result};
pub use crate::overpass::{Overpass, OverpassConfig, Query};
