//! Exporters writing a [`ResultSet`](crate::data::ResultSet) to other formats.

pub mod geojson;
pub mod osm_xml;
