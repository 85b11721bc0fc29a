use std::io::Write;
use std::rc::Rc;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;

use crate::data::osm::{Node, Tags};
use crate::data::ResultSet;
use crate::errors::{Error, Result};

const GENERATOR: &str = concat!("overpass-rs ", env!("CARGO_PKG_VERSION"));

/// Write `result` as an OSM XML 0.6 document.
///
/// Fails if `result` has no nodes, because the `bounds` are computed from them.
pub fn dump(result: &ResultSet, writer: impl Write) -> Result<()> {
    let nodes = result.nodes();
    let (min_lat, min_lon, max_lat, max_lon) = bounds(&nodes)?;

    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut osm = BytesStart::new("osm");
    osm.push_attribute(("version", "0.6"));
    osm.push_attribute(("generator", GENERATOR));
    xml.write_event(Event::Start(osm))?;

    let mut extent = BytesStart::new("bounds");
    extent.push_attribute(("minlat", min_lat.to_string().as_str()));
    extent.push_attribute(("minlon", min_lon.to_string().as_str()));
    extent.push_attribute(("maxlat", max_lat.to_string().as_str()));
    extent.push_attribute(("maxlon", max_lon.to_string().as_str()));
    xml.write_event(Event::Empty(extent))?;

    for node in &nodes {
        let mut start = BytesStart::new("node");
        start.push_attribute(("id", node.id.to_string().as_str()));
        if let (Some(lat), Some(lon)) = (node.lat, node.lon) {
            start.push_attribute(("lat", lat.to_string().as_str()));
            start.push_attribute(("lon", lon.to_string().as_str()));
        }
        if node.tags.is_empty() {
            xml.write_event(Event::Empty(start))?;
            continue;
        }
        xml.write_event(Event::Start(start))?;
        write_tags(&mut xml, &node.tags)?;
        xml.write_event(Event::End(BytesEnd::new("node")))?;
    }

    for way in result.ways() {
        let mut start = BytesStart::new("way");
        start.push_attribute(("id", way.id.to_string().as_str()));
        if way.node_ids.is_empty() && way.tags.is_empty() {
            xml.write_event(Event::Empty(start))?;
            continue;
        }
        xml.write_event(Event::Start(start))?;
        for node_id in &way.node_ids {
            let mut nd = BytesStart::new("nd");
            nd.push_attribute(("ref", node_id.to_string().as_str()));
            xml.write_event(Event::Empty(nd))?;
        }
        write_tags(&mut xml, &way.tags)?;
        xml.write_event(Event::End(BytesEnd::new("way")))?;
    }

    for relation in result.relations() {
        let mut start = BytesStart::new("relation");
        start.push_attribute(("id", relation.id.to_string().as_str()));
        if relation.members.is_empty() && relation.tags.is_empty() {
            xml.write_event(Event::Empty(start))?;
            continue;
        }
        xml.write_event(Event::Start(start))?;
        for member in &relation.members {
            let mut tag = BytesStart::new("member");
            tag.push_attribute(("type", member.kind().as_str()));
            tag.push_attribute(("ref", member.ref_id().to_string().as_str()));
            tag.push_attribute(("role", member.role()));
            xml.write_event(Event::Empty(tag))?;
        }
        write_tags(&mut xml, &relation.tags)?;
        xml.write_event(Event::End(BytesEnd::new("relation")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("osm")))?;
    Ok(())
}

/// `(min_lat, min_lon, max_lat, max_lon)` over all nodes with coordinates.
fn bounds(nodes: &[Rc<Node>]) -> Result<(Decimal, Decimal, Decimal, Decimal)> {
    let mut coordinates = nodes
        .iter()
        .filter_map(|node| Some((node.lat?, node.lon?)));
    let (lat, lon) = coordinates.next().ok_or_else(|| {
        Error::InvalidArgument("no node with coordinates to compute bounds from".into())
    })?;
    Ok(coordinates.fold(
        (lat, lon, lat, lon),
        |(min_lat, min_lon, max_lat, max_lon), (lat, lon)| {
            (
                min_lat.min(lat),
                min_lon.min(lon),
                max_lat.max(lat),
                max_lon.max(lon),
            )
        },
    ))
}

/// Tags sorted by key, for a stable output.
fn write_tags<W: Write>(xml: &mut Writer<W>, tags: &Tags) -> Result<()> {
    let mut tags: Vec<(&String, &String)> = tags.iter().collect();
    tags.sort();
    for (key, value) in tags {
        let mut tag = BytesStart::new("tag");
        tag.push_attribute(("k", key.as_str()));
        tag.push_attribute(("v", value.as_str()));
        xml.write_event(Event::Empty(tag))?;
    }
    Ok(())
}
