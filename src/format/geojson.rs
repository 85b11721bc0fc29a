use std::io::Write;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::data::osm::Node;
use crate::data::ResultSet;
use crate::errors::{Error, Result};

/// Write `result` as a GeoJSON `FeatureCollection`.
///
/// `nodes` adds one `Point` per node, `ways` one `LineString` per way. Way nodes are
/// looked up in `result` only, so a way with missing nodes is an error.
pub fn dump(result: &ResultSet, writer: impl Write, nodes: bool, ways: bool) -> Result<()> {
    let mut features = Vec::new();

    if nodes {
        for node in result.nodes() {
            features.push(feature(json!({
                "type": "Point",
                "coordinates": position(&node)?,
            })));
        }
    }

    if ways {
        for way in result.ways() {
            let coordinates = way
                .nodes()?
                .iter()
                .map(|node| position(node))
                .collect::<Result<Vec<Value>>>()?;
            features.push(feature(json!({
                "type": "LineString",
                "coordinates": coordinates,
            })));
        }
    }

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    serde_json::to_writer(writer, &collection)?;
    Ok(())
}

fn feature(geometry: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {},
    })
}

/// `[lon, lat]` as floats.
fn position(node: &Node) -> Result<Value> {
    match (node.lat, node.lon) {
        (Some(lat), Some(lon)) => Ok(json!([float(lon)?, float(lat)?])),
        _ => Err(Error::InvalidArgument(format!(
            "node {} has no coordinates",
            node.id
        ))),
    }
}

fn float(value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| Error::InvalidArgument(format!("{value} is not representable as float")))
}
