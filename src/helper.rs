//! Canned queries for common street lookups.

use std::rc::Rc;

use crate::data::osm::Node;
use crate::data::ResultSet;
use crate::errors::Result;
use crate::overpass::Query;

/// Highways named `street` inside the area `areacode`, without service roads and
/// tracks, together with their nodes.
pub fn get_street(api: &dyn Query, street: &str, areacode: &str) -> Result<ResultSet> {
    let query = format!(
        r#"
        area({areacode})->.location;
        (
            way[highway][name="{street}"](area.location);
            - (
                way[highway=service](area.location);
                way[highway=track](area.location);
            );
        );
        out body;
        >;
        out skel qt;
    "#
    );
    api.query(&query)
}

/// Nodes shared by the highways named `street1` and `street2` inside `areacode`.
pub fn get_intersection(
    api: &dyn Query,
    street1: &str,
    street2: &str,
    areacode: &str,
) -> Result<Vec<Rc<Node>>> {
    let query = format!(
        r#"
        area({areacode})->.location;
        (
            way[highway][name="{street1}"](area.location); node(w)->.n1;
            way[highway][name="{street2}"](area.location); node(w)->.n2;
        );
        node.n1.n2;
        out meta;
    "#
    );
    Ok(api.query(&query)?.nodes())
}
