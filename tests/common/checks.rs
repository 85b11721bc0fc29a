//! Expectations shared by the JSON and XML fixtures of the same name.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use overpass_rs::{ElementKind, ElementRef, ResultSet};

pub fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

pub fn timestamp(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, s))
        .unwrap()
}

fn counts(result: &ResultSet) -> [usize; 4] {
    ElementKind::ALL.map(|kind| result.count(kind))
}

pub fn check_area01(result: &ResultSet) {
    assert_eq!(counts(result), [0, 0, 0, 4]);

    let areas = result.areas();
    assert_eq!(areas[0].id, 2448756446);
    assert_eq!(areas[0].tags.len(), 2);
    assert_eq!(areas[1].id, 3600055060);
    assert_eq!(areas[1].tags.len(), 3);
    assert_eq!(areas[2].id, 3605945175);
    assert_eq!(areas[3].id, 3605945176);
    assert_eq!(areas[3].tags["name"], "Troisdorf");

    assert_eq!(result.get_area(3605945175, false).unwrap().id, 3605945175);
    assert!(result.get_area(123456, false).unwrap_err().is_data_incomplete());
    assert_eq!(
        result.area_ids(),
        vec![2448756446, 3600055060, 3605945175, 3605945176]
    );
    assert!(result.node_ids().is_empty());
    assert!(result.way_ids().is_empty());
    assert!(result.relation_ids().is_empty());
}

pub fn check_node01(result: &ResultSet) {
    assert_eq!(counts(result), [3, 0, 0, 0]);

    let nodes = result.nodes();
    assert_eq!(nodes[0].id, 50878400);
    assert_eq!(nodes[0].lat, Some(dec("50.7461788")));
    assert_eq!(nodes[0].lon, Some(dec("7.1742257")));
    assert!(nodes[0].tags.is_empty());

    assert_eq!(nodes[1].id, 100793192);
    assert_eq!(nodes[1].lat, Some(dec("50.7468472")));
    assert_eq!(nodes[1].tags.len(), 1);
    assert_eq!(nodes[1].tags["highway"], "turning_circle");

    let node = &nodes[2];
    assert_eq!(node.id, 3233854234);
    assert_eq!(node.lon, Some(dec("7.1757664")));
    assert_eq!(node.attributes.len(), 5);
    assert_eq!(node.attributes["changeset"].as_i64(), Some(23456789));
    assert_eq!(
        node.attributes["timestamp"].as_timestamp(),
        Some(&timestamp(2014, 12, 14, 7, 27, 19))
    );
    assert_eq!(node.attributes["uid"].as_i64(), Some(345678));
    assert_eq!(node.attributes["user"].as_str(), Some("TestUser"));
    assert_eq!(node.attributes["version"].as_i64(), Some(1));

    assert_eq!(result.get_node(100793192, false).unwrap().id, 100793192);
    assert!(result.get_node(123456, false).unwrap_err().is_data_incomplete());
    assert_eq!(result.node_ids(), vec![50878400, 100793192, 3233854234]);
    assert!(result.way_ids().is_empty());
}

pub fn check_relation01(result: &ResultSet) {
    assert_eq!(counts(result), [0, 0, 1, 0]);

    let relation = result.relations()[0].clone();
    assert_eq!(relation.id, 2046898);
    assert_eq!(relation.tags.len(), 6);
    assert_eq!(relation.tags["from"], "Here");
    assert_eq!(relation.tags["name"], "Test relation");
    assert_eq!(relation.tags["ref"], "609");
    assert_eq!(relation.tags["route"], "bus");
    assert_eq!(relation.tags["to"], "There");
    assert_eq!(relation.tags["type"], "route");

    assert_eq!(relation.attributes.len(), 5);
    assert_eq!(relation.attributes["changeset"].as_i64(), Some(17433822));
    assert_eq!(
        relation.attributes["timestamp"].as_timestamp(),
        Some(&timestamp(2014, 12, 15, 13, 13, 11))
    );
    assert_eq!(relation.attributes["uid"].as_i64(), Some(12345));
    assert_eq!(relation.attributes["user"].as_str(), Some("Username"));
    assert_eq!(relation.attributes["version"].as_i64(), Some(12));

    let kinds: Vec<ElementKind> = relation.members.iter().map(|m| m.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ElementKind::Node,
            ElementKind::Node,
            ElementKind::Node,
            ElementKind::Node,
            ElementKind::Way
        ]
    );
    assert_eq!(relation.members[4].role(), "");
}

pub fn check_relation02(result: &ResultSet) {
    assert_eq!(counts(result), [3, 1, 1, 0]);

    let relation = result.relations()[0].clone();
    assert_eq!(relation.id, 2046898);
    assert_eq!(relation.tags.len(), 6);
    assert_eq!(relation.attributes.len(), 5);
    assert_eq!(relation.members.len(), 4);

    for (member, expected) in relation.members[..3]
        .iter()
        .zip([3233854233, 3233854234, 3233854235])
    {
        assert_eq!(member.kind(), ElementKind::Node);
        match member.resolve(false).unwrap() {
            ElementRef::Node(node) => {
                assert_eq!(node.id, expected);
                assert_eq!(member.ref_id(), node.id);
            }
            other => panic!("expected a node, got {other:?}"),
        }
    }

    let member = &relation.members[3];
    assert_eq!(member.kind(), ElementKind::Way);
    match member.resolve(false).unwrap() {
        ElementRef::Way(way) => assert_eq!(way.id, 317146078),
        other => panic!("expected a way, got {other:?}"),
    }
}

pub fn check_relation04(result: &ResultSet) {
    assert_eq!(counts(result), [0, 0, 1, 0]);

    let relation = result.relations()[0].clone();
    assert_eq!(relation.id, 23092);
    assert_eq!(relation.tags.len(), 10);
    assert_eq!(relation.tags["name:ru"], "Тройсдорф");
    assert_eq!(relation.center_lat, Some(dec("50.8176646")));
    assert_eq!(relation.center_lon, Some(dec("7.0208539")));

    let way = &relation.members[2];
    assert_eq!(way.kind(), ElementKind::Way);
    assert!(way.member().attributes.is_empty());
    let geometry = way.geometry().unwrap();
    assert_eq!(geometry.len(), 2);
    assert_eq!(geometry[0].lat, dec("50.8137408"));
    assert_eq!(geometry[0].lon, dec("6.9813352"));

    // plain way member without inline geometry
    assert_eq!(relation.members[3].geometry(), None);
    assert_eq!(relation.members[0].geometry(), None);
}

pub fn check_way01(result: &ResultSet) {
    assert_eq!(counts(result), [0, 2, 0, 0]);

    let ways = result.ways();
    assert_eq!(ways[0].id, 317146077);
    assert_eq!(ways[0].tags.len(), 1);
    assert_eq!(ways[0].tags["building"], "yes");
    assert!(ways[0].attributes.is_empty());

    let way = &ways[1];
    assert_eq!(way.id, 317146078);
    assert!(way.tags.is_empty());
    assert_eq!(way.attributes.len(), 5);
    assert_eq!(way.attributes["changeset"].as_i64(), Some(23456789));
    assert_eq!(
        way.attributes["timestamp"].as_timestamp(),
        Some(&timestamp(2014, 12, 14, 7, 27, 21))
    );
    assert_eq!(way.attributes["uid"].as_i64(), Some(345678));
    assert_eq!(way.attributes["user"].as_str(), Some("TestUser"));
    assert_eq!(way.attributes["version"].as_i64(), Some(1));

    assert_eq!(result.get_way(317146077, false).unwrap().id, 317146077);
    assert!(result.get_way(123456, false).unwrap_err().is_data_incomplete());
    assert!(result.node_ids().is_empty());
    assert!(result.relation_ids().is_empty());
    assert_eq!(result.way_ids(), vec![317146077, 317146078]);
}

pub fn check_way02(result: &ResultSet) {
    assert_eq!(counts(result), [6, 1, 0, 0]);

    let node = result.nodes()[0].clone();
    assert_eq!(node.id, 3233854233);
    assert_eq!(node.lat, Some(dec("50.7494187")));
    assert_eq!(node.lon, Some(dec("7.1758731")));

    let way = result.ways()[0].clone();
    assert_eq!(way.id, 317146077);
    assert_eq!(way.tags["building"], "yes");

    let nodes = way.nodes().unwrap();
    assert_eq!(nodes.len(), 7);
    assert_eq!(nodes[0].id, 3233854241);
    assert_eq!(nodes[6].id, 3233854241);

    assert!(result.get_way(123456, false).unwrap_err().is_data_incomplete());
    assert_eq!(
        result.node_ids(),
        vec![3233854233, 3233854234, 3233854236, 3233854237, 3233854238, 3233854241]
    );
    assert_eq!(result.way_ids(), vec![317146077]);
}

pub fn check_way03(result: &ResultSet) {
    assert_eq!(counts(result), [4, 1, 0, 0]);

    let way = result.ways()[0].clone();
    assert_eq!(way.id, 225576797);
    assert_eq!(way.tags.len(), 2);
    assert_eq!(way.tags["building"], "kiosk");
    assert_eq!(way.tags["shop"], "florist");
    assert_eq!(way.center_lat, Some(dec("41.8954998")));
    assert_eq!(way.center_lon, Some(dec("12.5032265")));

    for nodes in [way.nodes().unwrap(), way.get_nodes(false).unwrap()] {
        let ids: Vec<i64> = nodes.iter().map(|node| node.id).collect();
        assert_eq!(
            ids,
            vec![2343425525, 2343425528, 2343425526, 2343425523, 2343425525]
        );
    }

    assert_eq!(
        result.node_ids(),
        vec![2343425523, 2343425525, 2343425526, 2343425528]
    );
}
