mod common;

use std::rc::Rc;

use pretty_assertions::assert_eq;

use common::{json_fixture, MockApi};
use overpass_rs::{ElementKind, ElementRef, ResultSet};

fn expand_01_with(api: &Rc<MockApi>) -> ResultSet {
    let result = json_fixture("json/result-expand-01.json");
    result.set_api(api.clone());
    result
}

#[test]
fn expand_keeps_existing_elements() {
    let result1 = json_fixture("json/result-expand-01.json");
    assert_eq!(result1.count(ElementKind::Node), 2);
    assert_eq!(result1.count(ElementKind::Way), 1);

    let result2 = json_fixture("json/result-expand-02.json");
    assert_eq!(result2.count(ElementKind::Node), 2);
    assert_eq!(result2.count(ElementKind::Way), 1);

    result1.expand(&result2);

    assert_eq!(result1.count(ElementKind::Node), 3);
    assert_eq!(result1.count(ElementKind::Way), 2);
    assert_eq!(result1.node_ids(), vec![3233854233, 3233854234, 3233854235]);
    // 3233854234 existed before and keeps its own (empty) tags
    assert!(result1.get_node(3233854234, false).unwrap().tags.is_empty());

    // a second expand changes nothing
    result1.expand(&result2);
    assert_eq!(result1.count(ElementKind::Node), 3);
    assert_eq!(result1.count(ElementKind::Relation), 1);
    assert_eq!(result1.count(ElementKind::Area), 1);
}

#[test]
fn merged_relation_resolves_in_its_new_result() {
    let result1 = json_fixture("json/result-expand-01.json");
    result1.expand(&json_fixture("json/result-expand-02.json"));

    let relation = result1.get_relation(2046898, false).unwrap();
    match relation.members[1].resolve(false).unwrap() {
        ElementRef::Way(way) => {
            let ids: Vec<i64> = way.nodes().unwrap().iter().map(|node| node.id).collect();
            assert_eq!(ids, vec![3233854234, 3233854235]);
        }
        other => panic!("expected a way, got {other:?}"),
    }
}

#[test]
fn missing_node_resolvable() {
    let api = Rc::new(MockApi::answering("json/result-expand-02.json"));
    let result = expand_01_with(&api);

    assert!(result.get_node(3233854235, false).unwrap_err().is_data_incomplete());
    assert_eq!(api.calls.get(), 0);

    let node = result.get_node(3233854235, true).unwrap();
    assert_eq!(node.id, 3233854235);
    assert_eq!(api.calls.get(), 1);
    assert_eq!(*api.last_query.borrow(), "\n[out:json];\nnode(3233854235);\nout body;\n");

    // now part of the result, no further query
    result.get_node(3233854235, true).unwrap();
    assert_eq!(api.calls.get(), 1);
}

#[test]
fn missing_node_unresolvable() {
    let api = Rc::new(MockApi::answering("json/result-expand-02.json"));
    let result = expand_01_with(&api);

    let err = result.get_node(123, true).unwrap_err();
    assert!(err.is_data_incomplete());
    // exactly one round trip, never a retry loop
    assert_eq!(api.calls.get(), 1);
    // the fetched elements were merged nevertheless
    assert_eq!(result.count(ElementKind::Node), 3);
}

#[test]
fn missing_way_resolvable() {
    let api = Rc::new(MockApi::answering("json/result-expand-02.json"));
    let result = expand_01_with(&api);

    assert!(result.get_way(317146078, false).is_err());
    assert_eq!(result.get_way(317146078, true).unwrap().id, 317146078);
    assert!(result.get_way(123, true).unwrap_err().is_data_incomplete());
    assert_eq!(api.calls.get(), 2);
}

#[test]
fn missing_relation_resolvable() {
    let api = Rc::new(MockApi::answering("json/result-expand-02.json"));
    let result = expand_01_with(&api);

    assert!(result.get_relation(2046898, false).is_err());
    assert_eq!(result.get_relation(2046898, true).unwrap().id, 2046898);
    assert_eq!(
        *api.last_query.borrow(),
        "\n[out:json];\nrelation(2046898);\nout body;\n"
    );
    assert!(result.get_relation(123, true).unwrap_err().is_data_incomplete());
}

#[test]
fn missing_area_resolvable() {
    let api = Rc::new(MockApi::answering("json/result-expand-02.json"));
    let result = expand_01_with(&api);

    assert!(result.get_area(3605945176, false).is_err());
    assert_eq!(result.get_area(3605945176, true).unwrap().id, 3605945176);
    assert!(result.get_area(123, true).unwrap_err().is_data_incomplete());
}

#[test]
fn member_resolution_goes_through_the_api() {
    let api = Rc::new(MockApi::answering("json/result-expand-01.json"));
    let result = json_fixture("json/relation-01.json");
    result.set_api(api.clone());

    let relation = result.get_relation(2046898, false).unwrap();
    assert!(relation.members[0].resolve(false).unwrap_err().is_data_incomplete());
    match relation.members[0].resolve(true).unwrap() {
        ElementRef::Node(node) => assert_eq!(node.id, 3233854233),
        other => panic!("expected a node, got {other:?}"),
    }
    // not part of the answer
    assert!(relation.members[4].resolve(true).unwrap_err().is_data_incomplete());
    assert_eq!(api.calls.get(), 2);
}

#[test]
fn list_accessors_do_not_query() {
    let api = Rc::new(MockApi::empty());
    let result = expand_01_with(&api);
    assert!(result.get_nodes(Some(123)).is_empty());
    assert_eq!(result.get_ways(None).len(), 1);
    assert_eq!(api.calls.get(), 0);
}
