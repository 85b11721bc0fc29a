use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use log::{debug, info};

use self::osm::{Area, Element, ElementKind, Node, OsmElement, OsmId, Relation, StoreRef, Way};
use crate::errors::{Error, Result};
use crate::overpass::Query;

pub mod attributes;
pub mod osm;

/// Elements of one result, keyed by kind and id, in insertion order.
#[derive(Default)]
pub(crate) struct Store {
    nodes: IndexMap<OsmId, Rc<Node>>,
    ways: IndexMap<OsmId, Rc<Way>>,
    relations: IndexMap<OsmId, Rc<Relation>>,
    areas: IndexMap<OsmId, Rc<Area>>,
    api: Option<Rc<dyn Query>>,
}

/// Per-kind access to the collections of a [`Store`].
pub(crate) trait Stored: OsmElement + Clone {
    fn collection(store: &Store) -> &IndexMap<OsmId, Rc<Self>>;
    fn collection_mut(store: &mut Store) -> &mut IndexMap<OsmId, Rc<Self>>;
    /// Point the element (and anything it owns) at the result it is stored in.
    fn bind(&mut self, result: &StoreRef);
}

impl Stored for Node {
    fn collection(store: &Store) -> &IndexMap<OsmId, Rc<Self>> {
        &store.nodes
    }

    fn collection_mut(store: &mut Store) -> &mut IndexMap<OsmId, Rc<Self>> {
        &mut store.nodes
    }

    fn bind(&mut self, result: &StoreRef) {
        self.result = result.clone();
    }
}

impl Stored for Way {
    fn collection(store: &Store) -> &IndexMap<OsmId, Rc<Self>> {
        &store.ways
    }

    fn collection_mut(store: &mut Store) -> &mut IndexMap<OsmId, Rc<Self>> {
        &mut store.ways
    }

    fn bind(&mut self, result: &StoreRef) {
        self.result = result.clone();
    }
}

impl Stored for Relation {
    fn collection(store: &Store) -> &IndexMap<OsmId, Rc<Self>> {
        &store.relations
    }

    fn collection_mut(store: &mut Store) -> &mut IndexMap<OsmId, Rc<Self>> {
        &mut store.relations
    }

    fn bind(&mut self, result: &StoreRef) {
        self.result = result.clone();
        for member in &mut self.members {
            member.member_mut().result = result.clone();
        }
    }
}

impl Stored for Area {
    fn collection(store: &Store) -> &IndexMap<OsmId, Rc<Self>> {
        &store.areas
    }

    fn collection_mut(store: &mut Store) -> &mut IndexMap<OsmId, Rc<Self>> {
        &mut store.areas
    }

    fn bind(&mut self, result: &StoreRef) {
        self.result = result.clone();
    }
}

/// Result of one or more Overpass queries.
///
/// Within each kind an id is stored at most once: the first element inserted with
/// a given id wins, later ones are ignored. Cloning a `ResultSet` yields another
/// handle to the same elements. Not meant to be shared between threads.
#[derive(Clone, Default)]
pub struct ResultSet {
    inner: Rc<RefCell<Store>>,
}

impl ResultSet {
    pub fn new() -> Self {
        ResultSet::default()
    }

    /// Result that can fetch missing elements through `api`.
    pub fn with_api(api: Rc<dyn Query>) -> Self {
        let result = ResultSet::new();
        result.set_api(api);
        result
    }

    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let result = ResultSet::new();
        for element in elements {
            result.append(element);
        }
        result
    }

    pub(crate) fn from_store(inner: Rc<RefCell<Store>>) -> Self {
        ResultSet { inner }
    }

    pub fn api(&self) -> Option<Rc<dyn Query>> {
        self.inner.borrow().api.clone()
    }

    pub fn set_api(&self, api: Rc<dyn Query>) {
        self.inner.borrow_mut().api = Some(api);
    }

    /// Insert `element` unless its kind already holds the same id.
    pub fn append(&self, element: Element) {
        match element {
            Element::Node(node) => self.insert(node),
            Element::Way(way) => self.insert(way),
            Element::Relation(relation) => self.insert(relation),
            Element::Area(area) => self.insert(area),
        };
    }

    fn insert<T: Stored>(&self, mut element: T) -> bool {
        let handle = Rc::downgrade(&self.inner);
        let mut store = self.inner.borrow_mut();
        match T::collection_mut(&mut store).entry(element.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                element.bind(&handle);
                slot.insert(Rc::new(element));
                true
            }
        }
    }

    /// Add every element of `other` whose (kind, id) is not present yet.
    ///
    /// Elements already in `self` are never replaced. Expanding a result with itself
    /// does nothing.
    pub fn expand(&self, other: &ResultSet) {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return;
        }
        let added = self.merge::<Node>(other)
            + self.merge::<Way>(other)
            + self.merge::<Relation>(other)
            + self.merge::<Area>(other);
        debug!(added = added; "Expanded result");
    }

    fn merge<T: Stored>(&self, other: &ResultSet) -> usize {
        let incoming: Vec<Rc<T>> = T::collection(&other.inner.borrow())
            .values()
            .cloned()
            .collect();
        let mut added = 0;
        for element in incoming {
            if self.insert(T::clone(&element)) {
                added += 1;
            }
        }
        added
    }

    pub(crate) fn lookup<T: Stored>(&self, id: OsmId) -> Option<Rc<T>> {
        T::collection(&self.inner.borrow()).get(&id).cloned()
    }

    /// Run `query` through the associated API and merge its result into `self`.
    pub(crate) fn resolve_with(&self, query: &str) -> Result<()> {
        let api = self.api().ok_or_else(|| {
            Error::DataIncomplete("no API available to resolve missing data".into())
        })?;
        info!(query = query.trim(); "Resolving missing data");
        let fetched = api.query(query)?;
        self.expand(&fetched);
        Ok(())
    }

    fn get_element<T: Stored>(&self, id: OsmId, resolve_missing: bool) -> Result<Rc<T>> {
        if let Some(element) = self.lookup::<T>(id) {
            return Ok(element);
        }
        if !resolve_missing {
            return Err(Error::DataIncomplete(format!(
                "Resolve missing {} is disabled",
                T::KIND
            )));
        }

        let query = format!("\n[out:json];\n{}({});\nout body;\n", T::KIND, id);
        self.resolve_with(&query)?;

        self.lookup::<T>(id).ok_or_else(|| {
            Error::DataIncomplete(format!("Unable to resolve requested {} {}", T::KIND, id))
        })
    }

    fn get_elements<T: Stored>(&self, id: Option<OsmId>) -> Vec<Rc<T>> {
        match id {
            Some(id) => self.lookup::<T>(id).into_iter().collect(),
            None => T::collection(&self.inner.borrow())
                .values()
                .cloned()
                .collect(),
        }
    }

    fn get_ids<T: Stored>(&self) -> Vec<OsmId> {
        T::collection(&self.inner.borrow()).keys().copied().collect()
    }

    pub fn get_node(&self, id: OsmId, resolve_missing: bool) -> Result<Rc<Node>> {
        self.get_element(id, resolve_missing)
    }

    pub fn get_way(&self, id: OsmId, resolve_missing: bool) -> Result<Rc<Way>> {
        self.get_element(id, resolve_missing)
    }

    pub fn get_relation(&self, id: OsmId, resolve_missing: bool) -> Result<Rc<Relation>> {
        self.get_element(id, resolve_missing)
    }

    pub fn get_area(&self, id: OsmId, resolve_missing: bool) -> Result<Rc<Area>> {
        self.get_element(id, resolve_missing)
    }

    /// All nodes, or the one matching `id`. Never queries the API.
    pub fn get_nodes(&self, id: Option<OsmId>) -> Vec<Rc<Node>> {
        self.get_elements(id)
    }

    pub fn get_ways(&self, id: Option<OsmId>) -> Vec<Rc<Way>> {
        self.get_elements(id)
    }

    pub fn get_relations(&self, id: Option<OsmId>) -> Vec<Rc<Relation>> {
        self.get_elements(id)
    }

    pub fn get_areas(&self, id: Option<OsmId>) -> Vec<Rc<Area>> {
        self.get_elements(id)
    }

    pub fn nodes(&self) -> Vec<Rc<Node>> {
        self.get_nodes(None)
    }

    pub fn ways(&self) -> Vec<Rc<Way>> {
        self.get_ways(None)
    }

    pub fn relations(&self) -> Vec<Rc<Relation>> {
        self.get_relations(None)
    }

    pub fn areas(&self) -> Vec<Rc<Area>> {
        self.get_areas(None)
    }

    pub fn node_ids(&self) -> Vec<OsmId> {
        self.get_ids::<Node>()
    }

    pub fn way_ids(&self) -> Vec<OsmId> {
        self.get_ids::<Way>()
    }

    pub fn relation_ids(&self) -> Vec<OsmId> {
        self.get_ids::<Relation>()
    }

    pub fn area_ids(&self) -> Vec<OsmId> {
        self.get_ids::<Area>()
    }

    /// Number of elements of `kind`.
    pub fn count(&self, kind: ElementKind) -> usize {
        let store = self.inner.borrow();
        match kind {
            ElementKind::Node => store.nodes.len(),
            ElementKind::Way => store.ways.len(),
            ElementKind::Relation => store.relations.len(),
            ElementKind::Area => store.areas.len(),
        }
    }
}

impl fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("nodes", &self.count(ElementKind::Node))
            .field("ways", &self.count(ElementKind::Way))
            .field("relations", &self.count(ElementKind::Relation))
            .field("areas", &self.count(ElementKind::Area))
            .finish()
    }
}
