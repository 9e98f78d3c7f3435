//! Authoritative element storage with insertion-ordered z-order.

use crate::elements::{Element, ElementContent, ElementId, GroupId};
use crate::error::SceneResult;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A partial update merged into an existing element.
///
/// Unset fields are left alone. `group_id` only applies to elements without a group,
/// and `link` ids are merged into the linked set rather than replacing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub hidden: Option<bool>,
    pub locked: Option<bool>,
    pub group_id: Option<GroupId>,
    pub link: Vec<ElementId>,
    pub content: Option<ElementContent>,
}

impl ElementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn link(mut self, ids: impl IntoIterator<Item = ElementId>) -> Self {
        self.link.extend(ids);
        self
    }

    pub fn content(mut self, content: ElementContent) -> Self {
        self.content = Some(content);
        self
    }

    fn apply(self, element: &mut Element) {
        if let Some(position) = self.position {
            element.position = position;
        }
        if let Some(size) = self.size {
            element.size = Some(size);
        }
        if let Some(hidden) = self.hidden {
            element.hidden = hidden;
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(group_id) = self.group_id {
            if !element.assign_group(group_id) {
                log::warn!(
                    "Ignoring group {group_id} for element {}: already in group {:?}",
                    element.id,
                    element.group_id
                );
            }
        }
        for id in self.link {
            element.link(id);
        }
        if let Some(content) = self.content {
            element.content = content;
        }
    }
}

/// The element store: records keyed by id plus their z-order (back to front).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementStore {
    /// All elements, keyed by ID.
    elements: HashMap<ElementId, Element>,
    /// Z-order of elements (back to front), which is insertion order.
    z_order: Vec<ElementId>,
    /// Set by every mutation, cleared by the save indicator.
    #[serde(skip)]
    dirty: bool,
}

impl ElementStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element on top of the z-order.
    ///
    /// Re-adding an id that is already present replaces the record in its original slot,
    /// but keeps the stored group and linked ids. Connectors whose endpoints are not in
    /// the store are rejected and `None` is returned.
    pub fn add(&mut self, mut element: Element) -> Option<ElementId> {
        if let Some((from, to)) = self.missing_endpoints(&element.content) {
            log::debug!(
                "Rejected connector {}: endpoints {from} -> {to} not in store",
                element.id
            );
            return None;
        }
        if let Some(existing) = self.elements.get(&element.id) {
            if let Some(group_id) = existing.group_id {
                element.group_id = Some(group_id);
            }
            let links = std::mem::take(&mut element.linked_elements);
            element.linked_elements = existing.linked_elements.clone();
            for id in links {
                element.link(id);
            }
        }
        Some(self.insert(element))
    }

    fn insert(&mut self, element: Element) -> ElementId {
        let id = element.id;
        if self.elements.insert(id, element).is_none() {
            self.z_order.push(id);
        }
        self.dirty = true;
        id
    }

    /// Endpoints of a connector content, if either of them is absent.
    fn missing_endpoints(&self, content: &ElementContent) -> Option<(ElementId, ElementId)> {
        match content {
            ElementContent::Connector(c) if !self.contains(c.from) || !self.contains(c.to) => {
                Some((c.from, c.to))
            }
            _ => None,
        }
    }

    /// Merge a patch into an element. Returns false if the id is absent or the patch
    /// would turn it into a connector with missing endpoints.
    pub fn update(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        if let Some((from, to)) = patch
            .content
            .as_ref()
            .and_then(|content| self.missing_endpoints(content))
        {
            log::debug!("Rejected patch for {id}: connector endpoints {from} -> {to} not in store");
            return false;
        }
        self.modify(id, |element| patch.apply(element))
    }

    /// Apply a closure to an element. Returns false if the id is absent.
    pub fn modify(&mut self, id: ElementId, f: impl FnOnce(&mut Element)) -> bool {
        match self.elements.get_mut(&id) {
            Some(element) => {
                f(element);
                self.dirty = true;
                true
            }
            None => {
                log::debug!("Update of missing element {id} ignored");
                false
            }
        }
    }

    /// Remove an element. Dependents (connectors, linked generators) are left in place.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let removed = self.elements.remove(&id);
        if removed.is_some() {
            self.z_order.retain(|&element_id| element_id != id);
            self.dirty = true;
        }
        removed
    }

    /// Get an element by ID.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Get elements in z-order (back to front).
    pub fn elements_ordered(&self) -> impl Iterator<Item = &Element> {
        self.z_order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Element ids in z-order.
    pub fn z_order(&self) -> &[ElementId] {
        &self.z_order
    }

    /// Elements matching a predicate, in z-order.
    pub fn query(&self, predicate: impl Fn(&Element) -> bool) -> Vec<&Element> {
        self.elements_ordered().filter(|e| predicate(e)).collect()
    }

    /// Elements tagged with a group, in z-order.
    pub fn group_members(&self, group_id: GroupId) -> Vec<&Element> {
        self.query(|e| e.group_id == Some(group_id))
    }

    /// Topmost interactive element under a point (in scene coordinates).
    pub fn element_at_point(&self, point: Point, tolerance: f64) -> Option<ElementId> {
        self.elements_at_point(point, tolerance).into_iter().next()
    }

    /// Find interactive elements at a point, front to back.
    pub fn elements_at_point(&self, point: Point, tolerance: f64) -> Vec<ElementId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|&id| {
                self.elements
                    .get(&id)
                    .filter(|e| e.hit_test(point, tolerance))
                    .map(|_| id)
            })
            .collect()
    }

    /// Bounding box of all visible, non-connector elements.
    pub fn bounds(&self) -> Option<Rect> {
        self.elements_ordered()
            .filter(|e| e.is_interactive())
            .map(|e| e.bounds())
            .reduce(|acc, b| acc.union(b))
    }

    /// Connectors with at least one endpoint that no longer exists.
    pub fn dangling_connectors(&self) -> Vec<ElementId> {
        self.elements_ordered()
            .filter_map(|e| {
                let connector = e.as_connector()?;
                let dangling = !self.contains(connector.from) || !self.contains(connector.to);
                dangling.then_some(e.id)
            })
            .collect()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get the number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether anything changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Copy the given elements, in z-order, into a new store.
    pub fn export_selection(&self, selection: &[ElementId]) -> Self {
        let wanted: HashSet<ElementId> = selection.iter().copied().collect();
        let mut store = Self::new();
        for element in self.elements_ordered().filter(|e| wanted.contains(&e.id)) {
            store.insert(element.clone());
        }
        store.dirty = false;
        store
    }

    /// Serialize the store to JSON.
    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a store from JSON, repairing z-order entries that disagree with the
    /// element map. Records stored under a key other than their own id are dropped.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let mut store: Self = serde_json::from_str(json)?;

        store.elements = std::mem::take(&mut store.elements)
            .into_iter()
            .filter(|(key, element)| {
                let matches = *key == element.id;
                if !matches {
                    log::warn!("Dropped element {} stored under key {key}", element.id);
                }
                matches
            })
            .collect();

        let mut seen = HashSet::new();
        let before = store.z_order.len();
        let elements = &store.elements;
        store
            .z_order
            .retain(|id| elements.contains_key(id) && seen.insert(*id));
        if store.z_order.len() != before {
            log::warn!(
                "Dropped {} stale z-order entries while loading",
                before - store.z_order.len()
            );
        }
        let mut missing: Vec<ElementId> = store
            .elements
            .keys()
            .filter(|id| !seen.contains(*id))
            .copied()
            .collect();
        if !missing.is_empty() {
            log::warn!("Appending {} elements missing from z-order", missing.len());
            missing.sort();
            store.z_order.extend(missing);
        }

        store.dirty = false;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{
        ConnectorContent, LineStyle, MediaSource, ShapeKind, SerializableColor,
    };
    use uuid::Uuid;

    fn rect(x: f64, y: f64) -> Element {
        Element::shape(
            Point::new(x, y),
            Size::new(100.0, 100.0),
            ShapeKind::Rectangle,
            SerializableColor::white(),
        )
    }

    #[test]
    fn test_add_and_get() {
        let mut store = ElementStore::new();
        assert!(store.is_empty());
        assert!(!store.is_dirty());

        let id = store.add(rect(0.0, 0.0)).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(id).is_some());
        assert!(store.is_dirty());
    }

    #[test]
    fn test_z_order_is_insertion_order() {
        let mut store = ElementStore::new();
        let id1 = store.add(rect(0.0, 0.0)).unwrap();
        let id2 = store.add(rect(50.0, 50.0)).unwrap();
        assert_eq!(store.z_order(), &[id1, id2]);
    }

    #[test]
    fn test_readd_keeps_slot() {
        let mut store = ElementStore::new();
        let first = rect(0.0, 0.0);
        let id1 = store.add(first.clone()).unwrap();
        let id2 = store.add(rect(50.0, 50.0)).unwrap();

        let mut replacement = first;
        replacement.position = Point::new(5.0, 5.0);
        store.add(replacement);

        assert_eq!(store.z_order(), &[id1, id2]);
        assert_eq!(store.get(id1).unwrap().position, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_readd_keeps_group_and_links() {
        let mut store = ElementStore::new();
        let group = Uuid::new_v4();
        let linked = Uuid::new_v4();
        let original = rect(0.0, 0.0).with_group(group);
        let id = store.add(original.clone()).unwrap();
        store.update(id, ElementPatch::new().link([linked]));

        let extra = Uuid::new_v4();
        let mut replacement = original.clone();
        replacement.group_id = Some(Uuid::new_v4());
        replacement.link(extra);
        replacement.position = Point::new(9.0, 9.0);
        assert_eq!(store.add(replacement), Some(id));

        let element = store.get(id).unwrap();
        assert_eq!(element.group_id(), Some(group));
        assert_eq!(element.linked_elements(), &[linked, extra]);
        assert_eq!(element.position, Point::new(9.0, 9.0));

        let mut ungrouped = rect(0.0, 0.0);
        let other = store.add(ungrouped.clone()).unwrap();
        ungrouped.group_id = Some(group);
        store.add(ungrouped);
        assert_eq!(store.get(other).unwrap().group_id(), Some(group));
    }

    #[test]
    fn test_connector_needs_both_endpoints() {
        let mut store = ElementStore::new();
        let a = store.add(rect(0.0, 0.0)).unwrap();
        store.mark_clean();

        let ghost = Uuid::new_v4();
        assert_eq!(store.add(Element::connector(a, ghost, LineStyle::Solid)), None);
        assert_eq!(store.add(Element::connector(ghost, a, LineStyle::Solid)), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.z_order(), &[a]);
        assert!(!store.is_dirty());

        let b = store.add(rect(200.0, 0.0)).unwrap();
        let connector = Element::connector(a, b, LineStyle::Solid);
        let patch = ElementPatch::new().content(ElementContent::Connector(ConnectorContent {
            from: a,
            to: ghost,
            style: LineStyle::Dashed,
        }));
        let connector_id = store.add(connector.clone()).unwrap();
        assert!(!store.update(connector_id, patch.clone()));
        assert_eq!(store.get(connector_id).unwrap().content, connector.content);
        assert!(!store.update(b, patch));
        assert!(!store.get(b).unwrap().is_connector());
        assert!(store.dangling_connectors().is_empty());
    }

    #[test]
    fn test_update_merges() {
        let mut store = ElementStore::new();
        let id = store.add(rect(0.0, 0.0)).unwrap();
        let other = Uuid::new_v4();

        assert!(store.update(id, ElementPatch::new().position(Point::new(7.0, 8.0)).link([other])));
        assert!(store.update(id, ElementPatch::new().locked(true).link([other])));

        let element = store.get(id).unwrap();
        assert_eq!(element.position, Point::new(7.0, 8.0));
        assert!(element.locked);
        assert_eq!(element.linked_elements(), &[other]);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = ElementStore::new();
        assert!(!store.update(Uuid::new_v4(), ElementPatch::new().hidden(true)));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_patch_does_not_overwrite_group() {
        let mut store = ElementStore::new();
        let first = Uuid::new_v4();
        let id = store.add(rect(0.0, 0.0).with_group(first)).unwrap();
        store.update(id, ElementPatch::new().group(Uuid::new_v4()));
        assert_eq!(store.get(id).unwrap().group_id(), Some(first));
    }

    #[test]
    fn test_locked_elements_accept_programmatic_updates() {
        let mut store = ElementStore::new();
        let id = store.add(rect(0.0, 0.0).with_locked(true)).unwrap();
        assert!(store.update(id, ElementPatch::new().position(Point::new(1.0, 1.0))));
        assert_eq!(store.get(id).unwrap().position, Point::new(1.0, 1.0));
    }

    #[test]
    fn test_remove_does_not_cascade() {
        let mut store = ElementStore::new();
        let a = store.add(rect(0.0, 0.0)).unwrap();
        let b = store.add(rect(200.0, 0.0)).unwrap();
        let connector = store.add(Element::connector(a, b, LineStyle::Dashed)).unwrap();

        assert!(store.remove(b).is_some());
        assert!(store.remove(b).is_none());
        assert!(store.contains(connector));
        assert_eq!(store.dangling_connectors(), vec![connector]);
    }

    #[test]
    fn test_elements_at_point() {
        let mut store = ElementStore::new();
        let id1 = store.add(rect(0.0, 0.0)).unwrap();
        let id2 = store.add(rect(50.0, 50.0)).unwrap();

        let hits = store.elements_at_point(Point::new(75.0, 75.0), 0.0);
        assert_eq!(hits, vec![id2, id1]);

        assert_eq!(store.element_at_point(Point::new(25.0, 25.0), 0.0), Some(id1));
        assert_eq!(store.element_at_point(Point::new(500.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_hidden_elements_are_skipped() {
        let mut store = ElementStore::new();
        let id = store.add(rect(0.0, 0.0)).unwrap();
        store.update(id, ElementPatch::new().hidden(true));
        assert_eq!(store.element_at_point(Point::new(10.0, 10.0), 0.0), None);
        assert!(store.bounds().is_none());
    }

    #[test]
    fn test_query() {
        let mut store = ElementStore::new();
        store.add(rect(0.0, 0.0));
        let image = store
            .add(Element::image(
                Point::ZERO,
                Size::new(10.0, 10.0),
                MediaSource::url("a.png"),
            ))
            .unwrap();
        let images = store.query(|e| e.is_image() && !e.hidden);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id(), image);
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let mut store = ElementStore::new();
        let ids: Vec<_> = (0..5)
            .map(|i| store.add(rect(i as f64 * 10.0, 0.0)).unwrap())
            .collect();

        let json = store.to_json().unwrap();
        let loaded = ElementStore::from_json(&json).unwrap();

        assert_eq!(loaded.z_order(), ids.as_slice());
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn test_from_json_drops_mismatched_keys() {
        let mut store = ElementStore::new();
        let a = store.add(rect(0.0, 0.0)).unwrap();
        let b = store.add(rect(10.0, 0.0)).unwrap();

        let mut value: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        let elements = value["elements"].as_object_mut().unwrap();
        let record = elements.remove(&b.to_string()).unwrap();
        let bogus = Uuid::new_v4();
        elements.insert(bogus.to_string(), record);

        let loaded = ElementStore::from_json(&value.to_string()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(bogus).is_none());
        assert!(loaded.get(b).is_none());
        assert_eq!(loaded.z_order(), &[a]);
        assert_eq!(loaded.get(a).unwrap().id(), a);
    }

    #[test]
    fn test_export_selection() {
        let mut store = ElementStore::new();
        let a = store.add(rect(0.0, 0.0)).unwrap();
        let _b = store.add(rect(10.0, 0.0)).unwrap();
        let c = store.add(rect(20.0, 0.0)).unwrap();

        let exported = store.export_selection(&[c, a]);
        assert_eq!(exported.z_order(), &[a, c]);
    }
}
