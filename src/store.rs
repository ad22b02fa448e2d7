//! [Array] and [Store]: the flat, name-then-coordinate container that holds
//! every concrete graph item.
//!
//! The single Array-of-items abstraction is deliberate: one-off,
//! date-cycled, parameter-swept, and cross-product items are all the same
//! shape — a coordinate with 0…N dimensions — so there is exactly one code
//! path for insertion and lookup, not one per cardinality.

use crate::coordinate::Coordinate;
use crate::error::Error;
use crate::item::GraphItem;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// A homogeneous collection of [GraphItem]s sharing a `name` and a fixed
/// set of dimension names, set on first insert.
#[derive(Debug, Clone, Default)]
pub struct Array {
    name: String,
    dimension_names: Option<BTreeSet<String>>,
    items: Vec<GraphItem>,
    index: IndexMap<Coordinate, usize>,
}

impl Array {
    fn new(name: impl Into<String>) -> Self {
        Array {
            name: name.into(),
            dimension_names: None,
            items: Vec::new(),
            index: IndexMap::new(),
        }
    }

    /// This Array's established dimension set, or `None` if it has never
    /// received an item.
    pub fn dimension_names(&self) -> Option<&BTreeSet<String>> {
        self.dimension_names.as_ref()
    }

    /// Append an item, creating the Array's dimension set on first use.
    /// Fails [Error::DimensionMismatch] if a later item's coordinate
    /// declares a different dimension set, or [Error::DuplicateCoordinate]
    /// if an item with an equal coordinate already exists.
    fn insert(&mut self, item: GraphItem) -> Result<(), Error> {
        let dims = item.coordinate().dimension_names();

        match &self.dimension_names {
            None => self.dimension_names = Some(dims.clone()),
            Some(expected) if *expected == dims => {}
            Some(expected) => {
                return Err(Error::DimensionMismatch {
                    name: self.name.clone(),
                    expected: expected.iter().cloned().collect(),
                    actual: dims.into_iter().collect(),
                })
            }
        }

        if self.index.contains_key(item.coordinate()) {
            return Err(Error::DuplicateCoordinate {
                name: self.name.clone(),
                coordinate: item.coordinate().clone(),
            });
        }

        let position = self.items.len();
        self.index.insert(item.coordinate().clone(), position);
        self.items.push(item);
        Ok(())
    }

    /// Exact-coordinate lookup.
    fn lookup(&self, coordinate: &Coordinate) -> Option<&GraphItem> {
        self.index.get(coordinate).map(|&i| &self.items[i])
    }

    /// Exact-coordinate mutable lookup, used by the resolver to wire edges
    /// onto an already-inserted item.
    fn lookup_mut(&mut self, coordinate: &Coordinate) -> Option<&mut GraphItem> {
        let position = *self.index.get(coordinate)?;
        self.items.get_mut(position)
    }

    /// Partial-coordinate lookup: items whose coordinate agrees with
    /// `partial` on every dimension `partial` declares. Dimensions the
    /// item carries that `partial` doesn't mention are free. An empty
    /// result is a legal, non-error outcome.
    fn lookup_partial(&self, partial: &Coordinate) -> Vec<&GraphItem> {
        self.items
            .iter()
            .filter(|item| {
                partial
                    .dimension_names()
                    .iter()
                    .all(|dim| item.coordinate().get(dim) == partial.get(dim))
            })
            .collect()
    }

    /// Items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GraphItem> {
        self.items.iter()
    }

    /// Number of items in this Array.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this Array holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A mapping `name → Array`, insertion-ordered for deterministic iteration.
#[derive(Debug, Clone, Default)]
pub struct Store {
    arrays: IndexMap<String, Array>,
}

impl Store {
    /// Construct an empty [Store].
    pub fn new() -> Self {
        Store {
            arrays: IndexMap::new(),
        }
    }

    /// Insert an item into the Array named `name`, creating the Array on
    /// first use.
    pub fn insert(&mut self, name: impl Into<String>, item: GraphItem) -> Result<(), Error> {
        let name = name.into();
        tracing::debug!(%name, coordinate = ?item.coordinate(), "inserting graph item");
        let array = self
            .arrays
            .entry(name.clone())
            .or_insert_with(|| Array::new(name));
        array.insert(item)
    }

    /// Exact-coordinate lookup. Fails [Error::UnknownName] if `name` has no
    /// Array, or if the coordinate has no match within it.
    pub fn lookup(&self, name: &str, coordinate: &Coordinate) -> Result<&GraphItem, Error> {
        self.arrays
            .get(name)
            .and_then(|array| array.lookup(coordinate))
            .ok_or_else(|| Error::UnknownName(name.to_string()))
    }

    /// Partial-coordinate lookup. An unknown `name` also yields an empty
    /// list rather than an error — the resolver treats "no such Array yet"
    /// and "Array exists but nothing matches" identically (both are legal,
    /// silent absences).
    pub fn lookup_partial(&self, name: &str, partial: &Coordinate) -> Vec<&GraphItem> {
        self.arrays
            .get(name)
            .map(|array| array.lookup_partial(partial))
            .unwrap_or_default()
    }

    /// Exact-coordinate mutable lookup. Used by the resolver to wire edges
    /// onto an already-inserted item; fails [Error::UnknownName] on the same
    /// terms as [Store::lookup].
    pub fn lookup_mut(&mut self, name: &str, coordinate: &Coordinate) -> Result<&mut GraphItem, Error> {
        self.arrays
            .get_mut(name)
            .and_then(|array| array.lookup_mut(coordinate))
            .ok_or_else(|| Error::UnknownName(name.to_string()))
    }

    /// Whether an Array named `name` exists in the Store.
    pub fn contains_name(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// A reference to the named Array, if present.
    pub fn array(&self, name: &str) -> Option<&Array> {
        self.arrays.get(name)
    }

    /// Deterministic iteration over every item: Arrays in insertion order
    /// of their names, items within an Array in insertion order.
    pub fn iter_items(&self) -> impl Iterator<Item = &GraphItem> {
        self.arrays.values().flat_map(|array| array.iter())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coordinate::{Coordinate, DimValue, ParamValue};
    use crate::item::{Availability, DataItem};

    fn data(name: &str, foo: i64) -> GraphItem {
        let coordinate = Coordinate::new([(
            "foo".to_string(),
            DimValue::Param(ParamValue::Int(foo)),
        )])
        .unwrap();
        GraphItem::Data(DataItem::new(
            name.to_string(),
            coordinate,
            Availability::Generated,
            serde_json::Value::Null,
        ))
    }

    #[test]
    fn insert_and_exact_lookup() {
        let mut store = Store::new();
        store.insert("icon_output", data("icon_output", 0)).unwrap();
        let coordinate =
            Coordinate::new([("foo".to_string(), DimValue::Param(ParamValue::Int(0)))]).unwrap();
        assert!(store.lookup("icon_output", &coordinate).is_ok());
    }

    #[test]
    fn duplicate_coordinate_rejected() {
        let mut store = Store::new();
        store.insert("icon_output", data("icon_output", 0)).unwrap();
        let err = store.insert("icon_output", data("icon_output", 0)).unwrap_err();
        assert!(matches!(err, Error::DuplicateCoordinate { .. }));
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let mut store = Store::new();
        store.insert("icon_output", data("icon_output", 0)).unwrap();
        let other = GraphItem::Data(DataItem::new(
            "icon_output".to_string(),
            Coordinate::empty(),
            Availability::Generated,
            serde_json::Value::Null,
        ));
        let err = store.insert("icon_output", other).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn partial_lookup_is_empty_not_error() {
        let store = Store::new();
        assert!(store.lookup_partial("nonexistent", &Coordinate::empty()).is_empty());
    }

    #[test]
    fn partial_lookup_matches_on_shared_dimensions_only() {
        let mut store = Store::new();
        store.insert("icon_output", data("icon_output", 0)).unwrap();
        store.insert("icon_output", data("icon_output", 1)).unwrap();

        let partial = Coordinate::new([("foo".to_string(), DimValue::Param(ParamValue::Int(1)))])
            .unwrap();
        let matches = store.lookup_partial("icon_output", &partial);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn iteration_is_insertion_ordered() {
        let mut store = Store::new();
        store.insert("b", data("b", 0)).unwrap();
        store.insert("a", data("a", 0)).unwrap();
        store.insert("b", data("b", 1)).unwrap();

        let names: Vec<_> = store.iter_items().map(|i| i.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }
}
