//! Multidimensional coordinate (date + parameter dimensions).
//!
//! A [Coordinate] is the thing that distinguishes one concrete instance of a
//! recurring template from another. It generalizes "undated, unparameterized
//! one-off" (an empty coordinate), "dated only", "parameterized only", and
//! "dated and parameterized" into a single shape — no special casing of the
//! `None`-dated case anywhere downstream.

use crate::error::CoordinateError;
use crate::temporal::Date;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// The reserved dimension name carrying the cycle date.
pub const DATE_DIMENSION: &str = "date";

/// A single parameter value. The value type is opaque to the rest of the
/// core — only structural equality matters here.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ParamValue {
    /// A signed integer parameter value.
    Int(i64),
    /// A floating point parameter value.
    Float(f64),
    /// A string parameter value.
    Str(String),
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            (ParamValue::Float(a), ParamValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ParamValue::Str(a), ParamValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ParamValue::Int(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            ParamValue::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
            ParamValue::Str(v) => {
                2u8.hash(state);
                v.hash(state);
            }
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// The value held on a single dimension of a [Coordinate]: either the
/// reserved `date` dimension's [Date], or an opaque [ParamValue].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DimValue {
    /// A value on the `date` dimension.
    Date(Date),
    /// A value on any other (parameter) dimension.
    Param(ParamValue),
}

impl From<Date> for DimValue {
    fn from(d: Date) -> Self {
        DimValue::Date(d)
    }
}

impl From<ParamValue> for DimValue {
    fn from(p: ParamValue) -> Self {
        DimValue::Param(p)
    }
}

/// A mapping from dimension name to a single value.
///
/// Two coordinates are equal iff they share the same set of dimension
/// names and equal values on each — order of dimensions never matters,
/// which [IndexMap]'s `PartialEq` already gives us for free. [Coordinate]
/// additionally implements a stable [Hash] (insertion-order independent)
/// so it can key a [crate::store::Array]'s lookup index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coordinate(IndexMap<String, DimValue>);

impl Coordinate {
    /// The empty (zero-dimension) coordinate — the "one-off" case. Not a
    /// special case elsewhere: just an [Array] with no dimensions.
    pub fn empty() -> Self {
        Coordinate(IndexMap::new())
    }

    /// Construct a [Coordinate] from a name→value iterable, rejecting
    /// duplicate dimension names.
    pub fn new<I>(dims: I) -> Result<Self, CoordinateError>
    where
        I: IntoIterator<Item = (String, DimValue)>,
    {
        let mut map = IndexMap::new();
        for (name, value) in dims {
            if map.insert(name.clone(), value).is_some() {
                return Err(CoordinateError::DuplicateDimension(name));
            }
        }
        Ok(Coordinate(map))
    }

    /// Construct a coordinate carrying only the `date` dimension, or the
    /// empty coordinate if `date` is `None`.
    pub fn from_date(date: Option<Date>) -> Self {
        match date {
            Some(d) => {
                let mut map = IndexMap::new();
                map.insert(DATE_DIMENSION.to_string(), DimValue::Date(d));
                Coordinate(map)
            }
            None => Coordinate::empty(),
        }
    }

    /// This coordinate's `date` dimension value, if present.
    pub fn date(&self) -> Option<Date> {
        match self.0.get(DATE_DIMENSION) {
            Some(DimValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// The value on a given dimension, if present.
    pub fn get(&self, dimension: &str) -> Option<&DimValue> {
        self.0.get(dimension)
    }

    /// Whether this coordinate declares a given dimension.
    pub fn contains(&self, dimension: &str) -> bool {
        self.0.contains_key(dimension)
    }

    /// The set of dimension names this coordinate carries values on.
    pub fn dimension_names(&self) -> BTreeSet<String> {
        self.0.keys().cloned().collect()
    }

    /// Merge two coordinates with disjoint dimension sets. Fails on any
    /// overlapping dimension name.
    pub fn merge(&self, other: &Coordinate) -> Result<Coordinate, CoordinateError> {
        let mut map = self.0.clone();
        for (name, value) in other.0.iter() {
            if map.contains_key(name) {
                return Err(CoordinateError::OverlappingDimension(name.clone()));
            }
            map.insert(name.clone(), value.clone());
        }
        Ok(Coordinate(map))
    }

    /// Replace (or insert) the value on a single dimension, returning the
    /// updated coordinate. Used by the resolver to swap in a lagged or
    /// pinned date without disturbing the other dimensions.
    pub fn with(&self, dimension: &str, value: DimValue) -> Coordinate {
        let mut map = self.0.clone();
        map.insert(dimension.to_string(), value);
        Coordinate(map)
    }

    /// Remove a dimension entirely, if present.
    pub fn without(&self, dimension: &str) -> Coordinate {
        let mut map = self.0.clone();
        map.shift_remove(dimension);
        Coordinate(map)
    }

    /// Restrict this coordinate to a subset of dimensions. Dimensions named
    /// that this coordinate doesn't carry are silently absent in the
    /// result (projection discards, never invents).
    pub fn project<'a, I>(&self, dimensions: I) -> Coordinate
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut map = IndexMap::new();
        for dim in dimensions {
            if let Some(value) = self.0.get(dim) {
                map.insert(dim.to_string(), value.clone());
            }
        }
        Coordinate(map)
    }

    /// Whether this coordinate has no dimensions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .all(|(k, v)| other.0.get(k).is_some_and(|ov| ov == v))
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: fold per-entry hashes with XOR rather than
        // hashing the map in insertion order.
        let mut acc: u64 = 0;
        for (k, v) in self.0.iter() {
            let mut entry_hasher = std::collections::hash_map::DefaultHasher::new();
            k.hash(&mut entry_hasher);
            v.hash(&mut entry_hasher);
            acc ^= entry_hasher.finish();
        }
        acc.hash(state);
    }
}

impl JsonSchema for Coordinate {
    fn schema_name() -> String {
        "Coordinate".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        std::collections::BTreeMap::<String, DimValue>::json_schema(gen)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn coord(pairs: &[(&str, DimValue)]) -> Coordinate {
        Coordinate::new(pairs.iter().map(|(k, v)| (k.to_string(), v.clone()))).unwrap()
    }

    #[test]
    fn empty_coordinate_has_no_dimensions() {
        assert!(Coordinate::empty().is_empty());
        assert_eq!(Coordinate::empty().dimension_names().len(), 0);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = coord(&[
            ("foo", DimValue::Param(ParamValue::Int(1))),
            ("bar", DimValue::Param(ParamValue::Float(3.0))),
        ]);
        let b = coord(&[
            ("bar", DimValue::Param(ParamValue::Float(3.0))),
            ("foo", DimValue::Param(ParamValue::Int(1))),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_dimension_name_rejected() {
        let err = Coordinate::new(vec![
            ("foo".to_string(), DimValue::Param(ParamValue::Int(1))),
            ("foo".to_string(), DimValue::Param(ParamValue::Int(2))),
        ])
        .unwrap_err();
        assert_eq!(err, CoordinateError::DuplicateDimension("foo".to_string()));
    }

    #[test]
    fn merge_rejects_overlapping_dimensions() {
        let a = coord(&[("foo", DimValue::Param(ParamValue::Int(1)))]);
        let b = coord(&[("foo", DimValue::Param(ParamValue::Int(2)))]);
        assert!(a.merge(&b).is_err());
    }

    #[test]
    fn merge_disjoint_dimensions() {
        let a = coord(&[("foo", DimValue::Param(ParamValue::Int(1)))]);
        let b = coord(&[("bar", DimValue::Param(ParamValue::Float(2.0)))]);
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.dimension_names().len(), 2);
    }

    #[test]
    fn project_discards_extra_dimensions() {
        let c = coord(&[
            ("foo", DimValue::Param(ParamValue::Int(1))),
            ("bar", DimValue::Param(ParamValue::Float(2.0))),
        ]);
        let projected = c.project(["foo"]);
        assert_eq!(projected.dimension_names().len(), 1);
        assert!(projected.contains("foo"));
        assert!(!projected.contains("bar"));
    }

    #[test]
    fn project_onto_dimension_not_present_is_silent() {
        let c = coord(&[("foo", DimValue::Param(ParamValue::Int(1)))]);
        let projected = c.project(["missing"]);
        assert!(projected.is_empty());
    }
}
