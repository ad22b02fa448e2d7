//! [GraphItem]s (Task/Data) and [Edge]s between them.
//!
//! [GraphItem] is rendered as a closed tagged variant rather than virtual
//! dispatch: operations that differ between Task and Data (edge ownership,
//! opaque payload) live on the variant; operations that are shared (name,
//! coordinate) operate on the common prefix via a match.
//!
//! Edges hold their endpoints by `(name, coordinate)` rather than by direct
//! reference — the [crate::store::Store] is the single owner of every
//! item, and an [ItemKey] is resolved back through it.

use crate::coordinate::Coordinate;
use serde_json::Value as Payload;

/// A lightweight, by-value pointer to a concrete graph item: its name plus
/// coordinate. Resolvable through [crate::store::Store::lookup].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    /// The referenced item's template name.
    pub name: String,
    /// The referenced item's coordinate.
    pub coordinate: Coordinate,
}

impl ItemKey {
    /// Construct an [ItemKey].
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        ItemKey {
            name: name.into(),
            coordinate,
        }
    }
}

/// The role an [Edge] plays from the perspective of the task it's attached
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A data item consumed as a task input, through a named port.
    Input,
    /// A data item produced by a task.
    Output,
    /// A task or data item this task must wait on, without consuming it
    /// through a port.
    WaitOn,
}

/// A directed, typed edge between two graph items. Owned by the sink task
/// for `Input`/`WaitOn`, by the source task for `Output`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The edge's source item.
    pub source: ItemKey,
    /// The edge's sink item.
    pub sink: ItemKey,
    /// The named port the data flows through, if any. The literal string
    /// `"None"` is a valid (if unusual) port name, not a sentinel.
    pub port: Option<String>,
    /// What kind of dependency this edge represents.
    pub role: Role,
}

impl Edge {
    /// Construct an [Edge].
    pub fn new(source: ItemKey, sink: ItemKey, port: Option<String>, role: Role) -> Self {
        Edge {
            source,
            sink,
            port,
            role,
        }
    }
}

/// Whether a Data item's content is supplied externally or produced by a
/// Task within this graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    /// Supplied from outside the graph (e.g. static input files).
    Available,
    /// Produced by a Task within this graph.
    Generated,
}

/// A concrete Task invocation: one instantiation of a task template at a
/// specific [Coordinate].
#[derive(Debug, Clone, PartialEq)]
pub struct TaskItem {
    name: String,
    coordinate: Coordinate,
    inputs: Vec<Edge>,
    outputs: Vec<Edge>,
    wait_on: Vec<Edge>,
    payload: Payload,
}

impl TaskItem {
    /// Construct a new [TaskItem] with no edges yet — the expander creates
    /// Tasks before the resolver wires dependencies.
    pub fn new(name: String, coordinate: Coordinate, payload: Payload) -> Self {
        TaskItem {
            name,
            coordinate,
            inputs: Vec::new(),
            outputs: Vec::new(),
            wait_on: Vec::new(),
            payload,
        }
    }

    /// This task's template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This task's coordinate.
    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    /// Ordered input edges, in declaration order.
    pub fn inputs(&self) -> &[Edge] {
        &self.inputs
    }

    /// Ordered output edges.
    pub fn outputs(&self) -> &[Edge] {
        &self.outputs
    }

    /// Ordered wait-on edges, in declaration order.
    pub fn wait_on(&self) -> &[Edge] {
        &self.wait_on
    }

    /// The task's opaque, plugin-specific payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Append an output edge (called by the expander when it instantiates
    /// this task's declared output Data items).
    pub fn push_output(&mut self, edge: Edge) {
        self.outputs.push(edge);
    }

    /// Append an input edge (called by the resolver).
    pub fn push_input(&mut self, edge: Edge) {
        self.inputs.push(edge);
    }

    /// Append a wait-on edge (called by the resolver).
    pub fn push_wait_on(&mut self, edge: Edge) {
        self.wait_on.push(edge);
    }
}

/// A concrete Data artifact: one instantiation of a data template at a
/// specific [Coordinate].
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    name: String,
    coordinate: Coordinate,
    availability: Availability,
    payload: Payload,
}

impl DataItem {
    /// Construct a new [DataItem].
    pub fn new(
        name: String,
        coordinate: Coordinate,
        availability: Availability,
        payload: Payload,
    ) -> Self {
        DataItem {
            name,
            coordinate,
            availability,
            payload,
        }
    }

    /// This data item's template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This data item's coordinate.
    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    /// Whether this item is supplied externally or produced in-graph.
    pub fn availability(&self) -> Availability {
        self.availability
    }

    /// The data item's opaque, plugin-specific payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// A concrete graph item: either a [TaskItem] or a [DataItem].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphItem {
    /// A concrete task invocation.
    Task(TaskItem),
    /// A concrete data artifact.
    Data(DataItem),
}

impl GraphItem {
    /// This item's template name, regardless of variant.
    pub fn name(&self) -> &str {
        match self {
            GraphItem::Task(t) => t.name(),
            GraphItem::Data(d) => d.name(),
        }
    }

    /// This item's coordinate, regardless of variant.
    pub fn coordinate(&self) -> &Coordinate {
        match self {
            GraphItem::Task(t) => t.coordinate(),
            GraphItem::Data(d) => d.coordinate(),
        }
    }

    /// This item's [ItemKey].
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.name(), self.coordinate().clone())
    }

    /// Borrow the inner [TaskItem], if this is a `Task` variant.
    pub fn as_task(&self) -> Option<&TaskItem> {
        match self {
            GraphItem::Task(t) => Some(t),
            GraphItem::Data(_) => None,
        }
    }

    /// Mutably borrow the inner [TaskItem], if this is a `Task` variant.
    pub fn as_task_mut(&mut self) -> Option<&mut TaskItem> {
        match self {
            GraphItem::Task(t) => Some(t),
            GraphItem::Data(_) => None,
        }
    }

    /// Borrow the inner [DataItem], if this is a `Data` variant.
    pub fn as_data(&self) -> Option<&DataItem> {
        match self {
            GraphItem::Data(d) => Some(d),
            GraphItem::Task(_) => None,
        }
    }
}
