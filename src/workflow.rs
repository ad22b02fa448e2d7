//! [Workflow]: the top-level orchestrator.
//!
//! This is the crate's only public entry point for turning an [Ir] into a
//! concrete graph: its constructor runs the [expander] then the [resolver]
//! and, once both succeed, hands back an immutable view over the populated
//! [Store]. There is no other way to mutate a [Workflow] after construction.

use crate::coordinate::Coordinate;
use crate::error::Result;
use crate::expander;
use crate::ir::Ir;
use crate::item::{DataItem, Edge, GraphItem, TaskItem};
use crate::resolver;
use crate::store::Store;

/// The frozen, concrete dependency graph produced by unrolling an [Ir].
/// Constructing a [Workflow] is the only way to go from a declarative,
/// cyclic, parameterized description to a finite graph of task invocations
/// and data artifacts.
///
/// Safe to read concurrently once constructed; there is no API to mutate
/// it afterward.
#[derive(Debug, Clone)]
pub struct Workflow {
    store: Store,
}

impl Workflow {
    /// Unroll `ir` into a concrete [Workflow]: expand templates across
    /// cycle dates and parameter products, then resolve every input/wait-on
    /// reference into edges and check for cycles.
    ///
    /// Construction is a pure function of `ir` — identical input produces a
    /// byte-identical graph structure in identical iteration order.
    pub fn new(ir: &Ir) -> Result<Self> {
        let mut store = expander::expand(ir)?;
        resolver::resolve(ir, &mut store)?;
        Ok(Workflow { store })
    }

    /// Ordered iteration over every Task item in the graph: Arrays in
    /// insertion order of their names, items within an Array in insertion
    /// order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskItem> {
        self.store.iter_items().filter_map(GraphItem::as_task)
    }

    /// Ordered iteration over every Data item in the graph.
    pub fn data(&self) -> impl Iterator<Item = &DataItem> {
        self.store.iter_items().filter_map(GraphItem::as_data)
    }

    /// Ordered iteration over every [GraphItem], Task and Data alike, in
    /// Store order.
    pub fn items(&self) -> impl Iterator<Item = &GraphItem> {
        self.store.iter_items()
    }

    /// Every edge in the graph, ordered by sink task insertion order, and
    /// within a task by output declaration order, then input declaration
    /// order, then wait-on declaration order — matching the order
    /// [crate::expander] and [crate::resolver] wired them onto each task.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.tasks()
            .flat_map(|task| task.outputs().iter().chain(task.inputs()).chain(task.wait_on()))
    }

    /// Look up a single item by its exact `(name, coordinate)`, delegating
    /// to the underlying [Store].
    pub fn lookup(&self, name: &str, coordinate: &Coordinate) -> Result<&GraphItem> {
        self.store.lookup(name, coordinate)
    }

    /// The number of Task items in the graph.
    pub fn task_count(&self) -> usize {
        self.tasks().count()
    }

    /// The number of Data items in the graph.
    pub fn data_count(&self) -> usize {
        self.data().count()
    }

    /// Whether the graph contains no items at all.
    pub fn is_empty(&self) -> bool {
        self.store.iter_items().next().is_none()
    }
}
