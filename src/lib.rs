#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unreachable_pub)]

//! `cyclegraph-core` is the graph-unrolling engine at the heart of a
//! scientific-workflow compiler: it consumes a declarative, cyclic,
//! parameterized workflow description (the [ir]) and produces a finite,
//! concrete dependency graph of task invocations and data artifacts linked
//! by typed ports — ready to be handed to an external execution backend.
//!
//! The engine is organized leaves-first:
//!
//! - [temporal]: date/duration arithmetic, cycle-date enumeration, `when`-guards.
//! - [coordinate]: the multidimensional coordinate every concrete item carries.
//! - [store]: the `(name, coordinate)`-indexed container of graph items.
//! - [item]: [GraphItem](item::GraphItem), [Edge](item::Edge), and friends.
//! - [expander]: enumerates cycle/parameter coordinates and instantiates items.
//! - [resolver]: wires input/wait-on edges and enforces arity/cycle invariants.
//! - [workflow]: the top-level orchestrator — the only public entry point.
//!
//! Configuration parsing, execution/dispatch, visualization, and persistence
//! are all out of scope: this crate turns a validated [ir::Ir] into a
//! [workflow::Workflow] and nothing more.
//!
//! ## Feature flags
//!
//! - `test-utils`: exposes [test_utils], IR fixture builders used by this
//!   crate's own tests and available to downstream crates building their own
//!   fixtures against the same IR shapes.

pub mod coordinate;
pub mod error;
pub mod expander;
pub mod ir;
pub mod item;
pub mod resolver;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod temporal;
pub mod workflow;

pub use error::{Error, Result};
pub use workflow::Workflow;
