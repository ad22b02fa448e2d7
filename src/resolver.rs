//! Dependency resolver: wires input/wait-on edges onto every Task item the
//! expander created, then checks for dependency cycles.
//!
//! Runs strictly after [crate::expander::expand] completes: Output edges
//! and every concrete item already exist in the [Store], so resolution is a
//! matter of re-deriving, per declared reference, the candidate target
//! coordinate(s) and consulting the Store — never mutating it except to
//! append edges onto the referencing task.

use crate::coordinate::{Coordinate, DimValue, DATE_DIMENSION};
use crate::error::{Error, Result};
use crate::expander::{cycle_date_sequence, parameter_products};
use crate::ir::{Ir, ParamModifier, Ref, TargetCycle, TaskRef};
use crate::item::{Edge, GraphItem, ItemKey, Role};
use crate::store::Store;
use crate::temporal::Date;
use petgraph::graph::DiGraph;
use std::collections::{BTreeSet, HashMap};

/// Resolve every input/wait-on reference in `ir` against the items already
/// present in `store`, wiring edges in place, then check for dependency
/// cycles.
pub fn resolve(ir: &Ir, store: &mut Store) -> Result<()> {
    for cycle in &ir.cycles {
        for date in cycle_date_sequence(cycle) {
            for task_ref in &cycle.tasks {
                resolve_task_occurrence(ir, store, task_ref, date)?;
            }
        }
    }

    detect_cycles(store)
}

fn resolve_task_occurrence(
    ir: &Ir,
    store: &mut Store,
    task_ref: &TaskRef,
    date: Option<Date>,
) -> Result<()> {
    let template = ir
        .resolved_task_template(&task_ref.name)
        .ok_or_else(|| Error::UnknownName(task_ref.name.clone()))?;
    let date_coordinate = Coordinate::from_date(date);

    for param_coordinate in parameter_products(ir, &template)? {
        let coordinate = date_coordinate.merge(&param_coordinate)?;

        let mut input_edges = Vec::with_capacity(task_ref.inputs.len());
        for reference in &task_ref.inputs {
            let (edges, excused) = resolve_reference(
                ir,
                store,
                &task_ref.name,
                date,
                &coordinate,
                reference,
                Role::Input,
            )?;
            if edges.is_empty() && reference.port.is_some() && !excused {
                return Err(Error::UnresolvedInput {
                    task: task_ref.name.clone(),
                    coordinate: coordinate.clone(),
                    target: reference.name.clone(),
                    port: reference.port.clone(),
                });
            }
            input_edges.extend(edges);
        }

        let mut wait_edges = Vec::with_capacity(task_ref.wait_on.len());
        for reference in &task_ref.wait_on {
            let (edges, _excused) = resolve_reference(
                ir,
                store,
                &task_ref.name,
                date,
                &coordinate,
                reference,
                Role::WaitOn,
            )?;
            wait_edges.extend(edges);
        }

        let item = store.lookup_mut(&task_ref.name, &coordinate)?;
        let task = item
            .as_task_mut()
            .expect("task_ref names a Task Array, established by the expander");
        for edge in input_edges {
            task.push_input(edge);
        }
        for edge in wait_edges {
            task.push_wait_on(edge);
        }
    }

    Ok(())
}

/// Resolve a single reference to zero or more [Edge]s. Returns the wired
/// edges plus whether a zero-edge result is a legal
/// excuse (guard failure, or every candidate's date outside all cycling
/// windows) rather than a genuine arity violation.
fn resolve_reference(
    ir: &Ir,
    store: &Store,
    task_name: &str,
    task_date: Option<Date>,
    c_t: &Coordinate,
    reference: &Ref,
) -> Result<(Vec<Edge>, bool)> {
    if ir.tasks.get(&reference.name).is_none() && ir.data_template(&reference.name).is_none() {
        return Err(Error::UnknownName(reference.name.clone()));
    }

    let guard = reference.when.clone().unwrap_or_default();
    if !guard.evaluate(task_date) {
        tracing::warn!(
            task = %task_name,
            target = %reference.name,
            "when-guard rejected reference; zero edges (legal)"
        );
        return Ok((Vec::new(), true));
    }

    let target_dims: BTreeSet<String> = store
        .array(&reference.name)
        .and_then(|array| array.dimension_names())
        .cloned()
        .unwrap_or_default();
    let target_has_date = target_dims.contains(DATE_DIMENSION);

    let date_candidates = candidate_dates(c_t, reference.target_cycle.as_ref(), target_has_date);

    let param_dims: Vec<String> = target_dims
        .iter()
        .filter(|dim| dim.as_str() != DATE_DIMENSION)
        .cloned()
        .collect();

    let mut candidates = Vec::new();
    for base in &date_candidates {
        candidates.extend(apply_parameter_modifiers(
            ir,
            base,
            c_t,
            &param_dims,
            &reference.parameters,
        )?);
    }

    let mut edges = Vec::new();
    let mut any_in_range = false;
    for candidate in &candidates {
        let in_range = candidate
            .date()
            .map_or(true, |d| date_in_any_cycle(ir, d));
        any_in_range |= in_range;

        let matches = store.lookup_partial(&reference.name, candidate);
        tracing::trace!(
            task = %task_name,
            target = %reference.name,
            ?candidate,
            matched = matches.len(),
            "resolved reference candidate"
        );

        for item in matches {
            edges.push(Edge::new(
                item.key(),
                ItemKey::new(task_name.to_string(), c_t.clone()),
                reference.port.clone(),
                Role::Input,
            ));
        }
    }

    let excused = edges.is_empty() && (candidates.is_empty() || !any_in_range);
    if edges.is_empty() && excused {
        tracing::warn!(
            task = %task_name,
            target = %reference.name,
            "reference resolved to zero items with every candidate date out of range (legal)"
        );
    }

    Ok((edges, excused))
}

/// Apply `target_cycle` to derive the candidate date(s). If the target
/// item doesn't carry a `date` dimension at all, the date is
/// dropped from every candidate regardless of `target_cycle` — matching is
/// then driven entirely by whatever parameter dimensions remain.
fn candidate_dates(
    c_t: &Coordinate,
    target_cycle: Option<&TargetCycle>,
    target_has_date: bool,
) -> Vec<Coordinate> {
    if !target_has_date {
        return vec![c_t.without(DATE_DIMENSION)];
    }

    match target_cycle {
        None => vec![c_t.clone()],
        Some(TargetCycle {
            date: Some(pinned), ..
        }) => vec![c_t.with(DATE_DIMENSION, DimValue::Date(*pinned))],
        Some(TargetCycle {
            lag: Some(lag_spec),
            ..
        }) => lag_spec
            .durations()
            .into_iter()
            .filter_map(|lag| {
                c_t.date()
                    .and_then(|d| d.checked_add(lag))
                    .map(|shifted| c_t.with(DATE_DIMENSION, DimValue::Date(shifted)))
            })
            .collect(),
        Some(_) => vec![c_t.clone()],
    }
}

/// Fan out (or pin via `single`) over the target's declared parameter
/// dimensions.
fn apply_parameter_modifiers(
    ir: &Ir,
    base: &Coordinate,
    c_t: &Coordinate,
    target_param_dims: &[String],
    modifiers: &indexmap::IndexMap<String, ParamModifier>,
) -> Result<Vec<Coordinate>> {
    let mut coordinates = vec![base.clone()];

    for dim in target_param_dims {
        match modifiers.get(dim) {
            Some(ParamModifier::Single) => {
                if let Some(value) = c_t.get(dim) {
                    coordinates = coordinates
                        .into_iter()
                        .map(|c| c.with(dim, value.clone()))
                        .collect();
                }
            }
            None => {
                let domain = ir.parameters.get(dim).cloned().unwrap_or_default();
                let mut next = Vec::with_capacity(coordinates.len() * domain.len().max(1));
                for coordinate in coordinates {
                    for value in &domain {
                        next.push(coordinate.with(dim, DimValue::Param(value.clone())));
                    }
                }
                coordinates = next;
            }
        }
    }

    Ok(coordinates)
}

/// Whether `date` falls within any declared cycle's `[start, stop)` window
/// — one of the legal excuses arity enforcement allows for a zero-edge
/// result.
fn date_in_any_cycle(ir: &Ir, date: Date) -> bool {
    ir.cycles.iter().any(|cycle| match &cycle.cycling {
        Some(cycling) => date.in_range(&cycling.start_date, &cycling.stop_date),
        None => false,
    })
}

/// Cycle detection over the materialized (Task, Data, Task) projection: an
/// edge `P -> T` exists whenever `T` consumes a Data item `P` produced.
/// Because every node is a concrete `(name, coordinate)` pair, a
/// legitimate temporal lag can never close a loop — only a genuine
/// same-coordinate or future-dated misconfiguration can.
fn detect_cycles(store: &Store) -> Result<()> {
    let mut producer_of: HashMap<ItemKey, ItemKey> = HashMap::new();
    for item in store.iter_items() {
        if let GraphItem::Task(task) = item {
            for edge in task.outputs() {
                producer_of.insert(edge.sink.clone(), edge.source.clone());
            }
        }
    }

    let mut graph = DiGraph::<ItemKey, ()>::new();
    let mut nodes: HashMap<ItemKey, petgraph::graph::NodeIndex> = HashMap::new();

    for item in store.iter_items() {
        if let GraphItem::Task(_) = item {
            let key = item.key();
            nodes.entry(key.clone()).or_insert_with(|| graph.add_node(key));
        }
    }

    for item in store.iter_items() {
        if let GraphItem::Task(task) = item {
            let consumer_idx = nodes[&item.key()];
            for edge in task.inputs() {
                if let Some(producer) = producer_of.get(&edge.source) {
                    if let Some(&producer_idx) = nodes.get(producer) {
                        graph.add_edge(producer_idx, consumer_idx, ());
                    }
                }
            }
        }
    }

    if let Err(cycle) = petgraph::algo::toposort(&graph, None) {
        let offending = &graph[cycle.node_id()];
        return Err(Error::Cyclic(offending.name.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expander::expand;
    use crate::test_utils::*;

    fn build(ir: &Ir) -> Store {
        let mut store = expand(ir).unwrap();
        resolve(ir, &mut store).unwrap();
        store
    }

    #[test]
    fn s1_simple_cycle_restart_lag() {
        let ir = simple_cycle_ir();
        let store = build(&ir);

        let icon = store.array("icon").unwrap();
        assert_eq!(icon.len(), 3);

        let mut counts: Vec<usize> = icon.iter().map(|i| i.as_task().unwrap().inputs().len()).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![0, 1, 1]);
    }

    #[test]
    fn s2_lag_list_produces_six_edges() {
        let ir = lag_list_ir();
        let store = build(&ir);

        let yearly = store.array("yearly").unwrap();
        assert_eq!(yearly.len(), 1);
        let task = yearly.iter().next().unwrap().as_task().unwrap();
        assert_eq!(task.inputs().len(), 6);

        let distinct: BTreeSet<_> = task
            .inputs()
            .iter()
            .map(|e| format!("{:?}", e.source.coordinate))
            .collect();
        assert_eq!(distinct.len(), 6);
    }

    #[test]
    fn s3_parameter_sweep_fans_out_over_foo_only() {
        let ir = parameter_sweep_ir();
        let store = build(&ir);

        let statistics = store.array("statistics").unwrap();
        assert_eq!(statistics.len(), 1);
        let task = statistics.iter().next().unwrap().as_task().unwrap();
        assert_eq!(task.inputs().len(), 2);
        for edge in task.inputs() {
            assert_eq!(edge.role, Role::Input);
        }
    }

    #[test]
    fn s4_absolute_date_pin_wait_on() {
        let ir = absolute_pin_ir();
        let store = build(&ir);

        let cleanup = store.array("cleanup").unwrap();
        let task = cleanup.iter().next().unwrap().as_task().unwrap();
        assert_eq!(task.wait_on().len(), 1);
        assert_eq!(task.wait_on()[0].source.coordinate.date(), Some(date(2026, 5, 1)));
    }

    #[test]
    fn s5_guard_failure_except_at_start_date() {
        let ir = guard_failure_ir();
        let store = build(&ir);

        let forecast = store.array("forecast").unwrap();
        assert_eq!(forecast.len(), 3);
        let counts: Vec<usize> = forecast
            .iter()
            .map(|i| i.as_task().unwrap().inputs().len())
            .collect();
        assert_eq!(counts.iter().filter(|&&c| c == 1).count(), 1);
        assert_eq!(counts.iter().filter(|&&c| c == 0).count(), 2);
    }

    #[test]
    fn s6_missing_name_is_an_error() {
        let ir = missing_name_ir();
        let mut store = expand(&ir).unwrap();
        let err = resolve(&ir, &mut store).unwrap_err();
        assert!(matches!(err, Error::UnknownName(_)));
    }
}
