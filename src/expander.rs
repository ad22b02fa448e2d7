//! Template expander: enumerates per-cycle, per-parameter coordinates and
//! instantiates Task and Data items into a [Store].
//!
//! Per-reference (input/wait-on) edges are not wired here — that's the
//! [crate::resolver]'s job. Output edges *are* wired here, at the moment a
//! task's declared output is instantiated: the task that produces a Data
//! item is known precisely at that point, and output edges are owned by
//! the source task. The expander's other concern is "what concrete items
//! exist", in a fixed order: available data first, then cycles in
//! declaration order, each cycle's dates in sequence, each date's tasks in
//! declaration order.

use crate::coordinate::{Coordinate, DimValue, ParamValue, DATE_DIMENSION};
use crate::error::{Error, Result};
use crate::ir::{Cycle, Ir, OutputRef, TaskRef, TaskTemplate};
use crate::item::{Availability, DataItem, Edge, GraphItem, ItemKey, Role, TaskItem};
use crate::store::Store;
use crate::temporal::{cycle_dates, Date};
use itertools::Itertools;
use std::collections::HashMap;

/// Tracks, for each `(data name, coordinate)` pair produced so far, the
/// name of the task that produced it — used only to report a useful
/// [Error::MultipleWriters] (the [Store] itself doesn't record provenance).
type Producers = HashMap<(String, Coordinate), String>;

/// Expand `ir` into a freshly populated [Store] with every Task and Data
/// item, and every Output edge wired. Input/wait-on edges are added
/// separately by [crate::resolver::resolve].
pub fn expand(ir: &Ir) -> Result<Store> {
    let mut store = Store::new();
    let mut producers: Producers = HashMap::new();

    insert_available_data(ir, &mut store)?;

    for cycle in &ir.cycles {
        for date in cycle_date_sequence(cycle) {
            for task_ref in &cycle.tasks {
                instantiate_task(ir, task_ref, date, &mut store, &mut producers)?;
            }
        }
    }

    Ok(store)
}

/// The date sequence a [Cycle] iterates over: its own cycling schedule, or
/// the single undated cycle `[None]` if `cycling` is absent. Shared with
/// [crate::resolver], which must re-derive exactly the same per-occurrence
/// coordinates the expander produced.
pub(crate) fn cycle_date_sequence(cycle: &Cycle) -> Vec<Option<Date>> {
    match &cycle.cycling {
        Some(cycling) => cycle_dates(cycling.start_date, cycling.stop_date, cycling.period),
        None => vec![None],
    }
}

fn insert_available_data(ir: &Ir, store: &mut Store) -> Result<()> {
    for template in &ir.data_available {
        let item = GraphItem::Data(DataItem::new(
            template.name.clone(),
            Coordinate::empty(),
            Availability::Available,
            payload_of(template),
        ));
        store.insert(template.name.clone(), item)?;
    }
    Ok(())
}

fn instantiate_task(
    ir: &Ir,
    task_ref: &TaskRef,
    date: Option<Date>,
    store: &mut Store,
    producers: &mut Producers,
) -> Result<()> {
    let template = ir
        .resolved_task_template(&task_ref.name)
        .ok_or_else(|| Error::UnknownName(task_ref.name.clone()))?;

    let date_coordinate = Coordinate::from_date(date);

    for param_coordinate in parameter_products(ir, &template)? {
        let coordinate = date_coordinate.merge(&param_coordinate)?;
        let task_key = ItemKey::new(task_ref.name.clone(), coordinate.clone());

        let mut task_item = TaskItem::new(task_ref.name.clone(), coordinate.clone(), payload_of(&template));

        let mut pending_data = Vec::with_capacity(task_ref.outputs.len());
        for output in &task_ref.outputs {
            let (data_item, data_key) =
                build_output_data(ir, output, &task_ref.name, &coordinate, producers)?;
            task_item.push_output(Edge::new(
                task_key.clone(),
                data_key,
                output.port().map(String::from),
                Role::Output,
            ));
            pending_data.push((output.name().to_string(), data_item));
        }

        tracing::debug!(task = %task_ref.name, ?coordinate, "instantiating task");
        store.insert(task_ref.name.clone(), GraphItem::Task(task_item))?;
        for (name, item) in pending_data {
            store.insert(name, GraphItem::Data(item))?;
        }
    }

    Ok(())
}

/// The Cartesian product of parameter values across a task template's
/// declared dimensions. A task with no declared parameters produces the
/// single empty coordinate.
pub(crate) fn parameter_products(ir: &Ir, template: &TaskTemplate) -> Result<Vec<Coordinate>> {
    if template.parameters.is_empty() {
        return Ok(vec![Coordinate::empty()]);
    }

    let mut domains = Vec::with_capacity(template.parameters.len());
    for dim in &template.parameters {
        let values = ir
            .parameters
            .get(dim)
            .ok_or_else(|| Error::UnknownName(dim.clone()))?;
        domains.push(
            values
                .iter()
                .map(|v| (dim.clone(), v.clone()))
                .collect::<Vec<_>>(),
        );
    }

    domains
        .into_iter()
        .multi_cartesian_product()
        .map(|pairs| {
            Coordinate::new(
                pairs
                    .into_iter()
                    .map(|(dim, value): (String, ParamValue)| (dim, DimValue::Param(value))),
            )
            .map_err(Error::from)
        })
        .collect()
}

/// Build (but do not insert) the Data item a task output produces, plus its
/// [ItemKey], checking the single-writer invariant against every output
/// produced so far.
fn build_output_data(
    ir: &Ir,
    output: &OutputRef,
    task_name: &str,
    task_coordinate: &Coordinate,
    producers: &mut Producers,
) -> Result<(DataItem, ItemKey)> {
    let template = ir
        .data_template(output.name())
        .ok_or_else(|| Error::UnknownName(output.name().to_string()))?;

    if !ir.is_generated(output.name()) {
        // An `outputs` entry naming an `Available` template isn't part of
        // the modeled system; surfaced through the same channel a front-end
        // validation failure would use.
        return Err(Error::UnknownName(output.name().to_string()));
    }

    let mut dims: Vec<&str> = template.parameters.iter().map(String::as_str).collect();
    if task_coordinate.contains(DATE_DIMENSION) {
        dims.push(DATE_DIMENSION);
    }
    let coordinate = task_coordinate.project(dims);

    let key = (output.name().to_string(), coordinate.clone());
    if let Some(first) = producers.get(&key) {
        return Err(Error::MultipleWriters {
            name: output.name().to_string(),
            coordinate,
            first: first.clone(),
            second: task_name.to_string(),
        });
    }
    producers.insert(key, task_name.to_string());

    let item_key = ItemKey::new(output.name().to_string(), coordinate.clone());
    let data_item = DataItem::new(
        output.name().to_string(),
        coordinate,
        Availability::Generated,
        payload_of(template),
    );
    Ok((data_item, item_key))
}

fn payload_of<T: serde::Serialize>(template: &T) -> serde_json::Value {
    serde_json::to_value(template).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn simple_cycle_produces_expected_task_count() {
        let ir = simple_cycle_ir();
        let store = expand(&ir).unwrap();
        assert_eq!(store.array("icon").unwrap().len(), 3);
    }

    #[test]
    fn parameter_sweep_expands_cartesian_product() {
        let ir = parameter_sweep_ir();
        let store = expand(&ir).unwrap();
        // 2 foo values x 1 bar value x 1 cycle date = 2 icon tasks.
        assert_eq!(store.array("icon").unwrap().len(), 2);
    }

    #[test]
    fn available_data_has_empty_coordinate() {
        let ir = guard_failure_ir();
        let store = expand(&ir).unwrap();
        for item in store.array("initial_conditions").into_iter().flat_map(|a| a.iter()) {
            assert!(item.coordinate().is_empty());
        }
    }

    #[test]
    fn undated_one_off_cycle_yields_empty_coordinate_task() {
        let ir = absolute_pin_ir();
        let store = expand(&ir).unwrap();
        let cleanup = store.array("cleanup").unwrap();
        assert_eq!(cleanup.len(), 1);
        assert!(cleanup.iter().next().unwrap().coordinate().is_empty());
    }

    #[test]
    fn task_output_edge_is_wired_at_expansion_time() {
        let ir = simple_cycle_ir();
        let store = expand(&ir).unwrap();
        for item in store.array("icon").unwrap().iter() {
            let task = item.as_task().unwrap();
            assert_eq!(task.outputs().len(), 1);
            assert_eq!(task.outputs()[0].sink.name, "icon_restart");
        }
    }

    #[test]
    fn multiple_writers_to_same_output_coordinate_rejected() {
        let ir = duplicate_writer_ir();
        let err = expand(&ir).unwrap_err();
        assert!(matches!(err, Error::MultipleWriters { .. }));
    }
}
