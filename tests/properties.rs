//! Property-based tests for the six core invariants, checked over small,
//! randomly-sized parameter sweeps rather than hand-picked scenarios.

use cyclegraph_core::coordinate::{Coordinate, ParamValue};
use cyclegraph_core::ir::{Cycle, Cycling, DataTemplate, Ir, OutputRef, Ref, TaskRef, TaskTemplate};
use cyclegraph_core::item::Availability;
use cyclegraph_core::temporal::{Date, Duration, When};
use cyclegraph_core::Workflow;
use indexmap::IndexMap;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn date(year: i32, month: u32) -> Date {
    Date::new(year, month, 1, 0, 0).unwrap()
}

/// Builds a small `icon` (producer, swept over `foo`) / `statistics`
/// (consumer, fanning out over `foo`) pair cycling `foo_count` wide over
/// `cycle_count` bimonthly dates, so the generated graph's size is
/// controlled by two small integers.
fn sweep_ir(cycle_count: u32, foo_count: i64) -> Ir {
    let stop_month = 1 + cycle_count * 2;
    let (stop_year, stop_month) = if stop_month > 12 {
        (2027, stop_month - 12)
    } else {
        (2026, stop_month)
    };

    let mut tasks = IndexMap::new();
    tasks.insert(
        "icon".to_string(),
        TaskTemplate {
            plugin: Some("noop".to_string()),
            parameters: vec!["foo".to_string()],
            extra: IndexMap::new(),
        },
    );
    tasks.insert(
        "statistics".to_string(),
        TaskTemplate {
            plugin: Some("noop".to_string()),
            parameters: vec![],
            extra: IndexMap::new(),
        },
    );

    let icon_ref = TaskRef {
        name: "icon".to_string(),
        inputs: vec![],
        outputs: vec![OutputRef::Name("icon_output".to_string())],
        wait_on: vec![],
    };

    let statistics_ref = TaskRef {
        name: "statistics".to_string(),
        inputs: vec![Ref {
            name: "icon_output".to_string(),
            port: Some("in".to_string()),
            when: None,
            target_cycle: None,
            parameters: IndexMap::new(),
        }],
        outputs: vec![],
        wait_on: vec![],
    };

    let mut parameters = IndexMap::new();
    parameters.insert(
        "foo".to_string(),
        (0..foo_count).map(ParamValue::Int).collect(),
    );

    Ir {
        start_date: date(2026, 1),
        stop_date: date(stop_year, stop_month),
        cycles: vec![Cycle {
            name: "main".to_string(),
            cycling: Some(Cycling {
                start_date: date(2026, 1),
                stop_date: date(stop_year, stop_month),
                period: Duration::from_months(2),
            }),
            tasks: vec![icon_ref, statistics_ref],
        }],
        tasks,
        data_available: vec![],
        data_generated: vec![DataTemplate {
            name: "icon_output".to_string(),
            parameters: vec!["foo".to_string()],
            extra: IndexMap::new(),
        }],
        parameters,
    }
}

proptest! {
    /// 1. Determinism: constructing twice from equal IR produces equal
    /// iteration orders and equal edge sets.
    #[test]
    fn determinism(cycle_count in 1u32..5, foo_count in 1i64..4) {
        let ir = sweep_ir(cycle_count, foo_count);
        let a = Workflow::new(&ir).unwrap();
        let b = Workflow::new(&ir).unwrap();

        let items_a: Vec<_> = a.items().map(|i| (i.name().to_string(), i.coordinate().clone())).collect();
        let items_b: Vec<_> = b.items().map(|i| (i.name().to_string(), i.coordinate().clone())).collect();
        prop_assert_eq!(items_a, items_b);

        let edges_a: Vec<_> = a.edges().cloned().collect();
        let edges_b: Vec<_> = b.edges().cloned().collect();
        prop_assert_eq!(edges_a, edges_b);
    }

    /// 2. Coordinate uniqueness: within any name-group, no two items share a
    /// coordinate.
    #[test]
    fn coordinate_uniqueness(cycle_count in 1u32..5, foo_count in 1i64..4) {
        let ir = sweep_ir(cycle_count, foo_count);
        let workflow = Workflow::new(&ir).unwrap();

        let mut seen: HashMap<&str, HashSet<Coordinate>> = HashMap::new();
        for item in workflow.items() {
            prop_assert!(seen.entry(item.name()).or_default().insert(item.coordinate().clone()));
        }
    }

    /// 3. Single writer: every Data item has at most one producing Task.
    #[test]
    fn single_writer(cycle_count in 1u32..5, foo_count in 1i64..4) {
        let ir = sweep_ir(cycle_count, foo_count);
        let workflow = Workflow::new(&ir).unwrap();

        let mut producers: HashMap<(String, Coordinate), usize> = HashMap::new();
        for task in workflow.tasks() {
            for edge in task.outputs() {
                let key = (edge.sink.name.clone(), edge.sink.coordinate.clone());
                *producers.entry(key).or_insert(0) += 1;
            }
        }
        prop_assert!(producers.values().all(|&count| count == 1));
    }

    /// 4. Reachability: every Generated Data item has exactly one producing
    /// Task edge (the sweep fixture never puts a reference out of cycle
    /// range, so there is no legal excuse for absence here).
    #[test]
    fn reachability(cycle_count in 1u32..5, foo_count in 1i64..4) {
        let ir = sweep_ir(cycle_count, foo_count);
        let workflow = Workflow::new(&ir).unwrap();

        let produced: HashSet<(String, Coordinate)> = workflow
            .tasks()
            .flat_map(|t| t.outputs())
            .map(|edge| (edge.sink.name.clone(), edge.sink.coordinate.clone()))
            .collect();

        for data in workflow.data() {
            if matches!(data.availability(), Availability::Generated) {
                let key = (data.name().to_string(), data.coordinate().clone());
                prop_assert!(produced.contains(&key));
            }
        }
    }

    /// 5. Dimension closure: every item's coordinate dimension set equals
    /// every sibling's in the same name-group.
    #[test]
    fn dimension_closure(cycle_count in 1u32..5, foo_count in 1i64..4) {
        let ir = sweep_ir(cycle_count, foo_count);
        let workflow = Workflow::new(&ir).unwrap();

        let mut dims_by_name: HashMap<&str, std::collections::BTreeSet<String>> = HashMap::new();
        for item in workflow.items() {
            let dims = item.coordinate().dimension_names();
            match dims_by_name.get(item.name()) {
                Some(expected) => prop_assert_eq!(expected, &dims),
                None => { dims_by_name.insert(item.name(), dims); }
            }
        }
    }

    /// 6. Guard monotonicity: if `when: {after: D}` passes at cycle date c,
    /// it passes for every later date c' > c.
    #[test]
    fn guard_monotonicity(after_month in 1u32..9, cycle_month in 1u32..9, later_delta in 1u32..4) {
        let guard = When {
            at: None,
            after: Some(date(2026, after_month)),
            before: None,
        };
        let c = date(2026, cycle_month);
        let later = date(2026, cycle_month + later_delta);
        prop_assume!(later > c);

        if guard.evaluate(Some(c)) {
            prop_assert!(guard.evaluate(Some(later)));
        }
    }
}
