//! IR fixture builders, gated `#[cfg(any(test, feature = "test-utils"))]` so
//! unit tests and the `tests/scenarios.rs`/`tests/properties.rs` integration
//! suites share fixtures instead of duplicating literal IR construction.
//!
//! Each builder below corresponds to one of the end-to-end unrolling
//! scenarios (S1-S6), plus a couple of fixtures exercising a single
//! invariant in isolation.

use crate::coordinate::ParamValue;
use crate::ir::{
    Cycle, Cycling, DataTemplate, Ir, LagSpec, OutputRef, ParamModifier, Ref, TargetCycle,
    TaskRef, TaskTemplate,
};
use crate::temporal::{Date, Duration, When};
use indexmap::IndexMap;

/// Construct a [Date] at midnight, for concise fixture literals.
pub fn date(year: i32, month: u32, day: u32) -> Date {
    Date::new(year, month, day, 0, 0).expect("fixture date is valid")
}

fn data_template(name: &str, parameters: &[&str]) -> DataTemplate {
    DataTemplate {
        name: name.to_string(),
        parameters: parameters.iter().map(|s| s.to_string()).collect(),
        extra: IndexMap::new(),
    }
}

fn task_template(parameters: &[&str]) -> TaskTemplate {
    TaskTemplate {
        plugin: Some("noop".to_string()),
        parameters: parameters.iter().map(|s| s.to_string()).collect(),
        extra: IndexMap::new(),
    }
}

/// **S1**: cycling `2026-01-01 -> 2026-06-01 P2M`, one task `icon` with
/// input `icon_restart` referencing itself at `lag: -P2M` guarded by
/// `after: 2026-01-01`.
pub fn simple_cycle_ir() -> Ir {
    let mut tasks = IndexMap::new();
    tasks.insert("icon".to_string(), task_template(&[]));

    let icon_ref = TaskRef {
        name: "icon".to_string(),
        inputs: vec![Ref {
            name: "icon_restart".to_string(),
            port: Some("restart".to_string()),
            when: Some(When {
                after: Some(date(2026, 1, 1)),
                ..Default::default()
            }),
            target_cycle: Some(TargetCycle {
                lag: Some(LagSpec::One(Duration::from_months(-2))),
                date: None,
            }),
            parameters: IndexMap::new(),
        }],
        outputs: vec![OutputRef::Full {
            name: "icon_restart".to_string(),
            port: Some("restart".to_string()),
        }],
        wait_on: vec![],
    };

    Ir {
        start_date: date(2026, 1, 1),
        stop_date: date(2026, 6, 1),
        cycles: vec![Cycle {
            name: "main".to_string(),
            cycling: Some(Cycling {
                start_date: date(2026, 1, 1),
                stop_date: date(2026, 6, 1),
                period: Duration::from_months(2),
            }),
            tasks: vec![icon_ref],
        }],
        tasks,
        data_available: vec![],
        data_generated: vec![data_template("icon_restart", &[])],
        parameters: IndexMap::new(),
    }
}

/// **S2**: a yearly task with input `stream_2` at `lag: [P0M, P2M, P4M,
/// P6M, P8M, P10M]`, produced bimonthly.
pub fn lag_list_ir() -> Ir {
    let mut tasks = IndexMap::new();
    tasks.insert("stream2_task".to_string(), task_template(&[]));
    tasks.insert("yearly".to_string(), task_template(&[]));

    let stream2_ref = TaskRef {
        name: "stream2_task".to_string(),
        inputs: vec![],
        outputs: vec![OutputRef::Name("stream_2".to_string())],
        wait_on: vec![],
    };

    let lags = [0, 2, 4, 6, 8, 10]
        .into_iter()
        .map(Duration::from_months)
        .collect();

    let yearly_ref = TaskRef {
        name: "yearly".to_string(),
        inputs: vec![Ref {
            name: "stream_2".to_string(),
            port: Some("history".to_string()),
            when: None,
            target_cycle: Some(TargetCycle {
                lag: Some(LagSpec::Many(lags)),
                date: None,
            }),
            parameters: IndexMap::new(),
        }],
        outputs: vec![],
        wait_on: vec![],
    };

    Ir {
        start_date: date(2026, 1, 1),
        stop_date: date(2027, 1, 1),
        cycles: vec![
            Cycle {
                name: "bimonthly".to_string(),
                cycling: Some(Cycling {
                    start_date: date(2026, 1, 1),
                    stop_date: date(2027, 1, 1),
                    period: Duration::from_months(2),
                }),
                tasks: vec![stream2_ref],
            },
            Cycle {
                name: "yearly".to_string(),
                cycling: Some(Cycling {
                    start_date: date(2026, 1, 1),
                    stop_date: date(2027, 1, 1),
                    period: Duration::from_years(1),
                }),
                tasks: vec![yearly_ref],
            },
        ],
        tasks,
        data_available: vec![],
        data_generated: vec![data_template("stream_2", &[])],
        parameters: IndexMap::new(),
    }
}

/// **S3**: task `icon` with `parameters: [foo, bar]`, `foo: [0, 1]`, `bar:
/// [3.0]`. `statistics` has `parameters: [bar]` and fans out over `foo`
/// only via `bar: single` on its `icon_output` input.
pub fn parameter_sweep_ir() -> Ir {
    let mut tasks = IndexMap::new();
    tasks.insert("icon".to_string(), task_template(&["foo", "bar"]));
    tasks.insert("statistics".to_string(), task_template(&["bar"]));

    let icon_ref = TaskRef {
        name: "icon".to_string(),
        inputs: vec![],
        outputs: vec![
            OutputRef::Name("icon_output".to_string()),
            OutputRef::Name("icon_restart".to_string()),
        ],
        wait_on: vec![],
    };

    let mut single_bar = IndexMap::new();
    single_bar.insert("bar".to_string(), ParamModifier::Single);

    let statistics_ref = TaskRef {
        name: "statistics".to_string(),
        inputs: vec![Ref {
            name: "icon_output".to_string(),
            port: Some("in".to_string()),
            when: None,
            target_cycle: None,
            parameters: single_bar,
        }],
        outputs: vec![],
        wait_on: vec![],
    };

    let mut parameters = IndexMap::new();
    parameters.insert(
        "foo".to_string(),
        vec![ParamValue::Int(0), ParamValue::Int(1)],
    );
    parameters.insert("bar".to_string(), vec![ParamValue::Float(3.0)]);

    Ir {
        start_date: date(2026, 1, 1),
        stop_date: date(2026, 2, 1),
        cycles: vec![Cycle {
            name: "main".to_string(),
            cycling: None,
            tasks: vec![icon_ref, statistics_ref],
        }],
        tasks,
        data_available: vec![],
        data_generated: vec![
            data_template("icon_output", &["foo", "bar"]),
            data_template("icon_restart", &["foo", "bar"]),
        ],
        parameters,
    }
}

/// **S4**: one-off task `cleanup` in an undated cycle, with `wait_on: icon,
/// target_cycle.date: 2026-05-01`.
pub fn absolute_pin_ir() -> Ir {
    let mut ir = simple_cycle_ir();

    ir.tasks.insert("cleanup".to_string(), task_template(&[]));

    ir.cycles.push(Cycle {
        name: "cleanup-cycle".to_string(),
        cycling: None,
        tasks: vec![TaskRef {
            name: "cleanup".to_string(),
            inputs: vec![],
            outputs: vec![],
            wait_on: vec![Ref {
                name: "icon".to_string(),
                port: None,
                when: None,
                target_cycle: Some(TargetCycle {
                    lag: None,
                    date: Some(date(2026, 5, 1)),
                }),
                parameters: IndexMap::new(),
            }],
        }],
    });

    ir
}

/// **S5**: `initial_conditions` input guarded `at: start_date`.
pub fn guard_failure_ir() -> Ir {
    let mut tasks = IndexMap::new();
    tasks.insert("forecast".to_string(), task_template(&[]));

    let forecast_ref = TaskRef {
        name: "forecast".to_string(),
        inputs: vec![Ref {
            name: "initial_conditions".to_string(),
            port: Some("ic".to_string()),
            when: Some(When {
                at: Some(date(2026, 1, 1)),
                ..Default::default()
            }),
            target_cycle: None,
            parameters: IndexMap::new(),
        }],
        outputs: vec![],
        wait_on: vec![],
    };

    Ir {
        start_date: date(2026, 1, 1),
        stop_date: date(2026, 6, 1),
        cycles: vec![Cycle {
            name: "main".to_string(),
            cycling: Some(Cycling {
                start_date: date(2026, 1, 1),
                stop_date: date(2026, 6, 1),
                period: Duration::from_months(2),
            }),
            tasks: vec![forecast_ref],
        }],
        tasks,
        data_available: vec![data_template("initial_conditions", &[])],
        data_generated: vec![],
        parameters: IndexMap::new(),
    }
}

/// **S6**: a reference to a name absent from the IR.
pub fn missing_name_ir() -> Ir {
    let mut ir = guard_failure_ir();
    ir.cycles[0].tasks[0].inputs[0].name = "does_not_exist".to_string();
    ir.cycles[0].tasks[0].inputs[0].when = None;
    ir
}

/// Two tasks both declaring the same undated output — exercises
/// [crate::error::Error::MultipleWriters].
pub fn duplicate_writer_ir() -> Ir {
    let mut tasks = IndexMap::new();
    tasks.insert("producer_a".to_string(), task_template(&[]));
    tasks.insert("producer_b".to_string(), task_template(&[]));

    Ir {
        start_date: date(2026, 1, 1),
        stop_date: date(2026, 2, 1),
        cycles: vec![Cycle {
            name: "main".to_string(),
            cycling: None,
            tasks: vec![
                TaskRef {
                    name: "producer_a".to_string(),
                    inputs: vec![],
                    outputs: vec![OutputRef::Name("shared_output".to_string())],
                    wait_on: vec![],
                },
                TaskRef {
                    name: "producer_b".to_string(),
                    inputs: vec![],
                    outputs: vec![OutputRef::Name("shared_output".to_string())],
                    wait_on: vec![],
                },
            ],
        }],
        tasks,
        data_available: vec![],
        data_generated: vec![data_template("shared_output", &[])],
        parameters: IndexMap::new(),
    }
}
