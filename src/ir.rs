//! The external IR surface: the already-validated intermediate
//! representation this crate consumes. Parsing/schema validation from
//! whatever source config format a front-end reads is out of scope here —
//! these are plain, serde-derived value types a front-end deserializes
//! directly into (or constructs by hand, as [crate::test_utils] does).

use crate::coordinate::ParamValue;
use crate::temporal::{Date, Duration, When};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as Payload;

/// The name of the task template whose scalar fields are shallow-merged as
/// defaults into every other task template.
pub const ROOT_TASK: &str = "ROOT";

/// A `single` modifier pins a target dimension to the referencing task's
/// own value rather than fanning out over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParamModifier {
    /// Keep the referencing task's value on this dimension; don't fan out.
    Single,
}

/// `target_cycle.lag`: either one duration or a list of durations, each
/// producing its own candidate coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LagSpec {
    /// A single lag applied uniformly.
    One(Duration),
    /// Multiple lags, each expanding to its own candidate.
    Many(Vec<Duration>),
}

impl LagSpec {
    /// The individual lags this spec expands to.
    pub fn durations(&self) -> Vec<Duration> {
        match self {
            LagSpec::One(d) => vec![*d],
            LagSpec::Many(ds) => ds.clone(),
        }
    }
}

/// `target_cycle`: how a reference's coordinate is shifted relative to the
/// referencing task's own coordinate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TargetCycle {
    /// Relative lag(s) applied to the referencing task's date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag: Option<LagSpec>,
    /// An absolute date pin, overriding the referencing task's date
    /// entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
}

/// A reference from a task to another task/data item: an input, or a
/// wait-on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ref {
    /// The name of the referenced task/data template.
    pub name: String,
    /// The port this reference binds to (inputs only; ignored for
    /// wait-ons). The literal string `"None"` is a valid port name, not a
    /// sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Gates whether this reference is materialized at all in a given
    /// cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<When>,
    /// How the target coordinate's date is derived from the referencing
    /// task's own date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cycle: Option<TargetCycle>,
    /// Per-dimension fan-out modifiers.
    #[serde(default)]
    pub parameters: IndexMap<String, ParamModifier>,
}

impl Ref {
    /// A bare reference by name, with every optional clause absent.
    pub fn new(name: impl Into<String>) -> Self {
        Ref {
            name: name.into(),
            port: None,
            when: None,
            target_cycle: None,
            parameters: IndexMap::new(),
        }
    }
}

/// An output declaration on a task-ref: either a bare name, or a
/// `{name, port}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OutputRef {
    /// `outputs: [icon_restart]` shorthand.
    Name(String),
    /// `outputs: [{name: icon_restart, port: restart}]` explicit form.
    Full {
        /// The produced data template's name.
        name: String,
        /// The port the backend should see this output bound to, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<String>,
    },
}

impl OutputRef {
    /// The referenced data template's name, regardless of shorthand.
    pub fn name(&self) -> &str {
        match self {
            OutputRef::Name(n) => n,
            OutputRef::Full { name, .. } => name,
        }
    }

    /// The declared port, if any.
    pub fn port(&self) -> Option<&str> {
        match self {
            OutputRef::Name(_) => None,
            OutputRef::Full { port, .. } => port.as_deref(),
        }
    }
}

/// One task instantiation declared within a cycle's `tasks` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskRef {
    /// The task template this instantiates.
    pub name: String,
    /// Ordered input references, in declaration order.
    #[serde(default)]
    pub inputs: Vec<Ref>,
    /// Declared outputs.
    #[serde(default)]
    pub outputs: Vec<OutputRef>,
    /// Ordered wait-on references, in declaration order.
    #[serde(default)]
    pub wait_on: Vec<Ref>,
}

/// A cycling block: the date range and stride over which a [Cycle]'s tasks
/// repeat. Its absence on a [Cycle] means an undated one-off cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Cycling {
    /// First cycle date (inclusive).
    pub start_date: Date,
    /// Upper bound on cycle dates (exclusive).
    pub stop_date: Date,
    /// The stride between successive cycle dates.
    pub period: Duration,
}

/// One `cycles` entry: a named block of tasks repeated on a date schedule,
/// or executed once if `cycling` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Cycle {
    /// The cycle's name, for diagnostics only.
    pub name: String,
    /// The date schedule this cycle's tasks repeat on; `None` for an
    /// undated, one-off cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycling: Option<Cycling>,
    /// The tasks instantiated on every date in this cycle's sequence.
    pub tasks: Vec<TaskRef>,
}

/// A task template: the plugin and parameter dimensions shared by every
/// instantiation of a named task across cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskTemplate {
    /// The execution backend plugin identifier. Opaque to this crate;
    /// carried through to the output graph for the backend to interpret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// The dimension names this task is parameterized over (beyond
    /// `date`, which comes from its enclosing cycle).
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Opaque backend-specific fields, carried through unexamined.
    #[serde(default, flatten)]
    pub extra: IndexMap<String, Payload>,
}

impl TaskTemplate {
    /// Shallow-merge `root`'s scalar fields in as defaults: `self`'s own
    /// `plugin` wins if set, otherwise `root`'s is used; `extra` fields
    /// present in `root` but absent from `self` are copied in verbatim
    /// (top-level only — nested objects are not merged field-by-field).
    pub fn merged_with_root(&self, root: Option<&TaskTemplate>) -> TaskTemplate {
        let Some(root) = root else {
            return self.clone();
        };

        let mut merged = self.clone();
        if merged.plugin.is_none() {
            merged.plugin = root.plugin.clone();
        }
        for (key, value) in root.extra.iter() {
            merged.extra.entry(key.clone()).or_insert_with(|| value.clone());
        }
        merged
    }
}

/// A data template: the parameter dimensions shared by every instantiation
/// of a named data artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataTemplate {
    /// The template name.
    pub name: String,
    /// The dimension names (beyond `date`) this data item carries.
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Opaque backend-specific fields.
    #[serde(default, flatten)]
    pub extra: IndexMap<String, Payload>,
}

/// The top-level, already-validated intermediate representation this
/// crate's [crate::workflow::Workflow] consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ir {
    /// The workflow's overall start date.
    pub start_date: Date,
    /// The workflow's overall stop date.
    pub stop_date: Date,
    /// Cycles, in declaration order.
    pub cycles: Vec<Cycle>,
    /// Task templates keyed by name, including the `ROOT` defaults
    /// template if present.
    pub tasks: IndexMap<String, TaskTemplate>,
    /// Externally-supplied data templates.
    #[serde(default)]
    pub data_available: Vec<DataTemplate>,
    /// In-graph-produced data templates.
    #[serde(default)]
    pub data_generated: Vec<DataTemplate>,
    /// Named parameter dimensions and their value domains.
    #[serde(default)]
    pub parameters: IndexMap<String, Vec<ParamValue>>,
}

impl Ir {
    /// Look up a task template by name, shallow-merged with `ROOT`'s
    /// defaults if a `ROOT` template is declared.
    pub fn resolved_task_template(&self, name: &str) -> Option<TaskTemplate> {
        let template = self.tasks.get(name)?;
        Some(template.merged_with_root(self.tasks.get(ROOT_TASK)))
    }

    /// Look up a data template by name across both `data_available` and
    /// `data_generated`.
    pub fn data_template(&self, name: &str) -> Option<&DataTemplate> {
        self.data_available
            .iter()
            .chain(self.data_generated.iter())
            .find(|t| t.name == name)
    }

    /// Whether `name` is declared as a generated (in-graph-produced) data
    /// template.
    pub fn is_generated(&self, name: &str) -> bool {
        self.data_generated.iter().any(|t| t.name == name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn root_merge_is_shallow_and_child_wins() {
        let mut root = TaskTemplate::default();
        root.plugin = Some("default-plugin".to_string());
        root.extra.insert("queue".to_string(), Payload::String("slow".to_string()));

        let mut child = TaskTemplate::default();
        child.extra.insert("queue".to_string(), Payload::String("fast".to_string()));

        let merged = child.merged_with_root(Some(&root));
        assert_eq!(merged.plugin.as_deref(), Some("default-plugin"));
        assert_eq!(
            merged.extra.get("queue"),
            Some(&Payload::String("fast".to_string()))
        );
    }

    #[test]
    fn root_merge_no_root_is_identity() {
        let child = TaskTemplate {
            plugin: Some("p".to_string()),
            ..Default::default()
        };
        assert_eq!(child.merged_with_root(None), child);
    }

    #[test]
    fn output_ref_accepts_bare_name_or_object() {
        let bare: OutputRef = serde_json::from_str("\"icon_restart\"").unwrap();
        assert_eq!(bare.name(), "icon_restart");
        assert_eq!(bare.port(), None);

        let full: OutputRef =
            serde_json::from_str(r#"{"name":"icon_restart","port":"restart"}"#).unwrap();
        assert_eq!(full.name(), "icon_restart");
        assert_eq!(full.port(), Some("restart"));
    }

    #[test]
    fn lag_spec_list_expands() {
        let list = LagSpec::Many(vec![Duration::ZERO, Duration::from_months(2)]);
        assert_eq!(list.durations().len(), 2);
    }
}
