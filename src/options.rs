//! Options resolution for a workspaces pipeline.
//!
//! Options come from an ordered list of sources layered over a fixed
//! baseline. A source is either a static JSON object or a function of the
//! caller's input context. Merging is shallow: a later source replaces a key
//! wholesale, and keys nobody recognizes are carried along in
//! [`WorkspacesOptions::extra`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{json_kind, ConfigError};
use crate::model::{null_as_default, VisitId};
use crate::ports::FetchPolicy;
use crate::queries;

/// Default key the view is exposed under.
pub const DEFAULT_NAME: &str = "data";

/// Effective options after merging every source over the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspacesOptions {
    /// Key the composed view is exposed under.
    pub name: String,
    /// Only fetch beds assigned to the current user.
    pub assigned_only: bool,
    /// Request only conflicting visits instead of active and discharged ones.
    pub conflicting_only: bool,
    /// Request conflicting visits in addition to active and discharged ones.
    pub add_conflicting: bool,
    /// Cache behavior for the location tree.
    pub location_fetch_policy: FetchPolicy,
    /// Cache behavior for the workspace query.
    pub workspace_fetch_policy: FetchPolicy,
    /// Specific visits to request instead of the ones found in the tree.
    #[serde(deserialize_with = "null_as_default")]
    pub visit_ids: Vec<VisitId>,
    /// Keys that are not options of this pipeline.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for WorkspacesOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            assigned_only: false,
            conflicting_only: false,
            add_conflicting: false,
            location_fetch_policy: FetchPolicy::CacheFirst,
            workspace_fetch_policy: FetchPolicy::CacheAndNetwork,
            visit_ids: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// The baseline every resolution starts from, as a JSON object.
#[must_use]
pub fn baseline() -> Map<String, Value> {
    let defaults = WorkspacesOptions::default();
    let mut map = Map::new();
    map.insert("name".into(), Value::String(defaults.name));
    map.insert("assignedOnly".into(), Value::Bool(defaults.assigned_only));
    map.insert("conflictingOnly".into(), Value::Bool(defaults.conflicting_only));
    map.insert("addConflicting".into(), Value::Bool(defaults.add_conflicting));
    map.insert(
        "locationFetchPolicy".into(),
        Value::String(defaults.location_fetch_policy.as_str().into()),
    );
    map.insert(
        "workspaceFetchPolicy".into(),
        Value::String(defaults.workspace_fetch_policy.as_str().into()),
    );
    map.insert("visitIds".into(), Value::Array(Vec::new()));
    map
}

/// A single layer of options.
pub enum OptionSource<C> {
    /// Fixed options.
    Static(Value),
    /// Options computed from the input context each time they are resolved.
    Derived(Arc<dyn Fn(&C) -> Value + Send + Sync>),
}

impl<C> OptionSource<C> {
    /// Wraps a function of the input context.
    pub fn derived(f: impl Fn(&C) -> Value + Send + Sync + 'static) -> Self {
        Self::Derived(Arc::new(f))
    }

    /// Produces this layer's options for the given context.
    pub fn evaluate(&self, context: &C) -> Value {
        match self {
            Self::Static(value) => value.clone(),
            Self::Derived(f) => f(context),
        }
    }
}

impl<C> Clone for OptionSource<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(value) => Self::Static(value.clone()),
            Self::Derived(f) => Self::Derived(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for OptionSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Shallow-merges the sources in order, without the baseline.
///
/// Sources that do not evaluate to an object are skipped.
pub fn merge_sources<C>(context: &C, sources: &[OptionSource<C>]) -> Map<String, Value> {
    sources.iter().fold(Map::new(), |mut merged, source| {
        match source.evaluate(context) {
            Value::Object(fields) => merged.extend(fields),
            other => debug!(kind = json_kind(&other), "skipping option source that is not an object"),
        }
        merged
    })
}

/// Resolves the effective options: baseline first, then every source.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOptions`] when a known option has a value of
/// the wrong type (for example an unknown fetch policy).
pub fn resolve<C>(context: &C, sources: &[OptionSource<C>]) -> Result<WorkspacesOptions, ConfigError> {
    let mut merged = baseline();
    merged.extend(merge_sources(context, sources));
    serde_json::from_value(Value::Object(merged)).map_err(ConfigError::InvalidOptions)
}

/// The caller's explicit `visitIds`, looked up without the baseline.
///
/// `Some(vec![])` means the caller asked for nothing, which is different
/// from not asking at all (`None`). An explicit `null` counts as not asking.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOptions`] when `visitIds` is not a list of
/// integers.
pub fn visit_id_override<C>(
    context: &C,
    sources: &[OptionSource<C>],
) -> Result<Option<Vec<VisitId>>, ConfigError> {
    match merge_sources(context, sources).remove("visitIds") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(ConfigError::InvalidOptions),
    }
}

/// Everything needed to set up a pipeline: the two query documents and the
/// caller's option sources.
#[derive(Debug, Clone)]
pub struct WorkspacesConfig<C> {
    /// Location tree query document.
    pub location_query: String,
    /// Workspace query document.
    pub workspace_query: String,
    /// Caller option sources, applied over the baseline in order.
    pub sources: Vec<OptionSource<C>>,
}

impl<C> Default for WorkspacesConfig<C> {
    fn default() -> Self {
        Self {
            location_query: queries::FACILITY_BEDS.to_string(),
            workspace_query: queries::FULL_WORKSPACE_PLAN_VISIT_BY_VISIT_IDS.to_string(),
            sources: Vec::new(),
        }
    }
}

impl<C> WorkspacesConfig<C> {
    /// Adds an option source after the existing ones.
    #[must_use]
    pub fn with_options(mut self, source: OptionSource<C>) -> Self {
        self.sources.push(source);
        self
    }

    /// Builds a config from a loosely typed argument, such as a parsed file.
    ///
    /// Accepts nothing, `null`, or an object whose `options` entry is set
    /// (not `null`, `false`, `0` or `""`), with optional `locationQuery` /
    /// `workspaceQuery` documents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShape`] for any other shape and
    /// [`ConfigError::InvalidQuery`] when a document override is not a string.
    pub fn from_argument(argument: Option<&Value>) -> Result<Self, ConfigError> {
        let fields = match argument {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(fields)) if fields.get("options").is_some_and(is_set) => fields,
            Some(other) => return Err(ConfigError::InvalidShape { kind: json_kind(other) }),
        };

        let mut config = Self::default();
        if let Some(document) = query_override(fields, "locationQuery")? {
            config.location_query = document;
        }
        if let Some(document) = query_override(fields, "workspaceQuery")? {
            config.workspace_query = document;
        }
        config.sources.push(OptionSource::Static(fields["options"].clone()));
        Ok(config)
    }

    /// Effective options for the given context.
    ///
    /// # Errors
    ///
    /// See [`resolve`].
    pub fn resolve(&self, context: &C) -> Result<WorkspacesOptions, ConfigError> {
        resolve(context, &self.sources)
    }

    /// The caller's explicit visit ids for the given context.
    ///
    /// # Errors
    ///
    /// See [`visit_id_override`].
    pub fn visit_id_override(&self, context: &C) -> Result<Option<Vec<VisitId>>, ConfigError> {
        visit_id_override(context, &self.sources)
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn query_override(
    fields: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(document)) => Ok(Some(document.clone())),
        Some(_) => Err(ConfigError::InvalidQuery { key }),
    }
}
