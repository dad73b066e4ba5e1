//! Two-stage fetch pipeline feeding the joined view.
//!
//! The pipeline holds one handle per query. The location query is issued as
//! soon as options resolve; the workspace query is issued, reissued or
//! dropped every time the options or the location result change. Fetches run
//! as spawned tasks that report back over a channel, and completions are
//! applied one at a time by whoever drives [`WorkspacesPipeline::next_event`].
//!
//! ```text
//!  options ──► location query ──► visit ids ──► workspace query
//!                    │                                │
//!                    └──────────► gate ◄──────────────┘
//!                                  │
//!                                  ▼
//!                           WorkspacesView
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, warn};

use crate::error::FetchError;
use crate::gate::{self, RecomputationGate};
use crate::join::ComposedRow;
use crate::model::{LocationData, VisitId, WorkspaceData};
use crate::options::{WorkspacesConfig, WorkspacesOptions};
use crate::orchestrator;
use crate::ports::{FetchPolicy, Operation, QueryClient, QueryRequest};

/// What a caller sees of one query.
#[derive(Debug)]
pub struct QueryState<T> {
    /// A fetch for the current request is outstanding.
    pub loading: bool,
    /// Latest decoded result. Kept while a newer fetch is in flight or failed.
    pub data: Option<Arc<T>>,
    /// Failure from the latest completed fetch, if it failed.
    pub error: Option<FetchError>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self { loading: false, data: None, error: None }
    }
}

/// The joined view, as handed to presentation code.
#[derive(Debug, Clone)]
pub struct WorkspacesView {
    /// Key the view is exposed under.
    pub name: String,
    /// Either query is still outstanding.
    pub loading: bool,
    /// Joined rows.
    pub workspaces: Arc<[ComposedRow]>,
    /// Failures reported by the fetch layer, location first.
    pub errors: Vec<FetchError>,
}

impl WorkspacesView {
    /// Renders `{<name>: {loading, workspaces, errors}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if a row fails to serialize.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut body = Map::new();
        body.insert("loading".into(), Value::Bool(self.loading));
        body.insert("workspaces".into(), serde_json::to_value(&*self.workspaces)?);
        body.insert(
            "errors".into(),
            self.errors.iter().map(|e| Value::String(e.to_string())).collect(),
        );

        let mut root = Map::new();
        root.insert(self.name.clone(), Value::Object(body));
        Ok(Value::Object(root))
    }
}

/// A finished fetch, tagged with the generation it was issued under.
struct Completion {
    operation: Operation,
    generation: u64,
    result: Result<Value, FetchError>,
}

/// Spawns fetches against the client and numbers them.
struct Dispatcher {
    client: Arc<dyn QueryClient>,
    sender: UnboundedSender<Completion>,
    next_generation: u64,
}

impl Dispatcher {
    fn dispatch(&mut self, request: &QueryRequest) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        let request = request.clone();

        debug!(
            operation = %request.operation,
            generation,
            policy = %request.fetch_policy,
            variables = %request.variables,
            "issuing fetch"
        );
        tokio::spawn(async move {
            let result = client.query(&request).await;
            // The receiver is gone only when the pipeline was dropped.
            let _ = sender.send(Completion { operation: request.operation, generation, result });
        });
        generation
    }
}

struct QueryHandle<T> {
    request: QueryRequest,
    generation: u64,
    state: QueryState<T>,
}

impl<T: DeserializeOwned + Default> QueryHandle<T> {
    fn issue(dispatcher: &mut Dispatcher, request: QueryRequest) -> Self {
        let generation = dispatcher.dispatch(&request);
        Self { request, generation, state: QueryState { loading: true, ..QueryState::default() } }
    }

    fn reissue(&mut self, dispatcher: &mut Dispatcher, request: QueryRequest) {
        self.generation = dispatcher.dispatch(&request);
        self.request = request;
        self.state.loading = true;
    }

    fn refetch(&mut self, dispatcher: &mut Dispatcher) {
        let request =
            QueryRequest { fetch_policy: FetchPolicy::NetworkOnly, ..self.request.clone() };
        self.generation = dispatcher.dispatch(&request);
        self.state.loading = true;
    }

    /// Applies a completion. Returns false when it belongs to a superseded fetch.
    fn settle(&mut self, generation: u64, result: Result<Value, FetchError>) -> bool {
        let operation = self.request.operation;
        if generation != self.generation {
            debug!(%operation, generation, current = self.generation, "discarding stale result");
            return false;
        }

        self.state.loading = false;
        match result.and_then(|data| decode(operation, data)) {
            Ok(data) => {
                self.state.data = Some(Arc::new(data));
                self.state.error = None;
            }
            Err(err) => {
                warn!(%operation, %err, "fetch failed");
                self.state.error = Some(err);
            }
        }
        true
    }
}

/// A `null` payload is an empty result, not a malformed one.
fn decode<T: DeserializeOwned + Default>(
    operation: Operation,
    data: Value,
) -> Result<T, FetchError> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(|e| FetchError::Decode {
        operation: operation.to_string(),
        message: e.to_string(),
    })
}

struct Active {
    options: WorkspacesOptions,
    visit_override: Option<Vec<VisitId>>,
    location: QueryHandle<LocationData>,
    workspace: Option<QueryHandle<WorkspaceData>>,
    gate: RecomputationGate,
}

/// Fetches locations and workspaces and keeps the joined view current.
///
/// When the configuration cannot be used the pipeline passes through: it
/// issues nothing and [`view`](Self::view) returns `None`.
pub struct WorkspacesPipeline<C> {
    config: Option<WorkspacesConfig<C>>,
    context: C,
    dispatcher: Dispatcher,
    receiver: UnboundedReceiver<Completion>,
    active: Option<Active>,
}

impl<C> WorkspacesPipeline<C> {
    /// Creates the pipeline and issues the location query right away.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime while the options resolve,
    /// since the first fetch is spawned immediately.
    pub fn new(client: Arc<dyn QueryClient>, config: WorkspacesConfig<C>, context: C) -> Self {
        let mut pipeline = Self::inert(client, Some(config), context);
        pipeline.refresh();
        pipeline
    }

    /// Creates the pipeline from a loosely typed configuration argument.
    ///
    /// An argument of the wrong shape is logged and yields a pipeline that
    /// passes through for its whole life.
    ///
    /// # Panics
    ///
    /// See [`new`](Self::new).
    pub fn from_argument(
        client: Arc<dyn QueryClient>,
        argument: Option<&Value>,
        context: C,
    ) -> Self {
        match WorkspacesConfig::from_argument(argument) {
            Ok(config) => Self::new(client, config, context),
            Err(err) => {
                error!(%err, "invalid workspaces argument; passing through without fetching");
                Self::inert(client, None, context)
            }
        }
    }

    fn inert(
        client: Arc<dyn QueryClient>,
        config: Option<WorkspacesConfig<C>>,
        context: C,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            config,
            context,
            dispatcher: Dispatcher { client, sender, next_generation: 0 },
            receiver,
            active: None,
        }
    }

    /// Replaces the input context and re-evaluates both queries.
    ///
    /// Queries whose request did not change are left alone.
    pub fn set_context(&mut self, context: C) {
        self.context = context;
        self.refresh();
    }

    /// The current input context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Effective options, `None` while passing through.
    pub fn options(&self) -> Option<&WorkspacesOptions> {
        self.active.as_ref().map(|a| &a.options)
    }

    /// State of the location query, `None` while passing through.
    pub fn location(&self) -> Option<&QueryState<LocationData>> {
        self.active.as_ref().map(|a| &a.location.state)
    }

    /// State of the workspace query, `None` while it is skipped.
    pub fn workspace(&self) -> Option<&QueryState<WorkspaceData>> {
        self.active.as_ref()?.workspace.as_ref().map(|w| &w.state)
    }

    /// True while a fetch for a current request is outstanding.
    pub fn in_flight(&self) -> bool {
        self.view().is_some_and(|view| view.loading)
    }

    /// The joined view, `None` while passing through.
    pub fn view(&self) -> Option<WorkspacesView> {
        let active = self.active.as_ref()?;
        let workspace = active.workspace.as_ref().map(|w| &w.state);
        Some(WorkspacesView {
            name: active.options.name.clone(),
            loading: gate::loading(active.location.state.loading, workspace.map(|s| s.loading)),
            workspaces: Arc::clone(active.gate.rows()),
            errors: active
                .location
                .state
                .error
                .iter()
                .chain(workspace.and_then(|s| s.error.as_ref()))
                .cloned()
                .collect(),
        })
    }

    /// Reissues the location query and, when active, the workspace query,
    /// bypassing the cache. Returns once both are issued.
    pub fn refetch(&mut self) {
        let Some(active) = &mut self.active else {
            return;
        };
        active.location.refetch(&mut self.dispatcher);
        if let Some(workspace) = &mut active.workspace {
            workspace.refetch(&mut self.dispatcher);
        }
    }

    /// Waits for the next fetch to finish and applies it.
    ///
    /// Completions of superseded fetches are consumed and dropped. Never
    /// returns if nothing is outstanding.
    pub async fn next_event(&mut self) {
        if let Some(completion) = self.receiver.recv().await {
            self.apply(completion);
        }
    }

    /// Applies completions until no current fetch is outstanding.
    ///
    /// A fetch that never resolves keeps this pending, so callers that
    /// cannot wait forever should bound it with a timeout.
    pub async fn settle(&mut self) {
        while self.in_flight() {
            self.next_event().await;
        }
    }

    fn refresh(&mut self) {
        let Some(config) = &self.config else {
            return;
        };
        let resolved = config.resolve(&self.context).and_then(|options| {
            config.visit_id_override(&self.context).map(|ids| (options, ids))
        });
        let (options, visit_override) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                error!(%err, "invalid workspaces options; passing through without fetching");
                self.active = None;
                return;
            }
        };

        let location_request = orchestrator::location_request(&options, &config.location_query);
        match &mut self.active {
            Some(active) => {
                active.options = options;
                active.visit_override = visit_override;
                if active.location.request != location_request {
                    active.location.reissue(&mut self.dispatcher, location_request);
                }
            }
            None => {
                let location = QueryHandle::issue(&mut self.dispatcher, location_request);
                self.active = Some(Active {
                    options,
                    visit_override,
                    location,
                    workspace: None,
                    gate: RecomputationGate::new(),
                });
            }
        }

        self.sync_workspace();
        self.recompute();
    }

    fn sync_workspace(&mut self) {
        let (Some(config), Some(active)) = (&self.config, &mut self.active) else {
            return;
        };
        let facilities =
            active.location.state.data.as_deref().and_then(|d| d.facilities.as_deref());
        let request = orchestrator::workspace_request(
            &active.options,
            active.visit_override.as_deref(),
            facilities,
            &config.workspace_query,
        );

        match request {
            None => {
                if active.workspace.take().is_some() {
                    debug!("workspace query skipped");
                }
            }
            Some(request) => {
                if let Some(workspace) = active.workspace.as_mut() {
                    if workspace.request != request {
                        workspace.reissue(&mut self.dispatcher, request);
                    }
                } else {
                    active.workspace = Some(QueryHandle::issue(&mut self.dispatcher, request));
                }
            }
        }
    }

    fn apply(&mut self, completion: Completion) {
        let Completion { operation, generation, result } = completion;
        let Some(active) = &mut self.active else {
            debug!(%operation, generation, "discarding result while passing through");
            return;
        };

        let applied = match operation {
            Operation::Locations => active.location.settle(generation, result),
            Operation::Workspaces => match &mut active.workspace {
                Some(workspace) => workspace.settle(generation, result),
                None => {
                    debug!(generation, "discarding result of a skipped workspace query");
                    false
                }
            },
        };

        if applied && operation == Operation::Locations {
            self.sync_workspace();
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        if let Some(active) = &mut self.active {
            let workspaces = active.workspace.as_ref().and_then(|w| w.state.data.as_ref());
            active.gate.update(active.location.state.data.as_ref(), workspaces);
        }
    }
}
