//! Recompute-on-change memoization for the joined view.

use std::sync::Arc;

use tracing::debug;

use crate::join::{compose_rows, ComposedRow};
use crate::model::{LocationData, WorkspaceData};

/// Signature of the join the gate runs.
pub type JoinFn = fn(Option<&LocationData>, Option<&WorkspaceData>) -> Vec<ComposedRow>;

/// Reruns the join only when one of its inputs is a different allocation.
///
/// Inputs are compared by pointer, not by value. The fetch layer hands out a
/// fresh `Arc` for every result it produces, so an unchanged pointer means an
/// unchanged result.
pub struct RecomputationGate<J = JoinFn> {
    location: Option<Arc<LocationData>>,
    workspaces: Option<Arc<WorkspaceData>>,
    rows: Arc<[ComposedRow]>,
    join: J,
}

impl RecomputationGate {
    /// A gate running [`compose_rows`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_join(compose_rows)
    }
}

impl Default for RecomputationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl<J> RecomputationGate<J>
where
    J: FnMut(Option<&LocationData>, Option<&WorkspaceData>) -> Vec<ComposedRow>,
{
    /// A gate running the given join. Starts with no inputs and no rows.
    pub fn with_join(join: J) -> Self {
        Self { location: None, workspaces: None, rows: Arc::from(Vec::new()), join }
    }

    /// Offers the latest inputs, recomputing when either one changed.
    ///
    /// Returns whether the join ran.
    pub fn update(
        &mut self,
        location: Option<&Arc<LocationData>>,
        workspaces: Option<&Arc<WorkspaceData>>,
    ) -> bool {
        if same(self.location.as_ref(), location) && same(self.workspaces.as_ref(), workspaces) {
            return false;
        }

        self.location = location.cloned();
        self.workspaces = workspaces.cloned();
        self.rows = Arc::from((self.join)(self.location.as_deref(), self.workspaces.as_deref()));
        debug!(rows = self.rows.len(), "recomputed workspace rows");
        true
    }

    /// Rows from the most recent computation.
    #[must_use]
    pub fn rows(&self) -> &Arc<[ComposedRow]> {
        &self.rows
    }
}

/// Combined loading flag of the two queries.
///
/// `workspace_loading` is `None` while the workspace query is skipped, in
/// which case only the location query counts.
#[must_use]
pub fn loading(location_loading: bool, workspace_loading: Option<bool>) -> bool {
    location_loading || workspace_loading.unwrap_or(false)
}

fn same<T>(cached: Option<&Arc<T>>, offered: Option<&Arc<T>>) -> bool {
    match (cached, offered) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
