//! Request construction and skip decisions for the two dependent queries.
//!
//! The location query always runs. The workspace query depends on it: its
//! variables are the visit ids found in the current location tree unless the
//! caller named specific visits.

use std::sync::Arc;

use serde_json::json;

use crate::extract::visit_ids_from_facilities;
use crate::model::{Facility, VisitId};
use crate::options::WorkspacesOptions;
use crate::ports::{Operation, QueryRequest};

/// Builds the location tree request.
#[must_use]
pub fn location_request(options: &WorkspacesOptions, document: &str) -> QueryRequest {
    QueryRequest {
        operation: Operation::Locations,
        document: document.to_string(),
        variables: json!({ "assignedBedsOnly": options.assigned_only }),
        fetch_policy: options.location_fetch_policy,
    }
}

/// Whether the workspace query should be skipped.
///
/// An explicit empty override means the caller wants nothing. Without an
/// override, there is nothing to ask for until the tree yields visit ids.
#[must_use]
pub fn skip_workspaces(override_ids: Option<&[VisitId]>, extracted: &[VisitId]) -> bool {
    match override_ids {
        Some(ids) => ids.is_empty(),
        None => extracted.is_empty(),
    }
}

/// Builds the workspace request, or `None` when it should be skipped.
#[must_use]
pub fn workspace_request(
    options: &WorkspacesOptions,
    override_ids: Option<&[VisitId]>,
    facilities: Option<&[Arc<Facility>]>,
    document: &str,
) -> Option<QueryRequest> {
    let extracted =
        visit_ids_from_facilities(facilities, options.conflicting_only, options.add_conflicting);
    if skip_workspaces(override_ids, &extracted) {
        return None;
    }

    let visit_ids = match override_ids {
        Some(ids) if !ids.is_empty() => ids.to_vec(),
        _ => extracted,
    };

    Some(QueryRequest {
        operation: Operation::Workspaces,
        document: document.to_string(),
        variables: json!({ "visitIds": visit_ids }),
        fetch_policy: options.workspace_fetch_policy,
    })
}
