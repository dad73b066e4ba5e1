//! Default query documents.
//!
//! Either can be replaced through the configuration argument as long as the
//! replacement accepts the same variables.

/// Location tree query. Takes `assignedBedsOnly: Boolean`.
pub const FACILITY_BEDS: &str = r"query FacilityBeds($assignedBedsOnly: Boolean) {
  facilities {
    id
    exchangeName
    name
    departments {
      id
      exchangeName
      name
      beds(assignedOnly: $assignedBedsOnly) {
        id
        exchangeName
        name
        visitId
        dischargedVisitId
        conflictingVisitIds
      }
    }
  }
}";

/// Workspace query. Takes `visitIds: [Long]`.
pub const FULL_WORKSPACE_PLAN_VISIT_BY_VISIT_IDS: &str = r"query FullWorkspacePlanVisitByVisitIds($visitIds: [Long]) {
  workspaces(visitIds: $visitIds) {
    id
    bed {
      exchangeName
    }
    plan {
      id
      items {
        id
        label
        status
      }
    }
    visit {
      id
      patientName
      admitDate
      homeBedExchangeName
      bedConflict {
        exchangeName
      }
    }
  }
}";

/// Operation name declared by a document (`query <Name>`), if any.
#[must_use]
pub fn operation_name(document: &str) -> Option<&str> {
    let rest = document.trim_start().strip_prefix("query")?;
    let name: &str = rest
        .trim_start()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()?;
    (!name.is_empty()).then_some(name)
}
