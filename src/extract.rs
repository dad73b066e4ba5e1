//! Visit id extraction from the location tree.

use std::collections::HashSet;
use std::sync::Arc;

use crate::model::{Bed, Facility, VisitId};

/// Collects the visit ids referenced by every bed in the tree, without repeats.
///
/// With `conflicting_only`, each bed contributes exactly its conflicting
/// visits. Otherwise a bed contributes its current visit and its discharged
/// visit, plus its conflicting visits when `add_conflicting` is set.
///
/// Ids come back in first-seen order. An absent tree yields nothing.
#[must_use]
pub fn visit_ids_from_facilities(
    facilities: Option<&[Arc<Facility>]>,
    conflicting_only: bool,
    add_conflicting: bool,
) -> Vec<VisitId> {
    let Some(facilities) = facilities else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    facilities
        .iter()
        .flat_map(|facility| facility.departments())
        .flat_map(|department| department.beds())
        .flat_map(|bed| bed_visit_ids(bed, conflicting_only, add_conflicting))
        .filter(|id| seen.insert(*id))
        .collect()
}

fn bed_visit_ids(bed: &Bed, conflicting_only: bool, add_conflicting: bool) -> Vec<VisitId> {
    if conflicting_only {
        return bed.conflicting_visit_ids.clone();
    }

    let has_conflicts = !bed.conflicting_visit_ids.is_empty();
    if bed.visit_id.is_none() && bed.discharged_visit_id.is_none() && !has_conflicts {
        return Vec::new();
    }

    let mut ids: Vec<VisitId> = bed.visit_id.into_iter().chain(bed.discharged_visit_id).collect();
    if add_conflicting && has_conflicts {
        ids.extend_from_slice(&bed.conflicting_visit_ids);
    }
    ids
}
