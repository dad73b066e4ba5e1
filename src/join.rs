//! Joins the location tree with workspace records.
//!
//! The location tree drives the output: every bed yields at least one row,
//! and workspaces that match no bed in the tree do not appear at all.

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::model::{Bed, Department, Facility, LocationData, Visit, Workspace, WorkspaceData};

/// One row of the joined view: a bed with its place in the tree and at most
/// one workspace.
///
/// The facility, department and bed are shared with the location result, so
/// `Arc::ptr_eq` tells a consumer whether they changed between two views.
#[derive(Debug, Clone)]
pub struct ComposedRow {
    /// Facility that owns the department.
    pub facility: Arc<Facility>,
    /// Department that owns the bed.
    pub department: Arc<Department>,
    /// The bed itself.
    pub bed: Arc<Bed>,
    /// Matched workspace, `None` for a bed without one.
    pub workspace: Option<Arc<Workspace>>,
}

impl ComposedRow {
    /// Visit of the matched workspace.
    #[must_use]
    pub fn visit(&self) -> Option<&Visit> {
        self.workspace.as_deref().and_then(|w| w.visit.as_ref())
    }

    /// Plan of the matched workspace.
    #[must_use]
    pub fn plan(&self) -> Option<&Value> {
        self.workspace.as_deref().and_then(Workspace::plan)
    }

    /// True when no workspace matched this bed.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.workspace.is_none()
    }
}

// Workspace fields are spread first so the tree position always wins.
impl Serialize for ComposedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut fields = match self.workspace.as_deref() {
            Some(workspace) => match serde_json::to_value(workspace).map_err(S::Error::custom)? {
                Value::Object(fields) => fields,
                _ => Map::new(),
            },
            None => Map::new(),
        };
        fields.insert(
            "facility".into(),
            serde_json::to_value(&*self.facility).map_err(S::Error::custom)?,
        );
        fields.insert(
            "department".into(),
            serde_json::to_value(&*self.department).map_err(S::Error::custom)?,
        );
        fields.insert("bed".into(), serde_json::to_value(&*self.bed).map_err(S::Error::custom)?);
        fields.serialize(serializer)
    }
}

/// Groups workspaces under every bed exchange name they participate in.
///
/// Each bed maps to an insertion-ordered set: the same workspace is listed
/// at most once per bed, however many of its signals point there.
#[must_use]
pub fn index_by_bed(workspaces: &[Arc<Workspace>]) -> HashMap<&str, Vec<Arc<Workspace>>> {
    let mut index: HashMap<&str, Vec<Arc<Workspace>>> = HashMap::new();
    for workspace in workspaces {
        for name in workspace.exchange_names() {
            let entry = index.entry(name).or_default();
            if !entry.iter().any(|existing| Arc::ptr_eq(existing, workspace)) {
                entry.push(Arc::clone(workspace));
            }
        }
    }
    index
}

/// Builds the joined rows, walking facilities, departments and beds in order.
///
/// Absent inputs are treated as empty.
#[must_use]
pub fn compose_rows(
    location: Option<&LocationData>,
    workspaces: Option<&WorkspaceData>,
) -> Vec<ComposedRow> {
    let facilities = location.map(LocationData::facilities).unwrap_or_default();
    let index = index_by_bed(workspaces.map(WorkspaceData::workspaces).unwrap_or_default());

    let mut rows = Vec::new();
    for facility in facilities {
        for department in facility.departments() {
            for bed in department.beds() {
                let row = |workspace: Option<Arc<Workspace>>| ComposedRow {
                    facility: Arc::clone(facility),
                    department: Arc::clone(department),
                    bed: Arc::clone(bed),
                    workspace,
                };
                match bed.exchange_name.as_deref().and_then(|name| index.get(name)) {
                    Some(matched) => rows.extend(matched.iter().cloned().map(Some).map(row)),
                    None => rows.push(row(None)),
                }
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location(value: Value) -> LocationData {
        serde_json::from_value(value).unwrap()
    }

    fn workspaces(value: Value) -> WorkspaceData {
        serde_json::from_value(value).unwrap()
    }

    fn two_bed_tree() -> LocationData {
        location(json!({
            "facilities": [{
                "exchangeName": "F1",
                "departments": [{
                    "exchangeName": "D1",
                    "beds": [
                        {"exchangeName": "B1", "visitId": 1},
                        {"exchangeName": "B2"}
                    ]
                }]
            }]
        }))
    }

    #[test]
    fn one_workspace_on_one_of_two_beds() {
        let tree = two_bed_tree();
        let data = workspaces(json!({
            "workspaces": [{"id": "W1", "bed": [{"exchangeName": "B1"}], "visit": {"id": 1}}]
        }));

        let rows = compose_rows(Some(&tree), Some(&data));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bed.exchange_name.as_deref(), Some("B1"));
        assert_eq!(rows[0].workspace.as_ref().unwrap().get("id"), Some(&json!("W1")));
        assert_eq!(rows[0].visit().and_then(|v| v.id), Some(1));
        assert_eq!(rows[1].bed.exchange_name.as_deref(), Some("B2"));
        assert!(rows[1].is_placeholder());
    }

    #[test]
    fn without_workspaces_every_bed_gets_one_placeholder() {
        let tree = location(json!({
            "facilities": [
                {"exchangeName": "F1", "departments": [
                    {"exchangeName": "D1", "beds": [{"exchangeName": "B1"}, {"exchangeName": "B2"}]},
                    {"exchangeName": "D2", "beds": [{"exchangeName": "B3"}]}
                ]},
                {"exchangeName": "F2", "departments": [
                    {"exchangeName": "D3", "beds": [{"exchangeName": "B4"}]}
                ]}
            ]
        }));

        let unmatched = workspaces(json!({"workspaces": [{"bed": [{"exchangeName": "ZZ"}]}]}));
        for data in [None, Some(&unmatched)] {
            let rows = compose_rows(Some(&tree), data);
            let beds: Vec<&str> =
                rows.iter().filter_map(|r| r.bed.exchange_name.as_deref()).collect();
            assert_eq!(beds, vec!["B1", "B2", "B3", "B4"]);
            assert!(rows.iter().all(ComposedRow::is_placeholder));
        }
    }

    #[test]
    fn workspace_on_several_beds_appears_once_under_each() {
        let tree = two_bed_tree();
        let data = workspaces(json!({
            "workspaces": [{
                "id": "W1",
                "bed": [{"exchangeName": "B1"}, {"exchangeName": "B2"}, {"exchangeName": "B9"}],
                "visit": {"homeBedExchangeName": "B1", "bedConflict": {"exchangeName": "B2"}}
            }]
        }));

        let rows = compose_rows(Some(&tree), Some(&data));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.is_placeholder()));
        assert!(Arc::ptr_eq(
            rows[0].workspace.as_ref().unwrap(),
            rows[1].workspace.as_ref().unwrap()
        ));
    }

    #[test]
    fn several_workspaces_on_one_bed_each_get_a_row() {
        let tree = two_bed_tree();
        let data = workspaces(json!({
            "workspaces": [
                {"id": "W1", "bed": [{"exchangeName": "B2"}]},
                {"id": "W2", "bed": [], "visit": {"homeBedExchangeName": "B2"}}
            ]
        }));

        let rows = compose_rows(Some(&tree), Some(&data));
        let ids: Vec<Option<&Value>> =
            rows.iter().map(|r| r.workspace.as_ref().and_then(|w| w.get("id"))).collect();
        assert_eq!(ids, vec![None, Some(&json!("W1")), Some(&json!("W2"))]);
    }

    #[test]
    fn repeated_workspace_reference_is_indexed_once() {
        let data = workspaces(json!({"workspaces": [{"bed": [{"exchangeName": "B1"}]}]}));
        let workspace = &data.workspaces()[0];
        let repeated = [Arc::clone(workspace), Arc::clone(workspace)];
        let index = index_by_bed(&repeated);
        assert_eq!(index["B1"].len(), 1);
    }

    #[test]
    fn rows_share_tree_nodes_with_the_location_result() {
        let tree = two_bed_tree();
        let rows = compose_rows(Some(&tree), None);
        let facility = &tree.facilities()[0];
        assert!(Arc::ptr_eq(&rows[0].facility, facility));
        assert!(Arc::ptr_eq(&rows[1].department, &facility.departments()[0]));
        assert!(Arc::ptr_eq(&rows[1].bed, &facility.departments()[0].beds()[1]));
    }

    #[test]
    fn absent_location_yields_no_rows() {
        let data = workspaces(json!({"workspaces": [{"bed": [{"exchangeName": "B1"}]}]}));
        assert!(compose_rows(None, Some(&data)).is_empty());
        assert!(compose_rows(Some(&LocationData::default()), None).is_empty());
    }

    #[test]
    fn serialized_row_spreads_workspace_under_tree_fields() {
        let tree = two_bed_tree();
        let data = workspaces(json!({
            "workspaces": [{"id": "W1", "bed": [{"exchangeName": "B1"}], "plan": {"id": "P1"}}]
        }));
        let rows = compose_rows(Some(&tree), Some(&data));

        let matched = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(matched["id"], json!("W1"));
        assert_eq!(matched["plan"], json!({"id": "P1"}));
        assert_eq!(matched["bed"]["exchangeName"], json!("B1"));
        assert_eq!(matched["facility"]["exchangeName"], json!("F1"));

        let placeholder = serde_json::to_value(&rows[1]).unwrap();
        let keys: Vec<&String> = placeholder.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["bed", "department", "facility"]);
    }

    #[test]
    fn rows_carry_records_exactly_as_fetched() {
        let bed = json!({"exchangeName": "B1", "visitId": null});
        let tree = location(json!({
            "facilities": [{"departments": [{"exchangeName": "D1", "beds": [bed]}]}]
        }));
        let data = workspaces(json!({
            "workspaces": [{
                "id": "W1",
                "bed": [{"exchangeName": "B1"}],
                "plan": null,
                "visit": null
            }]
        }));
        let rows = compose_rows(Some(&tree), Some(&data));
        assert!(rows[0].plan().is_none());

        let row = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(
            row,
            json!({
                "id": "W1",
                "plan": null,
                "visit": null,
                "facility": {
                    "departments": [{
                        "exchangeName": "D1",
                        "beds": [{"exchangeName": "B1", "visitId": null}]
                    }]
                },
                "department": {
                    "exchangeName": "D1",
                    "beds": [{"exchangeName": "B1", "visitId": null}]
                },
                "bed": {"exchangeName": "B1", "visitId": null}
            })
        );
    }
}
