//! Payload types for the location tree and workspace queries.
//!
//! Facilities, departments, beds and workspaces keep the object they were
//! decoded from and serialize back to exactly that object, so composed rows
//! carry what the query returned: explicit `null`s stay, and nothing is
//! added. The typed fields are read-only views used by the join. Nested
//! collections are held behind [`Arc`] so composed rows share them with the
//! query result instead of copying.

use std::collections::HashSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Visit identifier as sent in the `visitIds` variable (GraphQL `Long`).
pub type VisitId = i64;

/// A facility in the location tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Facility {
    /// Stable external identifier.
    pub exchange_name: Option<String>,
    /// Departments in display order, `None` unless the payload listed them.
    pub departments: Option<Vec<Arc<Department>>>,
    fields: Map<String, Value>,
}

impl Facility {
    /// Departments, or an empty slice when none were listed.
    #[must_use]
    pub fn departments(&self) -> &[Arc<Department>] {
        self.departments.as_deref().unwrap_or_default()
    }

    /// A field as fetched.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// A department within a facility.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Department {
    /// Stable external identifier.
    pub exchange_name: Option<String>,
    /// Beds in display order, `None` unless the payload listed them.
    pub beds: Option<Vec<Arc<Bed>>>,
    fields: Map<String, Value>,
}

impl Department {
    /// Beds, or an empty slice when none were listed.
    #[must_use]
    pub fn beds(&self) -> &[Arc<Bed>] {
        self.beds.as_deref().unwrap_or_default()
    }

    /// A field as fetched.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// A bed and the visits currently attached to it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Bed {
    /// Stable external identifier, the join key against workspaces.
    pub exchange_name: Option<String>,
    /// Visit currently occupying the bed.
    pub visit_id: Option<VisitId>,
    /// Most recent discharged visit for the bed.
    pub discharged_visit_id: Option<VisitId>,
    /// Visits that conflict over this bed.
    pub conflicting_visit_ids: Vec<VisitId>,
    fields: Map<String, Value>,
}

impl Bed {
    /// A field as fetched.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Bed conflict attached to a visit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedConflict {
    /// Exchange name of the bed in conflict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_name: Option<String>,
    /// Any other selected fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Visit carried by a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    /// Visit identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VisitId>,
    /// Bed the visit belonged to before discharge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_bed_exchange_name: Option<String>,
    /// Conflict details when the visit is contested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bed_conflict: Option<BedConflict>,
    /// Any other selected fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bed reference inside a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedRef {
    /// Exchange name of the referenced bed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_name: Option<String>,
    /// Any other selected fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A workspace record from the workspace query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Workspace {
    /// Beds this workspace is assigned to.
    pub bed: Vec<BedRef>,
    /// Visit the workspace tracks.
    pub visit: Option<Visit>,
    fields: Map<String, Value>,
}

impl Workspace {
    /// Plan attached to the workspace, if one was returned.
    #[must_use]
    pub fn plan(&self) -> Option<&Value> {
        self.fields.get("plan").filter(|plan| !plan.is_null())
    }

    /// A field as fetched.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Bed exchange names this workspace participates in, without repeats.
    ///
    /// Covers the assigned beds, the visit's home bed (discharged visits may
    /// not hold a bed any more) and the bed named by a visit's conflict.
    #[must_use]
    pub fn exchange_names(&self) -> Vec<&str> {
        let assigned = self.bed.iter().filter_map(|bed| bed.exchange_name.as_deref());
        let home = self.visit.as_ref().and_then(|v| v.home_bed_exchange_name.as_deref());
        let conflict = self
            .visit
            .as_ref()
            .and_then(|v| v.bed_conflict.as_ref())
            .and_then(|c| c.exchange_name.as_deref());

        let mut seen = HashSet::new();
        assigned.chain(home).chain(conflict).filter(|name| seen.insert(*name)).collect()
    }
}

/// Decoded payload of the location query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    /// Facility tree, absent until the server returns it.
    #[serde(default)]
    pub facilities: Option<Vec<Arc<Facility>>>,
}

impl LocationData {
    /// Facilities, or an empty slice when absent.
    #[must_use]
    pub fn facilities(&self) -> &[Arc<Facility>] {
        self.facilities.as_deref().unwrap_or_default()
    }
}

/// Decoded payload of the workspace query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceData {
    /// Workspace records, absent until the server returns them.
    #[serde(default)]
    pub workspaces: Option<Vec<Arc<Workspace>>>,
}

impl WorkspaceData {
    /// Workspaces, or an empty slice when absent.
    #[must_use]
    pub fn workspaces(&self) -> &[Arc<Workspace>] {
        self.workspaces.as_deref().unwrap_or_default()
    }
}

/// Fields the join reads from a facility or department.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeFields {
    #[serde(default)]
    exchange_name: Option<String>,
}

/// Fields the join reads from a bed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BedFields {
    #[serde(default)]
    exchange_name: Option<String>,
    #[serde(default)]
    visit_id: Option<VisitId>,
    #[serde(default)]
    discharged_visit_id: Option<VisitId>,
    #[serde(default, deserialize_with = "null_as_default")]
    conflicting_visit_ids: Vec<VisitId>,
}

/// Fields the join reads from a workspace.
#[derive(Deserialize)]
struct WorkspaceFields {
    #[serde(default, deserialize_with = "null_as_default")]
    bed: Vec<BedRef>,
    #[serde(default)]
    visit: Option<Visit>,
}

/// Decodes `T` from the named entries of `fields`, leaving the rest untouched.
fn typed<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    keys: &[&str],
) -> Result<T, serde_json::Error> {
    let selected = keys
        .iter()
        .filter_map(|key| fields.get(*key).map(|value| ((*key).to_string(), value.clone())))
        .collect();
    serde_json::from_value(Value::Object(selected))
}

/// Takes a listed child collection out of `fields`. Anything other than a
/// list (absent, `null`) is left where it is.
fn take_children<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<Arc<T>>>, serde_json::Error> {
    if !fields.get(key).is_some_and(Value::is_array) {
        return Ok(None);
    }
    fields.remove(key).map(serde_json::from_value).transpose()
}

fn serialize_record<S, T>(
    serializer: S,
    fields: &Map<String, Value>,
    children: Option<(&str, &[Arc<T>])>,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let mut map = serializer.serialize_map(None)?;
    for (key, value) in fields {
        map.serialize_entry(key, value)?;
    }
    if let Some((key, children)) = children {
        map.serialize_entry(key, children)?;
    }
    map.end()
}

impl TryFrom<Map<String, Value>> for Facility {
    type Error = serde_json::Error;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let departments = take_children(&mut fields, "departments")?;
        let NodeFields { exchange_name } = typed(&fields, &["exchangeName"])?;
        Ok(Self { exchange_name, departments, fields })
    }
}

impl Serialize for Facility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let departments = self.departments.as_deref().map(|d| ("departments", d));
        serialize_record(serializer, &self.fields, departments)
    }
}

impl TryFrom<Map<String, Value>> for Department {
    type Error = serde_json::Error;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let beds = take_children(&mut fields, "beds")?;
        let NodeFields { exchange_name } = typed(&fields, &["exchangeName"])?;
        Ok(Self { exchange_name, beds, fields })
    }
}

impl Serialize for Department {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_record(serializer, &self.fields, self.beds.as_deref().map(|b| ("beds", b)))
    }
}

impl TryFrom<Map<String, Value>> for Bed {
    type Error = serde_json::Error;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let keys = ["exchangeName", "visitId", "dischargedVisitId", "conflictingVisitIds"];
        let BedFields { exchange_name, visit_id, discharged_visit_id, conflicting_visit_ids } =
            typed(&fields, &keys)?;
        Ok(Self { exchange_name, visit_id, discharged_visit_id, conflicting_visit_ids, fields })
    }
}

impl Serialize for Bed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_record::<S, Value>(serializer, &self.fields, None)
    }
}

impl TryFrom<Map<String, Value>> for Workspace {
    type Error = serde_json::Error;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let WorkspaceFields { bed, visit } = typed(&fields, &["bed", "visit"])?;
        Ok(Self { bed, visit, fields })
    }
}

impl Serialize for Workspace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_record::<S, Value>(serializer, &self.fields, None)
    }
}

/// Treats an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_location_tree_with_unknown_fields() {
        let data: LocationData = serde_json::from_value(json!({
            "facilities": [{
                "exchangeName": "F1",
                "name": "General",
                "departments": [{
                    "exchangeName": "D1",
                    "beds": [
                        {"exchangeName": "B1", "visitId": 4, "conflictingVisitIds": null},
                        {"exchangeName": "B2", "__typename": "Bed"}
                    ]
                }]
            }]
        }))
        .unwrap();

        let facility = &data.facilities()[0];
        assert_eq!(facility.get("name"), Some(&json!("General")));
        let beds = facility.departments()[0].beds();
        assert_eq!(beds[0].exchange_name.as_deref(), Some("B1"));
        assert_eq!(beds[0].visit_id, Some(4));
        assert!(beds[0].conflicting_visit_ids.is_empty());
        assert_eq!(beds[1].get("__typename"), Some(&json!("Bed")));
    }

    #[test]
    fn records_serialize_back_to_what_was_fetched() {
        let fetched = json!({
            "name": "General",
            "departments": [{
                "exchangeName": "D1",
                "beds": [
                    {"exchangeName": "B1", "visitId": null},
                    {"exchangeName": "B2", "conflictingVisitIds": null, "dischargedVisitId": 3}
                ]
            }, {
                "exchangeName": null,
                "beds": null
            }, {
                "beds": []
            }]
        });
        let facility: Facility = serde_json::from_value(fetched.clone()).unwrap();
        assert!(facility.exchange_name.is_none());
        assert!(facility.departments()[1].beds.is_none());
        assert_eq!(serde_json::to_value(&facility).unwrap(), fetched);

        let workspace = json!({
            "id": "W1", "bed": [{"exchangeName": "B1"}], "plan": null, "visit": null
        });
        let decoded: Workspace = serde_json::from_value(workspace.clone()).unwrap();
        assert!(decoded.plan().is_none());
        assert!(decoded.visit.is_none());
        assert_eq!(serde_json::to_value(&decoded).unwrap(), workspace);
    }

    #[test]
    fn mistyped_join_field_is_rejected() {
        let bed = serde_json::from_value::<Bed>(json!({"exchangeName": "B1", "visitId": "x"}));
        assert!(bed.is_err());
    }

    #[test]
    fn missing_collections_read_as_empty() {
        let location: LocationData = serde_json::from_value(json!({"facilities": null})).unwrap();
        assert!(location.facilities.is_none());
        assert!(location.facilities().is_empty());

        let workspaces: WorkspaceData = serde_json::from_value(json!({})).unwrap();
        assert!(workspaces.workspaces().is_empty());
    }

    #[test]
    fn exchange_names_merge_beds_home_bed_and_conflict() {
        let workspace: Workspace = serde_json::from_value(json!({
            "bed": [{"exchangeName": "B1"}, {"exchangeName": "B2"}, {}],
            "visit": {
                "id": 7,
                "homeBedExchangeName": "B1",
                "bedConflict": {"exchangeName": "B3"}
            }
        }))
        .unwrap();

        assert_eq!(workspace.exchange_names(), vec!["B1", "B2", "B3"]);
    }

    #[test]
    fn workspace_without_beds_or_visit_has_no_names() {
        let workspace: Workspace = serde_json::from_value(json!({"bed": null})).unwrap();
        assert!(workspace.exchange_names().is_empty());
    }
}
