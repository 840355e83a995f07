//! The State Document: the single unit of persistence and synchronization.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    new_id, AdminSettings, AttendanceRecord, ClassRoom, InstitutionConfig, LeaveRequest, Role,
    StaffMember, Subject, Substitution, SystemLog, TimetableEntry, LOG_CAPACITY,
};

/// Complete snapshot of institutional data.
///
/// Every field falls back to its default when absent, so partial documents
/// written by older clients still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDocument {
    pub config: InstitutionConfig,
    pub timetable: Vec<TimetableEntry>,
    pub staff: Vec<StaffMember>,
    pub attendance: Vec<AttendanceRecord>,
    pub leaves: Vec<LeaveRequest>,
    pub subjects: Vec<Subject>,
    pub classes: Vec<ClassRoom>,
    pub substitutions: Vec<Substitution>,
    pub settings: AdminSettings,
    pub logs: Vec<SystemLog>,
    /// Local mutation counter. Informational; replication stays last-write-wins.
    pub revision: u64,
}

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub staff_count: usize,
    pub class_count: usize,
    pub pending_leaves: usize,
    pub timetable_entries: usize,
    pub academic_year: String,
    pub term: String,
}

/// Registry data safe to show to unauthenticated viewers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDirectory {
    pub config: InstitutionConfig,
    pub staff: Vec<DirectoryStaff>,
    pub subjects: Vec<Subject>,
    pub classes: Vec<ClassRoom>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStaff {
    pub id: String,
    pub name: String,
    pub department: String,
}

impl StateDocument {
    /// Document created on first run when nothing is persisted.
    pub fn seed() -> Self {
        let working_days = InstitutionConfig::default().working_days;
        let weekdays: Vec<String> = working_days.iter().take(5).cloned().collect();

        Self {
            staff: vec![
                StaffMember {
                    id: "s1".to_string(),
                    name: "Dr. Meera Iyer".to_string(),
                    email: "meera.iyer@institution.edu".to_string(),
                    department: "Chemistry".to_string(),
                    specialization: vec!["Organic Synthesis".to_string()],
                    assigned_subjects: Vec::new(),
                    is_active: true,
                    availability: weekdays.clone(),
                },
                StaffMember {
                    id: "s2".to_string(),
                    name: "Mr. Arjun Rao".to_string(),
                    email: "arjun.rao@institution.edu".to_string(),
                    department: "Biology".to_string(),
                    specialization: vec!["Cell Biology".to_string()],
                    assigned_subjects: Vec::new(),
                    is_active: true,
                    availability: weekdays,
                },
            ],
            subjects: vec![
                Subject {
                    id: "sub1".to_string(),
                    code: "CH101".to_string(),
                    name: "Organic Chemistry I".to_string(),
                    department: "Chemistry".to_string(),
                },
                Subject {
                    id: "sub2".to_string(),
                    code: "BI102".to_string(),
                    name: "Cell Biology".to_string(),
                    department: "Biology".to_string(),
                },
            ],
            classes: vec![
                ClassRoom {
                    id: "c1".to_string(),
                    name: "B.Sc Year 1".to_string(),
                    section: "A".to_string(),
                },
                ClassRoom {
                    id: "c2".to_string(),
                    name: "B.Sc Year 1".to_string(),
                    section: "B".to_string(),
                },
                ClassRoom {
                    id: "c3".to_string(),
                    name: "M.Sc Year 1".to_string(),
                    section: "A".to_string(),
                },
            ],
            ..Self::default()
        }
    }

    /// Read a document from untrusted JSON one section at a time.
    ///
    /// A field that does not fit its type keeps its default, a list item that
    /// cannot be read is dropped, and unknown keys are ignored.
    pub fn from_value_lenient(value: Value) -> Self {
        if let Ok(doc) = serde_json::from_value::<Self>(value.clone()) {
            return doc;
        }
        let Value::Object(sections) = value else {
            return Self::default();
        };

        let mut doc = Self::default();
        for (key, section) in sections {
            match key.as_str() {
                "config" => doc.config = read_fields(&key, section).unwrap_or_default(),
                "settings" => doc.settings = read_fields(&key, section).unwrap_or_default(),
                "timetable" => doc.timetable = read_list(&key, section),
                "staff" => doc.staff = read_list(&key, section),
                "attendance" => doc.attendance = read_list(&key, section),
                "leaves" => doc.leaves = read_list(&key, section),
                "subjects" => doc.subjects = read_list(&key, section),
                "classes" => doc.classes = read_list(&key, section),
                "substitutions" => doc.substitutions = read_list(&key, section),
                "logs" => doc.logs = read_list(&key, section),
                "revision" => {
                    doc.revision = serde_json::from_value(section).unwrap_or_else(|_| {
                        tracing::warn!("Ignoring unreadable revision in document");
                        0
                    })
                }
                _ => {}
            }
        }
        doc
    }

    /// Best-effort filling of settings that older documents leave blank.
    pub fn fill_defaults(&mut self, default_remote_url: Option<&str>) {
        if self.settings.remote_url.trim().is_empty() {
            if let Some(url) = default_remote_url {
                self.settings.remote_url = url.to_string();
            }
        }
    }

    /// Prepend a log line, keeping only the most recent entries.
    pub fn push_log(&mut self, role: Role, action: impl Into<String>) {
        let entry = SystemLog {
            id: new_id(),
            timestamp: Utc::now().to_rfc3339(),
            user: role.actor_label().to_string(),
            action: action.into(),
        };
        self.logs.insert(0, entry);
        self.logs.truncate(LOG_CAPACITY);
    }

    pub fn staff_name(&self, id: &str) -> String {
        self.find_staff(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Copy of the document as an admin may see it.
    pub fn redacted(&self) -> Self {
        Self {
            settings: self.settings.redacted(),
            ..self.clone()
        }
    }

    pub fn dashboard(&self) -> DashboardSummary {
        DashboardSummary {
            staff_count: self.staff.len(),
            class_count: self.classes.len(),
            pending_leaves: self.pending_leave_count(),
            timetable_entries: self.timetable.len(),
            academic_year: self.config.academic_year.clone(),
            term: self.config.term.clone(),
        }
    }

    pub fn public_directory(&self) -> PublicDirectory {
        PublicDirectory {
            config: self.config.clone(),
            staff: self
                .staff
                .iter()
                .filter(|s| s.is_active)
                .map(|s| DirectoryStaff {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    department: s.department.clone(),
                })
                .collect(),
            subjects: self.subjects.clone(),
            classes: self.classes.clone(),
        }
    }
}

/// Read an object as `T`, dropping every field that does not fit on its own.
/// `None` when the value is not an object or a required field is unusable.
fn read_fields<T>(section: &str, value: Value) -> Option<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    if let Ok(parsed) = serde_json::from_value(value.clone()) {
        return Some(parsed);
    }
    let Value::Object(fields) = value else {
        tracing::warn!(section, "Dropping unreadable value from document");
        return None;
    };
    let Ok(Value::Object(template)) = serde_json::to_value(T::default()) else {
        return None;
    };

    let mut accepted = Map::new();
    for (key, field) in fields {
        let mut candidate = template.clone();
        candidate.insert(key.clone(), field.clone());
        if serde_json::from_value::<T>(Value::Object(candidate)).is_ok() {
            accepted.insert(key, field);
        } else {
            tracing::warn!(section, field = %key, "Dropping mistyped field from document");
        }
    }

    match serde_json::from_value(Value::Object(accepted)) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(section, "Dropping incomplete item from document: {}", e);
            None
        }
    }
}

fn read_list<T>(section: &str, value: Value) -> Vec<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| read_fields(section, item))
            .collect(),
        _ => {
            tracing::warn!(section, "Expected a list in document, using an empty one");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_loads_with_defaults() {
        let doc: StateDocument = serde_json::from_str(r#"{"timetable": []}"#).unwrap();
        assert!(doc.timetable.is_empty());
        assert!(doc.staff.is_empty());
        assert_eq!(doc.config.time_slots.len(), 7);
        assert!(doc.settings.remote_sync_enabled);
        assert_eq!(doc.revision, 0);
    }

    #[test]
    fn test_lenient_read_keeps_good_fields_next_to_mistyped_ones() {
        let value = serde_json::json!({
            "config": {"term": "Odd Semester", "periodsPerDay": "7"},
            "staff": [
                {"id": "s9", "name": "Dr. Rao", "isActive": "yes"},
                {"name": "No Id"}
            ],
            "timetable": "oops",
            "revision": "12"
        });

        let doc = StateDocument::from_value_lenient(value);
        assert_eq!(doc.config.term, "Odd Semester");
        assert_eq!(
            doc.config.periods_per_day,
            InstitutionConfig::default().periods_per_day
        );
        assert_eq!(doc.staff.len(), 1);
        assert_eq!(doc.staff[0].id, "s9");
        assert!(doc.staff[0].is_active);
        assert!(doc.timetable.is_empty());
        assert_eq!(doc.revision, 0);
    }

    #[test]
    fn test_lenient_read_of_valid_document_matches_strict_read() {
        let seed = StateDocument::seed();
        let doc = StateDocument::from_value_lenient(serde_json::to_value(&seed).unwrap());
        assert_eq!(doc.staff.len(), seed.staff.len());
        assert_eq!(doc.classes.len(), seed.classes.len());
        assert_eq!(doc.config.time_slots, seed.config.time_slots);
    }

    #[test]
    fn test_round_trip_keeps_wire_keys() {
        let doc = StateDocument::seed();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["config"]["timeSlots"].is_array());
        assert!(json["settings"]["googleSheetWebAppUrl"].is_string());
        assert!(json["settings"]["cloudDbEnabled"].is_boolean());
        assert_eq!(json["staff"][0]["isActive"], true);
    }

    #[test]
    fn test_log_is_capped_newest_first() {
        let mut doc = StateDocument::default();
        for i in 0..(LOG_CAPACITY + 5) {
            doc.push_log(Role::Admin, format!("action {}", i));
        }
        assert_eq!(doc.logs.len(), LOG_CAPACITY);
        assert_eq!(doc.logs[0].action, format!("action {}", LOG_CAPACITY + 4));
        assert_eq!(doc.logs[0].user, "Admin");
    }

    #[test]
    fn test_fill_defaults_only_fills_blank_url() {
        let mut doc = StateDocument::default();
        doc.fill_defaults(Some("https://remote.test/exec"));
        assert_eq!(doc.settings.remote_url, "https://remote.test/exec");

        doc.settings.remote_url = "https://other.test".to_string();
        doc.fill_defaults(Some("https://remote.test/exec"));
        assert_eq!(doc.settings.remote_url, "https://other.test");
    }

    #[test]
    fn test_dashboard_and_directory() {
        let mut doc = StateDocument::seed();
        doc.staff[1].is_active = false;
        let summary = doc.dashboard();
        assert_eq!(summary.staff_count, 2);
        assert_eq!(summary.class_count, 3);
        assert_eq!(summary.pending_leaves, 0);
        assert_eq!(doc.public_directory().staff.len(), 1);
    }
}
