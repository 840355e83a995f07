//! Registry models: staff, subjects and classes.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

use super::{new_id, StateDocument};

const DEFAULT_DEPARTMENT: &str = "General";
const EMAIL_DOMAIN: &str = "institution.edu";

/// A faculty member who can be assigned to timetable slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub specialization: Vec<String>,
    #[serde(default)]
    pub assigned_subjects: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Days the member is available to teach
    #[serde(default)]
    pub availability: Vec<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoom {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub section: String,
}

impl ClassRoom {
    /// Display label including the section, e.g. `B.Sc Year 1 (A)`.
    pub fn label(&self) -> String {
        if self.section.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.section)
        }
    }
}

/// Request body for creating a staff member.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub specialization: Option<Vec<String>>,
    #[serde(default)]
    pub availability: Option<Vec<String>>,
}

/// Request body for creating a subject.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}

/// Request body for creating a class.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub section: Option<String>,
}

/// Derive a mailbox from a display name: `Jane Doe` becomes `jane.doe@...`.
fn derived_email(name: &str) -> String {
    let local = name
        .split_whitespace()
        .map(|part| {
            part.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    format!("{}@{}", local, EMAIL_DOMAIN)
}

fn non_empty_or(value: Option<&String>, fallback: &str) -> String {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

impl StateDocument {
    pub fn find_staff(&self, id: &str) -> Option<&StaffMember> {
        self.staff.iter().find(|s| s.id == id)
    }

    pub fn find_subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn find_class(&self, id: &str) -> Option<&ClassRoom> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn add_staff(&mut self, request: &CreateStaffRequest) -> Result<StaffMember, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Staff name is required".to_string()));
        }

        let member = StaffMember {
            id: new_id(),
            name: name.to_string(),
            email: request
                .email
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| derived_email(name)),
            department: non_empty_or(request.department.as_ref(), DEFAULT_DEPARTMENT),
            specialization: request.specialization.clone().unwrap_or_default(),
            assigned_subjects: Vec::new(),
            is_active: true,
            availability: request
                .availability
                .clone()
                .unwrap_or_else(|| self.config.working_days.clone()),
        };

        self.staff.push(member.clone());
        Ok(member)
    }

    pub fn add_subject(&mut self, request: &CreateSubjectRequest) -> Result<Subject, AppError> {
        let name = request.name.trim();
        let code = request.code.trim();
        if name.is_empty() || code.is_empty() {
            return Err(AppError::Validation(
                "Subject name and code are required".to_string(),
            ));
        }

        let subject = Subject {
            id: new_id(),
            code: code.to_string(),
            name: name.to_string(),
            department: non_empty_or(request.department.as_ref(), DEFAULT_DEPARTMENT),
        };

        self.subjects.push(subject.clone());
        Ok(subject)
    }

    pub fn add_class(&mut self, request: &CreateClassRequest) -> Result<ClassRoom, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Class name is required".to_string()));
        }

        let class = ClassRoom {
            id: new_id(),
            name: name.to_string(),
            section: request
                .section
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        };

        self.classes.push(class.clone());
        Ok(class)
    }

    pub fn remove_staff(&mut self, id: &str) -> Result<StaffMember, AppError> {
        let index = self
            .staff
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Staff member {} not found", id)))?;
        Ok(self.staff.remove(index))
    }

    pub fn remove_subject(&mut self, id: &str) -> Result<Subject, AppError> {
        let index = self
            .subjects
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Subject {} not found", id)))?;
        Ok(self.subjects.remove(index))
    }

    pub fn remove_class(&mut self, id: &str) -> Result<ClassRoom, AppError> {
        let index = self
            .classes
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", id)))?;
        Ok(self.classes.remove(index))
    }
}
