//! Administrative settings, roles, sessions and the system log.

use serde::{Deserialize, Serialize};

use super::StateDocument;

/// Most recent log lines kept in the document.
pub const LOG_CAPACITY: usize = 50;

/// The two fixed administrative identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Principal,
}

impl Role {
    /// Actor label written into the system log.
    pub fn actor_label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Principal => "Principal",
        }
    }
}

/// Singleton settings. Wire keys match the documents already stored remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    #[serde(rename = "googleLoginEnabled")]
    pub sso_enabled: bool,
    #[serde(rename = "approvedEmails")]
    pub sso_allow_list: Vec<String>,
    #[serde(rename = "googleClientId")]
    pub sso_client_id: String,
    #[serde(rename = "googleClientSecret")]
    pub sso_client_secret: String,
    #[serde(rename = "adminUsername")]
    pub admin_username: String,
    #[serde(rename = "adminPassword")]
    pub admin_password: String,
    #[serde(rename = "principalUsername")]
    pub principal_username: String,
    #[serde(rename = "principalPassword")]
    pub principal_password: String,
    #[serde(rename = "cloudDbEnabled")]
    pub remote_sync_enabled: bool,
    #[serde(rename = "googleSheetWebAppUrl")]
    pub remote_url: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            sso_enabled: false,
            sso_allow_list: vec!["admin@institution.edu".to_string()],
            sso_client_id: String::new(),
            sso_client_secret: String::new(),
            admin_username: "admin".to_string(),
            admin_password: "password123".to_string(),
            principal_username: "1234".to_string(),
            principal_password: "1234".to_string(),
            remote_sync_enabled: true,
            remote_url: String::new(),
        }
    }
}

impl AdminSettings {
    /// Configured endpoint, regardless of the sync toggle.
    pub fn endpoint(&self) -> Option<&str> {
        let url = self.remote_url.trim();
        (!url.is_empty()).then_some(url)
    }

    /// Endpoint to replicate to, only when remote sync is switched on.
    pub fn sync_endpoint(&self) -> Option<&str> {
        if self.remote_sync_enabled {
            self.endpoint()
        } else {
            None
        }
    }

    /// Copy with credentials and the SSO secret blanked out.
    pub fn redacted(&self) -> Self {
        Self {
            admin_password: String::new(),
            principal_password: String::new(),
            principal_username: String::new(),
            sso_client_secret: String::new(),
            ..self.clone()
        }
    }
}

/// Request body for a partial settings update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(rename = "googleLoginEnabled", default)]
    pub sso_enabled: Option<bool>,
    #[serde(rename = "approvedEmails", default)]
    pub sso_allow_list: Option<Vec<String>>,
    #[serde(rename = "googleClientId", default)]
    pub sso_client_id: Option<String>,
    #[serde(rename = "googleClientSecret", default)]
    pub sso_client_secret: Option<String>,
    #[serde(rename = "adminUsername", default)]
    pub admin_username: Option<String>,
    #[serde(rename = "adminPassword", default)]
    pub admin_password: Option<String>,
    #[serde(rename = "principalUsername", default)]
    pub principal_username: Option<String>,
    #[serde(rename = "principalPassword", default)]
    pub principal_password: Option<String>,
    #[serde(rename = "cloudDbEnabled", default)]
    pub remote_sync_enabled: Option<bool>,
    #[serde(rename = "googleSheetWebAppUrl", default)]
    pub remote_url: Option<String>,
}

/// Append-only audit line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemLog {
    pub id: String,
    pub timestamp: String,
    pub user: String,
    pub action: String,
}

/// The single active authentication session kept in the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub issued_at: String,
}

impl StateDocument {
    pub fn update_settings(&mut self, request: &UpdateSettingsRequest) -> AdminSettings {
        let settings = &mut self.settings;
        if let Some(v) = request.sso_enabled {
            settings.sso_enabled = v;
        }
        if let Some(v) = &request.sso_allow_list {
            settings.sso_allow_list = v
                .iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(v) = &request.sso_client_id {
            settings.sso_client_id = v.clone();
        }
        if let Some(v) = &request.sso_client_secret {
            settings.sso_client_secret = v.clone();
        }
        if let Some(v) = &request.admin_username {
            settings.admin_username = v.clone();
        }
        if let Some(v) = &request.admin_password {
            settings.admin_password = v.clone();
        }
        if let Some(v) = &request.principal_username {
            settings.principal_username = v.clone();
        }
        if let Some(v) = &request.principal_password {
            settings.principal_password = v.clone();
        }
        if let Some(v) = request.remote_sync_enabled {
            settings.remote_sync_enabled = v;
        }
        if let Some(v) = &request.remote_url {
            settings.remote_url = v.trim().to_string();
        }
        settings.clone()
    }
}
