//! Contact listing and normalization
//!
//! HubSpot contacts are mapped into the provider-agnostic item shape shared
//! across integrations. Most fields do not apply to contacts and stay null.

use crate::{config::OAuthConfig, error::AppError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Credentials as handed back to the caller: either the raw JSON text from
/// the one-shot pickup or an already-parsed object. Resolved here at the
/// boundary so the fetch logic only ever sees an access token.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    Parsed(Value),
    Raw(String),
}

impl Credentials {
    pub fn access_token(&self) -> Result<String, AppError> {
        let parsed: Value = match self {
            Credentials::Parsed(value) => value.clone(),
            Credentials::Raw(text) => serde_json::from_str(text)
                .map_err(|e| AppError::FetchFailed(format!("invalid credentials: {e}")))?,
        };

        parsed
            .get("access_token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::FetchFailed("credentials missing access_token".to_string()))
    }
}

/// Normalized record shape shared across CRM integrations. For HubSpot
/// contacts only `id`, `name`, `type` and `visibility` carry data; the
/// remaining fields exist to fit the cross-provider shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegrationItem {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub creation_time: Option<String>,
    pub last_modified_time: Option<String>,
    pub url: Option<String>,
    pub parent_id: Option<String>,
    pub parent_path_or_name: Option<String>,
    pub directory: bool,
    pub children: Option<Vec<String>>,
    pub mime_type: Option<String>,
    pub delta: Option<String>,
    pub drive_id: Option<String>,
    pub visibility: bool,
}

impl IntegrationItem {
    /// Normalize a raw HubSpot contact record
    fn from_contact(contact: &Value) -> Self {
        let properties = contact.get("properties");
        let prop = |name: &str| {
            properties
                .and_then(|p| p.get(name))
                .and_then(|v| v.as_str())
                .unwrap_or("")
        };

        let name = format!("{} {}", prop("firstname"), prop("lastname"))
            .trim()
            .to_string();

        Self {
            id: contact
                .get("id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            name,
            item_type: "Contact".to_string(),
            creation_time: None,
            last_modified_time: None,
            url: None,
            parent_id: None,
            parent_path_or_name: None,
            directory: false,
            children: None,
            mime_type: None,
            delta: None,
            drive_id: None,
            visibility: true,
        }
    }
}

/// Fetches and normalizes HubSpot contacts
pub struct ContactService {
    config: OAuthConfig,
    http_client: Client,
}

impl ContactService {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    /// List the contacts visible to the given credentials, normalized into
    /// [`IntegrationItem`]s.
    pub async fn list_items(
        &self,
        credentials: Credentials,
    ) -> Result<Vec<IntegrationItem>, AppError> {
        let access_token = credentials.access_token()?;

        let response = self
            .http_client
            .get(&self.config.contacts_url)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| AppError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "contact listing rejected");
            return Err(AppError::FetchFailed(format!("status {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::FetchFailed(e.to_string()))?;

        let items: Vec<IntegrationItem> = body
            .get("results")
            .and_then(|r| r.as_array())
            .map(|contacts| contacts.iter().map(IntegrationItem::from_contact).collect())
            .unwrap_or_default();

        tracing::debug!(count = items.len(), "fetched hubspot contacts");
        Ok(items)
    }
}
