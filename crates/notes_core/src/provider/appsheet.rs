//! AppSheet REST backend.
//!
//! # Responsibility
//! - Translate provider calls into AppSheet table `Action` requests.
//! - Map loosely typed AppSheet rows into [`Note`].
//!
//! # Invariants
//! - Every request targets `{base_url}/{app_id}/tables/{table}/Action`.
//! - Non-2xx responses never yield rows.
//! - The API key is never logged or described in clear text.

use crate::config::{
    AppSheetConfig, APPSHEET_API_KEY_ENV, APPSHEET_APP_ID_ENV, APPSHEET_TABLE_ENV,
};
use crate::model::note::{NewNote, Note, NoteUpdate};
use crate::model::timestamp::Timestamp;
use crate::provider::{
    mask_secret, ConnectionStats, NotesProvider, ProviderError, ProviderResult,
};
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};

pub const APPSHEET_PROVIDER_ID: &str = "appsheet";
pub const APPSHEET_BASE_URL: &str = "https://api.appsheet.com/api/v2/apps";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const LOCALE: &str = "en-US";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
enum Action {
    Find,
    Add,
    Edit,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Self::Find => "Find",
            Self::Add => "Add",
            Self::Edit => "Edit",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ActionRequest {
    action: Action,
    properties: ActionProperties,
    rows: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ActionProperties {
    locale: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    selector: Option<String>,
}

impl ActionRequest {
    fn new(action: Action) -> Self {
        Self {
            action,
            properties: ActionProperties {
                locale: LOCALE,
                selector: None,
            },
            rows: Vec::new(),
        }
    }

    fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows;
        self
    }

    fn with_selector(mut self, selector: String) -> Self {
        self.properties.selector = Some(selector);
        self
    }
}

/// Notes provider backed by an AppSheet app.
pub struct AppSheetProvider {
    client: Client,
    base_url: String,
    app_id: String,
    api_key: String,
    note_table: String,
    attachment_table: Option<String>,
}

impl AppSheetProvider {
    /// Builds a provider from resolved settings.
    ///
    /// # Errors
    /// - `MissingSetting` when `app_id`, `api_key` or `note_table` is absent.
    /// - `Transport` when the HTTP client cannot be constructed.
    pub fn new(settings: &AppSheetConfig) -> ProviderResult<Self> {
        let app_id = required(&settings.app_id, "app_id", APPSHEET_APP_ID_ENV)?;
        let api_key = required(&settings.api_key, "api_key", APPSHEET_API_KEY_ENV)?;
        let note_table = required(&settings.note_table, "note_table", APPSHEET_TABLE_ENV)?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: APPSHEET_BASE_URL.to_string(),
            app_id,
            api_key,
            note_table,
            attachment_table: settings
                .attachment_table
                .clone()
                .filter(|table| !table.trim().is_empty()),
        })
    }

    /// Points the provider at another API root (mock servers, regional hosts).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn action_url(&self, table: &str) -> String {
        format!("{}/{}/tables/{}/Action", self.base_url, self.app_id, table)
    }

    fn execute(&self, table: &str, request: &ActionRequest) -> ProviderResult<Vec<Value>> {
        let started_at = Instant::now();
        let action = request.action.as_str();
        let result = self.send(table, request);

        match &result {
            Ok(rows) => debug!(
                "event=appsheet_action module=provider status=ok action={action} table={table} rows={} duration_ms={}",
                rows.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=appsheet_action module=provider status=error action={action} table={table} duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn send(&self, table: &str, request: &ActionRequest) -> ProviderResult<Vec<Value>> {
        let response = self
            .client
            .post(self.action_url(table))
            .header("ApplicationAccessKey", &self.api_key)
            .json(request)
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        check_status(status, table, &body)?;
        parse_rows(&body)
    }

    fn find_all(&self, table: &str) -> ProviderResult<Vec<Value>> {
        self.execute(table, &ActionRequest::new(Action::Find))
    }
}

impl NotesProvider for AppSheetProvider {
    fn provider_id(&self) -> &str {
        APPSHEET_PROVIDER_ID
    }

    fn fetch_all(&self) -> ProviderResult<Vec<Note>> {
        self.find_all(&self.note_table)?
            .iter()
            .map(note_from_row)
            .collect()
    }

    fn get(&self, id: &str) -> ProviderResult<Option<Note>> {
        let request = ActionRequest::new(Action::Find).with_rows(vec![json!({ "ID": id })]);
        let rows = self.execute(&self.note_table, &request)?;
        for row in &rows {
            let note = note_from_row(row)?;
            if note.id == id {
                return Ok(Some(note));
            }
        }
        Ok(None)
    }

    fn add(&self, note: &NewNote) -> ProviderResult<Note> {
        let note = note.normalized()?;
        let request = ActionRequest::new(Action::Add).with_rows(vec![json!({
            "Title": note.title,
            "Content": note.content,
            "Labels": note.labels,
        })]);
        let rows = self.execute(&self.note_table, &request)?;
        rows.first()
            .map(note_from_row)
            .unwrap_or_else(|| {
                Err(ProviderError::InvalidResponse(
                    "Add returned no rows".to_string(),
                ))
            })
    }

    fn update(&self, id: &str, update: &NoteUpdate) -> ProviderResult<Note> {
        let update = update.normalized()?;
        let mut current = self
            .get(id)?
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;

        let mut row = Map::new();
        row.insert("ID".to_string(), Value::String(id.to_string()));
        if let Some(title) = &update.title {
            row.insert("Title".to_string(), Value::String(title.clone()));
            current.title = title.clone();
        }
        if let Some(content) = &update.content {
            row.insert("Content".to_string(), Value::String(content.clone()));
            current.content = content.clone();
        }
        if let Some(labels) = &update.labels {
            row.insert("Labels".to_string(), Value::String(labels.clone()));
            current.labels = labels.clone();
        }

        let request = ActionRequest::new(Action::Edit).with_rows(vec![Value::Object(row)]);
        let rows = self.execute(&self.note_table, &request)?;
        match rows.first() {
            Some(row) => note_from_row(row),
            // Some apps do not echo edited rows.
            None => Ok(current),
        }
    }

    fn list_attachments(&self, note_id: &str) -> ProviderResult<Vec<Value>> {
        let table = self
            .attachment_table
            .as_deref()
            .ok_or(ProviderError::Unsupported("no attachment table configured"))?;
        let selector = format!(
            "Filter({table}, [Note] = \"{}\")",
            note_id.replace('"', "\\\"")
        );
        self.execute(table, &ActionRequest::new(Action::Find).with_selector(selector))
    }

    fn describe(&self) -> ConnectionStats {
        ConnectionStats::from([
            ("app_id".to_string(), self.app_id.clone()),
            ("api_key_preview".to_string(), mask_secret(&self.api_key)),
            ("note_table".to_string(), self.note_table.clone()),
            (
                "attachment_table".to_string(),
                self.attachment_table
                    .clone()
                    .unwrap_or_else(|| "(not configured)".to_string()),
            ),
        ])
    }

    fn check_connection(&self) -> ProviderResult<ConnectionStats> {
        let mut stats = self.describe();
        let notes = self.find_all(&self.note_table)?;
        stats.insert("note_count".to_string(), notes.len().to_string());

        if let Some(table) = &self.attachment_table {
            match self.find_all(table) {
                Ok(rows) => {
                    stats.insert("attachment_count".to_string(), rows.len().to_string());
                }
                Err(err) => {
                    stats.insert("attachment_error".to_string(), err.to_string());
                }
            }
        }
        Ok(stats)
    }
}

fn required(
    value: &Option<String>,
    setting: &'static str,
    env_var: &'static str,
) -> ProviderResult<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ProviderError::MissingSetting {
            provider: "AppSheet",
            setting,
            env_var,
        })
}

fn check_status(status: u16, table: &str, body: &str) -> ProviderResult<()> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(ProviderError::Unauthorized {
            status,
            body: body.to_string(),
        }),
        404 => Err(ProviderError::TableNotFound {
            table: table.to_string(),
            body: body.to_string(),
        }),
        _ => Err(ProviderError::Http {
            status,
            body: body.to_string(),
        }),
    }
}

/// Accepts a bare row array or an object carrying `Rows`; empty body is no rows.
fn parse_rows(body: &str) -> ProviderResult<Vec<Value>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|err| ProviderError::InvalidResponse(format!("body is not JSON: {err}")))?;
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut object) => match object.remove("Rows") {
            Some(Value::Array(rows)) => Ok(rows),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(ProviderError::InvalidResponse(
                "`Rows` is not an array".to_string(),
            )),
        },
        _ => Err(ProviderError::InvalidResponse(
            "expected an array of rows".to_string(),
        )),
    }
}

fn note_from_row(row: &Value) -> ProviderResult<Note> {
    let id = scalar_text(row.get("ID"))
        .or_else(|| scalar_text(row.get("_RowNumber")))
        .ok_or_else(|| ProviderError::InvalidResponse(format!("row without ID: {row}")))?;

    Ok(Note {
        id,
        title: scalar_text(row.get("Title")).unwrap_or_default(),
        content: scalar_text(row.get("Content")).unwrap_or_default(),
        labels: scalar_text(row.get("Labels")).unwrap_or_default(),
        created: row.get("Created").and_then(Value::as_str).and_then(Timestamp::parse),
        modified: row
            .get("Modified")
            .and_then(Value::as_str)
            .and_then(Timestamp::parse),
    })
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
