use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub workflow_state: String,
    pub enrollment_term_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: u64,
    pub name: String,
    pub position: u32,
    pub unlock_at: Option<DateTime<Utc>>,
    pub requires_sequential_progress: bool,
    pub state: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub item_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleItem {
    pub id: u64,
    #[serde(default)]
    pub module_id: Option<u64>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub content_id: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub indent: u32,
    #[serde(default)]
    pub completion_requirement: Option<CompletionRequirement>,
    #[serde(default)]
    pub published: Option<bool>,
}

impl ModuleItem {
    /// Identifier to relay when this item is a file.
    pub fn relay_id(&self) -> Option<u64> {
        match self.kind {
            ItemKind::File => self.content_id,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequirement {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Module item kinds as reported by the LMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Page,
    Assignment,
    Discussion,
    ExternalUrl,
    File,
    ExternalTool,
    Quiz,
    SubHeader,
    Other(Cow<'static, str>),
}

impl ItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::Page => "Page",
            ItemKind::Assignment => "Assignment",
            ItemKind::Discussion => "Discussion",
            ItemKind::ExternalUrl => "ExternalUrl",
            ItemKind::File => "File",
            ItemKind::ExternalTool => "ExternalTool",
            ItemKind::Quiz => "Quiz",
            ItemKind::SubHeader => "SubHeader",
            ItemKind::Other(value) => value.as_ref(),
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "Page" => ItemKind::Page,
            "Assignment" => ItemKind::Assignment,
            "Discussion" => ItemKind::Discussion,
            "ExternalUrl" => ItemKind::ExternalUrl,
            "File" => ItemKind::File,
            "ExternalTool" => ItemKind::ExternalTool,
            "Quiz" => ItemKind::Quiz,
            "SubHeader" => ItemKind::SubHeader,
            other => ItemKind::Other(Cow::Owned(other.to_string())),
        }
    }
}

impl Serialize for ItemKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(ItemKind::from_str(&value))
    }
}

/// File metadata returned by `GET /files/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileMetadata {
    pub id: u64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "content-type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl FileMetadata {
    /// Name to stage the content under; falls back to the display name.
    pub fn original_filename(&self) -> &str {
        if !self.filename.trim().is_empty() {
            &self.filename
        } else if !self.display_name.trim().is_empty() {
            &self.display_name
        } else {
            "download.bin"
        }
    }
}

// Upstream payload shapes. Field names follow the LMS wire format.

#[derive(Debug, Deserialize)]
pub(crate) struct RawCourse {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    course_code: Option<String>,
    #[serde(default)]
    workflow_state: Option<String>,
    #[serde(default)]
    enrollment_term_id: Option<u64>,
    #[serde(default)]
    term: Option<Term>,
}

impl From<RawCourse> for Course {
    fn from(raw: RawCourse) -> Self {
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            code: raw.course_code.unwrap_or_default(),
            workflow_state: raw.workflow_state.unwrap_or_default(),
            enrollment_term_id: raw.enrollment_term_id,
            term: raw.term,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawModule {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    position: u32,
    #[serde(default)]
    unlock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    require_sequential_progress: Option<bool>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    items_count: u32,
}

impl From<RawModule> for Module {
    fn from(raw: RawModule) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            position: raw.position,
            unlock_at: raw.unlock_at,
            requires_sequential_progress: raw.require_sequential_progress.unwrap_or(false),
            state: raw.state,
            completed_at: raw.completed_at,
            item_count: raw.items_count,
        }
    }
}
