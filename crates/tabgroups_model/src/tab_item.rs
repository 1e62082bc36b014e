//! Saved tab references.
//!
//! A [`TabItem`] is a snapshot of one editor tab: the resource it shows, an
//! optional original side for diffs, and the kind of editor it was opened in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label used when a tab is captured without a display name.
pub const DEFAULT_TAB_LABEL: &str = "Untitled tab";

/// Kind of editor a tab was opened in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TabKind {
    #[default]
    Text,
    Diff,
    Notebook,
    NotebookDiff,
    Custom,
}

impl TabKind {
    /// Icon hint used by tree views.
    pub fn icon(self) -> &'static str {
        match self {
            TabKind::Text => "file",
            TabKind::Diff => "diff",
            TabKind::Notebook => "notebook",
            TabKind::NotebookDiff => "notebook-diff",
            TabKind::Custom => "extensions",
        }
    }

    /// Whether tabs of this kind carry an original (left) side.
    pub fn is_diff(self) -> bool {
        matches!(self, TabKind::Diff | TabKind::NotebookDiff)
    }
}

/// Tab description produced once at the host boundary.
///
/// The host resolves whatever polymorphic tab object it has into this tagged
/// form; the engine only ever looks at `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInput {
    pub kind: TabKind,
    pub uri: String,
    #[serde(default)]
    pub original_uri: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl TabInput {
    pub fn text(uri: impl Into<String>) -> Self {
        Self {
            kind: TabKind::Text,
            uri: uri.into(),
            original_uri: None,
            label: None,
        }
    }

    pub fn diff(original_uri: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            kind: TabKind::Diff,
            uri: uri.into(),
            original_uri: Some(original_uri.into()),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Normalizes a uri or path into the key used for dedup and the reverse index.
///
/// `file://` uris collapse to their path, Windows separators become `/`, and a
/// trailing separator is dropped. Non-file uris are kept verbatim.
pub fn normalize_path(uri: &str) -> String {
    let trimmed = uri.trim();
    let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    let mut normalized = path.replace('\\', "/");
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// A saved reference to an editor-openable resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabItem {
    id: String,
    label: String,
    uri: String,
    original_uri: Option<String>,
    kind: TabKind,
    icon: &'static str,
    /// Informational back-reference to the owning group.
    group_id: Option<String>,
}

impl TabItem {
    /// Creates a text tab. A fresh id is generated when `id` is `None`.
    pub fn new(uri: impl Into<String>, id: Option<String>, label: Option<String>) -> Self {
        Self {
            id: id.unwrap_or_else(new_tab_id),
            label: label.unwrap_or_else(|| DEFAULT_TAB_LABEL.to_string()),
            uri: uri.into(),
            original_uri: None,
            kind: TabKind::Text,
            icon: TabKind::Text.icon(),
            group_id: None,
        }
    }

    /// Builds a tab from a host-supplied input, deriving a label from the
    /// file name when the host did not provide one.
    pub fn from_input(input: TabInput) -> Self {
        let label = input
            .label
            .clone()
            .unwrap_or_else(|| label_from_uri(&input.uri));
        let mut item = Self::new(input.uri, None, Some(label));
        item.original_uri = if input.kind.is_diff() {
            input.original_uri
        } else {
            None
        };
        item.set_tab_type(input.kind);
        item
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Normalized path of the primary uri.
    pub fn path(&self) -> String {
        normalize_path(&self.uri)
    }

    pub fn original_uri(&self) -> Option<&str> {
        self.original_uri.as_deref()
    }

    pub fn kind(&self) -> TabKind {
        self.kind
    }

    pub fn icon(&self) -> &'static str {
        self.icon
    }

    pub fn set_tab_type(&mut self, kind: TabKind) {
        self.kind = kind;
        self.icon = kind.icon();
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub(crate) fn set_group_id(&mut self, group_id: &str) {
        self.group_id = Some(group_id.to_string());
    }

    /// Copies the tab under a new id, detached from any group.
    pub fn deep_clone(&self) -> Self {
        Self {
            id: new_tab_id(),
            group_id: None,
            ..self.clone()
        }
    }

    pub fn to_transfer(&self) -> TabItemData {
        TabItemData {
            id: self.id.clone(),
            label: self.label.clone(),
            uri: self.uri.clone(),
            original_uri: self.original_uri.clone(),
            kind: self.kind,
        }
    }

    pub fn from_transfer(data: TabItemData) -> Self {
        let id = if data.id.is_empty() {
            new_tab_id()
        } else {
            data.id
        };
        let mut item = Self::new(data.uri, Some(id), Some(data.label));
        item.original_uri = data.original_uri;
        item.set_tab_type(data.kind);
        item
    }
}

/// Persisted form of a [`TabItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabItemData {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_tab_label")]
    pub label: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_uri: Option<String>,
    #[serde(default)]
    pub kind: TabKind,
}

fn default_tab_label() -> String {
    DEFAULT_TAB_LABEL.to_string()
}

fn new_tab_id() -> String {
    Uuid::new_v4().to_string()
}

fn label_from_uri(uri: &str) -> String {
    let path = normalize_path(uri);
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_TAB_LABEL.to_string(),
    }
}
