//! Changes
//!
//! Pending admin edits. Each entry records one create, update or delete of an
//! article or an event; entries wait in the [`ChangesQueue`] until the admin
//! applies them in one batch.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub mod batch;
pub mod queue;

pub use batch::{BatchChange, BatchReport, EntryOutcome, ReportScope, ResourceBatch};
pub use queue::{ChangesQueue, QueueError};

/// Resource fields carried by a change.
pub type Payload = Map<String, Value>;

/// Locally generated change identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    /// Generate a new, time ordered id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChangeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Create a new resource
    Create,

    /// Update an existing resource
    Update,

    /// Delete an existing resource
    Delete,
}

impl ChangeKind {
    /// Whether the change addresses an existing resource.
    pub fn needs_target(self) -> bool {
        matches!(self, ChangeKind::Update | ChangeKind::Delete)
    }

    /// Whether the change carries resource fields.
    pub fn needs_payload(self) -> bool {
        matches!(self, ChangeKind::Create | ChangeKind::Update)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        })
    }
}

/// Unrecognised enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for ChangeKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(ChangeKind::Create),
            "update" => Ok(ChangeKind::Update),
            "delete" => Ok(ChangeKind::Delete),
            other => Err(ParseEnumError {
                kind: "change type",
                value: other.to_string(),
            }),
        }
    }
}

/// Kind of content being edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Catalog article. Entries stored without a resource are articles.
    #[default]
    Article,

    /// Event
    Event,
}

impl Resource {
    /// Every resource kind.
    pub const ALL: [Resource; 2] = [Resource::Article, Resource::Event];

    /// Collection name used in API paths.
    pub fn plural(self) -> &'static str {
        match self {
            Resource::Article => "articles",
            Resource::Event => "events",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Article => "article",
            Resource::Event => "event",
        })
    }
}

impl FromStr for Resource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" | "articles" => Ok(Resource::Article),
            "event" | "events" => Ok(Resource::Event),
            other => Err(ParseEnumError {
                kind: "resource",
                value: other.to_string(),
            }),
        }
    }
}

/// Identifier of a remote resource row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    /// Numeric id
    Number(u64),

    /// Negative numeric id, as some back-ends use for drafts
    Signed(i64),

    /// Text id
    Text(String),
}

impl ResourceId {
    /// Read an id out of a JSON value, if it holds one.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number
                .as_u64()
                .map(ResourceId::Number)
                .or_else(|| number.as_i64().map(ResourceId::Signed)),
            Value::String(text) if !text.is_empty() => Some(ResourceId::Text(text.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(id) => write!(f, "{id}"),
            ResourceId::Signed(id) => write!(f, "{id}"),
            ResourceId::Text(id) => f.write_str(id),
        }
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        if let Ok(id) = id.parse() {
            ResourceId::Number(id)
        } else if let Ok(id) = id.parse() {
            ResourceId::Signed(id)
        } else {
            ResourceId::Text(id.to_string())
        }
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        ResourceId::Number(id)
    }
}

/// A change about to be queued.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChange {
    /// Kind of mutation
    pub kind: ChangeKind,

    /// Resource being edited
    pub resource: Resource,

    /// Resource fields
    pub payload: Option<Payload>,

    /// Row being updated or deleted
    pub target_id: Option<ResourceId>,

    /// Where the change was queued from
    pub source: Option<String>,
}

impl NewChange {
    /// A create change.
    pub fn create(resource: Resource, payload: Payload) -> Self {
        Self {
            kind: ChangeKind::Create,
            resource,
            payload: Some(payload),
            target_id: None,
            source: None,
        }
    }

    /// An update change.
    pub fn update(resource: Resource, target_id: impl Into<ResourceId>, payload: Payload) -> Self {
        Self {
            kind: ChangeKind::Update,
            resource,
            payload: Some(payload),
            target_id: Some(target_id.into()),
            source: None,
        }
    }

    /// A delete change.
    pub fn delete(resource: Resource, target_id: impl Into<ResourceId>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            resource,
            payload: None,
            target_id: Some(target_id.into()),
            source: None,
        }
    }

    /// Tag the change with its origin.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A queued change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// Local id
    pub id: ChangeId,

    /// When the change was queued
    pub created_at: Timestamp,

    /// Kind of mutation
    #[serde(rename = "type")]
    pub kind: ChangeKind,

    /// Resource being edited
    #[serde(default)]
    pub resource: Resource,

    /// Resource fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,

    /// Row being updated or deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ResourceId>,

    /// Where the change was queued from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ChangeEntry {
    /// Stamp a new change with a fresh id and the current time.
    pub fn stamp(change: NewChange) -> Self {
        Self {
            id: ChangeId::generate(),
            created_at: Timestamp::now(),
            kind: change.kind,
            resource: change.resource,
            payload: change.payload,
            target_id: change.target_id,
            source: change.source,
        }
    }

    /// Row the change addresses: the explicit target, else the payload's `id`.
    pub fn target_id(&self) -> Option<ResourceId> {
        self.target_id.clone().or_else(|| {
            self.payload
                .as_ref()
                .and_then(|payload| payload.get("id"))
                .and_then(ResourceId::from_value)
        })
    }
}
