//! Batch
//!
//! Turns the queue into one request per resource and folds the per-change
//! results back into a report.
//!
//! The queue is stored newest first. Each resource group is reversed so the
//! server replays changes in the order the admin made them, and the source
//! entry ids are kept alongside so results (which are positional) can be
//! matched back to entries.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::changes::{ChangeEntry, ChangeId, ChangeKind, Payload, Resource, ResourceId};

/// Id used for the synthetic record reporting an aborted batch.
pub const GLOBAL_OUTCOME_ID: &str = "global";

/// Message used when the server gives none for a successful change.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "applied";

/// Message used when the server gives none for a failed change.
pub const DEFAULT_FAILURE_MESSAGE: &str = "failed";

/// Message used when the server returned fewer results than changes.
pub const MISSING_RESULT_MESSAGE: &str = "no result returned for this change";

/// One change as sent to a batch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchChange {
    /// Kind of mutation
    #[serde(rename = "type")]
    pub kind: ChangeKind,

    /// Resource fields
    pub payload: Option<Payload>,

    /// Row being updated or deleted
    pub target_id: Option<ResourceId>,
}

impl From<&ChangeEntry> for BatchChange {
    fn from(entry: &ChangeEntry) -> Self {
        Self {
            kind: entry.kind,
            payload: entry.payload.clone(),
            target_id: entry.target_id(),
        }
    }
}

/// All queued changes for one resource, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBatch {
    /// Resource the changes apply to
    pub resource: Resource,

    /// Queue entry ids, positionally aligned with `changes`
    pub entry_ids: Vec<ChangeId>,

    /// Changes to send
    pub changes: Vec<BatchChange>,
}

impl ResourceBatch {
    /// Number of changes in the batch.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the batch holds no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Group `entries` (newest first) into one batch per resource.
///
/// Groups appear in the order their resource first shows up in `entries`;
/// within a group changes are oldest first.
pub fn prepare_batches(entries: &[ChangeEntry]) -> SmallVec<[ResourceBatch; 2]> {
    let mut batches: SmallVec<[ResourceBatch; 2]> = SmallVec::new();

    for entry in entries.iter().rev() {
        let idx = match batches
            .iter()
            .position(|batch| batch.resource == entry.resource)
        {
            Some(idx) => idx,
            None => {
                batches.push(ResourceBatch {
                    resource: entry.resource,
                    entry_ids: Vec::new(),
                    changes: Vec::new(),
                });

                batches.len() - 1
            }
        };

        let Some(batch) = batches.get_mut(idx) else {
            continue;
        };

        batch.entry_ids.push(entry.id.clone());
        batch.changes.push(BatchChange::from(entry));
    }

    // Walking oldest first discovers resources in reverse; restore the order
    // in which they first appear in the stored queue.
    let first_seen = |resource: Resource| {
        entries
            .iter()
            .position(|entry| entry.resource == resource)
            .unwrap_or(usize::MAX)
    };

    batches.sort_by_key(|batch| first_seen(batch.resource));

    batches
}

/// Outcome of one change as reported by a batch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeResult {
    /// Whether the change was applied
    pub success: bool,

    /// Server message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body returned by a batch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Results, positionally aligned with the submitted changes
    pub results: Vec<ChangeResult>,
}

/// What a report line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportScope {
    /// Articles
    Article,

    /// Events
    Event,

    /// The batch as a whole
    Global,
}

impl From<Resource> for ReportScope {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Article => ReportScope::Article,
            Resource::Event => ReportScope::Event,
        }
    }
}

/// Result of applying one queued change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome {
    /// Queue entry id
    pub id: ChangeId,

    /// Whether the change was applied
    pub ok: bool,

    /// Message to show the admin
    pub msg: String,

    /// Resource the change belonged to
    pub resource: ReportScope,
}

/// Match positional `results` back to the entries of `batch`.
///
/// Entries without a result are reported as failed; surplus results are
/// ignored.
pub fn reduce_results(batch: &ResourceBatch, results: &[ChangeResult]) -> Vec<EntryOutcome> {
    batch
        .entry_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            let (ok, msg) = match results.get(idx) {
                Some(result) => (
                    result.success,
                    result
                        .message
                        .clone()
                        .filter(|message| !message.is_empty())
                        .unwrap_or_else(|| {
                            if result.success {
                                DEFAULT_SUCCESS_MESSAGE
                            } else {
                                DEFAULT_FAILURE_MESSAGE
                            }
                            .to_string()
                        }),
                ),
                None => (false, MISSING_RESULT_MESSAGE.to_string()),
            };

            EntryOutcome {
                id: id.clone(),
                ok,
                msg,
                resource: batch.resource.into(),
            }
        })
        .collect()
}

/// Outcome of applying the whole queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    outcomes: Vec<EntryOutcome>,
}

impl BatchReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// A report holding only the synthetic failure for an aborted batch.
    pub fn global_failure(msg: impl Into<String>) -> Self {
        Self {
            outcomes: vec![EntryOutcome {
                id: ChangeId::from(GLOBAL_OUTCOME_ID),
                ok: false,
                msg: msg.into(),
                resource: ReportScope::Global,
            }],
        }
    }

    /// Append outcomes.
    pub fn extend(&mut self, outcomes: impl IntoIterator<Item = EntryOutcome>) {
        self.outcomes.extend(outcomes);
    }

    /// Whether every change was applied. An empty report is not a success.
    pub fn is_success(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|outcome| outcome.ok)
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.ok)
    }

    /// Every outcome, in application order.
    pub fn outcomes(&self) -> &[EntryOutcome] {
        &self.outcomes
    }

    /// Whether the report has no outcomes.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn entry(id: &str, kind: ChangeKind, resource: Resource, target: Option<u64>) -> ChangeEntry {
        ChangeEntry {
            id: ChangeId::from(id),
            created_at: Timestamp::UNIX_EPOCH,
            kind,
            resource,
            payload: None,
            target_id: target.map(ResourceId::Number),
            source: None,
        }
    }

    fn ids(batch: &ResourceBatch) -> Vec<&str> {
        batch.entry_ids.iter().map(ChangeId::as_str).collect()
    }

    fn ok(message: Option<&str>) -> ChangeResult {
        ChangeResult {
            success: true,
            message: message.map(str::to_string),
        }
    }

    fn failed(message: Option<&str>) -> ChangeResult {
        ChangeResult {
            success: false,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn single_resource_batch_replays_oldest_first() -> TestResult {
        // Stored newest first: C was queued last, A first.
        let stored = [
            entry("c", ChangeKind::Delete, Resource::Article, Some(3)),
            entry("b", ChangeKind::Update, Resource::Article, Some(2)),
            entry("a", ChangeKind::Create, Resource::Article, None),
        ];

        let batches = prepare_batches(&stored);

        assert_eq!(batches.len(), 1);

        let batch = batches.first().ok_or("missing batch")?;
        let kinds: Vec<_> = batch.changes.iter().map(|change| change.kind).collect();

        assert_eq!(ids(batch), ["a", "b", "c"]);
        assert_eq!(
            kinds,
            [ChangeKind::Create, ChangeKind::Update, ChangeKind::Delete]
        );
        assert_eq!(
            batch.changes.get(2).and_then(|c| c.target_id.clone()),
            Some(ResourceId::Number(3))
        );

        Ok(())
    }

    #[test]
    fn batches_partition_by_resource_in_first_seen_order() -> TestResult {
        let stored = [
            entry("e2", ChangeKind::Update, Resource::Event, Some(9)),
            entry("a1", ChangeKind::Delete, Resource::Article, Some(1)),
            entry("e1", ChangeKind::Create, Resource::Event, None),
        ];

        let batches = prepare_batches(&stored);
        let resources: Vec<_> = batches.iter().map(|batch| batch.resource).collect();

        assert_eq!(resources, [Resource::Event, Resource::Article]);
        assert_eq!(ids(batches.first().ok_or("missing events")?), ["e1", "e2"]);
        assert_eq!(ids(batches.get(1).ok_or("missing articles")?), ["a1"]);

        Ok(())
    }

    #[test]
    fn batch_change_takes_target_from_payload() -> TestResult {
        let mut stored = entry("a", ChangeKind::Update, Resource::Article, None);
        stored.payload = json!({ "id": 5, "name": "Tote" }).as_object().cloned();

        let change = BatchChange::from(&stored);

        assert_eq!(change.target_id, Some(ResourceId::Number(5)));
        assert_eq!(
            serde_json::to_value(&change)?,
            json!({ "type": "update", "payload": { "id": 5, "name": "Tote" }, "targetId": 5 })
        );

        Ok(())
    }

    #[test]
    fn empty_queue_prepares_nothing() {
        assert!(prepare_batches(&[]).is_empty());
    }

    #[test]
    fn partial_failure_is_reported_per_entry() -> TestResult {
        let stored = [
            entry("c", ChangeKind::Delete, Resource::Event, Some(3)),
            entry("b", ChangeKind::Update, Resource::Event, Some(2)),
            entry("a", ChangeKind::Create, Resource::Event, None),
        ];

        let batches = prepare_batches(&stored);
        let batch = batches.first().ok_or("missing batch")?;

        let outcomes = reduce_results(
            batch,
            &[ok(None), failed(Some("date invalide")), ok(Some("supprimé"))],
        );

        let mut report = BatchReport::new();
        report.extend(outcomes);

        let summary: Vec<_> = report
            .outcomes()
            .iter()
            .map(|o| (o.id.as_str(), o.ok, o.msg.as_str()))
            .collect();

        assert_eq!(
            summary,
            [
                ("a", true, DEFAULT_SUCCESS_MESSAGE),
                ("b", false, "date invalide"),
                ("c", true, "supprimé"),
            ]
        );
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);

        Ok(())
    }

    #[test]
    fn missing_results_count_as_failures() -> TestResult {
        let stored = [
            entry("b", ChangeKind::Delete, Resource::Article, Some(2)),
            entry("a", ChangeKind::Delete, Resource::Article, Some(1)),
        ];

        let batches = prepare_batches(&stored);
        let batch = batches.first().ok_or("missing batch")?;

        let outcomes = reduce_results(batch, &[ok(None)]);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            outcomes.get(1).map(|o| (o.ok, o.msg.as_str())),
            Some((false, MISSING_RESULT_MESSAGE))
        );

        Ok(())
    }

    #[test]
    fn failure_without_message_uses_fallback() -> TestResult {
        let stored = [entry("a", ChangeKind::Delete, Resource::Article, Some(1))];
        let batches = prepare_batches(&stored);
        let batch = batches.first().ok_or("missing batch")?;

        let outcomes = reduce_results(batch, &[failed(None)]);

        assert_eq!(
            outcomes.first().map(|o| o.msg.as_str()),
            Some(DEFAULT_FAILURE_MESSAGE)
        );

        Ok(())
    }

    #[test]
    fn empty_messages_use_fallback() -> TestResult {
        let stored = [
            entry("b", ChangeKind::Delete, Resource::Article, Some(2)),
            entry("a", ChangeKind::Delete, Resource::Article, Some(1)),
        ];
        let batches = prepare_batches(&stored);
        let batch = batches.first().ok_or("missing batch")?;

        let outcomes = reduce_results(batch, &[failed(Some("")), ok(Some(""))]);

        assert_eq!(
            outcomes.first().map(|o| o.msg.as_str()),
            Some(DEFAULT_FAILURE_MESSAGE)
        );
        assert_eq!(
            outcomes.get(1).map(|o| o.msg.as_str()),
            Some(DEFAULT_SUCCESS_MESSAGE)
        );

        Ok(())
    }

    #[test]
    fn global_failure_is_a_single_record() {
        let report = BatchReport::global_failure("connection refused");

        assert_eq!(
            report.outcomes(),
            [EntryOutcome {
                id: ChangeId::from(GLOBAL_OUTCOME_ID),
                ok: false,
                msg: "connection refused".to_string(),
                resource: ReportScope::Global,
            }]
        );
        assert!(!report.is_success());
    }

    #[test]
    fn all_ok_report_is_success() {
        let mut report = BatchReport::new();

        assert!(!report.is_success());

        report.extend([EntryOutcome {
            id: ChangeId::from("a"),
            ok: true,
            msg: DEFAULT_SUCCESS_MESSAGE.to_string(),
            resource: ReportScope::Article,
        }]);

        assert!(report.is_success());
    }

    #[test]
    fn batch_response_accepts_results_without_messages() -> TestResult {
        let response: BatchResponse = serde_json::from_value(json!({
            "results": [{ "success": true }, { "success": false, "message": "not found" }]
        }))?;

        assert_eq!(response.results, [ok(None), failed(Some("not found"))]);

        Ok(())
    }
}
