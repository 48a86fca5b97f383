//! Pending changes persisted to disk and prepared for submission.

use battant::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use testresult::TestResult;

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

#[test]
fn queue_persists_newest_first() -> TestResult {
    let dir = TempDir::new()?;
    let storage = FileStorage::open(dir.path())?;

    let mut queue = ChangesQueue::load(&storage);
    let first = queue.add_change(NewChange::create(
        Resource::Article,
        payload(json!({ "name": "Casquette", "price": 25 })),
    ))?;
    let second = queue.add_change(NewChange::delete(Resource::Event, 7_u64))?;

    let raw = storage
        .get(CHANGES_STORAGE_KEY)?
        .ok_or("queue not persisted")?;
    let stored: Vec<ChangeEntry> = serde_json::from_str(&raw)?;

    assert_eq!(
        stored.iter().map(|entry| entry.id.clone()).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );

    Ok(())
}

#[test]
fn queue_written_by_the_web_front_end_loads() -> TestResult {
    let dir = TempDir::new()?;

    std::fs::write(
        dir.path().join("lmdb_changes_cart.json"),
        r#"[
            {"id": "lx2-b", "createdAt": "2024-05-02T09:00:00Z", "type": "delete", "resource": "event", "targetId": "evt-1"},
            {"id": "lx1-a", "createdAt": "2024-05-01T09:00:00Z", "type": "update", "payload": {"id": 4, "price": 12.5}}
        ]"#,
    )?;

    let queue = ChangesQueue::load(FileStorage::open(dir.path())?);

    assert_eq!(queue.len(), 2);

    let batches = prepare_batches(queue.entries());
    let resources: Vec<Resource> = batches.iter().map(|batch| batch.resource).collect();

    assert_eq!(resources, vec![Resource::Event, Resource::Article]);

    let article = batches.get(1).ok_or("missing article batch")?;

    assert_eq!(
        article.changes.first().and_then(|change| change.target_id.clone()),
        Some(ResourceId::Number(4))
    );

    Ok(())
}

#[test]
fn validated_changes_only_reach_the_queue() -> TestResult {
    let mut queue = ChangesQueue::load(MemoryStorage::new());

    let rejected = NewChange::create(
        Resource::Event,
        payload(json!({ "title": "Expo", "date": "bientôt" })),
    );
    let accepted = NewChange::create(
        Resource::Event,
        payload(json!({ "title": "Expo", "date": "2025-09-12" })),
    );

    for change in [rejected, accepted] {
        if validate_change(&change).is_ok() {
            queue.add_change(change)?;
        }
    }

    assert_eq!(queue.len(), 1);

    Ok(())
}

#[test]
fn results_map_back_to_queue_entries() -> TestResult {
    let mut queue = ChangesQueue::load(MemoryStorage::new());

    let older = queue.add_change(NewChange::update(
        Resource::Article,
        1_u64,
        payload(json!({ "price": 20 })),
    ))?;
    let newer = queue.add_change(NewChange::delete(Resource::Article, 2_u64))?;

    let batches = prepare_batches(queue.entries());
    let batch = batches.first().ok_or("no batch prepared")?;

    let response: BatchResponse = serde_json::from_value(json!({
        "results": [
            { "success": true },
            { "success": false, "message": "article 2 not found" },
        ]
    }))?;

    let mut report = BatchReport::new();
    report.extend(reduce_results(batch, &response.results));

    assert!(!report.is_success());
    assert_eq!(
        report.outcomes().first().map(|outcome| (&outcome.id, outcome.ok)),
        Some((&older.id, true))
    );
    assert_eq!(
        report
            .failures()
            .map(|outcome| (&outcome.id, outcome.msg.as_str()))
            .collect::<Vec<_>>(),
        vec![(&newer.id, "article 2 not found")]
    );

    Ok(())
}
