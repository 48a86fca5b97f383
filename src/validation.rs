//! Validation
//!
//! Checks admin edits before they are queued. Every problem is collected so
//! the form can show them all at once; nothing is queued while any remain.

use std::fmt;

use jiff::{Timestamp, civil};
use serde_json::Value;
use url::Url;

use crate::changes::{ChangeKind, NewChange, Payload, Resource, ResourceId};

/// Event fields that must hold absolute web links.
const EVENT_LINK_FIELDS: [&str; 3] = ["link", "url", "ticketUrl"];

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Payload field name, or `targetId`
    pub field: String,

    /// What is wrong with it
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every problem found in a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// The individual problems.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` has a problem.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }

            write!(f, "{error}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Default)]
struct Collector(Vec<FieldError>);

impl Collector {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.0))
        }
    }
}

/// Validate a change before it is queued.
///
/// # Errors
///
/// Returns every problem found as [`ValidationErrors`].
pub fn validate_change(change: &NewChange) -> Result<(), ValidationErrors> {
    let mut errors = Collector::default();

    let payload_id = change
        .payload
        .as_ref()
        .and_then(|payload| payload.get("id"))
        .and_then(ResourceId::from_value);

    if change.kind.needs_target() && change.target_id.is_none() && payload_id.is_none() {
        errors.push("targetId", format!("a {} needs a target id", change.kind));
    }

    if change.kind.needs_payload() {
        match &change.payload {
            None => errors.push("payload", "resource fields are required"),
            Some(payload) => match change.resource {
                Resource::Event => check_event(payload, change.kind, &mut errors),
                Resource::Article => check_article(payload, change.kind, &mut errors),
            },
        }
    }

    errors.finish()
}

fn check_event(payload: &Payload, kind: ChangeKind, errors: &mut Collector) {
    let creating = kind == ChangeKind::Create;

    check_text(payload, "title", creating, errors);

    match payload.get("date") {
        None | Some(Value::Null) if creating => errors.push("date", "a date is required"),
        None | Some(Value::Null) => {}
        Some(Value::String(date)) if is_date(date) => {}
        Some(_) => errors.push("date", "must be a date such as 2025-06-21"),
    }

    for field in EVENT_LINK_FIELDS {
        match payload.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::String(link)) if link.is_empty() || is_web_url(link) => {}
            Some(_) => errors.push(field, "must be an absolute http(s) URL"),
        }
    }

    match payload.get("capacity") {
        None | Some(Value::Null) => {}
        Some(value) => match as_integer(value) {
            Some(capacity) if capacity >= 0 => {}
            Some(_) => errors.push("capacity", "must not be negative"),
            None => errors.push("capacity", "must be a whole number"),
        },
    }
}

fn check_article(payload: &Payload, kind: ChangeKind, errors: &mut Collector) {
    check_text(payload, "name", kind == ChangeKind::Create, errors);

    for field in ["price", "oldPrice"] {
        match payload.get(field) {
            None | Some(Value::Null) => {}
            Some(value) => match value.as_f64() {
                Some(amount) if amount >= 0.0 => {}
                Some(_) => errors.push(field, "must not be negative"),
                None => errors.push(field, "must be a number"),
            },
        }
    }

    match payload.get("discountPercent") {
        None | Some(Value::Null) => {}
        Some(value) => match value.as_f64() {
            Some(percent) if (0.0..=100.0).contains(&percent) => {}
            Some(_) => errors.push("discountPercent", "must be between 0 and 100"),
            None => errors.push("discountPercent", "must be a number"),
        },
    }
}

fn check_text(payload: &Payload, field: &str, required: bool, errors: &mut Collector) {
    match payload.get(field) {
        None | Some(Value::Null) if required => errors.push(field, "is required"),
        None | Some(Value::Null) => {}
        Some(Value::String(text)) if !text.trim().is_empty() => {}
        Some(Value::String(_)) => errors.push(field, "must not be blank"),
        Some(_) => errors.push(field, "must be text"),
    }
}

fn is_date(value: &str) -> bool {
    value.parse::<civil::Date>().is_ok()
        || value.parse::<civil::DateTime>().is_ok()
        || value.parse::<Timestamp>().is_ok()
}

fn is_web_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn valid_event_passes() {
        let change = NewChange::create(
            Resource::Event,
            payload(json!({
                "title": "Soirée de lancement",
                "date": "2025-06-21",
                "link": "https://billetterie.example.com/lancement",
                "capacity": 120,
            })),
        );

        assert_eq!(validate_change(&change), Ok(()));
    }

    #[test]
    fn event_problems_are_all_collected() {
        let change = NewChange::create(
            Resource::Event,
            payload(json!({
                "title": "  ",
                "date": "21/06/2025",
                "ticketUrl": "/billets",
                "capacity": -5,
            })),
        );

        let Err(errors) = validate_change(&change) else {
            unreachable!("invalid event passed validation");
        };

        assert_eq!(errors.errors().len(), 4);
        assert!(errors.has("title"));
        assert!(errors.has("date"));
        assert!(errors.has("ticketUrl"));
        assert!(errors.has("capacity"));
    }

    #[test]
    fn event_create_requires_title_and_date() {
        let change = NewChange::create(Resource::Event, Payload::new());

        let Err(errors) = validate_change(&change) else {
            unreachable!("empty event passed validation");
        };

        assert!(errors.has("title"));
        assert!(errors.has("date"));
    }

    #[test]
    fn event_update_may_omit_unchanged_fields() {
        let change = NewChange::update(
            Resource::Event,
            4_u64,
            payload(json!({ "capacity": "80", "date": "2025-07-01T19:30:00" })),
        );

        assert_eq!(validate_change(&change), Ok(()));
    }

    #[test]
    fn update_and_delete_need_a_target() {
        let update = NewChange {
            target_id: None,
            ..NewChange::update(Resource::Article, 1_u64, payload(json!({ "price": 10 })))
        };

        let delete = NewChange {
            target_id: None,
            ..NewChange::delete(Resource::Article, 1_u64)
        };

        assert!(validate_change(&update).is_err_and(|errors| errors.has("targetId")));
        assert!(validate_change(&delete).is_err_and(|errors| errors.has("targetId")));
    }

    #[test]
    fn payload_id_counts_as_target() {
        let update = NewChange {
            target_id: None,
            ..NewChange::update(
                Resource::Article,
                1_u64,
                payload(json!({ "id": 1, "price": 10 })),
            )
        };

        assert_eq!(validate_change(&update), Ok(()));
    }

    #[test]
    fn article_ranges_are_checked() {
        let change = NewChange::create(
            Resource::Article,
            payload(json!({ "name": "Casquette", "price": -1, "discountPercent": 140 })),
        );

        let Err(errors) = validate_change(&change) else {
            unreachable!("invalid article passed validation");
        };

        assert!(errors.has("price"));
        assert!(errors.has("discountPercent"));
        assert!(!errors.has("name"));
        assert_eq!(
            errors.to_string(),
            "price: must not be negative; discountPercent: must be between 0 and 100"
        );
    }

    #[test]
    fn delete_needs_no_payload() {
        assert_eq!(
            validate_change(&NewChange::delete(Resource::Event, "evt-1")),
            Ok(())
        );
    }
}
