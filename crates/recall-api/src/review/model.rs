use chrono::{DateTime, Utc};
use recall_db::models::{ItemContent, ReviewItem};
use recall_srs::{InvalidQuality, Quality, days_overdue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// Body of a review submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSubmission {
    /// Expected to be an integer in `0..=5`; kept loose so that any other
    /// value, a missing one included, is reported as an invalid quality
    /// rather than a malformed body
    #[serde(default)]
    pub quality: Value,
    /// Telemetry only
    #[serde(default)]
    pub response_time_seconds: f64,
    /// Telemetry only
    #[serde(default)]
    pub hints_used: i32,
}

impl ReviewSubmission {
    pub fn new(quality: i64, response_time_seconds: f64, hints_used: i32) -> Self {
        Self {
            quality: Value::from(quality),
            response_time_seconds,
            hints_used,
        }
    }

    /// The validated quality rating.
    pub fn quality(&self) -> Result<Quality, InvalidQuality> {
        match &self.quality {
            Value::Number(n) => match n.as_i64() {
                Some(value) => Quality::try_from(value),
                None => n
                    .as_f64()
                    .ok_or_else(|| InvalidQuality(n.to_string()))
                    .and_then(Quality::try_from),
            },
            other => Err(InvalidQuality(other.to_string())),
        }
    }

    /// Check the telemetry fields are plausible. They do not affect scheduling.
    pub fn check_telemetry(&self) -> Result<(), String> {
        if !self.response_time_seconds.is_finite() || self.response_time_seconds < 0.0 {
            return Err(format!(
                "response_time_seconds must be a non-negative number, got {}",
                self.response_time_seconds
            ));
        }
        if self.hints_used < 0 {
            return Err(format!(
                "hints_used must not be negative, got {}",
                self.hints_used
            ));
        }
        Ok(())
    }
}

/// Result of a committed review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub item: ReviewItem,
    /// `quality >= 3`, for session tallies
    pub was_correct: bool,
}

/// Due-list entry. The answer is withheld until the item is revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueItem {
    pub item_id: Uuid,
    pub prompt: String,
    pub hint: Option<String>,
    pub tags: Vec<String>,
    pub days_overdue: i64,
}

impl DueItem {
    pub fn from_item(item: ReviewItem, as_of: DateTime<Utc>) -> Self {
        Self {
            days_overdue: days_overdue(item.next_review_at, as_of),
            item_id: item.id,
            prompt: item.prompt,
            hint: item.hint,
            tags: item.tags,
        }
    }
}

/// Aggregate view of a learner's schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub due_today: i64,
    pub due_this_week: i64,
    pub new_items: i64,
    pub total_reviews: i64,
    pub average_retention: f64,
}

#[derive(Debug, Deserialize)]
pub struct DueQuery {
    pub limit: Option<u32>,
}

/// Body of an item assignment from the content service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignItemRequest {
    pub item_id: Uuid,
    #[validate(length(min = 1, max = 4096))]
    pub prompt: String,
    #[validate(length(min = 1, max = 4096))]
    pub answer: String,
    #[validate(length(max = 1024))]
    pub hint: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub tags: Vec<String>,
}

impl AssignItemRequest {
    pub fn into_content(self) -> ItemContent {
        ItemContent {
            prompt: self.prompt,
            answer: self.answer,
            hint: self.hint,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(quality: Value) -> ReviewSubmission {
        ReviewSubmission {
            quality,
            response_time_seconds: 1.5,
            hints_used: 0,
        }
    }

    #[test]
    fn test_quality_parsing() {
        assert_eq!(submission(json!(3)).quality().unwrap().value(), 3);
        assert_eq!(submission(json!(4.0)).quality().unwrap().value(), 4);

        for bad in [json!(3.5), json!(6), json!(-1), json!("5"), json!(null), json!(u64::MAX)] {
            assert!(submission(bad.clone()).quality().is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_check_telemetry() {
        assert!(ReviewSubmission::new(4, 0.0, 0).check_telemetry().is_ok());
        assert!(ReviewSubmission::new(4, -1.0, 0).check_telemetry().is_err());
        assert!(ReviewSubmission::new(4, f64::NAN, 0).check_telemetry().is_err());
        assert!(ReviewSubmission::new(4, 3.0, -2).check_telemetry().is_err());
    }

    #[test]
    fn test_missing_quality_is_invalid() {
        let parsed: ReviewSubmission =
            serde_json::from_value(json!({ "response_time_seconds": 1.0 })).unwrap();
        assert!(parsed.quality.is_null());
        assert!(parsed.quality().is_err());
    }

    #[test]
    fn test_submission_defaults() {
        let parsed: ReviewSubmission = serde_json::from_value(json!({ "quality": 5 })).unwrap();
        assert_eq!(parsed.response_time_seconds, 0.0);
        assert_eq!(parsed.hints_used, 0);
    }

    #[test]
    fn test_due_item_hides_answer() {
        let now = Utc::now();
        let item = ReviewItem::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ItemContent {
                prompt: "hello".into(),
                answer: "hola".into(),
                hint: Some("greeting".into()),
                tags: vec![],
            },
            now,
        );

        let due = DueItem::from_item(item, now);
        assert_eq!(due.days_overdue, 0);
        let json = serde_json::to_value(&due).unwrap();
        assert!(json.get("answer").is_none());
        assert_eq!(json["hint"], "greeting");
    }
}
