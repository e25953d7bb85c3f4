use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_note_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub evaluator_id: Uuid,
    pub evaluated_id: Uuid,
    pub note: i16,
    pub comment: Option<String>,
    pub evaluation_type: EvaluationType,
    pub created_at: DateTime<Utc>,
}

/// The rating pool a review counts towards. A requester rates the driver
/// under `Driver`, a driver rates the requester under `Requester`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    Driver,
    Requester,
}

impl EvaluationType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Requester => "requester",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "driver" => Some(Self::Driver),
            "requester" => Some(Self::Requester),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

impl RatingSummary {
    /// Arithmetic mean rounded to one decimal place.
    pub fn from_notes(notes: &[i16]) -> Self {
        if notes.is_empty() {
            return Self {
                average: None,
                count: 0,
            };
        }

        let total: f64 = notes.iter().map(|&note| f64::from(note)).sum();
        let mean = total / notes.len() as f64;

        Self {
            average: Some((mean * 10.0).round() / 10.0),
            count: notes.len() as i64,
        }
    }
}

impl Review {
    pub fn new(
        ride_id: Uuid,
        evaluator_id: Uuid,
        evaluated_id: Uuid,
        evaluation_type: EvaluationType,
        note: i16,
        comment: Option<String>,
    ) -> Result<Self, Error> {
        if !(1..=5).contains(&note) {
            return Err(invalid_note_error());
        }

        let comment = comment
            .map(|comment| comment.trim().to_string())
            .filter(|comment| !comment.is_empty());

        Ok(Self {
            id: Uuid::new_v4(),
            ride_id,
            evaluator_id,
            evaluated_id,
            note,
            comment,
            evaluation_type,
            created_at: Utc::now(),
        })
    }
}

#[test]
fn rating_summary_rounds_to_one_decimal_test() {
    let summary = RatingSummary::from_notes(&[5, 4, 5]);

    assert_eq!(summary.average, Some(4.7));
    assert_eq!(summary.count, 3);

    let summary = RatingSummary::from_notes(&[4, 4, 5, 5]);
    assert_eq!(summary.average, Some(4.5));

    let summary = RatingSummary::from_notes(&[1, 2, 2]);
    assert_eq!(summary.average, Some(1.7));
}

#[test]
fn rating_summary_of_nothing_test() {
    let summary = RatingSummary::from_notes(&[]);

    assert_eq!(summary.average, None);
    assert_eq!(summary.count, 0);
}

#[test]
fn note_must_be_within_range_test() {
    let ride_id = Uuid::new_v4();

    for note in [0, 6, -1] {
        let result = Review::new(
            ride_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            EvaluationType::Driver,
            note,
            None,
        );
        assert_eq!(result.unwrap_err(), invalid_note_error());
    }

    let review = Review::new(
        ride_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        EvaluationType::Requester,
        5,
        Some("  ".into()),
    )
    .unwrap();
    assert_eq!(review.comment, None);
}

#[test]
fn evaluation_type_name_test() {
    for evaluation_type in [EvaluationType::Driver, EvaluationType::Requester] {
        assert_eq!(
            EvaluationType::from_name(evaluation_type.name()),
            Some(evaluation_type)
        );
    }

    assert_eq!(EvaluationType::from_name("admin"), None);
}
