//! Training records as sent to and read back from the procedures

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{Price, ValidationError};

/// Placeholder shown for a NULL numeric or level column
pub const NOT_APPLICABLE: &str = "N/A";

/// Column order of every row set returned by the list/search procedures
pub const TRAINING_COLUMNS: [&str; 10] = [
    "id",
    "title",
    "date",
    "start_time",
    "duration",
    "max_participants",
    "current_participants",
    "difficulty_level",
    "trainer_name",
    "price",
];

/// Levels the schedule database accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Mixed,
    Beginner,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Mixed,
        DifficultyLevel::Beginner,
        DifficultyLevel::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Mixed => "mixed",
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DifficultyLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "difficulty level",
                value: s.to_owned(),
            })
    }
}

impl From<DifficultyLevel> for String {
    fn from(level: DifficultyLevel) -> Self {
        level.as_str().to_owned()
    }
}

/// Field values for `add_new_training` and `update_training_record`.
///
/// Participant counts and the level are deliberately unchecked here; the
/// procedure owns those rules and reports violations as codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTraining {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Interval text, e.g. `01:30:00` or `90 minutes`
    pub duration: String,
    pub max_participants: i32,
    pub current_participants: i32,
    pub difficulty_level: String,
    pub trainer_name: String,
    pub price: Price,
}

/// One decoded row of the trainings table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub id: i32,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration: Option<String>,
    pub max_participants: Option<i32>,
    pub current_participants: Option<i32>,
    pub difficulty_level: Option<String>,
    pub trainer_name: Option<String>,
    pub price: Option<Price>,
}

impl TrainingRow {
    /// Display cells in `TRAINING_COLUMNS` order.
    ///
    /// NULL numbers and levels render as `N/A`; a NULL price renders as `0.00`.
    pub fn cells(&self) -> [String; 10] {
        fn count(value: Option<i32>) -> String {
            value.map_or_else(|| NOT_APPLICABLE.to_owned(), |v| v.to_string())
        }

        [
            self.id.to_string(),
            self.title.clone(),
            self.date.to_string(),
            self.start_time.format("%H:%M:%S").to_string(),
            self.duration.clone().unwrap_or_default(),
            count(self.max_participants),
            count(self.current_participants),
            self.difficulty_level
                .clone()
                .unwrap_or_else(|| NOT_APPLICABLE.to_owned()),
            self.trainer_name.clone().unwrap_or_default(),
            self.price.unwrap_or(Price::ZERO).to_string(),
        ]
    }
}
