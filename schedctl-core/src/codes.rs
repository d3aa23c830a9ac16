//! Procedure return codes and the outcomes they stand for
//!
//! Codes are not uniform: `-1` from `create_table` means the table already
//! exists, from every other procedure it means the table is missing. Each
//! procedure therefore has its own admitted set, expressed as one match on
//! `(Procedure, code)`. A code outside that set is an error, never a guess.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, ScheduleError};
use crate::model::{Operation, TrainingRow};

/// Stored procedures the gateway can invoke
///
/// Each variant lists the outcomes it can produce; anything else from
/// `translate` is `ScheduleError::UnexpectedCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Procedure {
    /// `Completed(DatabaseCreated)`; returns no code
    CreateDatabase,
    /// `Completed(TableCreated)`, `Rejected` -1 (already exists) or -2
    CreateTable,
    /// `Completed(DatabaseDropped)` on 1, `Rejected` -2
    DropDatabase,
    /// `Completed(UserCreated)`, `Rejected` -2, -11, -12, -13
    CreateUser,
    /// `Affected`, `Rejected` -1 or -2
    ClearDatabase,
    /// `Created`, `Rejected` -1 to -6
    AddNewTraining,
    /// `Rows` or `NoMatches` through `search_outcome`; returns no code
    SearchTrainingByField,
    /// `Affected`, `NotFound`, `Rejected` -1, -2, -7, -8
    DeleteTrainingsByField,
    /// `Affected`, `NotFound`, `Rejected` -1, -2, -7, -9, -10
    UpdateTrainingField,
    /// `Affected`, `NotFound`, `Rejected` -1, -2, -9, -10
    UpdateTrainingRecord,
    /// `Rows` through `list_outcome`; returns no code
    GetAllTrainings,
}

impl Procedure {
    /// Name as declared in the database
    pub fn name(self) -> &'static str {
        match self {
            Procedure::CreateDatabase => "create_database",
            Procedure::CreateTable => "create_table",
            Procedure::DropDatabase => "drop_database",
            Procedure::CreateUser => "create_user",
            Procedure::ClearDatabase => "clear_database",
            Procedure::AddNewTraining => "add_new_training",
            Procedure::SearchTrainingByField => "search_training_by_field",
            Procedure::DeleteTrainingsByField => "delete_trainings_by_field",
            Procedure::UpdateTrainingField => "update_training_field",
            Procedure::UpdateTrainingRecord => "update_training_record",
            Procedure::GetAllTrainings => "get_all_trainings",
        }
    }

    /// Operation a caller must be authorized for to reach this procedure
    pub fn operation(self) -> Operation {
        match self {
            Procedure::CreateDatabase => Operation::CreateDatabase,
            Procedure::CreateTable => Operation::CreateTable,
            Procedure::DropDatabase => Operation::DropDatabase,
            Procedure::CreateUser => Operation::CreateUser,
            Procedure::ClearDatabase => Operation::ClearDatabase,
            Procedure::AddNewTraining => Operation::AddTraining,
            Procedure::SearchTrainingByField => Operation::SearchTraining,
            Procedure::DeleteTrainingsByField => Operation::DeleteTraining,
            Procedure::UpdateTrainingField | Procedure::UpdateTrainingRecord => {
                Operation::UpdateTraining
            }
            Procedure::GetAllTrainings => Operation::GetAllTrainings,
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Business rule a procedure reported as violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TableMissing,
    TableAlreadyExists,
    DatabaseMissing,
    MaxParticipantsNotPositive,
    CurrentParticipantsNegative,
    InvalidDifficultyLevel,
    TrainerConflict,
    UnknownField,
    EmptyDeleteValue,
    InvalidId,
    NothingToUpdate,
    InvalidRole,
    UserNotCreated,
    UserAlreadyExists,
}

impl Rejection {
    /// The code the procedure returned
    pub fn code(self) -> i32 {
        match self {
            Rejection::TableMissing | Rejection::TableAlreadyExists => -1,
            Rejection::DatabaseMissing => -2,
            Rejection::MaxParticipantsNotPositive => -3,
            Rejection::CurrentParticipantsNegative => -4,
            Rejection::InvalidDifficultyLevel => -5,
            Rejection::TrainerConflict => -6,
            Rejection::UnknownField => -7,
            Rejection::EmptyDeleteValue => -8,
            Rejection::InvalidId => -9,
            Rejection::NothingToUpdate => -10,
            Rejection::InvalidRole => -11,
            Rejection::UserNotCreated => -12,
            Rejection::UserAlreadyExists => -13,
        }
    }

    /// Rejections caused by existing state rather than bad input
    pub fn is_conflict(self) -> bool {
        matches!(
            self,
            Rejection::TrainerConflict | Rejection::UserAlreadyExists | Rejection::TableAlreadyExists
        )
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::TableMissing => "trainings table does not exist",
            Rejection::TableAlreadyExists => "trainings table already exists",
            Rejection::DatabaseMissing => "target database does not exist",
            Rejection::MaxParticipantsNotPositive => "max participants must be positive",
            Rejection::CurrentParticipantsNegative => "current participants must not be negative",
            Rejection::InvalidDifficultyLevel => {
                "difficulty level must be one of mixed, beginner, advanced"
            }
            Rejection::TrainerConflict => "trainer already has a session in that time slot",
            Rejection::UnknownField => "field does not exist or is not a text column",
            Rejection::EmptyDeleteValue => "value to delete by must not be empty",
            Rejection::InvalidId => "invalid training id",
            Rejection::NothingToUpdate => "nothing to update",
            Rejection::InvalidRole => "role must be admin or guest",
            Rejection::UserNotCreated => "user was not created",
            Rejection::UserAlreadyExists => "user already exists",
        };
        f.write_str(text)
    }
}

/// Administrative step that finished without a count or id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    DatabaseCreated,
    TableCreated,
    DatabaseDropped,
    UserCreated,
}

/// Result of a gateway call that reached the database and got an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// `add_new_training` assigned this id
    Created { id: i32 },
    /// Rows deleted, updated or cleared
    Affected { count: i32 },
    Completed { completion: Completion },
    Rows { rows: Vec<TrainingRow> },
    /// A search matched nothing; distinct from an empty listing
    NoMatches { field: String, value: String },
    /// Update or delete addressed no existing row
    NotFound,
    Rejected { rejection: Rejection },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::NotFound | Outcome::Rejected { .. } | Outcome::NoMatches { .. })
    }
}

/// Procedure-specific meaning of a negative code
fn rejection(procedure: Procedure, code: i32) -> Option<Rejection> {
    use Procedure::*;
    use Rejection::*;

    let rejection = match (procedure, code) {
        (CreateTable, -1) => TableAlreadyExists,
        (
            ClearDatabase | AddNewTraining | UpdateTrainingField | UpdateTrainingRecord
            | DeleteTrainingsByField,
            -1,
        ) => TableMissing,
        (
            CreateTable | DropDatabase | ClearDatabase | AddNewTraining | UpdateTrainingField
            | UpdateTrainingRecord | DeleteTrainingsByField | CreateUser,
            -2,
        ) => DatabaseMissing,
        (AddNewTraining, -3) => MaxParticipantsNotPositive,
        (AddNewTraining, -4) => CurrentParticipantsNegative,
        (AddNewTraining, -5) => InvalidDifficultyLevel,
        (AddNewTraining, -6) => TrainerConflict,
        (DeleteTrainingsByField | UpdateTrainingField, -7) => UnknownField,
        (DeleteTrainingsByField, -8) => EmptyDeleteValue,
        (UpdateTrainingField | UpdateTrainingRecord, -9) => InvalidId,
        (UpdateTrainingField | UpdateTrainingRecord, -10) => NothingToUpdate,
        (CreateUser, -11) => InvalidRole,
        (CreateUser, -12) => UserNotCreated,
        (CreateUser, -13) => UserAlreadyExists,
        _ => return None,
    };
    Some(rejection)
}

/// Translate the integer a procedure returned into an `Outcome`.
///
/// Row-set procedures (`get_all_trainings`, `search_training_by_field`) and
/// `create_database` never return codes; see `list_outcome` and
/// `search_outcome` for the former.
pub fn translate(procedure: Procedure, code: i32) -> Result<Outcome> {
    use Procedure::*;

    if let Some(rejection) = rejection(procedure, code) {
        return Ok(Outcome::Rejected { rejection });
    }

    let outcome = match (procedure, code) {
        (AddNewTraining, id) if id > 0 => Outcome::Created { id },
        (DeleteTrainingsByField | UpdateTrainingField | UpdateTrainingRecord, 0) => Outcome::NotFound,
        (DeleteTrainingsByField | UpdateTrainingField | UpdateTrainingRecord | ClearDatabase, n)
            if n > 0 =>
        {
            Outcome::Affected { count: n }
        }
        (ClearDatabase, 0) => Outcome::Affected { count: 0 },
        (DropDatabase, 1) => Outcome::Completed {
            completion: Completion::DatabaseDropped,
        },
        (CreateTable, n) if n >= 0 => Outcome::Completed {
            completion: Completion::TableCreated,
        },
        (CreateUser, n) if n >= 0 => Outcome::Completed {
            completion: Completion::UserCreated,
        },
        _ => {
            return Err(ScheduleError::UnexpectedCode {
                procedure: procedure.name(),
                code,
            })
        }
    };
    Ok(outcome)
}

/// Outcome for a listing: an empty table is still a successful listing.
pub fn list_outcome(rows: Vec<TrainingRow>) -> Outcome {
    Outcome::Rows { rows }
}

/// Outcome for a search: no rows becomes the `NoMatches` sentinel.
pub fn search_outcome(field: &str, value: &str, rows: Vec<TrainingRow>) -> Outcome {
    if rows.is_empty() {
        Outcome::NoMatches {
            field: field.to_owned(),
            value: value.to_owned(),
        }
    } else {
        Outcome::Rows { rows }
    }
}
