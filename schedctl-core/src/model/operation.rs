//! Closed set of operations a caller can request

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Operation names as exposed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    CreateDatabase,
    CreateTable,
    GetAllTrainings,
    AddTraining,
    SearchTraining,
    DeleteTraining,
    UpdateTraining,
    ClearDatabase,
    DropDatabase,
    CreateUser,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::CreateDatabase,
        Operation::CreateTable,
        Operation::GetAllTrainings,
        Operation::AddTraining,
        Operation::SearchTraining,
        Operation::DeleteTraining,
        Operation::UpdateTraining,
        Operation::ClearDatabase,
        Operation::DropDatabase,
        Operation::CreateUser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::CreateDatabase => "createDatabase",
            Operation::CreateTable => "createTable",
            Operation::GetAllTrainings => "getAllTrainings",
            Operation::AddTraining => "addTraining",
            Operation::SearchTraining => "searchTraining",
            Operation::DeleteTraining => "deleteTraining",
            Operation::UpdateTraining => "updateTraining",
            Operation::ClearDatabase => "clearDatabase",
            Operation::DropDatabase => "dropDatabase",
            Operation::CreateUser => "createUser",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "operation",
                value: s.to_owned(),
            })
    }
}
