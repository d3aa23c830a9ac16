//! Role policy
//!
//! A static table: no database round trip, consulted before any gateway call.

use crate::model::{Operation, Role};

/// Whether `role` may perform `operation`.
pub fn authorize(role: Role, operation: Operation) -> bool {
    match role {
        Role::Admin => true,
        // Listed in full so a new operation has to be classified here.
        Role::Guest => match operation {
            Operation::GetAllTrainings | Operation::SearchTraining => true,
            Operation::CreateDatabase
            | Operation::CreateTable
            | Operation::AddTraining
            | Operation::DeleteTraining
            | Operation::UpdateTraining
            | Operation::ClearDatabase
            | Operation::DropDatabase
            | Operation::CreateUser => false,
        },
    }
}

/// Operations `role` may perform, in `Operation::ALL` order.
pub fn permitted(role: Role) -> Vec<Operation> {
    Operation::ALL
        .into_iter()
        .filter(|op| authorize(role, *op))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_may_do_everything() {
        for op in Operation::ALL {
            assert!(authorize(Role::Admin, op), "{op}");
        }
    }

    #[test]
    fn guest_is_read_only() {
        assert_eq!(
            permitted(Role::Guest),
            vec![Operation::GetAllTrainings, Operation::SearchTraining]
        );
    }

    #[test]
    fn guest_denied_mutations() {
        for op in [
            Operation::CreateDatabase,
            Operation::CreateTable,
            Operation::AddTraining,
            Operation::DeleteTraining,
            Operation::UpdateTraining,
            Operation::ClearDatabase,
            Operation::DropDatabase,
            Operation::CreateUser,
        ] {
            assert!(!authorize(Role::Guest, op), "{op}");
        }
    }
}
