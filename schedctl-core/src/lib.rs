//! schedctl-core: the training schedule access layer, minus the database
//!
//! Holds everything that decides *what* a call means:
//! - domain models (trainings, sessions, roles, operations)
//! - the role policy consulted before any database call
//! - the per-procedure code tables that turn integer codes into outcomes
//! - the gateway/authenticator traits and the `Scheduler` facade tying them together
//!
//! The PostgreSQL side lives in `schedctl-db`.

pub mod codes;
pub mod error;
pub mod gateway;
pub mod model;
pub mod policy;
pub mod scheduler;

pub use codes::{translate, Completion, Outcome, Procedure, Rejection};
pub use error::{Result, ScheduleError};
pub use gateway::{Authenticator, ProcedureGateway};
pub use model::{
    Credentials, DatabaseName, DifficultyLevel, NewTraining, NewUser, Operation, Price, Role,
    Secret, Session, TrainingRow, ValidationError,
};
pub use policy::authorize;
pub use scheduler::Scheduler;
