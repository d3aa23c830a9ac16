//! Domain models with validation at construction
//!
//! Input types validate *syntax* only (non-empty names, parseable prices).
//! Business rules such as participant bounds or difficulty levels are left
//! to the stored procedures, whose answers come back as `Outcome`.

pub mod database;
pub mod operation;
pub mod price;
pub mod role;
pub mod session;
pub mod training;
pub mod validation;

pub use database::DatabaseName;
pub use operation::Operation;
pub use price::Price;
pub use role::Role;
pub use session::{Credentials, NewUser, Secret, Session};
pub use training::{DifficultyLevel, NewTraining, TrainingRow, NOT_APPLICABLE, TRAINING_COLUMNS};
pub use validation::ValidationError;
