//! Seams to the database: the procedure gateway and the credentials lookup
//!
//! `schedctl-db` provides the PostgreSQL implementations. Tests substitute
//! in-memory doubles.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::codes::{Outcome, Procedure};
use crate::error::Result;
use crate::model::{Credentials, DatabaseName, NewTraining, NewUser, Role};

/// One method per stored procedure.
///
/// Every call connects as `acting`, never as a shared superuser. Implementations
/// open and release their own connection per call and perform no retries.
#[async_trait]
pub trait ProcedureGateway: Send + Sync {
    /// `create_database(name)`; the procedure reports nothing back
    async fn create_database(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome>;

    async fn create_table(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome>;

    async fn drop_database(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome>;

    async fn clear_database(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome>;

    async fn create_user(&self, acting: &Credentials, user: &NewUser) -> Result<Outcome>;

    async fn add_training(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        training: &NewTraining,
    ) -> Result<Outcome>;

    /// Rows whose text column `field` equals `value`, or `Outcome::NoMatches`
    async fn search_trainings(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        field: &str,
        value: &str,
    ) -> Result<Outcome>;

    async fn delete_trainings(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        field: &str,
        value: &str,
    ) -> Result<Outcome>;

    async fn update_training_field(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        id: i32,
        field: &str,
        value: &str,
    ) -> Result<Outcome>;

    async fn update_training_record(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        id: i32,
        training: &NewTraining,
    ) -> Result<Outcome>;

    async fn list_trainings(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome>;
}

/// Resolves a role for a username/password pair.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Ok(None)` when no credentials row matches. Failing to reach the store
    /// is an error, never `None`.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Role>>;
}

/// Mock gateway for testing
///
/// Records which procedure each call targeted and answers from a queue of
/// scripted outcomes (`Outcome::NotFound` once the queue is empty).
#[derive(Default)]
pub struct MockGateway {
    responses: Mutex<VecDeque<Result<Outcome>>>,
    calls: Mutex<Vec<(Procedure, String)>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next call
    pub fn add_response(&self, response: Result<Outcome>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Procedures invoked so far, in order
    pub fn calls(&self) -> Vec<Procedure> {
        self.calls.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Username each call connected as, in order
    pub fn acting_users(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, u)| u.clone()).collect()
    }

    fn answer(&self, procedure: Procedure, acting: &Credentials) -> Result<Outcome> {
        self.calls
            .lock()
            .unwrap()
            .push((procedure, acting.username().to_owned()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Outcome::NotFound))
    }
}

#[async_trait]
impl ProcedureGateway for MockGateway {
    async fn create_database(&self, acting: &Credentials, _: &DatabaseName) -> Result<Outcome> {
        self.answer(Procedure::CreateDatabase, acting)
    }

    async fn create_table(&self, acting: &Credentials, _: &DatabaseName) -> Result<Outcome> {
        self.answer(Procedure::CreateTable, acting)
    }

    async fn drop_database(&self, acting: &Credentials, _: &DatabaseName) -> Result<Outcome> {
        self.answer(Procedure::DropDatabase, acting)
    }

    async fn clear_database(&self, acting: &Credentials, _: &DatabaseName) -> Result<Outcome> {
        self.answer(Procedure::ClearDatabase, acting)
    }

    async fn create_user(&self, acting: &Credentials, _: &NewUser) -> Result<Outcome> {
        self.answer(Procedure::CreateUser, acting)
    }

    async fn add_training(
        &self,
        acting: &Credentials,
        _: &DatabaseName,
        _: &NewTraining,
    ) -> Result<Outcome> {
        self.answer(Procedure::AddNewTraining, acting)
    }

    async fn search_trainings(
        &self,
        acting: &Credentials,
        _: &DatabaseName,
        _: &str,
        _: &str,
    ) -> Result<Outcome> {
        self.answer(Procedure::SearchTrainingByField, acting)
    }

    async fn delete_trainings(
        &self,
        acting: &Credentials,
        _: &DatabaseName,
        _: &str,
        _: &str,
    ) -> Result<Outcome> {
        self.answer(Procedure::DeleteTrainingsByField, acting)
    }

    async fn update_training_field(
        &self,
        acting: &Credentials,
        _: &DatabaseName,
        _: i32,
        _: &str,
        _: &str,
    ) -> Result<Outcome> {
        self.answer(Procedure::UpdateTrainingField, acting)
    }

    async fn update_training_record(
        &self,
        acting: &Credentials,
        _: &DatabaseName,
        _: i32,
        _: &NewTraining,
    ) -> Result<Outcome> {
        self.answer(Procedure::UpdateTrainingRecord, acting)
    }

    async fn list_trainings(&self, acting: &Credentials, _: &DatabaseName) -> Result<Outcome> {
        self.answer(Procedure::GetAllTrainings, acting)
    }
}

/// In-memory credentials store for testing
#[derive(Default)]
pub struct StaticAuthenticator {
    users: HashMap<(String, String), Role>,
    lookups: Mutex<usize>,
}

impl StaticAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: &str, password: &str, role: Role) -> Self {
        self.users
            .insert((username.to_owned(), password.to_owned()), role);
        self
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Role>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self
            .users
            .get(&(username.to_owned(), password.to_owned()))
            .copied())
    }
}
