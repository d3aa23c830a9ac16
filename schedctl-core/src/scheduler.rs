//! Scheduler facade
//!
//! Request path: authenticate → authorize → gateway → translated outcome.
//! Authorization is decided from the session alone, so a denied request never
//! reaches the gateway.

use tracing::{debug, error, info, warn};

use crate::codes::Outcome;
use crate::error::{Result, ScheduleError};
use crate::gateway::{Authenticator, ProcedureGateway};
use crate::model::{Credentials, DatabaseName, NewTraining, NewUser, Operation, Session};
use crate::policy;

pub struct Scheduler<G, A> {
    gateway: G,
    authenticator: A,
    target: DatabaseName,
}

impl<G, A> Scheduler<G, A>
where
    G: ProcedureGateway,
    A: Authenticator,
{
    pub fn new(gateway: G, authenticator: A, target: DatabaseName) -> Self {
        Self {
            gateway,
            authenticator,
            target,
        }
    }

    /// Database every business procedure is pointed at
    pub fn target(&self) -> &DatabaseName {
        &self.target
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Resolve a session for the pair, or `AuthenticationFailed`.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        match self.authenticator.authenticate(username, password).await? {
            Some(role) => {
                info!(user = username, %role, "login succeeded");
                Ok(Session::establish(Credentials::new(username, password), role))
            }
            None => {
                warn!(user = username, "login failed: no matching credentials");
                Err(ScheduleError::AuthenticationFailed {
                    username: username.to_owned(),
                })
            }
        }
    }

    fn authorize(&self, session: &Session, operation: Operation) -> Result<()> {
        if policy::authorize(session.role(), operation) {
            debug!(user = session.username(), %operation, "authorized");
            Ok(())
        } else {
            warn!(user = session.username(), role = %session.role(), %operation, "denied");
            Err(ScheduleError::AuthorizationDenied {
                role: session.role(),
                operation,
            })
        }
    }

    pub async fn create_database(&self, session: &Session) -> Result<Outcome> {
        self.authorize(session, Operation::CreateDatabase)?;
        let outcome = self
            .gateway
            .create_database(session.credentials(), &self.target)
            .await;
        report(Operation::CreateDatabase, outcome)
    }

    pub async fn create_table(&self, session: &Session) -> Result<Outcome> {
        self.authorize(session, Operation::CreateTable)?;
        let outcome = self
            .gateway
            .create_table(session.credentials(), &self.target)
            .await;
        report(Operation::CreateTable, outcome)
    }

    pub async fn get_all_trainings(&self, session: &Session) -> Result<Outcome> {
        self.authorize(session, Operation::GetAllTrainings)?;
        let outcome = self
            .gateway
            .list_trainings(session.credentials(), &self.target)
            .await;
        report(Operation::GetAllTrainings, outcome)
    }

    pub async fn add_training(&self, session: &Session, training: &NewTraining) -> Result<Outcome> {
        self.authorize(session, Operation::AddTraining)?;
        let outcome = self
            .gateway
            .add_training(session.credentials(), &self.target, training)
            .await;
        report(Operation::AddTraining, outcome)
    }

    pub async fn search_training(
        &self,
        session: &Session,
        field: &str,
        value: &str,
    ) -> Result<Outcome> {
        self.authorize(session, Operation::SearchTraining)?;
        let outcome = self
            .gateway
            .search_trainings(session.credentials(), &self.target, field, value)
            .await;
        report(Operation::SearchTraining, outcome)
    }

    /// Delete every training whose text column `field` equals `value`.
    pub async fn delete_training(
        &self,
        session: &Session,
        field: &str,
        value: &str,
    ) -> Result<Outcome> {
        self.authorize(session, Operation::DeleteTraining)?;
        let outcome = self
            .gateway
            .delete_trainings(session.credentials(), &self.target, field, value)
            .await;
        report(Operation::DeleteTraining, outcome)
    }

    pub async fn update_training_field(
        &self,
        session: &Session,
        id: i32,
        field: &str,
        value: &str,
    ) -> Result<Outcome> {
        self.authorize(session, Operation::UpdateTraining)?;
        let outcome = self
            .gateway
            .update_training_field(session.credentials(), &self.target, id, field, value)
            .await;
        report(Operation::UpdateTraining, outcome)
    }

    pub async fn update_training_record(
        &self,
        session: &Session,
        id: i32,
        training: &NewTraining,
    ) -> Result<Outcome> {
        self.authorize(session, Operation::UpdateTraining)?;
        let outcome = self
            .gateway
            .update_training_record(session.credentials(), &self.target, id, training)
            .await;
        report(Operation::UpdateTraining, outcome)
    }

    pub async fn clear_database(&self, session: &Session) -> Result<Outcome> {
        self.authorize(session, Operation::ClearDatabase)?;
        let outcome = self
            .gateway
            .clear_database(session.credentials(), &self.target)
            .await;
        report(Operation::ClearDatabase, outcome)
    }

    pub async fn drop_database(&self, session: &Session) -> Result<Outcome> {
        self.authorize(session, Operation::DropDatabase)?;
        let outcome = self
            .gateway
            .drop_database(session.credentials(), &self.target)
            .await;
        report(Operation::DropDatabase, outcome)
    }

    /// Register an account, connecting as the calling admin.
    pub async fn create_user(&self, session: &Session, user: &NewUser) -> Result<Outcome> {
        self.authorize(session, Operation::CreateUser)?;
        let outcome = self.gateway.create_user(session.credentials(), user).await;
        report(Operation::CreateUser, outcome)
    }
}

/// Log the outcome and pass it through unchanged.
fn report(operation: Operation, outcome: Result<Outcome>) -> Result<Outcome> {
    match &outcome {
        Ok(Outcome::Rejected { rejection }) => {
            warn!(%operation, code = rejection.code(), "rejected: {}", rejection);
        }
        Ok(Outcome::NotFound) | Ok(Outcome::NoMatches { .. }) => {
            debug!(%operation, "nothing matched");
        }
        Ok(_) => info!(%operation, "completed"),
        // Not retried: a mutation may have been applied before the failure
        Err(err) if err.is_transport() => error!(%operation, "{}", err),
        Err(err) => warn!(%operation, "{}", err),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::codes::{Procedure, Rejection};
    use crate::gateway::{MockGateway, StaticAuthenticator};
    use crate::model::{Price, Role, TrainingRow};

    fn scheduler() -> Scheduler<MockGateway, StaticAuthenticator> {
        let auth = StaticAuthenticator::new()
            .with_user("boss", "adminpw", Role::Admin)
            .with_user("visitor", "guestpw", Role::Guest);
        Scheduler::new(MockGateway::new(), auth, DatabaseName::default())
    }

    fn training() -> NewTraining {
        NewTraining {
            title: "Yoga".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration: "01:00:00".into(),
            max_participants: 10,
            current_participants: 0,
            difficulty_level: "mixed".into(),
            trainer_name: "Olga".into(),
            price: Price::from_cents(1500),
        }
    }

    #[tokio::test]
    async fn login_resolves_stored_role() {
        let s = scheduler();
        let session = s.login("visitor", "guestpw").await.unwrap();
        assert_eq!(session.role(), Role::Guest);
        assert_eq!(session.username(), "visitor");
    }

    #[tokio::test]
    async fn login_failure_is_not_transport() {
        let s = scheduler();
        let err = s.login("visitor", "wrong").await.unwrap_err();
        assert!(matches!(err, ScheduleError::AuthenticationFailed { ref username } if username == "visitor"));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn guest_mutations_never_reach_gateway() {
        let s = scheduler();
        let guest = s.login("visitor", "guestpw").await.unwrap();
        let t = training();
        let user = NewUser::new("x", "y", "guest");

        let results = vec![
            s.create_database(&guest).await,
            s.create_table(&guest).await,
            s.add_training(&guest, &t).await,
            s.delete_training(&guest, "title", "Yoga").await,
            s.update_training_field(&guest, 1, "title", "Pilates").await,
            s.update_training_record(&guest, 1, &t).await,
            s.clear_database(&guest).await,
            s.drop_database(&guest).await,
            s.create_user(&guest, &user).await,
        ];

        for result in results {
            assert!(matches!(
                result,
                Err(ScheduleError::AuthorizationDenied { role: Role::Guest, .. })
            ));
        }
        assert_eq!(s.gateway().call_count(), 0);
    }

    #[tokio::test]
    async fn guest_may_read() {
        let s = scheduler();
        let guest = s.login("visitor", "guestpw").await.unwrap();

        s.get_all_trainings(&guest).await.unwrap();
        s.search_training(&guest, "title", "Yoga").await.unwrap();

        assert_eq!(
            s.gateway().calls(),
            vec![Procedure::GetAllTrainings, Procedure::SearchTrainingByField]
        );
    }

    #[tokio::test]
    async fn admin_calls_run_as_the_admin() {
        let s = scheduler();
        let admin = s.login("boss", "adminpw").await.unwrap();
        s.gateway().add_response(Ok(Outcome::Completed {
            completion: crate::codes::Completion::DatabaseCreated,
        }));

        s.create_database(&admin).await.unwrap();
        s.create_user(&admin, &NewUser::new("anna", "pw", "guest"))
            .await
            .unwrap();

        // No embedded superuser: privileged procedures use the caller's own login
        assert_eq!(s.gateway().acting_users(), vec!["boss", "boss"]);
    }

    #[tokio::test]
    async fn outcomes_pass_through() {
        let s = scheduler();
        let admin = s.login("boss", "adminpw").await.unwrap();
        s.gateway().add_response(Ok(Outcome::Rejected {
            rejection: Rejection::TrainerConflict,
        }));
        s.gateway().add_response(Ok(Outcome::Rows {
            rows: vec![TrainingRow {
                id: 1,
                title: "Yoga".into(),
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                duration: None,
                max_participants: None,
                current_participants: None,
                difficulty_level: None,
                trainer_name: None,
                price: None,
            }],
        }));

        let added = s.add_training(&admin, &training()).await.unwrap();
        assert_eq!(added, Outcome::Rejected { rejection: Rejection::TrainerConflict });

        let listed = s.get_all_trainings(&admin).await.unwrap();
        assert!(matches!(listed, Outcome::Rows { ref rows } if rows.len() == 1));
    }

    #[tokio::test]
    async fn transport_errors_surface_unchanged() {
        let s = scheduler();
        let admin = s.login("boss", "adminpw").await.unwrap();
        s.gateway()
            .add_response(Err(ScheduleError::transport("connection refused")));

        let err = s.delete_training(&admin, "title", "Yoga").await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "transport error: connection refused");
        // Exactly one attempt
        assert_eq!(s.gateway().call_count(), 1);
    }

    #[test]
    fn target_defaults() {
        assert_eq!(scheduler().target().as_str(), "training_schedule");
    }
}
