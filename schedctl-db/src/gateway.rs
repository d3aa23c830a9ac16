//! Stored procedure bindings
//!
//! Every method opens its own connection as the acting identity, runs one
//! statement under the call deadline, releases the connection and hands the
//! returned code (or rows) to the core translator.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryScalar};
use sqlx::Postgres;
use tracing::debug;

use schedctl_core::codes::{list_outcome, search_outcome};
use schedctl_core::{
    translate, Completion, Credentials, DatabaseName, NewTraining, NewUser, Outcome, Procedure,
    ProcedureGateway, Result,
};

use crate::connection::{classify, ConnectionProvider};
use crate::rows::{decode_all, LIST_SQL, SEARCH_SQL};

const CREATE_DATABASE_SQL: &str = "CALL create_database($1)";
const CREATE_TABLE_SQL: &str = "CALL create_table($1, NULL)";
const DROP_DATABASE_SQL: &str = "CALL drop_database($1, NULL)";
const CLEAR_DATABASE_SQL: &str = "SELECT clear_database($1)";
const CREATE_USER_SQL: &str = "SELECT create_user($1, $2, $3)";
const ADD_TRAINING_SQL: &str =
    "SELECT add_new_training($1, $2, $3, $4, $5::interval, $6, $7, $8, $9, $10::numeric)";
const DELETE_TRAININGS_SQL: &str = "SELECT delete_trainings_by_field($1, $2, $3)";
const UPDATE_FIELD_SQL: &str = "SELECT update_training_field($1, $2, $3, $4)";
const UPDATE_RECORD_SQL: &str = "SELECT update_training_record($1, $2, $3, $4, $5, $6::interval, $7, $8, $9, $10, $11::numeric)";

type CodeQuery<'q> = QueryScalar<'q, Postgres, i32, PgArguments>;

/// `ProcedureGateway` over PostgreSQL
#[derive(Debug, Clone)]
pub struct PgGateway {
    provider: ConnectionProvider,
}

impl PgGateway {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Run a code-returning statement and translate its code.
    async fn code(
        &self,
        acting: &Credentials,
        procedure: Procedure,
        query: CodeQuery<'_>,
    ) -> Result<Outcome> {
        let call = async {
            let mut conn = self.provider.connect(acting).await?;
            let code = query.fetch_one(&mut conn).await.map_err(classify);
            ConnectionProvider::release(conn).await;
            code
        };
        let code = self.provider.within(procedure.name(), call).await?;

        debug!(%procedure, code, "procedure returned");
        translate(procedure, code)
    }

    async fn rows(
        &self,
        acting: &Credentials,
        procedure: Procedure,
        query: Query<'_, Postgres, PgArguments>,
    ) -> Result<Vec<PgRow>> {
        let call = async {
            let mut conn = self.provider.connect(acting).await?;
            let rows = query.fetch_all(&mut conn).await.map_err(classify);
            ConnectionProvider::release(conn).await;
            rows
        };
        let rows = self.provider.within(procedure.name(), call).await?;

        debug!(%procedure, rows = rows.len(), "procedure returned rows");
        Ok(rows)
    }
}

#[async_trait]
impl ProcedureGateway for PgGateway {
    async fn create_database(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome> {
        let procedure = Procedure::CreateDatabase;
        let call = async {
            let mut conn = self.provider.connect(acting).await?;
            let done = sqlx::query(CREATE_DATABASE_SQL)
                .bind(target.as_str())
                .execute(&mut conn)
                .await
                .map_err(classify);
            ConnectionProvider::release(conn).await;
            done
        };
        self.provider.within(procedure.name(), call).await?;

        debug!(%procedure, database = %target, "procedure finished");
        Ok(Outcome::Completed {
            completion: Completion::DatabaseCreated,
        })
    }

    async fn create_table(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome> {
        let query = sqlx::query_scalar(CREATE_TABLE_SQL).bind(target.as_str());
        self.code(acting, Procedure::CreateTable, query).await
    }

    async fn drop_database(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome> {
        let query = sqlx::query_scalar(DROP_DATABASE_SQL).bind(target.as_str());
        self.code(acting, Procedure::DropDatabase, query).await
    }

    async fn clear_database(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome> {
        let query = sqlx::query_scalar(CLEAR_DATABASE_SQL).bind(target.as_str());
        self.code(acting, Procedure::ClearDatabase, query).await
    }

    async fn create_user(&self, acting: &Credentials, user: &NewUser) -> Result<Outcome> {
        let query = sqlx::query_scalar(CREATE_USER_SQL)
            .bind(user.username.as_str())
            .bind(user.password.expose())
            .bind(user.role.as_str());
        self.code(acting, Procedure::CreateUser, query).await
    }

    async fn add_training(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        training: &NewTraining,
    ) -> Result<Outcome> {
        let query = sqlx::query_scalar(ADD_TRAINING_SQL)
            .bind(target.as_str())
            .bind(training.title.as_str())
            .bind(training.date)
            .bind(training.start_time)
            .bind(training.duration.as_str())
            .bind(training.max_participants)
            .bind(training.current_participants)
            .bind(training.difficulty_level.as_str())
            .bind(training.trainer_name.as_str())
            .bind(training.price.to_string());
        self.code(acting, Procedure::AddNewTraining, query).await
    }

    async fn search_trainings(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        field: &str,
        value: &str,
    ) -> Result<Outcome> {
        let query = sqlx::query(SEARCH_SQL)
            .bind(target.as_str())
            .bind(field)
            .bind(value);
        let rows = self
            .rows(acting, Procedure::SearchTrainingByField, query)
            .await?;
        Ok(search_outcome(field, value, decode_all(&rows)?))
    }

    async fn delete_trainings(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        field: &str,
        value: &str,
    ) -> Result<Outcome> {
        let query = sqlx::query_scalar(DELETE_TRAININGS_SQL)
            .bind(target.as_str())
            .bind(field)
            .bind(value);
        self.code(acting, Procedure::DeleteTrainingsByField, query)
            .await
    }

    async fn update_training_field(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        id: i32,
        field: &str,
        value: &str,
    ) -> Result<Outcome> {
        let query = sqlx::query_scalar(UPDATE_FIELD_SQL)
            .bind(target.as_str())
            .bind(id)
            .bind(field)
            .bind(value);
        self.code(acting, Procedure::UpdateTrainingField, query).await
    }

    async fn update_training_record(
        &self,
        acting: &Credentials,
        target: &DatabaseName,
        id: i32,
        training: &NewTraining,
    ) -> Result<Outcome> {
        let query = sqlx::query_scalar(UPDATE_RECORD_SQL)
            .bind(target.as_str())
            .bind(id)
            .bind(training.title.as_str())
            .bind(training.date)
            .bind(training.start_time)
            .bind(training.duration.as_str())
            .bind(training.max_participants)
            .bind(training.current_participants)
            .bind(training.difficulty_level.as_str())
            .bind(training.trainer_name.as_str())
            .bind(training.price.to_string());
        self.code(acting, Procedure::UpdateTrainingRecord, query)
            .await
    }

    async fn list_trainings(&self, acting: &Credentials, target: &DatabaseName) -> Result<Outcome> {
        let query = sqlx::query(LIST_SQL).bind(target.as_str());
        let rows = self.rows(acting, Procedure::GetAllTrainings, query).await?;
        Ok(list_outcome(decode_all(&rows)?))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// SSLRequest code from the PostgreSQL startup protocol
    const SSL_REQUEST: i32 = 80_877_103;

    /// Minimal server: answers the handshake after `handshake_delay`, then
    /// reads statements forever without replying.
    async fn stalling_server(handshake_delay: Duration) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            loop {
                let len = socket.read_i32().await.unwrap();
                let mut body = vec![0u8; len as usize - 4];
                socket.read_exact(&mut body).await.unwrap();
                if body[..4] == SSL_REQUEST.to_be_bytes() {
                    socket.write_all(b"N").await.unwrap();
                } else {
                    break;
                }
            }

            tokio::time::sleep(handshake_delay).await;
            // AuthenticationOk, ReadyForQuery(idle)
            socket.write_all(&[b'R', 0, 0, 0, 8, 0, 0, 0, 0]).await.unwrap();
            socket.write_all(&[b'Z', 0, 0, 0, 5, b'I']).await.unwrap();

            let mut buf = [0u8; 1024];
            while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
        });
        port
    }

    #[tokio::test]
    async fn slow_handshake_and_stalled_statement_share_one_deadline() {
        let port = stalling_server(Duration::from_millis(1500)).await;
        let provider = ConnectionProvider::new("127.0.0.1", port, "trainings", Duration::from_secs(2));
        let gateway = PgGateway::new(provider);

        let started = std::time::Instant::now();
        let err = gateway
            .clear_database(&Credentials::new("coach", "pw"), &DatabaseName::default())
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(err.is_transport());
        assert!(err.to_string().contains("clear_database did not finish within 2s"));
        assert!(elapsed < Duration::from_millis(2900), "took {elapsed:?}");
    }

    fn placeholders(sql: &str) -> usize {
        (1..=20).filter(|n| sql.contains(&format!("${n}"))).count()
    }

    #[test]
    fn statements_bind_every_argument() {
        assert_eq!(placeholders(CREATE_DATABASE_SQL), 1);
        assert_eq!(placeholders(CREATE_TABLE_SQL), 1);
        assert_eq!(placeholders(DROP_DATABASE_SQL), 1);
        assert_eq!(placeholders(CLEAR_DATABASE_SQL), 1);
        assert_eq!(placeholders(CREATE_USER_SQL), 3);
        assert_eq!(placeholders(ADD_TRAINING_SQL), 10);
        assert_eq!(placeholders(DELETE_TRAININGS_SQL), 3);
        assert_eq!(placeholders(UPDATE_FIELD_SQL), 4);
        assert_eq!(placeholders(UPDATE_RECORD_SQL), 11);
    }

    #[test]
    fn statements_name_their_procedure() {
        let pairs = [
            (CREATE_DATABASE_SQL, Procedure::CreateDatabase),
            (CREATE_TABLE_SQL, Procedure::CreateTable),
            (DROP_DATABASE_SQL, Procedure::DropDatabase),
            (CLEAR_DATABASE_SQL, Procedure::ClearDatabase),
            (CREATE_USER_SQL, Procedure::CreateUser),
            (ADD_TRAINING_SQL, Procedure::AddNewTraining),
            (DELETE_TRAININGS_SQL, Procedure::DeleteTrainingsByField),
            (UPDATE_FIELD_SQL, Procedure::UpdateTrainingField),
            (UPDATE_RECORD_SQL, Procedure::UpdateTrainingRecord),
            (SEARCH_SQL, Procedure::SearchTrainingByField),
            (LIST_SQL, Procedure::GetAllTrainings),
        ];
        for (sql, procedure) in pairs {
            assert!(
                sql.contains(&format!("{}(", procedure.name())),
                "{sql} should call {procedure}"
            );
        }
    }
}
