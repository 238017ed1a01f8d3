//! Postgres-backed credential store.

use super::{
    CredentialStore, InsertOutcome, NewUser, StoreError, StoreFuture, UserFilter, UserPatch,
    UserRecord,
};
use sqlx::{
    Connection, PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use std::time::Duration;
use tracing::{Instrument, debug, info_span};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const USER_COLUMNS: &str =
    "full_name, first_name, last_name, phone_number, email, password_hash, refresh_token";

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Open the connection pool.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table and its indexes if they are missing.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "DDL",
                db.statement = statement.as_str()
            );
            sqlx::query(statement)
                .execute(&self.pool)
                .instrument(span)
                .await
                .map_err(|e| StoreError::Schema(format!("statement {}: {e}", index + 1)))?;
        }

        debug!("schema ready");

        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl CredentialStore for PgCredentialStore {
    fn find_one<'a>(&'a self, filter: &'a UserFilter) -> StoreFuture<'a, Option<UserRecord>> {
        Box::pin(async move {
            let (column, value) = filter_binding(filter);
            let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1 LIMIT 1");
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "SELECT",
                db.statement = query.as_str()
            );
            let row = sqlx::query(&query)
                .bind(value)
                .fetch_optional(&self.pool)
                .instrument(span)
                .await?;

            Ok(row.as_ref().map(user_from_row).transpose()?)
        })
    }

    fn insert<'a>(&'a self, user: &'a NewUser) -> StoreFuture<'a, InsertOutcome> {
        Box::pin(async move {
            let query = r"
                INSERT INTO users
                    (full_name, first_name, last_name, phone_number, email, password_hash)
                VALUES ($1, $2, $3, $4, $5, $6)
            ";
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "INSERT",
                db.statement = query
            );
            let result = sqlx::query(query)
                .bind(&user.full_name)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.phone_number)
                .bind(&user.email)
                .bind(&user.password_hash)
                .execute(&self.pool)
                .instrument(span)
                .await;

            match result {
                Ok(_) => Ok(InsertOutcome::Created),
                Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn update_one<'a>(
        &'a self,
        filter: &'a UserFilter,
        patch: &'a UserPatch,
    ) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let (column, value) = filter_binding(filter);
            // Postgres has no UPDATE ... LIMIT; email is unique and refresh tokens carry a jti,
            // so at most one row matches either filter.
            let query = format!("UPDATE users SET refresh_token = $1 WHERE {column} = $2");
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "UPDATE",
                db.statement = query.as_str()
            );
            let result = sqlx::query(&query)
                .bind(patch.refresh_token.as_deref())
                .bind(value)
                .execute(&self.pool)
                .instrument(span)
                .await?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let acquire_span = info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            );
            let mut conn = self
                .pool
                .acquire()
                .instrument(acquire_span)
                .await
                .map_err(pool_error)?;

            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            conn.ping().instrument(ping_span).await?;

            Ok(())
        })
    }
}

// Pool exhaustion and shutdown are reported as the store being unavailable.
fn pool_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Database(other),
    }
}

fn filter_binding(filter: &UserFilter) -> (&'static str, &str) {
    match filter {
        UserFilter::Email(email) => ("email", email.as_str()),
        UserFilter::RefreshToken(token) => ("refresh_token", token.as_str()),
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        full_name: row.try_get("full_name")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone_number: row.try_get("phone_number")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        refresh_token: row.try_get("refresh_token")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}
