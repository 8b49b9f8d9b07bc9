//! Request-scoped database session
//!
//! A [`Session`] is one transaction begun from the shared pool when a
//! handler asks for it. Dropping it without [`Session::commit`] rolls the
//! transaction back, so a handler that bails out with `?` leaves no partial
//! writes behind.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::{ApiError, AppState};

pub struct Session {
    tx: Transaction<'static, Sqlite>,
}

impl Session {
    /// Begin a session outside extraction, e.g. once a request body is read
    pub async fn begin(pool: &SqlitePool) -> Result<Self, ApiError> {
        let tx = pool.begin().await?;
        Ok(Session { tx })
    }

    /// Connection to run storage queries on
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), ApiError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Session::begin(&state.db).await
    }
}
