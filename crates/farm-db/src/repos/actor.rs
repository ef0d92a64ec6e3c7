//! Actor repository.
//!
//! Account management for the users referenced by audit records. Actors are
//! not audited themselves. Deleting an actor cascades to every record they
//! performed and, through those records, to the links.

use farm_core::entities::Actor;
use farm_core::enums::ActorRole;
use farm_core::ids::PREFIX_USER;

use crate::error::DatabaseError;
use crate::helpers::{format_datetime, now_micros, parse_datetime, parse_enum};
use crate::service::FarmService;

const SELECT_ACTOR: &str = "SELECT id, username, role, created_at FROM users";

fn row_to_actor(row: &libsql::Row) -> Result<Actor, DatabaseError> {
    Ok(Actor {
        id: row.get::<String>(0)?,
        username: row.get::<String>(1)?,
        role: parse_enum(&row.get::<String>(2)?)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

impl FarmService {
    /// Create an actor.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an empty username, or
    /// `DatabaseError` if the INSERT fails (e.g. duplicate username).
    pub async fn create_actor(
        &self,
        username: &str,
        role: ActorRole,
    ) -> Result<Actor, DatabaseError> {
        if username.trim().is_empty() {
            return Err(DatabaseError::Validation("username must not be empty".into()));
        }
        let id = self.db().generate_id(PREFIX_USER).await?;
        let now = now_micros();

        self.db()
            .conn()
            .await
            .execute(
                "INSERT INTO users (id, username, role, created_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), username, role.as_str(), format_datetime(&now)],
            )
            .await?;
        tracing::info!(actor = %id, username, %role, "actor created");

        Ok(Actor {
            id,
            username: username.to_string(),
            role,
            created_at: now,
        })
    }

    /// Get an actor by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the actor does not exist.
    pub async fn get_actor(&self, id: &str) -> Result<Actor, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = conn
            .query(&format!("{SELECT_ACTOR} WHERE id = ?1"), [id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_actor(&row)
    }

    /// Get an actor by username.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no actor has this username.
    pub async fn get_actor_by_username(&self, username: &str) -> Result<Actor, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = conn
            .query(&format!("{SELECT_ACTOR} WHERE username = ?1"), [username])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_actor(&row)
    }

    /// List actors ordered by username.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_actors(&self) -> Result<Vec<Actor>, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = conn
            .query(&format!("{SELECT_ACTOR} ORDER BY username"), ())
            .await?;
        let mut actors = Vec::new();
        while let Some(row) = rows.next().await? {
            actors.push(row_to_actor(&row)?);
        }
        Ok(actors)
    }

    /// Change an actor's role.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the actor does not exist.
    pub async fn update_actor_role(
        &self,
        id: &str,
        role: ActorRole,
    ) -> Result<Actor, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .await
            .execute(
                "UPDATE users SET role = ?1 WHERE id = ?2",
                libsql::params![role.as_str(), id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        self.get_actor(id).await
    }

    /// Delete an actor together with their audit records and links.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the actor does not exist.
    pub async fn delete_actor(&self, id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .await
            .execute("DELETE FROM users WHERE id = ?1", [id])
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        tracing::info!(actor = id, "actor deleted");
        Ok(())
    }
}
