//! Audit trail recorder.
//!
//! [`AuditedTx`] wraps one immediate libSQL transaction. Entity repositories
//! write their row through [`AuditedTx::conn`], then call
//! [`AuditedTx::record`] followed by [`AuditedTx::link`] (or
//! [`AuditedTx::record_and_link`]). The transaction refuses to commit while a
//! record is missing its link, so an audit record never persists without the
//! strongly typed link written alongside it.
//!
//! Action dates are derived inside the transaction from the latest stored date
//! across both trails. Because the transaction holds the write lock from the
//! start, dates are strictly increasing per database, not per process.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use libsql::TransactionBehavior;
use tokio::sync::Mutex;

use farm_core::auditable::{AuditTarget, Auditable};
use farm_core::entities::{AuditLink, AuditRecord};
use farm_core::enums::{ActionKind, AuditDomain};
use farm_core::registry::EntityType;

use crate::error::DatabaseError;
use crate::{DbConn, FarmDb};
use crate::helpers::{format_datetime, now_micros, parse_datetime, parse_enum};

/// Projection of an action table, with the domain injected as a literal so
/// rows from both trails parse the same way.
pub(crate) fn select_records(domain: AuditDomain) -> String {
    format!(
        "SELECT id, '{}' AS domain, action, action_date, user_id, entity_type, object_id
         FROM {}",
        domain.as_str(),
        domain.actions_table()
    )
}

pub(crate) fn row_to_record(row: &libsql::Row) -> Result<AuditRecord, DatabaseError> {
    Ok(AuditRecord {
        id: row.get::<String>(0)?,
        domain: parse_enum(&row.get::<String>(1)?)?,
        action: parse_enum(&row.get::<String>(2)?)?,
        action_date: parse_datetime(&row.get::<String>(3)?)?,
        actor_id: row.get::<String>(4)?,
        entity_type: parse_enum(&row.get::<String>(5)?)?,
        object_id: row.get::<String>(6)?,
    })
}

/// Domain owning an audit record, derived from its ID prefix.
#[must_use]
pub fn domain_of_record_id(id: &str) -> Option<AuditDomain> {
    let prefix = id.split_once('-')?.0;
    AuditDomain::ALL
        .iter()
        .copied()
        .find(|d| d.record_prefix() == prefix)
}

/// Lazily iterates audit records from an open query.
///
/// Each fetch waits on the connection gate, so a cursor never observes a
/// transaction that another task still has open.
pub struct AuditCursor {
    rows: libsql::Rows,
    gate: Arc<Mutex<()>>,
}

impl AuditCursor {
    pub(crate) const fn new(rows: libsql::Rows, gate: Arc<Mutex<()>>) -> Self {
        Self { rows, gate }
    }

    /// Fetch the next record, or `None` once the sequence is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if reading or parsing the row fails.
    pub async fn next_record(&mut self) -> Result<Option<AuditRecord>, DatabaseError> {
        let _gate = self.gate.lock().await;
        match self.rows.next().await? {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    /// Drain the cursor into a vector.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if reading or parsing any row fails.
    pub async fn into_vec(mut self) -> Result<Vec<AuditRecord>, DatabaseError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }
}

/// A unit of work that pairs every audit record with its link.
///
/// Holds the connection gate from [`AuditedTx::begin`] until the handle is
/// consumed by [`AuditedTx::commit`], [`AuditedTx::rollback`] or
/// [`AuditedTx::finish`], or dropped. Dropping the handle without ending it
/// rolls the transaction back: libSQL issues the ROLLBACK when its
/// transaction drops, and the next `begin` on the connection discards any
/// transaction still left open.
pub struct AuditedTx {
    // Declared before the gate so the transaction ends before the gate opens.
    tx: libsql::Transaction,
    unlinked: Vec<AuditRecord>,
    _conn: DbConn,
}

impl AuditedTx {
    pub(crate) async fn begin(db: &FarmDb) -> Result<Self, DatabaseError> {
        let conn = db.conn().await;
        if !conn.is_autocommit() {
            tracing::warn!("discarding transaction left open by a dropped unit of work");
            conn.execute("ROLLBACK", ()).await?;
        }
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;
        Ok(Self {
            tx,
            unlinked: Vec::new(),
            _conn: conn,
        })
    }

    /// Connection bound to this transaction, for the entity writes.
    #[must_use]
    pub fn conn(&self) -> &libsql::Connection {
        &self.tx
    }

    /// Generate a prefixed ID inside this transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        crate::generate_id(&self.tx, prefix).await
    }

    /// Record one mutation against `target`.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Reference` if the actor or target row does not exist.
    /// - `DatabaseError` if the INSERT fails.
    pub async fn record(
        &mut self,
        action: ActionKind,
        actor_id: &str,
        target: &AuditTarget,
    ) -> Result<AuditRecord, DatabaseError> {
        self.ensure_actor(actor_id).await?;
        self.ensure_target(target).await?;

        let domain = target.entity_type.domain();
        let action_date = self.next_action_date().await?;
        let id = self.generate_id(domain.record_prefix()).await?;

        self.tx
            .execute(
                &format!(
                    "INSERT INTO {} (id, action, action_date, user_id, entity_type, object_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    domain.actions_table()
                ),
                libsql::params![
                    id.as_str(),
                    action.as_str(),
                    format_datetime(&action_date),
                    actor_id,
                    target.entity_type.as_str(),
                    target.id.as_str()
                ],
            )
            .await?;

        let record = AuditRecord {
            id,
            domain,
            action,
            action_date,
            actor_id: actor_id.to_string(),
            entity_type: target.entity_type,
            object_id: target.id.clone(),
        };
        tracing::debug!(
            audit_id = %record.id,
            actor = actor_id,
            %record,
            "audit record written"
        );
        self.unlinked.push(record.clone());
        Ok(record)
    }

    /// Record a mutation whose kind arrives as its stored code
    /// (`"CREATE"`, `"UPDATE"`, `"DELETE"`).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for any other code, before anything
    /// is written. Otherwise behaves like [`Self::record`].
    pub async fn record_named(
        &mut self,
        action: &str,
        actor_id: &str,
        target: &AuditTarget,
    ) -> Result<AuditRecord, DatabaseError> {
        let action: ActionKind = action.parse()?;
        self.record(action, actor_id, target).await
    }

    /// Write the strongly typed link between `record` and `target`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Consistency` if the record does not reference
    /// `target`, was never recorded, or is already linked.
    pub async fn link<T: Auditable>(
        &mut self,
        record: &AuditRecord,
        target: &T,
    ) -> Result<AuditLink, DatabaseError> {
        let entity = T::ENTITY_TYPE;
        if record.entity_type != entity || record.object_id != target.audit_id() {
            return Err(DatabaseError::Consistency(format!(
                "audit record {} targets {} {}, not {} {}",
                record.id,
                record.entity_type,
                record.object_id,
                entity,
                target.audit_id()
            )));
        }

        let pending = self.unlinked.iter().position(|r| r.id == record.id);
        if pending.is_none() && !self.record_stored(record).await? {
            return Err(DatabaseError::Consistency(format!(
                "audit record {} was never recorded",
                record.id
            )));
        }
        if self.link_stored(entity, &record.id).await? {
            return Err(DatabaseError::Consistency(format!(
                "audit record {} is already linked",
                record.id
            )));
        }

        self.tx
            .execute(
                &format!(
                    "INSERT INTO {} (action_id, {}) VALUES (?1, ?2)",
                    entity.link_table(),
                    entity.link_column()
                ),
                libsql::params![record.id.as_str(), target.audit_id()],
            )
            .await?;
        let id = self.tx.last_insert_rowid();

        if let Some(idx) = pending {
            self.unlinked.swap_remove(idx);
        }
        tracing::debug!(audit_id = %record.id, link_table = entity.link_table(), "audit link written");

        Ok(AuditLink {
            id,
            action_id: record.id.clone(),
            entity_type: entity,
            target_id: target.audit_id().to_string(),
        })
    }

    /// Record a mutation against `target` and link it in one step.
    ///
    /// # Errors
    ///
    /// See [`Self::record`] and [`Self::link`].
    pub async fn record_and_link<T: Auditable>(
        &mut self,
        action: ActionKind,
        actor_id: &str,
        target: &T,
    ) -> Result<AuditRecord, DatabaseError> {
        let record = self.record(action, actor_id, &target.audit_target()).await?;
        self.link(&record, target).await?;
        Ok(record)
    }

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Consistency` and rolls back if any record is
    /// still missing its link.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        if !self.unlinked.is_empty() {
            let ids: Vec<&str> = self.unlinked.iter().map(|r| r.id.as_str()).collect();
            let msg = format!("audit records without link: {}", ids.join(", "));
            tracing::warn!(%msg, "rolling back audited transaction");
            self.tx.rollback().await?;
            return Err(DatabaseError::Consistency(msg));
        }
        self.tx.commit().await?;
        Ok(())
    }

    /// Discard every write made in this transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the rollback fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Commit on `Ok`, roll back on `Err`, and pass the result through.
    ///
    /// # Errors
    ///
    /// Returns the original error, or the commit error.
    pub async fn finish<R>(self, result: Result<R, DatabaseError>) -> Result<R, DatabaseError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed mutation failed");
                }
                Err(err)
            }
        }
    }

    async fn exists(&self, sql: &str, params: Vec<libsql::Value>) -> Result<bool, DatabaseError> {
        let mut rows = self.tx.query(sql, libsql::params_from_iter(params)).await?;
        Ok(rows.next().await?.is_some())
    }

    async fn ensure_actor(&self, actor_id: &str) -> Result<(), DatabaseError> {
        if self
            .exists("SELECT 1 FROM users WHERE id = ?1", vec![actor_id.into()])
            .await?
        {
            Ok(())
        } else {
            Err(DatabaseError::Reference(format!(
                "actor {actor_id} does not exist"
            )))
        }
    }

    async fn ensure_target(&self, target: &AuditTarget) -> Result<(), DatabaseError> {
        let entity = target.entity_type;
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?1",
            entity.table(),
            entity.id_column()
        );
        if self.exists(&sql, vec![target.id.as_str().into()]).await? {
            Ok(())
        } else {
            Err(DatabaseError::Reference(format!("{target} does not exist")))
        }
    }

    async fn record_stored(&self, record: &AuditRecord) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE id = ?1 AND entity_type = ?2 AND object_id = ?3",
            record.domain.actions_table()
        );
        self.exists(
            &sql,
            vec![
                record.id.as_str().into(),
                record.entity_type.as_str().into(),
                record.object_id.as_str().into(),
            ],
        )
        .await
    }

    async fn link_stored(&self, entity: EntityType, action_id: &str) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE action_id = ?1",
            entity.link_table()
        );
        self.exists(&sql, vec![action_id.into()]).await
    }

    /// Next action date: now, or one microsecond past the latest stored date
    /// if the clock has not moved beyond it.
    async fn next_action_date(&self) -> Result<DateTime<Utc>, DatabaseError> {
        let latest = AuditDomain::ALL
            .iter()
            .map(|d| format!("SELECT MAX(action_date) AS d FROM {}", d.actions_table()))
            .collect::<Vec<_>>()
            .join(" UNION ALL ");
        let mut rows = self
            .tx
            .query(&format!("SELECT MAX(d) FROM ({latest})"), ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let now = now_micros();
        match row.get::<Option<String>>(0)? {
            Some(s) => {
                let last = parse_datetime(&s)?;
                Ok(if now > last {
                    now
                } else {
                    last + Duration::microseconds(1)
                })
            }
            None => Ok(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::gestion::delivery::NewDelivery;
    use crate::test_support::helpers::{create_test_actor, test_service};
    use farm_core::entities::Delivery;
    use farm_core::ids::PREFIX_DELIVERY;
    use pretty_assertions::assert_eq;

    /// Insert a delivery row directly, without auditing.
    async fn raw_delivery(tx: &AuditedTx) -> Delivery {
        let id = tx.generate_id(PREFIX_DELIVERY).await.unwrap();
        let now = now_micros();
        tx.conn()
            .execute(
                "INSERT INTO deliveries (id, date, date_delivery, liter, comment) VALUES (?1, ?2, ?2, 10, '')",
                libsql::params![id.as_str(), format_datetime(&now)],
            )
            .await
            .unwrap();
        Delivery {
            id,
            date: now,
            date_delivery: now,
            liter: 10,
            comment: String::new(),
        }
    }

    #[test]
    fn record_id_prefix_maps_to_domain() {
        assert_eq!(domain_of_record_id("gac-0000abcd"), Some(AuditDomain::Gestion));
        assert_eq!(domain_of_record_id("rac-0000abcd"), Some(AuditDomain::Recipes));
        assert_eq!(domain_of_record_id("dlv-0000abcd"), None);
        assert_eq!(domain_of_record_id("garbage"), None);
    }

    #[tokio::test]
    async fn record_then_link_commits_both() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let delivery = raw_delivery(&tx).await;
        let record = tx
            .record(ActionKind::Create, &actor.id, &delivery.audit_target())
            .await
            .unwrap();
        let link = tx.link(&record, &delivery).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(link.action_id, record.id);
        assert_eq!(link.target_id, delivery.id);
        assert_eq!(svc.count_audit_records(AuditDomain::Gestion).await.unwrap(), 1);
        assert_eq!(svc.count_links(EntityType::Delivery).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn commit_without_link_rolls_back() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let delivery = raw_delivery(&tx).await;
        tx.record(ActionKind::Create, &actor.id, &delivery.audit_target())
            .await
            .unwrap();
        let result = tx.commit().await;

        assert!(matches!(result, Err(DatabaseError::Consistency(_))));
        assert_eq!(svc.count_audit_records(AuditDomain::Gestion).await.unwrap(), 0);
        assert!(matches!(
            svc.get_delivery(&delivery.id).await,
            Err(DatabaseError::NoResult)
        ));
    }

    #[tokio::test]
    async fn link_for_unrecorded_record_is_rejected() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let delivery = raw_delivery(&tx).await;
        let forged = AuditRecord {
            id: "gac-deadbeef".into(),
            domain: AuditDomain::Gestion,
            action: ActionKind::Create,
            action_date: now_micros(),
            actor_id: actor.id.clone(),
            entity_type: EntityType::Delivery,
            object_id: delivery.id.clone(),
        };
        let result = tx.link(&forged, &delivery).await;
        assert!(matches!(result, Err(DatabaseError::Consistency(_))));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn link_to_other_target_is_rejected() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let first = raw_delivery(&tx).await;
        let second = raw_delivery(&tx).await;
        let record = tx
            .record(ActionKind::Update, &actor.id, &first.audit_target())
            .await
            .unwrap();
        let result = tx.link(&record, &second).await;
        assert!(matches!(result, Err(DatabaseError::Consistency(_))));

        let result = tx.finish(result).await;
        assert!(result.is_err());
        assert_eq!(svc.count_audit_records(AuditDomain::Gestion).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn double_link_is_rejected() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let delivery = raw_delivery(&tx).await;
        let record = tx
            .record_and_link(ActionKind::Create, &actor.id, &delivery)
            .await
            .unwrap();
        let again = tx.link(&record, &delivery).await;
        assert!(matches!(again, Err(DatabaseError::Consistency(_))));
        tx.commit().await.unwrap();
        assert_eq!(svc.count_links(EntityType::Delivery).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_actor_is_a_reference_error() {
        let svc = test_service().await;

        let mut tx = svc.begin_audited().await.unwrap();
        let delivery = raw_delivery(&tx).await;
        let result = tx
            .record(ActionKind::Create, "usr-missing0", &delivery.audit_target())
            .await;
        assert!(matches!(result, Err(DatabaseError::Reference(_))));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_target_is_a_reference_error() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let result = tx
            .record(
                ActionKind::Update,
                &actor.id,
                &AuditTarget::new(EntityType::Herd, "hrd-missing0"),
            )
            .await;
        assert!(matches!(result, Err(DatabaseError::Reference(_))));
        tx.rollback().await.unwrap();
        assert_eq!(svc.count_audit_records(AuditDomain::Gestion).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_action_code_persists_nothing() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let delivery = svc
            .create_delivery(&actor.id, NewDelivery::new(now_micros(), 5, "morning"))
            .await
            .unwrap();
        let records_before = svc.count_audit_records(AuditDomain::Gestion).await.unwrap();

        let mut tx = svc.begin_audited().await.unwrap();
        let result = tx
            .record_named("INVALID", &actor.id, &delivery.audit_target())
            .await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
        let _ = tx.finish(result).await;

        assert_eq!(
            svc.count_audit_records(AuditDomain::Gestion).await.unwrap(),
            records_before
        );
        assert_eq!(svc.count_links(EntityType::Delivery).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn record_named_accepts_stored_codes() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let delivery = raw_delivery(&tx).await;
        let record = tx
            .record_named("UPDATE", &actor.id, &delivery.audit_target())
            .await
            .unwrap();
        tx.link(&record, &delivery).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(record.action, ActionKind::Update);
    }

    #[tokio::test]
    async fn action_dates_strictly_increase() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let delivery = raw_delivery(&tx).await;
        let mut dates = Vec::new();
        for _ in 0..20 {
            let record = tx
                .record_and_link(ActionKind::Update, &actor.id, &delivery)
                .await
                .unwrap();
            dates.push(record.action_date);
        }
        tx.commit().await.unwrap();

        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[tokio::test]
    async fn dropped_handle_leaves_nothing_behind() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;

        let delivery_id = {
            let mut tx = svc.begin_audited().await.unwrap();
            let delivery = raw_delivery(&tx).await;
            tx.record_and_link(ActionKind::Create, &actor.id, &delivery)
                .await
                .unwrap();
            delivery.id
        };

        assert_eq!(svc.count_audit_records(AuditDomain::Gestion).await.unwrap(), 0);
        assert_eq!(svc.count_links(EntityType::Delivery).await.unwrap(), 0);
        assert!(matches!(
            svc.get_delivery(&delivery_id).await,
            Err(DatabaseError::NoResult)
        ));

        // The gate is free again and the connection accepts a new unit of work.
        let delivery = svc
            .create_delivery(&actor.id, NewDelivery::new(now_micros(), 3, ""))
            .await
            .unwrap();
        assert_eq!(svc.history(EntityType::Delivery, &delivery.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_unit_of_work_hides_its_rows_from_other_tasks() {
        let svc = std::sync::Arc::new(test_service().await);
        let actor = create_test_actor(&svc).await;

        let mut tx = svc.begin_audited().await.unwrap();
        let delivery = raw_delivery(&tx).await;
        tx.record_and_link(ActionKind::Create, &actor.id, &delivery)
            .await
            .unwrap();

        let reader = {
            let svc = std::sync::Arc::clone(&svc);
            tokio::spawn(async move { svc.count_audit_records(AuditDomain::Gestion).await })
        };
        tx.rollback().await.unwrap();

        assert_eq!(reader.await.unwrap().unwrap(), 0);
    }

    #[tokio::test]
    async fn audit_records_are_immutable() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let delivery = svc
            .create_delivery(&actor.id, NewDelivery::new(now_micros(), 5, ""))
            .await
            .unwrap();

        let result = svc
            .db()
            .conn()
            .await
            .execute(
                "UPDATE gestion_model_actions SET action = 'DELETE' WHERE object_id = ?1",
                [delivery.id.as_str()],
            )
            .await;
        assert!(result.is_err());
    }
}
