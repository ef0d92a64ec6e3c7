//! Audit trail queries.
//!
//! Read-only access to both trails. Records are ordered by action date, which
//! is unique per database, with the record ID as a tiebreaker. Nothing here
//! updates or deletes a record.

use farm_core::auditable::{AuditTarget, Auditable};
use farm_core::entities::{Actor, AuditLink, AuditRecord};
use farm_core::enums::{ActionKind, AuditDomain};
use farm_core::registry::EntityType;

use crate::audit::{AuditCursor, domain_of_record_id, row_to_record, select_records};
use crate::error::DatabaseError;
use crate::service::FarmService;

/// Filter criteria for audit queries.
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub domain: Option<AuditDomain>,
    pub entity_type: Option<EntityType>,
    pub object_id: Option<String>,
    pub action: Option<ActionKind>,
    pub actor_id: Option<String>,
    /// Falls back to the configured `audit.default_limit`.
    pub limit: Option<u32>,
}

impl AuditFilter {
    /// Domains a matching record can live in.
    fn domains(&self) -> Vec<AuditDomain> {
        AuditDomain::ALL
            .iter()
            .copied()
            .filter(|d| self.domain.is_none_or(|want| want == *d))
            .filter(|d| self.entity_type.is_none_or(|et| et.domain() == *d))
            .collect()
    }
}

impl FarmService {
    /// Get one audit record by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no record has this ID.
    pub async fn get_audit_record(&self, id: &str) -> Result<AuditRecord, DatabaseError> {
        let domain = domain_of_record_id(id).ok_or(DatabaseError::NoResult)?;
        let sql = format!("{} WHERE id = ?1", select_records(domain));
        let conn = self.db().conn().await;
        let mut rows = conn.query(&sql, [id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_record(&row)
    }

    /// Lazily iterate every record whose weak reference names `target`,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn history_cursor(&self, target: &AuditTarget) -> Result<AuditCursor, DatabaseError> {
        let sql = format!(
            "{} WHERE entity_type = ?1 AND object_id = ?2 ORDER BY action_date, id",
            select_records(target.entity_type.domain())
        );
        let rows = self
            .db()
            .conn()
            .await
            .query(
                &sql,
                libsql::params![target.entity_type.as_str(), target.id.as_str()],
            )
            .await?;
        Ok(AuditCursor::new(rows, self.db().gate()))
    }

    /// Every record for `(entity_type, object_id)`, oldest first.
    ///
    /// Records survive deletion of the target row, so the history of a
    /// deleted entity still ends with its DELETE record.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn history(
        &self,
        entity_type: EntityType,
        object_id: &str,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        self.history_cursor(&AuditTarget::new(entity_type, object_id))
            .await?
            .into_vec()
            .await
    }

    /// History of a live entity, resolved through its link table.
    ///
    /// Differs from [`Self::history`] only when a record lost its link.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn linked_history<T: Auditable>(
        &self,
        target: &T,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        let entity = T::ENTITY_TYPE;
        let domain = entity.domain();
        let sql = format!(
            "SELECT a.id, '{}' AS domain, a.action, a.action_date, a.user_id, a.entity_type, a.object_id
             FROM {} a JOIN {} l ON l.action_id = a.id
             WHERE l.{} = ?1
             ORDER BY a.action_date, a.id",
            domain.as_str(),
            domain.actions_table(),
            entity.link_table(),
            entity.link_column()
        );
        let rows = self
            .db()
            .conn()
            .await
            .query(&sql, [target.audit_id()])
            .await?;
        AuditCursor::new(rows, self.db().gate()).into_vec().await
    }

    /// Lazily iterate every record performed by `actor_id` across both
    /// trails, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn actions_by_cursor(&self, actor_id: &str) -> Result<AuditCursor, DatabaseError> {
        let sql = AuditDomain::ALL
            .iter()
            .map(|d| format!("{} WHERE user_id = ?1", select_records(*d)))
            .collect::<Vec<_>>()
            .join(" UNION ALL ");
        let sql = format!("{sql} ORDER BY action_date, id");
        let rows = self.db().conn().await.query(&sql, [actor_id]).await?;
        Ok(AuditCursor::new(rows, self.db().gate()))
    }

    /// Every record performed by `actor_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn actions_by(&self, actor_id: &str) -> Result<Vec<AuditRecord>, DatabaseError> {
        self.actions_by_cursor(actor_id).await?.into_vec().await
    }

    /// Query audit records with optional filters, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(
        &self,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        let domains = filter.domains();
        if domains.is_empty() {
            return Ok(Vec::new());
        }

        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(et) = filter.entity_type {
            params.push(et.as_str().into());
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref oid) = filter.object_id {
            params.push(oid.as_str().into());
            conditions.push(format!("object_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(action.as_str().into());
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref actor) = filter.actor_id {
            params.push(actor.as_str().into());
            conditions.push(format!("user_id = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or_else(|| self.default_limit());

        let sql = domains
            .iter()
            .map(|d| format!("{}{where_clause}", select_records(*d)))
            .collect::<Vec<_>>()
            .join(" UNION ALL ");
        let sql = format!("{sql} ORDER BY action_date, id LIMIT {limit}");

        let rows = self
            .db()
            .conn()
            .await
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        AuditCursor::new(rows, self.db().gate()).into_vec().await
    }

    /// The link row for `record`, if it still exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn audit_link_for(
        &self,
        record: &AuditRecord,
    ) -> Result<Option<AuditLink>, DatabaseError> {
        let entity = record.entity_type;
        let sql = format!(
            "SELECT id, action_id, {} FROM {} WHERE action_id = ?1",
            entity.link_column(),
            entity.link_table()
        );
        let conn = self.db().conn().await;
        let mut rows = conn.query(&sql, [record.id.as_str()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(AuditLink {
                id: row.get::<i64>(0)?,
                action_id: row.get::<String>(1)?,
                entity_type: entity,
                target_id: row.get::<String>(2)?,
            })),
            None => Ok(None),
        }
    }

    /// The actor who performed `record`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the actor no longer exists.
    pub async fn record_actor(&self, record: &AuditRecord) -> Result<Actor, DatabaseError> {
        self.get_actor(&record.actor_id).await
    }

    /// Number of records in one trail.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_audit_records(&self, domain: AuditDomain) -> Result<i64, DatabaseError> {
        self.count_rows(domain.actions_table()).await
    }

    /// Number of links for one entity type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_links(&self, entity_type: EntityType) -> Result<i64, DatabaseError> {
        self.count_rows(entity_type.link_table()).await
    }

    async fn count_rows(&self, table: &str) -> Result<i64, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::gestion::delivery::NewDelivery;
    use crate::repos::recipes::recipe::NewRecipe;
    use crate::test_support::helpers::{create_test_actor, test_service};
    use crate::updates::delivery::DeliveryUpdateBuilder;
    use farm_core::entities::Delivery;
    use pretty_assertions::assert_eq;

    async fn delivery_with_update(svc: &FarmService, actor: &str) -> Delivery {
        let delivery = svc
            .create_delivery(actor, NewDelivery::new(crate::helpers::now_micros(), 12, "morning"))
            .await
            .unwrap();
        svc.update_delivery(
            actor,
            &delivery.id,
            DeliveryUpdateBuilder::new().liter(14).build(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn history_is_ascending_and_repeatable() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let delivery = delivery_with_update(&svc, &actor.id).await;

        let first = svc.history(EntityType::Delivery, &delivery.id).await.unwrap();
        let second = svc.history(EntityType::Delivery, &delivery.id).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].action, ActionKind::Create);
        assert_eq!(first[1].action, ActionKind::Update);
        assert!(first[0].action_date < first[1].action_date);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn cursor_yields_lazily() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let delivery = delivery_with_update(&svc, &actor.id).await;

        let mut cursor = svc.history_cursor(&delivery.audit_target()).await.unwrap();
        let first = cursor.next_record().await.unwrap().unwrap();
        assert_eq!(first.action, ActionKind::Create);
        let second = cursor.next_record().await.unwrap().unwrap();
        assert_eq!(second.action, ActionKind::Update);
        assert!(cursor.next_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn actions_by_spans_both_trails() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        delivery_with_update(&svc, &actor.id).await;
        svc.create_recipe(&actor.id, NewRecipe::new("Tomme"))
            .await
            .unwrap();

        let actions = svc.actions_by(&actor.id).await.unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].domain, AuditDomain::Gestion);
        assert_eq!(actions[2].domain, AuditDomain::Recipes);
        assert_eq!(actions[2].entity_type, EntityType::Recipe);
        for pair in actions.windows(2) {
            assert!(pair[0].action_date < pair[1].action_date);
        }
    }

    #[tokio::test]
    async fn get_audit_record_by_id() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let delivery = delivery_with_update(&svc, &actor.id).await;
        let history = svc.history(EntityType::Delivery, &delivery.id).await.unwrap();

        let fetched = svc.get_audit_record(&history[1].id).await.unwrap();
        assert_eq!(fetched, history[1]);
        assert!(matches!(
            svc.get_audit_record("gac-00000000").await,
            Err(DatabaseError::NoResult)
        ));
    }

    #[tokio::test]
    async fn filter_by_action_and_domain() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        delivery_with_update(&svc, &actor.id).await;
        svc.create_recipe(&actor.id, NewRecipe::new("Savon lait"))
            .await
            .unwrap();

        let creates = svc
            .query_audit(&AuditFilter {
                action: Some(ActionKind::Create),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(creates.len(), 2);

        let recipes = svc
            .query_audit(&AuditFilter {
                domain: Some(AuditDomain::Recipes),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(recipes.len(), 1);

        let none = svc
            .query_audit(&AuditFilter {
                domain: Some(AuditDomain::Gestion),
                entity_type: Some(EntityType::Recipe),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn filter_respects_limit() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        delivery_with_update(&svc, &actor.id).await;
        delivery_with_update(&svc, &actor.id).await;

        let limited = svc
            .query_audit(&AuditFilter {
                actor_id: Some(actor.id.clone()),
                limit: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 3);
    }

    #[tokio::test]
    async fn link_and_actor_lookup() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let delivery = delivery_with_update(&svc, &actor.id).await;

        let linked = svc.linked_history(&delivery).await.unwrap();
        assert_eq!(linked.len(), 2);

        let link = svc.audit_link_for(&linked[0]).await.unwrap().unwrap();
        assert_eq!(link.target_id, delivery.id);
        assert_eq!(link.entity_type, EntityType::Delivery);

        let who = svc.record_actor(&linked[0]).await.unwrap();
        assert_eq!(who, actor);
    }
}
