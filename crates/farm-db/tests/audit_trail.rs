//! Audit trail integration tests.
//!
//! Drives the public `FarmService` API end to end:
//! - record + link pairing and the CREATE/UPDATE scenario
//! - history and actions_by ordering and repeatability
//! - cascades on actor and target deletion
//! - rejection paths that must persist nothing

use chrono::Utc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use farm_config::FarmConfig;
use farm_core::auditable::{AuditTarget, Auditable};
use farm_core::enums::{ActionKind, ActorRole, AuditDomain};
use farm_core::registry::EntityType;
use farm_db::error::DatabaseError;
use farm_db::repos::audit::AuditFilter;
use farm_db::repos::gestion::delivery::NewDelivery;
use farm_db::repos::recipes::recipe::NewRecipe;
use farm_db::service::FarmService;
use farm_db::updates::delivery::DeliveryUpdateBuilder;

async fn test_service() -> FarmService {
    FarmService::new_local(":memory:").await.unwrap()
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_update_delivery() {
    let svc = test_service().await;
    let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();

    let d = svc
        .create_delivery(&a.id, NewDelivery::new(Utc::now(), 30, ""))
        .await
        .unwrap();
    svc.update_delivery(&a.id, &d.id, DeliveryUpdateBuilder::new().liter(32).build())
        .await
        .unwrap();

    let history = svc.history(EntityType::Delivery, &d.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, ActionKind::Create);
    assert_eq!(history[1].action, ActionKind::Update);
    assert!(history[0].action_date < history[1].action_date);

    let by_actor = svc.actions_by(&a.id).await.unwrap();
    assert_eq!(by_actor, history);

    for record in &history {
        let link = svc.audit_link_for(record).await.unwrap().unwrap();
        assert_eq!(link.target_id, d.id);
        assert_eq!(record.to_string(), format!("{} - delivery - {}", record.action, d.id));
    }
}

#[tokio::test]
async fn history_is_repeatable_after_more_mutations() {
    let svc = test_service().await;
    let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();
    let d = svc
        .create_delivery(&a.id, NewDelivery::on(Utc::now()))
        .await
        .unwrap();

    let before = svc.history(EntityType::Delivery, &d.id).await.unwrap();
    assert_eq!(before, svc.history(EntityType::Delivery, &d.id).await.unwrap());

    svc.update_delivery(&a.id, &d.id, DeliveryUpdateBuilder::new().comment("x").build())
        .await
        .unwrap();
    let after = svc.history(EntityType::Delivery, &d.id).await.unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
}

// ---------------------------------------------------------------------------
// Cascades
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deleting_actor_cascades_records_and_links() {
    let svc = test_service().await;
    let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();
    let b = svc.create_actor("bruno", ActorRole::Sales).await.unwrap();

    let d = svc
        .create_delivery(&a.id, NewDelivery::on(Utc::now()))
        .await
        .unwrap();
    svc.update_delivery(&b.id, &d.id, DeliveryUpdateBuilder::new().liter(4).build())
        .await
        .unwrap();
    svc.create_recipe(&a.id, NewRecipe::new("Tomme")).await.unwrap();

    svc.delete_actor(&a.id).await.unwrap();

    assert!(svc.actions_by(&a.id).await.unwrap().is_empty());
    let history = svc.history(EntityType::Delivery, &d.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].actor_id, b.id);
    assert_eq!(svc.count_links(EntityType::Delivery).await.unwrap(), 1);
    assert_eq!(svc.count_links(EntityType::Recipe).await.unwrap(), 0);
    assert_eq!(svc.count_audit_records(AuditDomain::Recipes).await.unwrap(), 0);

    // The target rows themselves are untouched.
    assert!(svc.get_delivery(&d.id).await.is_ok());
}

#[tokio::test]
async fn deleting_target_cascades_only_its_links() {
    let svc = test_service().await;
    let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();
    let d1 = svc
        .create_delivery(&a.id, NewDelivery::on(Utc::now()))
        .await
        .unwrap();
    let d2 = svc
        .create_delivery(&a.id, NewDelivery::on(Utc::now()))
        .await
        .unwrap();

    svc.db()
        .conn()
        .await
        .execute("DELETE FROM deliveries WHERE id = ?1", [d1.id.as_str()])
        .await
        .unwrap();

    assert_eq!(svc.count_links(EntityType::Delivery).await.unwrap(), 1);
    assert_eq!(svc.linked_history(&d2).await.unwrap().len(), 1);
    // Records keep their weak reference to the deleted row.
    assert_eq!(svc.history(EntityType::Delivery, &d1.id).await.unwrap().len(), 1);
    assert_eq!(svc.count_audit_records(AuditDomain::Gestion).await.unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_action_kind_persists_nothing() {
    let svc = test_service().await;
    let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();
    let d = svc
        .create_delivery(&a.id, NewDelivery::on(Utc::now()))
        .await
        .unwrap();

    let mut tx = svc.begin_audited().await.unwrap();
    let result = tx.record_named("INVALID", &a.id, &d.audit_target()).await;
    assert!(matches!(result, Err(DatabaseError::Validation(_))));
    tx.rollback().await.unwrap();

    assert_eq!(svc.history(EntityType::Delivery, &d.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_actor_or_target() {
    let svc = test_service().await;
    let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();
    let d = svc
        .create_delivery(&a.id, NewDelivery::on(Utc::now()))
        .await
        .unwrap();

    let result = svc
        .record_mutation(ActionKind::Update, "usr-nobody00", &d)
        .await;
    assert!(matches!(result, Err(DatabaseError::Reference(_))));

    let mut tx = svc.begin_audited().await.unwrap();
    let result = tx
        .record(
            ActionKind::Update,
            &a.id,
            &AuditTarget::new(EntityType::Recipe, "rcp-nothing0"),
        )
        .await;
    assert!(matches!(result, Err(DatabaseError::Reference(_))));
    tx.rollback().await.unwrap();

    assert_eq!(svc.actions_by(&a.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn record_mutation_pairs_record_and_link() {
    let svc = test_service().await;
    let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();
    let d = svc
        .create_delivery(&a.id, NewDelivery::on(Utc::now()))
        .await
        .unwrap();

    let record = svc
        .record_mutation(ActionKind::Update, &a.id, &d)
        .await
        .unwrap();
    assert_eq!(record.domain, AuditDomain::Gestion);
    assert!(record.id.starts_with("gac-"));
    assert_eq!(svc.count_links(EntityType::Delivery).await.unwrap(), 2);
    assert_eq!(svc.get_audit_record(&record.id).await.unwrap(), record);
}

// ---------------------------------------------------------------------------
// Filters and configuration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn configured_default_limit_applies() {
    let mut config = FarmConfig::default();
    config.database.path = ":memory:".into();
    config.audit.default_limit = 2;
    let svc = FarmService::from_config(&config).await.unwrap();
    assert_eq!(svc.default_limit(), 2);

    let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();
    for _ in 0..3 {
        svc.create_delivery(&a.id, NewDelivery::on(Utc::now()))
            .await
            .unwrap();
    }

    let limited = svc.query_audit(&AuditFilter::default()).await.unwrap();
    assert_eq!(limited.len(), 2);
    let all = svc
        .query_audit(&AuditFilter {
            limit: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn trail_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("farm.db");
    let path = path.to_str().unwrap();

    let (actor_id, delivery_id) = {
        let svc = FarmService::new_local(path).await.unwrap();
        let a = svc.create_actor("alice", ActorRole::Admin).await.unwrap();
        let d = svc
            .create_delivery(&a.id, NewDelivery::on(Utc::now()))
            .await
            .unwrap();
        (a.id, d.id)
    };

    let svc = FarmService::new_local(path).await.unwrap();
    let history = svc.history(EntityType::Delivery, &delivery_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].actor_id, actor_id);

    let a = svc.get_actor(&actor_id).await.unwrap();
    svc.update_delivery(&a.id, &delivery_id, DeliveryUpdateBuilder::new().liter(2).build())
        .await
        .unwrap();
    let history = svc.history(EntityType::Delivery, &delivery_id).await.unwrap();
    assert!(history[0].action_date < history[1].action_date);
}
