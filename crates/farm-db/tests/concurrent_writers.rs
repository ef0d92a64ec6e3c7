//! Concurrent writers.
//!
//! Each mutation gets its own record + link transaction whether the writers
//! share one service or open separate connections to the same file, and
//! action dates stay strictly increasing across all of them.

use std::sync::Arc;

use chrono::Utc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use farm_core::entities::AuditRecord;
use farm_core::enums::{ActorRole, AuditDomain};
use farm_core::registry::EntityType;
use farm_db::repos::audit::AuditFilter;
use farm_db::repos::gestion::delivery::NewDelivery;
use farm_db::service::FarmService;

fn assert_strictly_increasing(records: &[AuditRecord]) {
    for pair in records.windows(2) {
        assert!(
            pair[0].action_date < pair[1].action_date,
            "{} ({}) !< {} ({})",
            pair[0].action_date,
            pair[0].id,
            pair[1].action_date,
            pair[1].id
        );
    }
}

async fn whole_trail(svc: &FarmService) -> Vec<AuditRecord> {
    svc.query_audit(&AuditFilter {
        limit: Some(10_000),
        ..Default::default()
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tasks_sharing_one_service() {
    let svc = Arc::new(FarmService::new_local(":memory:").await.unwrap());
    let actor = svc.create_actor("alice", ActorRole::Admin).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = Arc::clone(&svc);
        let actor_id = actor.id.clone();
        handles.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for _ in 0..25 {
                let d = svc
                    .create_delivery(&actor_id, NewDelivery::on(Utc::now()))
                    .await?;
                ids.push(d.id);
            }
            Ok::<_, farm_db::error::DatabaseError>(ids)
        }));
    }

    let mut created = Vec::new();
    for handle in handles {
        created.extend(handle.await.unwrap().unwrap());
    }
    assert_eq!(created.len(), 200);

    assert_eq!(svc.count_audit_records(AuditDomain::Gestion).await.unwrap(), 200);
    assert_eq!(svc.count_links(EntityType::Delivery).await.unwrap(), 200);
    for id in &created {
        assert_eq!(svc.history(EntityType::Delivery, id).await.unwrap().len(), 1);
    }

    let trail = whole_trail(&svc).await;
    assert_eq!(trail.len(), 200);
    assert_strictly_increasing(&trail);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_connections_to_one_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("farm.db");
    let path = path.to_str().unwrap();

    let first = Arc::new(FarmService::new_local(path).await.unwrap());
    let second = Arc::new(FarmService::new_local(path).await.unwrap());
    let actor = first.create_actor("alice", ActorRole::Admin).await.unwrap();

    let mut handles = Vec::new();
    for svc in [Arc::clone(&first), Arc::clone(&second)] {
        let actor_id = actor.id.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                svc.create_delivery(&actor_id, NewDelivery::on(Utc::now()))
                    .await?;
            }
            Ok::<_, farm_db::error::DatabaseError>(())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Both connections see the same committed trail.
    let trail = whole_trail(&first).await;
    assert_eq!(trail.len(), 100);
    assert_eq!(whole_trail(&second).await, trail);
    assert_strictly_increasing(&trail);
    assert_eq!(first.count_links(EntityType::Delivery).await.unwrap(), 100);
}
