//! Shared test utilities for farm-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use farm_core::entities::Actor;
    use farm_core::enums::ActorRole;

    use crate::FarmDb;
    use crate::service::FarmService;

    /// Create an in-memory FarmService.
    pub async fn test_service() -> FarmService {
        let db = FarmDb::open_local(":memory:").await.unwrap();
        FarmService::from_db(db)
    }

    /// Create an ADMIN actor (convenience for tests that mutate entities).
    pub async fn create_test_actor(svc: &FarmService) -> Actor {
        svc.create_actor("admin", ActorRole::Admin).await.unwrap()
    }
}
