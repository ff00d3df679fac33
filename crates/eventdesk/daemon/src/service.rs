//! Event lifecycle with location-gated writes

use crate::error::{ServiceError, ServiceResult};
use crate::storage::EventStorage;
use eventdesk_gate::{AuthorizationGate, WriteIntent};
use eventdesk_types::{CreateEventInput, Event, EventId, UpdateEventPatch};
use std::sync::Arc;

/// Owns create/read/update/delete of event records.
///
/// The ads gate is keyed off the type a write sets, never the stored type,
/// and always completes before storage is touched.
#[derive(Clone)]
pub struct EventService {
    storage: Arc<dyn EventStorage>,
    gate: AuthorizationGate,
}

impl EventService {
    pub fn new(storage: Arc<dyn EventStorage>, gate: AuthorizationGate) -> Self {
        Self { storage, gate }
    }

    pub fn storage_backend(&self) -> &'static str {
        self.storage.backend()
    }

    /// Create an event after authorizing its type for `client_address`
    pub async fn create(&self, input: CreateEventInput, client_address: &str) -> ServiceResult<Event> {
        self.gate
            .authorize(input.event_type, client_address, WriteIntent::Create)
            .await?;

        let event = self.storage.insert(input).await?;
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Created event");
        Ok(event)
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<Event>> {
        Ok(self.storage.list().await?)
    }

    pub async fn find_one(&self, id: EventId) -> ServiceResult<Event> {
        self.storage
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Apply `patch` to an existing event.
    ///
    /// A patch that sets the gated type is authorized even when the stored
    /// record already has it; a patch without a type is never gated. Only
    /// the fields present in `patch` are written.
    pub async fn update(
        &self,
        id: EventId,
        patch: UpdateEventPatch,
        client_address: &str,
    ) -> ServiceResult<Event> {
        self.find_one(id).await?;

        if let Some(target_type) = patch.target_type() {
            self.gate
                .authorize(target_type, client_address, WriteIntent::Update)
                .await?;
        }

        // The gate may take seconds; merge into whatever is stored now.
        let updated = self
            .storage
            .update(id, &patch)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        tracing::info!(event_id = %id, event_type = %updated.event_type, "Updated event");
        Ok(updated)
    }

    pub async fn remove(&self, id: EventId) -> ServiceResult<()> {
        let event = self.find_one(id).await?;
        if !self.storage.delete(event.id).await? {
            return Err(ServiceError::NotFound(id));
        }

        tracing::info!(event_id = %id, "Deleted event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use async_trait::async_trait;
    use eventdesk_gate::{
        CountryCode, GateError, GateResult, LocationResolver, PartnerPermissionCheck,
    };
    use eventdesk_types::EventType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts lookups; loopback resolves to US, anything else fails.
    #[derive(Default)]
    struct CountingLocations {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationResolver for CountingLocations {
        async fn resolve_country(&self, address: &str) -> GateResult<CountryCode> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if address == "127.0.0.1" {
                Ok(CountryCode::new("US"))
            } else {
                Err(GateError::LocationUnavailable(format!("no route for {}", address)))
            }
        }
    }

    struct FixedPartner {
        answer: GateResult<bool>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PartnerPermissionCheck for FixedPartner {
        async fn check_permission(&self, _country: &CountryCode) -> GateResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    struct Harness {
        service: EventService,
        storage: Arc<InMemoryStorage>,
        locations: Arc<CountingLocations>,
        partner: Arc<FixedPartner>,
    }

    impl Harness {
        fn lookups(&self) -> usize {
            self.locations.calls.load(Ordering::SeqCst) + self.partner.calls.load(Ordering::SeqCst)
        }
    }

    fn harness(answer: GateResult<bool>) -> Harness {
        let storage = Arc::new(InMemoryStorage::new());
        let locations = Arc::new(CountingLocations::default());
        let partner = Arc::new(FixedPartner {
            answer,
            calls: AtomicUsize::new(0),
        });
        let gate = AuthorizationGate::new(locations.clone(), partner.clone());
        Harness {
            service: EventService::new(storage.clone(), gate),
            storage,
            locations,
            partner,
        }
    }

    fn input(event_type: EventType) -> CreateEventInput {
        CreateEventInput {
            name: "Summer campaign".to_string(),
            description: "Weekend boost".to_string(),
            event_type,
            priority: 1,
        }
    }

    #[tokio::test]
    async fn test_create_non_gated_makes_no_lookups() {
        let h = harness(Ok(false));
        let event = h
            .service
            .create(input(EventType::App), "203.0.113.7")
            .await
            .unwrap();

        assert_eq!(event.event_type, EventType::App);
        assert_eq!(h.lookups(), 0);
        assert_eq!(h.storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_ads_permitted() {
        let h = harness(Ok(true));
        let event = h
            .service
            .create(input(EventType::Ads), "127.0.0.1")
            .await
            .unwrap();

        assert_eq!(event.event_type, EventType::Ads);
        assert_eq!(h.service.find_one(event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_create_ads_denied_persists_nothing() {
        let h = harness(Ok(false));
        let err = h
            .service
            .create(input(EventType::Ads), "127.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Gate(GateError::NotAuthorized(WriteIntent::Create))
        ));
        assert!(err.to_string().contains("create ads type events"));
        assert!(h.storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_to_ads_denied_leaves_record() {
        let h = harness(Ok(false));
        let original = h
            .service
            .create(input(EventType::LiveOps), "127.0.0.1")
            .await
            .unwrap();

        let patch = UpdateEventPatch {
            event_type: Some(EventType::Ads),
            priority: Some(7),
            ..Default::default()
        };
        let err = h
            .service
            .update(original.id, patch, "127.0.0.1")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("update to ads type events"));
        assert_eq!(h.service.find_one(original.id).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_update_priority_only_skips_gate() {
        let h = harness(Err(GateError::PartnerUnavailable("down".into())));
        let original = h
            .service
            .create(input(EventType::CrossPromo), "not an address")
            .await
            .unwrap();

        let patch = UpdateEventPatch {
            priority: Some(9),
            ..Default::default()
        };
        let updated = h
            .service
            .update(original.id, patch, "not an address")
            .await
            .unwrap();

        assert_eq!(updated.priority, 9);
        assert_eq!(updated.event_type, EventType::CrossPromo);
        assert_eq!(h.lookups(), 0);
    }

    #[tokio::test]
    async fn test_update_repeating_ads_rechecks() {
        let h = harness(Ok(true));
        let event = h
            .service
            .create(input(EventType::Ads), "127.0.0.1")
            .await
            .unwrap();

        let patch = UpdateEventPatch {
            event_type: Some(EventType::Ads),
            ..Default::default()
        };
        h.service.update(event.id, patch, "127.0.0.1").await.unwrap();

        assert_eq!(h.partner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_away_from_ads_skips_gate() {
        let h = harness(Ok(true));
        let event = h
            .service
            .create(input(EventType::Ads), "127.0.0.1")
            .await
            .unwrap();
        let before = h.lookups();

        let patch = UpdateEventPatch {
            event_type: Some(EventType::App),
            ..Default::default()
        };
        let updated = h.service.update(event.id, patch, "198.51.100.1").await.unwrap();

        assert_eq!(updated.event_type, EventType::App);
        assert_eq!(h.lookups(), before);
    }

    #[tokio::test]
    async fn test_gate_dependency_failures_propagate() {
        for failure in [GateError::PartnerUnavailable("500".into()), GateError::PartnerUnauthorized] {
            let h = harness(Err(failure.clone()));
            let err = h
                .service
                .create(input(EventType::Ads), "127.0.0.1")
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Gate(ref gate) if *gate == failure));
            assert!(h.storage.list().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_location_failure_stops_before_partner() {
        let h = harness(Ok(true));
        let err = h
            .service
            .create(input(EventType::Ads), "192.0.2.10")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Gate(GateError::LocationUnavailable(_))));
        assert_eq!(h.partner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_event_is_not_found() {
        let h = harness(Ok(true));
        let missing = EventId::new(404);

        assert!(matches!(
            h.service.find_one(missing).await,
            Err(ServiceError::NotFound(id)) if id == missing
        ));
        assert!(matches!(
            h.service.remove(missing).await,
            Err(ServiceError::NotFound(_))
        ));
        let patch = UpdateEventPatch {
            event_type: Some(EventType::Ads),
            ..Default::default()
        };
        assert!(matches!(
            h.service.update(missing, patch, "127.0.0.1").await,
            Err(ServiceError::NotFound(_))
        ));
        // Not-found is decided before any gate lookup.
        assert_eq!(h.lookups(), 0);
    }

    /// Grants after a pause, like a partner round-trip.
    struct SlowPartner {
        delay: Duration,
    }

    #[async_trait]
    impl PartnerPermissionCheck for SlowPartner {
        async fn check_permission(&self, _country: &CountryCode) -> GateResult<bool> {
            tokio::time::sleep(self.delay).await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_gated_update_keeps_concurrent_write() {
        let gate = AuthorizationGate::new(
            Arc::new(CountingLocations::default()),
            Arc::new(SlowPartner {
                delay: Duration::from_millis(300),
            }),
        );
        let service = EventService::new(Arc::new(InMemoryStorage::new()), gate);
        let id = service
            .create(input(EventType::App), "127.0.0.1")
            .await
            .unwrap()
            .id;

        let to_ads = {
            let service = service.clone();
            tokio::spawn(async move {
                let patch = UpdateEventPatch {
                    event_type: Some(EventType::Ads),
                    ..Default::default()
                };
                service.update(id, patch, "127.0.0.1").await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let rename = UpdateEventPatch {
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        let renamed = service.update(id, rename, "198.51.100.1").await.unwrap();
        assert_eq!(renamed.event_type, EventType::App);

        to_ads.await.unwrap().unwrap();
        let stored = service.find_one(id).await.unwrap();
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.event_type, EventType::Ads);
    }

    #[tokio::test]
    async fn test_remove_deletes() {
        let h = harness(Ok(true));
        let event = h
            .service
            .create(input(EventType::App), "127.0.0.1")
            .await
            .unwrap();

        h.service.remove(event.id).await.unwrap();
        assert!(h.service.find_all().await.unwrap().is_empty());
    }
}
