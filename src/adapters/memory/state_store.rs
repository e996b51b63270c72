//! In-memory device store for tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::device::{DeviceRegistration, DeviceType};
use crate::domain::foundation::{DeviceId, DeviceUuid};
use crate::ports::{DeviceRegistry, StateStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    ids_by_uuid: HashMap<DeviceUuid, DeviceId>,
    devices: HashMap<DeviceId, DeviceRegistration>,
    states: HashMap<(DeviceId, String), String>,
    next_id: i32,
}

/// Implements [`StateStore`] and [`DeviceRegistry`] over hash maps.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeviceStore {
    tables: Arc<RwLock<Tables>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a device under a fixed ID, bypassing registration.
    pub async fn insert_device(&self, id: DeviceId, uuid: DeviceUuid) {
        let mut tables = self.tables.write().await;
        tables.next_id = tables.next_id.max(id.value());
        tables.ids_by_uuid.insert(uuid.clone(), id);
        tables.devices.insert(
            id,
            DeviceRegistration {
                uuid,
                name: String::new(),
                device_type: DeviceType::Other(String::new()),
                custom_actions: None,
            },
        );
    }

    /// Makes every subsequent state write fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn device(&self, id: DeviceId) -> Option<DeviceRegistration> {
        self.tables.read().await.devices.get(&id).cloned()
    }

    pub async fn state_count(&self) -> usize {
        self.tables.read().await.states.len()
    }
}

#[async_trait]
impl StateStore for InMemoryDeviceStore {
    async fn resolve_device_id(&self, uuid: &DeviceUuid) -> Result<DeviceId, StoreError> {
        self.tables
            .read()
            .await
            .ids_by_uuid
            .get(uuid)
            .copied()
            .ok_or_else(|| StoreError::device_uuid_not_found(uuid))
    }

    async fn resolve_uuid(&self, device_id: DeviceId) -> Result<DeviceUuid, StoreError> {
        self.tables
            .read()
            .await
            .devices
            .get(&device_id)
            .map(|device| device.uuid.clone())
            .ok_or_else(|| StoreError::device_id_not_found(device_id))
    }

    async fn upsert_state(
        &self,
        device_id: DeviceId,
        action_name: &str,
        state: &str,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("writes disabled".to_string()));
        }
        self.tables
            .write()
            .await
            .states
            .insert((device_id, action_name.to_string()), state.to_string());
        Ok(())
    }

    async fn fetch_last_state(
        &self,
        device_id: DeviceId,
        action_name: &str,
    ) -> Result<String, StoreError> {
        self.tables
            .read()
            .await
            .states
            .get(&(device_id, action_name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::state_not_found(device_id, action_name))
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceStore {
    async fn register(&self, registration: &DeviceRegistration) -> Result<DeviceId, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(id) = tables.ids_by_uuid.get(&registration.uuid).copied() {
            return Ok(id);
        }

        tables.next_id += 1;
        let id = DeviceId::new(tables.next_id);
        tables.ids_by_uuid.insert(registration.uuid.clone(), id);
        tables.devices.insert(id, registration.clone());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uuid(value: &str) -> DeviceUuid {
        DeviceUuid::new(value).unwrap()
    }

    fn registration(value: &str) -> DeviceRegistration {
        DeviceRegistration {
            uuid: uuid(value),
            name: "Lamp".to_string(),
            device_type: DeviceType::OnOff,
            custom_actions: None,
        }
    }

    #[tokio::test]
    async fn resolves_in_both_directions() {
        let store = InMemoryDeviceStore::new();
        store.insert_device(DeviceId::new(7), uuid("abc-123")).await;

        assert_eq!(store.resolve_device_id(&uuid("abc-123")).await, Ok(DeviceId::new(7)));
        assert_eq!(store.resolve_uuid(DeviceId::new(7)).await, Ok(uuid("abc-123")));
    }

    #[tokio::test]
    async fn unknown_devices_are_not_found() {
        let store = InMemoryDeviceStore::new();

        assert!(store.resolve_device_id(&uuid("nope")).await.unwrap_err().is_not_found());
        assert!(store.resolve_uuid(DeviceId::new(1)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn upsert_is_last_write_wins_and_idempotent() {
        let store = InMemoryDeviceStore::new();
        let id = DeviceId::new(7);

        store.upsert_state(id, "temp", "20").await.unwrap();
        store.upsert_state(id, "temp", "21.5").await.unwrap();
        store.upsert_state(id, "temp", "21.5").await.unwrap();

        assert_eq!(store.fetch_last_state(id, "temp").await.unwrap(), "21.5");
        assert_eq!(store.state_count().await, 1);
    }

    #[tokio::test]
    async fn missing_state_is_not_found() {
        let store = InMemoryDeviceStore::new();
        let err = store.fetch_last_state(DeviceId::new(7), "temp").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn failing_writes_surface_database_errors() {
        let store = InMemoryDeviceStore::new();
        store.set_fail_writes(true);

        let err = store.upsert_state(DeviceId::new(1), "temp", "1").await.unwrap_err();

        assert!(matches!(err, StoreError::Database(_)));
    }

    #[tokio::test]
    async fn registration_keeps_the_first_id() {
        let store = InMemoryDeviceStore::new();

        let first = store.register(&registration("lamp-1")).await.unwrap();
        let second = store.register(&registration("lamp-2")).await.unwrap();
        let again = store.register(&registration("lamp-1")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first, again);
        assert_eq!(store.resolve_device_id(&uuid("lamp-1")).await, Ok(first));
    }

    #[tokio::test]
    async fn registration_does_not_collide_with_seeded_ids() {
        let store = InMemoryDeviceStore::new();
        store.insert_device(DeviceId::new(7), uuid("seeded")).await;

        let id = store.register(&registration("fresh")).await.unwrap();

        assert_eq!(id, DeviceId::new(8));
    }

    proptest! {
        #[test]
        fn applying_an_upsert_twice_equals_applying_it_once(
            action in "[a-z_]{1,12}",
            state in ".{0,32}",
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let once = InMemoryDeviceStore::new();
                let twice = InMemoryDeviceStore::new();
                let id = DeviceId::new(3);

                once.upsert_state(id, &action, &state).await.unwrap();
                twice.upsert_state(id, &action, &state).await.unwrap();
                twice.upsert_state(id, &action, &state).await.unwrap();

                assert_eq!(
                    once.fetch_last_state(id, &action).await.unwrap(),
                    twice.fetch_last_state(id, &action).await.unwrap()
                );
                assert_eq!(once.state_count().await, twice.state_count().await);
            });
        }
    }
}
