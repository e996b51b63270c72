//! PostgreSQL implementation of StateStore and DeviceRegistry.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::device::DeviceRegistration;
use crate::domain::foundation::{DeviceId, DeviceUuid};
use crate::ports::{DeviceRegistry, StateStore, StoreError};

/// Device identity and latest-state persistence over a shared pool.
#[derive(Clone)]
pub struct PostgresDeviceStore {
    pool: PgPool,
}

impl PostgresDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Database(format!("{}: {}", context, e))
}

fn device_id_from(row: &PgRow) -> Result<DeviceId, StoreError> {
    let id: i32 = row
        .try_get("device_id")
        .map_err(|e| db_error("Failed to read device_id", e))?;
    Ok(DeviceId::new(id))
}

#[async_trait]
impl StateStore for PostgresDeviceStore {
    async fn resolve_device_id(&self, uuid: &DeviceUuid) -> Result<DeviceId, StoreError> {
        let row = sqlx::query("SELECT device_id FROM devices WHERE uuid = $1")
            .bind(uuid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to resolve device uuid", e))?;

        match row {
            Some(row) => device_id_from(&row),
            None => Err(StoreError::device_uuid_not_found(uuid)),
        }
    }

    async fn resolve_uuid(&self, device_id: DeviceId) -> Result<DeviceUuid, StoreError> {
        let row = sqlx::query("SELECT uuid FROM devices WHERE device_id = $1")
            .bind(device_id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to resolve device id", e))?;

        let Some(row) = row else {
            return Err(StoreError::device_id_not_found(device_id));
        };
        let uuid: String = row
            .try_get("uuid")
            .map_err(|e| db_error("Failed to read device uuid", e))?;
        DeviceUuid::new(uuid).map_err(|e| {
            StoreError::Database(format!("Stored uuid of device {} is invalid: {}", device_id, e))
        })
    }

    async fn upsert_state(
        &self,
        device_id: DeviceId,
        action_name: &str,
        state: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO device_states (device_id, action_name, state, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (device_id, action_name)
            DO UPDATE SET state = EXCLUDED.state, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(device_id.value())
        .bind(action_name)
        .bind(state)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upsert device state", e))?;

        Ok(())
    }

    async fn fetch_last_state(
        &self,
        device_id: DeviceId,
        action_name: &str,
    ) -> Result<String, StoreError> {
        let row = sqlx::query(
            "SELECT state FROM device_states WHERE device_id = $1 AND action_name = $2",
        )
        .bind(device_id.value())
        .bind(action_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch device state", e))?;

        let Some(row) = row else {
            return Err(StoreError::state_not_found(device_id, action_name));
        };
        row.try_get("state")
            .map_err(|e| db_error("Failed to read device state", e))
    }
}

#[async_trait]
impl DeviceRegistry for PostgresDeviceStore {
    async fn register(&self, registration: &DeviceRegistration) -> Result<DeviceId, StoreError> {
        // Existing devices only refresh last_login; the uuid keeps its id.
        let row = sqlx::query(
            r#"
            INSERT INTO devices (uuid, device_name, device_type, action_template_id, custom_actions)
            VALUES (
                $1, $2, $3,
                (SELECT action_template_id FROM action_templates WHERE device_type = $3),
                $4::jsonb
            )
            ON CONFLICT (uuid) DO UPDATE SET last_login = NOW()
            RETURNING device_id
            "#,
        )
        .bind(registration.uuid.as_str())
        .bind(&registration.name)
        .bind(registration.device_type.as_str())
        .bind(registration.custom_actions_json())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to register device", e))?;

        device_id_from(&row)
    }
}
