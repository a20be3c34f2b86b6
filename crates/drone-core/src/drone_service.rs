//! Drone Core (C4): validates every status transition against
//! [`DroneStatus::allowed_targets`] before delegating to the Storage
//! Gateway, and keeps the Cache Accessor in lockstep on every write
//! (spec.md §4.4).

use std::sync::Arc;

use drone_domain::{
    Actor, CreateDroneRequest, Drone, DroneFilter, DroneStatus, Page, Pagination,
    ProcessHeartbeatRequest, UpdateDroneRequest,
};
use drone_persistence::{keys, DroneRepository, SharedCacheClient};
use tracing::{info, warn};

use crate::error::{CoreError, Result};

pub struct DroneService {
    repo: Arc<dyn DroneRepository>,
    cache: SharedCacheClient,
}

impl DroneService {
    #[must_use]
    pub const fn new(repo: Arc<dyn DroneRepository>, cache: SharedCacheClient) -> Self {
        Self { repo, cache }
    }

    pub async fn create(&self, spec: &CreateDroneRequest, created_by_id: uuid::Uuid) -> Result<Drone> {
        let drone = self.repo.create(spec, created_by_id).await?;
        self.warm_cache(&drone).await;
        Ok(drone)
    }

    pub async fn get(&self, id: uuid::Uuid) -> Result<Drone> {
        if let Some(cached) = self
            .cache
            .get_json(&keys::drone(id))
            .await
            .unwrap_or(None)
            .and_then(|value| serde_json::from_value::<Drone>(value).ok())
        {
            return Ok(cached);
        }
        let drone = self.repo.get(id).await?.ok_or_else(drone_domain::DomainError::drone_not_found)?;
        self.warm_cache(&drone).await;
        Ok(drone)
    }

    pub async fn list(&self, filter: &DroneFilter, pagination: Pagination) -> Result<Page<Drone>> {
        Ok(self.repo.list(filter, pagination).await?)
    }

    pub async fn nearby(&self, center_lat: f64, center_lon: f64, radius_km: f64) -> Result<Vec<Drone>> {
        Ok(self.repo.nearby(center_lat, center_lon, radius_km).await?)
    }

    pub async fn update(&self, id: uuid::Uuid, patch: UpdateDroneRequest) -> Result<Drone> {
        let drone = self.repo.update(id, patch).await?.ok_or_else(drone_domain::DomainError::drone_not_found)?;
        self.warm_cache(&drone).await;
        Ok(drone)
    }

    /// Validates `to` against the drone's current status, then delegates
    /// to `set_status_broken` (transactional fanout) or a plain status
    /// write depending on the target.
    pub async fn update_status(&self, actor: &Actor, id: uuid::Uuid, to: DroneStatus) -> Result<Drone> {
        let current = self.repo.get(id).await?.ok_or_else(drone_domain::DomainError::drone_not_found)?;
        current.status.transition_to(to).map_err(CoreError::Domain)?;

        let updated = if to == DroneStatus::Broken {
            self.repo.set_status_broken(id, actor.id).await?
        } else {
            self.repo.update_status_plain(id, to, actor.id).await?
        }
        .ok_or_else(drone_domain::DomainError::drone_not_found)?;

        if to == DroneStatus::Broken {
            warn!(drone_id = %id, "drone marked broken; carried orders fanned out to handoff");
        }
        self.warm_cache(&updated).await;
        Ok(updated)
    }

    /// Delegates to the transactional heartbeat write and refreshes the
    /// cache. Never publishes an event — telemetry volume makes this the
    /// one write path explicitly excluded from the event bus (spec.md
    /// §4.3's Non-goals).
    pub async fn process_heartbeat(
        &self,
        actor: &Actor,
        drone_id: uuid::Uuid,
        sample: &ProcessHeartbeatRequest,
    ) -> Result<Drone> {
        let updated = self
            .repo
            .process_heartbeat(drone_id, actor.id, sample)
            .await?
            .ok_or_else(drone_domain::DomainError::drone_not_found)?;
        self.warm_cache(&updated).await;
        Ok(updated)
    }

    async fn warm_cache(&self, drone: &Drone) {
        let ttl = self.cache.ttl().entity;
        let result = match serde_json::to_value(drone) {
            Ok(value) => self.cache.set_json(&keys::drone(drone.id), value, ttl).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            // Cache misses/write failures never fail the caller (spec.md §7).
            info!(error = %err, drone_id = %drone.id, "cache refresh failed");
        }
    }
}
