//! # Storage Gateway (C1) — PostgreSQL implementation
//!
//! Grounded on `original_source/internal/adapters/postgres/drones_repository.go`
//! and `orders_repository.go`: the exact SQL shapes for the
//! cross-aggregate transactions (`UpdateStatusBroken`, `ProcessHeartbeat`,
//! `UpdateOrderStatus`) are reproduced here using `sqlx`'s runtime-checked
//! query API (not the compile-time `query!` macros, since no database is
//! ever reachable while this crate is authored).
//!
//! ScyllaDB, the teacher's original backend, cannot express these
//! multi-row serializable transactions (its own `scylla_impl.rs` admits as
//! much with "simplified" placeholder logic for anything beyond single-
//! partition writes) — see DESIGN.md for this deviation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use drone_domain::{
    derived_drone_status, CreateDroneRequest, CreateOrderRequest, Drone, DroneFilter, DroneStatus,
    Order, OrderFilter, OrderStatus, Page, Pagination, ProcessHeartbeatRequest,
    UpdateDroneRequest, UpdateOrderRequest, UpdateStatusRequest,
};

use crate::error::{PersistenceError, Result};

use super::traits::{DroneRepository, OrderRepository};

#[derive(Debug, Clone)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "password".to_string(),
            dbname: "drones_db".to_string(),
            ssl_mode: "disable".to_string(),
            max_connections: 10,
        }
    }
}

impl PgConfig {
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.dbname, self.ssl_mode
        )
    }
}

/// Thin wrapper over the connection pool, shared across both repositories
/// and closed once at shutdown (spec.md §5's shared-resource policy).
#[derive(Clone)]
pub struct PgClient {
    pool: PgPool,
}

impl PgClient {
    pub async fn connect(config: &PgConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url())
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// ROW MAPPING
// =============================================================================

#[derive(Debug, FromRow)]
struct DroneRow {
    id: Uuid,
    drone_identifier: String,
    user_id: Uuid,
    model: String,
    serial_number: String,
    manufacturer: String,
    max_weight_kg: f64,
    max_speed_kmh: f64,
    max_range_km: f64,
    battery_capacity_mah: i32,
    status: String,
    battery_level_percent: i16,
    current_lat: Option<f64>,
    current_lon: Option<f64>,
    current_altitude: Option<f64>,
    last_location_update_at: Option<DateTime<Utc>>,
    total_flight_hours: f64,
    total_deliveries: i32,
    last_maintenance_at: Option<DateTime<Utc>>,
    next_maintenance_due_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    active: bool,
    created_by_id: Option<Uuid>,
    updated_by_id: Option<Uuid>,
}

impl TryFrom<DroneRow> for Drone {
    type Error = PersistenceError;

    fn try_from(r: DroneRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            drone_identifier: r.drone_identifier,
            user_id: r.user_id,
            model: r.model,
            serial_number: r.serial_number,
            manufacturer: r.manufacturer,
            max_weight_kg: r.max_weight_kg,
            max_speed_kmh: r.max_speed_kmh,
            max_range_km: r.max_range_km,
            battery_capacity_mah: r.battery_capacity_mah,
            status: status_from_wire(&r.status)?,
            battery_level_percent: r.battery_level_percent,
            current_lat: r.current_lat,
            current_lon: r.current_lon,
            current_altitude: r.current_altitude,
            last_location_update_at: r.last_location_update_at,
            total_flight_hours: r.total_flight_hours,
            total_deliveries: r.total_deliveries,
            last_maintenance_at: r.last_maintenance_at,
            next_maintenance_due_at: r.next_maintenance_due_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
            active: r.active,
            created_by_id: r.created_by_id,
            updated_by_id: r.updated_by_id,
        })
    }
}

fn status_from_wire(s: &str) -> Result<DroneStatus> {
    Ok(match s {
        "idle" => DroneStatus::Idle,
        "loading" => DroneStatus::Loading,
        "delivering" => DroneStatus::Delivering,
        "returing" => DroneStatus::Returning,
        "charging" => DroneStatus::Charging,
        "broken" => DroneStatus::Broken,
        "under_repair" => DroneStatus::UnderRepair,
        "maintenanced" => DroneStatus::Maintenanced,
        other => return Err(PersistenceError::InvalidQuery(format!("unknown drone status '{other}'"))),
    })
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Uuid,
    receiver_name: String,
    receiver_phone: String,
    package_weight_kg: f64,
    delivery_note: Option<String>,
    origin_address: String,
    origin_lat: f64,
    origin_lon: f64,
    destination_address: String,
    destination_lat: f64,
    destination_lon: f64,
    status: String,
    scheduled_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    withdrawn_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    estimated_arrival_at: Option<DateTime<Utc>>,
    drone_id: Option<Uuid>,
    delivered_by_drone_id: Option<Uuid>,
    current_lat: Option<f64>,
    current_lon: Option<f64>,
    current_altitude: Option<f64>,
    last_location_update_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    active: bool,
    created_by_id: Option<Uuid>,
    updated_by_id: Option<Uuid>,
}

impl TryFrom<OrderRow> for Order {
    type Error = PersistenceError;

    fn try_from(r: OrderRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            order_number: r.order_number,
            user_id: r.user_id,
            receiver_name: r.receiver_name,
            receiver_phone: r.receiver_phone,
            package_weight_kg: r.package_weight_kg,
            delivery_note: r.delivery_note,
            origin_address: r.origin_address,
            origin_lat: r.origin_lat,
            origin_lon: r.origin_lon,
            destination_address: r.destination_address,
            destination_lat: r.destination_lat,
            destination_lon: r.destination_lon,
            status: order_status_from_wire(&r.status)?,
            scheduled_at: r.scheduled_at,
            delivered_at: r.delivered_at,
            cancelled_at: r.cancelled_at,
            withdrawn_at: r.withdrawn_at,
            failed_at: r.failed_at,
            estimated_arrival_at: r.estimated_arrival_at,
            drone_id: r.drone_id,
            delivered_by_drone_id: r.delivered_by_drone_id,
            current_lat: r.current_lat,
            current_lon: r.current_lon,
            current_altitude: r.current_altitude,
            last_location_update_at: r.last_location_update_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
            active: r.active,
            created_by_id: r.created_by_id,
            updated_by_id: r.updated_by_id,
        })
    }
}

fn order_status_from_wire(s: &str) -> Result<OrderStatus> {
    Ok(match s {
        "pending" => OrderStatus::Pending,
        "reserved" => OrderStatus::Reserved,
        "picked_up" => OrderStatus::PickedUp,
        "in_transit" => OrderStatus::InTransit,
        "arrived" => OrderStatus::Arrived,
        "delivered" => OrderStatus::Delivered,
        "failed" => OrderStatus::Failed,
        "cancelled" => OrderStatus::Cancelled,
        "handoff" => OrderStatus::Handoff,
        "reassigned" => OrderStatus::Reassigned,
        other => return Err(PersistenceError::InvalidQuery(format!("unknown order status '{other}'"))),
    })
}

// =============================================================================
// DRONE REPOSITORY
// =============================================================================

pub struct PostgresDroneRepository {
    client: PgClient,
}

impl PostgresDroneRepository {
    #[must_use]
    pub const fn new(client: PgClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DroneRepository for PostgresDroneRepository {
    async fn create(&self, spec: &CreateDroneRequest, created_by_id: Uuid) -> Result<Drone> {
        let row: DroneRow = sqlx::query_as(
            r"
            INSERT INTO drones (
                id, drone_identifier, user_id, model, serial_number, manufacturer,
                max_weight_kg, max_speed_kmh, max_range_km, battery_capacity_mah,
                status, battery_level_percent, total_flight_hours, total_deliveries,
                created_at, updated_at, active, created_by_id, updated_by_id
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                'idle', 100, 0, 0, NOW(), NOW(), TRUE, $11, $11
            )
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(&spec.drone_identifier)
        .bind(spec.user_id)
        .bind(&spec.model)
        .bind(&spec.serial_number)
        .bind(&spec.manufacturer)
        .bind(spec.max_weight_kg)
        .bind(spec.max_speed_kmh)
        .bind(spec.max_range_km)
        .bind(spec.battery_capacity_mah)
        .bind(created_by_id)
        .fetch_one(self.client.pool())
        .await?;

        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Drone>> {
        let row: Option<DroneRow> =
            sqlx::query_as("SELECT * FROM drones WHERE id = $1 AND active = TRUE")
                .bind(id)
                .fetch_optional(self.client.pool())
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_filter(&self, filter: &DroneFilter) -> Result<Option<Drone>> {
        let page = self.list(filter, Pagination { limit: 1, offset: 0 }).await?;
        Ok(page.items.into_iter().next())
    }

    async fn list(&self, filter: &DroneFilter, pagination: Pagination) -> Result<Page<Drone>> {
        let geospatial = filter.geo.is_some();

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM drones WHERE active = TRUE");
        push_drone_predicates(&mut qb, filter);

        if let Some(geo) = filter.geo {
            let bb = drone_domain::geo::BoundingBox::around(geo.center_lat, geo.center_lon, geo.radius_km);
            qb.push(" AND current_lat BETWEEN ")
                .push_bind(bb.min_lat)
                .push(" AND ")
                .push_bind(bb.max_lat)
                .push(" AND current_lon BETWEEN ")
                .push_bind(bb.min_lon)
                .push(" AND ")
                .push_bind(bb.max_lon);
        }

        if geospatial {
            // Exact great-circle ordering happens in application code below;
            // the SQL only needs the bounding-box pre-filter.
        } else {
            qb.push(" ORDER BY created_at DESC");
        }
        qb.push(" LIMIT ").push_bind(pagination.limit).push(" OFFSET ").push_bind(pagination.offset);

        let rows: Vec<DroneRow> = qb.build_query_as().fetch_all(self.client.pool()).await?;
        let mut drones: Result<Vec<Drone>> = rows.into_iter().map(TryInto::try_into).collect();

        if let (Ok(ref mut items), Some(geo)) = (&mut drones, filter.geo) {
            items.sort_by(|a, b| {
                let da = a
                    .current_lat
                    .zip(a.current_lon)
                    .map_or(f64::MAX, |(lat, lon)| drone_domain::geo::haversine_km(geo.center_lat, geo.center_lon, lat, lon));
                let db = b
                    .current_lat
                    .zip(b.current_lon)
                    .map_or(f64::MAX, |(lat, lon)| drone_domain::geo::haversine_km(geo.center_lat, geo.center_lon, lat, lon));
                da.total_cmp(&db)
            });
        }

        let items = drones?;

        let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM drones WHERE active = TRUE");
        push_drone_predicates(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.client.pool()).await?;

        Ok(Page::new(items, total, pagination))
    }

    async fn nearby(&self, center_lat: f64, center_lon: f64, radius_km: f64) -> Result<Vec<Drone>> {
        let filter = DroneFilter {
            geo: Some(drone_domain::GeoFilter {
                center_lat,
                center_lon,
                radius_km,
            }),
            ..Default::default()
        };
        let page = self
            .list(&filter, Pagination {
                limit: drone_domain::pagination::MAX_LIMIT,
                offset: 0,
            })
            .await?;
        Ok(page.items)
    }

    async fn update(&self, id: Uuid, patch: UpdateDroneRequest) -> Result<Option<Drone>> {
        let Some(mut drone) = self.get(id).await? else {
            return Ok(None);
        };
        let updated_by_id = drone.updated_by_id.unwrap_or(drone.user_id);
        patch.apply(&mut drone, updated_by_id);

        let row: DroneRow = sqlx::query_as(
            r"
            UPDATE drones SET
                drone_identifier = $2, model = $3, manufacturer = $4,
                max_weight_kg = $5, max_speed_kmh = $6, max_range_km = $7,
                battery_capacity_mah = $8, active = $9,
                updated_by_id = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(&drone.drone_identifier)
        .bind(&drone.model)
        .bind(&drone.manufacturer)
        .bind(drone.max_weight_kg)
        .bind(drone.max_speed_kmh)
        .bind(drone.max_range_km)
        .bind(drone.battery_capacity_mah)
        .bind(drone.active)
        .bind(updated_by_id)
        .fetch_one(self.client.pool())
        .await?;

        Ok(Some(row.try_into()?))
    }

    async fn update_status_plain(&self, id: Uuid, status: DroneStatus, actor_id: Uuid) -> Result<Option<Drone>> {
        let row: Option<DroneRow> = sqlx::query_as(
            r"
            UPDATE drones SET status = $2, updated_by_id = $3, updated_at = NOW()
            WHERE id = $1 AND active = TRUE
            RETURNING *
            ",
        )
        .bind(id)
        .bind(status.as_wire_str())
        .bind(actor_id)
        .fetch_optional(self.client.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set_status_broken(&self, drone_id: Uuid, actor_id: Uuid) -> Result<Option<Drone>> {
        let mut tx = self.client.pool().begin().await?;

        let row: Option<DroneRow> = sqlx::query_as(
            r"
            UPDATE drones SET status = 'broken', updated_by_id = $2, updated_at = NOW()
            WHERE id = $1 AND active = TRUE
            RETURNING *
            ",
        )
        .bind(drone_id)
        .bind(actor_id)
        .fetch_optional(&mut *tx)
        .await?;

        if row.is_some() {
            sqlx::query(
                r"
                UPDATE orders SET status = 'handoff', drone_id = NULL, updated_at = NOW()
                WHERE drone_id = $1 AND active = TRUE
                  AND status NOT IN ('delivered', 'cancelled', 'handoff')
                ",
            )
            .bind(drone_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn process_heartbeat(
        &self,
        drone_id: Uuid,
        actor_id: Uuid,
        sample: &ProcessHeartbeatRequest,
    ) -> Result<Option<Drone>> {
        let mut tx = self.client.pool().begin().await?;

        let row: Option<DroneRow> = sqlx::query_as(
            r"
            UPDATE drones SET
                current_lat = $2, current_lon = $3, current_altitude = $4,
                battery_level_percent = $5, last_location_update_at = NOW(),
                updated_by_id = $6, updated_at = NOW()
            WHERE id = $1 AND active = TRUE
            RETURNING *
            ",
        )
        .bind(drone_id)
        .bind(sample.lat)
        .bind(sample.lon)
        .bind(sample.altitude)
        .bind(sample.battery_level_percent)
        .bind(actor_id)
        .fetch_optional(&mut *tx)
        .await?;

        if row.is_some() {
            sqlx::query(
                r"
                UPDATE orders SET
                    current_lat = $2, current_lon = $3, current_altitude = $4,
                    last_location_update_at = NOW()
                WHERE drone_id = $1 AND active = TRUE
                  AND status IN ('picked_up', 'in_transit', 'arrived', 'handoff', 'reassigned')
                ",
            )
            .bind(drone_id)
            .bind(sample.lat)
            .bind(sample.lon)
            .bind(sample.altitude)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        row.map(TryInto::try_into).transpose()
    }
}

fn push_drone_predicates(qb: &mut QueryBuilder<Postgres>, filter: &DroneFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_wire_str());
    }
    if let Some(statuses) = &filter.statuses {
        let wire: Vec<&str> = statuses.iter().map(|s| s.as_wire_str()).collect();
        qb.push(" AND status = ANY(").push_bind(wire).push(")");
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(active) = filter.active {
        qb.push(" AND active = ").push_bind(active);
    }
}

// =============================================================================
// ORDER REPOSITORY
// =============================================================================

pub struct PostgresOrderRepository {
    client: PgClient,
}

impl PostgresOrderRepository {
    #[must_use]
    pub const fn new(client: PgClient) -> Self {
        Self { client }
    }
}

fn generate_order_number() -> String {
    use rand::Rng;
    let suffix: String = rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(4)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, user_id: Uuid, spec: &CreateOrderRequest) -> Result<Order> {
        let order_number = generate_order_number();

        let row: OrderRow = sqlx::query_as(
            r"
            INSERT INTO orders (
                id, order_number, user_id, receiver_name, receiver_phone,
                package_weight_kg, delivery_note,
                origin_address, origin_lat, origin_lon,
                destination_address, destination_lat, destination_lon,
                status, scheduled_at,
                created_at, updated_at, active, created_by_id, updated_by_id
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                'pending', $14, NOW(), NOW(), TRUE, $3, $3
            )
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(&order_number)
        .bind(user_id)
        .bind(&spec.receiver_name)
        .bind(&spec.receiver_phone)
        .bind(spec.package_weight_kg)
        .bind(&spec.delivery_note)
        .bind(&spec.origin_address)
        .bind(spec.origin_lat)
        .bind(spec.origin_lon)
        .bind(&spec.destination_address)
        .bind(spec.destination_lat)
        .bind(spec.destination_lon)
        .bind(spec.scheduled_at)
        .fetch_one(self.client.pool())
        .await?;

        row.try_into()
    }

    async fn get(&self, id: Uuid, filter: &OrderFilter) -> Result<Option<Order>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM orders WHERE active = TRUE AND id = ");
        qb.push_bind(id);
        push_order_predicates(&mut qb, filter);

        let row: Option<OrderRow> = qb.build_query_as().fetch_optional(self.client.pool()).await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_filter(&self, filter: &OrderFilter) -> Result<Option<Order>> {
        let page = self.list(filter, Pagination { limit: 1, offset: 0 }).await?;
        Ok(page.items.into_iter().next())
    }

    async fn list(&self, filter: &OrderFilter, pagination: Pagination) -> Result<Page<Order>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM orders WHERE active = TRUE");
        push_order_predicates(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset);

        let rows: Vec<OrderRow> = qb.build_query_as().fetch_all(self.client.pool()).await?;
        let items: Result<Vec<Order>> = rows.into_iter().map(TryInto::try_into).collect();

        let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE active = TRUE");
        push_order_predicates(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.client.pool()).await?;

        Ok(Page::new(items?, total, pagination))
    }

    async fn update(&self, id: Uuid, patch: UpdateOrderRequest, updated_by_id: Uuid) -> Result<Option<Order>> {
        let Some(mut order) = self.get(id, &OrderFilter::default()).await? else {
            return Ok(None);
        };
        patch.apply(&mut order, updated_by_id);

        let row: OrderRow = sqlx::query_as(
            r"
            UPDATE orders SET
                receiver_name = $2, receiver_phone = $3, package_weight_kg = $4,
                delivery_note = $5, origin_address = $6, destination_address = $7,
                scheduled_at = $8, updated_by_id = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(&order.receiver_name)
        .bind(&order.receiver_phone)
        .bind(order.package_weight_kg)
        .bind(&order.delivery_note)
        .bind(&order.origin_address)
        .bind(&order.destination_address)
        .bind(order.scheduled_at)
        .bind(updated_by_id)
        .fetch_one(self.client.pool())
        .await?;

        Ok(Some(row.try_into()?))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(self.client.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_location(&self, id: Uuid, lat: f64, lon: f64, altitude: f64) -> Result<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(
            r"
            UPDATE orders SET current_lat = $2, current_lon = $3, current_altitude = $4,
                last_location_update_at = NOW()
            WHERE id = $1 AND active = TRUE
            RETURNING *
            ",
        )
        .bind(id)
        .bind(lat)
        .bind(lon)
        .bind(altitude)
        .fetch_optional(self.client.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_status(&self, id: Uuid, req: UpdateStatusRequest) -> Result<Option<Order>> {
        let mut tx = self.client.pool().begin().await?;

        let existing: Option<OrderRow> =
            sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND active = TRUE FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(existing) = existing else {
            tx.rollback().await?;
            return Ok(None);
        };

        // drone_id write policy (spec.md §4.1, DESIGN.md Reassign decision):
        // SET on `reserved` and `reassigned` (the reassign op hands the order
        // to its new carrier outright, not just `delivered_by_drone_id`),
        // CLEAR on `delivered`, otherwise COALESCE/preserve.
        let new_drone_id = match req.status {
            OrderStatus::Reserved | OrderStatus::Reassigned => req.drone_id,
            OrderStatus::Delivered => None,
            _ => existing.drone_id,
        };
        let new_delivered_by = match req.status {
            OrderStatus::Delivered | OrderStatus::Reassigned => req.drone_id.or(existing.delivered_by_drone_id),
            _ => existing.delivered_by_drone_id,
        };
        let carrier_for_drone_side_effect = match req.status {
            OrderStatus::Reserved => req.drone_id,
            _ => existing.drone_id,
        };

        let row: OrderRow = sqlx::query_as(
            r"
            UPDATE orders SET
                status = $2, drone_id = $3, delivered_by_drone_id = $4,
                delivered_at = COALESCE($5, delivered_at),
                failed_at = COALESCE($6, failed_at),
                withdrawn_at = COALESCE($7, withdrawn_at),
                cancelled_at = COALESCE($8, cancelled_at),
                updated_by_id = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(req.status.as_wire_str())
        .bind(new_drone_id)
        .bind(new_delivered_by)
        .bind(req.delivered_at)
        .bind(req.failed_at)
        .bind(req.withdrawn_at)
        .bind(req.cancelled_at)
        .bind(req.actor_id)
        .fetch_one(&mut *tx)
        .await?;

        if let (Some(derived), Some(drone_id)) = (derived_drone_status(req.status), carrier_for_drone_side_effect) {
            sqlx::query(
                r"
                UPDATE drones SET status = $2, updated_by_id = $3, updated_at = NOW()
                WHERE id = $1 AND active = TRUE
                ",
            )
            .bind(drone_id)
            .bind(derived.as_wire_str())
            .bind(req.actor_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        row.try_into().map(Some)
    }
}

fn push_order_predicates(qb: &mut QueryBuilder<Postgres>, filter: &OrderFilter) {
    if let Some(carrier) = filter.carrier_or_merge() {
        qb.push(" AND (drone_id = ").push_bind(carrier).push(" OR delivered_by_drone_id = ").push_bind(carrier).push(")");
    } else {
        if let Some(drone_id) = filter.drone_id {
            qb.push(" AND drone_id = ").push_bind(drone_id);
        }
        if let Some(delivered_by) = filter.delivered_by_drone_id {
            qb.push(" AND delivered_by_drone_id = ").push_bind(delivered_by);
        }
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_wire_str());
    }
    if let Some(q) = &filter.address_contains {
        qb.push(" AND (origin_address ILIKE ").push_bind(format!("%{q}%"))
            .push(" OR destination_address ILIKE ").push_bind(format!("%{q}%")).push(")");
    }
    if let Some(after) = filter.created_after {
        qb.push(" AND created_at >= ").push_bind(after);
    }
    if let Some(before) = filter.created_before {
        qb.push(" AND created_at <= ").push_bind(before);
    }
    if let Some(after) = filter.scheduled_after {
        qb.push(" AND scheduled_at >= ").push_bind(after);
    }
    if let Some(before) = filter.scheduled_before {
        qb.push(" AND scheduled_at <= ").push_bind(before);
    }
    if let Some(min) = filter.min_weight_kg {
        qb.push(" AND package_weight_kg >= ").push_bind(min);
    }
    if let Some(max) = filter.max_weight_kg {
        qb.push(" AND package_weight_kg <= ").push_bind(max);
    }
    if let Some(name) = &filter.receiver_name {
        qb.push(" AND receiver_name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(phone) = &filter.receiver_phone {
        qb.push(" AND receiver_phone = ").push_bind(phone.clone());
    }
}
