//! End-to-end scenario tests exercising `DroneService`/`OrderService`
//! against the in-memory fakes, mirroring spec.md §8's concrete
//! scenarios and cross-cutting invariants. Unlike the narrow unit tests
//! scattered across this crate's other modules, these drive a full
//! transition sequence and assert on both aggregates at once — the
//! thing no single-repository unit test can see.
#![cfg(test)]

use std::sync::Arc;

use chrono::Utc;
use drone_domain::{
    Actor, CreateDroneRequest, CreateOrderRequest, Drone, DroneStatus, Order, OrderStatus,
};
use drone_events::NoopEventSink;
use drone_persistence::{shared_cache, InMemoryCache};
use uuid::Uuid;

use crate::test_support::in_memory_repositories;
use crate::{DroneService, OrderService};

const CORR: &str = "test-correlation-id";

fn make_services() -> (DroneService, OrderService) {
    let (drone_repo, order_repo) = in_memory_repositories();
    let cache = shared_cache(InMemoryCache::new().into());
    let drones = DroneService::new(drone_repo.clone(), cache.clone());
    let orders = OrderService::new(order_repo, drone_repo, cache, Arc::new(NoopEventSink));
    (drones, orders)
}

fn create_drone_request(user_id: Uuid) -> CreateDroneRequest {
    CreateDroneRequest {
        drone_identifier: "DR-001".to_string(),
        model: "Falcon".to_string(),
        serial_number: "SN-0001-AB".to_string(),
        manufacturer: "Acme".to_string(),
        max_weight_kg: 5.0,
        max_speed_kmh: 60.0,
        max_range_km: 20.0,
        battery_capacity_mah: 5000,
        user_id,
    }
}

fn create_order_request() -> CreateOrderRequest {
    CreateOrderRequest {
        receiver_name: "Receiver".to_string(),
        receiver_phone: "+966512345678".to_string(),
        package_weight_kg: 1.0,
        delivery_note: None,
        origin_address: "Origin".to_string(),
        origin_lat: 24.70,
        origin_lon: 46.67,
        destination_address: "Destination".to_string(),
        destination_lat: 24.80,
        destination_lon: 46.75,
        scheduled_at: None,
    }
}

// ---- S1: happy-path delivery ----

#[tokio::test]
async fn s1_happy_path_delivery_through_every_transition() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let enduser = Actor::enduser(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_actor = Actor::drone(Uuid::new_v4(), drone.id);

    let order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    let reserved = order_service.reserve(&drone_actor, CORR, order.id).await.unwrap();
    assert_eq!(reserved.status, OrderStatus::Reserved);
    assert_eq!(reserved.drone_id, Some(drone.id));
    let drone = drone_service.get(drone.id).await.unwrap();
    assert_eq!(drone.status, DroneStatus::Loading);

    let heartbeat = drone_domain::ProcessHeartbeatRequest {
        lat: 24.71,
        lon: 46.68,
        altitude: 40.0,
        battery_level_percent: 95,
    };
    let drone = drone_service.process_heartbeat(&drone_actor, drone.id, &heartbeat).await.unwrap();
    assert_eq!(drone.current_lat, Some(24.71));

    let picked_up = order_service.confirm_pickup(&drone_actor, CORR, order.id).await.unwrap();
    assert_eq!(picked_up.status, OrderStatus::PickedUp);

    let in_transit = order_service.start_transit(&drone_actor, CORR, order.id).await.unwrap();
    assert_eq!(in_transit.status, OrderStatus::InTransit);
    let drone = drone_service.get(drone.id).await.unwrap();
    assert_eq!(drone.status, DroneStatus::Delivering);

    // Heartbeat while in transit must propagate to the order too (P5).
    let heartbeat2 = drone_domain::ProcessHeartbeatRequest {
        lat: 24.75,
        lon: 46.70,
        altitude: 35.0,
        battery_level_percent: 80,
    };
    drone_service.process_heartbeat(&drone_actor, drone.id, &heartbeat2).await.unwrap();
    let order_after_heartbeat = order_service.get(order.id, &Default::default()).await.unwrap();
    assert_eq!(order_after_heartbeat.current_lat, Some(24.75));

    let arrived = order_service.confirm_arrived(&drone_actor, CORR, order.id).await.unwrap();
    assert_eq!(arrived.status, OrderStatus::Arrived);

    let delivered = order_service.confirm_delivery(&drone_actor, CORR, order.id).await.unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.drone_id, None, "carrier is detached on delivery (I2)");
    assert_eq!(delivered.delivered_by_drone_id, Some(drone.id), "sticky attribution (P7)");
    assert!(delivered.delivered_at.is_some());

    let drone = drone_service.get(drone.id).await.unwrap();
    assert_eq!(drone.status, DroneStatus::Returning);
}

// ---- S2: double reservation race ----

#[tokio::test]
async fn s2_second_reservation_is_rejected() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let enduser = Actor::enduser(Uuid::new_v4());

    let drone_a = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_b = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let actor_a = Actor::drone(Uuid::new_v4(), drone_a.id);
    let actor_b = Actor::drone(Uuid::new_v4(), drone_b.id);

    let order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();

    order_service.reserve(&actor_a, CORR, order.id).await.unwrap();
    let err = order_service.reserve(&actor_b, CORR, order.id).await.unwrap_err();
    let domain = err.into_domain().unwrap();
    assert_eq!(domain.message, "Order has already been reserved");
}

// ---- S3: broken-drone fanout then reassign ----

#[tokio::test]
async fn s3_broken_drone_fanout_then_reassign_and_restart() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let enduser = Actor::enduser(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_actor = Actor::drone(Uuid::new_v4(), drone.id);

    let order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    order_service.reserve(&drone_actor, CORR, order.id).await.unwrap();
    order_service.confirm_pickup(&drone_actor, CORR, order.id).await.unwrap();
    order_service.start_transit(&drone_actor, CORR, order.id).await.unwrap();

    // The carrying drone breaks mid-flight: I4's fanout detaches the order
    // into `handoff` in the same transactional step.
    let broken = drone_service.update_status(&admin, drone.id, DroneStatus::Broken).await.unwrap();
    assert_eq!(broken.status, DroneStatus::Broken);

    let fanned_out = order_service.get(order.id, &Default::default()).await.unwrap();
    assert_eq!(fanned_out.status, OrderStatus::Handoff);
    assert_eq!(fanned_out.drone_id, None);

    // Admin repairs the broken drone back to operational service...
    drone_service.update_status(&admin, drone.id, DroneStatus::UnderRepair).await.unwrap();
    drone_service.update_status(&admin, drone.id, DroneStatus::Maintenanced).await.unwrap();
    let repaired = drone_service.update_status(&admin, drone.id, DroneStatus::Idle).await.unwrap();
    assert_eq!(repaired.status, DroneStatus::Idle);

    // ...and a second, idle drone picks the handed-off order up via reassign.
    let rescue_drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let rescue_actor = Actor::drone(Uuid::new_v4(), rescue_drone.id);

    let reassigned = order_service.reassign(&admin, CORR, order.id, rescue_drone.id).await.unwrap();
    assert_eq!(reassigned.status, OrderStatus::Reassigned);
    assert_eq!(reassigned.drone_id, Some(rescue_drone.id));

    let resumed = order_service.start_transit(&rescue_actor, CORR, order.id).await.unwrap();
    assert_eq!(resumed.status, OrderStatus::InTransit);
}

// ---- S4: illegal drone transition ----

#[tokio::test]
async fn s4_illegal_drone_transition_carries_source_state_message() {
    let (drone_service, _order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    assert_eq!(drone.status, DroneStatus::Idle);

    // idle can only go to loading, charging, maintenanced, broken — not delivering.
    let err = drone_service
        .update_status(&admin, drone.id, DroneStatus::Delivering)
        .await
        .unwrap_err();
    let domain = err.into_domain().unwrap();
    assert_eq!(domain.message, "idle can only transition to loading, charging, maintenanced, broken");
}

// ---- S5: scope enforcement surfaces as not-found ----

#[tokio::test]
async fn s5_order_outside_scope_is_not_found_not_forbidden() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let owner = Actor::enduser(Uuid::new_v4());
    let stranger = Actor::enduser(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_actor = Actor::drone(Uuid::new_v4(), drone.id);

    let order = order_service.create(&owner, CORR, &create_order_request()).await.unwrap();
    order_service.reserve(&drone_actor, CORR, order.id).await.unwrap();

    let err = order_service.withdraw(&stranger, CORR, order.id).await.unwrap_err();
    let domain = err.into_domain().unwrap();
    assert_eq!(domain.message, "Order not found", "scope mismatch must look identical to a missing order");
}

// ---- S6: withdrawal from the wrong state ----

#[tokio::test]
async fn s6_withdraw_after_reservation_is_rejected() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let enduser = Actor::enduser(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_actor = Actor::drone(Uuid::new_v4(), drone.id);

    let order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    order_service.reserve(&drone_actor, CORR, order.id).await.unwrap();

    let err = order_service.withdraw(&enduser, CORR, order.id).await.unwrap_err();
    let domain = err.into_domain().unwrap();
    assert_eq!(domain.message, "Only pending orders can be withdrawn");
}

#[tokio::test]
async fn withdrawing_twice_reports_already_withdrawn() {
    let (_drone_service, order_service) = make_services();
    let enduser = Actor::enduser(Uuid::new_v4());

    let order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    order_service.withdraw(&enduser, CORR, order.id).await.unwrap();

    let err = order_service.withdraw(&enduser, CORR, order.id).await.unwrap_err();
    let domain = err.into_domain().unwrap();
    assert_eq!(domain.message, "Order has already been withdrawn");
}

// ---- property-style invariants ----

#[tokio::test]
async fn p4_drone_carries_at_most_one_active_order_at_a_time() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let enduser = Actor::enduser(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_actor = Actor::drone(Uuid::new_v4(), drone.id);

    let first = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    let second = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();

    order_service.reserve(&drone_actor, CORR, first.id).await.unwrap();

    // The drone is no longer idle, so a second reservation attempt must
    // fail with the drone-busy rejection dispatched by its current status.
    let err = order_service.reserve(&drone_actor, CORR, second.id).await.unwrap_err();
    let domain = err.into_domain().unwrap();
    assert_eq!(domain.message, "Drone is currently loading a package");
}

#[tokio::test]
async fn p7_delivered_by_drone_id_is_set_once_and_never_cleared_by_later_reassignment() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let enduser = Actor::enduser(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_actor = Actor::drone(Uuid::new_v4(), drone.id);

    let order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    order_service.reserve(&drone_actor, CORR, order.id).await.unwrap();
    order_service.confirm_pickup(&drone_actor, CORR, order.id).await.unwrap();
    order_service.start_transit(&drone_actor, CORR, order.id).await.unwrap();
    order_service.confirm_arrived(&drone_actor, CORR, order.id).await.unwrap();
    let delivered = order_service.confirm_delivery(&drone_actor, CORR, order.id).await.unwrap();

    assert_eq!(delivered.delivered_by_drone_id, Some(drone.id));
    assert_eq!(delivered.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn delivery_failure_does_not_detach_the_carrying_drone() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let enduser = Actor::enduser(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_actor = Actor::drone(Uuid::new_v4(), drone.id);

    let order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    order_service.reserve(&drone_actor, CORR, order.id).await.unwrap();
    order_service.confirm_pickup(&drone_actor, CORR, order.id).await.unwrap();

    let failed = order_service.delivery_failed(&drone_actor, CORR, order.id).await.unwrap();
    assert_eq!(failed.status, OrderStatus::Failed);
    assert_eq!(failed.drone_id, Some(drone.id), "failed orders stay attached to their carrier");

    // Only an admin can hand a failed order off.
    let handed_off = order_service.handoff(&admin, CORR, order.id).await.unwrap();
    assert_eq!(handed_off.status, OrderStatus::Handoff);
    assert_eq!(handed_off.drone_id, None, "handoff is the point at which the carrier is released");
}

#[tokio::test]
async fn reassign_rejects_a_busy_replacement_drone() {
    let (drone_service, order_service) = make_services();
    let admin = Actor::admin(Uuid::new_v4());
    let enduser = Actor::enduser(Uuid::new_v4());

    let drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let drone_actor = Actor::drone(Uuid::new_v4(), drone.id);
    let order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    order_service.reserve(&drone_actor, CORR, order.id).await.unwrap();
    order_service.confirm_pickup(&drone_actor, CORR, order.id).await.unwrap();
    order_service.delivery_failed(&drone_actor, CORR, order.id).await.unwrap();
    order_service.handoff(&admin, CORR, order.id).await.unwrap();

    // A second drone that is already loading another order is not eligible.
    let busy_drone = drone_service.create(&create_drone_request(admin.id), admin.id).await.unwrap();
    let busy_actor = Actor::drone(Uuid::new_v4(), busy_drone.id);
    let other_order = order_service.create(&enduser, CORR, &create_order_request()).await.unwrap();
    order_service.reserve(&busy_actor, CORR, other_order.id).await.unwrap();

    let err = order_service.reassign(&admin, CORR, order.id, busy_drone.id).await.unwrap_err();
    let domain = err.into_domain().unwrap();
    assert_eq!(domain.message, "Drone is currently loading a package");
}

// Sanity checks for the seed helpers used by scenarios that need drones
// or orders starting mid-lifecycle rather than freshly created.
#[tokio::test]
async fn seeded_mid_lifecycle_drone_is_visible_through_the_service() {
    let (drone_repo, _order_repo) = in_memory_repositories();
    let now = Utc::now();
    let id = Uuid::new_v4();
    drone_repo.seed(Drone {
        id,
        drone_identifier: "DR-SEED".to_string(),
        user_id: Uuid::new_v4(),
        model: "Falcon".to_string(),
        serial_number: "SN-SEED-01".to_string(),
        manufacturer: "Acme".to_string(),
        max_weight_kg: 5.0,
        max_speed_kmh: 60.0,
        max_range_km: 20.0,
        battery_capacity_mah: 5000,
        status: DroneStatus::Delivering,
        battery_level_percent: 50,
        current_lat: Some(24.0),
        current_lon: Some(46.0),
        current_altitude: Some(30.0),
        last_location_update_at: Some(now),
        total_flight_hours: 12.5,
        total_deliveries: 3,
        last_maintenance_at: None,
        next_maintenance_due_at: None,
        created_at: now,
        updated_at: now,
        active: true,
        created_by_id: None,
        updated_by_id: None,
    });

    let cache = shared_cache(InMemoryCache::new().into());
    let drones = DroneService::new(drone_repo, cache);
    let fetched = drones.get(id).await.unwrap();
    assert_eq!(fetched.status, DroneStatus::Delivering);
}

#[tokio::test]
async fn seeded_order_is_visible_through_the_service() {
    let (_drone_repo, order_repo) = in_memory_repositories();
    let now = Utc::now();
    let id = Uuid::new_v4();
    order_repo.seed(Order {
        id,
        order_number: "ORD-SEEDED".to_string(),
        user_id: Uuid::new_v4(),
        receiver_name: "Receiver".to_string(),
        receiver_phone: "+966512345678".to_string(),
        package_weight_kg: 2.0,
        delivery_note: None,
        origin_address: "Origin".to_string(),
        origin_lat: 24.70,
        origin_lon: 46.67,
        destination_address: "Destination".to_string(),
        destination_lat: 24.80,
        destination_lon: 46.75,
        status: OrderStatus::Pending,
        scheduled_at: None,
        delivered_at: None,
        cancelled_at: None,
        withdrawn_at: None,
        failed_at: None,
        estimated_arrival_at: None,
        drone_id: None,
        delivered_by_drone_id: None,
        current_lat: None,
        current_lon: None,
        current_altitude: None,
        last_location_update_at: None,
        created_at: now,
        updated_at: now,
        active: true,
        created_by_id: None,
        updated_by_id: None,
    });

    let cache = shared_cache(InMemoryCache::new().into());
    let (drone_repo, _unused) = in_memory_repositories();
    let orders = OrderService::new(order_repo, drone_repo, cache, Arc::new(NoopEventSink));
    let fetched = orders.get(id, &Default::default()).await.unwrap();
    assert_eq!(fetched.order_number, "ORD-SEEDED");
}
