//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use lf_api::{Backend, MemoryBackend};
use lf_core::config::{AppConfig, DatabaseConfig};
use lf_core::constants::tables;
use lf_models::Database;
use lf_services::event_bus::EventBus;
use lf_services::ServiceRegistry;

/// Create a temporary database with full schema and migrations applied.
/// Returns the Database and the TempDir (must be held alive for the duration of the test).
pub fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::default();
    let db = Database::init(&path, &config).expect("failed to init test database");
    (db, dir)
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

/// Seed a memory backend with realistic campus data.
///
/// Creates:
/// - 2 users (ana, budi) and 1 security officer (satpam1), 1 admin (root)
/// - 3 lost items and 2 found items across Jan-Mar 2024
/// - 2 activity log entries
pub fn seeded_backend() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());

    backend.seed(
        tables::USERS,
        vec![
            json!({"id": "u1", "name": "Ana Putri", "nim_nip": "2201001", "username": "ana", "password": "secret1", "created_at": "2024-01-05T08:00:00Z"}),
            json!({"id": "u2", "name": "Budi Santoso", "nim_nip": "2201002", "username": "budi", "password": "secret2", "created_at": "2024-02-05T08:00:00Z"}),
        ],
    );
    backend.seed(
        tables::SECURITY_STAFF,
        vec![json!({"id": "s1", "name": "Pak Joko", "badge_number": "SEC-01", "username": "satpam1", "password": "guard123", "created_at": "2024-01-10T08:00:00Z"})],
    );
    backend.seed(
        tables::ADMINS,
        vec![json!({"id": "a1", "name": "Admin Kampus", "username": "root", "password": "rootpw", "created_at": "2023-12-01T08:00:00Z"})],
    );

    backend.seed(
        tables::LOST_ITEMS,
        vec![
            json!({"id": "l1", "user_id": "u1", "name": "Black Wallet", "category": "accessories", "description": "Leather wallet with student card", "location": "Library 2F", "date": "2024-01-20", "status": "reported", "image_url": null, "created_at": "2024-01-20T10:00:00Z"}),
            json!({"id": "l2", "user_id": "u1", "name": "Laptop Charger", "category": "electronics", "description": "65W USB-C charger", "location": "Lab B", "date": "2024-02-11", "status": "verified", "image_url": null, "created_at": "2024-02-11T09:00:00Z"}),
            json!({"id": "l3", "user_id": "u2", "name": "Blue Umbrella", "category": "other", "description": "Folding umbrella, blue", "location": "Canteen", "date": "2024-03-02", "status": "returned", "image_url": null, "created_at": "2024-03-02T12:00:00Z"}),
        ],
    );
    backend.seed(
        tables::FOUND_ITEMS,
        vec![
            json!({"id": "f1", "user_id": "u2", "name": "Car Keys", "category": "keys", "description": "Toyota key with red keychain", "location": "Parking Lot", "date": "2024-02-20", "status": "reported", "image_url": null, "created_at": "2024-02-20T07:30:00Z"}),
            json!({"id": "f2", "user_id": "u2", "name": "Student Card", "category": "documents", "description": "Student card found near library", "location": "Library 1F", "date": "2024-03-05", "status": "matched", "image_url": null, "created_at": "2024-03-05T15:00:00Z"}),
        ],
    );

    backend.seed(
        tables::ACTIVITY_LOGS,
        vec![
            json!({"id": "g1", "security_id": "s1", "action": "Lost item \"Laptop Charger\" verified", "timestamp": "2024-02-12T10:00:00Z"}),
            json!({"id": "g2", "admin_id": "a1", "action": "Created new user account for Budi Santoso (budi)", "timestamp": "2024-02-05T08:01:00Z"}),
        ],
    );

    backend
}

/// A fully initialized registry over a seeded memory backend.
/// Returns the registry, the backend handle and the TempDir.
pub fn create_test_registry() -> (ServiceRegistry, Arc<MemoryBackend>, TempDir) {
    let (db, dir) = create_test_db();
    let backend = seeded_backend();
    let shared: Arc<dyn Backend> = backend.clone();
    let mut registry = ServiceRegistry::new(AppConfig::default(), db, shared);
    registry.init_all().expect("failed to init services");
    (registry, backend, dir)
}
