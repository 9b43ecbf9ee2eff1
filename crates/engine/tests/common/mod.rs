#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{AuthPolicy, Engine, Limits, User};
use migration::MigratorTrait;

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_with(Limits::default(), AuthPolicy::default()).await
}

pub async fn engine_with(limits: Limits, auth_policy: AuthPolicy) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let auth_policy = AuthPolicy {
        bootstrap_admins: vec![ADMIN_EMAIL.to_string()],
        ..auth_policy
    };
    let engine = Engine::builder()
        .database(db.clone())
        .limits(limits)
        .auth_policy(auth_policy)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Creates a profile without going through password hashing.
pub async fn user(engine: &Engine, name: &str) -> User {
    engine
        .get_or_create_user(
            Uuid::new_v4(),
            &format!("{}@example.com", name.to_lowercase()),
            Some(name),
        )
        .await
        .unwrap()
}

pub async fn admin(engine: &Engine) -> User {
    engine
        .get_or_create_user(Uuid::new_v4(), ADMIN_EMAIL, Some("Admin"))
        .await
        .unwrap()
}
