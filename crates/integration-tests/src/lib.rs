//! Database integration tests for Secret Santa Paws.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a scratch database; migrations are applied automatically
//! export TEST_DATABASE_URL=postgres://localhost/santa_paws_test
//! cargo test -p santa-paws-integration-tests
//! ```
//!
//! Without `TEST_DATABASE_URL` every test prints a notice and passes.
//!
//! # Test Categories
//!
//! - `profile_upsert` - Atomic profile save (address + exact corgi set)
//! - `exchange_join` - All-or-nothing exchange joining and listings

#![allow(clippy::expect_used, clippy::missing_panics_doc, clippy::print_stderr)]

use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use santa_paws_core::{Email, ExchangeId, UsState, UserId};
use santa_paws_web::db::{AccountRepository, ExchangeRepository};
use santa_paws_web::models::{CorgiInput, CurrentIdentity, Exchange, MailingAddress, ProfileInput};

/// Tiny lossless WebP, good enough for a stored photo.
pub const PHOTO_URI: &str = "data:image/webp;base64,UklGRhoAAABXRUJQVlA4TA0AAAAvAAAAEAcQERGIiP4HAA==";

/// Connect to the test database and apply migrations.
///
/// Returns `None` when `TEST_DATABASE_URL` is not set.
pub async fn test_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to TEST_DATABASE_URL");

    sqlx::migrate!("../web/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Bind a pool or return early from the test.
#[macro_export]
macro_rules! require_db {
    () => {
        match $crate::test_pool().await {
            Some(pool) => pool,
            None => return,
        }
    };
}

/// Create a fresh account with a unique email and return its session identity.
pub async fn create_identity(pool: &PgPool, first_name: Option<&str>) -> CurrentIdentity {
    let email = Email::parse(&format!("corgi-{}@example.com", Uuid::new_v4().simple()))
        .expect("valid email");
    let account = AccountRepository::new(pool)
        .create_with_password(&email, first_name, Some("Tester"), "unused-hash")
        .await
        .expect("Failed to create account");

    CurrentIdentity {
        id: account.id,
        email: account.email,
        first_name: account.first_name,
        last_name: account.last_name,
    }
}

/// A new corgi with no birthday.
#[must_use]
pub fn corgi(name: &str) -> CorgiInput {
    CorgiInput {
        id: None,
        name: name.to_owned(),
        birth_date: None,
        image_uri: PHOTO_URI.to_owned(),
    }
}

/// A complete profile submission for the given corgis.
#[must_use]
pub fn profile_input(corgis: Vec<CorgiInput>) -> ProfileInput {
    ProfileInput {
        address: MailingAddress {
            address1: "1 Fluffy Butt Lane".to_owned(),
            address2: None,
            city: "Braidwood".to_owned(),
            state: UsState::parse("IL").expect("known state"),
            zip: "60408".to_owned(),
            phone: "555-0100".to_owned(),
        },
        corgis,
        redirect_to: "/".to_owned(),
    }
}

/// Create an exchange with a unique title.
pub async fn create_exchange(pool: &PgPool, is_open: bool) -> Exchange {
    let due = NaiveDate::from_ymd_opt(2026, 12, 15).expect("valid date");
    ExchangeRepository::new(pool)
        .create(&format!("Pawty {}", Uuid::new_v4().simple()), 2026, due, is_open)
        .await
        .expect("Failed to create exchange")
}

/// Number of entries the user's corgis hold in an exchange.
pub async fn entry_count(pool: &PgPool, user_id: UserId, exchange_id: ExchangeId) -> i64 {
    sqlx::query_scalar(
        r"
        SELECT count(*)
        FROM paws.entry e
        JOIN paws.corgi c ON c.id = e.santa_id
        WHERE c.owner_id = $1 AND e.exchange_id = $2
        ",
    )
    .bind(user_id)
    .bind(exchange_id)
    .fetch_one(pool)
    .await
    .expect("Failed to count entries")
}
