//! Disposable MySQL and Redis containers for integration tests.
//!
//! Each server hands out clients only once the service actually answers,
//! so tests never race container start-up. Readiness is polled with
//! `awaitility`, which fails the test once [`READY_TIMEOUT`] passes.

use std::time::Duration;

pub mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};

pub const READY_TIMEOUT: Duration = Duration::from_secs(15);
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
