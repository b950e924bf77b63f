//! Core library for the weather notification daemon.
//!
//! This crate defines:
//! - Grid projection onto the forecast service's mesh
//! - A TTL cache adapter with deterministic key generation
//! - Cache-aside weather acquisition
//! - Push notification dispatch with per-recipient failure isolation
//! - The per-minute notification scheduler
//!
//! It is used by `notify-cli`, but can also be reused by other binaries or
//! services.

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod model;
pub mod notify;
pub mod provider;
pub mod push;
pub mod scheduler;
pub mod users;
pub mod weather;

pub use cache::{Cache, CacheStore, MemoryStore};
pub use config::Config;
pub use error::{CacheError, PushError, WeatherError};
pub use model::{
    BatchDispatchResult, DispatchResult, GridPoint, RunSummary, UserRecord, UserSettings,
    WeatherSnapshot,
};
pub use notify::NotificationService;
pub use provider::ForecastProvider;
pub use push::PushProvider;
pub use scheduler::NotificationScheduler;
pub use users::{StaticUserStore, UserStore};
pub use weather::WeatherService;
