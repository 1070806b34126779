//! Data source abstraction
//!
//! The catalog and the per-user preference/interaction store live outside
//! this service. Each backend implements both traits so that one configured
//! source answers every lookup made during a recommendation run.

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Interaction, Program, UserPreferences},
};

pub mod memory;
pub mod postgres;
pub mod rest;

pub use memory::MemorySource;
pub use postgres::PostgresSource;
pub use rest::RestSource;

/// Read access to the program catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// All active programs, newest first
    async fn fetch_catalog(&self) -> AppResult<Vec<Program>>;

    /// Programs with the given ids; unknown ids are silently absent
    async fn fetch_programs(&self, ids: &[Uuid]) -> AppResult<Vec<Program>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Per-user preferences and the append-only interaction log
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserDataSource: Send + Sync {
    /// Stored preferences, `None` when the user never saved any
    async fn fetch_user_preferences(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>>;

    /// Full interaction history, oldest first
    async fn fetch_interactions(&self, user_id: Uuid) -> AppResult<Vec<Interaction>>;

    /// Appends one entry to the interaction log
    async fn record_interaction(&self, interaction: Interaction) -> AppResult<()>;
}
