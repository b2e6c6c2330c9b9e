//! Unified error type for the sync engine, the stores, and the bot layer.

use thiserror::Error;

/// Every failure the crate can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database error from either tier
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Payload (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// The operation needs a signed-in user
    #[error("Not authenticated: sign in to sync with the cloud")]
    NotAuthenticated,

    /// The operation needs connectivity
    #[error("Offline: connect to the internet to sync with the cloud")]
    Offline,

    /// No local family with this id
    #[error("Family not found: {family_id}")]
    FamilyNotFound {
        /// The id that was looked up
        family_id: String,
    },

    /// The family already lives in the cloud
    #[error("Family {family_id} is not an offline family")]
    NotOfflineFamily {
        /// The cloud family id
        family_id: String,
    },

    /// A migration for this family is already running
    #[error("Family {family_id} is already being synced")]
    MigrationInProgress {
        /// The family being migrated
        family_id: String,
    },

    /// A row addressed by id does not exist
    #[error("Record {id} not found in {table}")]
    RecordNotFound {
        /// Table name
        table: String,
        /// Row id
        id: String,
    },

    /// A queued or routed payload is unusable
    #[error("Invalid payload: {message}")]
    InvalidPayload {
        /// Why the payload was rejected
        message: String,
    },

    /// The remote store rejected a call
    #[error("Remote error: {message}")]
    Remote {
        /// Error reported by the backend
        message: String,
    },

    /// A family migration failed and its cloud rows were rolled back
    #[error(
        "Failed to sync {entity}: {message} (rolled back {rolled_back} cloud records, local data preserved)"
    )]
    MigrationFailed {
        /// Human-readable identity of the record that failed, e.g. `subcategory "Groceries"`
        entity: String,
        /// Underlying error message
        message: String,
        /// Number of cloud records deleted during rollback
        rolled_back: usize,
        /// Number of cloud records that could not be deleted
        rollback_failures: usize,
    },

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Returns true when a migration failed after creating cloud rows and those rows were
    /// rolled back, as opposed to failing before any work was attempted.
    #[must_use]
    pub const fn is_rolled_back(&self) -> bool {
        matches!(self, Self::MigrationFailed { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
