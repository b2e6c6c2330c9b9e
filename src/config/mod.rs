/// Database configuration and connection management for both tiers
pub mod database;

/// Application settings loaded from config.toml
pub mod settings;
