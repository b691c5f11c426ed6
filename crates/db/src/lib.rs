pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_config, connect_with_settings, ping, DbPool};
pub use fixtures::{SampleInventoryDataset, SeedResult, VerificationResult, DEMO_ACCOUNT_ID};
pub use repositories::{ChatRepository, InventoryRepository, RepositoryError};
