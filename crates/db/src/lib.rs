pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, ping, DbPool};
pub use fixtures::{RestaurantSeedDataset, SeedResult, VerificationResult};
