// Service exports
pub mod auth;
pub mod memory;
pub mod postgres;
pub mod store;

pub use auth::{Claims, TokenVerifier};
pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use store::{InterestStore, ProfileStore, StoreError, StoreResult};
