//! Entity store abstractions.
//!
//! The services are the only callers; nothing reaches a store without going
//! through the ownership and state checks first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::search::SearchSpec;
use crate::models::{BrokerId, Interest, InterestId, InterestStatus, NewInterest, NewProfile, Page, Profile, ProfileId};

/// Errors raised by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Profile {0} does not exist")]
    MissingProfile(ProfileId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Assign an id and persist. New profiles are always active.
    async fn insert(&self, profile: NewProfile) -> StoreResult<Profile>;

    /// Replace a stored profile if its `last_updated_date` still equals
    /// `expected_version`. Returns `None` when the record changed or vanished.
    async fn update(&self, profile: &Profile, expected_version: DateTime<Utc>) -> StoreResult<Option<Profile>>;

    async fn find_by_id(&self, id: ProfileId) -> StoreResult<Option<Profile>>;

    /// All profiles of one broker, ascending by id
    async fn find_all_by_owner(&self, owner_id: BrokerId) -> StoreResult<Vec<Profile>>;

    /// Profiles satisfying every predicate, paged and sorted
    async fn search(&self, spec: &SearchSpec) -> StoreResult<Page<Profile>>;

    /// Remove the profile and every interest with it on either side, as one
    /// atomic step. Returns whether a profile was removed.
    async fn delete(&self, id: ProfileId) -> StoreResult<bool>;

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

/// Persisted interests
#[async_trait]
pub trait InterestStore: Send + Sync {
    /// Persist as PENDING. Fails with `Duplicate` if the ordered
    /// (sender, receiver) pair already exists and with `MissingProfile` if
    /// either profile is gone; the checks and the write are atomic.
    async fn insert(&self, interest: NewInterest) -> StoreResult<Interest>;

    async fn find_by_id(&self, id: InterestId) -> StoreResult<Option<Interest>>;

    async fn find_by_sender(&self, profile_id: ProfileId) -> StoreResult<Vec<Interest>>;

    async fn find_by_receiver(&self, profile_id: ProfileId) -> StoreResult<Vec<Interest>>;

    async fn exists_by_pair(&self, sender: ProfileId, receiver: ProfileId) -> StoreResult<bool>;

    /// Atomic compare-and-set on the status. Returns the updated interest,
    /// or `None` when the stored status is no longer `expected`.
    async fn transition(
        &self,
        id: InterestId,
        expected: InterestStatus,
        next: InterestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Interest>>;
}
