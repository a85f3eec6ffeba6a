use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::search::SearchSpec;
use crate::models::{BrokerId, Interest, InterestId, InterestStatus, NewInterest, NewProfile, Page, Profile, ProfileId};
use crate::services::store::{InterestStore, ProfileStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct StoreState {
    profiles: BTreeMap<ProfileId, Profile>,
    interests: BTreeMap<InterestId, Interest>,
    next_profile_id: i64,
    next_interest_id: i64,
}

/// Process-local store for both entity types
///
/// Every mutation runs under the write lock, which is what makes the pair
/// uniqueness check and the status compare-and-set atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn insert(&self, profile: NewProfile) -> StoreResult<Profile> {
        let mut state = self.state.write().await;
        state.next_profile_id += 1;

        let profile = Profile {
            id: ProfileId(state.next_profile_id),
            owner_id: profile.owner_id,
            attributes: profile.attributes,
            is_active: true,
            created_date: profile.created_at,
            last_updated_date: profile.created_at,
        };
        state.profiles.insert(profile.id, profile.clone());

        tracing::debug!("Stored profile {} for broker {}", profile.id, profile.owner_id);
        Ok(profile)
    }

    async fn update(&self, profile: &Profile, expected_version: DateTime<Utc>) -> StoreResult<Option<Profile>> {
        let mut state = self.state.write().await;

        let Some(stored) = state.profiles.get_mut(&profile.id) else {
            return Ok(None);
        };
        if stored.last_updated_date != expected_version {
            return Ok(None);
        }

        // id, owner and creation date are fixed at insert
        stored.attributes = profile.attributes.clone();
        stored.is_active = profile.is_active;
        stored.last_updated_date = profile.last_updated_date;

        Ok(Some(stored.clone()))
    }

    async fn find_by_id(&self, id: ProfileId) -> StoreResult<Option<Profile>> {
        Ok(self.state.read().await.profiles.get(&id).cloned())
    }

    async fn find_all_by_owner(&self, owner_id: BrokerId) -> StoreResult<Vec<Profile>> {
        let state = self.state.read().await;
        Ok(state
            .profiles
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn search(&self, spec: &SearchSpec) -> StoreResult<Page<Profile>> {
        let state = self.state.read().await;

        let mut matched: Vec<&Profile> = state.profiles.values().filter(|p| spec.matches(p)).collect();
        matched.sort_by(|a, b| spec.page.compare(a, b));

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(spec.page.offset() as usize)
            .take(spec.page.size as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, spec.page.page, spec.page.size, total))
    }

    async fn delete(&self, id: ProfileId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.profiles.remove(&id).is_none() {
            return Ok(false);
        }

        let before = state.interests.len();
        state
            .interests
            .retain(|_, i| i.sender_profile_id != id && i.receiver_profile_id != id);

        tracing::debug!("Removed profile {} and {} interests", id, before - state.interests.len());
        Ok(true)
    }
}

#[async_trait]
impl InterestStore for InMemoryStore {
    async fn insert(&self, interest: NewInterest) -> StoreResult<Interest> {
        let mut state = self.state.write().await;

        for profile_id in [interest.sender_profile_id, interest.receiver_profile_id] {
            if !state.profiles.contains_key(&profile_id) {
                return Err(StoreError::MissingProfile(profile_id));
            }
        }

        let duplicate = state.interests.values().any(|i| {
            i.sender_profile_id == interest.sender_profile_id && i.receiver_profile_id == interest.receiver_profile_id
        });
        if duplicate {
            return Err(StoreError::Duplicate(format!(
                "interest {} -> {}",
                interest.sender_profile_id, interest.receiver_profile_id
            )));
        }

        state.next_interest_id += 1;
        let interest = Interest {
            id: InterestId(state.next_interest_id),
            sender_profile_id: interest.sender_profile_id,
            receiver_profile_id: interest.receiver_profile_id,
            status: InterestStatus::Pending,
            sent_at: interest.sent_at,
            responded_at: None,
        };
        state.interests.insert(interest.id, interest.clone());

        Ok(interest)
    }

    async fn find_by_id(&self, id: InterestId) -> StoreResult<Option<Interest>> {
        Ok(self.state.read().await.interests.get(&id).cloned())
    }

    async fn find_by_sender(&self, profile_id: ProfileId) -> StoreResult<Vec<Interest>> {
        let state = self.state.read().await;
        Ok(state
            .interests
            .values()
            .filter(|i| i.sender_profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn find_by_receiver(&self, profile_id: ProfileId) -> StoreResult<Vec<Interest>> {
        let state = self.state.read().await;
        Ok(state
            .interests
            .values()
            .filter(|i| i.receiver_profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn exists_by_pair(&self, sender: ProfileId, receiver: ProfileId) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .interests
            .values()
            .any(|i| i.sender_profile_id == sender && i.receiver_profile_id == receiver))
    }

    async fn transition(
        &self,
        id: InterestId,
        expected: InterestStatus,
        next: InterestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Interest>> {
        let mut state = self.state.write().await;

        match state.interests.get_mut(&id) {
            Some(interest) if interest.status == expected => {
                interest.status = next;
                interest.responded_at = Some(at);
                Ok(Some(interest.clone()))
            }
            _ => Ok(None),
        }
    }
}
