use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{ServiceError, ServiceResult};
use crate::core::guard::{authorize_profile, Access};
use crate::core::search::{build_search_spec, PageRequest, SearchCriteria, SearchLimits};
use crate::models::{NewProfile, Page, Principal, Profile, ProfileAttributes, ProfileId, ProfilePatch, ProfileView};
use crate::services::ProfileStore;

/// Check field rules plus the ones that need a date or two fields at once
pub fn validate_attributes(attributes: &ProfileAttributes, today: NaiveDate) -> ServiceResult<()> {
    attributes.validate()?;

    if attributes.date_of_birth >= today {
        return Err(ServiceError::InvalidInput(format!(
            "dateOfBirth: {} is not in the past",
            attributes.date_of_birth
        )));
    }

    if let (Some(min), Some(max)) = (attributes.preferred_min_age, attributes.preferred_max_age) {
        if min > max {
            return Err(ServiceError::InvalidInput(format!(
                "preferredMinAge: {} is greater than preferredMaxAge {}",
                min, max
            )));
        }
    }

    if let (Some(min), Some(max)) = (attributes.preferred_min_height_cm, attributes.preferred_max_height_cm) {
        if min > max {
            return Err(ServiceError::InvalidInput(format!(
                "preferredMinHeightCm: {} is greater than preferredMaxHeightCm {}",
                min, max
            )));
        }
    }

    Ok(())
}

/// Ownership-gated CRUD and search over client profiles
pub struct ProfileDirectory {
    profiles: Arc<dyn ProfileStore>,
    limits: SearchLimits,
}

impl ProfileDirectory {
    pub fn new(profiles: Arc<dyn ProfileStore>, limits: SearchLimits) -> Self {
        Self { profiles, limits }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Create a profile owned by the calling broker
    pub async fn create(&self, principal: &Principal, attributes: ProfileAttributes) -> ServiceResult<ProfileView> {
        let now = Utc::now();
        validate_attributes(&attributes, now.date_naive())?;

        let profile = self
            .profiles
            .insert(NewProfile {
                owner_id: principal.id,
                attributes,
                created_at: now,
            })
            .await?;

        tracing::info!("Broker {} created profile {}", principal.id, profile.id);

        Ok(ProfileView::from_profile(profile, now.date_naive()))
    }

    /// Every profile the caller owns, ascending by id
    pub async fn list_owned_by(&self, principal: &Principal) -> ServiceResult<Vec<ProfileView>> {
        let today = Utc::now().date_naive();
        let profiles = self.profiles.find_all_by_owner(principal.id).await?;

        Ok(profiles
            .into_iter()
            .map(|p| ProfileView::from_profile(p, today))
            .collect())
    }

    pub async fn get_by_id_for_owner(&self, id: ProfileId, principal: &Principal) -> ServiceResult<ProfileView> {
        let profile = self.get_owned(id, principal).await?;
        Ok(ProfileView::from_profile(profile, Utc::now().date_naive()))
    }

    /// Apply only the fields present in `patch`
    ///
    /// The write is conditional on the profile not having changed since it
    /// was read; a lost race surfaces as `Conflict`.
    pub async fn update(&self, id: ProfileId, principal: &Principal, patch: ProfilePatch) -> ServiceResult<ProfileView> {
        let current = self.get_owned(id, principal).await?;
        let expected_version = current.last_updated_date;

        let mut next = current;
        let written = patch.apply(&mut next.attributes, &mut next.is_active);

        let now = Utc::now();
        validate_attributes(&next.attributes, now.date_naive())?;
        next.last_updated_date = now;

        match self.profiles.update(&next, expected_version).await? {
            Some(updated) => {
                tracing::info!("Broker {} updated {} fields on profile {}", principal.id, written, id);
                Ok(ProfileView::from_profile(updated, now.date_naive()))
            }
            None => match self.profiles.find_by_id(id).await? {
                Some(_) => Err(ServiceError::Conflict(format!(
                    "profile {} was modified concurrently, reload and retry",
                    id
                ))),
                None => Err(ServiceError::not_found("profile", id)),
            },
        }
    }

    /// Delete a profile along with every interest that points at it
    pub async fn delete(&self, id: ProfileId, principal: &Principal) -> ServiceResult<()> {
        self.get_owned(id, principal).await?;

        // The store drops the profile and its interests in one step
        if !self.profiles.delete(id).await? {
            return Err(ServiceError::not_found("profile", id));
        }

        tracing::info!("Broker {} deleted profile {}", principal.id, id);
        Ok(())
    }

    /// Multi-criteria search over active profiles of all brokers
    pub async fn search(&self, criteria: &SearchCriteria, page: PageRequest) -> ServiceResult<Page<ProfileView>> {
        let today = Utc::now().date_naive();
        let spec = build_search_spec(criteria, page, today);

        tracing::debug!("Searching profiles with {} predicates", spec.predicates.len());

        let result = self.profiles.search(&spec).await?;
        Ok(result.map(|p| ProfileView::from_profile(p, today)))
    }

    pub async fn health_check(&self) -> bool {
        match self.profiles.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::error!("Profile store health check failed: {}", e);
                false
            }
        }
    }

    /// Fetch a profile without any ownership check
    pub(crate) async fn find(&self, id: ProfileId) -> ServiceResult<Profile> {
        self.profiles
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("profile", id))
    }

    pub(crate) async fn find_optional(&self, id: ProfileId) -> ServiceResult<Option<Profile>> {
        Ok(self.profiles.find_by_id(id).await?)
    }

    async fn get_owned(&self, id: ProfileId, principal: &Principal) -> ServiceResult<Profile> {
        let profile = self.find(id).await?;
        authorize_profile(profile, principal, Access::OwnerOrAdmin)
    }
}
