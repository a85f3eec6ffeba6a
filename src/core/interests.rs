use chrono::Utc;
use std::sync::Arc;

use crate::core::directory::ProfileDirectory;
use crate::core::error::{ServiceError, ServiceResult};
use crate::core::guard::{authorize_profile, Access};
use crate::models::{Interest, InterestId, InterestStatus, InterestView, NewInterest, Principal, ProfileId};
use crate::services::{InterestStore, StoreError};

/// Send, list and respond to interests between profiles of different brokers
///
/// Ownership is re-derived from the profiles on every call.
pub struct InterestWorkflow {
    directory: Arc<ProfileDirectory>,
    interests: Arc<dyn InterestStore>,
}

impl InterestWorkflow {
    pub fn new(directory: Arc<ProfileDirectory>, interests: Arc<dyn InterestStore>) -> Self {
        Self { directory, interests }
    }

    pub async fn send(
        &self,
        principal: &Principal,
        sender_id: ProfileId,
        receiver_id: ProfileId,
    ) -> ServiceResult<InterestView> {
        let sender = self.directory.find(sender_id).await?;
        let receiver = self.directory.find(receiver_id).await?;

        // Only the sender's own broker may initiate, admins included
        let sender = authorize_profile(sender, principal, Access::Owner)?;

        if sender.owner_id == receiver.owner_id {
            tracing::warn!(
                "Broker {} tried to send interest {} -> {} within their own clients",
                principal.id,
                sender_id,
                receiver_id
            );
            return Err(ServiceError::InvalidOperation(format!(
                "cannot send interest from profile {} to profile {}: both are clients of the same broker",
                sender_id, receiver_id
            )));
        }

        if self.interests.exists_by_pair(sender_id, receiver_id).await? {
            return Err(already_sent(sender_id, receiver_id));
        }

        let now = Utc::now();
        let interest = self
            .interests
            .insert(NewInterest {
                sender_profile_id: sender_id,
                receiver_profile_id: receiver_id,
                sent_at: now,
            })
            .await
            .map_err(|e| match e {
                // Lost the race against a concurrent send of the same pair
                StoreError::Duplicate(_) => already_sent(sender_id, receiver_id),
                // One side was deleted after it was loaded above
                StoreError::MissingProfile(missing) => ServiceError::not_found("profile", missing),
                other => ServiceError::Storage(other),
            })?;

        tracing::info!(
            "Broker {} sent interest {} ({} -> {})",
            principal.id,
            interest.id,
            sender_id,
            receiver_id
        );

        Ok(InterestView::from_parts(interest, &sender, &receiver, now.date_naive()))
    }

    /// Interests the given profile has sent
    pub async fn list_sent(&self, principal: &Principal, profile_id: ProfileId) -> ServiceResult<Vec<InterestView>> {
        self.guard_listing(principal, profile_id).await?;
        let interests = self.interests.find_by_sender(profile_id).await?;
        self.render(interests).await
    }

    /// Interests the given profile has received
    pub async fn list_received(&self, principal: &Principal, profile_id: ProfileId) -> ServiceResult<Vec<InterestView>> {
        self.guard_listing(principal, profile_id).await?;
        let interests = self.interests.find_by_receiver(profile_id).await?;
        self.render(interests).await
    }

    /// Move a PENDING interest to ACCEPTED or REJECTED
    ///
    /// Only the receiver's broker may respond. The final write is a
    /// compare-and-set on PENDING, so of two concurrent responses exactly
    /// one wins and the other sees `InvalidState`.
    pub async fn respond(&self, principal: &Principal, id: InterestId, status: &str) -> ServiceResult<InterestView> {
        let interest = self
            .interests
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("interest", id))?;

        let receiver = self.directory.find(interest.receiver_profile_id).await?;
        if receiver.owner_id != principal.id {
            tracing::warn!(
                "Broker {} tried to respond to interest {} addressed to profile {}",
                principal.id,
                id,
                receiver.id
            );
            return Err(ServiceError::forbidden("interest", id, principal.id));
        }

        let parsed = status.parse::<InterestStatus>();

        if let Ok(InterestStatus::Pending) = parsed {
            return Err(ServiceError::InvalidOperation(format!(
                "interest {} cannot be reset to PENDING",
                id
            )));
        }

        // An answered interest is final whatever status was asked for
        if interest.status.is_terminal() {
            return Err(already_responded(id, interest.status));
        }

        let next = parsed.map_err(|e| ServiceError::InvalidInput(format!("status: {}", e)))?;

        let now = Utc::now();
        let updated = match self
            .interests
            .transition(id, InterestStatus::Pending, next, now)
            .await?
        {
            Some(updated) => updated,
            None => {
                let current = self
                    .interests
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("interest", id))?;
                return Err(already_responded(id, current.status));
            }
        };

        tracing::info!("Broker {} marked interest {} as {}", principal.id, id, next);

        let sender = self.directory.find(updated.sender_profile_id).await?;
        Ok(InterestView::from_parts(updated, &sender, &receiver, now.date_naive()))
    }

    async fn guard_listing(&self, principal: &Principal, profile_id: ProfileId) -> ServiceResult<()> {
        let profile = self.directory.find(profile_id).await?;
        authorize_profile(profile, principal, Access::OwnerOrAdmin)?;
        Ok(())
    }

    async fn render(&self, interests: Vec<Interest>) -> ServiceResult<Vec<InterestView>> {
        let today = Utc::now().date_naive();
        let mut views = Vec::with_capacity(interests.len());

        for interest in interests {
            let sender = self.directory.find_optional(interest.sender_profile_id).await?;
            let receiver = self.directory.find_optional(interest.receiver_profile_id).await?;

            match (sender, receiver) {
                (Some(sender), Some(receiver)) => {
                    views.push(InterestView::from_parts(interest, &sender, &receiver, today));
                }
                _ => {
                    // Profile deleted between the two reads
                    tracing::warn!("Skipping interest {} with a missing profile", interest.id);
                }
            }
        }

        Ok(views)
    }
}

fn already_sent(sender: ProfileId, receiver: ProfileId) -> ServiceError {
    ServiceError::Conflict(format!(
        "interest from profile {} to profile {} was already sent",
        sender, receiver
    ))
}

fn already_responded(id: InterestId, status: InterestStatus) -> ServiceError {
    ServiceError::InvalidState(format!("interest {} was already responded to ({})", id, status))
}
