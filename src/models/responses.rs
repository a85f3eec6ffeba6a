use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{
    BrokerId, Gender, Interest, InterestId, InterestStatus, Profile, ProfileAttributes, ProfileId,
};

/// Full profile as returned to its owner or to a searching broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: ProfileId,
    pub owner_id: BrokerId,
    #[serde(flatten)]
    pub attributes: ProfileAttributes,
    pub age: u32,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
}

impl ProfileView {
    pub fn from_profile(profile: Profile, today: NaiveDate) -> Self {
        Self {
            age: profile.age_on(today),
            id: profile.id,
            owner_id: profile.owner_id,
            attributes: profile.attributes,
            is_active: profile.is_active,
            created_date: profile.created_date,
            last_updated_date: profile.last_updated_date,
        }
    }
}

/// Compact profile embedded in interest views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: ProfileId,
    pub full_name: String,
    pub age: u32,
    pub gender: Gender,
    pub city: String,
    pub photo_url: Option<String>,
}

impl ProfileSummary {
    pub fn from_profile(profile: &Profile, today: NaiveDate) -> Self {
        Self {
            id: profile.id,
            full_name: profile.attributes.full_name.clone(),
            age: profile.age_on(today),
            gender: profile.attributes.gender,
            city: profile.attributes.city.clone(),
            photo_url: profile.attributes.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestView {
    pub id: InterestId,
    pub sender: ProfileSummary,
    pub receiver: ProfileSummary,
    pub status: InterestStatus,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl InterestView {
    pub fn from_parts(interest: Interest, sender: &Profile, receiver: &Profile, today: NaiveDate) -> Self {
        Self {
            id: interest.id,
            sender: ProfileSummary::from_profile(sender, today),
            receiver: ProfileSummary::from_profile(receiver, today),
            status: interest.status,
            sent_at: interest.sent_at,
            responded_at: interest.responded_at,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
