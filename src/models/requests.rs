use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use validator::Validate;

use crate::core::search::{PageRequest, SearchCriteria, SearchLimits, SortDirection, SortKey};
use crate::models::domain::{ProfileAttributes, ProfileId};
use crate::models::patch::ProfilePatch;

/// Body of `POST /profiles`
pub type CreateProfileRequest = ProfileAttributes;

/// Body of `PATCH /profiles/{id}`
pub type UpdateProfileRequest = ProfilePatch;

/// Parse a query value, treating anything unparseable as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

/// Query string of `GET /profiles/search`
///
/// Every field is optional and nothing here can fail to parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProfilesRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub min_age: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_age: Option<u32>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub religion: Option<String>,
    pub caste: Option<String>,
    pub sub_caste: Option<String>,
    pub mother_tongue: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub min_height_cm: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_height_cm: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

impl SearchProfilesRequest {
    pub fn into_parts(self, limits: &SearchLimits) -> (SearchCriteria, PageRequest) {
        let page = PageRequest::new(
            self.page,
            self.size,
            SortKey::parse_lenient(self.sort_by.as_deref()),
            SortDirection::parse_lenient(self.direction.as_deref()),
            limits,
        );

        let criteria = SearchCriteria {
            min_age: self.min_age,
            max_age: self.max_age,
            gender: self.gender,
            marital_status: self.marital_status,
            religion: self.religion,
            caste: self.caste,
            sub_caste: self.sub_caste,
            mother_tongue: self.mother_tongue,
            country: self.country,
            state: self.state,
            city: self.city,
            min_height_cm: self.min_height_cm,
            max_height_cm: self.max_height_cm,
        };

        (criteria, page)
    }
}

/// Body of `POST /interests`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInterestRequest {
    pub sender_profile_id: ProfileId,
    pub receiver_profile_id: ProfileId,
}

/// Body of `PUT /interests/{id}/respond`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RespondInterestRequest {
    #[validate(length(min = 1))]
    pub status: String,
}
