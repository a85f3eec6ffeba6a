use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::core::age::age_on;

/// Identity of a broker, as resolved from the bearer token subject.
pub type BrokerId = Uuid;

/// Profile identifier, assigned by the store on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ProfileId(pub i64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interest identifier, assigned by the store on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct InterestId(pub i64);

impl fmt::Display for InterestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raised when a string does not name a known enum value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Normalizes "never married", "Never-Married" etc. to "NEVER_MARRIED"
fn normalize_enum_input(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

impl FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_enum_input(s).as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "OTHER" => Ok(Gender::Other),
            _ => Err(ParseEnumError { kind: "gender", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    NeverMarried,
    Divorced,
    Widowed,
    Separated,
    AwaitingDivorce,
}

impl MaritalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaritalStatus::NeverMarried => "NEVER_MARRIED",
            MaritalStatus::Divorced => "DIVORCED",
            MaritalStatus::Widowed => "WIDOWED",
            MaritalStatus::Separated => "SEPARATED",
            MaritalStatus::AwaitingDivorce => "AWAITING_DIVORCE",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_enum_input(s).as_str() {
            "NEVER_MARRIED" => Ok(MaritalStatus::NeverMarried),
            "DIVORCED" => Ok(MaritalStatus::Divorced),
            "WIDOWED" => Ok(MaritalStatus::Widowed),
            "SEPARATED" => Ok(MaritalStatus::Separated),
            "AWAITING_DIVORCE" => Ok(MaritalStatus::AwaitingDivorce),
            _ => Err(ParseEnumError { kind: "marital status", value: s.to_string() }),
        }
    }
}

/// Interest lifecycle: PENDING, then exactly one of ACCEPTED / REJECTED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InterestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestStatus::Pending => "PENDING",
            InterestStatus::Accepted => "ACCEPTED",
            InterestStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InterestStatus::Pending)
    }
}

impl FromStr for InterestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_enum_input(s).as_str() {
            "PENDING" => Ok(InterestStatus::Pending),
            "ACCEPTED" => Ok(InterestStatus::Accepted),
            "REJECTED" => Ok(InterestStatus::Rejected),
            _ => Err(ParseEnumError { kind: "interest status", value: s.to_string() }),
        }
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller role carried in the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Broker,
    Admin,
}

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: BrokerId,
    pub role: Role,
}

impl Principal {
    pub fn broker(id: BrokerId) -> Self {
        Self { id, role: Role::Broker }
    }

    pub fn admin(id: BrokerId) -> Self {
        Self { id, role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Client biodata and partner preferences, as supplied by the owning broker
///
/// Field-level rules live in the `validate` attributes; rules that need the
/// current date or compare two fields are checked by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAttributes {
    #[validate(length(min = 1, max = 120), custom(function = "not_blank"))]
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub marital_status: MaritalStatus,
    #[validate(range(min = 50, max = 272))]
    pub height_cm: u16,
    #[validate(length(min = 1, max = 60))]
    pub religion: String,
    #[validate(length(min = 1, max = 60))]
    pub caste: String,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub sub_caste: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub mother_tongue: String,
    #[validate(length(min = 1, max = 80))]
    pub country: String,
    #[validate(length(min = 1, max = 80))]
    pub state: String,
    #[validate(length(min = 1, max = 80))]
    pub city: String,
    #[validate(length(max = 120))]
    pub education: String,
    #[validate(length(max = 120))]
    pub occupation: String,
    #[validate(range(min = 0))]
    pub annual_income: i64,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub about_me: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub photo_url: Option<String>,

    // Partner preferences: search hints only, never enforced against this profile
    #[serde(default)]
    #[validate(range(min = 18, max = 100))]
    pub preferred_min_age: Option<u8>,
    #[serde(default)]
    #[validate(range(min = 18, max = 100))]
    pub preferred_max_age: Option<u8>,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub preferred_religion: Option<String>,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub preferred_caste: Option<String>,
    #[serde(default)]
    #[validate(range(min = 50, max = 272))]
    pub preferred_min_height_cm: Option<u16>,
    #[serde(default)]
    #[validate(range(min = 50, max = 272))]
    pub preferred_max_height_cm: Option<u16>,
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// A client profile owned by exactly one broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub owner_id: BrokerId,
    #[serde(flatten)]
    pub attributes: ProfileAttributes,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
}

impl Profile {
    /// Whole years between date of birth and `today`. Never stored.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        age_on(self.attributes.date_of_birth, today)
    }
}

/// Profile data handed to the store before an id exists
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub owner_id: BrokerId,
    pub attributes: ProfileAttributes,
    pub created_at: DateTime<Utc>,
}

/// Directed proposal from one profile to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: InterestId,
    pub sender_profile_id: ProfileId,
    pub receiver_profile_id: ProfileId,
    pub status: InterestStatus,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Interest data handed to the store. The store always creates it PENDING.
#[derive(Debug, Clone)]
pub struct NewInterest {
    pub sender_profile_id: ProfileId,
    pub receiver_profile_id: ProfileId,
    pub sent_at: DateTime<Utc>,
}

/// One page of results plus total-count metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size as u64) as u32
        };

        Self {
            items,
            page,
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parsing_is_lenient_on_case_and_separators() {
        assert_eq!("female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(" Male ".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("never married".parse::<MaritalStatus>(), Ok(MaritalStatus::NeverMarried));
        assert_eq!("Awaiting-Divorce".parse::<MaritalStatus>(), Ok(MaritalStatus::AwaitingDivorce));
        assert_eq!("accepted".parse::<InterestStatus>(), Ok(InterestStatus::Accepted));
    }

    #[test]
    fn test_enum_parsing_rejects_unknown_values() {
        let err = "alien".parse::<Gender>().unwrap_err();
        assert_eq!(err.kind, "gender");
        assert!("".parse::<MaritalStatus>().is_err());
        assert!("MAYBE".parse::<InterestStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!InterestStatus::Pending.is_terminal());
        assert!(InterestStatus::Accepted.is_terminal());
        assert!(InterestStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_page_metadata() {
        let page = Page::new(vec![1, 2, 3], 0, 10, 23);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], 0, 10, 0);
        assert_eq!(empty.total_pages, 0);

        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4, 6]);
        assert_eq!(doubled.total_elements, 23);
    }
}
