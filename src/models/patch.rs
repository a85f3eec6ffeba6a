//! Partial-update payloads.
//!
//! `Patch<T>` separates "field not sent" from "field sent". For optional
//! attributes the payload type is `Patch<Option<T>>`, so an explicit JSON
//! `null` clears the value while an absent key leaves it untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::models::domain::{Gender, MaritalStatus, ProfileAttributes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Overwrite `target` when a value is present. Returns whether it did.
    pub fn apply_to(self, target: &mut T) -> bool {
        match self {
            Patch::Set(value) => {
                *target = value;
                true
            }
            Patch::Absent => false,
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Set(value)
    }
}

// Only called when the key is present; missing keys fall back to `Default`.
impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Set)
    }
}

/// Owner-supplied changes to a profile. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePatch {
    pub full_name: Patch<String>,
    pub date_of_birth: Patch<NaiveDate>,
    pub gender: Patch<Gender>,
    pub marital_status: Patch<MaritalStatus>,
    pub height_cm: Patch<u16>,
    pub religion: Patch<String>,
    pub caste: Patch<String>,
    pub sub_caste: Patch<Option<String>>,
    pub mother_tongue: Patch<String>,
    pub country: Patch<String>,
    pub state: Patch<String>,
    pub city: Patch<String>,
    pub education: Patch<String>,
    pub occupation: Patch<String>,
    pub annual_income: Patch<i64>,
    pub about_me: Patch<Option<String>>,
    pub photo_url: Patch<Option<String>>,
    pub preferred_min_age: Patch<Option<u8>>,
    pub preferred_max_age: Patch<Option<u8>>,
    pub preferred_religion: Patch<Option<String>>,
    pub preferred_caste: Patch<Option<String>>,
    pub preferred_min_height_cm: Patch<Option<u16>>,
    pub preferred_max_height_cm: Patch<Option<u16>>,
    pub is_active: Patch<bool>,
}

impl ProfilePatch {
    /// Apply every present field. Returns the number of fields written.
    pub fn apply(self, attributes: &mut ProfileAttributes, is_active: &mut bool) -> usize {
        let a = attributes;
        [
            self.full_name.apply_to(&mut a.full_name),
            self.date_of_birth.apply_to(&mut a.date_of_birth),
            self.gender.apply_to(&mut a.gender),
            self.marital_status.apply_to(&mut a.marital_status),
            self.height_cm.apply_to(&mut a.height_cm),
            self.religion.apply_to(&mut a.religion),
            self.caste.apply_to(&mut a.caste),
            self.sub_caste.apply_to(&mut a.sub_caste),
            self.mother_tongue.apply_to(&mut a.mother_tongue),
            self.country.apply_to(&mut a.country),
            self.state.apply_to(&mut a.state),
            self.city.apply_to(&mut a.city),
            self.education.apply_to(&mut a.education),
            self.occupation.apply_to(&mut a.occupation),
            self.annual_income.apply_to(&mut a.annual_income),
            self.about_me.apply_to(&mut a.about_me),
            self.photo_url.apply_to(&mut a.photo_url),
            self.preferred_min_age.apply_to(&mut a.preferred_min_age),
            self.preferred_max_age.apply_to(&mut a.preferred_max_age),
            self.preferred_religion.apply_to(&mut a.preferred_religion),
            self.preferred_caste.apply_to(&mut a.preferred_caste),
            self.preferred_min_height_cm.apply_to(&mut a.preferred_min_height_cm),
            self.preferred_max_height_cm.apply_to(&mut a.preferred_max_height_cm),
            self.is_active.apply_to(is_active),
        ]
        .into_iter()
        .filter(|written| *written)
        .count()
    }
}
