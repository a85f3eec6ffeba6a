//! Search specification building.
//!
//! Optional criteria are turned into a flat list of tagged predicates that
//! are ANDed together. Each store interprets the list in its own query form.
//! Criteria that are missing, blank or unparseable are dropped rather than
//! rejected: a bad filter narrows nothing.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::core::age::{earliest_birth_date_for_max_age, latest_birth_date_for_min_age};
use crate::models::{Gender, MaritalStatus, Profile};

/// Profile attributes a predicate can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DateOfBirth,
    Gender,
    MaritalStatus,
    HeightCm,
    Religion,
    Caste,
    SubCaste,
    MotherTongue,
    Country,
    State,
    City,
    IsActive,
}

impl Field {
    /// Column name used by SQL-backed stores
    pub fn column(&self) -> &'static str {
        match self {
            Field::DateOfBirth => "date_of_birth",
            Field::Gender => "gender",
            Field::MaritalStatus => "marital_status",
            Field::HeightCm => "height_cm",
            Field::Religion => "religion",
            Field::Caste => "caste",
            Field::SubCaste => "sub_caste",
            Field::MotherTongue => "mother_tongue",
            Field::Country => "country",
            Field::State => "state",
            Field::City => "city",
            Field::IsActive => "is_active",
        }
    }

    /// Current value of this field on `profile`, `None` for unset optionals
    pub fn value_of(&self, profile: &Profile) -> Option<FilterValue> {
        let a = &profile.attributes;
        let value = match self {
            Field::DateOfBirth => FilterValue::Date(a.date_of_birth),
            Field::Gender => FilterValue::Text(a.gender.as_str().to_string()),
            Field::MaritalStatus => FilterValue::Text(a.marital_status.as_str().to_string()),
            Field::HeightCm => FilterValue::Int(a.height_cm as i64),
            Field::Religion => FilterValue::Text(a.religion.clone()),
            Field::Caste => FilterValue::Text(a.caste.clone()),
            Field::SubCaste => FilterValue::Text(a.sub_caste.clone()?),
            Field::MotherTongue => FilterValue::Text(a.mother_tongue.clone()),
            Field::Country => FilterValue::Text(a.country.clone()),
            Field::State => FilterValue::Text(a.state.clone()),
            Field::City => FilterValue::Text(a.city.clone()),
            Field::IsActive => FilterValue::Bool(profile.is_active),
        };
        Some(value)
    }
}

/// Typed comparison operand
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum FilterValue {
    Text(String),
    Date(NaiveDate),
    Int(i64),
    Bool(bool),
}

/// One independent filter
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equality { field: Field, value: FilterValue },
    /// Inclusive on both ends; a missing end is unbounded
    Range {
        field: Field,
        min: Option<FilterValue>,
        max: Option<FilterValue>,
    },
}

impl Predicate {
    /// Evaluate against an in-memory profile
    pub fn matches(&self, profile: &Profile) -> bool {
        match self {
            Predicate::Equality { field, value } => field.value_of(profile).as_ref() == Some(value),
            Predicate::Range { field, min, max } => {
                let Some(actual) = field.value_of(profile) else {
                    return false;
                };
                let above_min = min.as_ref().map_or(true, |min| actual >= *min);
                let below_max = max.as_ref().map_or(true, |max| actual <= *max);
                above_min && below_max
            }
        }
    }
}

/// Raw, all-optional search criteria
///
/// Enum-valued criteria stay as strings so the builder can drop values it
/// does not recognise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub min_age: Option<u32>,
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
    pub min_height_cm: Option<u16>,
    pub max_height_cm: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Id,
    CreatedDate,
    LastUpdatedDate,
    DateOfBirth,
    HeightCm,
    AnnualIncome,
}

impl SortKey {
    /// Unknown keys fall back to `Id`
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("createdDate") => SortKey::CreatedDate,
            Some("lastUpdatedDate") => SortKey::LastUpdatedDate,
            Some("dateOfBirth") => SortKey::DateOfBirth,
            Some("heightCm") => SortKey::HeightCm,
            Some("annualIncome") => SortKey::AnnualIncome,
            _ => SortKey::Id,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::CreatedDate => "created_date",
            SortKey::LastUpdatedDate => "last_updated_date",
            SortKey::DateOfBirth => "date_of_birth",
            SortKey::HeightCm => "height_cm",
            SortKey::AnnualIncome => "annual_income",
        }
    }

    fn compare(&self, a: &Profile, b: &Profile) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::CreatedDate => a.created_date.cmp(&b.created_date),
            SortKey::LastUpdatedDate => a.last_updated_date.cmp(&b.last_updated_date),
            SortKey::DateOfBirth => a.attributes.date_of_birth.cmp(&b.attributes.date_of_birth),
            SortKey::HeightCm => a.attributes.height_cm.cmp(&b.attributes.height_cm),
            SortKey::AnnualIncome => a.attributes.annual_income.cmp(&b.attributes.annual_income),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "desc" => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Page size bounds, from the `search` config section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: SearchLimits::default().default_page_size,
            sort: SortKey::Id,
            direction: SortDirection::Asc,
        }
    }
}

impl PageRequest {
    /// Missing or zero sizes use the default; oversized pages are capped.
    pub fn new(page: Option<u32>, size: Option<u32>, sort: SortKey, direction: SortDirection, limits: &SearchLimits) -> Self {
        let size = match size {
            Some(0) | None => limits.default_page_size,
            Some(size) => size.min(limits.max_page_size),
        };

        Self {
            page: page.unwrap_or(0),
            size,
            sort,
            direction,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }

    /// Ordering for in-memory stores; ties broken by ascending id
    pub fn compare(&self, a: &Profile, b: &Profile) -> Ordering {
        let ordering = match self.direction {
            SortDirection::Asc => self.sort.compare(a, b),
            SortDirection::Desc => self.sort.compare(b, a),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    }
}

/// Composed predicate list plus paging, ready for a store
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpec {
    pub predicates: Vec<Predicate>,
    pub page: PageRequest,
}

impl SearchSpec {
    pub fn matches(&self, profile: &Profile) -> bool {
        self.predicates.iter().all(|p| p.matches(profile))
    }
}

/// Accumulates predicates; always starts with `isActive == true`
#[derive(Debug, Clone)]
pub struct SearchSpecBuilder {
    today: NaiveDate,
    predicates: Vec<Predicate>,
}

impl SearchSpecBuilder {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            predicates: vec![Predicate::Equality {
                field: Field::IsActive,
                value: FilterValue::Bool(true),
            }],
        }
    }

    /// Age bounds become date-of-birth bounds relative to `today`
    pub fn age_range(mut self, min_age: Option<u32>, max_age: Option<u32>) -> Self {
        let latest = min_age.and_then(|age| latest_birth_date_for_min_age(age, self.today));
        let earliest = max_age.and_then(|age| earliest_birth_date_for_max_age(age, self.today));

        if latest.is_some() || earliest.is_some() {
            self.predicates.push(Predicate::Range {
                field: Field::DateOfBirth,
                min: earliest.map(FilterValue::Date),
                max: latest.map(FilterValue::Date),
            });
        }
        self
    }

    pub fn gender(self, value: Option<&str>) -> Self {
        match non_blank(value).and_then(|v| v.parse::<Gender>().ok()) {
            Some(gender) => self.equal(Field::Gender, gender.as_str()),
            None => {
                log_dropped("gender", value);
                self
            }
        }
    }

    pub fn marital_status(self, value: Option<&str>) -> Self {
        match non_blank(value).and_then(|v| v.parse::<MaritalStatus>().ok()) {
            Some(status) => self.equal(Field::MaritalStatus, status.as_str()),
            None => {
                log_dropped("maritalStatus", value);
                self
            }
        }
    }

    /// Exact, case-sensitive text match. Blank input is ignored.
    pub fn text(self, field: Field, value: Option<&str>) -> Self {
        match non_blank(value) {
            Some(value) => self.equal(field, value),
            None => self,
        }
    }

    pub fn height_range(mut self, min_cm: Option<u16>, max_cm: Option<u16>) -> Self {
        if min_cm.is_some() || max_cm.is_some() {
            self.predicates.push(Predicate::Range {
                field: Field::HeightCm,
                min: min_cm.map(|cm| FilterValue::Int(cm as i64)),
                max: max_cm.map(|cm| FilterValue::Int(cm as i64)),
            });
        }
        self
    }

    pub fn build(self, page: PageRequest) -> SearchSpec {
        SearchSpec {
            predicates: self.predicates,
            page,
        }
    }

    fn equal(mut self, field: Field, value: &str) -> Self {
        self.predicates.push(Predicate::Equality {
            field,
            value: FilterValue::Text(value.to_string()),
        });
        self
    }
}

/// Translate a full criteria bundle into a search spec
pub fn build_search_spec(criteria: &SearchCriteria, page: PageRequest, today: NaiveDate) -> SearchSpec {
    SearchSpecBuilder::new(today)
        .age_range(criteria.min_age, criteria.max_age)
        .gender(criteria.gender.as_deref())
        .marital_status(criteria.marital_status.as_deref())
        .text(Field::Religion, criteria.religion.as_deref())
        .text(Field::Caste, criteria.caste.as_deref())
        .text(Field::SubCaste, criteria.sub_caste.as_deref())
        .text(Field::MotherTongue, criteria.mother_tongue.as_deref())
        .text(Field::Country, criteria.country.as_deref())
        .text(Field::State, criteria.state.as_deref())
        .text(Field::City, criteria.city.as_deref())
        .height_range(criteria.min_height_cm, criteria.max_height_cm)
        .build(page)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn log_dropped(name: &str, value: Option<&str>) {
    if let Some(value) = value {
        tracing::debug!("Ignoring unrecognised {} filter value {:?}", name, value);
    }
}
