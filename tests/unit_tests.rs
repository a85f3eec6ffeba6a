// Unit tests for Match Broker

use chrono::{Datelike, Duration, NaiveDate, Utc};
use match_broker::core::{
    age::age_on, build_search_spec, Field, FilterValue, PageRequest, Predicate, SearchCriteria, SearchSpecBuilder,
};
use match_broker::models::{Gender, MaritalStatus, Patch, Profile, ProfileAttributes, ProfileId, ProfilePatch};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create_test_profile(id: i64, dob: NaiveDate) -> Profile {
    let now = Utc::now();
    Profile {
        id: ProfileId(id),
        owner_id: Uuid::new_v4(),
        attributes: ProfileAttributes {
            full_name: format!("Client {}", id),
            date_of_birth: dob,
            gender: Gender::Female,
            marital_status: MaritalStatus::NeverMarried,
            height_cm: 158,
            religion: "Sikh".to_string(),
            caste: "Jat".to_string(),
            sub_caste: Some("Sandhu".to_string()),
            mother_tongue: "Punjabi".to_string(),
            country: "India".to_string(),
            state: "Punjab".to_string(),
            city: "Amritsar".to_string(),
            education: "MBA".to_string(),
            occupation: "Banker".to_string(),
            annual_income: 2_000_000,
            about_me: None,
            photo_url: None,
            preferred_min_age: None,
            preferred_max_age: None,
            preferred_religion: None,
            preferred_caste: None,
            preferred_min_height_cm: None,
            preferred_max_height_cm: None,
        },
        is_active: true,
        created_date: now,
        last_updated_date: now,
    }
}

/// Reference age: count the birthdays that fit before `today`
fn reference_age(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = 0;
    loop {
        let next = years + 1;
        let year = dob.year() + next;
        // Feb 29 birthdays fall on Mar 1 in common years
        let anniversary = NaiveDate::from_ymd_opt(year, dob.month(), dob.day()).unwrap_or_else(|| date(year, 3, 1));
        if anniversary > today {
            return years as u32;
        }
        years = next;
    }
}

#[test]
fn test_age_matches_reference_over_many_dates() {
    let todays = [date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1), date(2023, 2, 28), date(2023, 3, 1)];

    for today in todays {
        let mut dob = date(1990, 1, 1);
        while dob <= date(2005, 12, 31) {
            assert_eq!(
                age_on(dob, today),
                reference_age(dob, today),
                "dob {} today {}",
                dob,
                today
            );
            dob += Duration::days(3);
        }
        // leap-day births specifically
        for year in [1992, 1996, 2000, 2004] {
            let dob = date(year, 2, 29);
            assert_eq!(age_on(dob, today), reference_age(dob, today), "dob {} today {}", dob, today);
        }
    }
}

#[test]
fn test_age_range_predicate_agrees_with_computed_age() {
    let todays = [date(2024, 2, 29), date(2023, 2, 28), date(2023, 3, 1), date(2024, 12, 31)];

    for today in todays {
        let spec = SearchSpecBuilder::new(today)
            .age_range(Some(25), Some(30))
            .build(PageRequest::default());

        let mut dob = date(1988, 1, 1);
        while dob <= date(2001, 12, 31) {
            let profile = create_test_profile(1, dob);
            let age = age_on(dob, today);
            assert_eq!(
                spec.matches(&profile),
                (25..=30).contains(&age),
                "dob {} age {} today {}",
                dob,
                age,
                today
            );
            dob += Duration::days(1);
        }
    }
}

#[test]
fn test_every_spec_requires_active_profiles() {
    let today = date(2024, 5, 1);
    let criteria = SearchCriteria {
        religion: Some("Sikh".to_string()),
        ..Default::default()
    };
    let spec = build_search_spec(&criteria, PageRequest::default(), today);

    assert!(spec.predicates.contains(&Predicate::Equality {
        field: Field::IsActive,
        value: FilterValue::Bool(true),
    }));

    let mut profile = create_test_profile(1, date(1995, 1, 1));
    assert!(spec.matches(&profile));

    profile.is_active = false;
    assert!(!spec.matches(&profile));
}

#[test]
fn test_malformed_enum_filters_behave_as_omitted() {
    let today = date(2024, 5, 1);
    let profile = create_test_profile(1, date(1995, 1, 1));
    let baseline = build_search_spec(&SearchCriteria::default(), PageRequest::default(), today);

    let criteria = SearchCriteria {
        gender: Some("unicorn".to_string()),
        marital_status: Some("it's complicated".to_string()),
        mother_tongue: Some("   ".to_string()),
        ..Default::default()
    };
    let spec = build_search_spec(&criteria, PageRequest::default(), today);

    assert_eq!(spec.predicates, baseline.predicates);
    assert!(spec.matches(&profile));
}

#[test]
fn test_text_filters_are_case_sensitive() {
    let today = date(2024, 5, 1);
    let profile = create_test_profile(1, date(1995, 1, 1));

    let exact = SearchCriteria {
        city: Some("Amritsar".to_string()),
        sub_caste: Some("Sandhu".to_string()),
        ..Default::default()
    };
    assert!(build_search_spec(&exact, PageRequest::default(), today).matches(&profile));

    let lowercase = SearchCriteria {
        city: Some("amritsar".to_string()),
        ..Default::default()
    };
    assert!(!build_search_spec(&lowercase, PageRequest::default(), today).matches(&profile));
}

#[test]
fn test_height_range_is_inclusive() {
    let today = date(2024, 5, 1);
    let profile = create_test_profile(1, date(1995, 1, 1));

    let at_bounds = SearchCriteria {
        min_height_cm: Some(158),
        max_height_cm: Some(158),
        ..Default::default()
    };
    assert!(build_search_spec(&at_bounds, PageRequest::default(), today).matches(&profile));

    let above = SearchCriteria {
        min_height_cm: Some(159),
        ..Default::default()
    };
    assert!(!build_search_spec(&above, PageRequest::default(), today).matches(&profile));
}

#[test]
fn test_patch_leaves_absent_fields_untouched() {
    let mut profile = create_test_profile(1, date(1995, 1, 1));
    let before = profile.attributes.clone();

    let patch: ProfilePatch = serde_json::from_str(r#"{"city": "Ludhiana", "subCaste": null}"#).unwrap();
    assert_eq!(patch.city, Patch::Set("Ludhiana".to_string()));
    assert_eq!(patch.sub_caste, Patch::Set(None));
    assert!(patch.religion.is_absent());

    let written = patch.apply(&mut profile.attributes, &mut profile.is_active);

    assert_eq!(written, 2);
    assert_eq!(profile.attributes.city, "Ludhiana");
    assert_eq!(profile.attributes.sub_caste, None);
    assert_eq!(profile.attributes.religion, before.religion);
    assert_eq!(profile.attributes.annual_income, before.annual_income);
    assert!(profile.is_active);
}

#[test]
fn test_empty_patch_changes_nothing() {
    let mut profile = create_test_profile(1, date(1995, 1, 1));
    let before = profile.clone();

    let written = ProfilePatch::default().apply(&mut profile.attributes, &mut profile.is_active);

    assert_eq!(written, 0);
    assert_eq!(profile, before);
}
