use chrono::{Datelike, Months, NaiveDate};

/// Whole years elapsed between `date_of_birth` and `today`
///
/// A birthday that has not happened yet this year does not count. Dates of
/// birth in the future yield 0.
#[inline]
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    if date_of_birth > today {
        return 0;
    }

    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }

    years.max(0) as u32
}

/// `today` shifted back by whole years. Feb 29 clamps to Feb 28.
fn years_before(today: NaiveDate, years: u32) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(years.checked_mul(12)?))
}

/// Latest date of birth for someone who is at least `min_age` today
///
/// A profile qualifies when `date_of_birth <= bound`.
pub fn latest_birth_date_for_min_age(min_age: u32, today: NaiveDate) -> Option<NaiveDate> {
    years_before(today, min_age)
}

/// Earliest date of birth for someone who is at most `max_age` today
///
/// A profile qualifies when `date_of_birth >= bound`, where the bound is the
/// day after they would turn `max_age + 1`, so the whole final year is kept.
pub fn earliest_birth_date_for_max_age(max_age: u32, today: NaiveDate) -> Option<NaiveDate> {
    years_before(today, max_age.checked_add(1)?)?.succ_opt()
}
