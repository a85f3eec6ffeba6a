use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

use crate::core::search::{FilterValue, Predicate, SearchSpec, SortKey};
use crate::models::{
    BrokerId, Interest, InterestId, InterestStatus, NewInterest, NewProfile, Page, Profile, ProfileAttributes, ProfileId,
};
use crate::services::store::{InterestStore, ProfileStore, StoreError, StoreResult};

const PROFILE_COLUMNS: &str = "id, owner_id, full_name, date_of_birth, gender, marital_status, height_cm, \
    religion, caste, sub_caste, mother_tongue, country, state, city, education, occupation, annual_income, \
    about_me, photo_url, preferred_min_age, preferred_max_age, preferred_religion, preferred_caste, \
    preferred_min_height_cm, preferred_max_height_cm, is_active, created_date, last_updated_date";

const INTEREST_COLUMNS: &str = "id, sender_profile_id, receiver_profile_id, status, sent_at, responded_at";

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    owner_id: Uuid,
    full_name: String,
    date_of_birth: NaiveDate,
    gender: String,
    marital_status: String,
    height_cm: i32,
    religion: String,
    caste: String,
    sub_caste: Option<String>,
    mother_tongue: String,
    country: String,
    state: String,
    city: String,
    education: String,
    occupation: String,
    annual_income: i64,
    about_me: Option<String>,
    photo_url: Option<String>,
    preferred_min_age: Option<i16>,
    preferred_max_age: Option<i16>,
    preferred_religion: Option<String>,
    preferred_caste: Option<String>,
    preferred_min_height_cm: Option<i32>,
    preferred_max_height_cm: Option<i32>,
    is_active: bool,
    created_date: DateTime<Utc>,
    last_updated_date: DateTime<Utc>,
}

fn narrow<T: TryFrom<i64>>(value: i64, column: &str, id: i64) -> StoreResult<T> {
    T::try_from(value).map_err(|_| StoreError::Corrupt(format!("profile {}: {} out of range ({})", id, column, value)))
}

fn narrow_opt<T: TryFrom<i64>>(value: Option<i64>, column: &str, id: i64) -> StoreResult<Option<T>> {
    value.map(|v| narrow(v, column, id)).transpose()
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: crate::models::ParseEnumError| StoreError::Corrupt(format!("profile {}: {}", id, e));

        Ok(Profile {
            id: ProfileId(id),
            owner_id: row.owner_id,
            attributes: ProfileAttributes {
                full_name: row.full_name,
                date_of_birth: row.date_of_birth,
                gender: row.gender.parse().map_err(corrupt)?,
                marital_status: row.marital_status.parse().map_err(corrupt)?,
                height_cm: narrow(row.height_cm as i64, "height_cm", id)?,
                religion: row.religion,
                caste: row.caste,
                sub_caste: row.sub_caste,
                mother_tongue: row.mother_tongue,
                country: row.country,
                state: row.state,
                city: row.city,
                education: row.education,
                occupation: row.occupation,
                annual_income: row.annual_income,
                about_me: row.about_me,
                photo_url: row.photo_url,
                preferred_min_age: narrow_opt(row.preferred_min_age.map(i64::from), "preferred_min_age", id)?,
                preferred_max_age: narrow_opt(row.preferred_max_age.map(i64::from), "preferred_max_age", id)?,
                preferred_religion: row.preferred_religion,
                preferred_caste: row.preferred_caste,
                preferred_min_height_cm: narrow_opt(
                    row.preferred_min_height_cm.map(i64::from),
                    "preferred_min_height_cm",
                    id,
                )?,
                preferred_max_height_cm: narrow_opt(
                    row.preferred_max_height_cm.map(i64::from),
                    "preferred_max_height_cm",
                    id,
                )?,
            },
            is_active: row.is_active,
            created_date: row.created_date,
            last_updated_date: row.last_updated_date,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InterestRow {
    id: i64,
    sender_profile_id: i64,
    receiver_profile_id: i64,
    status: String,
    sent_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<InterestRow> for Interest {
    type Error = StoreError;

    fn try_from(row: InterestRow) -> Result<Self, Self::Error> {
        Ok(Interest {
            id: InterestId(row.id),
            sender_profile_id: ProfileId(row.sender_profile_id),
            receiver_profile_id: ProfileId(row.receiver_profile_id),
            status: row
                .status
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("interest {}: {}", row.id, e)))?,
            sent_at: row.sent_at,
            responded_at: row.responded_at,
        })
    }
}

fn into_profiles(rows: Vec<ProfileRow>) -> StoreResult<Vec<Profile>> {
    rows.into_iter().map(Profile::try_from).collect()
}

fn into_interests(rows: Vec<InterestRow>) -> StoreResult<Vec<Interest>> {
    rows.into_iter().map(Interest::try_from).collect()
}

/// Append `AND ...` for every predicate
fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for predicate in predicates {
        match predicate {
            Predicate::Equality { field, value } => {
                builder.push(" AND ").push(field.column()).push(" = ");
                push_value(builder, value);
            }
            Predicate::Range { field, min, max } => {
                if let Some(min) = min {
                    builder.push(" AND ").push(field.column()).push(" >= ");
                    push_value(builder, min);
                }
                if let Some(max) = max {
                    builder.push(" AND ").push(field.column()).push(" <= ");
                    push_value(builder, max);
                }
            }
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(text) => builder.push_bind(text.clone()),
        FilterValue::Date(date) => builder.push_bind(*date),
        FilterValue::Int(n) => builder.push_bind(*n),
        FilterValue::Bool(b) => builder.push_bind(*b),
    };
}

/// Postgres-backed store for profiles and interests
///
/// Pair uniqueness is a unique index; status transitions are conditional
/// UPDATEs, so both hold across service instances.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn insert(&self, profile: NewProfile) -> StoreResult<Profile> {
        let a = &profile.attributes;
        let query = format!(
            r#"
            INSERT INTO profiles (
                owner_id, full_name, date_of_birth, gender, marital_status, height_cm,
                religion, caste, sub_caste, mother_tongue, country, state, city,
                education, occupation, annual_income, about_me, photo_url,
                preferred_min_age, preferred_max_age, preferred_religion, preferred_caste,
                preferred_min_height_cm, preferred_max_height_cm,
                is_active, created_date, last_updated_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                    $19, $20, $21, $22, $23, $24, TRUE, $25, $25)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let row: ProfileRow = sqlx::query_as(&query)
            .bind(profile.owner_id)
            .bind(&a.full_name)
            .bind(a.date_of_birth)
            .bind(a.gender.as_str())
            .bind(a.marital_status.as_str())
            .bind(a.height_cm as i32)
            .bind(&a.religion)
            .bind(&a.caste)
            .bind(&a.sub_caste)
            .bind(&a.mother_tongue)
            .bind(&a.country)
            .bind(&a.state)
            .bind(&a.city)
            .bind(&a.education)
            .bind(&a.occupation)
            .bind(a.annual_income)
            .bind(&a.about_me)
            .bind(&a.photo_url)
            .bind(a.preferred_min_age.map(i16::from))
            .bind(a.preferred_max_age.map(i16::from))
            .bind(&a.preferred_religion)
            .bind(&a.preferred_caste)
            .bind(a.preferred_min_height_cm.map(i32::from))
            .bind(a.preferred_max_height_cm.map(i32::from))
            .bind(profile.created_at)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Stored profile {} for broker {}", row.id, row.owner_id);

        row.try_into()
    }

    async fn update(&self, profile: &Profile, expected_version: DateTime<Utc>) -> StoreResult<Option<Profile>> {
        let a = &profile.attributes;
        let query = format!(
            r#"
            UPDATE profiles SET
                full_name = $3, date_of_birth = $4, gender = $5, marital_status = $6, height_cm = $7,
                religion = $8, caste = $9, sub_caste = $10, mother_tongue = $11, country = $12,
                state = $13, city = $14, education = $15, occupation = $16, annual_income = $17,
                about_me = $18, photo_url = $19, preferred_min_age = $20, preferred_max_age = $21,
                preferred_religion = $22, preferred_caste = $23, preferred_min_height_cm = $24,
                preferred_max_height_cm = $25, is_active = $26, last_updated_date = $27
            WHERE id = $1 AND last_updated_date = $2
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(profile.id)
            .bind(expected_version)
            .bind(&a.full_name)
            .bind(a.date_of_birth)
            .bind(a.gender.as_str())
            .bind(a.marital_status.as_str())
            .bind(a.height_cm as i32)
            .bind(&a.religion)
            .bind(&a.caste)
            .bind(&a.sub_caste)
            .bind(&a.mother_tongue)
            .bind(&a.country)
            .bind(&a.state)
            .bind(&a.city)
            .bind(&a.education)
            .bind(&a.occupation)
            .bind(a.annual_income)
            .bind(&a.about_me)
            .bind(&a.photo_url)
            .bind(a.preferred_min_age.map(i16::from))
            .bind(a.preferred_max_age.map(i16::from))
            .bind(&a.preferred_religion)
            .bind(&a.preferred_caste)
            .bind(a.preferred_min_height_cm.map(i32::from))
            .bind(a.preferred_max_height_cm.map(i32::from))
            .bind(profile.is_active)
            .bind(profile.last_updated_date)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Profile::try_from).transpose()
    }

    async fn find_by_id(&self, id: ProfileId) -> StoreResult<Option<Profile>> {
        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let row: Option<ProfileRow> = sqlx::query_as(&query).bind(id).fetch_optional(&self.pool).await?;

        row.map(Profile::try_from).transpose()
    }

    async fn find_all_by_owner(&self, owner_id: BrokerId) -> StoreResult<Vec<Profile>> {
        let query = format!("SELECT {} FROM profiles WHERE owner_id = $1 ORDER BY id ASC", PROFILE_COLUMNS);
        let rows: Vec<ProfileRow> = sqlx::query_as(&query).bind(owner_id).fetch_all(&self.pool).await?;

        into_profiles(rows)
    }

    async fn search(&self, spec: &SearchSpec) -> StoreResult<Page<Profile>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM profiles WHERE TRUE");
        push_predicates(&mut count, &spec.predicates);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM profiles WHERE TRUE", PROFILE_COLUMNS));
        push_predicates(&mut select, &spec.predicates);
        select
            .push(" ORDER BY ")
            .push(spec.page.sort.column())
            .push(" ")
            .push(spec.page.direction.keyword());
        if spec.page.sort != SortKey::Id {
            select.push(", id ASC");
        }
        select
            .push(" LIMIT ")
            .push_bind(spec.page.size as i64)
            .push(" OFFSET ")
            .push_bind(spec.page.offset() as i64);

        let rows: Vec<ProfileRow> = select.build_query_as().fetch_all(&self.pool).await?;

        tracing::debug!("Search matched {} profiles, returning {}", total, rows.len());

        Ok(Page::new(into_profiles(rows)?, spec.page.page, spec.page.size, total.max(0) as u64))
    }

    async fn delete(&self, id: ProfileId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM interests WHERE sender_profile_id = $1 OR receiver_profile_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl InterestStore for PgStore {
    async fn insert(&self, interest: NewInterest) -> StoreResult<Interest> {
        let query = format!(
            r#"
            INSERT INTO interests (sender_profile_id, receiver_profile_id, status, sent_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            INTEREST_COLUMNS
        );

        let result = sqlx::query_as::<_, InterestRow>(&query)
            .bind(interest.sender_profile_id)
            .bind(interest.receiver_profile_id)
            .bind(InterestStatus::Pending.as_str())
            .bind(interest.sent_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => row.try_into(),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Duplicate(format!(
                "interest {} -> {}",
                interest.sender_profile_id, interest.receiver_profile_id
            ))),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                let missing = match db.constraint() {
                    Some(name) if name.contains("receiver") => interest.receiver_profile_id,
                    _ => interest.sender_profile_id,
                };
                Err(StoreError::MissingProfile(missing))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: InterestId) -> StoreResult<Option<Interest>> {
        let query = format!("SELECT {} FROM interests WHERE id = $1", INTEREST_COLUMNS);
        let row: Option<InterestRow> = sqlx::query_as(&query).bind(id).fetch_optional(&self.pool).await?;

        row.map(Interest::try_from).transpose()
    }

    async fn find_by_sender(&self, profile_id: ProfileId) -> StoreResult<Vec<Interest>> {
        let query = format!(
            "SELECT {} FROM interests WHERE sender_profile_id = $1 ORDER BY id ASC",
            INTEREST_COLUMNS
        );
        let rows: Vec<InterestRow> = sqlx::query_as(&query).bind(profile_id).fetch_all(&self.pool).await?;

        into_interests(rows)
    }

    async fn find_by_receiver(&self, profile_id: ProfileId) -> StoreResult<Vec<Interest>> {
        let query = format!(
            "SELECT {} FROM interests WHERE receiver_profile_id = $1 ORDER BY id ASC",
            INTEREST_COLUMNS
        );
        let rows: Vec<InterestRow> = sqlx::query_as(&query).bind(profile_id).fetch_all(&self.pool).await?;

        into_interests(rows)
    }

    async fn exists_by_pair(&self, sender: ProfileId, receiver: ProfileId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM interests WHERE sender_profile_id = $1 AND receiver_profile_id = $2)",
        )
        .bind(sender)
        .bind(receiver)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn transition(
        &self,
        id: InterestId,
        expected: InterestStatus,
        next: InterestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Interest>> {
        let query = format!(
            r#"
            UPDATE interests SET status = $3, responded_at = $4
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            INTEREST_COLUMNS
        );

        let row: Option<InterestRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(next.as_str())
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Interest::try_from).transpose()
    }
}
