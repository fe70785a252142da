use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{CanonicalPair, Coordinate, LikeDecision, Match, MatchInsert, UserId, UserProfile, Verdict};
use crate::services::store::{DecisionStore, MatchStore, ProfileStore, StoreError};

/// Row shape of `like_decisions`
#[derive(Debug, sqlx::FromRow)]
struct DecisionRow {
    actor_id: i64,
    target_id: i64,
    verdict: Verdict,
    decided_at: DateTime<Utc>,
}

impl From<DecisionRow> for LikeDecision {
    fn from(row: DecisionRow) -> Self {
        LikeDecision {
            actor_id: row.actor_id,
            target_id: row.target_id,
            verdict: row.verdict,
            decided_at: row.decided_at,
        }
    }
}

/// Row shape of `matches`
#[derive(Debug, sqlx::FromRow)]
struct MatchRow {
    id: Uuid,
    user_a: i64,
    user_b: i64,
    matched_at: DateTime<Utc>,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Match {
            id: row.id,
            user_a: row.user_a,
            user_b: row.user_b,
            matched_at: row.matched_at,
        }
    }
}

/// Row shape of `user_profiles`
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    name: String,
    age: i16,
    gender: String,
    looking_for: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    is_active: bool,
    is_online: bool,
    last_seen: Option<DateTime<Utc>>,
    last_active: Option<DateTime<Utc>>,
    bio: Option<String>,
    interests: Vec<String>,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let age = u8::try_from(row.age)
            .map_err(|_| StoreError::InvalidResponse(format!("age {} out of range for user {}", row.age, row.id)))?;

        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        };

        Ok(UserProfile {
            id: row.id,
            name: row.name,
            age,
            gender: row.gender,
            looking_for: row.looking_for,
            location,
            is_active: row.is_active,
            is_online: row.is_online,
            last_seen: row.last_seen,
            last_active: row.last_active,
            bio: row.bio,
            interests: row.interests.into_iter().collect(),
        })
    }
}

const PROFILE_COLUMNS: &str = "id, name, age, gender, looking_for, latitude, longitude, \
    is_active, is_online, last_seen, last_active, bio, interests";

/// PostgreSQL store for profiles, decisions and matches.
///
/// Duplicate matches are prevented by the `matches_pair_unique`
/// constraint on the canonical (user_a, user_b) pair, so concurrent
/// reciprocal likes from separate processes still produce one row.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
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

    /// Insert or replace a mirrored profile row
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO user_profiles
                (id, name, age, gender, looking_for, latitude, longitude,
                 is_active, is_online, last_seen, last_active, bio, interests)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                looking_for = EXCLUDED.looking_for,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                is_active = EXCLUDED.is_active,
                bio = EXCLUDED.bio,
                interests = EXCLUDED.interests
        "#;

        let interests: Vec<String> = profile.interests.iter().cloned().collect();

        sqlx::query(query)
            .bind(profile.id)
            .bind(&profile.name)
            .bind(i16::from(profile.age))
            .bind(&profile.gender)
            .bind(&profile.looking_for)
            .bind(profile.location.map(|c| c.latitude))
            .bind(profile.location.map(|c| c.longitude))
            .bind(profile.is_active)
            .bind(profile.is_online)
            .bind(profile.last_seen)
            .bind(profile.last_active)
            .bind(&profile.bio)
            .bind(&interests)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let query = format!("SELECT {} FROM user_profiles WHERE id = $1", PROFILE_COLUMNS);

        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(UserProfile::try_from)
            .transpose()
    }

    async fn active_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        let query = format!(
            "SELECT {} FROM user_profiles WHERE is_active ORDER BY id",
            PROFILE_COLUMNS
        );

        let rows = sqlx::query_as::<_, ProfileRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Loaded {} active profiles", rows.len());

        rows.into_iter().map(UserProfile::try_from).collect()
    }

    async fn update_location(
        &self,
        user_id: UserId,
        location: Option<Coordinate>,
    ) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE user_profiles
            SET latitude = $2, longitude = $3
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(location.map(|c| c.latitude))
            .bind(location.map(|c| c.longitude))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_online_status(&self, user_id: UserId, online: bool) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE user_profiles
            SET is_online = $2, last_seen = NOW(), last_active = NOW()
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(online)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DecisionStore for PostgresStore {
    /// Row-locks the existing decision (if any) so concurrent writes to the
    /// same ordered pair serialize; the last to commit wins.
    async fn upsert_decision(&self, decision: &LikeDecision) -> Result<Option<Verdict>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<Verdict> = sqlx::query_scalar(
            r#"
            SELECT verdict
            FROM like_decisions
            WHERE actor_id = $1 AND target_id = $2
            FOR UPDATE
            "#,
        )
        .bind(decision.actor_id)
        .bind(decision.target_id)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO like_decisions (actor_id, target_id, verdict, decided_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (actor_id, target_id)
            DO UPDATE SET
                verdict = EXCLUDED.verdict,
                decided_at = EXCLUDED.decided_at
            "#,
        )
        .bind(decision.actor_id)
        .bind(decision.target_id)
        .bind(decision.verdict)
        .bind(decision.decided_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            "Recorded decision: {} -> {} ({:?}, previous {:?})",
            decision.actor_id,
            decision.target_id,
            decision.verdict,
            previous
        );

        Ok(previous)
    }

    async fn get_decision(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<Option<LikeDecision>, StoreError> {
        let query = r#"
            SELECT actor_id, target_id, verdict, decided_at
            FROM like_decisions
            WHERE actor_id = $1 AND target_id = $2
        "#;

        let row = sqlx::query_as::<_, DecisionRow>(query)
            .bind(actor_id)
            .bind(target_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn decisions_by(&self, actor_id: UserId) -> Result<Vec<LikeDecision>, StoreError> {
        let query = r#"
            SELECT actor_id, target_id, verdict, decided_at
            FROM like_decisions
            WHERE actor_id = $1
        "#;

        let rows = sqlx::query_as::<_, DecisionRow>(query)
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("User {} has {} decisions", actor_id, rows.len());

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn insert_match(&self, candidate: Match) -> Result<MatchInsert, StoreError> {
        let query = r#"
            INSERT INTO matches (id, user_a, user_b, matched_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_a, user_b) DO NOTHING
            RETURNING id, user_a, user_b, matched_at
        "#;

        let inserted = sqlx::query_as::<_, MatchRow>(query)
            .bind(candidate.id)
            .bind(candidate.user_a)
            .bind(candidate.user_b)
            .bind(candidate.matched_at)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(MatchInsert::Created(row.into()));
        }

        // Lost the race: the conflicting row is committed by now
        let pair = candidate.pair();
        match self.find_match(pair).await? {
            Some(existing) => Ok(MatchInsert::Existing(existing)),
            None => Err(StoreError::Constraint(format!(
                "match insert for ({}, {}) conflicted but no row was found",
                pair.low(),
                pair.high()
            ))),
        }
    }

    async fn find_match(&self, pair: CanonicalPair) -> Result<Option<Match>, StoreError> {
        let query = r#"
            SELECT id, user_a, user_b, matched_at
            FROM matches
            WHERE user_a = $1 AND user_b = $2
        "#;

        let row = sqlx::query_as::<_, MatchRow>(query)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn matches_for(&self, user_id: UserId) -> Result<Vec<Match>, StoreError> {
        let query = r#"
            SELECT id, user_a, user_b, matched_at
            FROM matches
            WHERE user_a = $1 OR user_b = $1
            ORDER BY matched_at ASC
        "#;

        let rows = sqlx::query_as::<_, MatchRow>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
