use crate::error::RepoError;
use crate::models::{
    AttendanceForm, Concert, ConcertDetail, ContactInfo, Practice, Score, ScoreComment,
    ScoreWithComments,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

// --- Typed write payloads ---
//
// Handlers parse and validate raw request bodies, then hand the repository
// these already-typed values. `Option` fields in the patch structs implement
// merge-patch semantics: `None` leaves the stored value untouched.

#[derive(Debug, Clone)]
pub struct ConcertPatch {
    pub id: Uuid,
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewAttendanceForm {
    pub concert_id: Uuid,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AttendanceFormPatch {
    pub id: Uuid,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewScore {
    pub concert_id: Uuid,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ScorePatch {
    pub id: Uuid,
    pub title: Option<String>,
    pub url: Option<String>,
    /// A non-empty comment is appended to the score's history in the same
    /// logical operation as the field update.
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPractice {
    pub concert_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub venue: String,
    pub address: Option<String>,
    pub items: Option<String>,
    pub notes: Option<String>,
    pub memo: Option<String>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PracticePatch {
    pub id: Uuid,
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub items: Option<String>,
    pub notes: Option<String>,
    pub memo: Option<String>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the specific
/// implementation (Postgres in production, in-memory in tests).
///
/// Conventions shared by every implementation:
/// - Absence is a value, not an error: fetch/update of a missing id yields
///   `Ok(None)`, delete yields `Ok(false)`.
/// - Child creation checks the parent concert first and yields `Ok(None)` when
///   it does not exist, so referential integrity is enforced before insert.
/// - Every mutation refreshes the row's `updated_at`.
/// - Only genuine persistence failures surface as `Err(RepoError)`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Concerts ---
    /// Listing ordered most-recently-updated first; `active_only` filters to
    /// `is_active = true`.
    async fn list_concerts(&self, active_only: bool) -> Result<Vec<Concert>, RepoError>;
    /// Fetch by id regardless of the active flag: soft-deleted concerts stay
    /// reachable here.
    async fn get_concert(&self, id: Uuid) -> Result<Option<Concert>, RepoError>;
    /// Concert plus all children in display order (see `ConcertDetail`).
    async fn get_concert_detail(&self, id: Uuid) -> Result<Option<ConcertDetail>, RepoError>;
    async fn create_concert(
        &self,
        title: String,
        date: DateTime<Utc>,
        venue: String,
    ) -> Result<Concert, RepoError>;
    async fn update_concert(&self, patch: ConcertPatch) -> Result<Option<Concert>, RepoError>;
    /// Logical delete: flips `is_active` to false and leaves every child row in
    /// place. Repeating the operation on an already-inactive concert is a no-op
    /// success (`Ok(true)` as long as the row exists).
    async fn deactivate_concert(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Attendance forms ---
    async fn list_attendance_forms(
        &self,
        concert_id: Uuid,
    ) -> Result<Vec<AttendanceForm>, RepoError>;
    async fn get_attendance_form(&self, id: Uuid) -> Result<Option<AttendanceForm>, RepoError>;
    async fn create_attendance_form(
        &self,
        form: NewAttendanceForm,
    ) -> Result<Option<AttendanceForm>, RepoError>;
    async fn update_attendance_form(
        &self,
        patch: AttendanceFormPatch,
    ) -> Result<Option<AttendanceForm>, RepoError>;
    async fn delete_attendance_form(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Scores ---
    async fn list_scores(&self, concert_id: Uuid) -> Result<Vec<ScoreWithComments>, RepoError>;
    async fn create_score(&self, score: NewScore) -> Result<Option<Score>, RepoError>;
    /// Merge-patch update; when the patch carries a non-empty comment, the
    /// comment append happens atomically with the field update.
    async fn update_score(&self, patch: ScorePatch) -> Result<Option<Score>, RepoError>;

    // --- Practices ---
    async fn list_practices(&self, concert_id: Uuid) -> Result<Vec<Practice>, RepoError>;
    async fn get_practice(&self, id: Uuid) -> Result<Option<Practice>, RepoError>;
    async fn create_practice(&self, practice: NewPractice) -> Result<Option<Practice>, RepoError>;
    async fn update_practice(&self, patch: PracticePatch) -> Result<Option<Practice>, RepoError>;
    async fn delete_practice(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Contact info ---
    /// The most recently updated row; the record is singleton-like.
    async fn get_contact_info(&self) -> Result<Option<ContactInfo>, RepoError>;
    /// Updates the logical record, creating it on first write.
    async fn update_contact_info(
        &self,
        email: String,
        description: String,
    ) -> Result<ContactInfo, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application
/// state. Constructed once at startup and injected; never a process global.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres implementation ---

const CONCERT_COLS: &str = "id, title, date, venue, is_active, created_at, updated_at";
const ATTENDANCE_COLS: &str = "id, concert_id, title, url, description, created_at, updated_at";
const SCORE_COLS: &str = "id, concert_id, title, url, is_valid, created_at, updated_at";
const PRACTICE_COLS: &str = "id, concert_id, title, start_time, end_time, venue, address, items, notes, memo, audio_url, video_url, created_at, updated_at";

/// PostgresRepository
///
/// The production implementation, backed by a shared `PgPool`. Individual
/// statements rely on the store's single-row guarantees only; concurrent
/// writers to the same entity are last-write-wins on the patched field set.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn concert_exists(&self, id: Uuid) -> Result<bool, RepoError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM concerts WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_concerts(&self, active_only: bool) -> Result<Vec<Concert>, RepoError> {
        let sql = if active_only {
            format!("SELECT {CONCERT_COLS} FROM concerts WHERE is_active = true ORDER BY updated_at DESC")
        } else {
            format!("SELECT {CONCERT_COLS} FROM concerts ORDER BY updated_at DESC")
        };
        Ok(sqlx::query_as::<_, Concert>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_concert(&self, id: Uuid) -> Result<Option<Concert>, RepoError> {
        let sql = format!("SELECT {CONCERT_COLS} FROM concerts WHERE id = $1");
        Ok(sqlx::query_as::<_, Concert>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Assembles the full aggregate: the concert row plus each child collection
    /// in its display order. Inactive concerts are served here too; only the
    /// active *listing* hides them.
    async fn get_concert_detail(&self, id: Uuid) -> Result<Option<ConcertDetail>, RepoError> {
        let Some(concert) = self.get_concert(id).await? else {
            return Ok(None);
        };

        let attendance_forms = self.list_attendance_forms(id).await?;
        let scores = self.list_scores(id).await?;
        let practices = self.list_practices(id).await?;

        Ok(Some(ConcertDetail {
            concert,
            attendance_forms,
            scores,
            practices,
        }))
    }

    async fn create_concert(
        &self,
        title: String,
        date: DateTime<Utc>,
        venue: String,
    ) -> Result<Concert, RepoError> {
        let sql = format!(
            "INSERT INTO concerts (id, title, date, venue, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, true, NOW(), NOW()) RETURNING {CONCERT_COLS}"
        );
        Ok(sqlx::query_as::<_, Concert>(&sql)
            .bind(Uuid::new_v4())
            .bind(title)
            .bind(date)
            .bind(venue)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_concert(&self, patch: ConcertPatch) -> Result<Option<Concert>, RepoError> {
        let sql = format!(
            "UPDATE concerts SET \
                title = COALESCE($2, title), \
                date = COALESCE($3, date), \
                venue = COALESCE($4, venue), \
                is_active = COALESCE($5, is_active), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {CONCERT_COLS}"
        );
        Ok(sqlx::query_as::<_, Concert>(&sql)
            .bind(patch.id)
            .bind(patch.title)
            .bind(patch.date)
            .bind(patch.venue)
            .bind(patch.is_active)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn deactivate_concert(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE concerts SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_attendance_forms(
        &self,
        concert_id: Uuid,
    ) -> Result<Vec<AttendanceForm>, RepoError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLS} FROM attendance_forms \
             WHERE concert_id = $1 ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, AttendanceForm>(&sql)
            .bind(concert_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_attendance_form(&self, id: Uuid) -> Result<Option<AttendanceForm>, RepoError> {
        let sql = format!("SELECT {ATTENDANCE_COLS} FROM attendance_forms WHERE id = $1");
        Ok(sqlx::query_as::<_, AttendanceForm>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_attendance_form(
        &self,
        form: NewAttendanceForm,
    ) -> Result<Option<AttendanceForm>, RepoError> {
        if !self.concert_exists(form.concert_id).await? {
            return Ok(None);
        }
        let sql = format!(
            "INSERT INTO attendance_forms (id, concert_id, title, url, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {ATTENDANCE_COLS}"
        );
        Ok(Some(
            sqlx::query_as::<_, AttendanceForm>(&sql)
                .bind(Uuid::new_v4())
                .bind(form.concert_id)
                .bind(form.title)
                .bind(form.url)
                .bind(form.description)
                .fetch_one(&self.pool)
                .await?,
        ))
    }

    async fn update_attendance_form(
        &self,
        patch: AttendanceFormPatch,
    ) -> Result<Option<AttendanceForm>, RepoError> {
        let sql = format!(
            "UPDATE attendance_forms SET \
                title = COALESCE($2, title), \
                url = COALESCE($3, url), \
                description = COALESCE($4, description), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {ATTENDANCE_COLS}"
        );
        Ok(sqlx::query_as::<_, AttendanceForm>(&sql)
            .bind(patch.id)
            .bind(patch.title)
            .bind(patch.url)
            .bind(patch.description)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_attendance_form(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM attendance_forms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_scores(&self, concert_id: Uuid) -> Result<Vec<ScoreWithComments>, RepoError> {
        let sql = format!(
            "SELECT {SCORE_COLS} FROM scores WHERE concert_id = $1 ORDER BY updated_at DESC"
        );
        let scores = sqlx::query_as::<_, Score>(&sql)
            .bind(concert_id)
            .fetch_all(&self.pool)
            .await?;

        let mut enriched = Vec::with_capacity(scores.len());
        for score in scores {
            let comments = sqlx::query_as::<_, ScoreComment>(
                "SELECT id, score_id, content, created_at FROM score_comments \
                 WHERE score_id = $1 ORDER BY created_at DESC",
            )
            .bind(score.id)
            .fetch_all(&self.pool)
            .await?;
            enriched.push(ScoreWithComments { score, comments });
        }
        Ok(enriched)
    }

    async fn create_score(&self, score: NewScore) -> Result<Option<Score>, RepoError> {
        if !self.concert_exists(score.concert_id).await? {
            return Ok(None);
        }
        // New scores start out valid.
        let sql = format!(
            "INSERT INTO scores (id, concert_id, title, url, is_valid, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, true, NOW(), NOW()) RETURNING {SCORE_COLS}"
        );
        Ok(Some(
            sqlx::query_as::<_, Score>(&sql)
                .bind(Uuid::new_v4())
                .bind(score.concert_id)
                .bind(score.title)
                .bind(score.url)
                .fetch_one(&self.pool)
                .await?,
        ))
    }

    async fn update_score(&self, patch: ScorePatch) -> Result<Option<Score>, RepoError> {
        let comment = patch
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        // Field update and comment append commit together or not at all.
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE scores SET \
                title = COALESCE($2, title), \
                url = COALESCE($3, url), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {SCORE_COLS}"
        );
        let score = sqlx::query_as::<_, Score>(&sql)
            .bind(patch.id)
            .bind(patch.title)
            .bind(patch.url)
            .fetch_optional(&mut *tx)
            .await?;

        if let (Some(score), Some(content)) = (&score, comment) {
            sqlx::query(
                "INSERT INTO score_comments (id, score_id, content, created_at) \
                 VALUES ($1, $2, $3, NOW())",
            )
            .bind(Uuid::new_v4())
            .bind(score.id)
            .bind(content)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(score)
    }

    async fn list_practices(&self, concert_id: Uuid) -> Result<Vec<Practice>, RepoError> {
        let sql = format!(
            "SELECT {PRACTICE_COLS} FROM practices WHERE concert_id = $1 ORDER BY start_time ASC"
        );
        Ok(sqlx::query_as::<_, Practice>(&sql)
            .bind(concert_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_practice(&self, id: Uuid) -> Result<Option<Practice>, RepoError> {
        let sql = format!("SELECT {PRACTICE_COLS} FROM practices WHERE id = $1");
        Ok(sqlx::query_as::<_, Practice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_practice(&self, practice: NewPractice) -> Result<Option<Practice>, RepoError> {
        if !self.concert_exists(practice.concert_id).await? {
            return Ok(None);
        }
        let sql = format!(
            "INSERT INTO practices \
                (id, concert_id, title, start_time, end_time, venue, address, items, notes, memo, audio_url, video_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), NOW()) \
             RETURNING {PRACTICE_COLS}"
        );
        Ok(Some(
            sqlx::query_as::<_, Practice>(&sql)
                .bind(Uuid::new_v4())
                .bind(practice.concert_id)
                .bind(practice.title)
                .bind(practice.start_time)
                .bind(practice.end_time)
                .bind(practice.venue)
                .bind(practice.address)
                .bind(practice.items)
                .bind(practice.notes)
                .bind(practice.memo)
                .bind(practice.audio_url)
                .bind(practice.video_url)
                .fetch_one(&self.pool)
                .await?,
        ))
    }

    async fn update_practice(&self, patch: PracticePatch) -> Result<Option<Practice>, RepoError> {
        let sql = format!(
            "UPDATE practices SET \
                title = COALESCE($2, title), \
                start_time = COALESCE($3, start_time), \
                end_time = COALESCE($4, end_time), \
                venue = COALESCE($5, venue), \
                address = COALESCE($6, address), \
                items = COALESCE($7, items), \
                notes = COALESCE($8, notes), \
                memo = COALESCE($9, memo), \
                audio_url = COALESCE($10, audio_url), \
                video_url = COALESCE($11, video_url), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {PRACTICE_COLS}"
        );
        Ok(sqlx::query_as::<_, Practice>(&sql)
            .bind(patch.id)
            .bind(patch.title)
            .bind(patch.start_time)
            .bind(patch.end_time)
            .bind(patch.venue)
            .bind(patch.address)
            .bind(patch.items)
            .bind(patch.notes)
            .bind(patch.memo)
            .bind(patch.audio_url)
            .bind(patch.video_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_practice(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM practices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_contact_info(&self) -> Result<Option<ContactInfo>, RepoError> {
        Ok(sqlx::query_as::<_, ContactInfo>(
            "SELECT id, email, description, created_at, updated_at FROM contact_info \
             ORDER BY updated_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_contact_info(
        &self,
        email: String,
        description: String,
    ) -> Result<ContactInfo, RepoError> {
        // Update the logical record in place; create it on first write.
        let updated = sqlx::query_as::<_, ContactInfo>(
            "UPDATE contact_info SET email = $1, description = $2, updated_at = NOW() \
             WHERE id = (SELECT id FROM contact_info ORDER BY updated_at DESC LIMIT 1) \
             RETURNING id, email, description, created_at, updated_at",
        )
        .bind(&email)
        .bind(&description)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(info) = updated {
            return Ok(info);
        }

        Ok(sqlx::query_as::<_, ContactInfo>(
            "INSERT INTO contact_info (id, email, description, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) \
             RETURNING id, email, description, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(description)
        .fetch_one(&self.pool)
        .await?)
    }
}

// --- In-memory implementation ---

#[derive(Default)]
struct MemoryTables {
    concerts: HashMap<Uuid, Concert>,
    attendance_forms: HashMap<Uuid, AttendanceForm>,
    scores: HashMap<Uuid, Score>,
    score_comments: HashMap<Uuid, ScoreComment>,
    practices: HashMap<Uuid, Practice>,
    contact_info: Option<ContactInfo>,
}

/// InMemoryRepository
///
/// A test double behind the same `Repository` interface: identical ordering,
/// merge-patch, and referential-integrity behavior as the Postgres
/// implementation, with no database in sight. Lives in the library (not behind
/// `cfg(test)`) so the integration test suite can assemble a full application.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<MemoryTables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_concerts(&self, active_only: bool) -> Result<Vec<Concert>, RepoError> {
        let tables = self.lock();
        let mut concerts: Vec<Concert> = tables
            .concerts
            .values()
            .filter(|c| !active_only || c.is_active)
            .cloned()
            .collect();
        concerts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(concerts)
    }

    async fn get_concert(&self, id: Uuid) -> Result<Option<Concert>, RepoError> {
        Ok(self.lock().concerts.get(&id).cloned())
    }

    async fn get_concert_detail(&self, id: Uuid) -> Result<Option<ConcertDetail>, RepoError> {
        let Some(concert) = self.get_concert(id).await? else {
            return Ok(None);
        };
        Ok(Some(ConcertDetail {
            concert,
            attendance_forms: self.list_attendance_forms(id).await?,
            scores: self.list_scores(id).await?,
            practices: self.list_practices(id).await?,
        }))
    }

    async fn create_concert(
        &self,
        title: String,
        date: DateTime<Utc>,
        venue: String,
    ) -> Result<Concert, RepoError> {
        let now = Utc::now();
        let concert = Concert {
            id: Uuid::new_v4(),
            title,
            date,
            venue,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.lock().concerts.insert(concert.id, concert.clone());
        Ok(concert)
    }

    async fn update_concert(&self, patch: ConcertPatch) -> Result<Option<Concert>, RepoError> {
        let mut tables = self.lock();
        let Some(concert) = tables.concerts.get_mut(&patch.id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            concert.title = title;
        }
        if let Some(date) = patch.date {
            concert.date = date;
        }
        if let Some(venue) = patch.venue {
            concert.venue = venue;
        }
        if let Some(is_active) = patch.is_active {
            concert.is_active = is_active;
        }
        concert.updated_at = Utc::now();
        Ok(Some(concert.clone()))
    }

    async fn deactivate_concert(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.lock();
        let Some(concert) = tables.concerts.get_mut(&id) else {
            return Ok(false);
        };
        concert.is_active = false;
        concert.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_attendance_forms(
        &self,
        concert_id: Uuid,
    ) -> Result<Vec<AttendanceForm>, RepoError> {
        let tables = self.lock();
        let mut forms: Vec<AttendanceForm> = tables
            .attendance_forms
            .values()
            .filter(|f| f.concert_id == concert_id)
            .cloned()
            .collect();
        forms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(forms)
    }

    async fn get_attendance_form(&self, id: Uuid) -> Result<Option<AttendanceForm>, RepoError> {
        Ok(self.lock().attendance_forms.get(&id).cloned())
    }

    async fn create_attendance_form(
        &self,
        form: NewAttendanceForm,
    ) -> Result<Option<AttendanceForm>, RepoError> {
        let mut tables = self.lock();
        if !tables.concerts.contains_key(&form.concert_id) {
            return Ok(None);
        }
        let now = Utc::now();
        let record = AttendanceForm {
            id: Uuid::new_v4(),
            concert_id: form.concert_id,
            title: form.title,
            url: form.url,
            description: form.description,
            created_at: now,
            updated_at: now,
        };
        tables.attendance_forms.insert(record.id, record.clone());
        Ok(Some(record))
    }

    async fn update_attendance_form(
        &self,
        patch: AttendanceFormPatch,
    ) -> Result<Option<AttendanceForm>, RepoError> {
        let mut tables = self.lock();
        let Some(form) = tables.attendance_forms.get_mut(&patch.id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            form.title = title;
        }
        if let Some(url) = patch.url {
            form.url = url;
        }
        if let Some(description) = patch.description {
            form.description = Some(description);
        }
        form.updated_at = Utc::now();
        Ok(Some(form.clone()))
    }

    async fn delete_attendance_form(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.lock().attendance_forms.remove(&id).is_some())
    }

    async fn list_scores(&self, concert_id: Uuid) -> Result<Vec<ScoreWithComments>, RepoError> {
        let tables = self.lock();
        let mut scores: Vec<Score> = tables
            .scores
            .values()
            .filter(|s| s.concert_id == concert_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(scores
            .into_iter()
            .map(|score| {
                let mut comments: Vec<ScoreComment> = tables
                    .score_comments
                    .values()
                    .filter(|c| c.score_id == score.id)
                    .cloned()
                    .collect();
                comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                ScoreWithComments { score, comments }
            })
            .collect())
    }

    async fn create_score(&self, score: NewScore) -> Result<Option<Score>, RepoError> {
        let mut tables = self.lock();
        if !tables.concerts.contains_key(&score.concert_id) {
            return Ok(None);
        }
        let now = Utc::now();
        let record = Score {
            id: Uuid::new_v4(),
            concert_id: score.concert_id,
            title: score.title,
            url: score.url,
            is_valid: true,
            created_at: now,
            updated_at: now,
        };
        tables.scores.insert(record.id, record.clone());
        Ok(Some(record))
    }

    async fn update_score(&self, patch: ScorePatch) -> Result<Option<Score>, RepoError> {
        let mut tables = self.lock();
        let Some(score) = tables.scores.get_mut(&patch.id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            score.title = title;
        }
        if let Some(url) = patch.url {
            score.url = url;
        }
        score.updated_at = Utc::now();
        let updated = score.clone();

        if let Some(content) = patch
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let comment = ScoreComment {
                id: Uuid::new_v4(),
                score_id: updated.id,
                content: content.to_string(),
                created_at: Utc::now(),
            };
            tables.score_comments.insert(comment.id, comment);
        }
        Ok(Some(updated))
    }

    async fn list_practices(&self, concert_id: Uuid) -> Result<Vec<Practice>, RepoError> {
        let tables = self.lock();
        let mut practices: Vec<Practice> = tables
            .practices
            .values()
            .filter(|p| p.concert_id == concert_id)
            .cloned()
            .collect();
        practices.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(practices)
    }

    async fn get_practice(&self, id: Uuid) -> Result<Option<Practice>, RepoError> {
        Ok(self.lock().practices.get(&id).cloned())
    }

    async fn create_practice(&self, practice: NewPractice) -> Result<Option<Practice>, RepoError> {
        let mut tables = self.lock();
        if !tables.concerts.contains_key(&practice.concert_id) {
            return Ok(None);
        }
        let now = Utc::now();
        let record = Practice {
            id: Uuid::new_v4(),
            concert_id: practice.concert_id,
            title: practice.title,
            start_time: practice.start_time,
            end_time: practice.end_time,
            venue: practice.venue,
            address: practice.address,
            items: practice.items,
            notes: practice.notes,
            memo: practice.memo,
            audio_url: practice.audio_url,
            video_url: practice.video_url,
            created_at: now,
            updated_at: now,
        };
        tables.practices.insert(record.id, record.clone());
        Ok(Some(record))
    }

    async fn update_practice(&self, patch: PracticePatch) -> Result<Option<Practice>, RepoError> {
        let mut tables = self.lock();
        let Some(practice) = tables.practices.get_mut(&patch.id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            practice.title = title;
        }
        if let Some(start_time) = patch.start_time {
            practice.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            practice.end_time = Some(end_time);
        }
        if let Some(venue) = patch.venue {
            practice.venue = venue;
        }
        if let Some(address) = patch.address {
            practice.address = Some(address);
        }
        if let Some(items) = patch.items {
            practice.items = Some(items);
        }
        if let Some(notes) = patch.notes {
            practice.notes = Some(notes);
        }
        if let Some(memo) = patch.memo {
            practice.memo = Some(memo);
        }
        if let Some(audio_url) = patch.audio_url {
            practice.audio_url = Some(audio_url);
        }
        if let Some(video_url) = patch.video_url {
            practice.video_url = Some(video_url);
        }
        practice.updated_at = Utc::now();
        Ok(Some(practice.clone()))
    }

    async fn delete_practice(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.lock().practices.remove(&id).is_some())
    }

    async fn get_contact_info(&self) -> Result<Option<ContactInfo>, RepoError> {
        Ok(self.lock().contact_info.clone())
    }

    async fn update_contact_info(
        &self,
        email: String,
        description: String,
    ) -> Result<ContactInfo, RepoError> {
        let mut tables = self.lock();
        let now = Utc::now();
        let info = match tables.contact_info.take() {
            Some(mut existing) => {
                existing.email = email;
                existing.description = description;
                existing.updated_at = now;
                existing
            }
            None => ContactInfo {
                id: Uuid::new_v4(),
                email,
                description,
                created_at: now,
                updated_at: now,
            },
        };
        tables.contact_info = Some(info.clone());
        Ok(info)
    }
}
