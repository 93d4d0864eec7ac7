//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{DocumentId, MentorshipId, ReviewId, SessionId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::audit_entry::AuditLogEntry;
use crate::domain::entity::document::Document;
use crate::domain::entity::mentorship::Mentorship;
use crate::domain::entity::review::ReviewRequest;
use crate::domain::entity::session::MentoringSession;
use crate::domain::repository::{
    AuditSink, DocumentRepository, MentorshipRepository, ReviewRepository, RoleRepository,
    SessionRepository,
};
use crate::domain::value_object::document_access::DocumentAccess;
use crate::domain::value_object::mentorship_status::MentorshipStatus;
use crate::domain::value_object::review_status::ReviewStatus;
use crate::domain::value_object::session_status::SessionStatus;
use crate::domain::value_object::session_type::SessionType;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{StoreError, StoreResult};

const SESSION_COLUMNS: &str = r#"
    session_id, mentorship_id, mentor_id, mentee_id, title, session_type,
    scheduled_start, scheduled_end, duration_minutes, timezone, status,
    rating, feedback, follow_up_required, actual_start, actual_end,
    cancellation_reason, reschedule_count, created_at, updated_at
"#;

const MENTORSHIP_COLUMNS: &str = r#"
    mentorship_id, mentor_id, mentee_id, status, goals,
    progress_percentage, started_at, updated_at
"#;

const DOCUMENT_COLUMNS: &str = r#"
    document_id, mentor_id, title, document_type, file_name, storage_url,
    size_bytes, access_level, allowed_mentees, created_at, updated_at
"#;

const REVIEW_COLUMNS: &str = r#"
    review_id, document_id, mentor_id, mentee_id, status, note, feedback,
    requested_at, resolved_at
"#;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgMentorRepository {
    pool: PgPool,
}

impl PgMentorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionRepository for PgMentorRepository {
    async fn insert_session(&self, session: &MentoringSession) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO mentoring_sessions (
                session_id, mentorship_id, mentor_id, mentee_id, title, session_type,
                scheduled_start, scheduled_end, duration_minutes, timezone, status,
                rating, feedback, follow_up_required, actual_start, actual_end,
                cancellation_reason, reschedule_count, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(session.id.into_uuid())
        .bind(session.mentorship_id.into_uuid())
        .bind(session.mentor_id.into_uuid())
        .bind(session.mentee_id.into_uuid())
        .bind(&session.title)
        .bind(session.session_type.code())
        .bind(session.scheduled_start)
        .bind(session.scheduled_end)
        .bind(session.duration_minutes as i32)
        .bind(&session.timezone)
        .bind(session.status.code())
        .bind(session.rating.map(i16::from))
        .bind(&session.feedback)
        .bind(session.follow_up_required)
        .bind(session.actual_start)
        .bind(session.actual_end)
        .bind(&session.cancellation_reason)
        .bind(session.reschedule_count as i32)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::sqlx("sessions.insert"))?;

        tracing::info!(session_id = %session.id, "Session inserted");
        Ok(())
    }

    async fn update_session(&self, session: &MentoringSession) -> StoreResult<MentoringSession> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            UPDATE mentoring_sessions SET
                title = $2,
                scheduled_start = $3,
                scheduled_end = $4,
                duration_minutes = $5,
                status = $6,
                rating = $7,
                feedback = $8,
                follow_up_required = $9,
                actual_start = $10,
                actual_end = $11,
                cancellation_reason = $12,
                reschedule_count = $13,
                updated_at = $14
            WHERE session_id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.id.into_uuid())
        .bind(&session.title)
        .bind(session.scheduled_start)
        .bind(session.scheduled_end)
        .bind(session.duration_minutes as i32)
        .bind(session.status.code())
        .bind(session.rating.map(i16::from))
        .bind(&session.feedback)
        .bind(session.follow_up_required)
        .bind(session.actual_start)
        .bind(session.actual_end)
        .bind(&session.cancellation_reason)
        .bind(session.reschedule_count as i32)
        .bind(session.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::sqlx("sessions.update"))?
        .ok_or_else(|| StoreError::new("sessions.update", "no such session"))?;

        tracing::info!(session_id = %session.id, status = %session.status, "Session updated");
        row.into_entity()
    }

    async fn find_session(&self, id: SessionId) -> StoreResult<Option<MentoringSession>> {
        sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM mentoring_sessions WHERE session_id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::sqlx("sessions.find"))?
        .map(SessionRow::into_entity)
        .transpose()
    }

    async fn list_sessions_for_mentor(
        &self,
        mentor_id: UserId,
    ) -> StoreResult<Vec<MentoringSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM mentoring_sessions
            WHERE mentor_id = $1
            ORDER BY scheduled_start
            "#
        ))
        .bind(mentor_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::sqlx("sessions.list_for_mentor"))?;
        rows.into_iter().map(SessionRow::into_entity).collect()
    }

    async fn list_active_sessions_for_mentor(
        &self,
        mentor_id: UserId,
    ) -> StoreResult<Vec<MentoringSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM mentoring_sessions
            WHERE mentor_id = $1 AND status IN ('scheduled', 'in_progress')
            ORDER BY scheduled_start
            "#
        ))
        .bind(mentor_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::sqlx("sessions.list_active"))?;
        rows.into_iter().map(SessionRow::into_entity).collect()
    }

    async fn list_sessions_for_mentorship(
        &self,
        mentorship_id: MentorshipId,
    ) -> StoreResult<Vec<MentoringSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM mentoring_sessions
            WHERE mentorship_id = $1
            ORDER BY scheduled_start
            "#
        ))
        .bind(mentorship_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::sqlx("sessions.list_for_mentorship"))?;
        rows.into_iter().map(SessionRow::into_entity).collect()
    }
}

impl MentorshipRepository for PgMentorRepository {
    async fn find_mentorship(&self, id: MentorshipId) -> StoreResult<Option<Mentorship>> {
        sqlx::query_as::<_, MentorshipRow>(&format!(
            "SELECT {MENTORSHIP_COLUMNS} FROM mentorships WHERE mentorship_id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::sqlx("mentorships.find"))?
        .map(MentorshipRow::into_entity)
        .transpose()
    }

    async fn list_mentorships_for_mentor(&self, mentor_id: UserId) -> StoreResult<Vec<Mentorship>> {
        let rows = sqlx::query_as::<_, MentorshipRow>(&format!(
            r#"
            SELECT {MENTORSHIP_COLUMNS} FROM mentorships
            WHERE mentor_id = $1
            ORDER BY started_at
            "#
        ))
        .bind(mentor_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::sqlx("mentorships.list_for_mentor"))?;
        rows.into_iter().map(MentorshipRow::into_entity).collect()
    }

    async fn update_mentorship(&self, mentorship: &Mentorship) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE mentorships SET
                status = $2,
                goals = $3,
                progress_percentage = $4,
                updated_at = $5
            WHERE mentorship_id = $1
            "#,
        )
        .bind(mentorship.id.into_uuid())
        .bind(mentorship.status.code())
        .bind(&mentorship.goals)
        .bind(i16::from(mentorship.progress_percentage))
        .bind(mentorship.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::sqlx("mentorships.update"))?;
        Ok(())
    }
}

impl DocumentRepository for PgMentorRepository {
    async fn insert_document(&self, document: &Document) -> StoreResult<()> {
        let allowed: Vec<Uuid> = document
            .access
            .allow_list()
            .iter()
            .map(|id| id.into_uuid())
            .collect();
        sqlx::query(
            r#"
            INSERT INTO mentor_documents (
                document_id, mentor_id, title, document_type, file_name, storage_url,
                size_bytes, access_level, allowed_mentees, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(document.id.into_uuid())
        .bind(document.mentor_id.into_uuid())
        .bind(&document.title)
        .bind(&document.document_type)
        .bind(&document.file_name)
        .bind(&document.storage_url)
        .bind(document.size_bytes as i64)
        .bind(document.access.code())
        .bind(&allowed)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::sqlx("documents.insert"))?;

        tracing::info!(document_id = %document.id, "Document inserted");
        Ok(())
    }

    async fn find_document(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM mentor_documents WHERE document_id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::sqlx("documents.find"))?
        .map(DocumentRow::into_entity)
        .transpose()
    }

    async fn list_documents_for_mentor(&self, mentor_id: UserId) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM mentor_documents
            WHERE mentor_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(mentor_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::sqlx("documents.list_for_mentor"))?;
        rows.into_iter().map(DocumentRow::into_entity).collect()
    }
}

impl ReviewRepository for PgMentorRepository {
    async fn insert_review(&self, review: &ReviewRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO review_requests (
                review_id, document_id, mentor_id, mentee_id, status, note, feedback,
                requested_at, resolved_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(review.id.into_uuid())
        .bind(review.document_id.into_uuid())
        .bind(review.mentor_id.into_uuid())
        .bind(review.mentee_id.into_uuid())
        .bind(review.status.code())
        .bind(&review.note)
        .bind(&review.feedback)
        .bind(review.requested_at)
        .bind(review.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::sqlx("reviews.insert"))?;
        Ok(())
    }

    async fn update_review(&self, review: &ReviewRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE review_requests SET status = $2, feedback = $3, resolved_at = $4
            WHERE review_id = $1
            "#,
        )
        .bind(review.id.into_uuid())
        .bind(review.status.code())
        .bind(&review.feedback)
        .bind(review.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::sqlx("reviews.update"))?;
        Ok(())
    }

    async fn find_review(&self, id: ReviewId) -> StoreResult<Option<ReviewRequest>> {
        sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM review_requests WHERE review_id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::sqlx("reviews.find"))?
        .map(ReviewRow::into_entity)
        .transpose()
    }

    async fn list_pending_reviews_for_mentor(
        &self,
        mentor_id: UserId,
    ) -> StoreResult<Vec<ReviewRequest>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS} FROM review_requests
            WHERE mentor_id = $1 AND status = 'pending'
            ORDER BY requested_at
            "#
        ))
        .bind(mentor_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::sqlx("reviews.list_pending"))?;
        rows.into_iter().map(ReviewRow::into_entity).collect()
    }
}

impl RoleRepository for PgMentorRepository {
    async fn find_role(&self, user_id: UserId) -> StoreResult<Option<UserRole>> {
        let code = sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::sqlx("roles.find"))?;

        match code {
            None => Ok(None),
            Some(code) => UserRole::from_code(&code)
                .map(Some)
                .ok_or_else(|| corrupt("roles.find", "role", &code)),
        }
    }
}

impl AuditSink for PgMentorRepository {
    async fn append_audit(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                audit_entry_id, actor_id, action, resource_type, resource_id,
                risk_level, reason, before_value, after_value, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.into_uuid())
        .bind(entry.actor_id.into_uuid())
        .bind(&entry.action)
        .bind(entry.resource_type.to_string())
        .bind(entry.resource_id)
        .bind(entry.risk_level.to_string())
        .bind(&entry.reason)
        .bind(&entry.before)
        .bind(&entry.after)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::sqlx("audit.append"))?;
        Ok(())
    }
}

fn corrupt(operation: &'static str, column: &str, value: &str) -> StoreError {
    StoreError::new(operation, format!("unexpected {column} value {value:?}"))
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    mentorship_id: Uuid,
    mentor_id: Uuid,
    mentee_id: Uuid,
    title: String,
    session_type: String,
    scheduled_start: DateTime<Utc>,
    scheduled_end: DateTime<Utc>,
    duration_minutes: i32,
    timezone: String,
    status: String,
    rating: Option<i16>,
    feedback: Option<String>,
    follow_up_required: bool,
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    reschedule_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_entity(self) -> StoreResult<MentoringSession> {
        const OP: &str = "sessions.decode";
        Ok(MentoringSession {
            id: SessionId::from_uuid(self.session_id),
            mentorship_id: MentorshipId::from_uuid(self.mentorship_id),
            mentor_id: UserId::from_uuid(self.mentor_id),
            mentee_id: UserId::from_uuid(self.mentee_id),
            title: self.title,
            session_type: SessionType::from_code(&self.session_type)
                .ok_or_else(|| corrupt(OP, "session_type", &self.session_type))?,
            scheduled_start: self.scheduled_start,
            scheduled_end: self.scheduled_end,
            duration_minutes: u32::try_from(self.duration_minutes)
                .map_err(|_| corrupt(OP, "duration_minutes", &self.duration_minutes.to_string()))?,
            timezone: self.timezone,
            status: SessionStatus::from_code(&self.status)
                .ok_or_else(|| corrupt(OP, "status", &self.status))?,
            rating: self.rating.and_then(|r| u8::try_from(r).ok()),
            feedback: self.feedback,
            follow_up_required: self.follow_up_required,
            actual_start: self.actual_start,
            actual_end: self.actual_end,
            cancellation_reason: self.cancellation_reason,
            reschedule_count: self.reschedule_count.max(0) as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MentorshipRow {
    mentorship_id: Uuid,
    mentor_id: Uuid,
    mentee_id: Uuid,
    status: String,
    goals: Option<String>,
    progress_percentage: i16,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MentorshipRow {
    fn into_entity(self) -> StoreResult<Mentorship> {
        Ok(Mentorship {
            id: MentorshipId::from_uuid(self.mentorship_id),
            mentor_id: UserId::from_uuid(self.mentor_id),
            mentee_id: UserId::from_uuid(self.mentee_id),
            status: MentorshipStatus::from_code(&self.status)
                .ok_or_else(|| corrupt("mentorships.decode", "status", &self.status))?,
            goals: self.goals,
            progress_percentage: self.progress_percentage.clamp(0, 100) as u8,
            started_at: self.started_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    document_id: Uuid,
    mentor_id: Uuid,
    title: String,
    document_type: String,
    file_name: Option<String>,
    storage_url: Option<String>,
    size_bytes: i64,
    access_level: String,
    allowed_mentees: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_entity(self) -> StoreResult<Document> {
        let mentees = self
            .allowed_mentees
            .into_iter()
            .map(UserId::from_uuid)
            .collect();
        Ok(Document {
            id: DocumentId::from_uuid(self.document_id),
            mentor_id: UserId::from_uuid(self.mentor_id),
            title: self.title,
            document_type: self.document_type,
            file_name: self.file_name,
            storage_url: self.storage_url,
            size_bytes: self.size_bytes.max(0) as u64,
            access: DocumentAccess::from_parts(&self.access_level, mentees)
                .ok_or_else(|| corrupt("documents.decode", "access_level", &self.access_level))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    review_id: Uuid,
    document_id: Uuid,
    mentor_id: Uuid,
    mentee_id: Uuid,
    status: String,
    note: Option<String>,
    feedback: Option<String>,
    requested_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl ReviewRow {
    fn into_entity(self) -> StoreResult<ReviewRequest> {
        Ok(ReviewRequest {
            id: ReviewId::from_uuid(self.review_id),
            document_id: DocumentId::from_uuid(self.document_id),
            mentor_id: UserId::from_uuid(self.mentor_id),
            mentee_id: UserId::from_uuid(self.mentee_id),
            status: ReviewStatus::from_code(&self.status)
                .ok_or_else(|| corrupt("reviews.decode", "status", &self.status))?,
            note: self.note,
            feedback: self.feedback,
            requested_at: self.requested_at,
            resolved_at: self.resolved_at,
        })
    }
}
