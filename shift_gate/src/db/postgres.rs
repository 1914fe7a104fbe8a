//! PostgreSQL repository implementation.
//!
//! Timestamps are stored as `TIMESTAMP` (UTC, no zone) and converted with
//! `naive_utc()` / `and_utc()`. The two serialized operations lock the owner's
//! active shift row for the duration of their transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow, types::Json};
use uuid::Uuid;

use super::repository::{
    ActivityRepository, AdminSessionRepository, AuditRepository, IdentityRepository,
    ShiftRepository, StaffSessionRepository,
};
use super::timeouts::with_transaction_timeout;
use crate::activity::{ActivityRecord, ActivityUpdate, ScreenVisit, TaskOutcome};
use crate::admin::{AdminSession, AdminSessionId, NewAdminSession};
use crate::audit::{AuditEvent, AuditEventType, NewAuditEvent};
use crate::auth::{OwnerId, OwnerIdentity, StaffId, StaffIdentity};
use crate::errors::{AccessError, AccessResult};
use crate::shift::{EndedShift, NewShift, Shift, ShiftId, ShiftTarget};
use crate::staff::{
    Admission, NewStaffSession, SessionSelector, StaffSession, StaffSessionId, TerminationReason,
    staff_session_expiry,
};

const SHIFT_COLUMNS: &str = "id, owner_id, name, started_at, ended_at, max_staff_sessions, \
     auto_end_time, is_active, started_by, ended_by";

const STAFF_SESSION_COLUMNS: &str = "id, staff_id, owner_id, token_hash, shift_id, signed_in_at, \
     signed_out_at, expires_at, is_active, termination_reason";

const ADMIN_SESSION_COLUMNS: &str = "id, owner_id, token_hash, required_for, issued_by, \
     created_at, expires_at, is_active, ended_at";

const AUDIT_COLUMNS: &str = "id, owner_id, actor, event_type, detail, actor_user_id, \
     actor_staff_id, ip_address, user_agent, created_at";

/// Repository backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

fn utc(row: &PgRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    Ok(row.try_get::<NaiveDateTime, _>(column)?.and_utc())
}

fn utc_opt(row: &PgRow, column: &str) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    Ok(row
        .try_get::<Option<NaiveDateTime>, _>(column)?
        .map(|dt| dt.and_utc()))
}

fn owner_from_row(row: &PgRow) -> Result<OwnerIdentity, sqlx::Error> {
    Ok(OwnerIdentity {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        business_name: row.try_get("business_name")?,
        password_hash: row.try_get("password_hash")?,
        admin_pin_hash: row.try_get("admin_pin_hash")?,
        created_at: utc(row, "created_at")?,
    })
}

fn staff_from_row(row: &PgRow) -> Result<StaffIdentity, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(StaffIdentity {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        display_name: row.try_get("display_name")?,
        pin_hash: row.try_get("pin_hash")?,
        role: role.parse().map_err(decode_err)?,
        is_active: row.try_get("is_active")?,
    })
}

fn admin_session_from_row(row: &PgRow) -> Result<AdminSession, sqlx::Error> {
    Ok(AdminSession {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        token_hash: row.try_get("token_hash")?,
        required_for: row.try_get("required_for")?,
        issued_by: row.try_get("issued_by")?,
        created_at: utc(row, "created_at")?,
        expires_at: utc(row, "expires_at")?,
        is_active: row.try_get("is_active")?,
        ended_at: utc_opt(row, "ended_at")?,
    })
}

fn shift_from_row(row: &PgRow) -> Result<Shift, sqlx::Error> {
    Ok(Shift {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        started_at: utc(row, "started_at")?,
        ended_at: utc_opt(row, "ended_at")?,
        max_staff_sessions: row.try_get::<i32, _>("max_staff_sessions")?.max(0) as u32,
        auto_end_time: utc_opt(row, "auto_end_time")?,
        is_active: row.try_get("is_active")?,
        started_by: row.try_get("started_by")?,
        ended_by: row.try_get("ended_by")?,
    })
}

fn staff_session_from_row(row: &PgRow) -> Result<StaffSession, sqlx::Error> {
    let reason: Option<String> = row.try_get("termination_reason")?;
    Ok(StaffSession {
        id: row.try_get("id")?,
        staff_id: row.try_get("staff_id")?,
        owner_id: row.try_get("owner_id")?,
        token_hash: row.try_get("token_hash")?,
        shift_id: row.try_get("shift_id")?,
        signed_in_at: utc(row, "signed_in_at")?,
        signed_out_at: utc_opt(row, "signed_out_at")?,
        expires_at: utc(row, "expires_at")?,
        is_active: row.try_get("is_active")?,
        termination_reason: reason
            .map(|r| r.parse::<TerminationReason>())
            .transpose()
            .map_err(decode_err)?,
    })
}

fn audit_from_row(row: &PgRow) -> Result<AuditEvent, sqlx::Error> {
    let event_type: String = row.try_get("event_type")?;
    Ok(AuditEvent {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        actor: row.try_get("actor")?,
        event_type: event_type.parse().map_err(decode_err)?,
        detail: row.try_get("detail")?,
        actor_user_id: row.try_get("actor_user_id")?,
        actor_staff_id: row.try_get("actor_staff_id")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        created_at: utc(row, "created_at")?,
    })
}

fn activity_from_row(row: &PgRow) -> Result<ActivityRecord, sqlx::Error> {
    Ok(ActivityRecord {
        session_id: row.try_get("session_id")?,
        staff_id: row.try_get("staff_id")?,
        owner_id: row.try_get("owner_id")?,
        active_minutes: row.try_get("active_minutes")?,
        break_minutes: row.try_get("break_minutes")?,
        screen_visits: row.try_get::<Json<Vec<ScreenVisit>>, _>("screen_visits")?.0,
        task_outcomes: row.try_get::<Json<Vec<TaskOutcome>>, _>("task_outcomes")?.0,
        updated_at: utc(row, "updated_at")?,
    })
}

/// Lock and return the owner's active shift row
async fn lock_active_shift(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: OwnerId,
) -> Result<Option<Shift>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {SHIFT_COLUMNS} FROM shifts WHERE owner_id = $1 AND is_active FOR UPDATE"
    ))
    .bind(owner_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.as_ref().map(shift_from_row).transpose()
}

#[async_trait]
impl IdentityRepository for PgStore {
    async fn find_owner_by_email(&self, email: &str) -> AccessResult<Option<OwnerIdentity>> {
        let row = sqlx::query(
            "SELECT id, email, display_name, business_name, password_hash, admin_pin_hash, created_at
             FROM owners WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(owner_from_row).transpose()?)
    }

    async fn find_owner(&self, owner_id: OwnerId) -> AccessResult<Option<OwnerIdentity>> {
        let row = sqlx::query(
            "SELECT id, email, display_name, business_name, password_hash, admin_pin_hash, created_at
             FROM owners WHERE id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(owner_from_row).transpose()?)
    }

    async fn find_staff(
        &self,
        owner_id: OwnerId,
        staff_id: StaffId,
    ) -> AccessResult<Option<StaffIdentity>> {
        let row = sqlx::query(
            "SELECT id, owner_id, display_name, pin_hash, role, is_active
             FROM staff_members WHERE id = $1 AND owner_id = $2",
        )
        .bind(staff_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(staff_from_row).transpose()?)
    }
}

#[async_trait]
impl AdminSessionRepository for PgStore {
    async fn create_admin_session(
        &self,
        new: NewAdminSession,
    ) -> AccessResult<(AdminSession, u64)> {
        let mut tx = self.pool.begin().await?;

        let superseded = sqlx::query(
            "UPDATE admin_sessions
             SET is_active = FALSE, ended_at = $3
             WHERE owner_id = $1 AND required_for = $2 AND is_active",
        )
        .bind(new.owner_id)
        .bind(&new.required_for)
        .bind(new.created_at.naive_utc())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let row = sqlx::query(&format!(
            "INSERT INTO admin_sessions
                (id, owner_id, token_hash, required_for, issued_by, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ADMIN_SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.owner_id)
        .bind(&new.token_hash)
        .bind(&new.required_for)
        .bind(&new.issued_by)
        .bind(new.created_at.naive_utc())
        .bind(new.expires_at.naive_utc())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AccessError::DuplicateToken
            } else {
                AccessError::Database(e)
            }
        })?;

        let session = admin_session_from_row(&row)?;
        tx.commit().await?;

        Ok((session, superseded))
    }

    async fn find_admin_session_by_token(
        &self,
        token_hash: &str,
    ) -> AccessResult<Option<AdminSession>> {
        let row = sqlx::query(&format!(
            "SELECT {ADMIN_SESSION_COLUMNS} FROM admin_sessions WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(admin_session_from_row).transpose()?)
    }

    async fn end_admin_session(
        &self,
        session_id: AdminSessionId,
        now: DateTime<Utc>,
    ) -> AccessResult<bool> {
        let ended = sqlx::query(
            "UPDATE admin_sessions SET is_active = FALSE, ended_at = $2
             WHERE id = $1 AND is_active",
        )
        .bind(session_id)
        .bind(now.naive_utc())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if ended > 0 {
            return Ok(true);
        }

        let exists = sqlx::query("SELECT 1 FROM admin_sessions WHERE id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Ok(false),
            None => Err(AccessError::NotFound("admin session")),
        }
    }

    async fn list_active_admin_sessions(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<AdminSession>> {
        let rows = sqlx::query(&format!(
            "SELECT {ADMIN_SESSION_COLUMNS} FROM admin_sessions
             WHERE owner_id = $1 AND is_active AND expires_at > $2
             ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(admin_session_from_row)
            .collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl ShiftRepository for PgStore {
    async fn create_shift(&self, new: NewShift) -> AccessResult<Shift> {
        let row = sqlx::query(&format!(
            "INSERT INTO shifts
                (id, owner_id, name, started_at, max_staff_sessions, auto_end_time, started_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {SHIFT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.owner_id)
        .bind(&new.name)
        .bind(new.started_at.naive_utc())
        .bind(new.max_staff_sessions as i32)
        .bind(new.auto_end_time.map(|t| t.naive_utc()))
        .bind(&new.started_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Partial unique index on (owner_id) WHERE is_active
            if is_unique_violation(&e) {
                AccessError::ShiftAlreadyActive
            } else {
                AccessError::Database(e)
            }
        })?;

        Ok(shift_from_row(&row)?)
    }

    async fn find_active_shift(&self, owner_id: OwnerId) -> AccessResult<Option<Shift>> {
        let row = sqlx::query(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE owner_id = $1 AND is_active"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(shift_from_row).transpose()?)
    }

    async fn find_shift(&self, shift_id: ShiftId) -> AccessResult<Option<Shift>> {
        let row = sqlx::query(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = $1"))
            .bind(shift_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(shift_from_row).transpose()?)
    }

    async fn count_live_sessions(
        &self,
        shift_id: ShiftId,
        now: DateTime<Utc>,
    ) -> AccessResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM staff_sessions
             WHERE shift_id = $1 AND is_active AND expires_at > $2",
        )
        .bind(shift_id)
        .bind(now.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u32)
    }

    async fn end_shifts(
        &self,
        owner_id: OwnerId,
        target: ShiftTarget,
        ended_by: &str,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<EndedShift>> {
        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;

            let shift_ids: Vec<ShiftId> = match target {
                ShiftTarget::One(shift_id) => {
                    let row = sqlx::query(
                        "SELECT is_active FROM shifts WHERE id = $1 AND owner_id = $2 FOR UPDATE",
                    )
                    .bind(shift_id)
                    .bind(owner_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    match row {
                        Some(row) if row.try_get::<bool, _>("is_active")? => vec![shift_id],
                        Some(_) => Vec::new(),
                        None => return Err(AccessError::NotFound("shift")),
                    }
                }
                ShiftTarget::AllActive => lock_active_shift(&mut tx, owner_id)
                    .await?
                    .map(|shift| shift.id)
                    .into_iter()
                    .collect(),
            };

            let mut ended = Vec::with_capacity(shift_ids.len());
            for shift_id in shift_ids {
                let row = sqlx::query(&format!(
                    "UPDATE shifts
                     SET is_active = FALSE, ended_at = $2, ended_by = $3
                     WHERE id = $1
                     RETURNING {SHIFT_COLUMNS}"
                ))
                .bind(shift_id)
                .bind(now.naive_utc())
                .bind(ended_by)
                .fetch_one(&mut *tx)
                .await?;
                let shift = shift_from_row(&row)?;

                let rows = sqlx::query(&format!(
                    "UPDATE staff_sessions
                     SET is_active = FALSE, signed_out_at = $2, termination_reason = $3
                     WHERE shift_id = $1 AND is_active
                     RETURNING {STAFF_SESSION_COLUMNS}"
                ))
                .bind(shift_id)
                .bind(now.naive_utc())
                .bind(TerminationReason::ShiftEnded.as_str())
                .fetch_all(&mut *tx)
                .await?;
                let terminated = rows
                    .iter()
                    .map(staff_session_from_row)
                    .collect::<Result<_, _>>()?;

                ended.push(EndedShift { shift, terminated });
            }

            tx.commit().await?;
            Ok::<_, AccessError>(ended)
        })
        .await
    }
}

#[async_trait]
impl StaffSessionRepository for PgStore {
    async fn admit_staff_session(&self, new: NewStaffSession) -> AccessResult<Admission> {
        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;
            let now = new.signed_in_at;

            let Some(shift) = lock_active_shift(&mut tx, new.owner_id).await? else {
                return Ok(Admission::NoActiveShift);
            };
            if shift.auto_end_time.is_some_and(|deadline| now >= deadline) {
                return Ok(Admission::NoActiveShift);
            }

            let live: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM staff_sessions
                 WHERE shift_id = $1 AND is_active AND expires_at > $2",
            )
            .bind(shift.id)
            .bind(now.naive_utc())
            .fetch_one(&mut *tx)
            .await?;

            if live >= i64::from(shift.max_staff_sessions) {
                return Ok(Admission::CapacityExceeded {
                    max: shift.max_staff_sessions,
                });
            }

            let row = sqlx::query(&format!(
                "INSERT INTO staff_sessions
                    (id, staff_id, owner_id, token_hash, shift_id, signed_in_at, expires_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING {STAFF_SESSION_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(new.staff_id)
            .bind(new.owner_id)
            .bind(&new.token_hash)
            .bind(shift.id)
            .bind(now.naive_utc())
            .bind(staff_session_expiry(&shift, now, new.ttl).naive_utc())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AccessError::DuplicateToken
                } else {
                    AccessError::Database(e)
                }
            })?;

            let session = staff_session_from_row(&row)?;
            tx.commit().await?;
            Ok::<_, AccessError>(Admission::Admitted(session))
        })
        .await
    }

    async fn find_staff_session_by_token(
        &self,
        token_hash: &str,
    ) -> AccessResult<Option<StaffSession>> {
        let row = sqlx::query(&format!(
            "SELECT {STAFF_SESSION_COLUMNS} FROM staff_sessions WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(staff_session_from_row).transpose()?)
    }

    async fn find_staff_session(
        &self,
        session_id: StaffSessionId,
    ) -> AccessResult<Option<StaffSession>> {
        let row = sqlx::query(&format!(
            "SELECT {STAFF_SESSION_COLUMNS} FROM staff_sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(staff_session_from_row).transpose()?)
    }

    async fn end_staff_sessions(
        &self,
        owner_id: OwnerId,
        selector: &SessionSelector,
        reason: TerminationReason,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<StaffSession>> {
        let filter = match selector {
            SessionSelector::One(_) => "AND id = $4",
            SessionSelector::Many(_) => "AND id = ANY($4)",
            SessionSelector::AllForOwner => "",
        };
        let sql = format!(
            "UPDATE staff_sessions
             SET is_active = FALSE, signed_out_at = $2, termination_reason = $3
             WHERE owner_id = $1 AND is_active {filter}
             RETURNING {STAFF_SESSION_COLUMNS}"
        );

        let query = sqlx::query(&sql)
            .bind(owner_id)
            .bind(now.naive_utc())
            .bind(reason.as_str());
        let query = match selector {
            SessionSelector::One(id) => query.bind(*id),
            SessionSelector::Many(ids) => query.bind(ids.clone()),
            SessionSelector::AllForOwner => query,
        };

        let rows = query.fetch_all(&self.pool).await?;
        let mut sessions: Vec<StaffSession> = rows
            .iter()
            .map(staff_session_from_row)
            .collect::<Result<_, _>>()?;
        sessions.sort_by_key(|s| s.signed_in_at);
        Ok(sessions)
    }

    async fn list_live_staff_sessions(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> AccessResult<Vec<StaffSession>> {
        let rows = sqlx::query(&format!(
            "SELECT {STAFF_SESSION_COLUMNS} FROM staff_sessions
             WHERE owner_id = $1 AND is_active AND expires_at > $2
             ORDER BY signed_in_at"
        ))
        .bind(owner_id)
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(staff_session_from_row)
            .collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl AuditRepository for PgStore {
    async fn append_event(
        &self,
        event: NewAuditEvent,
        now: DateTime<Utc>,
    ) -> AccessResult<AuditEvent> {
        let event = event.into_event(Uuid::new_v4(), now);

        sqlx::query(
            "INSERT INTO audit_events
                (id, owner_id, actor, event_type, detail, actor_user_id, actor_staff_id,
                 ip_address, user_agent, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(event.id)
        .bind(event.owner_id)
        .bind(&event.actor)
        .bind(event.event_type.as_str())
        .bind(&event.detail)
        .bind(event.actor_user_id)
        .bind(event.actor_staff_id)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(event.created_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    async fn count_events_since(
        &self,
        owner_id: OwnerId,
        actor: &str,
        event_types: &[AuditEventType],
        since: DateTime<Utc>,
    ) -> AccessResult<u64> {
        let types: Vec<&str> = event_types.iter().map(|t| t.as_str()).collect();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_events
             WHERE owner_id = $1 AND actor = $2 AND event_type = ANY($3) AND created_at >= $4",
        )
        .bind(owner_id)
        .bind(actor)
        .bind(types)
        .bind(since.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn list_events(&self, owner_id: OwnerId, limit: i64) -> AccessResult<Vec<AuditEvent>> {
        let rows = sqlx::query(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_events
             WHERE owner_id = $1
             ORDER BY created_at DESC
             LIMIT $2"
        ))
        .bind(owner_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(audit_from_row).collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl ActivityRepository for PgStore {
    async fn apply_activity(
        &self,
        session: &StaffSession,
        update: &ActivityUpdate,
        now: DateTime<Utc>,
    ) -> AccessResult<ActivityRecord> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO activity_records (session_id, staff_id, owner_id, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(session.id)
        .bind(session.staff_id)
        .bind(session.owner_id)
        .bind(now.naive_utc())
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(
            "SELECT session_id, staff_id, owner_id, active_minutes, break_minutes,
                    screen_visits, task_outcomes, updated_at
             FROM activity_records WHERE session_id = $1 FOR UPDATE",
        )
        .bind(session.id)
        .fetch_one(&mut *tx)
        .await?;

        let mut record = activity_from_row(&row)?;
        record.apply(update, now);

        sqlx::query(
            "UPDATE activity_records
             SET active_minutes = $2, break_minutes = $3, screen_visits = $4,
                 task_outcomes = $5, updated_at = $6
             WHERE session_id = $1",
        )
        .bind(record.session_id)
        .bind(record.active_minutes)
        .bind(record.break_minutes)
        .bind(Json(&record.screen_visits))
        .bind(Json(&record.task_outcomes))
        .bind(record.updated_at.naive_utc())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn find_activity(
        &self,
        session_id: StaffSessionId,
    ) -> AccessResult<Option<ActivityRecord>> {
        let row = sqlx::query(
            "SELECT session_id, staff_id, owner_id, active_minutes, break_minutes,
                    screen_visits, task_outcomes, updated_at
             FROM activity_records WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(activity_from_row).transpose()?)
    }
}
