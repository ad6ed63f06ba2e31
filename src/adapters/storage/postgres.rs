//! PostgreSQL billing store.
//!
//! Implements `PaymentStore` and `SubscriptionLedger` on sqlx. The
//! grant's atomic unit is a transaction holding a row lock on the
//! payment attempt; the unique constraint on `token` backs idempotency
//! across instances, so two concurrent deliveries serialize on the row
//! instead of racing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{PaymentAttempt, PaymentStatus, Subscription, SubscriptionStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentAttemptId, PaymentToken, PlanId, SubscriptionId, Timestamp,
    UserId,
};
use crate::ports::{
    AuditEntry, AuditLog, CancelOutcome, GrantOutcome, PaymentStore, StatusUpdate,
    SubscriptionLedger,
};

/// PostgreSQL implementation of the billing store ports.
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgresLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment attempt.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: String,
    plan_id: String,
    token: String,
    amount: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentAttempt {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentAttempt {
            id: PaymentAttemptId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(invalid_row)?,
            plan_id: PlanId::new(row.plan_id).map_err(invalid_row)?,
            token: PaymentToken::new(row.token).map_err(invalid_row)?,
            amount: row.amount,
            status: parse_payment_status(&row.status)?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    plan_id: String,
    payment_token: String,
    status: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(invalid_row)?,
            plan_id: PlanId::new(row.plan_id).map_err(invalid_row)?,
            payment_token: PaymentToken::new(row.payment_token).map_err(invalid_row)?,
            status: parse_subscription_status(&row.status)?,
            expires_at: Timestamp::from_datetime(row.expires_at),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn invalid_row(e: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid row data: {}", e))
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, DomainError> {
    PaymentStatus::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status value: {}", s),
        )
    })
}

fn parse_subscription_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    SubscriptionStatus::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status value: {}", s),
        )
    })
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl PaymentStore for PostgresLedger {
    async fn create(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
        token: &PaymentToken,
        amount: i64,
    ) -> Result<PaymentAttempt, DomainError> {
        let attempt = PaymentAttempt::new_pending(
            user_id.clone(),
            plan_id.clone(),
            token.clone(),
            amount,
            Timestamp::now(),
        );

        sqlx::query(
            r#"
            INSERT INTO payment_attempts (
                id, user_id, plan_id, token, amount, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(attempt.id.as_uuid())
        .bind(attempt.user_id.as_str())
        .bind(attempt.plan_id.as_str())
        .bind(attempt.token.as_str())
        .bind(attempt.amount)
        .bind(attempt.status.as_str())
        .bind(attempt.created_at.as_datetime())
        .bind(attempt.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payment_attempts_token_key") {
                    return DomainError::validation(
                        "token",
                        "A payment attempt already exists for this token",
                    );
                }
            }
            db_error("Failed to create payment attempt", e)
        })?;

        Ok(attempt)
    }

    async fn find_by_token(
        &self,
        token: &PaymentToken,
    ) -> Result<Option<PaymentAttempt>, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, user_id, plan_id, token, amount, status, created_at, updated_at
            FROM payment_attempts
            WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load payment attempt", e))?;

        row.map(PaymentAttempt::try_from).transpose()
    }

    async fn update_status(
        &self,
        token: &PaymentToken,
        new_status: PaymentStatus,
    ) -> Result<StatusUpdate, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, user_id, plan_id, token, amount, status, created_at, updated_at
            FROM payment_attempts
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock payment attempt", e))?;

        let mut attempt = match row {
            Some(row) => PaymentAttempt::try_from(row)?,
            None => return Ok(StatusUpdate::NotFound),
        };

        if attempt.status == new_status {
            return Ok(StatusUpdate::NoOp);
        }
        if !attempt.transition_to(new_status, Timestamp::now()) {
            return Ok(StatusUpdate::Anomalous {
                current: attempt.status,
            });
        }

        sqlx::query(
            r#"
            UPDATE payment_attempts SET status = $2, updated_at = $3 WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .bind(attempt.status.as_str())
        .bind(attempt.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to update payment status", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit status update", e))?;

        Ok(StatusUpdate::Applied(attempt))
    }
}

#[async_trait]
impl SubscriptionLedger for PostgresLedger {
    async fn grant(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
        token: &PaymentToken,
        amount: i64,
        expires_at: Timestamp,
    ) -> Result<GrantOutcome, DomainError> {
        let now = Timestamp::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin grant transaction", e))?;

        // Ensure the attempt row exists (checkout glue may never have
        // recorded it), then lock it. Concurrent deliveries for the
        // same token serialize here.
        sqlx::query(
            r#"
            INSERT INTO payment_attempts (
                id, user_id, plan_id, token, amount, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, 'pending', $6, $6)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id.as_str())
        .bind(plan_id.as_str())
        .bind(token.as_str())
        .bind(amount)
        .bind(now.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to ensure payment attempt", e))?;

        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, user_id, plan_id, token, amount, status, created_at, updated_at
            FROM payment_attempts
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock payment attempt", e))?;
        let mut attempt = PaymentAttempt::try_from(row)?;

        if attempt.status == PaymentStatus::Completed {
            let existing = sqlx::query_as::<_, SubscriptionRow>(
                r#"
                SELECT id, user_id, plan_id, payment_token, status, expires_at, created_at
                FROM subscriptions
                WHERE payment_token = $1
                "#,
            )
            .bind(token.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Completed attempt has no subscription", e))?;

            return Ok(GrantOutcome::AlreadyGranted(Subscription::try_from(
                existing,
            )?));
        }

        if !attempt.transition_to(PaymentStatus::Completed, now) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Attempt for token cannot complete from {}", attempt.status),
            ));
        }

        sqlx::query(
            r#"
            UPDATE payment_attempts SET status = 'completed', updated_at = $2 WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .bind(now.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to complete payment attempt", e))?;

        sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'superseded'
            WHERE user_id = $1 AND status = 'active'
            "#,
        )
        .bind(user_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to supersede prior subscription", e))?;

        let subscription = Subscription::new_active(
            user_id.clone(),
            plan_id.clone(),
            token.clone(),
            expires_at,
            now,
        );
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_id, payment_token, status, expires_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.plan_id.as_str())
        .bind(subscription.payment_token.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.expires_at.as_datetime())
        .bind(subscription.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert subscription", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit grant", e))?;

        Ok(GrantOutcome::Granted(subscription))
    }

    async fn find_active(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan_id, payment_token, status, expires_at, created_at
            FROM subscriptions
            WHERE user_id = $1 AND status = 'active' AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_str())
        .bind(Timestamp::now().as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn cancel(&self, token: &PaymentToken) -> Result<CancelOutcome, DomainError> {
        let now = Timestamp::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin cancel transaction", e))?;

        let attempt_row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, user_id, plan_id, token, amount, status, created_at, updated_at
            FROM payment_attempts
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock payment attempt", e))?;

        let attempt = match attempt_row {
            Some(row) => PaymentAttempt::try_from(row)?,
            None => return Ok(CancelOutcome::NoEffect),
        };
        if attempt.status != PaymentStatus::Completed {
            return Ok(CancelOutcome::NoEffect);
        }

        let subscription_row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan_id, payment_token, status, expires_at, created_at
            FROM subscriptions
            WHERE payment_token = $1
            FOR UPDATE
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock subscription", e))?;

        let mut subscription = match subscription_row {
            Some(row) => Subscription::try_from(row)?,
            None => return Ok(CancelOutcome::NoEffect),
        };

        sqlx::query(
            r#"
            UPDATE payment_attempts SET status = 'refunded', updated_at = $2 WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .bind(now.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to refund payment attempt", e))?;

        sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'canceled' WHERE payment_token = $1
            "#,
        )
        .bind(token.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to cancel subscription", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit cancel", e))?;

        subscription.cancel();
        Ok(CancelOutcome::Canceled(subscription))
    }
}

/// PostgreSQL audit log.
///
/// Append failures are escalated to the error log and swallowed; the
/// operation that produced the event is never blocked or rolled back
/// by audit persistence.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    /// Creates a new PostgresAuditLog with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(&self, entry: AuditEntry) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_log (id, user_id, action, details, source_ip, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.user_id.as_ref().map(|u| u.as_str()))
        .bind(entry.action.as_str())
        .bind(&entry.details)
        .bind(entry.source_ip.as_deref())
        .bind(entry.timestamp.as_datetime())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::error!(
                error = %e,
                action = %entry.action,
                "audit log write failed"
            );
        }
    }
}
