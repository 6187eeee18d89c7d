//! Repository for personal income/expense entries

use crate::error::RepoResult;
use crate::models::{CategoryTotal, MonthlyTotal, Payment, PaymentDraft, PaymentFilter};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const PAYMENT_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.amount, p.payment_type, p.category_id, c.name AS category_name,
           p.description, p.payment_method, p.payment_date, p.created_at, p.updated_at
    FROM payments p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Income/expense totals over a date range
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct PaymentTotals {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub transaction_count: i64,
}

pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's payments, newest first
    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        filter: &PaymentFilter,
    ) -> RepoResult<Vec<Payment>> {
        let mut builder = QueryBuilder::<Postgres>::new(PAYMENT_SELECT);
        builder.push(" WHERE p.user_id = ").push_bind(user_id);

        if let Some(payment_type) = &filter.payment_type {
            builder.push(" AND p.payment_type = ").push_bind(payment_type.clone());
        }
        if let Some(category_id) = filter.category_id {
            builder.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Some(from) = filter.from {
            builder.push(" AND p.payment_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND p.payment_date <= ").push_bind(to);
        }

        builder
            .push(" ORDER BY p.payment_date DESC, p.created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let payments = builder
            .build_query_as::<Payment>()
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    pub async fn find(&self, id: Uuid, user_id: Uuid) -> RepoResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "{PAYMENT_SELECT} WHERE p.id = $1 AND p.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn create(&self, user_id: Uuid, draft: &PaymentDraft) -> RepoResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            WITH inserted AS (
                INSERT INTO payments (user_id, amount, payment_type, category_id, description, payment_method, payment_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT i.id, i.user_id, i.amount, i.payment_type, i.category_id, c.name AS category_name,
                   i.description, i.payment_method, i.payment_date, i.created_at, i.updated_at
            FROM inserted i
            LEFT JOIN categories c ON c.id = i.category_id
            "#,
        )
        .bind(user_id)
        .bind(draft.amount)
        .bind(&draft.payment_type)
        .bind(draft.category_id)
        .bind(&draft.description)
        .bind(&draft.payment_method)
        .bind(draft.payment_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Replace every editable field of a payment
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        draft: &PaymentDraft,
    ) -> RepoResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            WITH updated AS (
                UPDATE payments
                SET amount = $3, payment_type = $4, category_id = $5, description = $6,
                    payment_method = $7, payment_date = $8, updated_at = NOW()
                WHERE id = $1 AND user_id = $2
                RETURNING *
            )
            SELECT u.id, u.user_id, u.amount, u.payment_type, u.category_id, c.name AS category_name,
                   u.description, u.payment_method, u.payment_date, u.created_at, u.updated_at
            FROM updated u
            LEFT JOIN categories c ON c.id = u.category_id
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(draft.amount)
        .bind(&draft.payment_type)
        .bind(draft.category_id)
        .bind(&draft.description)
        .bind(&draft.payment_method)
        .bind(draft.payment_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM payments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    pub async fn totals(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RepoResult<PaymentTotals> {
        let totals = sqlx::query_as::<_, PaymentTotals>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE payment_type = 'income'), 0) AS total_income,
                COALESCE(SUM(amount) FILTER (WHERE payment_type = 'expense'), 0) AS total_expense,
                COUNT(*) AS transaction_count
            FROM payments
            WHERE user_id = $1
              AND ($2::DATE IS NULL OR payment_date >= $2)
              AND ($3::DATE IS NULL OR payment_date <= $3)
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    pub async fn totals_by_category(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RepoResult<Vec<CategoryTotal>> {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT c.name AS category, p.payment_type, SUM(p.amount) AS total
            FROM payments p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.user_id = $1
              AND ($2::DATE IS NULL OR p.payment_date >= $2)
              AND ($3::DATE IS NULL OR p.payment_date <= $3)
            GROUP BY c.name, p.payment_type
            ORDER BY total DESC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    pub async fn monthly_totals(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RepoResult<Vec<MonthlyTotal>> {
        let totals = sqlx::query_as::<_, MonthlyTotal>(
            r#"
            SELECT
                TO_CHAR(payment_date, 'YYYY-MM') AS month,
                COALESCE(SUM(amount) FILTER (WHERE payment_type = 'income'), 0) AS income,
                COALESCE(SUM(amount) FILTER (WHERE payment_type = 'expense'), 0) AS expense
            FROM payments
            WHERE user_id = $1
              AND ($2::DATE IS NULL OR payment_date >= $2)
              AND ($3::DATE IS NULL OR payment_date <= $3)
            GROUP BY month
            ORDER BY month ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}
