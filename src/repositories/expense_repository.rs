//! Repository for group expenses and their per-member splits

use crate::error::RepoResult;
use crate::models::{GroupExpense, GroupExpenseSplit, OwedShare, SplitView};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

const EXPENSE_COLUMNS: &str =
    "id, group_id, paid_by, description, amount, split_type, is_settled, created_at, settled_at";
const SPLIT_COLUMNS: &str =
    "id, expense_id, user_id, amount, is_settled, approval_requested, settled_at, created_at";

/// One row to insert into `group_expense_splits`
#[derive(Debug, Clone)]
pub struct NewSplit {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub is_settled: bool,
}

pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    pub async fn create_expense(
        &self,
        group_id: Uuid,
        paid_by: Uuid,
        description: &str,
        amount: Decimal,
        split_type: &str,
    ) -> RepoResult<GroupExpense> {
        let expense = sqlx::query_as::<_, GroupExpense>(&format!(
            r#"
            INSERT INTO group_expenses (group_id, paid_by, description, amount, split_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(group_id)
        .bind(paid_by)
        .bind(description)
        .bind(amount)
        .bind(split_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(expense)
    }

    pub async fn find_expense(&self, id: Uuid) -> RepoResult<Option<GroupExpense>> {
        let expense = sqlx::query_as::<_, GroupExpense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM group_expenses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    pub async fn find_by_group(&self, group_id: Uuid) -> RepoResult<Vec<GroupExpense>> {
        let expenses = sqlx::query_as::<_, GroupExpense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM group_expenses WHERE group_id = $1 ORDER BY created_at DESC"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    pub async fn delete_expense(&self, id: Uuid) -> RepoResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM group_expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub async fn mark_expense_settled(&self, id: Uuid) -> RepoResult<Option<GroupExpense>> {
        let expense = sqlx::query_as::<_, GroupExpense>(&format!(
            r#"
            UPDATE group_expenses
            SET is_settled = TRUE, settled_at = COALESCE(settled_at, NOW())
            WHERE id = $1
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    // =========================================================================
    // Splits
    // =========================================================================

    /// Insert all splits of an expense in one statement
    pub async fn create_splits(
        &self,
        expense_id: Uuid,
        splits: &[NewSplit],
    ) -> RepoResult<Vec<GroupExpenseSplit>> {
        let user_ids: Vec<Uuid> = splits.iter().map(|s| s.user_id).collect();
        let amounts: Vec<Decimal> = splits.iter().map(|s| s.amount).collect();
        let settled: Vec<bool> = splits.iter().map(|s| s.is_settled).collect();

        let rows = sqlx::query_as::<_, GroupExpenseSplit>(&format!(
            r#"
            INSERT INTO group_expense_splits (expense_id, user_id, amount, is_settled, settled_at)
            SELECT $1, t.user_id, t.amount, t.is_settled, CASE WHEN t.is_settled THEN NOW() END
            FROM UNNEST($2::UUID[], $3::NUMERIC[], $4::BOOLEAN[]) AS t(user_id, amount, is_settled)
            RETURNING {SPLIT_COLUMNS}
            "#
        ))
        .bind(expense_id)
        .bind(&user_ids)
        .bind(&amounts)
        .bind(&settled)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_split(&self, id: Uuid) -> RepoResult<Option<GroupExpenseSplit>> {
        let split = sqlx::query_as::<_, GroupExpenseSplit>(&format!(
            "SELECT {SPLIT_COLUMNS} FROM group_expense_splits WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(split)
    }

    pub async fn find_splits_for_expense(
        &self,
        expense_id: Uuid,
    ) -> RepoResult<Vec<GroupExpenseSplit>> {
        let splits = sqlx::query_as::<_, GroupExpenseSplit>(&format!(
            "SELECT {SPLIT_COLUMNS} FROM group_expense_splits WHERE expense_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(expense_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(splits)
    }

    /// Splits of several expenses, joined with member names
    pub async fn find_split_views(&self, expense_ids: &[Uuid]) -> RepoResult<Vec<SplitView>> {
        let splits = sqlx::query_as::<_, SplitView>(
            r#"
            SELECT s.id, s.expense_id, s.user_id, u.username, u.full_name, s.amount,
                   s.is_settled, s.approval_requested, s.settled_at
            FROM group_expense_splits s
            JOIN users u ON u.id = s.user_id
            WHERE s.expense_id = ANY($1)
            ORDER BY s.created_at ASC, s.id ASC
            "#,
        )
        .bind(expense_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(splits)
    }

    /// Set or clear the approval request on an unsettled split.
    /// Returns `None` when the split is settled or already in the requested state.
    pub async fn set_approval_requested(
        &self,
        id: Uuid,
        requested: bool,
    ) -> RepoResult<Option<GroupExpenseSplit>> {
        let split = sqlx::query_as::<_, GroupExpenseSplit>(&format!(
            r#"
            UPDATE group_expense_splits
            SET approval_requested = $2
            WHERE id = $1 AND is_settled = FALSE AND approval_requested <> $2
            RETURNING {SPLIT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(requested)
        .fetch_optional(&self.pool)
        .await?;

        Ok(split)
    }

    /// Settle a single split. Returns `None` if it was already settled.
    pub async fn settle_split(&self, id: Uuid) -> RepoResult<Option<GroupExpenseSplit>> {
        let split = sqlx::query_as::<_, GroupExpenseSplit>(&format!(
            r#"
            UPDATE group_expense_splits
            SET is_settled = TRUE, approval_requested = FALSE, settled_at = NOW()
            WHERE id = $1 AND is_settled = FALSE
            RETURNING {SPLIT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(split)
    }

    /// Settle every outstanding split of an expense; returns the ones that changed
    pub async fn settle_all_splits(&self, expense_id: Uuid) -> RepoResult<Vec<GroupExpenseSplit>> {
        let splits = sqlx::query_as::<_, GroupExpenseSplit>(&format!(
            r#"
            UPDATE group_expense_splits
            SET is_settled = TRUE, approval_requested = FALSE, settled_at = NOW()
            WHERE expense_id = $1 AND is_settled = FALSE
            RETURNING {SPLIT_COLUMNS}
            "#
        ))
        .bind(expense_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(splits)
    }

    pub async fn count_unsettled(&self, expense_id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM group_expense_splits WHERE expense_id = $1 AND is_settled = FALSE",
        )
        .bind(expense_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Shares a user owes to other payers, for reports
    pub async fn find_owed_shares(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> RepoResult<Vec<OwedShare>> {
        let shares = sqlx::query_as::<_, OwedShare>(
            r#"
            SELECT e.id AS expense_id, g.name AS group_name, e.description, s.amount,
                   s.is_settled, e.created_at
            FROM group_expense_splits s
            JOIN group_expenses e ON e.id = s.expense_id
            JOIN groups g ON g.id = e.group_id
            WHERE s.user_id = $1
              AND e.paid_by <> $1
              AND ($2::DATE IS NULL OR e.created_at::DATE >= $2)
              AND ($3::DATE IS NULL OR e.created_at::DATE <= $3)
            ORDER BY e.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(shares)
    }
}
