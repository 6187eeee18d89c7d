use crate::error::{AppError, AppResult};
use crate::models::{GroupExpense, NewNotification, NotificationKind, SplitType, SplitView};
use crate::repositories::{
    ExpenseRepository, GroupMemberRepository, GroupRepository, NewSplit, UserRepository,
};
use crate::services::group_service::require_member;
use crate::services::NotificationService;
use crate::splitting;
use crate::validation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

const MAX_DESCRIPTION: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SplitInput {
    pub user_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub description: String,
    pub amount: Decimal,
    pub paid_by: Option<Uuid>,
    pub split_type: String,
    /// Equal split: who shares the cost. Defaults to every member.
    pub participants: Option<Vec<Uuid>>,
    /// Custom split: explicit amounts
    pub splits: Option<Vec<SplitInput>>,
}

/// Expense with every member's share
#[derive(Debug, Serialize)]
pub struct ExpenseWithSplits {
    #[serde(flatten)]
    pub expense: GroupExpense,
    pub splits: Vec<SplitView>,
}

/// Shared expenses inside a group
pub struct ExpenseService {
    expense_repo: Arc<ExpenseRepository>,
    group_repo: Arc<GroupRepository>,
    member_repo: Arc<GroupMemberRepository>,
    user_repo: Arc<UserRepository>,
    notifications: Arc<NotificationService>,
}

impl ExpenseService {
    pub fn new(
        expense_repo: Arc<ExpenseRepository>,
        group_repo: Arc<GroupRepository>,
        member_repo: Arc<GroupMemberRepository>,
        user_repo: Arc<UserRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            expense_repo,
            group_repo,
            member_repo,
            user_repo,
            notifications,
        }
    }

    /// Expenses of a group, newest first, each with its splits
    pub async fn list(&self, group_id: Uuid, user_id: Uuid) -> AppResult<Vec<ExpenseWithSplits>> {
        require_member(&self.group_repo, &self.member_repo, group_id, user_id).await?;

        let expenses = self.expense_repo.find_by_group(group_id).await?;
        let ids: Vec<Uuid> = expenses.iter().map(|e| e.id).collect();

        let mut by_expense: HashMap<Uuid, Vec<SplitView>> = HashMap::new();
        for split in self.expense_repo.find_split_views(&ids).await? {
            by_expense.entry(split.expense_id).or_default().push(split);
        }

        Ok(expenses
            .into_iter()
            .map(|expense| {
                let splits = by_expense.remove(&expense.id).unwrap_or_default();
                ExpenseWithSplits { expense, splits }
            })
            .collect())
    }

    /// Record an expense and its splits.
    ///
    /// The payer's own share starts settled. If inserting the splits fails the
    /// expense row is deleted again.
    pub async fn create(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        req: &CreateExpenseRequest,
    ) -> AppResult<ExpenseWithSplits> {
        let (group, _) = require_member(&self.group_repo, &self.member_repo, group_id, user_id).await?;

        let description = validation::sanitize_text(&req.description, MAX_DESCRIPTION, "Description")?;
        let amount = validation::amount(req.amount)?;
        let split_type = SplitType::from_str(&req.split_type).map_err(AppError::Validation)?;

        let paid_by = req.paid_by.unwrap_or(user_id);
        if paid_by != user_id && !self.member_repo.is_member(group_id, paid_by).await? {
            return Err(AppError::Validation(
                "Payer must be a member of the group".to_string(),
            ));
        }

        let shares: Vec<(Uuid, Decimal)> = match split_type {
            SplitType::Equal => {
                let participants = match req.participants.as_deref() {
                    Some(ids) if !ids.is_empty() => dedupe(ids),
                    Some(_) => {
                        return Err(AppError::Validation(
                            "At least one participant is required".to_string(),
                        ))
                    }
                    None => self
                        .member_repo
                        .find_by_group(group_id)
                        .await?
                        .into_iter()
                        .map(|m| m.user_id)
                        .collect(),
                };
                let amounts = splitting::equal_shares(amount, participants.len())?;
                participants.into_iter().zip(amounts).collect()
            }
            SplitType::Custom => {
                let splits = req
                    .splits
                    .as_deref()
                    .ok_or_else(|| AppError::Validation("Custom splits are required".to_string()))?;
                let shares: Vec<(Uuid, Decimal)> =
                    splits.iter().map(|s| (s.user_id, s.amount)).collect();
                splitting::validate_custom_splits(amount, &shares)?;
                shares
            }
        };

        let participant_ids: Vec<Uuid> = shares.iter().map(|(id, _)| *id).collect();
        let known = self
            .member_repo
            .count_members_among(group_id, &participant_ids)
            .await?;
        if known != participant_ids.len() as i64 {
            return Err(AppError::Validation(
                "All participants must be members of the group".to_string(),
            ));
        }

        let expense = self
            .expense_repo
            .create_expense(group_id, paid_by, &description, amount, split_type.as_str())
            .await?;

        let new_splits: Vec<NewSplit> = shares
            .iter()
            .map(|(user, share)| NewSplit {
                user_id: *user,
                amount: *share,
                is_settled: *user == paid_by,
            })
            .collect();

        if let Err(e) = self.expense_repo.create_splits(expense.id, &new_splits).await {
            error!("Failed to create splits for expense {}: {}", expense.id, e);
            if let Err(cleanup) = self.expense_repo.delete_expense(expense.id).await {
                error!("Failed to remove orphaned expense {}: {}", expense.id, cleanup);
            }
            return Err(AppError::from(e));
        }

        let expense = if new_splits.iter().all(|s| s.is_settled) {
            self.expense_repo
                .mark_expense_settled(expense.id)
                .await?
                .unwrap_or(expense)
        } else {
            expense
        };

        let payer_name = match self.user_repo.find_by_id(paid_by).await? {
            Some(u) => u.display_name(),
            None => "Someone".to_string(),
        };
        let notices = new_splits
            .iter()
            .filter(|s| s.user_id != paid_by)
            .map(|s| {
                NewNotification::new(
                    s.user_id,
                    NotificationKind::ExpenseAdded,
                    "New group expense",
                    format!(
                        "{} added \"{}\" in {}. Your share is ₹{}",
                        payer_name, description, group.name, s.amount
                    ),
                    json!({ "group_id": group_id, "expense_id": expense.id, "amount": s.amount }),
                )
            })
            .collect();
        self.notifications.notify_all(notices).await;

        let splits = self.expense_repo.find_split_views(&[expense.id]).await?;
        info!(
            "Created {} expense {} of {} in group {} with {} splits",
            split_type.as_str(),
            expense.id,
            amount,
            group_id,
            splits.len()
        );

        Ok(ExpenseWithSplits { expense, splits })
    }
}

/// Drop repeated ids, keeping first occurrences in order
fn dedupe(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
