//! Settling group expense splits: reminders, approval requests and payer decisions.

use crate::error::{AppError, AppResult};
use crate::models::{GroupExpense, GroupExpenseSplit, NewNotification, NotificationKind};
use crate::repositories::{ExpenseRepository, GroupMemberRepository, GroupRepository, UserRepository};
use crate::services::group_service::require_member;
use crate::services::NotificationService;
use crate::splitting::{transition, SplitAction, SplitState};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Settlement service for group expense splits
pub struct SettlementService {
    expense_repo: Arc<ExpenseRepository>,
    group_repo: Arc<GroupRepository>,
    member_repo: Arc<GroupMemberRepository>,
    user_repo: Arc<UserRepository>,
    notifications: Arc<NotificationService>,
}

impl SettlementService {
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

    async fn expense(&self, expense_id: Uuid) -> AppResult<GroupExpense> {
        self.expense_repo
            .find_expense(expense_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))
    }

    /// Split plus its expense, with the caller checked for group membership
    async fn split_context(
        &self,
        split_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<(GroupExpenseSplit, GroupExpense)> {
        let split = self
            .expense_repo
            .find_split(split_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Split not found".to_string()))?;
        let expense = self.expense(split.expense_id).await?;
        require_member(&self.group_repo, &self.member_repo, expense.group_id, user_id).await?;
        Ok((split, expense))
    }

    async fn name_of(&self, user_id: Uuid) -> String {
        match self.user_repo.find_by_id(user_id).await {
            Ok(Some(user)) => user.display_name(),
            _ => "Someone".to_string(),
        }
    }

    /// Payer nudges everyone who still owes; returns how many were reminded
    pub async fn remind(&self, expense_id: Uuid, user_id: Uuid) -> AppResult<usize> {
        let expense = self.expense(expense_id).await?;
        require_member(&self.group_repo, &self.member_repo, expense.group_id, user_id).await?;
        if expense.paid_by != user_id {
            return Err(AppError::Forbidden(
                "Only the payer can send reminders".to_string(),
            ));
        }

        let outstanding: Vec<GroupExpenseSplit> = self
            .expense_repo
            .find_splits_for_expense(expense_id)
            .await?
            .into_iter()
            .filter(|s| !s.is_settled && s.user_id != expense.paid_by)
            .collect();

        if outstanding.is_empty() {
            return Err(AppError::BusinessLogic(
                "Nothing is outstanding on this expense".to_string(),
            ));
        }

        let payer = self.name_of(user_id).await;
        let notices = outstanding
            .iter()
            .map(|s| {
                NewNotification::new(
                    s.user_id,
                    NotificationKind::PaymentReminder,
                    "Payment reminder",
                    format!("{} reminded you to pay ₹{} for \"{}\"", payer, s.amount, expense.description),
                    json!({ "group_id": expense.group_id, "expense_id": expense.id, "split_id": s.id }),
                )
            })
            .collect();
        self.notifications.notify_all(notices).await;

        info!("Sent {} reminders for expense {}", outstanding.len(), expense_id);
        Ok(outstanding.len())
    }

    /// Payer or group admin marks the whole expense settled
    pub async fn settle_expense(&self, expense_id: Uuid, user_id: Uuid) -> AppResult<GroupExpense> {
        let expense = self.expense(expense_id).await?;
        let (_, member) =
            require_member(&self.group_repo, &self.member_repo, expense.group_id, user_id).await?;
        if expense.paid_by != user_id && !member.is_admin() {
            return Err(AppError::Forbidden(
                "Only the payer or a group admin can settle this expense".to_string(),
            ));
        }
        if expense.is_settled {
            return Err(AppError::BusinessLogic("Expense is already settled".to_string()));
        }

        let changed = self.expense_repo.settle_all_splits(expense_id).await?;
        let settled = self
            .expense_repo
            .mark_expense_settled(expense_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))?;

        let notices = changed
            .iter()
            .filter(|s| s.user_id != expense.paid_by)
            .map(|s| {
                NewNotification::new(
                    s.user_id,
                    NotificationKind::ExpenseSettled,
                    "Expense settled",
                    format!("\"{}\" has been marked as settled", expense.description),
                    json!({ "group_id": expense.group_id, "expense_id": expense.id }),
                )
            })
            .collect();
        self.notifications.notify_all(notices).await;

        info!("Expense {} settled by {} ({} splits closed)", expense_id, user_id, changed.len());
        Ok(settled)
    }

    /// Debtor says they have paid and asks the payer to confirm
    pub async fn request_approval(&self, split_id: Uuid, user_id: Uuid) -> AppResult<GroupExpenseSplit> {
        let (split, expense) = self.split_context(split_id, user_id).await?;
        if split.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the member who owes this share can request approval".to_string(),
            ));
        }
        transition(SplitState::of(&split), SplitAction::RequestApproval)?;

        let updated = self
            .expense_repo
            .set_approval_requested(split_id, true)
            .await?
            .ok_or_else(|| AppError::BusinessLogic("Split changed, please refresh".to_string()))?;

        let debtor = self.name_of(user_id).await;
        self.notifications
            .notify(NewNotification::new(
                expense.paid_by,
                NotificationKind::SettlementRequest,
                "Settlement request",
                format!("{} says they paid ₹{} for \"{}\"", debtor, split.amount, expense.description),
                json!({ "group_id": expense.group_id, "expense_id": expense.id, "split_id": split.id }),
            ))
            .await;

        info!("Split {} awaiting approval", split_id);
        Ok(updated)
    }

    /// Payer confirms a payment; the expense settles once no split is open
    pub async fn approve(&self, split_id: Uuid, user_id: Uuid) -> AppResult<GroupExpenseSplit> {
        let (split, expense) = self.split_context(split_id, user_id).await?;
        if expense.paid_by != user_id {
            return Err(AppError::Forbidden(
                "Only the payer can approve settlements".to_string(),
            ));
        }
        transition(SplitState::of(&split), SplitAction::Approve)?;

        let settled = self
            .expense_repo
            .settle_split(split_id)
            .await?
            .ok_or_else(|| AppError::BusinessLogic("Split changed, please refresh".to_string()))?;

        self.notifications
            .notify(NewNotification::new(
                split.user_id,
                NotificationKind::SettlementApproved,
                "Settlement approved",
                format!("Your payment of ₹{} for \"{}\" was confirmed", split.amount, expense.description),
                json!({ "group_id": expense.group_id, "expense_id": expense.id, "split_id": split.id }),
            ))
            .await;

        if self.expense_repo.count_unsettled(expense.id).await? == 0 {
            self.expense_repo.mark_expense_settled(expense.id).await?;
            info!("All splits paid, expense {} settled", expense.id);
        }

        info!("Split {} approved by {}", split_id, user_id);
        Ok(settled)
    }

    /// Payer disputes a payment claim; the split goes back to pending
    pub async fn reject(&self, split_id: Uuid, user_id: Uuid) -> AppResult<GroupExpenseSplit> {
        let (split, expense) = self.split_context(split_id, user_id).await?;
        if expense.paid_by != user_id {
            return Err(AppError::Forbidden(
                "Only the payer can reject settlements".to_string(),
            ));
        }
        transition(SplitState::of(&split), SplitAction::Reject)?;

        let updated = self
            .expense_repo
            .set_approval_requested(split_id, false)
            .await?
            .ok_or_else(|| AppError::BusinessLogic("Split changed, please refresh".to_string()))?;

        self.notifications
            .notify(NewNotification::new(
                split.user_id,
                NotificationKind::SettlementRejected,
                "Settlement rejected",
                format!("Your payment of ₹{} for \"{}\" was not confirmed", split.amount, expense.description),
                json!({ "group_id": expense.group_id, "expense_id": expense.id, "split_id": split.id }),
            ))
            .await;

        info!("Split {} rejected by {}", split_id, user_id);
        Ok(updated)
    }
}
