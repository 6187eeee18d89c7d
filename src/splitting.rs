//! Bill-splitting arithmetic and the settlement state of a single split.

use crate::error::{AppError, AppResult};
use crate::models::GroupExpenseSplit;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

fn paisa() -> Decimal {
    Decimal::new(1, 2)
}

/// Divide `total` into `n` shares that add up exactly.
///
/// Each share is `total / n` truncated to paise; the leftover paise go one
/// each to the first participants. Every share must be at least one paisa.
pub fn equal_shares(total: Decimal, n: usize) -> AppResult<Vec<Decimal>> {
    if n == 0 {
        return Err(AppError::Validation(
            "At least one participant is required".to_string(),
        ));
    }

    let count = Decimal::from(n as u64);
    if total < paisa() * count {
        return Err(AppError::Validation(format!(
            "Amount is too small to split between {} participants",
            n
        )));
    }
    let base = (total / count).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let remainder = total - base * count;
    let extra = (remainder / paisa()).trunc().to_usize().unwrap_or(0);

    Ok((0..n)
        .map(|i| if i < extra { base + paisa() } else { base })
        .collect())
}

/// Check user-supplied shares against the expense total
pub fn validate_custom_splits(total: Decimal, splits: &[(Uuid, Decimal)]) -> AppResult<()> {
    if splits.is_empty() {
        return Err(AppError::Validation(
            "At least one split is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut sum = Decimal::ZERO;
    for (user_id, amount) in splits {
        if !seen.insert(*user_id) {
            return Err(AppError::Validation(
                "Each participant can only appear once".to_string(),
            ));
        }
        if *amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Split amounts must be greater than zero".to_string(),
            ));
        }
        if amount.normalize().scale() > 2 {
            return Err(AppError::Validation(
                "Split amounts can have at most 2 decimal places".to_string(),
            ));
        }
        sum += *amount;
    }

    if sum.round_dp(2) != total.round_dp(2) {
        return Err(AppError::Validation(
            "Split amounts must add up to the expense total".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// Split state machine
// =============================================================================

/// Settlement state of one split, derived from its flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitState {
    Pending,
    AwaitingApproval,
    Settled,
}

impl SplitState {
    pub fn of(split: &GroupExpenseSplit) -> Self {
        Self::from_flags(split.is_settled, split.approval_requested)
    }

    pub fn from_flags(is_settled: bool, approval_requested: bool) -> Self {
        if is_settled {
            SplitState::Settled
        } else if approval_requested {
            SplitState::AwaitingApproval
        } else {
            SplitState::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitState::Pending => "pending",
            SplitState::AwaitingApproval => "awaiting approval",
            SplitState::Settled => "settled",
        }
    }
}

impl fmt::Display for SplitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions that move a split between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAction {
    RequestApproval,
    Approve,
    Reject,
    Settle,
}

impl SplitAction {
    fn verb(&self) -> &'static str {
        match self {
            SplitAction::RequestApproval => "request approval for",
            SplitAction::Approve => "approve",
            SplitAction::Reject => "reject",
            SplitAction::Settle => "settle",
        }
    }
}

/// Resulting state, or a 400 naming the current state
pub fn transition(state: SplitState, action: SplitAction) -> AppResult<SplitState> {
    use SplitAction::*;
    use SplitState::*;

    match (state, action) {
        (Pending, RequestApproval) => Ok(AwaitingApproval),
        (AwaitingApproval, Approve) => Ok(Settled),
        (AwaitingApproval, Reject) => Ok(Pending),
        (Pending | AwaitingApproval, Settle) => Ok(Settled),
        (current, action) => Err(AppError::BusinessLogic(format!(
            "Cannot {} a split that is {}",
            action.verb(),
            current
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_equal_shares_even() {
        assert_eq!(equal_shares(d("300"), 3).unwrap(), vec![d("100"), d("100"), d("100")]);
    }

    #[test]
    fn test_equal_shares_distributes_remainder_from_first() {
        let shares = equal_shares(d("100"), 3).unwrap();
        assert_eq!(shares, vec![d("33.34"), d("33.33"), d("33.33")]);
        assert_eq!(shares.iter().copied().sum::<Decimal>(), d("100"));

        let shares = equal_shares(d("0.05"), 3).unwrap();
        assert_eq!(shares, vec![d("0.02"), d("0.02"), d("0.01")]);
    }

    #[test]
    fn test_equal_shares_always_sum_to_total() {
        for total in ["0.09", "1.00", "999.99", "12345.67"] {
            for n in 1..=9 {
                let shares = equal_shares(d(total), n).unwrap();
                assert_eq!(shares.len(), n);
                assert_eq!(shares.iter().copied().sum::<Decimal>(), d(total), "{total}/{n}");
            }
        }
    }

    #[test]
    fn test_equal_shares_rejects_zero_participants() {
        assert!(equal_shares(d("10"), 0).is_err());
    }

    #[test]
    fn test_equal_shares_needs_a_paisa_each() {
        let err = equal_shares(d("0.02"), 3).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "Amount is too small to split between 3 participants"
        );

        assert_eq!(equal_shares(d("0.03"), 3).unwrap(), vec![d("0.01"); 3]);
    }

    #[test]
    fn test_custom_splits() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(validate_custom_splits(d("100"), &[(a, d("60")), (b, d("40"))]).is_ok());

        let err = validate_custom_splits(d("100"), &[(a, d("60")), (b, d("39.99"))]).unwrap_err();
        assert_eq!(err.public_message(), "Split amounts must add up to the expense total");

        assert!(validate_custom_splits(d("100"), &[(a, d("60")), (a, d("40"))]).is_err());
        assert!(validate_custom_splits(d("100"), &[(a, d("100")), (b, d("0"))]).is_err());
        assert!(validate_custom_splits(d("100"), &[]).is_err());
    }

    #[test]
    fn test_state_from_flags() {
        assert_eq!(SplitState::from_flags(false, false), SplitState::Pending);
        assert_eq!(SplitState::from_flags(false, true), SplitState::AwaitingApproval);
        assert_eq!(SplitState::from_flags(true, false), SplitState::Settled);
        assert_eq!(SplitState::from_flags(true, true), SplitState::Settled);
    }

    #[test]
    fn test_valid_transitions() {
        use SplitAction::*;
        use SplitState::*;
        assert_eq!(transition(Pending, RequestApproval).unwrap(), AwaitingApproval);
        assert_eq!(transition(AwaitingApproval, Approve).unwrap(), Settled);
        assert_eq!(transition(AwaitingApproval, Reject).unwrap(), Pending);
        assert_eq!(transition(Pending, Settle).unwrap(), Settled);
    }

    #[test]
    fn test_invalid_transitions_name_the_state() {
        use SplitAction::*;
        use SplitState::*;
        let err = transition(Pending, Approve).unwrap_err();
        assert_eq!(err.public_message(), "Cannot approve a split that is pending");

        let err = transition(Settled, RequestApproval).unwrap_err();
        assert_eq!(err.public_message(), "Cannot request approval for a split that is settled");

        assert!(transition(AwaitingApproval, RequestApproval).is_err());
        assert!(transition(Settled, Settle).is_err());
    }
}
