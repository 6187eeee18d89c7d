use crate::error::{AppError, AppResult};
use crate::models::{CategoryTotal, EntryType, MonthlyTotal, Payment, PaymentDraft, PaymentFilter};
use crate::repositories::{CategoryRepository, PaymentRepository};
use crate::validation;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;
const MAX_DESCRIPTION: usize = 500;
const MAX_METHOD: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsQuery {
    #[serde(rename = "type")]
    pub payment_type: Option<String>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: Decimal,
    pub payment_type: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

/// Absent stays `None`; an explicit `null` becomes `Some(None)`
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update; absent fields keep their stored value, `"category_id": null` clears it
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePaymentRequest {
    pub amount: Option<Decimal>,
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub category_id: Option<Option<Uuid>>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PaymentStats {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
    pub transaction_count: i64,
    pub by_category: Vec<CategoryTotal>,
    pub monthly: Vec<MonthlyTotal>,
}

pub(crate) fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> AppResult<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(AppError::Validation(
            "'from' date must not be after 'to' date".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Personal income and expense entries
pub struct PaymentService {
    payment_repo: Arc<PaymentRepository>,
    category_repo: Arc<CategoryRepository>,
}

impl PaymentService {
    pub fn new(payment_repo: Arc<PaymentRepository>, category_repo: Arc<CategoryRepository>) -> Self {
        Self {
            payment_repo,
            category_repo,
        }
    }

    pub async fn list(&self, user_id: Uuid, query: &ListPaymentsQuery) -> AppResult<Vec<Payment>> {
        check_range(query.from, query.to)?;
        let payment_type = query
            .payment_type
            .as_deref()
            .map(|t| EntryType::from_str(t).map_err(AppError::Validation))
            .transpose()?;

        let filter = PaymentFilter {
            payment_type: payment_type.map(String::from),
            category_id: query.category_id,
            from: query.from,
            to: query.to,
            limit: validation::limit(query.limit, DEFAULT_LIMIT, MAX_LIMIT),
            offset: query.offset.unwrap_or(0).max(0),
        };

        Ok(self.payment_repo.find_by_user(user_id, &filter).await?)
    }

    pub async fn create(&self, user_id: Uuid, req: &CreatePaymentRequest) -> AppResult<Payment> {
        let draft = self
            .build_draft(
                user_id,
                req.amount,
                &req.payment_type,
                req.category_id,
                req.description.as_deref(),
                req.payment_method.as_deref(),
                req.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
            )
            .await?;

        let payment = self.payment_repo.create(user_id, &draft).await?;
        info!("Recorded {} payment {} for {}", payment.payment_type, payment.id, user_id);
        Ok(payment)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: &UpdatePaymentRequest,
    ) -> AppResult<Payment> {
        let current = self
            .payment_repo
            .find(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        let draft = self
            .build_draft(
                user_id,
                req.amount.unwrap_or(current.amount),
                req.payment_type.as_deref().unwrap_or(&current.payment_type),
                req.category_id.unwrap_or(current.category_id),
                req.description.as_deref().or(current.description.as_deref()),
                req.payment_method.as_deref().or(current.payment_method.as_deref()),
                req.payment_date.unwrap_or(current.payment_date),
            )
            .await?;

        self.payment_repo
            .update(id, user_id, &draft)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.payment_repo.delete(id, user_id).await? {
            return Err(AppError::NotFound("Payment not found".to_string()));
        }
        info!("Deleted payment {} for {}", id, user_id);
        Ok(())
    }

    pub async fn stats(&self, user_id: Uuid, query: &StatsQuery) -> AppResult<PaymentStats> {
        check_range(query.from, query.to)?;

        let totals = self.payment_repo.totals(user_id, query.from, query.to).await?;
        let by_category = self
            .payment_repo
            .totals_by_category(user_id, query.from, query.to)
            .await?;
        let monthly = self
            .payment_repo
            .monthly_totals(user_id, query.from, query.to)
            .await?;

        Ok(PaymentStats {
            total_income: totals.total_income,
            total_expense: totals.total_expense,
            net_balance: totals.total_income - totals.total_expense,
            transaction_count: totals.transaction_count,
            by_category,
            monthly,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn build_draft(
        &self,
        user_id: Uuid,
        amount: Decimal,
        payment_type: &str,
        category_id: Option<Uuid>,
        description: Option<&str>,
        payment_method: Option<&str>,
        payment_date: NaiveDate,
    ) -> AppResult<PaymentDraft> {
        let amount = validation::amount(amount)?;
        let payment_type = EntryType::from_str(payment_type).map_err(AppError::Validation)?;

        if let Some(category_id) = category_id {
            let category = self
                .category_repo
                .find(category_id, user_id)
                .await?
                .ok_or_else(|| AppError::Validation("Category not found".to_string()))?;

            if category.type_enum() != Some(payment_type) {
                return Err(AppError::Validation(format!(
                    "Category '{}' is not an {} category",
                    category.name,
                    payment_type.as_str()
                )));
            }
        }

        Ok(PaymentDraft {
            amount,
            payment_type: payment_type.as_str().to_string(),
            category_id,
            description: validation::optional_text(description, MAX_DESCRIPTION, "Description")?,
            payment_method: validation::optional_text(payment_method, MAX_METHOD, "Payment method")?,
            payment_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1);
        let b = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert!(check_range(a, b).is_ok());
        assert!(check_range(a, a).is_ok());
        assert!(check_range(b, a).is_err());
        assert!(check_range(None, a).is_ok());
    }

    #[test]
    fn test_update_distinguishes_null_category() {
        let absent: UpdatePaymentRequest = serde_json::from_str(r#"{"amount":"10"}"#).unwrap();
        assert_eq!(absent.category_id, None);

        let cleared: UpdatePaymentRequest =
            serde_json::from_str(r#"{"payment_type":"income","category_id":null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));

        let id = Uuid::new_v4();
        let set: UpdatePaymentRequest =
            serde_json::from_str(&format!(r#"{{"category_id":"{}"}}"#, id)).unwrap();
        assert_eq!(set.category_id, Some(Some(id)));
    }
}
