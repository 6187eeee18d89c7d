//! PayDhan Backend Library
//!
//! Personal and group expense tracking over a JSON HTTP API. This module
//! exposes the backend components for use by the binary and by tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod splitting;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::{GoogleOAuthClient, RateLimiter, SessionManager};
use database::Database;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Database,
    pub sessions: Arc<SessionManager>,
    pub rate_limiter: RateLimiter,
    pub google: Option<Arc<GoogleOAuthClient>>,
    pub auth_service: Arc<AuthService>,
    pub category_service: Arc<CategoryService>,
    pub payment_service: Arc<PaymentService>,
    pub group_service: Arc<GroupService>,
    pub invite_service: Arc<InviteService>,
    pub expense_service: Arc<ExpenseService>,
    pub settlement_service: Arc<SettlementService>,
    pub upi_service: Arc<UpiService>,
    pub notification_service: Arc<NotificationService>,
    pub preferences_service: Arc<PreferencesService>,
    pub report_service: Arc<ReportService>,
}

impl AppState {
    /// Create a new AppState with initialized repositories and services
    pub fn new(pool: sqlx::PgPool, config: AppConfig) -> Self {
        let database = Database::new(pool.clone());

        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let category_repo = Arc::new(CategoryRepository::new(pool.clone()));
        let payment_repo = Arc::new(PaymentRepository::new(pool.clone()));
        let group_repo = Arc::new(GroupRepository::new(pool.clone()));
        let member_repo = Arc::new(GroupMemberRepository::new(pool.clone()));
        let invite_repo = Arc::new(InviteRepository::new(pool.clone()));
        let message_repo = Arc::new(MessageRepository::new(pool.clone()));
        let expense_repo = Arc::new(ExpenseRepository::new(pool.clone()));
        let notification_repo = Arc::new(NotificationRepository::new(pool.clone()));
        let upi_repo = Arc::new(UpiRepository::new(pool.clone()));
        let preferences_repo = Arc::new(PreferencesRepository::new(pool));

        let notification_service = Arc::new(NotificationService::new(notification_repo));

        Self {
            sessions: Arc::new(SessionManager::new(&config.session)),
            rate_limiter: RateLimiter::new(),
            google: config
                .google
                .clone()
                .map(|g| Arc::new(GoogleOAuthClient::new(g))),
            auth_service: Arc::new(AuthService::new(user_repo.clone())),
            category_service: Arc::new(CategoryService::new(category_repo.clone())),
            payment_service: Arc::new(PaymentService::new(payment_repo.clone(), category_repo)),
            group_service: Arc::new(GroupService::new(
                group_repo.clone(),
                user_repo.clone(),
                member_repo.clone(),
                invite_repo.clone(),
                message_repo,
                notification_service.clone(),
            )),
            invite_service: Arc::new(InviteService::new(
                invite_repo,
                group_repo.clone(),
                member_repo.clone(),
                user_repo.clone(),
                notification_service.clone(),
            )),
            expense_service: Arc::new(ExpenseService::new(
                expense_repo.clone(),
                group_repo.clone(),
                member_repo.clone(),
                user_repo.clone(),
                notification_service.clone(),
            )),
            settlement_service: Arc::new(SettlementService::new(
                expense_repo.clone(),
                group_repo,
                member_repo,
                user_repo.clone(),
                notification_service.clone(),
            )),
            upi_service: Arc::new(UpiService::new(upi_repo, user_repo)),
            notification_service,
            preferences_service: Arc::new(PreferencesService::new(preferences_repo)),
            report_service: Arc::new(ReportService::new(payment_repo, expense_repo)),
            database,
            config: Arc::new(config),
        }
    }
}
