pub mod auth_service;
pub mod category_service;
pub mod expense_service;
pub mod group_service;
pub mod invite_service;
pub mod notification_service;
pub mod payment_service;
pub mod preferences_service;
pub mod report_service;
pub mod settlement;
pub mod upi_service;

pub use auth_service::AuthService;
pub use category_service::CategoryService;
pub use expense_service::ExpenseService;
pub use group_service::GroupService;
pub use invite_service::InviteService;
pub use notification_service::NotificationService;
pub use payment_service::PaymentService;
pub use preferences_service::PreferencesService;
pub use report_service::ReportService;
pub use settlement::SettlementService;
pub use upi_service::UpiService;
