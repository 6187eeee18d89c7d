pub mod category_repository;
pub mod expense_repository;
pub mod group_member_repository;
pub mod group_repository;
pub mod invite_repository;
pub mod message_repository;
pub mod notification_repository;
pub mod payment_repository;
pub mod preferences_repository;
pub mod upi_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use category_repository::CategoryRepository;
pub use expense_repository::{ExpenseRepository, NewSplit};
pub use group_member_repository::GroupMemberRepository;
pub use group_repository::GroupRepository;
pub use invite_repository::InviteRepository;
pub use message_repository::MessageRepository;
pub use notification_repository::NotificationRepository;
pub use payment_repository::{PaymentRepository, PaymentTotals};
pub use preferences_repository::PreferencesRepository;
pub use upi_repository::UpiRepository;
pub use user_repository::UserRepository;
