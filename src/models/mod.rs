//! Domain models for the PayDhan backend.
//!
//! Each model maps to one table (or a joined read view of one).

pub mod category;
pub mod expense;
pub mod group;
pub mod group_member;
pub mod invite;
pub mod message;
pub mod notification;
pub mod payment;
pub mod preferences;
pub mod upi;
pub mod user;

// Re-export all models for convenient access
pub use category::{Category, EntryType};
pub use expense::{GroupExpense, GroupExpenseSplit, OwedShare, SplitType, SplitView};
pub use group::{Group, GroupSummary};
pub use group_member::{GroupMember, MemberProfile, MemberRole};
pub use invite::{GroupInvite, InviteStatus, InviteView};
pub use message::GroupMessage;
pub use notification::{NewNotification, Notification, NotificationKind};
pub use payment::{CategoryTotal, MonthlyTotal, Payment, PaymentDraft, PaymentFilter};
pub use preferences::UserPreferences;
pub use upi::UpiId;
pub use user::{NewUser, User};
