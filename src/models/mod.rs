pub mod alert;
pub mod notification;
pub mod user;

pub use alert::{Alert, AssetClass, Direction};
pub use notification::Notification;
pub use user::{CurrentUser, User};
