use serde::{Deserialize, Serialize};

use super::{Alert, Notification};

/// Per-identity record. Alerts live in exactly one of the two lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    // phone-equivalent opaque key
    pub id: String,

    pub active_alerts: Vec<Alert>,
    pub triggered_alerts: Vec<Alert>,

    pub notifications: Vec<Notification>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Identity of the caller, injected by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub phone: String,
}
