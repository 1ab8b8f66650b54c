use serde::{Deserialize, Serialize};

/// Caller identity as provided by the account system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Identity {
    pub fn has_staff_override(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}
