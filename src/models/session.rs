use serde::{Deserialize, Serialize};

pub const ANONYMOUS: &str = "Anonymous";

/// The caller's identity, handed explicitly to every operation that needs it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>, email: Option<&str>) -> Self {
        Session {
            uid: uid.into(),
            email: email.map(str::to_string),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name stamped on new listings.
    pub fn seller_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => ANONYMOUS,
        }
    }
}
