//! Authentication state management.

/// Bearer credentials for the Good Points API.
#[derive(Clone)]
pub struct AuthInfo {
    /// Access token.
    pub token: String,
}

impl AuthInfo {
    /// Create new auth info.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim().to_owned(),
        }
    }

    /// Check if auth looks valid.
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.token.contains(char::is_whitespace)
    }
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInfo").field("token", &"***").finish()
    }
}
