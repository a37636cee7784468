//! OAuth 2.0 token record types.
//!
//! A token record carries one grant: an authorization code, an access token,
//! or an access and refresh token pair. Fields belonging to the other grants
//! are left empty.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// Token Info
// =============================================================================

/// Read and write access to an issued OAuth 2.0 grant.
///
/// Each of the three token strings is paired with the time it was issued and
/// the lifetime it was issued with.
pub trait TokenInfo: Send + Sync {
    fn client_id(&self) -> &str;
    fn set_client_id(&mut self, client_id: String);
    fn user_id(&self) -> &str;
    fn set_user_id(&mut self, user_id: String);
    fn redirect_uri(&self) -> &str;
    fn set_redirect_uri(&mut self, redirect_uri: String);
    fn scope(&self) -> &str;
    fn set_scope(&mut self, scope: String);

    fn code(&self) -> &str;
    fn set_code(&mut self, code: String);
    fn code_create_at(&self) -> OffsetDateTime;
    fn set_code_create_at(&mut self, at: OffsetDateTime);
    fn code_expires_in(&self) -> Duration;
    fn set_code_expires_in(&mut self, ttl: Duration);
    fn code_challenge(&self) -> &str;
    fn set_code_challenge(&mut self, challenge: String);
    fn code_challenge_method(&self) -> &str;
    fn set_code_challenge_method(&mut self, method: String);

    fn access(&self) -> &str;
    fn set_access(&mut self, access: String);
    fn access_create_at(&self) -> OffsetDateTime;
    fn set_access_create_at(&mut self, at: OffsetDateTime);
    fn access_expires_in(&self) -> Duration;
    fn set_access_expires_in(&mut self, ttl: Duration);

    fn refresh(&self) -> &str;
    fn set_refresh(&mut self, refresh: String);
    fn refresh_create_at(&self) -> OffsetDateTime;
    fn set_refresh_create_at(&mut self, at: OffsetDateTime);
    fn refresh_expires_in(&self) -> Duration;
    fn set_refresh_expires_in(&mut self, ttl: Duration);
}

// =============================================================================
// Token
// =============================================================================

/// Issued OAuth 2.0 grant, as persisted by token stores.
///
/// Unset issue times are the Unix epoch and unset lifetimes are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Token {
    pub client_id: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub scope: String,

    pub code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub code_create_at: OffsetDateTime,
    #[serde(with = "humantime_serde")]
    pub code_expires_in: Duration,
    pub code_challenge: String,
    pub code_challenge_method: String,

    pub access: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_create_at: OffsetDateTime,
    #[serde(with = "humantime_serde")]
    pub access_expires_in: Duration,

    pub refresh: String,
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_create_at: OffsetDateTime,
    #[serde(with = "humantime_serde")]
    pub refresh_expires_in: Duration,
}

impl Default for Token {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            user_id: String::new(),
            redirect_uri: String::new(),
            scope: String::new(),
            code: String::new(),
            code_create_at: OffsetDateTime::UNIX_EPOCH,
            code_expires_in: Duration::ZERO,
            code_challenge: String::new(),
            code_challenge_method: String::new(),
            access: String::new(),
            access_create_at: OffsetDateTime::UNIX_EPOCH,
            access_expires_in: Duration::ZERO,
            refresh: String::new(),
            refresh_create_at: OffsetDateTime::UNIX_EPOCH,
            refresh_expires_in: Duration::ZERO,
        }
    }
}

impl Token {
    /// Create an empty token for the given client.
    #[must_use]
    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    /// Set the authorization code grant.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>, at: OffsetDateTime, ttl: Duration) -> Self {
        self.code = code.into();
        self.code_create_at = at;
        self.code_expires_in = ttl;
        self
    }

    /// Set the access token grant.
    #[must_use]
    pub fn with_access(
        mut self,
        access: impl Into<String>,
        at: OffsetDateTime,
        ttl: Duration,
    ) -> Self {
        self.access = access.into();
        self.access_create_at = at;
        self.access_expires_in = ttl;
        self
    }

    /// Set the refresh token leg.
    #[must_use]
    pub fn with_refresh(
        mut self,
        refresh: impl Into<String>,
        at: OffsetDateTime,
        ttl: Duration,
    ) -> Self {
        self.refresh = refresh.into();
        self.refresh_create_at = at;
        self.refresh_expires_in = ttl;
        self
    }

    /// Copy any [`TokenInfo`] into an owned record.
    #[must_use]
    pub fn from_info(info: &(impl TokenInfo + ?Sized)) -> Self {
        Self {
            client_id: info.client_id().to_string(),
            user_id: info.user_id().to_string(),
            redirect_uri: info.redirect_uri().to_string(),
            scope: info.scope().to_string(),
            code: info.code().to_string(),
            code_create_at: info.code_create_at(),
            code_expires_in: info.code_expires_in(),
            code_challenge: info.code_challenge().to_string(),
            code_challenge_method: info.code_challenge_method().to_string(),
            access: info.access().to_string(),
            access_create_at: info.access_create_at(),
            access_expires_in: info.access_expires_in(),
            refresh: info.refresh().to_string(),
            refresh_create_at: info.refresh_create_at(),
            refresh_expires_in: info.refresh_expires_in(),
        }
    }
}

impl TokenInfo for Token {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn set_client_id(&mut self, client_id: String) {
        self.client_id = client_id;
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn set_user_id(&mut self, user_id: String) {
        self.user_id = user_id;
    }

    fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn set_redirect_uri(&mut self, redirect_uri: String) {
        self.redirect_uri = redirect_uri;
    }

    fn scope(&self) -> &str {
        &self.scope
    }

    fn set_scope(&mut self, scope: String) {
        self.scope = scope;
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn set_code(&mut self, code: String) {
        self.code = code;
    }

    fn code_create_at(&self) -> OffsetDateTime {
        self.code_create_at
    }

    fn set_code_create_at(&mut self, at: OffsetDateTime) {
        self.code_create_at = at;
    }

    fn code_expires_in(&self) -> Duration {
        self.code_expires_in
    }

    fn set_code_expires_in(&mut self, ttl: Duration) {
        self.code_expires_in = ttl;
    }

    fn code_challenge(&self) -> &str {
        &self.code_challenge
    }

    fn set_code_challenge(&mut self, challenge: String) {
        self.code_challenge = challenge;
    }

    fn code_challenge_method(&self) -> &str {
        &self.code_challenge_method
    }

    fn set_code_challenge_method(&mut self, method: String) {
        self.code_challenge_method = method;
    }

    fn access(&self) -> &str {
        &self.access
    }

    fn set_access(&mut self, access: String) {
        self.access = access;
    }

    fn access_create_at(&self) -> OffsetDateTime {
        self.access_create_at
    }

    fn set_access_create_at(&mut self, at: OffsetDateTime) {
        self.access_create_at = at;
    }

    fn access_expires_in(&self) -> Duration {
        self.access_expires_in
    }

    fn set_access_expires_in(&mut self, ttl: Duration) {
        self.access_expires_in = ttl;
    }

    fn refresh(&self) -> &str {
        &self.refresh
    }

    fn set_refresh(&mut self, refresh: String) {
        self.refresh = refresh;
    }

    fn refresh_create_at(&self) -> OffsetDateTime {
        self.refresh_create_at
    }

    fn set_refresh_create_at(&mut self, at: OffsetDateTime) {
        self.refresh_create_at = at;
    }

    fn refresh_expires_in(&self) -> Duration {
        self.refresh_expires_in
    }

    fn set_refresh_expires_in(&mut self, ttl: Duration) {
        self.refresh_expires_in = ttl;
    }
}
