//! OAuth 2.0 client record types.
//!
//! [`ClientInfo`] is the read-only view of a client registration that the
//! authorization server hands to a store. [`Client`] is the concrete record
//! a store returns after a lookup.

use serde::{Deserialize, Serialize};

// =============================================================================
// Client Info
// =============================================================================

/// Read access to an OAuth 2.0 client registration.
pub trait ClientInfo: Send + Sync {
    /// Client identifier used in OAuth flows.
    fn id(&self) -> &str;

    /// Client secret.
    fn secret(&self) -> &str;

    /// Registered domain (redirect base) of the client.
    fn domain(&self) -> &str;

    /// Whether the client is public (cannot keep a secret).
    fn is_public(&self) -> bool;

    /// Owning user, empty when the client is not bound to a user.
    fn user_id(&self) -> &str;
}

// =============================================================================
// Client
// =============================================================================

/// OAuth 2.0 client registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    /// Unique client identifier.
    pub id: String,

    /// Client secret.
    pub secret: String,

    /// Registered domain.
    pub domain: String,

    /// Public client flag.
    pub public: bool,

    /// Owning user.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_id: String,
}

impl Client {
    /// Create a confidential client with the given credentials.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Copy any [`ClientInfo`] into an owned record.
    #[must_use]
    pub fn from_info(info: &(impl ClientInfo + ?Sized)) -> Self {
        Self {
            id: info.id().to_string(),
            secret: info.secret().to_string(),
            domain: info.domain().to_string(),
            public: info.is_public(),
            user_id: info.user_id().to_string(),
        }
    }
}

impl ClientInfo for Client {
    fn id(&self) -> &str {
        &self.id
    }

    fn secret(&self) -> &str {
        &self.secret
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn is_public(&self) -> bool {
        self.public
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }
}
