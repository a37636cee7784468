//! Token storage trait.
//!
//! This module defines the storage interface for issued OAuth 2.0 grants.
//!
//! # Implementation Notes
//!
//! - A stored token is reachable by each of its non-empty token strings
//! - Removal by an empty key must never delete anything
//! - Expired tokens should be cleaned up periodically

use async_trait::async_trait;

use crate::types::{Token, TokenInfo};

/// Storage trait for issued tokens.
///
/// # Implementations
///
/// Implementations are provided in separate crates:
/// - `oauth2-store-postgres` - PostgreSQL storage backend
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Backend error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stores a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be serialized or stored.
    async fn create(&self, info: &dyn TokenInfo) -> Result<(), Self::Error>;

    /// Deletes the token issued with the given authorization code.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails. A missing token is not
    /// an error.
    async fn remove_by_code(&self, code: &str) -> Result<(), Self::Error>;

    /// Deletes the token with the given access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails. A missing token is not
    /// an error.
    async fn remove_by_access(&self, access: &str) -> Result<(), Self::Error>;

    /// Deletes the token with the given refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails. A missing token is not
    /// an error.
    async fn remove_by_refresh(&self, refresh: &str) -> Result<(), Self::Error>;

    /// Finds a token by its authorization code.
    ///
    /// # Errors
    ///
    /// Returns an error if no token matches or the storage operation fails.
    async fn get_by_code(&self, code: &str) -> Result<Token, Self::Error>;

    /// Finds a token by its access token.
    ///
    /// # Errors
    ///
    /// Returns an error if no token matches or the storage operation fails.
    async fn get_by_access(&self, access: &str) -> Result<Token, Self::Error>;

    /// Finds a token by its refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if no token matches or the storage operation fails.
    async fn get_by_refresh(&self, refresh: &str) -> Result<Token, Self::Error>;
}
