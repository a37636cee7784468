//! Client storage trait.
//!
//! Defines the interface for OAuth client lookup.
//! Implementations are provided by storage backends (e.g., PostgreSQL).

use async_trait::async_trait;

use crate::types::Client;

/// Storage operations for OAuth 2.0 clients.
///
/// # Example
///
/// ```ignore
/// use oauth2_store::storage::ClientStore;
///
/// async fn example<S: ClientStore>(store: &S) -> Result<(), S::Error> {
///     let client = store.get_by_id("my-app").await?;
///     println!("Found client for {}", client.domain);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Backend error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Find a client by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the client does not exist or the storage
    /// operation fails. Backends report the two cases distinctly.
    async fn get_by_id(&self, id: &str) -> Result<Client, Self::Error>;
}
