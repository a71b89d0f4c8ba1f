//! Session operations.

use lampstand_core::User;
use secrecy::SecretString;
use tracing::instrument;

use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Authentication` if the credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User> {
        let user = self.gateway.login(email, password).await?;
        // Cached reads may have been fetched under another account.
        self.cache.invalidate_all();
        Ok(user)
    }

    /// Sign out. Local credentials and cached reads are dropped even if the
    /// backend call fails.
    ///
    /// # Errors
    ///
    /// Returns the backend or storage failure, if any.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let result = self.gateway.logout().await;
        self.cache.invalidate_all();
        result
    }

    /// The signed-in user according to the backend.
    ///
    /// # Errors
    ///
    /// Fails if the request fails or the session cannot be refreshed.
    pub async fn me(&self) -> Result<User> {
        self.gateway.me().await
    }
}
