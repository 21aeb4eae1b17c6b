//! Scoped provider sessions.
//!
//! A [`SessionGuard`] is the only way the orchestration layer opens a
//! session. Whatever happens inside the scope (success, error, a dropped
//! future on cancellation) the session is closed exactly once.

use super::CapabilityProvider;
use crate::core::SessionError;
use std::sync::Arc;

pub struct SessionGuard {
    provider: Arc<dyn CapabilityProvider>,
    released: bool,
}

impl SessionGuard {
    /// Open the provider's session and guard it
    pub async fn open(provider: Arc<dyn CapabilityProvider>) -> Result<Self, SessionError> {
        provider.open_session().await?;
        Ok(Self {
            provider,
            released: false,
        })
    }

    pub fn provider(&self) -> &Arc<dyn CapabilityProvider> {
        &self.provider
    }

    /// Close the session now instead of at end of scope
    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if !self.released {
            self.released = true;
            self.provider.close_session();
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("provider", &self.provider.name())
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{LocalProvider, SessionState};
    use crate::tools::catalog;

    fn engagement() -> Arc<dyn CapabilityProvider> {
        Arc::new(LocalProvider::new(
            "engagement",
            catalog::registry("engagement").unwrap().unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_guard_closes_on_drop() {
        let provider = engagement();
        {
            let guard = SessionGuard::open(provider.clone()).await.unwrap();
            assert!(guard.provider().state().is_open());
        }
        assert_eq!(provider.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_guard_closes_on_error_path() {
        let provider = engagement();
        let run = |provider: Arc<dyn CapabilityProvider>| async move {
            let _guard = SessionGuard::open(provider).await?;
            Err::<(), SessionError>(SessionError::NotOpen("simulated".into()))
        };
        assert!(run(provider.clone()).await.is_err());
        assert_eq!(provider.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_explicit_release() {
        let provider = engagement();
        let guard = SessionGuard::open(provider.clone()).await.unwrap();
        guard.release();
        assert_eq!(provider.state(), SessionState::Closed);

        // A second guard on the same provider reopens it
        let _again = SessionGuard::open(provider.clone()).await.unwrap();
        assert!(provider.state().is_open());
    }

    #[tokio::test]
    async fn test_open_failure_leaves_nothing_to_release() {
        let provider = engagement();
        let _held = SessionGuard::open(provider.clone()).await.unwrap();
        let err = SessionGuard::open(provider.clone()).await.unwrap_err();
        assert_eq!(err, SessionError::AlreadyOpen("engagement".into()));
        // The failed open must not have closed the held session
        assert!(provider.state().is_open());
    }
}
