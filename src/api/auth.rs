//! Identity collaborator seam
//!
//! The identity provider is external. The engine needs two things from it:
//! a bearer token for REST calls and a signed-in/out signal that gates the
//! whole dashboard.

use std::future::Future;
use std::sync::{Arc, RwLock};

use tokio::sync::watch;

/// Sign-in state reported by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    SignedIn,
    SignedOut,
}

/// Create an auth state channel
pub fn auth_channel(initial: AuthState) -> (watch::Sender<AuthState>, watch::Receiver<AuthState>) {
    watch::channel(initial)
}

/// Source of bearer tokens
pub trait TokenProvider: Send + Sync + 'static {
    /// Current token, or `None` when signed out
    fn bearer_token(&self) -> impl Future<Output = Option<String>> + Send;
}

/// Token set by the host application and swapped on refresh
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(token.into()))),
        }
    }

    /// Replace the token (`None` signs out)
    pub fn set(&self, token: Option<String>) {
        match self.inner.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn get(&self) -> Option<String> {
        match self.inner.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TokenProvider for SharedToken {
    async fn bearer_token(&self) -> Option<String> {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shared_token_swap() {
        let token = SharedToken::new("abc");
        let handle = token.clone();

        assert_eq!(token.bearer_token().await.as_deref(), Some("abc"));

        handle.set(None);
        assert_eq!(token.bearer_token().await, None);

        handle.set(Some("def".into()));
        assert_eq!(token.bearer_token().await.as_deref(), Some("def"));
    }

    #[test]
    fn test_auth_channel() {
        let (tx, rx) = auth_channel(AuthState::SignedIn);
        tx.send_replace(AuthState::SignedOut);
        assert_eq!(*rx.borrow(), AuthState::SignedOut);
    }
}
