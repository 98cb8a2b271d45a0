use std::sync::{Arc, PoisonError, RwLock};

/// Bearer token shared between clones of an [`ApiClient`](super::ApiClient).
///
/// The client clears it when the server answers 401, so every holder sees
/// the eviction at once.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        let session = Self::default();
        session.sign_in(token);
        session
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_eviction() {
        let session = Session::new("tok");
        let other = session.clone();
        assert_eq!(other.token().as_deref(), Some("tok"));

        session.clear();
        assert!(!other.is_active());

        other.sign_in("fresh");
        assert_eq!(session.token().as_deref(), Some("fresh"));
    }

    #[test]
    fn clear_works_after_a_holder_panicked() {
        let session = Session::new("stale");
        let holder = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.token.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(session.token.is_poisoned());

        assert_eq!(session.token().as_deref(), Some("stale"));
        session.clear();
        assert!(!session.is_active());
        session.sign_in("fresh");
        assert_eq!(session.token().as_deref(), Some("fresh"));
    }
}
