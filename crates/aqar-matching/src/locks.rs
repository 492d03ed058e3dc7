//! Per-identity write serialization.
//!
//! A learned profile is a read-modify-write of a single row; two concurrent
//! relearn passes for the same identity would race. Each identity gets its
//! own async mutex, created lazily, so distinct identities never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aqar_core::Identity;

#[derive(Debug, Default)]
pub struct IdentityLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IdentityLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The async mutex guarding this identity's profile. The registry lock
    /// is held only long enough to clone the handle, never across an await.
    #[must_use]
    pub fn for_identity(&self, identity: &Identity) -> Arc<tokio::sync::Mutex<()>> {
        let key = identity.storage_key();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(inner.entry(key).or_default())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn same_identity_gets_the_same_lock() {
        let locks = IdentityLocks::new();
        let id = Identity::User(Uuid::new_v4());

        let a = locks.for_identity(&id);
        let b = locks.for_identity(&id);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn distinct_identities_get_distinct_locks() {
        let locks = IdentityLocks::new();
        let a = locks.for_identity(&Identity::User(Uuid::new_v4()));
        let b = locks.for_identity(&Identity::Session("anon-1".to_string()));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn guard_serializes_access() {
        let locks = IdentityLocks::new();
        let id = Identity::Session("anon-2".to_string());

        let handle = locks.for_identity(&id);
        let guard = handle.lock().await;
        assert!(locks.for_identity(&id).try_lock().is_err());
        drop(guard);
        assert!(locks.for_identity(&id).try_lock().is_ok());
    }
}
