//! Per-caller session binding.
//!
//! A [`SessionContext`] is the caller-context: one per connected client or
//! per inbound request. It holds at most one opaque [`SessionHandle`]. The
//! [`SessionManager`] maps handles to user ids, keyed by the SHA-256 of the
//! handle so the map never holds a replayable token.
//!
//! State machine per context:
//! `Anonymous --start--> Authenticated(user) --end--> Anonymous`.
//! Starting again while authenticated replaces the old binding. Sessions do
//! not expire; they last until `end`. Every login from a fresh context adds a
//! binding, so the map grows with logins that never log out and is only
//! cleared by a process restart.

use super::store::UserId;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Handle byte length before hex encoding (32 bytes = 64 hex chars).
const HANDLE_BYTES: usize = 32;

/// Opaque session token handed back to the caller after login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionHandle(String);

impl SessionHandle {
    fn generate() -> Self {
        let bytes: [u8; HANDLE_BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digest(&self) -> String {
        let mut h = Sha256::new();
        h.update(self.0.as_bytes());
        hex::encode(h.finalize())
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionHandle(<redacted>)")
    }
}

/// The caller-context a session is bound to.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    handle: Option<SessionHandle>,
}

impl SessionContext {
    /// A fresh context with no session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resume a context from a handle the caller presented (e.g. a bearer token).
    pub fn from_handle(token: &str) -> Self {
        Self {
            handle: Some(SessionHandle(token.to_string())),
        }
    }

    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }
}

/// Live handle → user bindings.
#[derive(Default)]
pub struct SessionManager {
    bindings: Mutex<HashMap<String, UserId>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `ctx` to `user_id`, replacing whatever it was bound to before.
    pub fn start(&self, ctx: &mut SessionContext, user_id: UserId) -> SessionHandle {
        let handle = SessionHandle::generate();
        let mut bindings = self.bindings.lock();
        if let Some(old) = ctx.handle.take() {
            bindings.remove(&old.digest());
        }
        bindings.insert(handle.digest(), user_id);
        ctx.handle = Some(handle.clone());
        handle
    }

    /// The user bound to `ctx`, if any.
    pub fn current(&self, ctx: &SessionContext) -> Option<UserId> {
        let handle = ctx.handle.as_ref()?;
        self.bindings.lock().get(&handle.digest()).copied()
    }

    /// Clear all session state for `ctx`. Ending an absent session is a no-op.
    pub fn end(&self, ctx: &mut SessionContext) {
        if let Some(handle) = ctx.handle.take() {
            self.bindings.lock().remove(&handle.digest());
        }
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.bindings.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_is_anonymous() {
        let sessions = SessionManager::new();
        let ctx = SessionContext::anonymous();
        assert!(sessions.current(&ctx).is_none());
        assert!(ctx.handle().is_none());
    }

    #[test]
    fn start_binds_user() {
        let sessions = SessionManager::new();
        let mut ctx = SessionContext::anonymous();

        let handle = sessions.start(&mut ctx, UserId(7));
        assert_eq!(handle.as_str().len(), HANDLE_BYTES * 2);
        assert_eq!(sessions.current(&ctx), Some(UserId(7)));
    }

    #[test]
    fn handle_resumes_in_a_new_context() {
        let sessions = SessionManager::new();
        let mut ctx = SessionContext::anonymous();
        let handle = sessions.start(&mut ctx, UserId(7));

        let resumed = SessionContext::from_handle(handle.as_str());
        assert_eq!(sessions.current(&resumed), Some(UserId(7)));
    }

    #[test]
    fn unknown_handle_is_anonymous() {
        let sessions = SessionManager::new();
        let ctx = SessionContext::from_handle("not-a-real-handle");
        assert!(sessions.current(&ctx).is_none());
    }

    #[test]
    fn end_clears_binding() {
        let sessions = SessionManager::new();
        let mut ctx = SessionContext::anonymous();
        let handle = sessions.start(&mut ctx, UserId(7));

        sessions.end(&mut ctx);
        assert!(sessions.current(&ctx).is_none());
        assert!(ctx.handle().is_none());
        assert!(sessions
            .current(&SessionContext::from_handle(handle.as_str()))
            .is_none());
        assert_eq!(sessions.active_count(), 0);
    }

    #[test]
    fn end_is_idempotent() {
        let sessions = SessionManager::new();
        let mut ctx = SessionContext::anonymous();
        sessions.end(&mut ctx);
        sessions.end(&mut ctx);
        assert!(sessions.current(&ctx).is_none());
    }

    #[test]
    fn restart_replaces_previous_binding() {
        let sessions = SessionManager::new();
        let mut ctx = SessionContext::anonymous();

        let first = sessions.start(&mut ctx, UserId(1));
        let second = sessions.start(&mut ctx, UserId(2));
        assert_ne!(first, second);
        assert_eq!(sessions.current(&ctx), Some(UserId(2)));
        assert!(sessions
            .current(&SessionContext::from_handle(first.as_str()))
            .is_none());
        assert_eq!(sessions.active_count(), 1);
    }

    #[test]
    fn contexts_are_isolated() {
        let sessions = SessionManager::new();
        let mut a = SessionContext::anonymous();
        let mut b = SessionContext::anonymous();

        sessions.start(&mut a, UserId(1));
        sessions.start(&mut b, UserId(2));
        sessions.end(&mut a);

        assert!(sessions.current(&a).is_none());
        assert_eq!(sessions.current(&b), Some(UserId(2)));
    }

    #[test]
    fn handle_debug_is_redacted() {
        let sessions = SessionManager::new();
        let mut ctx = SessionContext::anonymous();
        let handle = sessions.start(&mut ctx, UserId(1));
        assert!(!format!("{handle:?}").contains(handle.as_str()));
    }
}
