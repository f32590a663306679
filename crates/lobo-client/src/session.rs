//! Per-process session state shared by every screen.
//!
//! Holds who the local player is, the observable day/night flag, and the
//! "intro already shown" latch. One context is created at startup and passed
//! around by `Arc`; nothing here is a global.

use std::sync::atomic::{AtomicBool, Ordering};

use lobo_core::protocol::UserPayload;
use lobo_core::role::Role;

use crate::announcement::{AnnouncementQueue, intro_chain};
use crate::phase_timer::{Phase, PhaseStore};

/// The player using this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl LocalUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
        }
    }

    pub fn payload(&self) -> UserPayload {
        UserPayload {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

pub struct SessionContext {
    user: LocalUser,
    phase: PhaseStore,
    intro_shown: AtomicBool,
}

impl SessionContext {
    /// A new session. Matches begin at night.
    pub fn new(user: LocalUser) -> Self {
        Self {
            user,
            phase: PhaseStore::new(Phase::Night),
            intro_shown: AtomicBool::new(false),
        }
    }

    pub fn user(&self) -> &LocalUser {
        &self.user
    }

    pub fn phase(&self) -> &PhaseStore {
        &self.phase
    }

    pub fn intro_shown(&self) -> bool {
        self.intro_shown.load(Ordering::Acquire)
    }

    /// Queue the introductory sequence unless this session already played
    /// it. Returns whether it was queued.
    pub fn queue_intro_once(&self, queue: &mut AnnouncementQueue, role: Option<Role>) -> bool {
        if self.intro_shown.swap(true, Ordering::AcqRel) {
            return false;
        }
        queue.extend(intro_chain(role));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcement::{AnnouncementKind, Timing};
    use std::time::Duration;

    #[test]
    fn intro_plays_once_per_session() {
        let session = SessionContext::new(LocalUser::new("u1", "Ana"));
        let mut queue = AnnouncementQueue::new(Timing::default());

        assert!(!session.intro_shown());
        assert!(session.queue_intro_once(&mut queue, Some(Role::Vidente)));
        assert!(session.intro_shown());
        assert_eq!(queue.pending(), 3);

        assert!(!session.queue_intro_once(&mut queue, Some(Role::Vidente)));
        assert_eq!(queue.pending(), 3);

        queue.advance(Duration::ZERO);
        assert!(queue.is_visible(AnnouncementKind::Banner));
    }

    #[test]
    fn separate_sessions_are_independent() {
        let a = SessionContext::new(LocalUser::new("u1", "Ana"));
        let b = SessionContext::new(LocalUser::new("u2", "Bea"));
        let mut queue = AnnouncementQueue::default();
        assert!(a.queue_intro_once(&mut queue, None));
        assert!(!b.intro_shown());
        assert_eq!(b.phase().get(), Phase::Night);
    }

    #[test]
    fn user_payload_carries_identity() {
        let mut user = LocalUser::new("u1", "Ana");
        user.avatar = Some("bruja".to_string());
        let payload = user.payload();
        assert_eq!(payload.id, "u1");
        assert_eq!(payload.name, "Ana");
        assert_eq!(payload.avatar.as_deref(), Some("bruja"));
    }
}
