//! Identity and time collaborators injected into the engine.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Supplies the currently authenticated user.
///
/// `None` means nobody is signed in; the engine treats that as a hard
/// precondition failure, never as something to retry.
pub trait IdentityProvider: Send + Sync {
    /// Returns the authenticated user id, if any.
    fn current_user(&self) -> Option<String>;
}

/// An identity that changes only when told to.
///
/// Used by the CLI (user id from settings) and by tests.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    user: RwLock<Option<String>>,
}

impl StaticIdentity {
    /// Creates an identity signed in as `user_id`.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user: RwLock::new(Some(user_id.into())),
        }
    }

    /// Creates an identity with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Signs in as `user_id`.
    pub fn sign_in(&self, user_id: impl Into<String>) {
        *self.user.write() = Some(user_id.into());
    }

    /// Signs out.
    pub fn sign_out(&self) {
        *self.user.write() = None;
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<String> {
        self.user.read().clone()
    }
}

/// Source of the device's current time.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that reports a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock stopped at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn static_identity_sign_in_out() {
        let identity = StaticIdentity::signed_out();
        assert_eq!(identity.current_user(), None);

        identity.sign_in("u1");
        assert_eq!(identity.current_user().as_deref(), Some("u1"));

        identity.sign_out();
        assert_eq!(identity.current_user(), None);
    }

    #[test]
    fn fixed_clock_moves_only_when_set() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
