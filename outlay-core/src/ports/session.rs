//! Session port - which user, if any, is currently active

use crate::domain::UserId;

/// The single capability the expense store needs from authentication
pub trait SessionProvider {
    /// The active user's id, `None` when nobody is logged in
    fn active_user_id(&self) -> Option<UserId>;
}

impl SessionProvider for Option<UserId> {
    fn active_user_id(&self) -> Option<UserId> {
        *self
    }
}
