//! Local session adapter - user directory and active user id
//!
//! Users live under the `users` key as a JSON array; the active user id lives
//! under `current_user_id`. Passwords are stored as Argon2id hashes with a
//! random per-user salt, both base64-encoded.

use std::sync::Arc;

use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::{User, UserId};
use crate::ports::{KeyValueStore, SessionProvider};

const USERS_KEY: &str = "users";
const CURRENT_USER_KEY: &str = "current_user_id";

/// Default Argon2id parameters
const DEFAULT_TIME_COST: u32 = 3;
const DEFAULT_MEMORY_COST: u32 = 65536; // 64 MiB
const DEFAULT_PARALLELISM: u32 = 4;
const DEFAULT_HASH_LEN: u32 = 32;
const SALT_LEN: usize = 16;

/// Argon2id parameters for password hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    pub time_cost: u32,
    pub memory_cost: u32,
    pub parallelism: u32,
    pub hash_len: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
            hash_len: DEFAULT_HASH_LEN,
        }
    }
}

/// Persisted user record, including the credential
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    id: UserId,
    email: String,
    username: String,
    password_hash: String,
    salt: String,
}

impl StoredUser {
    fn to_user(&self) -> User {
        User::new(self.id, self.email.clone(), self.username.clone())
    }
}

/// Session collaborator backed by a key-value store
pub struct LocalSession {
    storage: Arc<dyn KeyValueStore>,
    params: PasswordParams,
}

impl LocalSession {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_params(storage, PasswordParams::default())
    }

    pub fn with_params(storage: Arc<dyn KeyValueStore>, params: PasswordParams) -> Self {
        Self { storage, params }
    }

    /// Register a new user and make them the active user
    pub fn register(&self, email: &str, username: &str, password: &str) -> Result<User> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() || username.is_empty() {
            return Err(Error::validation("email and username are required"));
        }
        if password.is_empty() {
            return Err(Error::validation("password must not be empty"));
        }

        let mut users = self.load_users()?;
        if users.iter().any(|u| u.email == email || u.username == username) {
            return Err(Error::DuplicateUser(format!(
                "a user with email {} or username {} already exists",
                email, username
            )));
        }

        let id = UserId(users.iter().map(|u| u.id.0).max().unwrap_or(0) + 1);
        let salt: [u8; SALT_LEN] = rand::thread_rng().gen();
        let hash = self.derive_hash(password, &salt)?;

        let engine = base64::engine::general_purpose::STANDARD;
        let stored = StoredUser {
            id,
            email: email.to_string(),
            username: username.to_string(),
            password_hash: engine.encode(hash),
            salt: engine.encode(salt),
        };
        let user = stored.to_user();
        users.push(stored);

        self.save_users(&users)?;
        self.set_active(id)?;
        tracing::info!(user_id = %id, "registered user");
        Ok(user)
    }

    /// Log in by email or username
    pub fn login(&self, email_or_username: &str, password: &str) -> Result<User> {
        let users = self.load_users()?;
        let identifier = email_or_username.trim();
        let stored = users
            .iter()
            .find(|u| u.email == identifier || u.username == identifier)
            .ok_or(Error::InvalidCredentials)?;

        if !self.verify(stored, password)? {
            tracing::debug!(user_id = %stored.id, "password mismatch");
            return Err(Error::InvalidCredentials);
        }

        self.set_active(stored.id)?;
        tracing::info!(user_id = %stored.id, "logged in");
        Ok(stored.to_user())
    }

    /// Clear the active user
    pub fn logout(&self) -> Result<()> {
        self.storage.remove(CURRENT_USER_KEY)?;
        tracing::info!("logged out");
        Ok(())
    }

    /// The active user, if any
    pub fn current_user(&self) -> Result<Option<User>> {
        let Some(id) = self.read_active()? else {
            return Ok(None);
        };
        let users = self.load_users()?;
        Ok(users.iter().find(|u| u.id == id).map(StoredUser::to_user))
    }

    /// Change a user's email and username, keeping their credential
    pub fn update_profile(&self, id: UserId, email: &str, username: &str) -> Result<User> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() || username.is_empty() {
            return Err(Error::validation("email and username are required"));
        }

        let mut users = self.load_users()?;
        if users
            .iter()
            .any(|u| u.id != id && (u.email == email || u.username == username))
        {
            return Err(Error::DuplicateUser(format!(
                "email {} or username {} is taken",
                email, username
            )));
        }

        let stored = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::validation(format!("unknown user id {}", id)))?;
        stored.email = email.to_string();
        stored.username = username.to_string();
        let user = stored.to_user();

        self.save_users(&users)?;
        Ok(user)
    }

    fn load_users(&self) -> Result<Vec<StoredUser>> {
        match self.storage.get(USERS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_users(&self, users: &[StoredUser]) -> Result<()> {
        self.storage.set(USERS_KEY, &serde_json::to_string(users)?)
    }

    fn set_active(&self, id: UserId) -> Result<()> {
        self.storage.set(CURRENT_USER_KEY, &id.to_string())
    }

    fn read_active(&self) -> Result<Option<UserId>> {
        let Some(raw) = self.storage.get(CURRENT_USER_KEY)? else {
            return Ok(None);
        };
        raw.trim()
            .parse::<i64>()
            .map(|id| Some(UserId(id)))
            .map_err(|_| Error::validation(format!("corrupt active user id: {:?}", raw)))
    }

    fn verify(&self, stored: &StoredUser, password: &str) -> Result<bool> {
        let engine = base64::engine::general_purpose::STANDARD;
        let salt = engine
            .decode(&stored.salt)
            .map_err(|e| Error::validation(format!("corrupt salt: {}", e)))?;
        let expected = engine
            .decode(&stored.password_hash)
            .map_err(|e| Error::validation(format!("corrupt password hash: {}", e)))?;
        Ok(self.derive_hash(password, &salt)? == expected)
    }

    /// Derive a password hash using Argon2id
    fn derive_hash(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>> {
        let argon2_params = argon2::Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            Some(self.params.hash_len as usize),
        )
        .map_err(|e| Error::validation(format!("Failed to create argon2 params: {:?}", e)))?;

        let argon2 = argon2::Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            argon2_params,
        );

        let mut hash = vec![0u8; self.params.hash_len as usize];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut hash)
            .map_err(|e| Error::validation(format!("Failed to hash password: {:?}", e)))?;
        Ok(hash)
    }
}

impl SessionProvider for LocalSession {
    fn active_user_id(&self) -> Option<UserId> {
        match self.read_active() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("could not read active user: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryKeyValueStore;

    /// Cheap parameters so tests stay fast
    fn fast_params() -> PasswordParams {
        PasswordParams {
            time_cost: 1,
            memory_cost: 8,
            parallelism: 1,
            hash_len: 32,
        }
    }

    fn session() -> (Arc<MemoryKeyValueStore>, LocalSession) {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let session = LocalSession::with_params(storage.clone(), fast_params());
        (storage, session)
    }

    #[test]
    fn test_register_assigns_sequential_ids_and_activates() {
        let (_, session) = session();
        let alice = session.register("alice@example.com", "alice", "pw1").unwrap();
        let bob = session.register("bob@example.com", "bob", "pw2").unwrap();

        assert_eq!(alice.id, UserId(1));
        assert_eq!(bob.id, UserId(2));
        assert_eq!(session.active_user_id(), Some(UserId(2)));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let (_, session) = session();
        session.register("alice@example.com", "alice", "pw").unwrap();

        let by_email = session.register("alice@example.com", "other", "pw");
        assert!(matches!(by_email, Err(Error::DuplicateUser(_))));
        let by_username = session.register("new@example.com", "alice", "pw");
        assert!(matches!(by_username, Err(Error::DuplicateUser(_))));
    }

    #[test]
    fn test_password_is_never_stored_in_clear() {
        let (storage, session) = session();
        session.register("alice@example.com", "alice", "hunter2").unwrap();

        let raw = storage.get(USERS_KEY).unwrap().unwrap();
        assert!(!raw.contains("hunter2"));
        assert!(raw.contains("passwordHash"));
    }

    #[test]
    fn test_login_by_email_or_username() {
        let (_, session) = session();
        session.register("alice@example.com", "alice", "secret").unwrap();
        session.logout().unwrap();
        assert_eq!(session.active_user_id(), None);

        let user = session.login("alice", "secret").unwrap();
        assert_eq!(user.email, "alice@example.com");
        session.logout().unwrap();

        let user = session.login("alice@example.com", "secret").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(session.current_user().unwrap(), Some(user));
    }

    #[test]
    fn test_login_rejects_bad_credentials() {
        let (_, session) = session();
        session.register("alice@example.com", "alice", "secret").unwrap();
        session.logout().unwrap();

        assert!(matches!(session.login("alice", "wrong"), Err(Error::InvalidCredentials)));
        assert!(matches!(session.login("nobody", "secret"), Err(Error::InvalidCredentials)));
        assert_eq!(session.active_user_id(), None);
    }

    #[test]
    fn test_update_profile_keeps_credentials() {
        let (_, session) = session();
        let alice = session.register("alice@example.com", "alice", "secret").unwrap();
        session.register("bob@example.com", "bob", "pw").unwrap();

        let taken = session.update_profile(alice.id, "bob@example.com", "alice");
        assert!(matches!(taken, Err(Error::DuplicateUser(_))));

        let updated = session
            .update_profile(alice.id, "alice@new.example.com", "alice2")
            .unwrap();
        assert_eq!(updated.username, "alice2");

        session.logout().unwrap();
        assert!(session.login("alice2", "secret").is_ok());
    }

    #[test]
    fn test_corrupt_active_id_reads_as_no_session() {
        let (storage, session) = session();
        storage.set(CURRENT_USER_KEY, "not-a-number").unwrap();
        assert_eq!(session.active_user_id(), None);
    }
}
