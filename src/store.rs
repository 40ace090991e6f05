use crate::error::RecordError;
use crate::phone;
use crate::records::{validate_credential, validate_twiml, Caller, Credential, Twiml};

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// In-process record store with the same operation surface as
/// [`crate::db::PgStore`], used by tests and by embedders that do not want a
/// database.
///
/// One id-keyed map per record kind behind a single mutex; every operation
/// is a single short critical section, so uniqueness checks and inserts are
/// atomic with respect to each other.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i32,
    callers: HashMap<i32, Caller>,
    credentials: HashMap<i32, Credential>,
    twimls: HashMap<i32, Twiml>,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    // Caller operations

    /// Persist a new caller.  The number is normalized to E.164 before the
    /// uniqueness check, so two spellings of one number collide.
    pub async fn create_caller(
        &self,
        phone_number: &str,
        blacklisted: bool,
    ) -> Result<Caller, RecordError> {
        let phone_number = phone::normalize(phone_number)?;
        let mut inner = self.inner.lock().unwrap();
        if inner.callers.values().any(|c| c.phone_number == phone_number) {
            return Err(RecordError::UniquenessViolation(
                "phone number already registered",
            ));
        }
        let id = inner.next_id();
        let caller = Caller {
            id,
            phone_number,
            blacklisted,
        };
        inner.callers.insert(id, caller.clone());
        debug!(id, phone = %caller.phone_number, "created caller");
        Ok(caller)
    }

    pub async fn caller(&self, id: i32) -> Result<Caller, RecordError> {
        let inner = self.inner.lock().unwrap();
        inner.callers.get(&id).cloned().ok_or(RecordError::NotFound)
    }

    /// Flip the blacklist flag on an existing caller.
    pub async fn set_blacklisted(&self, id: i32, blacklisted: bool) -> Result<Caller, RecordError> {
        let mut inner = self.inner.lock().unwrap();
        let caller = inner.callers.get_mut(&id).ok_or(RecordError::NotFound)?;
        caller.blacklisted = blacklisted;
        Ok(caller.clone())
    }

    pub async fn delete_caller(&self, id: i32) -> Result<(), RecordError> {
        let mut inner = self.inner.lock().unwrap();
        inner.callers.remove(&id).ok_or(RecordError::NotFound)?;
        debug!(id, "deleted caller");
        Ok(())
    }

    // Credential operations

    /// Persist a credential set for a user.  At most one per user; a second
    /// create for the same user fails.
    pub async fn create_credential(
        &self,
        name: &str,
        account_sid: &str,
        auth_token: &str,
        user_id: i32,
    ) -> Result<Credential, RecordError> {
        validate_credential(name, account_sid, auth_token)?;
        let mut inner = self.inner.lock().unwrap();
        if inner.credentials.values().any(|c| c.user_id == user_id) {
            return Err(RecordError::UniquenessViolation(
                "user already has a credential set",
            ));
        }
        let id = inner.next_id();
        let credential = Credential {
            id,
            name: name.to_string(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            user_id,
        };
        inner.credentials.insert(id, credential.clone());
        debug!(id, user_id, "created credential set");
        Ok(credential)
    }

    pub async fn credential(&self, id: i32) -> Result<Credential, RecordError> {
        let inner = self.inner.lock().unwrap();
        inner
            .credentials
            .get(&id)
            .cloned()
            .ok_or(RecordError::NotFound)
    }

    pub async fn credential_for_user(&self, user_id: i32) -> Result<Credential, RecordError> {
        let inner = self.inner.lock().unwrap();
        inner
            .credentials
            .values()
            .find(|c| c.user_id == user_id)
            .cloned()
            .ok_or(RecordError::NotFound)
    }

    pub async fn delete_credential(&self, id: i32) -> Result<(), RecordError> {
        let mut inner = self.inner.lock().unwrap();
        inner.credentials.remove(&id).ok_or(RecordError::NotFound)?;
        debug!(id, "deleted credential set");
        Ok(())
    }

    // Twiml operations

    pub async fn create_twiml(
        &self,
        name: &str,
        twiml: &str,
        url: &str,
        public: bool,
    ) -> Result<Twiml, RecordError> {
        validate_twiml(name, twiml, url)?;
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let record = Twiml {
            id,
            name: name.to_string(),
            twiml: twiml.to_string(),
            public,
            url: url.to_string(),
        };
        inner.twimls.insert(id, record.clone());
        debug!(id, url = %record.url, "created twiml document");
        Ok(record)
    }

    /// Lookup by numeric identifier, the `\d+` routing shape.
    pub async fn twiml(&self, id: i32) -> Result<Twiml, RecordError> {
        let inner = self.inner.lock().unwrap();
        inner.twimls.get(&id).cloned().ok_or(RecordError::NotFound)
    }

    /// Lookup by slug, the `[\w-]+` routing shape.  Duplicate slugs are
    /// permitted; the match with the lowest id wins.
    pub async fn twiml_by_url(&self, url: &str) -> Result<Twiml, RecordError> {
        let inner = self.inner.lock().unwrap();
        inner
            .twimls
            .values()
            .filter(|t| t.url == url)
            .min_by_key(|t| t.id)
            .cloned()
            .ok_or(RecordError::NotFound)
    }

    pub async fn delete_twiml(&self, id: i32) -> Result<(), RecordError> {
        let mut inner = self.inner.lock().unwrap();
        inner.twimls.remove(&id).ok_or(RecordError::NotFound)?;
        debug!(id, "deleted twiml document");
        Ok(())
    }
}
