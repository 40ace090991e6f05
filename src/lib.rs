//! Persisted record types for a Twilio-backed application: blacklistable
//! callers, per-user API credential sets, and TwiML response documents
//! served from storage.
//!
//! The crate stops at the storage boundary.  A routing layer is expected to
//! dispatch slug-shaped (`[\w-]+`) path segments to [`twiml_by_url`] lookups
//! and numeric (`\d+`) segments to [`twiml`] lookups, then render the found
//! record with [`Twiml::to_xml`]; none of that dispatch lives here.
//!
//! [`twiml_by_url`]: store::MemoryStore::twiml_by_url
//! [`twiml`]: store::MemoryStore::twiml

pub mod db;
pub mod error;
pub mod phone;
pub mod records;
pub mod store;

pub use crate::db::PgStore;
pub use crate::error::RecordError;
pub use crate::records::{Caller, Credential, Twiml};
pub use crate::store::MemoryStore;

pub mod consts {
    /// Path prefix under which TwiML documents are routed.
    pub const TWIML_PATH_PREFIX: &str = "/twiml/";
    /// Fixed prolog prepended to every served TwiML body.
    pub const XML_PROLOG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
}
