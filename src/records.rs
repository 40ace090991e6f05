use crate::consts::{TWIML_PATH_PREFIX, XML_PROLOG};
use crate::error::{validation, RecordError};

use serde::{Deserialize, Serialize};

/// Storage-enforced field length limits, matching the column definitions in
/// [`crate::db`].
pub mod limits {
    pub const NAME_MAX: usize = 30;
    pub const ACCOUNT_SID_MAX: usize = 34;
    pub const AUTH_TOKEN_MAX: usize = 32;
    pub const TWIML_MAX: usize = 200;
    pub const URL_MAX: usize = 30;
}

/// A caller is identified uniquely by phone number; `blacklisted` marks
/// whether they may use our services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Caller {
    pub id: i32,
    /// Unique phone number, stored in normalized E.164 form.
    pub phone_number: String,
    pub blacklisted: bool,
}

impl Caller {
    /// Human-readable label: the phone number, flagged when blacklisted.
    /// Recomputed from current field values on every call.
    pub fn display_name(&self) -> String {
        if self.blacklisted {
            format!("{} (blacklisted)", self.phone_number)
        } else {
            self.phone_number.clone()
        }
    }
}

/// A set of SID / auth-token credentials for the Twilio API, owned by
/// exactly one user account.
///
/// Useful when a deployment spans more than one Twilio account, or when
/// users bring their own credentials.  The token is opaque at this layer:
/// stored and returned, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Credential {
    pub id: i32,
    pub name: String,
    pub account_sid: String,
    pub auth_token: String,
    /// The owning user account.  At most one credential set per user.
    pub user_id: i32,
}

impl Credential {
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.name, self.account_sid)
    }
}

/// A TwiML document written on the fly and served from storage, so response
/// markup can change without a deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Twiml {
    pub id: i32,
    pub name: String,
    /// Raw TwiML body.  Not checked for well-formedness; if it is not valid
    /// markup, [`Twiml::to_xml`] is correspondingly invalid.
    pub twiml: String,
    /// Whether the document is externally servable.
    pub public: bool,
    /// Slug segment under which a routing layer serves this document.  Not
    /// validated for URL-safety, and duplicates are permitted.
    pub url: String,
}

impl Twiml {
    pub fn display_name(&self) -> String {
        format!("TwiML - {}", self.name)
    }

    /// The routable path for this document.
    pub fn generated_url(&self) -> String {
        format!("{TWIML_PATH_PREFIX}{}/", self.url)
    }

    /// The full served document: the fixed XML prolog directly followed by
    /// the raw body, with no separator inserted.
    pub fn to_xml(&self) -> String {
        format!("{XML_PROLOG}{}", self.twiml)
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), RecordError> {
    if value.chars().count() > max {
        return Err(validation(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(())
}

fn check_required(field: &'static str, value: &str) -> Result<(), RecordError> {
    if value.is_empty() {
        return Err(validation(format!("{field} is required")));
    }
    Ok(())
}

/// Fail fast on oversized or missing credential fields rather than letting
/// the storage layer truncate them.
pub(crate) fn validate_credential(
    name: &str,
    account_sid: &str,
    auth_token: &str,
) -> Result<(), RecordError> {
    check_required("name", name)?;
    check_required("account_sid", account_sid)?;
    check_required("auth_token", auth_token)?;
    check_len("name", name, limits::NAME_MAX)?;
    check_len("account_sid", account_sid, limits::ACCOUNT_SID_MAX)?;
    check_len("auth_token", auth_token, limits::AUTH_TOKEN_MAX)?;
    Ok(())
}

/// Length limits only; the body and slug are otherwise accepted as-is.
pub(crate) fn validate_twiml(name: &str, twiml: &str, url: &str) -> Result<(), RecordError> {
    check_required("name", name)?;
    check_required("twiml", twiml)?;
    check_required("url", url)?;
    check_len("name", name, limits::NAME_MAX)?;
    check_len("twiml", twiml, limits::TWIML_MAX)?;
    check_len("url", url, limits::URL_MAX)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_display_name_plain() {
        let caller = Caller {
            id: 1,
            phone_number: "+12223334444".to_string(),
            blacklisted: false,
        };
        assert_eq!(caller.display_name(), "+12223334444");
        assert!(!caller.display_name().contains("blacklisted"));
    }

    #[test]
    fn test_caller_display_name_blacklisted() {
        let caller = Caller {
            id: 1,
            phone_number: "+12223334444".to_string(),
            blacklisted: true,
        };
        assert_eq!(caller.display_name(), "+12223334444 (blacklisted)");
    }

    #[test]
    fn test_caller_display_name_tracks_current_fields() {
        let mut caller = Caller {
            id: 1,
            phone_number: "+12223334444".to_string(),
            blacklisted: false,
        };
        assert!(!caller.display_name().contains("blacklisted"));
        caller.blacklisted = true;
        assert!(caller.display_name().ends_with(" (blacklisted)"));
    }

    #[test]
    fn test_credential_display_name() {
        let creds = Credential {
            id: 1,
            name: "Test Creds".to_string(),
            account_sid: "XXX".to_string(),
            auth_token: "YYY".to_string(),
            user_id: 7,
        };
        assert_eq!(creds.display_name(), "Test Creds - XXX");
    }

    #[test]
    fn test_twiml_display_name() {
        let twiml = Twiml {
            id: 1,
            name: "call forwarding".to_string(),
            twiml: "<Response/>".to_string(),
            public: true,
            url: "forwarding".to_string(),
        };
        assert_eq!(twiml.display_name(), "TwiML - call forwarding");
    }

    #[test]
    fn test_twiml_generated_url() {
        let twiml = Twiml {
            id: 1,
            name: "call forwarding".to_string(),
            twiml: "<Response/>".to_string(),
            public: true,
            url: "forwarding".to_string(),
        };
        assert_eq!(twiml.generated_url(), "/twiml/forwarding/");
    }

    #[test]
    fn test_twiml_to_xml_prefixes_prolog_directly() {
        let twiml = Twiml {
            id: 1,
            name: "call forwarding".to_string(),
            twiml: "<Response><Dial>+123456789</Dial></Response>".to_string(),
            public: true,
            url: "forwarding".to_string(),
        };
        assert_eq!(
            twiml.to_xml(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Dial>+123456789</Dial></Response>"
        );
    }

    #[test]
    fn test_twiml_to_xml_does_not_touch_body() {
        // Not well-formed markup; served verbatim anyway.
        let twiml = Twiml {
            id: 1,
            name: "broken".to_string(),
            twiml: "<Response><Dial>".to_string(),
            public: false,
            url: "broken".to_string(),
        };
        assert_eq!(
            twiml.to_xml(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Dial>"
        );
    }

    #[test]
    fn test_validate_credential_limits() {
        assert!(validate_credential("Test Creds", "XXX", "YYY").is_ok());
        assert!(validate_credential(&"n".repeat(31), "XXX", "YYY").is_err());
        assert!(validate_credential("n", &"s".repeat(35), "YYY").is_err());
        assert!(validate_credential("n", "XXX", &"t".repeat(33)).is_err());
        assert!(validate_credential("", "XXX", "YYY").is_err());
    }

    #[test]
    fn test_validate_twiml_limits() {
        assert!(validate_twiml("sms reply", "<Response/>", "messaging").is_ok());
        assert!(validate_twiml("sms reply", &"x".repeat(201), "messaging").is_err());
        assert!(validate_twiml("sms reply", "<Response/>", &"u".repeat(31)).is_err());
        assert!(validate_twiml("sms reply", "", "messaging").is_err());
    }
}
