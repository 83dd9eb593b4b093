//! Sensitivity heuristic for intercepted form submissions.
//!
//! Two independent signals are computed: whether the target URL looks like a
//! login/form endpoint, and whether the payload mentions a credential or PII
//! key. Only the key signal decides extraction; the URL signal is reported
//! alongside it for diagnostics.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// URL fragments typical of authentication and form endpoints.
pub const URL_PARAMETERS: &[&str] = &[
    // Authentication
    "login", "signin", "auth", "register", "ap/", "account", "signup", "session", "oauth",
    // Forms and contact
    "form", "submit", "entry", "contact", "profile", "post", "feedback", "setting", "edit",
    "update",
];

/// Credential and personal-data key names.
pub const KEY_PARAMETERS: &[&str] = &[
    // Identity
    "user_id", "userid", "username", "login_id",
    // Passwords
    "password", "passwd", "pwd", "pw",
    // Contact
    "email", "phone",
    // Session credentials
    "access_token", "session_id",
    // Personal data
    "first_name", "last_name",
    // OAuth / API secrets
    "client_secret", "refresh_token", "bearer",
];

/// Which signals fired for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Only the URL looked sensitive.
    Url,
    /// Only the payload keys looked sensitive.
    Key,
    /// Both signals fired.
    Both,
    /// Neither signal fired.
    Neither,
}

impl Signal {
    fn from_flags(has_url: bool, has_key: bool) -> Self {
        match (has_url, has_key) {
            (true, true) => Self::Both,
            (true, false) => Self::Url,
            (false, true) => Self::Key,
            (false, false) => Self::Neither,
        }
    }
}

/// Outcome of the sensitivity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionDecision {
    /// Whether the payload should be written to the audit log.
    pub extract: bool,
    /// The signals behind the decision.
    pub signal: Signal,
}

impl ExtractionDecision {
    /// Applies the gate table to the two signals.
    ///
    /// | url   | key   | extract |
    /// |-------|-------|---------|
    /// | true  | true  | yes     |
    /// | true  | false | no      |
    /// | false | true  | yes     |
    /// | false | false | no      |
    pub fn from_signals(has_url: bool, has_key: bool) -> Self {
        let extract = match (has_url, has_key) {
            (true, true) => true,
            (true, false) => false,
            (false, true) => true,
            (false, false) => false,
        };
        Self {
            extract,
            signal: Signal::from_flags(has_url, has_key),
        }
    }
}

/// Pre-compiled sensitivity heuristic.
#[derive(Debug, Clone)]
pub struct SensitivityHeuristic {
    key_pattern: Regex,
}

impl SensitivityHeuristic {
    /// Creates the heuristic with the built-in key list.
    pub fn new() -> Self {
        // ASCII word boundaries: `mypassword` and `pw2` do not match.
        let pattern = format!(r"(?-u:\b)({})(?-u:\b)", KEY_PARAMETERS.join("|"));
        Self {
            key_pattern: Regex::new(&pattern).expect("Invalid key pattern"),
        }
    }

    /// Returns true if `url` contains one of [`URL_PARAMETERS`] (case-sensitive).
    pub fn has_url_parameter(&self, url: &str) -> bool {
        URL_PARAMETERS.iter().any(|fragment| url.contains(fragment))
    }

    /// Returns true if `payload` mentions one of [`KEY_PARAMETERS`] as a whole word.
    pub fn has_key_parameter(&self, payload: &str) -> bool {
        self.key_pattern.is_match(payload)
    }

    /// Returns the first key name found in `payload`.
    pub fn matched_key<'a>(&self, payload: &'a str) -> Option<&'a str> {
        self.key_pattern.find(payload).map(|m| m.as_str())
    }

    /// Evaluates both signals and the gate.
    pub fn decide(&self, url: &str, payload: &str) -> ExtractionDecision {
        ExtractionDecision::from_signals(self.has_url_parameter(url), self.has_key_parameter(payload))
    }
}

impl Default for SensitivityHeuristic {
    fn default() -> Self {
        Self::new()
    }
}
