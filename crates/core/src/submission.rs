//! Mii job submissions and field-level feedback.
//!
//! The checks in [`ResolvedSubmission::validate`] mirror the service's
//! own rules so obviously bad input never leaves the client. Any
//! `invalid:` response from the service is still honoured.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Form field names as the service knows them.
pub const FIELD_ID0: &str = "id0";
pub const FIELD_MODEL: &str = "model";
pub const FIELD_YEAR: &str = "year";
pub const FIELD_MII_FILE: &str = "mii_file";
pub const FIELD_MII_URL: &str = "mii_url";

/// Service-side name covering whichever Mii input was used.
const FIELD_MII: &str = "mii";

/// Accepted console models.
pub const VALID_MODELS: &[&str] = &["old", "new"];

/// Inclusive range of accepted console manufacture years.
pub const MIN_YEAR: i32 = 2011;
pub const MAX_YEAR: i32 = 2020;

/// File name used for the uploaded Mii part when the source was a URL.
pub const FETCHED_MII_FILE_NAME: &str = "mii.bin";

static ID0_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-fA-F0-9]{32}$").expect("valid regex"));

/// Set of form inputs flagged invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFeedback {
    invalid: BTreeSet<String>,
}

impl FormFeedback {
    /// Parse a comma-separated field list (the part after `invalid:`).
    ///
    /// `mii` flags both the file and URL inputs.
    pub fn from_field_list(fields: &str) -> Self {
        let mut feedback = Self::default();
        for field in fields.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            feedback.flag(field);
        }
        feedback
    }

    pub fn flag(&mut self, field: &str) {
        if field == FIELD_MII {
            self.invalid.insert(FIELD_MII_FILE.to_string());
            self.invalid.insert(FIELD_MII_URL.to_string());
        } else {
            self.invalid.insert(field.to_string());
        }
    }

    pub fn is_invalid(&self, field: &str) -> bool {
        self.invalid.contains(field)
    }

    pub fn is_empty(&self) -> bool {
        self.invalid.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.invalid.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.invalid.clear();
    }
}

/// Where the Mii payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiiSource {
    /// Inline upload.
    File { file_name: String, bytes: Vec<u8> },
    /// Remote URL whose bytes are fetched before submission.
    Url(String),
}

/// A submission as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiiSubmission {
    pub id0: String,
    pub model: String,
    /// Empty or absent means "unknown year".
    pub year: Option<String>,
    pub source: MiiSource,
}

impl MiiSubmission {
    /// Attach the payload, turning a URL source into concrete bytes.
    pub fn resolve(self, file_name: String, mii: Vec<u8>) -> ResolvedSubmission {
        ResolvedSubmission {
            id0: self.id0,
            model: self.model,
            year: self.year.filter(|y| !y.trim().is_empty()),
            file_name,
            mii,
        }
    }
}

/// A submission whose Mii payload is in memory, ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubmission {
    pub id0: String,
    pub model: String,
    pub year: Option<String>,
    pub file_name: String,
    pub mii: Vec<u8>,
}

impl ResolvedSubmission {
    /// Check every field, collecting all failures at once.
    pub fn validate(&self) -> Result<(), FormFeedback> {
        let mut feedback = FormFeedback::default();

        if !is_id0(&self.id0) {
            feedback.flag(FIELD_ID0);
        }
        if !VALID_MODELS.contains(&self.model.to_lowercase().as_str()) {
            feedback.flag(FIELD_MODEL);
        }
        if let Some(year) = &self.year {
            match year.trim().parse::<i32>() {
                Ok(y) if (MIN_YEAR..=MAX_YEAR).contains(&y) => {}
                _ => feedback.flag(FIELD_YEAR),
            }
        }
        if self.mii.is_empty() {
            feedback.flag(FIELD_MII);
        }

        if feedback.is_empty() {
            Ok(())
        } else {
            Err(feedback)
        }
    }
}

/// Whether `value` looks like an id0 (32 hex characters).
pub fn is_id0(value: &str) -> bool {
    ID0_RE.is_match(value)
}
