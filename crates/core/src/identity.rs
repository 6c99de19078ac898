//! Job identity resolution and persistence.
//!
//! The active [`JobIdentity`] is mirrored in two places: the session's
//! navigation state (the `id0` query parameter) and an expiring cookie.
//! [`IdentityResolver`] owns both and is the only writer; every change
//! goes through [`IdentityResolver::set`].

use std::collections::HashMap;

use chrono::{Duration, Utc};

use crate::error::CoreError;
use crate::types::{JobIdentity, Timestamp};

/// Query parameter and cookie name carrying the identity.
pub const IDENTITY_KEY: &str = "id0";

/// Lifetime of the identity cookie, refreshed on every write.
pub const IDENTITY_COOKIE_TTL_DAYS: i64 = 7;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Named, expiring key-value persistence (a cookie jar).
pub trait CookieStore {
    /// Current value, or `None` when unset or expired.
    fn get(&self, name: &str) -> Option<String>;

    /// Write `value` with the given lifetime, replacing any previous value.
    fn set(&mut self, name: &str, value: &str, ttl: Duration) -> Result<(), CoreError>;
}

/// Session navigation state: the current location plus a history stack.
pub trait Navigation {
    /// Path component of the current location, e.g. `/`.
    fn path(&self) -> &str;

    /// Query parameters of the current location, in order.
    fn query(&self) -> &[(String, String)];

    /// Push a new history entry and make `url` the current location.
    fn push_state(&mut self, state: &str, url: &str);

    fn query_param(&self, name: &str) -> Option<&str> {
        self.query()
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// In-memory adapters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires: Timestamp,
}

/// Cookie jar held in memory. Used by tests and one-shot sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieStore {
    cookies: HashMap<String, StoredCookie>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expiry of a stored cookie, if any.
    pub fn expires(&self, name: &str) -> Option<Timestamp> {
        self.cookies.get(name).map(|c| c.expires)
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .get(name)
            .filter(|c| c.expires > Utc::now())
            .map(|c| c.value.clone())
    }

    fn set(&mut self, name: &str, value: &str, ttl: Duration) -> Result<(), CoreError> {
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires: Utc::now() + ttl,
            },
        );
        Ok(())
    }
}

/// One pushed history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub state: String,
    pub url: String,
}

/// Navigation state for a session that has no browser behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistory {
    path: String,
    query: Vec<(String, String)>,
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    /// Start at `location`, a path with an optional `?query`.
    pub fn new(location: &str) -> Self {
        let (path, query) = split_location(location);
        Self {
            path,
            query,
            entries: Vec::new(),
        }
    }

    /// Start at `/`, carrying `id0` in the query when given.
    pub fn with_identity(id0: Option<&str>) -> Self {
        let query = id0
            .map(|v| vec![(IDENTITY_KEY.to_string(), v.to_string())])
            .unwrap_or_default();
        Self {
            path: "/".to_string(),
            query,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Current location rendered as `path[?query]`.
    pub fn location(&self) -> String {
        build_location(&self.path, &self.query)
    }
}

impl Navigation for SessionHistory {
    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self) -> &[(String, String)] {
        &self.query
    }

    fn push_state(&mut self, state: &str, url: &str) {
        let (path, query) = split_location(url);
        self.path = path;
        self.query = query;
        self.entries.push(HistoryEntry {
            state: state.to_string(),
            url: url.to_string(),
        });
    }
}

fn split_location(location: &str) -> (String, Vec<(String, String)>) {
    let (path, query) = location.split_once('?').unwrap_or((location, ""));
    let pairs = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let path = if path.is_empty() { "/" } else { path };
    (path.to_string(), pairs)
}

fn build_location(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query)
        .finish();
    format!("{path}?{encoded}")
}

// ---------------------------------------------------------------------------
// IdentityResolver
// ---------------------------------------------------------------------------

/// Single owner of the active job identity.
pub struct IdentityResolver<C, N> {
    cookies: C,
    navigation: N,
    current: Option<JobIdentity>,
}

impl<C: CookieStore, N: Navigation> IdentityResolver<C, N> {
    pub fn new(cookies: C, navigation: N) -> Self {
        Self {
            cookies,
            navigation,
            current: None,
        }
    }

    /// Load the identity: the `id0` query parameter wins, the cookie is
    /// the fallback. The result is written back through [`set`](Self::set)
    /// so both stores agree afterwards.
    pub fn load(&mut self) -> Option<JobIdentity> {
        let raw = match self.navigation.query_param(IDENTITY_KEY) {
            Some(value) => Some(value.to_string()),
            None => self.cookies.get(IDENTITY_KEY),
        };
        let identity = raw.and_then(JobIdentity::new);
        self.set(identity.clone());
        identity
    }

    /// Replace the active identity (never merges).
    ///
    /// A non-empty identity pushes a history entry with `id0` in the
    /// query. Clearing pushes a bare entry only when an identity was held,
    /// so repeated resets do not stack blank entries. The cookie is
    /// rewritten either way.
    pub fn set(&mut self, identity: Option<JobIdentity>) {
        match &identity {
            Some(id) => {
                let mut query: Vec<(String, String)> = self
                    .navigation
                    .query()
                    .iter()
                    .filter(|(k, _)| k != IDENTITY_KEY)
                    .cloned()
                    .collect();
                query.push((IDENTITY_KEY.to_string(), id.as_str().to_string()));
                let url = build_location(self.navigation.path(), &query);
                self.navigation.push_state(id.as_str(), &url);
            }
            None => {
                if self.current.is_some() {
                    let url = self.navigation.path().to_string();
                    self.navigation.push_state("", &url);
                }
            }
        }

        let value = identity.as_ref().map(JobIdentity::as_str).unwrap_or("");
        if let Err(e) = self.cookies.set(
            IDENTITY_KEY,
            value,
            Duration::days(IDENTITY_COOKIE_TTL_DAYS),
        ) {
            tracing::warn!(error = %e, "Failed to persist job identity cookie");
        }

        tracing::debug!(
            id0 = identity.as_ref().map(JobIdentity::as_str).unwrap_or(""),
            "Job identity updated"
        );
        self.current = identity;
    }

    pub fn current(&self) -> Option<&JobIdentity> {
        self.current.as_ref()
    }

    pub fn cookies(&self) -> &C {
        &self.cookies
    }

    pub fn navigation(&self) -> &N {
        &self.navigation
    }
}
