//! File-backed cookie jar so the job identity survives process restarts
//! the way a browser cookie survives page reloads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use miimine_core::error::CoreError;
use miimine_core::identity::CookieStore;
use miimine_core::types::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CookieEntry {
    value: String,
    expires: Timestamp,
}

/// Cookie jar persisted as a JSON file.
///
/// A missing or unreadable file starts an empty jar; writes rewrite the
/// whole file, creating parent directories as needed.
#[derive(Debug)]
pub struct FileCookieStore {
    path: PathBuf,
    cookies: HashMap<String, CookieEntry>,
}

impl FileCookieStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cookies = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt cookie jar");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, cookies }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::Persistence(format!("{}: {e}", parent.display())))?;
        }
        let text = serde_json::to_string_pretty(&self.cookies)
            .map_err(|e| CoreError::Persistence(e.to_string()))?;
        std::fs::write(&self.path, text)
            .map_err(|e| CoreError::Persistence(format!("{}: {e}", self.path.display())))
    }
}

impl CookieStore for FileCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .get(name)
            .filter(|c| c.expires > Utc::now())
            .map(|c| c.value.clone())
    }

    fn set(&mut self, name: &str, value: &str, ttl: Duration) -> Result<(), CoreError> {
        // Drop anything already expired while rewriting.
        let now = Utc::now();
        self.cookies.retain(|_, c| c.expires > now);
        self.cookies.insert(
            name.to_string(),
            CookieEntry {
                value: value.to_string(),
                expires: now + ttl,
            },
        );
        self.save()
    }
}
