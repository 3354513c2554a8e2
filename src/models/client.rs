//! Client identifiers.
//!
//! A client name doubles as a directory name and a database key, so it is
//! restricted to a kebab-case slug: lowercase ASCII letters and digits in
//! groups joined by single hyphens.

use crate::errors::{AppError, AppResult};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

const SLUG_PATTERN: &str = r"^[a-z0-9]+(-[a-z0-9]+)*$";

static SLUG: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(SLUG_PATTERN));

/// Validated client slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientName(String);

impl ClientName {
    pub fn parse(raw: &str) -> AppResult<Self> {
        if is_valid_slug(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(AppError::InvalidClient(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_valid_slug(raw: &str) -> bool {
    SLUG.as_ref().is_ok_and(|re| re.is_match(raw))
}
