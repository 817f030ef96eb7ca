//! `{{TOKEN}}` substitution for dashboard text fields.
//!
//! Applied only to freshly cloned dashboards; the derived title that
//! serves as the clone-idempotency key is never substituted.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z0-9_]+)\}\}").expect("valid pattern"));

/// Replaces placeholders like `{{PROJECT_ID}}` with provided token
/// values. Unmatched placeholders are left as-is.
#[derive(Debug, Clone)]
pub struct TokenSubstituter {
    tokens: BTreeMap<String, String>,
}

impl TokenSubstituter {
    pub fn new(tokens: BTreeMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn substitute(&self, text: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures<'_>| {
                self.tokens
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}
