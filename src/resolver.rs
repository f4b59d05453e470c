//! Instance resolver — user tokens to concrete running-instance ids.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::channel::InventoryLookup;
use crate::logging::LogSink;

/// Returns `true` if `token` is an explicit instance id (`i-<hex>`).
///
/// Such tokens are trusted verbatim — no existence check is made.
#[must_use]
pub fn is_instance_id(token: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)] // compile-time constant pattern
    let re = PATTERN.get_or_init(|| Regex::new(r"^i-[0-9a-fA-F]+$").expect("valid pattern"));
    re.is_match(token)
}

/// Resolve a mixed list of instance ids and `Name` tags to a deduplicated,
/// order-preserving list of running-instance ids.
///
/// A symbolic token matching nothing, or a lookup that fails outright, is
/// logged as a warning and skipped — it never aborts resolution of the
/// remaining tokens.
pub async fn resolve(
    inventory: &impl InventoryLookup,
    tokens: &[String],
    log: &LogSink,
) -> Vec<String> {
    let mut out = Vec::new();
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if is_instance_id(token) {
            out.push(token.to_string());
            continue;
        }
        match inventory.instances_by_name(token).await {
            Ok(ids) if ids.is_empty() => {
                log.warn(&format!("No running instance found with Name tag '{token}'"));
            }
            Ok(ids) => out.extend(ids),
            Err(e) => log.warn(&format!("Error resolving '{token}': {e:#}")),
        }
    }
    dedupe(out)
}

/// Drop repeated ids, keeping first-seen order.
fn dedupe(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Split a comma-separated `--instances` value into trimmed tokens.
#[must_use]
pub fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
