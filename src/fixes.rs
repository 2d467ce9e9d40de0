//! Extraction of fixed bug ids from commit messages.
//!
//! Two notations are recognised, checked in order:
//! - free-form: `(fixes bug 42)`, `(fixes bugs 42, 84)`
//! - structured: `[bug=42]`, `[bug 42]`, `[bugs=42,84]`
//!
//! Only the first match of the first notation found counts. A bug number
//! that is merely mentioned is not a fix.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::milestone::ItemId;

fn freeform_regex() -> &'static Regex {
    static FREEFORM_RE: OnceLock<Regex> = OnceLock::new();
    FREEFORM_RE.get_or_init(|| {
        Regex::new(r"(?i)\(fixes bugs? (\d+(?:,\s*\d+)*)\)")
            .expect("free-form fix regex should compile")
    })
}

fn structured_regex() -> &'static Regex {
    static STRUCTURED_RE: OnceLock<Regex> = OnceLock::new();
    STRUCTURED_RE.get_or_init(|| {
        Regex::new(r"(?i)\[bugs?[= ](\d+(?:,\s*\d+)*)\]")
            .expect("structured fix regex should compile")
    })
}

/// Bug ids a commit message claims to fix, ascending.
pub fn fixed_bug_ids(message: &str) -> BTreeSet<ItemId> {
    let normalized = message.split_whitespace().collect::<Vec<_>>().join(" ");
    let captures = freeform_regex()
        .captures(&normalized)
        .or_else(|| structured_regex().captures(&normalized));

    let Some(captures) = captures else {
        return BTreeSet::new();
    };
    captures
        .get(1)
        .map(|list| {
            list.as_str()
                .split(',')
                .filter_map(|id| {
                    let id = id.trim();
                    match id.parse::<ItemId>() {
                        Ok(id) => Some(id),
                        Err(err) => {
                            tracing::debug!(id, %err, "fixed bug number is not a valid id");
                            None
                        }
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}
