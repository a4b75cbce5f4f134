//! MQTT topic ACL matching.
//!
//! Matches concrete topic names against the comma-separated pattern
//! lists stored on each user. The rules are deliberately permissive:
//! `#` is only meaningful as the sole pattern or as a trailing `/#`
//! multi-level wildcard; anywhere else it is treated as a literal
//! character. Malformed patterns are never rejected or rewritten.

/// Check whether `topic` matches a single ACL `pattern`.
///
/// Rules, in precedence order:
/// 1. Exact string equality.
/// 2. The pattern `#` alone matches everything.
/// 3. A pattern ending in `/#` matches the prefix itself or anything
///    below it (`a/#` matches `a`, `a/b`, `a/b/c`).
/// 4. A pattern containing `+` matches level-by-level; segment counts
///    must be equal and `+` stands in for exactly one level.
/// 5. Otherwise there is no match.
pub fn matches(topic: &str, pattern: &str) -> bool {
    if topic == pattern {
        return true;
    }

    if pattern == "#" {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix("/#") {
        return topic == prefix || topic.starts_with(&format!("{prefix}/"));
    }

    if pattern.contains('+') {
        let topic_levels: Vec<&str> = topic.split('/').collect();
        let pattern_levels: Vec<&str> = pattern.split('/').collect();

        if topic_levels.len() != pattern_levels.len() {
            return false;
        }

        return pattern_levels
            .iter()
            .zip(topic_levels.iter())
            .all(|(p, t)| *p == "+" || p == t);
    }

    false
}

/// Check whether `topic` matches at least one of `patterns`.
pub fn is_allowed(topic: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|pattern| matches(topic, pattern))
}

/// Split a comma-separated ACL list into trimmed, non-empty patterns.
pub fn split_patterns(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
