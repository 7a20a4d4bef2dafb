//! Display-name matching between the configured allow-list and live groups.

/// Normalize a display name for comparison: trim surrounding whitespace and
/// lowercase. Both sides of every comparison go through this, so casing or
/// trailing-space drift in the live server never silently excludes a group.
#[must_use]
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Exact equality after normalization. No fuzzy or substring matching.
///
/// An empty configured name never matches anything.
#[must_use]
pub fn matches(configured: &str, live: &str) -> bool {
    let configured = normalize(configured);
    !configured.is_empty() && configured == normalize(live)
}
