//! Cache hint policy.
//!
//! Backends cap the number of cache breakpoints per request, so only the
//! tails of the two most recent user turns are marked.

use crate::{CacheDirective, Content, ModelDescriptor, Role, Turn};
use std::borrow::Cow;

/// Mark the last part of the last and second-to-last user turns as
/// cacheable.
///
/// Returns the input unchanged when the model does not accept cache hints.
/// Otherwise returns a derived list; the caller's turns are never mutated.
pub fn apply_cache_hints<'t>(turns: &'t [Turn], descriptor: &ModelDescriptor) -> Cow<'t, [Turn]> {
    if !descriptor.supports_cache_hints {
        return Cow::Borrowed(turns);
    }

    let targets = cache_targets(turns);
    if targets.is_empty() {
        return Cow::Borrowed(turns);
    }

    let hinted = turns
        .iter()
        .enumerate()
        .map(|(index, turn)| {
            if !targets.contains(&index) {
                return turn.clone();
            }

            let mut parts = turn.content.clone().into_parts();
            if let Some(last) = parts.last_mut() {
                last.cache = Some(CacheDirective::Ephemeral);
            }
            Turn {
                role: turn.role,
                content: Content::Parts(parts),
            }
        })
        .collect();
    Cow::Owned(hinted)
}

/// Indices of the last and second-to-last user turns, most recent first.
pub fn cache_targets(turns: &[Turn]) -> Vec<usize> {
    turns
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, turn)| turn.role == Role::User)
        .map(|(index, _)| index)
        .take(2)
        .collect()
}
