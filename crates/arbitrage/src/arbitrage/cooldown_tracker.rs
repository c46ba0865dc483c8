//! Suppresses re-detecting (and re-executing) the same opportunity within a
//! short window, keyed on the sorted, joined set of token ids it touches.

use parking_lot::RwLock;
use std::collections::HashMap;

use super::types::Opportunity;

/// Tracks last-execution timestamps per token-id set to suppress repeat fires.
pub struct CooldownTracker {
    last_seen_ms: RwLock<HashMap<String, i64>>,
    cooldown_ms: i64,
}

fn cooldown_key(token_ids: &[String]) -> String {
    let mut sorted = token_ids.to_vec();
    sorted.sort();
    sorted.join(",")
}

impl CooldownTracker {
    #[must_use]
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            last_seen_ms: RwLock::new(HashMap::new()),
            cooldown_ms,
        }
    }

    /// True if this opportunity's token set fired within `cooldown_ms`.
    #[must_use]
    pub fn is_suppressed(&self, opp: &Opportunity, now_ms: i64) -> bool {
        let key = cooldown_key(&opp.token_ids());
        match self.last_seen_ms.read().get(&key) {
            Some(last) => now_ms - last < self.cooldown_ms,
            None => false,
        }
    }

    /// Records this opportunity's token set as having just fired.
    pub fn record(&self, opp: &Opportunity, now_ms: i64) {
        let key = cooldown_key(&opp.token_ids());
        self.last_seen_ms.write().insert(key, now_ms);
    }

    /// Drops entries older than `2 * cooldown_ms`, bounding memory growth.
    pub fn prune(&self, now_ms: i64) {
        let horizon = 2 * self.cooldown_ms;
        self.last_seen_ms
            .write()
            .retain(|_, last| now_ms - *last < horizon);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.last_seen_ms.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
