//! Staleness-gated cache of the freshest order book per token.

use parking_lot::RwLock;
use std::collections::HashMap;

use super::types::OrderBook;

/// Thread-safe cache returning a book only while it is fresh enough to trade on.
pub struct BookCache {
    books: RwLock<HashMap<String, OrderBook>>,
    max_age_ms: i64,
}

impl BookCache {
    #[must_use]
    pub fn new(max_age_ms: i64) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            max_age_ms,
        }
    }

    /// `maxAgeMs = max(2*pollingIntervalMs + 200, totalTokenIds*150 + 2000)` —
    /// the more generous of the source's two staleness formulas.
    #[must_use]
    pub fn recommended_max_age_ms(polling_interval_ms: i64, total_token_ids: i64) -> i64 {
        let from_polling = 2 * polling_interval_ms + 200;
        let from_fanout = total_token_ids * 150 + 2000;
        from_polling.max(from_fanout)
    }

    pub fn set(&self, book: OrderBook) {
        self.books.write().insert(book.token_id.clone(), book);
    }

    /// Returns a clone of the book only if it's within `max_age_ms` of `now_ms`.
    #[must_use]
    pub fn get(&self, token_id: &str, now_ms: i64) -> Option<OrderBook> {
        let guard = self.books.read();
        let book = guard.get(token_id)?;
        if now_ms - book.last_updated_ms <= self.max_age_ms {
            Some(book.clone())
        } else {
            None
        }
    }

    /// Returns a clone of every book currently within the freshness window.
    #[must_use]
    pub fn get_all(&self, now_ms: i64) -> HashMap<String, OrderBook> {
        self.books
            .read()
            .iter()
            .filter(|(_, book)| now_ms - book.last_updated_ms <= self.max_age_ms)
            .map(|(id, book)| (id.clone(), book.clone()))
            .collect()
    }

    #[must_use]
    pub fn max_age_ms(&self) -> i64 {
        self.max_age_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, last_updated_ms: i64) -> OrderBook {
        OrderBook::new(id, last_updated_ms)
    }

    #[test]
    fn get_returns_fresh_book() {
        let cache = BookCache::new(1_000);
        cache.set(book("a", 0));
        assert!(cache.get("a", 500).is_some());
    }

    // invariant I7: BookCache.get(id) returns a book => now - lastUpdatedMs <= maxAgeMs
    #[test]
    fn get_returns_none_for_stale_book() {
        let cache = BookCache::new(1_000);
        cache.set(book("a", 0));
        assert!(cache.get("a", 1_001).is_none());
    }

    #[test]
    fn get_returns_none_for_missing_token() {
        let cache = BookCache::new(1_000);
        assert!(cache.get("missing", 0).is_none());
    }

    #[test]
    fn get_all_filters_stale_entries() {
        let cache = BookCache::new(1_000);
        cache.set(book("fresh", 900));
        cache.set(book("stale", 0));
        let all = cache.get_all(1_000);
        assert!(all.contains_key("fresh"));
        assert!(!all.contains_key("stale"));
    }

    #[test]
    fn recommended_max_age_takes_the_larger_formula() {
        // polling formula: 2*1000+200=2200; fanout formula: 5*150+2000=2750
        assert_eq!(BookCache::recommended_max_age_ms(1_000, 5), 2750);
        // polling formula dominates with many iterations but few tokens
        assert_eq!(BookCache::recommended_max_age_ms(5_000, 2), 10_200);
    }

    #[test]
    fn set_overwrites_previous_book_for_same_token() {
        let cache = BookCache::new(1_000);
        cache.set(book("a", 0));
        cache.set(book("a", 500));
        assert_eq!(cache.get("a", 500).unwrap().last_updated_ms, 500);
    }
}
