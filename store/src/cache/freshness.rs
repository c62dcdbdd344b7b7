//! Freshness arithmetic: the decision function that combines `since`, the
//! session epoch, and a bookkeeping tag's recorded timestamp into a
//! refill/no-refill verdict.

use assetgraph_core::Timestamp;
use std::time::Duration;

/// `true` iff `since` asks for data predating this `CacheRepo`'s session
/// epoch (or the whole-history sentinel, `since_epoch()`, which is always
/// less than any real `start`). A query answered entirely from the cache
/// store without authority consultation requires `!is_whole_history`.
pub fn is_whole_history(since: Timestamp, start: Timestamp) -> bool {
    since < start
}

/// The unusual "fresh?" polarity a bookkeeping tag's age decides:
/// `true` means the tag is older than `freq` and so is **due for
/// refresh**, not that the data is still good. Callers that want ordinary
/// "is this still fresh" phrasing must negate this themselves; the
/// inversion is preserved here deliberately rather than flipped, so a
/// reader who already knows the protocol recognizes it on sight.
pub fn is_due_for_refresh(tag_timestamp: Timestamp, freq: Duration, now: Timestamp) -> bool {
    let freq = chrono::Duration::from_std(freq).unwrap_or(chrono::Duration::zero());
    tag_timestamp + freq < now
}

/// Dedup test for tag creation: `true` iff `tag_timestamp` is still within
/// `freq` of `now`, strictly — at the exact boundary instant
/// (`tag_timestamp + freq == now`) a new tag is still created. This is
/// deliberately not `!is_due_for_refresh`, whose `<` gives a non-strict
/// `>=` boundary instead.
pub fn is_fresh_for_dedup(tag_timestamp: Timestamp, freq: Duration, now: Timestamp) -> bool {
    let freq = chrono::Duration::from_std(freq).unwrap_or(chrono::Duration::zero());
    tag_timestamp + freq > now
}

/// Freshness test for the refill-tracking tags (`cache_get_entity_tags`,
/// `cache_incoming_edges`, `cache_outgoing_edges`,
/// `cache_find_entities_by_type`), whose `timestamp` field holds the
/// oldest `since` watermark covered by a prior refill rather than a bind
/// time. A refill is due if no such tag exists yet, or if it covers a
/// narrower window than what's now being asked for (`recorded > since`
/// means the caller wants data older than what was last fetched).
pub fn is_refill_due_for_since(recorded: Option<Timestamp>, since: Timestamp) -> bool {
    match recorded {
        None => true,
        Some(recorded_since) => recorded_since > since,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn whole_history_iff_before_start() {
        let start = assetgraph_core::now();
        let earlier = start - ChronoDuration::seconds(1);
        let later = start + ChronoDuration::seconds(1);
        assert!(is_whole_history(earlier, start));
        assert!(is_whole_history(assetgraph_core::since_epoch(), start));
        assert!(!is_whole_history(later, start));
        assert!(!is_whole_history(start, start));
    }

    #[test]
    fn due_for_refresh_once_freq_has_elapsed() {
        let tagged_at = assetgraph_core::now() - ChronoDuration::seconds(120);
        let freq = Duration::from_secs(60);
        assert!(is_due_for_refresh(tagged_at, freq, assetgraph_core::now()));
    }

    #[test]
    fn not_due_for_refresh_within_freq() {
        let tagged_at = assetgraph_core::now();
        let freq = Duration::from_secs(60);
        assert!(!is_due_for_refresh(tagged_at, freq, assetgraph_core::now()));
    }

    #[test]
    fn fresh_for_dedup_is_a_strict_boundary() {
        let now = assetgraph_core::now();
        let freq = Duration::from_secs(60);
        assert!(is_fresh_for_dedup(now, freq, now + ChronoDuration::seconds(59)));
        assert!(!is_fresh_for_dedup(now, freq, now + ChronoDuration::seconds(60)));
        assert!(!is_fresh_for_dedup(now, freq, now + ChronoDuration::seconds(61)));
    }

    #[test]
    fn refill_due_when_tag_absent_or_narrower_than_requested() {
        let now = assetgraph_core::now();
        let narrower = now - ChronoDuration::seconds(10);
        let wider = now - ChronoDuration::seconds(100);
        assert!(is_refill_due_for_since(None, now));
        assert!(is_refill_due_for_since(Some(narrower), wider));
        assert!(!is_refill_due_for_since(Some(wider), narrower));
        assert!(!is_refill_due_for_since(Some(wider), wider));
    }
}
