//! Trust filter: decides whether an AP-class candidate ICAO (recovered from a
//! CRC that had the address XORed into it) is trustworthy enough to emit, and
//! tracks confirmed ICAOs so repeat sightings don't pay the confidence tax
//! again.
//!
//! AP-class downlinks (DF0/4/5/16/20/21/24) offer no independent parity check
//! on the address itself -- any random noise frame decodes to *some* 24-bit
//! "ICAO". Requiring repeated sightings before trusting a previously-unseen
//! value is what turns that noise into signal.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// How many corroborating AP-class sightings are required before an
/// unconfirmed ICAO is promoted to trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcaoConfidenceLevel {
    Low,
    Medium,
    High,
}

impl IcaoConfidenceLevel {
    pub fn threshold(self) -> u32 {
        match self {
            IcaoConfidenceLevel::Low => 1,
            IcaoConfidenceLevel::Medium => 2,
            IcaoConfidenceLevel::High => 5,
        }
    }
}

impl Default for IcaoConfidenceLevel {
    fn default() -> Self {
        IcaoConfidenceLevel::Medium
    }
}

struct CandidateRecord {
    last_seen: Instant,
    valid_frames: u32,
}

/// Trusted and candidate ICAO bookkeeping, safe for concurrent mutation by a
/// demodulation worker and an independent TTL-sweep timer.
pub struct TrustFilter {
    trusted: RwLock<HashMap<u32, Instant>>,
    candidates: RwLock<HashMap<u32, CandidateRecord>>,
    confidence: IcaoConfidenceLevel,
    timeout: Duration,
}

/// What the trust filter decided to do with an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustOutcome {
    /// Emit the frame; the ICAO is (now) trusted.
    Emit,
    /// Don't emit; the candidate hasn't reached the confidence threshold yet.
    Hold,
    /// Don't emit; parity failed outright (PI class only).
    Reject,
}

impl TrustFilter {
    pub fn new(confidence: IcaoConfidenceLevel, timeout: Duration) -> Self {
        Self {
            trusted: RwLock::new(HashMap::new()),
            candidates: RwLock::new(HashMap::new()),
            confidence,
            timeout,
        }
    }

    /// A PI-class frame with confirmed (zero-syndrome, or corrected) parity.
    /// Always promoted/refreshed immediately.
    pub fn observe_confirmed(&self, icao: u32, now: Instant) -> TrustOutcome {
        self.candidates.write().remove(&icao);
        self.trusted.write().insert(icao, now);
        TrustOutcome::Emit
    }

    /// An AP-class candidate ICAO derived from a raw syndrome.
    pub fn observe_candidate(&self, icao: u32, now: Instant) -> TrustOutcome {
        if self.trusted.read().contains_key(&icao) {
            self.trusted.write().insert(icao, now);
            return TrustOutcome::Emit;
        }

        let threshold = self.confidence.threshold();
        let mut candidates = self.candidates.write();
        let entry = candidates.entry(icao).or_insert(CandidateRecord {
            last_seen: now,
            valid_frames: 0,
        });
        entry.valid_frames += 1;
        entry.last_seen = now;

        if entry.valid_frames >= threshold {
            candidates.remove(&icao);
            drop(candidates);
            self.trusted.write().insert(icao, now);
            TrustOutcome::Emit
        } else {
            TrustOutcome::Hold
        }
    }

    /// Evict entries from both maps whose last-seen timestamp has aged past
    /// `timeout`. Intended to be called from a periodic (10s) sweep task.
    pub fn sweep(&self, now: Instant) {
        self.trusted
            .write()
            .retain(|_, &mut last_seen| now.duration_since(last_seen) <= self.timeout);
        self.candidates
            .write()
            .retain(|_, rec| now.duration_since(rec.last_seen) <= self.timeout);
    }

    pub fn is_trusted(&self, icao: u32) -> bool {
        self.trusted.read().contains_key(&icao)
    }

    pub fn candidate_count(&self, icao: u32) -> Option<u32> {
        self.candidates.read().get(&icao).map(|r| r.valid_frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmed_icao_trusted_immediately() {
        // Scenario D.
        let filter = TrustFilter::new(IcaoConfidenceLevel::Medium, Duration::from_secs(180));
        let now = Instant::now();
        let outcome = filter.observe_confirmed(0xABCDEF, now);
        assert_eq!(outcome, TrustOutcome::Emit);
        assert!(filter.is_trusted(0xABCDEF));
    }

    #[test]
    fn test_single_ap_sighting_does_not_emit() {
        // Scenario E.
        let filter = TrustFilter::new(IcaoConfidenceLevel::Medium, Duration::from_secs(180));
        let now = Instant::now();
        let outcome = filter.observe_candidate(0x112233, now);
        assert_eq!(outcome, TrustOutcome::Hold);
        assert!(!filter.is_trusted(0x112233));
        assert_eq!(filter.candidate_count(0x112233), Some(1));
    }

    #[test]
    fn test_promotion_at_threshold() {
        // Scenario F: Medium confidence, threshold = 2.
        let filter = TrustFilter::new(IcaoConfidenceLevel::Medium, Duration::from_secs(180));
        let now = Instant::now();
        assert_eq!(filter.observe_candidate(0x445566, now), TrustOutcome::Hold);
        assert_eq!(filter.observe_candidate(0x445566, now), TrustOutcome::Emit);
        assert!(filter.is_trusted(0x445566));
        assert_eq!(filter.candidate_count(0x445566), None);
    }

    #[test]
    fn test_ttl_eviction_then_recandidate() {
        // Scenario G: Medium confidence, threshold = 2.
        let filter = TrustFilter::new(IcaoConfidenceLevel::Medium, Duration::from_secs(180));
        let now = Instant::now();
        filter.observe_confirmed(0x778899, now);
        assert!(filter.is_trusted(0x778899));

        let later = now + Duration::from_secs(181);
        filter.sweep(later);
        assert!(!filter.is_trusted(0x778899));

        let outcome = filter.observe_candidate(0x778899, later);
        assert_eq!(outcome, TrustOutcome::Hold);
        assert_eq!(filter.candidate_count(0x778899), Some(1));
    }

    #[test]
    fn test_trusted_entry_survives_refresh_within_timeout() {
        let filter = TrustFilter::new(IcaoConfidenceLevel::Medium, Duration::from_secs(180));
        let now = Instant::now();
        filter.observe_confirmed(0xAAAAAA, now);
        let soon = now + Duration::from_secs(90);
        filter.sweep(soon);
        assert!(filter.is_trusted(0xAAAAAA));
    }
}
