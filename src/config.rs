//! Demodulator configuration.
//!
//! No file I/O, environment variables, or CLI parsing -- the surrounding
//! device driver and process wiring own those concerns. This is a plain
//! value constructed by the embedding application.

use std::time::Duration;

pub use crate::trust::IcaoConfidenceLevel;

#[derive(Debug, Clone)]
pub struct DemodConfig {
    /// How many corroborating sightings an AP-class ICAO needs before it is
    /// promoted from candidate to trusted.
    pub icao_confidence: IcaoConfidenceLevel,
    /// How long a trusted or candidate ICAO may go unseen before eviction.
    pub icao_timeout: Duration,
}

impl Default for DemodConfig {
    fn default() -> Self {
        Self {
            icao_confidence: IcaoConfidenceLevel::Medium,
            icao_timeout: Duration::from_secs(180),
        }
    }
}
