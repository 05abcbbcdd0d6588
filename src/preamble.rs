//! Mode S preamble detection over a ring buffer of magnitudes.
//!
//! The preamble is four pulses at chip positions 0, 2, 7, 9 within a 16-sample
//! (8 us) window. Detection runs three tests in sequence: a shape test on the
//! raw pulse/gap ordering, a high-spike-average threshold test, and a
//! quiet-zone test over the samples immediately following the preamble.

use crate::ring::CandidateRingBuffer;

/// Check whether a preamble begins at ring offset `p`.
///
/// Mirrors the shape/threshold/quiet-zone checks used by dump1090-family
/// demodulators, reindexed through the ring buffer instead of a flat slice.
pub fn detect_at(ring: &CandidateRingBuffer, p: usize) -> bool {
    let m = |o: usize| ring.at(p, o) as u32;

    // Shape test: four alternating high/low spikes at 0, 2, 7, 9.
    if !(m(0) > m(1)
        && m(1) < m(2)
        && m(2) > m(3)
        && m(3) < m(0)
        && m(4) < m(0)
        && m(5) < m(0)
        && m(6) < m(0)
        && m(7) > m(8)
        && m(8) < m(9)
        && m(9) > m(6))
    {
        return false;
    }

    // High-spike average. Divisor is 6, not 4 -- intentional slack against
    // the four spikes it averages.
    let high = (m(0) + m(2) + m(7) + m(9)) / 6;

    if m(4) >= high || m(5) >= high {
        return false;
    }

    if m(11) >= high || m(12) >= high || m(13) >= high || m(14) >= high {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_preamble(ring: &mut CandidateRingBuffer) {
        // A clean preamble: high spikes at 0, 2, 7, 9; low elsewhere.
        let samples: [u16; 16] = [
            4000, 100, 4000, 100, 100, 100, 100, 4000, 100, 4000, 500, 50, 50, 50, 50, 100,
        ];
        for s in samples {
            ring.push(s);
        }
    }

    #[test]
    fn test_clean_preamble_detected() {
        let mut ring = CandidateRingBuffer::new();
        push_preamble(&mut ring);
        assert!(detect_at(&ring, 0));
    }

    #[test]
    fn test_flat_signal_rejected() {
        let mut ring = CandidateRingBuffer::new();
        for _ in 0..16 {
            ring.push(1000);
        }
        assert!(!detect_at(&ring, 0));
    }

    #[test]
    fn test_noisy_quiet_zone_rejected() {
        let mut ring = CandidateRingBuffer::new();
        // Same shape, but quiet zone after the preamble is loud.
        let samples: [u16; 16] = [
            4000, 100, 4000, 100, 100, 100, 100, 4000, 100, 4000, 500, 5000, 50, 50, 50, 100,
        ];
        for s in samples {
            ring.push(s);
        }
        assert!(!detect_at(&ring, 0));
    }
}
