//! Bit slicing: converts post-preamble ring samples into Mode S frame bytes.
//!
//! Each bit occupies two samples (PPM: early-high = 1, late-high = 0). An
//! adaptive correction compensates for magnitude drift between adjacent bit
//! cells -- AGC response lags the signal, so later bits in a frame can sag
//! relative to earlier ones; the `-20.0` factor below is the amount of that
//! sag the original dump1090 demodulator was tuned to claw back.

use crate::frame::{self, DownlinkFormat};
use crate::ring::{CandidateRingBuffer, PREAMBLE_SAMPLES};

/// Outcome of attempting to slice a candidate frame starting at ring offset `p`.
pub enum SliceResult {
    /// A complete frame of `len` bytes (7 or 14), DF already classified.
    Frame { bytes: [u8; 14], len: usize, df: DownlinkFormat },
    /// No usable frame at this offset.
    Reject,
}

/// Slice bits starting immediately after the preamble at ring offset `p`.
pub fn slice(ring: &CandidateRingBuffer, p: usize) -> SliceResult {
    let mut frame_bytes = [0u8; 14];
    let mut prev_avg = 0.0f64;
    let mut target_bits = 112usize;
    let mut df = DownlinkFormat::Invalid;

    for b in 0..112 {
        let s0 = ring.at(p, PREAMBLE_SAMPLES + b * 2) as f64;
        let mut s1 = ring.at(p, PREAMBLE_SAMPLES + b * 2 + 1) as f64;

        let mut avg = (s0 + s1) * 0.5;

        if prev_avg > 0.0 {
            let correction = -20.0 * (avg - prev_avg) / avg;
            if correction > 0.0 {
                s1 += correction;
                avg = (s0 + s1) * 0.5;
            }
        }
        prev_avg = avg;

        let bit = if s0 > s1 { 1u8 } else { 0u8 };
        if bit == 1 {
            frame_bytes[b / 8] |= 1 << (7 - b % 8);
        }

        if b == 7 {
            if frame_bytes[0] == 0 {
                return SliceResult::Reject;
            }
            df = frame::get_downlink_format(&frame_bytes);
            target_bits = match df.frame_bits() {
                Some(bits) => bits,
                None => return SliceResult::Reject,
            };
        }

        if b + 1 == target_bits {
            let len = target_bits / 8;
            let tail_zero = frame_bytes[len - 3] == 0 && frame_bytes[len - 2] == 0 && frame_bytes[len - 1] == 0;
            if tail_zero {
                return SliceResult::Reject;
            }
            return SliceResult::Frame {
                bytes: frame_bytes,
                len,
                df,
            };
        }
    }

    SliceResult::Reject
}
