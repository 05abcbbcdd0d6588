//! Pipeline driver: pulls I/Q samples from a producer, demodulates them
//! through the magnitude/preamble/slicer/CRC/trust stages, and hands
//! validated frames to a consumer callback.
//!
//! Two operating modes share the same stage logic: `process_samples` runs it
//! inline on the caller's thread for a bounded batch; `start_async` runs a
//! single dedicated worker pulling from a producer-supplied
//! `crossbeam_channel::Receiver`, matching the split the teacher crate draws
//! between `Demodulator::process_file` (synchronous, batch-oriented) and its
//! `main.rs` tokio-spawned tasks (long-running, queue-driven).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::DemodConfig;
use crate::error::DemodError;
use crate::frame::{self, DownlinkFormat, IcaoResult};
use crate::magnitude::MagnitudeLut;
use crate::preamble;
use crate::ring::{CandidateRingBuffer, RING_LEN};
use crate::slicer::{self, SliceResult};
use crate::trust::TrustFilter;

/// A validated Mode S frame handed to the consumer.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: [u8; 14],
    pub len: usize,
    pub df: DownlinkFormat,
    pub icao: u32,
}

impl Frame {
    /// Canonical network string form: `*<hex>;`.
    pub fn to_raw_string(&self) -> String {
        let mut s = String::with_capacity(self.len * 2 + 2);
        s.push('*');
        for b in &self.bytes[..self.len] {
            s.push_str(&format!("{b:02x}"));
        }
        s.push(';');
        s
    }
}

/// Raw I/Q sample pair as produced by the SDR driver.
pub type IqSample = (u8, u8);

/// Demodulation pipeline: magnitude table, ring-buffered preamble matcher,
/// and trust filter. Safe to share across a worker task and an independent
/// TTL-sweep task via `Arc`.
pub struct Demodulator {
    mag_lut: MagnitudeLut,
    ring: Mutex<CandidateRingBuffer>,
    trust: TrustFilter,
    running: AtomicBool,
}

impl Demodulator {
    pub fn new(config: DemodConfig) -> Self {
        Self {
            mag_lut: MagnitudeLut::new(),
            ring: Mutex::new(CandidateRingBuffer::new()),
            trust: TrustFilter::new(config.icao_confidence, config.icao_timeout),
            running: AtomicBool::new(false),
        }
    }

    /// Process a bounded batch of samples inline on the caller's thread.
    pub fn process_samples(
        &self,
        samples: &[IqSample],
        mut on_frame: impl FnMut(Frame),
    ) -> Result<(), DemodError> {
        if self.running.load(Ordering::Acquire) {
            return Err(DemodError::SyncWhileAsyncRunning);
        }

        let mut ring = self.ring.lock();
        for &(i, q) in samples {
            let mag = self.mag_lut.lookup(i, q);
            ring.push(mag);
            self.try_candidate(&mut ring, &mut on_frame);
        }
        Ok(())
    }

    /// Start the single asynchronous worker. Only one may run at a time;
    /// calling this while a worker is already active is a misuse error.
    pub fn start_async(
        self: Arc<Self>,
        rx: Receiver<IqSample>,
        mut on_frame: Box<dyn FnMut(Frame) + Send>,
    ) -> Result<JoinHandle<()>, DemodError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DemodError::AlreadyRunning);
        }

        let demod = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            info!("demodulator worker started");
            loop {
                if !demod.running.load(Ordering::Acquire) {
                    break;
                }

                match rx.try_recv() {
                    Ok((i, q)) => {
                        let mag = demod.mag_lut.lookup(i, q);
                        let mut ring = demod.ring.lock();
                        ring.push(mag);
                        demod.try_candidate(&mut ring, &mut on_frame);
                    }
                    Err(TryRecvError::Empty) => {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                    Err(TryRecvError::Disconnected) => {
                        warn!("sample producer disconnected, stopping worker");
                        break;
                    }
                }
            }
            demod.running.store(false, Ordering::Release);
            info!("demodulator worker stopped");
        });

        Ok(handle)
    }

    /// Signal the async worker to stop at its next loop iteration. Does not
    /// wait for the worker to actually exit.
    pub fn stop_async(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Spawn the periodic (10s) TTL sweep over the trust filter's maps. Runs
    /// independently of the worker; the caller owns the returned handle and
    /// may abort it on shutdown.
    pub fn spawn_ttl_sweep(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                self.trust.sweep(Instant::now());
            }
        })
    }

    /// Having just pushed a new sample, check whether a preamble begins at
    /// the current ring cursor and, if so, slice/classify/trust-filter it.
    fn try_candidate(&self, ring: &mut CandidateRingBuffer, on_frame: &mut impl FnMut(Frame)) {
        if ring.total_pushed() < RING_LEN {
            return;
        }

        let p = ring.cursor();
        if !preamble::detect_at(ring, p) {
            return;
        }

        let (mut bytes, len, df) = match slicer::slice(ring, p) {
            SliceResult::Frame { bytes, len, df } => (bytes, len, df),
            SliceResult::Reject => return,
        };

        let now = Instant::now();
        match frame::get_icao(&mut bytes[..len], df) {
            IcaoResult::Confirmed(icao) => {
                // get_icao flips any corrected bit in place, so `bytes` here
                // already passes CRC -- the emitted frame, not just `icao`,
                // reflects the in-memory correction (SPEC_FULL §8 scenario B).
                self.trust.observe_confirmed(icao, now);
                on_frame(Frame { bytes, len, df, icao });
            }
            IcaoResult::Candidate(icao) => {
                if self.trust.observe_candidate(icao, now) == crate::trust::TrustOutcome::Emit {
                    on_frame(Frame { bytes, len, df, icao });
                }
            }
            IcaoResult::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemodConfig;

    const DF17_FRAME: [u8; 14] = [
        0x8D, 0x48, 0x40, 0xD6, 0x20, 0x2C, 0xC3, 0x71, 0xC3, 0x2C, 0xE0, 0x57, 0x60, 0x98,
    ];

    const HIGH: IqSample = (255, 255);
    const LOW: IqSample = (127, 127);

    fn synthesize_clean_df17() -> Vec<IqSample> {
        let mut samples = Vec::with_capacity(240);
        // 16-sample preamble: spikes at 0, 2, 7, 9.
        let preamble = [
            HIGH, LOW, HIGH, LOW, LOW, LOW, LOW, HIGH, LOW, HIGH, LOW, LOW, LOW, LOW, LOW, LOW,
        ];
        samples.extend_from_slice(&preamble);

        for b in 0..112 {
            let byte = DF17_FRAME[b / 8];
            let bit = (byte >> (7 - b % 8)) & 1;
            if bit == 1 {
                samples.push(HIGH);
                samples.push(LOW);
            } else {
                samples.push(LOW);
                samples.push(HIGH);
            }
        }

        samples
    }

    #[test]
    fn test_process_samples_emits_clean_df17() {
        let demod = Demodulator::new(DemodConfig::default());
        let samples = synthesize_clean_df17();
        assert_eq!(samples.len(), RING_LEN);

        let mut emitted = Vec::new();
        demod
            .process_samples(&samples, |frame| emitted.push(frame))
            .unwrap();

        assert_eq!(emitted.len(), 1);
        let frame = &emitted[0];
        assert_eq!(frame.len, 14);
        assert_eq!(frame.df, DownlinkFormat::Df17);
        assert_eq!(frame.icao, 0x4840D6);
        assert_eq!(&frame.bytes[..14], &DF17_FRAME[..]);
        assert_eq!(frame.to_raw_string(), "*8d4840d6202cc371c32ce0576098;");
    }

    #[test]
    fn test_sync_processing_rejected_while_async_running() {
        let demod = Demodulator::new(DemodConfig::default());
        demod.running.store(true, Ordering::Release);
        let result = demod.process_samples(&[], |_| {});
        assert!(matches!(result, Err(DemodError::SyncWhileAsyncRunning)));
    }
}
