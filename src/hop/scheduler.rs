//! Hop-pattern index, per-channel frequency-error memory, miss counter and
//! dwell-deadline state machine.
//!
//! The scheduler is deliberately decoupled from any timer or async runtime:
//! it exposes `start`, `on_dwell_timeout` and `on_packet_validated`, each
//! returning the next [`Hop`] decision plus the `Duration` to arm the next
//! dwell deadline for. `pipeline::run` (the ambient `tokio` glue) owns the
//! actual `tokio::time::Instant` deadline and calls these methods; this
//! keeps the state machine itself synchronously unit-testable, matching
//! the design note that "global mutable state ... should be an injected
//! dependency in the core."

use std::collections::HashMap;
use std::time::Duration;

use crate::constants::{
    CHANNEL_FREQS_HZ, DWELL_TIME_BASE_US, DWELL_TIME_PER_ID_US, HOP_PATTERN,
    MAX_MISSES_BEFORE_RANDOM_HOP, NUM_CHANNELS, RANDOM_HOP_DWELL_MULTIPLIER,
    TRACKING_DWELL_MULTIPLIER_DEN, TRACKING_DWELL_MULTIPLIER_NUM,
};

/// A retune decision: which channel to dwell on next and the frequency
/// error already known for it (or the carried-over running estimate if
/// this channel has never been visited).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hop {
    pub channel_idx: usize,
    pub channel_freq_hz: u32,
    pub freq_error_hz: f64,
}

/// Source of randomness for `RandHop`, injected so the scheduler's dwell
/// logic is deterministically testable (see module docs and the design
/// note on injected global state).
pub trait RandomHop: Send {
    fn next_channel(&mut self) -> usize;
}

/// Production `RandomHop` backed by `rand::thread_rng`.
#[derive(Debug, Default)]
pub struct ThreadRngHop;

impl RandomHop for ThreadRngHop {
    fn next_channel(&mut self) -> usize {
        use rand::Rng;
        rand::thread_rng().gen_range(0..NUM_CHANNELS)
    }
}

/// Coarse state, tracked for observability only: the state machine's
/// actual branching is fully captured by `miss_count` and which method was
/// last called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopState {
    Initial,
    Synchronising,
    Tracking,
}

pub struct HopScheduler {
    station_id: u8,
    rng: Box<dyn RandomHop>,

    state: HopState,
    hop_idx: usize,
    current_freq_err: f64,
    channel_freq_err: HashMap<usize, f64>,
    miss_count: u32,
}

impl HopScheduler {
    /// Build a scheduler for the given station-ID filter (used only for
    /// the dwell-time padding, not for message filtering) with the
    /// production RNG.
    pub fn new(station_id: u8) -> Self {
        Self::with_rng(station_id, Box::new(ThreadRngHop))
    }

    /// Build a scheduler with an injected randomness source, for
    /// deterministic tests.
    pub fn with_rng(station_id: u8, rng: Box<dyn RandomHop>) -> Self {
        HopScheduler {
            station_id,
            rng,
            state: HopState::Initial,
            hop_idx: 0,
            current_freq_err: 0.0,
            channel_freq_err: HashMap::new(),
            miss_count: 0,
        }
    }

    /// Base dwell time: 2.5625s plus 62.5ms per station ID.
    pub fn dwell_time(&self) -> Duration {
        Duration::from_micros(
            DWELL_TIME_BASE_US + DWELL_TIME_PER_ID_US * self.station_id as u64,
        )
    }

    pub fn state(&self) -> HopState {
        self.state
    }

    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }

    pub fn hop_idx(&self) -> usize {
        self.hop_idx
    }

    /// The channel index (into `CHANNEL_FREQS_HZ`) the scheduler currently
    /// believes the transmitter is dwelling on.
    pub fn current_channel_idx(&self) -> usize {
        HOP_PATTERN[self.hop_idx]
    }

    /// Startup: jump to a random channel and arm the long
    /// `52 * DwellTime` timer that gives one full hop-pattern rotation (plus
    /// margin) a chance to find the transmitter with no prior history.
    pub fn start(&mut self) -> (Hop, Duration) {
        self.hop_idx = self.rng.next_channel();
        self.miss_count = 0;
        self.state = HopState::Synchronising;
        let hop = self.build_hop();
        (hop, self.dwell_time() * RANDOM_HOP_DWELL_MULTIPLIER as u32)
    }

    /// The dwell timer fired with no packet validated since the last hop.
    /// After `MAX_MISSES_BEFORE_RANDOM_HOP` consecutive misses, give up on
    /// incremental hopping and jump to a random channel with a full
    /// rotation's worth of dwell time; otherwise advance to the next
    /// pattern entry and keep trying at the normal dwell time.
    pub fn on_dwell_timeout(&mut self) -> (Hop, Duration) {
        self.miss_count += 1;
        self.state = HopState::Synchronising;

        if self.miss_count >= MAX_MISSES_BEFORE_RANDOM_HOP {
            self.hop_idx = self.rng.next_channel();
            let hop = self.build_hop();
            (hop, self.dwell_time() * RANDOM_HOP_DWELL_MULTIPLIER as u32)
        } else {
            self.hop_idx = (self.hop_idx + 1) % NUM_CHANNELS;
            let hop = self.build_hop();
            (hop, self.dwell_time())
        }
    }

    /// A packet validated successfully on the current channel, with a
    /// newly measured frequency-error delta (the `freqError` term of
    /// spec.md §4.6, not the absolute error). Updates that channel's
    /// remembered error, resets the miss counter, advances to the next
    /// hop-pattern entry, and arms the tracking dwell margin (1.5x) that
    /// absorbs clock skew without hopping early.
    pub fn on_packet_validated(&mut self, measured_freq_error_delta: f64) -> (Hop, Duration) {
        let channel = self.current_channel_idx();
        let updated = self.current_freq_err + measured_freq_error_delta;
        self.channel_freq_err.insert(channel, updated);
        self.current_freq_err = updated;

        self.miss_count = 0;
        self.state = HopState::Tracking;
        self.hop_idx = (self.hop_idx + 1) % NUM_CHANNELS;
        let hop = self.build_hop();

        let dwell = self.dwell_time() * TRACKING_DWELL_MULTIPLIER_NUM as u32
            / TRACKING_DWELL_MULTIPLIER_DEN as u32;
        (hop, dwell)
    }

    fn build_hop(&mut self) -> Hop {
        let channel_idx = self.current_channel_idx();
        let channel_freq_hz = CHANNEL_FREQS_HZ[channel_idx];
        let freq_error_hz = match self.channel_freq_err.get(&channel_idx) {
            Some(&known) => {
                self.current_freq_err = known;
                known
            }
            None => self.current_freq_err,
        };
        Hop {
            channel_idx,
            channel_freq_hz,
            freq_error_hz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic `RandomHop` for tests: cycles through a fixed
    /// sequence, defaulting to 0 once exhausted.
    struct FixedRng {
        sequence: Vec<usize>,
        pos: usize,
    }

    impl FixedRng {
        fn new(sequence: Vec<usize>) -> Self {
            FixedRng { sequence, pos: 0 }
        }
    }

    impl RandomHop for FixedRng {
        fn next_channel(&mut self) -> usize {
            let v = *self.sequence.get(self.pos).unwrap_or(&0);
            self.pos += 1;
            v
        }
    }

    #[test]
    fn next_hop_51_times_returns_pattern_in_order() {
        let mut sched = HopScheduler::with_rng(0, Box::new(FixedRng::new(vec![0])));
        // Force hop_idx to 0 without taking the RandHop path that `start`
        // would otherwise use.
        sched.hop_idx = 0;
        sched.state = HopState::Tracking;

        let mut observed = Vec::new();
        for _ in 0..51 {
            let (hop, _) = sched.on_packet_validated(0.0);
            observed.push(hop.channel_idx);
        }

        // on_packet_validated reports the *new* hop_idx's channel after
        // advancing, so the first emitted channel is HOP_PATTERN[1], and
        // the sequence wraps back to HOP_PATTERN[0] on the 51st call.
        let expected: Vec<usize> = (1..=51).map(|i| HOP_PATTERN[i % NUM_CHANNELS]).collect();
        assert_eq!(observed, expected);
    }

    #[test]
    fn three_misses_trigger_random_hop_with_52x_dwell() {
        let mut sched = HopScheduler::with_rng(0, Box::new(FixedRng::new(vec![5, 5, 5])));
        sched.start();

        let (_, d1) = sched.on_dwell_timeout();
        assert_eq!(sched.miss_count(), 1);
        assert_eq!(d1, sched.dwell_time());

        let (_, d2) = sched.on_dwell_timeout();
        assert_eq!(sched.miss_count(), 2);
        assert_eq!(d2, sched.dwell_time());

        let (_, d3) = sched.on_dwell_timeout();
        assert_eq!(sched.miss_count(), 3);
        assert_eq!(d3, sched.dwell_time() * RANDOM_HOP_DWELL_MULTIPLIER as u32);
    }

    #[test]
    fn start_arms_52x_dwell() {
        let mut sched = HopScheduler::with_rng(0, Box::new(FixedRng::new(vec![7])));
        let (hop, dwell) = sched.start();
        assert_eq!(hop.channel_idx, HOP_PATTERN[7]);
        assert_eq!(dwell, sched.dwell_time() * RANDOM_HOP_DWELL_MULTIPLIER as u32);
    }

    #[test]
    fn success_arms_1_5x_dwell_and_resets_misses() {
        let mut sched = HopScheduler::with_rng(0, Box::new(FixedRng::new(vec![0])));
        sched.start();
        sched.on_dwell_timeout();
        sched.on_dwell_timeout();
        assert_eq!(sched.miss_count(), 2);

        let (_, dwell) = sched.on_packet_validated(0.0);
        assert_eq!(sched.miss_count(), 0);
        assert_eq!(sched.state(), HopState::Tracking);
        let expected = sched.dwell_time() * TRACKING_DWELL_MULTIPLIER_NUM as u32
            / TRACKING_DWELL_MULTIPLIER_DEN as u32;
        assert_eq!(dwell, expected);
    }

    #[test]
    fn channel_freq_err_overrides_current_on_revisit() {
        let mut sched = HopScheduler::with_rng(0, Box::new(FixedRng::new(vec![0])));
        sched.hop_idx = 0;
        sched.state = HopState::Tracking;

        // First visit to HOP_PATTERN[1]'s channel: measure +100Hz delta.
        let (hop1, _) = sched.on_packet_validated(100.0);
        assert_eq!(hop1.freq_error_hz, 100.0);
        let visited_channel = hop1.channel_idx;

        // Walk all the way around the pattern back to the same channel,
        // accumulating unrelated deltas along the way.
        for _ in 0..(NUM_CHANNELS - 1) {
            sched.on_packet_validated(5.0);
        }
        // `current_freq_err` has drifted; revisiting the first channel must
        // override it with that channel's stored value before adding the
        // next delta.
        let stored_before_revisit = sched.channel_freq_err[&visited_channel];
        assert_eq!(stored_before_revisit, 100.0);

        let (hop_revisit, _) = sched.on_packet_validated(3.0);
        assert_eq!(hop_revisit.channel_idx, visited_channel);
        assert_eq!(hop_revisit.freq_error_hz, 103.0);
    }

    #[test]
    fn dwell_time_scales_with_station_id() {
        let base = HopScheduler::new(0).dwell_time();
        let padded = HopScheduler::new(4).dwell_time();
        assert_eq!(padded - base, Duration::from_micros(DWELL_TIME_PER_ID_US * 4));
    }
}
