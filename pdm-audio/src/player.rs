//! The sample-clocked output engine.
//!
//! [`Player`] ties the pieces together: every call to
//! [`push_sample()`](Player::push_sample) PDM-encodes one sample, writes the
//! bitstream word to the injected sink, advances the sample clock, and gives
//! the action scheduler one chance to fire.
//!
//! ## Execution model
//!
//! A single logical context — a sample-rate timer interrupt or a tight
//! polling loop — drives `push_sample` once per output period. All state is
//! mutated from that context only, so there is no locking, and nothing in
//! here may block or wait: a stall is an audio dropout. Scheduled callbacks
//! run synchronously inside `push_sample` and borrow one sample period's
//! timing budget; keep them short.
//!
//! ## Scheduling contract
//!
//! "Due" is purely a function of the sample clock, never wall time. The
//! queue is FIFO and only its head is examined, one examination per emitted
//! sample — two actions due on the same sample fire on two *consecutive*
//! samples. The head is popped before its callback runs, so a callback may
//! schedule follow-up actions through whatever shared handle the
//! application keeps; they land behind the tail and are untouched by the
//! in-flight firing. There is no cancellation: encode an "is still wanted"
//! check inside the callback if you need one.

use crate::action::{Action, ActionQueue, Callback};
use crate::constants::SAMPLE_RATE;
use crate::pdm::PdmEncoder;
use crate::sink::BitstreamSink;
use crate::waveform::{Beep, RampIn, RampOut};

/// Sample-clocked PDM output engine with a deterministic action scheduler.
///
/// # Example
/// ```ignore
/// let mut player = Player::new(SpiSink::new(spi));
/// player.begin();
/// player.schedule_in(44_100, || strip_flash_request());
/// player.ramp_in();
/// player.beep(440.0, 1.0, 0.8);
/// player.ramp_out();
/// ```
pub struct Player<S> {
    sink: S,
    encoder: PdmEncoder,
    /// Monotonic count of samples emitted. Wraps with `i32` arithmetic;
    /// all target comparisons use signed wrapping difference.
    clock: i32,
    actions: ActionQueue,
    /// Schedule requests rejected because the queue was full.
    dropped_actions: u32,
}

/// Signed-difference due check, wrap-correct across the `i32` boundary.
#[inline]
fn is_due(due: i32, clock: i32) -> bool {
    due.wrapping_sub(clock) <= 0
}

impl<S: BitstreamSink> Player<S> {
    /// Create a player around an output transport. The clock starts at zero
    /// and the encoder with a clean accumulator.
    pub const fn new(sink: S) -> Self {
        Player {
            sink,
            encoder: PdmEncoder::new(),
            clock: 0,
            actions: ActionQueue::new(),
            dropped_actions: 0,
        }
    }

    /// Initialize the transport and set it to [`SAMPLE_RATE`].
    pub fn begin(&mut self) {
        self.sink.begin();
        self.sink.set_rate(SAMPLE_RATE);
    }

    /// Emit one sample.
    ///
    /// Encodes `sample`, writes the bitstream word to the sink, advances
    /// the sample clock, then fires the head action if it is due. At most
    /// one action fires per call.
    pub fn push_sample(&mut self, sample: i16) {
        let word = self.encoder.encode(sample);
        self.sink.write_word(word);
        self.clock = self.clock.wrapping_add(1);

        if let Some(due) = self.actions.head_due() {
            if is_due(due, self.clock) {
                // Pop first: the slot is reclaimed and the queue is
                // untouched while the callback runs, so the callback may
                // append follow-up actions.
                if let Some(action) = self.actions.pop() {
                    action.callback.invoke();
                }
            }
        }
    }

    /// Schedule `f` to fire once the sample clock reaches or passes
    /// `target`.
    ///
    /// If the queue is full the request is silently dropped — the prior
    /// schedule stays intact and [`dropped_actions()`](Self::dropped_actions)
    /// increments.
    pub fn schedule_at(&mut self, target: i32, f: impl FnOnce() + Send) {
        let action = Action {
            due: target,
            callback: Callback::new(f),
        };
        if self.actions.push(action).is_err() {
            self.dropped_actions = self.dropped_actions.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("action queue full, schedule request dropped");
            #[cfg(feature = "log")]
            log::warn!("action queue full, schedule request dropped");
        }
    }

    /// Schedule `f` to fire `delta` samples from now.
    pub fn schedule_in(&mut self, delta: i32, f: impl FnOnce() + Send) {
        self.schedule_at(self.clock.wrapping_add(delta), f);
    }

    /// Ramp the output from the idle rail up to near zero offset.
    pub fn ramp_in(&mut self) {
        for sample in RampIn::new() {
            self.push_sample(sample);
        }
    }

    /// Ramp the output from zero offset back down toward the idle rail.
    pub fn ramp_out(&mut self) {
        for sample in RampOut::new() {
            self.push_sample(sample);
        }
    }

    /// Play a square beep of the given frequency (Hz), duration (seconds)
    /// and volume (0.0 to 1.0).
    ///
    /// The beep's low phase is the idle rail exactly; play it while parked
    /// there (after [`ramp_out()`](Self::ramp_out) or before
    /// [`ramp_in()`](Self::ramp_in)) and both edges are click-free.
    pub fn beep(&mut self, freq: f32, len: f32, volume: f32) {
        for sample in Beep::new(freq, len, volume) {
            self.push_sample(sample);
        }
    }

    /// Current sample clock: samples emitted since construction.
    pub fn clock(&self) -> i32 {
        self.clock
    }

    /// Number of actions waiting in the queue.
    pub fn pending_actions(&self) -> u32 {
        self.actions.len()
    }

    /// Number of schedule requests dropped on a full queue.
    pub fn dropped_actions(&self) -> u32 {
        self.dropped_actions
    }

    /// Borrow the output transport.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the output transport.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Tear the player down and hand the transport back.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ACTION_QUEUE_LEN;
    use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    /// Minimal sink for observing the emission path.
    struct CountingSink {
        words: u32,
        began: bool,
        rate: u32,
    }

    impl CountingSink {
        const fn new() -> Self {
            CountingSink {
                words: 0,
                began: false,
                rate: 0,
            }
        }
    }

    impl BitstreamSink for CountingSink {
        fn begin(&mut self) {
            self.began = true;
        }

        fn set_rate(&mut self, hz: u32) {
            self.rate = hz;
        }

        fn write_word(&mut self, _word: u32) {
            self.words += 1;
        }
    }

    fn player() -> Player<CountingSink> {
        Player::new(CountingSink::new())
    }

    #[test]
    fn begin_initializes_the_sink() {
        let mut p = player();
        p.begin();
        assert!(p.sink().began);
        assert_eq!(p.sink().rate, SAMPLE_RATE);
    }

    #[test]
    fn push_sample_writes_one_word_and_ticks_the_clock() {
        let mut p = player();
        assert_eq!(p.clock(), 0);
        p.push_sample(0);
        p.push_sample(0);
        assert_eq!(p.clock(), 2);
        assert_eq!(p.sink().words, 2);
    }

    #[test]
    fn action_fires_exactly_when_clock_reaches_target() {
        static FIRED: AtomicU32 = AtomicU32::new(0);

        let mut p = player();
        p.schedule_in(5, || {
            FIRED.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(p.pending_actions(), 1);

        for _ in 0..4 {
            p.push_sample(0);
        }
        assert_eq!(FIRED.load(Ordering::Relaxed), 0, "fired early");

        p.push_sample(0);
        assert_eq!(FIRED.load(Ordering::Relaxed), 1);
        assert_eq!(p.clock(), 5);
        assert_eq!(p.pending_actions(), 0);

        // Exactly once.
        for _ in 0..10 {
            p.push_sample(0);
        }
        assert_eq!(FIRED.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn past_target_fires_on_next_sample() {
        static FIRED: AtomicU32 = AtomicU32::new(0);

        let mut p = player();
        for _ in 0..10 {
            p.push_sample(0);
        }
        // Already behind the clock.
        p.schedule_at(3, || {
            FIRED.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(FIRED.load(Ordering::Relaxed), 0);
        p.push_sample(0);
        assert_eq!(FIRED.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn simultaneous_targets_fire_on_consecutive_samples() {
        static FIRST_AT: AtomicU32 = AtomicU32::new(0);
        static SECOND_AT: AtomicU32 = AtomicU32::new(0);

        let mut p = player();
        p.schedule_at(3, || {
            FIRST_AT.fetch_add(3, Ordering::Relaxed);
        });
        p.schedule_at(3, || {
            SECOND_AT.fetch_add(4, Ordering::Relaxed);
        });

        p.push_sample(0);
        p.push_sample(0);
        p.push_sample(0);
        // Clock is 3: only the head fired.
        assert_eq!(FIRST_AT.load(Ordering::Relaxed), 3);
        assert_eq!(SECOND_AT.load(Ordering::Relaxed), 0);

        p.push_sample(0);
        // Clock is 4: the second followed one sample later.
        assert_eq!(SECOND_AT.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn overflowing_schedule_drops_newest_and_counts() {
        static FIRE_SEQ: AtomicUsize = AtomicUsize::new(0);
        const ZERO_SEQ: AtomicUsize = AtomicUsize::new(0);
        static SEQ: [AtomicUsize; ACTION_QUEUE_LEN + 1] = [ZERO_SEQ; ACTION_QUEUE_LEN + 1];

        let mut p = player();
        for i in 0..ACTION_QUEUE_LEN + 1 {
            p.schedule_at(1, move || {
                SEQ[i].store(FIRE_SEQ.fetch_add(1, Ordering::Relaxed) + 1, Ordering::Relaxed);
            });
        }
        assert_eq!(p.pending_actions(), ACTION_QUEUE_LEN as u32);
        assert_eq!(p.dropped_actions(), 1);

        // One firing per sample: drain all sixteen.
        for _ in 0..ACTION_QUEUE_LEN + 8 {
            p.push_sample(0);
        }

        // The first sixteen fired in insertion order; the seventeenth never.
        for (i, slot) in SEQ.iter().enumerate().take(ACTION_QUEUE_LEN) {
            assert_eq!(slot.load(Ordering::Relaxed), i + 1, "action {}", i);
        }
        assert_eq!(SEQ[ACTION_QUEUE_LEN].load(Ordering::Relaxed), 0);
        assert_eq!(p.pending_actions(), 0);
    }

    #[test]
    fn chained_scheduling_keeps_firing() {
        // A follow-up scheduled after a firing (here from the driving loop,
        // the way an application reacts to a callback flag) lands behind
        // the tail and fires on its own due sample.
        static PHASE: AtomicU32 = AtomicU32::new(0);

        let mut p = player();
        p.schedule_in(2, || {
            PHASE.store(1, Ordering::Relaxed);
        });

        let mut rescheduled = false;
        for _ in 0..10 {
            p.push_sample(0);
            if PHASE.load(Ordering::Relaxed) == 1 && !rescheduled {
                rescheduled = true;
                p.schedule_in(3, || {
                    PHASE.store(2, Ordering::Relaxed);
                });
            }
        }
        assert_eq!(PHASE.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn due_check_is_wrap_correct() {
        // Far apart across the i32 boundary: a target just "ahead" of a
        // clock near i32::MAX is not due until the clock wraps past it.
        assert!(!is_due(i32::MIN + 5, i32::MAX - 5));
        assert!(is_due(i32::MIN + 5, i32::MIN + 5));
        assert!(is_due(i32::MIN + 5, i32::MIN + 6));
        // And the mundane cases.
        assert!(is_due(10, 10));
        assert!(is_due(10, 11));
        assert!(!is_due(11, 10));
    }

    #[test]
    fn ramps_emit_their_full_length() {
        let mut p = player();
        p.ramp_in();
        assert_eq!(p.clock(), 2048);
        p.ramp_out();
        assert_eq!(p.clock(), 4096);
        assert_eq!(p.sink().words, 4096);
    }

    #[test]
    fn into_sink_returns_the_transport() {
        let mut p = player();
        p.push_sample(100);
        let sink = p.into_sink();
        assert_eq!(sink.words, 1);
    }
}
