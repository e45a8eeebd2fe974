/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of bitstream bits emitted per input sample (one `u32` word).
pub const OVERSAMPLE_BITS: usize = 32;

/// Length of the amplitude ramps in samples.
pub const RAMP_SAMPLES: usize = 2048;

/// Capacity of the action scheduler's ring buffer. Must be a power of two.
pub const ACTION_QUEUE_LEN: usize = 16;

/// Machine words of inline context storage per scheduled callback.
pub const CALLBACK_CONTEXT_WORDS: usize = 4;
