//! # pdm-audio
//!
//! A `no_std`, zero-allocation pulse-density-modulation (PDM) audio output
//! engine for binary-output transducers, written in pure Rust. One 16-bit
//! PCM sample in, one 32-bit oversampled bitstream word out, with a
//! deterministic sample-count-synchronized scheduler for firing application
//! callbacks at exact points in the audio timeline.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Encoding | [`pdm`] | First-order delta-sigma 1-bit encoder, 32× oversampling |
//! | Scheduling | [`action`] | Inline-context callbacks in a fixed FIFO ring |
//! | Synthesis | [`waveform`] | Ramp-in/ramp-out/beep sample generators |
//! | Transport | [`sink`] | `BitstreamSink` trait, SPI transport (feature-gated) |
//! | Engine | [`player`] | `Player`: emit, clock, fire — the integration point |
//!
//! ## Quick start
//!
//! ```ignore
//! use pdm_audio::player::Player;
//! use pdm_audio::sink::SpiSink;
//!
//! let mut player = Player::new(SpiSink::new(spi));
//! player.begin();
//!
//! // In application code: shape every transition from the idle rail.
//! player.ramp_in();
//! player.ramp_out();
//! player.beep(440.0, 0.1, 1.0);
//!
//! // Fire a callback exactly one second of audio from now.
//! player.schedule_in(44_100, || done_flag_set());
//! ```
//!
//! ## Execution model
//!
//! The whole engine is driven from a single context — a sample-rate timer
//! ISR or a tight loop — calling
//! [`push_sample()`](player::Player::push_sample) once per output period.
//! Nothing blocks, nothing allocates, and scheduled callbacks run inline on
//! that clock. See the [`player`] module docs for the scheduling contract.
//!
//! ## Audio parameters
//!
//! - **Sample rate:** 44 100 Hz ([`constants::SAMPLE_RATE`])
//! - **Oversampling:** 32 bits per sample ([`constants::OVERSAMPLE_BITS`])
//! - **Sample format:** `i16` (signed 16-bit)
//! - **Scheduler capacity:** 16 pending actions ([`constants::ACTION_QUEUE_LEN`])
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `spi` | yes | [`sink::SpiSink`] over `embedded-hal` |
//! | `defmt` | no | `defmt` warning on dropped schedule requests |
//! | `log` | no | `log` warning on dropped schedule requests |

#![no_std]

pub mod constants;
pub mod pdm;
pub mod action;
pub mod waveform;
pub mod sink;
pub mod player;
