//! Beep playback — simplest possible engine demo, rendered to a WAV file.
//!
//! Runs a full output session (ramp in, two beeps, ramp out) against a
//! software sink that decimates the 1-bit stream back to PCM, and writes
//! the result to `beep_tone.wav` so you can listen to what the transducer
//! would play. Timeline markers are scheduled on the sample clock and
//! print as the session crosses them.
//!
//! ```text
//!   Player ──► PDM words ──► WavSink (popcount decimation) ──► beep_tone.wav
//! ```

use pdm_audio::constants::{OVERSAMPLE_BITS, SAMPLE_RATE};
use pdm_audio::player::Player;
use pdm_audio::sink::BitstreamSink;

/// Decimates each 32-bit pulse-density word back to one PCM sample.
///
/// The popcount of a word is a crude one-word boxcar filter — plenty to
/// hear the session, and it keeps the demo dependency-light.
struct WavSink {
    samples: Vec<i16>,
}

impl WavSink {
    fn new() -> Self {
        WavSink {
            samples: Vec::new(),
        }
    }
}

impl BitstreamSink for WavSink {
    fn begin(&mut self) {}

    fn set_rate(&mut self, hz: u32) {
        assert_eq!(hz, SAMPLE_RATE);
    }

    fn write_word(&mut self, word: u32) {
        let ones = word.count_ones() as i32;
        let level = (ones * i16::MAX as i32 * 2) / OVERSAMPLE_BITS as i32 + i16::MIN as i32;
        self.samples.push(level.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }
}

fn main() -> Result<(), hound::Error> {
    let mut player = Player::new(WavSink::new());
    player.begin();

    // Timeline markers, resolved against the sample clock, not wall time.
    player.schedule_in(SAMPLE_RATE as i32 / 4, || {
        println!("marker: 0.25 s of audio emitted");
    });
    player.schedule_in(SAMPLE_RATE as i32 / 2, || {
        println!("marker: 0.5 s of audio emitted");
    });

    player.ramp_in();
    player.ramp_out();
    player.beep(440.0, 0.25, 0.8);
    player.beep(660.0, 0.25, 0.8);
    player.ramp_in();
    player.ramp_out();

    println!(
        "emitted {} samples ({:.2} s), {} schedule drops",
        player.clock(),
        player.clock() as f32 / SAMPLE_RATE as f32,
        player.dropped_actions()
    );

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let sink = player.into_sink();
    let mut writer = hound::WavWriter::create("beep_tone.wav", spec)?;
    for &s in &sink.samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    println!("wrote beep_tone.wav ({} samples)", sink.samples.len());

    Ok(())
}
