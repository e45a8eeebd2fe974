//! SPI bitstream transport.
//!
//! A 1-bit transducer only needs a clocked data line, which is exactly what
//! an SPI bus MOSI pin provides. [`SpiSink`] shifts each pulse-density word
//! out as four big-endian bytes, so the wire sees the word's bits
//! most-significant first — the same order the encoder packs them.
//!
//! The bus bit clock must be configured by board bring-up to
//! `32 × sample rate` (1.4112 MHz at 44.1 kHz); `embedded-hal` exposes no
//! clock control, so [`set_rate()`](crate::sink::BitstreamSink::set_rate)
//! on this transport is a documentation point only.

use embedded_hal::spi::SpiBus;

use super::BitstreamSink;

/// Clocks pulse-density words out over an SPI bus.
///
/// The realtime emission path cannot stall on transport trouble, so bus
/// errors are counted rather than propagated; poll
/// [`write_errors()`](Self::write_errors) from a non-realtime context if
/// the link health matters.
pub struct SpiSink<SPI> {
    spi: SPI,
    write_errors: u32,
}

impl<SPI> SpiSink<SPI> {
    /// Wrap a configured SPI bus.
    pub const fn new(spi: SPI) -> Self {
        SpiSink {
            spi,
            write_errors: 0,
        }
    }

    /// Number of bus writes that reported an error and were dropped.
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    /// Release the underlying bus.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiBus<u8>> BitstreamSink for SpiSink<SPI> {
    fn begin(&mut self) {
        if self.spi.flush().is_err() {
            self.write_errors = self.write_errors.wrapping_add(1);
        }
    }

    fn set_rate(&mut self, _hz: u32) {
        // The bus clock is fixed by board bring-up; nothing to do here.
    }

    fn write_word(&mut self, word: u32) {
        if self.spi.write(&word.to_be_bytes()).is_err() {
            self.write_errors = self.write_errors.wrapping_add(1);
        }
    }
}
