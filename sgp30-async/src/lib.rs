//! Async driver for the Sensirion SGP30 air quality sensor.
//!
//! The driver owns the sensor's bus traffic behind an async mutex so that
//! the background sampler and foreground calls (humidity compensation,
//! baseline) never interleave a transaction. The latest readings are kept
//! in a snapshot that accessors read without touching the bus.
//!
//! The sampler runs as its own task, started through [`SpawnSampler`] the
//! first time the sensor is initialized.
#![cfg_attr(not(test), no_std)]

// must go first so the logging macros are visible to the other modules
mod fmt;

pub mod compensation;
pub mod config;
pub mod crc;
pub mod measurement;
mod sampler;
mod sgp30;
#[cfg(test)]
mod test_support;
pub mod transport;

pub use crate::config::{ChecksumPolicy, Config, ResponseLayout, Timings};
pub use crate::crc::crc8;
pub use crate::measurement::{AirQuality, Baseline, Measurement, RawSignals, ECO2_FLOOR};
pub use crate::sampler::{SpawnError, SpawnSampler};
pub use crate::sgp30::{Sgp30, ADDRESS};

#[derive(Debug)]
pub enum Error<Inner: core::fmt::Debug> {
    Bus(Inner),
    Parsing(ParsingError),
    /// The background sampler could not be started.
    Spawn,
}

impl<E: embedded_hal_async::i2c::Error> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::Bus(e)
    }
}

#[cfg(feature = "defmt")]
impl<E: embedded_hal_async::i2c::Error + defmt::Format> defmt::Format for Error<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::Bus(e) => e.format(fmt),
            Error::Parsing(e) => e.format(fmt),
            Error::Spawn => defmt::write!(fmt, "Spawn"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParsingError {
    Crc,
}

impl<T: core::fmt::Debug> From<ParsingError> for Error<T> {
    fn from(e: ParsingError) -> Self {
        Error::Parsing(e)
    }
}

impl<T: core::fmt::Debug> From<SpawnError> for Error<T> {
    fn from(_: SpawnError) -> Self {
        Error::Spawn
    }
}
