/// Shape of the 4-value responses to the measurement commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseLayout {
    /// `msb, lsb, crc, msb, lsb, crc`, as the sensor sends it.
    #[default]
    WithCrc,
    /// `msb, lsb, msb, lsb`, for adapters that strip the checksum bytes.
    Plain,
}

impl ResponseLayout {
    /// Number of bytes read back for a two-word response.
    pub const fn response_len(&self) -> usize {
        match self {
            ResponseLayout::WithCrc => 6,
            ResponseLayout::Plain => 4,
        }
    }

    /// Offset of the second word within the response.
    pub(crate) const fn second_word(&self) -> usize {
        match self {
            ResponseLayout::WithCrc => 3,
            ResponseLayout::Plain => 2,
        }
    }
}

/// What to do with the checksum bytes of a [`ResponseLayout::WithCrc`]
/// measurement response. Has no effect on the plain layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumPolicy {
    /// Decode the data words and skip the checksum bytes.
    #[default]
    Ignore,
    /// Reject the response when a checksum does not match.
    Verify,
}

/// Conversion times, in milliseconds, waited between a command and its
/// response. Defaults are the datasheet minimums.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timings {
    pub init: u32,
    pub measure_iaq: u32,
    pub measure_raw: u32,
    pub baseline: u32,
    pub humidity: u32,
    /// One-time warm-up after the first IAQ init.
    pub burn_in: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            init: 10,
            measure_iaq: 12,
            measure_raw: 25,
            baseline: 10,
            humidity: 10,
            burn_in: 15_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub timings: Timings,
    pub layout: ResponseLayout,
    pub checksum: ChecksumPolicy,
    /// Length of one sampling cycle in milliseconds. The IAQ algorithm
    /// expects exactly one measurement per second.
    pub period_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            layout: ResponseLayout::default(),
            checksum: ChecksumPolicy::default(),
            period_ms: 1000,
        }
    }
}

impl Config {
    /// Time left in a sampling period once both measurements have been
    /// waited for.
    pub fn idle_ms(&self) -> u32 {
        self.period_ms
            .saturating_sub(self.timings.measure_iaq)
            .saturating_sub(self.timings.measure_raw)
    }
}
