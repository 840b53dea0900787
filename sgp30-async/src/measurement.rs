use crate::config::{ChecksumPolicy, ResponseLayout};
use crate::crc::SensirionCrc;
use crate::ParsingError;

/// eCO2 reported until the first measurement lands; the lowest value the
/// sensor ever outputs.
pub const ECO2_FLOOR: u16 = 400;

/// Output of the IAQ measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AirQuality {
    /// Equivalent CO2 [ppm]
    pub eco2: u16,
    /// Total volatile organic compounds [ppb]
    pub tvoc: u16,
}

impl Default for AirQuality {
    fn default() -> Self {
        Self {
            eco2: ECO2_FLOOR,
            tvoc: 0,
        }
    }
}

/// Output of the raw signal measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSignals {
    pub h2: u16,
    pub ethanol: u16,
}

/// Everything one sampling cycle produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub air_quality: AirQuality,
    pub raw: RawSignals,
}

impl Measurement {
    pub fn eco2(&self) -> u16 {
        self.air_quality.eco2
    }

    pub fn tvoc(&self) -> u16 {
        self.air_quality.tvoc
    }

    pub fn h2(&self) -> u16 {
        self.raw.h2
    }

    pub fn ethanol(&self) -> u16 {
        self.raw.ethanol
    }
}

/// IAQ algorithm baseline pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Baseline {
    pub tvoc: u16,
    pub co2: u16,
}

/// Driver state shared between the sampler and the accessors. Always
/// copied in and out as a whole so readers never see half an update.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct State {
    pub measurement: Measurement,
    pub initialized: bool,
    pub sampling: bool,
}

/// Decodes the two words of a measurement response.
pub(crate) fn decode_pair(
    data: &[u8],
    layout: ResponseLayout,
    policy: ChecksumPolicy,
    crc: &mut SensirionCrc,
) -> Result<(u16, u16), ParsingError> {
    let second = layout.second_word();

    if layout == ResponseLayout::WithCrc
        && policy == ChecksumPolicy::Verify
        && !(crc.verify(&data[..3]) && crc.verify(&data[3..6]))
    {
        return Err(ParsingError::Crc);
    }

    Ok((
        u16::from_be_bytes([data[0], data[1]]),
        u16::from_be_bytes([data[second], data[second + 1]]),
    ))
}

/// Decodes a response of `N` CRC-protected words, always verifying.
pub(crate) fn decode_words<const N: usize>(
    data: &[u8],
    crc: &mut SensirionCrc,
) -> Result<[u16; N], ParsingError> {
    let mut words = [0u16; N];
    for (word, chunk) in words.iter_mut().zip(data.chunks_exact(3)) {
        if !crc.verify(chunk) {
            return Err(ParsingError::Crc);
        }
        *word = u16::from_be_bytes([chunk[0], chunk[1]]);
    }
    Ok(words)
}
