use crc_all::Crc;

/// CRC-8 used by all Sensirion sensors: polynomial 0x31, init 0xFF, no
/// reflection, no final XOR.
pub struct SensirionCrc {
    inner: Crc<u8>,
}

impl SensirionCrc {
    pub fn new() -> Self {
        Self {
            inner: Crc::<u8>::new(0x31, 8, 0xff, 0x00, false),
        }
    }

    pub fn calculate(&mut self, input: &[u8]) -> u8 {
        self.inner.init();
        self.inner.update(input);
        self.inner.finish()
    }

    /// Checks a `[msb, lsb, crc]` triple as it comes off the wire.
    pub fn verify(&mut self, word: &[u8]) -> bool {
        word.len() == 3 && self.calculate(&word[..2]) == word[2]
    }
}

impl Default for SensirionCrc {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum of a single data word, as appended after every word on the bus.
pub fn crc8(msb: u8, lsb: u8) -> u8 {
    SensirionCrc::new().calculate(&[msb, lsb])
}
