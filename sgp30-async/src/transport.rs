use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::crc::SensirionCrc;
use crate::Error;

pub trait SensirionCommand {
    fn raw(&self) -> u16;
}

/// Longest write the driver issues: a command followed by two words with
/// their checksums.
const MAX_WRITE: usize = 2 + 2 * 3;

/// Rejects, at compile time, word counts that do not fit a single write.
struct WordsFit<const N: usize>;

impl<const N: usize> WordsFit<N> {
    const CHECK: () = assert!(2 + 3 * N <= MAX_WRITE, "too many words for one write");
}

/// Command level access to a single Sensirion device on an I2C bus.
///
/// Every method is one complete transaction. Holding `&mut Transport` for
/// the duration of a call is what keeps transactions from interleaving.
pub struct Transport<T, D> {
    bus: T,
    delay: D,
    address: u8,
    pub(crate) crc: SensirionCrc,
}

impl<T, D> Transport<T, D>
where
    T: I2c,
    D: DelayNs,
{
    pub fn new(bus: T, delay: D, address: u8) -> Self {
        Self {
            bus,
            delay,
            address,
            crc: Default::default(),
        }
    }

    pub async fn write_command<Command: SensirionCommand>(
        &mut self,
        command: Command,
    ) -> Result<(), Error<T::Error>> {
        self.bus
            .write(self.address, &command.raw().to_be_bytes())
            .await?;
        Ok(())
    }

    /// Sends the command followed by each word and its checksum in one write.
    pub async fn write_words<Command: SensirionCommand, const N: usize>(
        &mut self,
        command: Command,
        words: &[u16; N],
    ) -> Result<(), Error<T::Error>> {
        #[allow(clippy::let_unit_value)]
        let () = WordsFit::<N>::CHECK;

        let mut buffer = [0u8; MAX_WRITE];
        let len = 2 + 3 * N;

        buffer[0..2].copy_from_slice(&command.raw().to_be_bytes());
        for (word, chunk) in words.iter().zip(buffer[2..len].chunks_exact_mut(3)) {
            let raw = word.to_be_bytes();
            chunk[..2].copy_from_slice(&raw);
            chunk[2] = self.crc.calculate(&raw);
        }

        self.bus.write(self.address, &buffer[..len]).await?;

        Ok(())
    }

    /// Sends the command, waits for the conversion and reads the response.
    pub async fn write_read<Command: SensirionCommand>(
        &mut self,
        command: Command,
        delay_ms: u32,
        buffer: &mut [u8],
    ) -> Result<(), Error<T::Error>> {
        self.write_command(command).await?;

        self.delay.delay_ms(delay_ms).await;

        self.bus.read(self.address, buffer).await?;
        Ok(())
    }

    pub async fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }
}
