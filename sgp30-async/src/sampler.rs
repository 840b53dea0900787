use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::measurement::{decode_pair, AirQuality, Measurement, RawSignals};
use crate::sgp30::{Command, Sgp30};
use crate::Error;

/// The task could not be started, usually because the executor ran out of
/// task slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpawnError;

/// Starts [`Sgp30::run`] as a background task.
///
/// The driver calls this once, from its first successful init. The
/// implementation must not wait for the task, only hand it to the executor:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn sampler_task(sensor: &'static Sensor) {
///     sensor.run().await
/// }
///
/// impl SpawnSampler<Sensor> for Launcher {
///     fn spawn_sampler(&self, sensor: &'static Sensor) -> Result<(), SpawnError> {
///         self.0.spawn(sampler_task(sensor)).map_err(|_| SpawnError)
///     }
/// }
/// ```
pub trait SpawnSampler<Sensor: 'static> {
    fn spawn_sampler(&self, sensor: &'static Sensor) -> Result<(), SpawnError>;
}

impl<M, T, D, S> Sgp30<M, T, D, S>
where
    M: RawMutex,
    T: I2c,
    D: DelayNs + Clone,
{
    /// Samples the sensor once per period until [`Sgp30::stop`] is called.
    ///
    /// Failed cycles are logged and leave the cached readings untouched;
    /// the loop itself never gives up.
    pub async fn run(&self) {
        let mut delay = self.delay.clone();

        loop {
            match self.cycle().await {
                Ok(measurement) => {
                    trace!(
                        "SGP30: eco2 {} ppm, tvoc {} ppb, h2 {}, ethanol {}",
                        measurement.eco2(),
                        measurement.tvoc(),
                        measurement.h2(),
                        measurement.ethanol()
                    );
                }
                Err(Error::Parsing(_)) => {
                    warn!("SGP30: checksum mismatch, keeping previous readings");
                }
                Err(_) => {
                    error!("SGP30: bus error, retrying next cycle");
                }
            }

            if self.stop.signaled() {
                break;
            }

            if let Either::Second(()) =
                select(delay.delay_ms(self.config.idle_ms()), self.stop.wait()).await
            {
                break;
            }
        }

        self.stop.reset();
        self.update(|state| state.sampling = false);
        debug!("SGP30 sampler stopped");
    }

    /// Asks [`Sgp30::run`] to return. The cycle in progress, if any, is
    /// completed first.
    pub fn stop(&self) {
        self.stop.signal(());
    }

    /// One sampling cycle: IAQ measurement, raw signal measurement, publish.
    ///
    /// Nothing is published unless both measurements succeed.
    pub async fn cycle(&self) -> Result<Measurement, Error<T::Error>> {
        let timings = self.config.timings;

        let (eco2, tvoc) = self
            .measure(Command::MeasureAirQuality, timings.measure_iaq)
            .await?;
        let (h2, ethanol) = self
            .measure(Command::MeasureRawSignals, timings.measure_raw)
            .await?;

        let measurement = Measurement {
            air_quality: AirQuality { eco2, tvoc },
            raw: RawSignals { h2, ethanol },
        };
        self.update(|state| state.measurement = measurement);

        Ok(measurement)
    }

    async fn measure(&self, command: Command, delay_ms: u32) -> Result<(u16, u16), Error<T::Error>> {
        let layout = self.config.layout;
        let mut buffer = [0u8; 6];
        let buffer = &mut buffer[..layout.response_len()];

        let mut transport = self.transport.lock().await;
        transport.write_read(command, delay_ms, buffer).await?;

        Ok(decode_pair(
            buffer,
            layout,
            self.config.checksum,
            &mut transport.crc,
        )?)
    }
}
