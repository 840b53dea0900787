use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::compensation;
use crate::config::Config;
use crate::measurement::{decode_words, Baseline, Measurement, State};
use crate::sampler::SpawnSampler;
use crate::transport::{SensirionCommand, Transport};
use crate::Error;

/// 7-bit bus address of the SGP30.
pub const ADDRESS: u8 = 0x58;

const SERIAL_NUMBER_DELAY_MS: u32 = 1;
const FEATURE_SET_DELAY_MS: u32 = 10;

#[repr(u16)]
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Command {
    InitAirQuality = 0x2003,
    MeasureAirQuality = 0x2008,
    GetBaseline = 0x2015,
    SetBaseline = 0x201e,
    GetFeatureSet = 0x202f,
    MeasureRawSignals = 0x2050,
    SetHumidity = 0x2061,
    GetSerialNumber = 0x3682,
}

impl SensirionCommand for Command {
    fn raw(&self) -> u16 {
        *self as u16
    }
}

/// SGP30 driver shared between the application and the background sampler.
///
/// `M` selects the mutex flavour guarding the bus and the cached readings,
/// `S` is how the sampler task gets started (see [`SpawnSampler`]).
pub struct Sgp30<M, T, D, S>
where
    M: RawMutex,
{
    pub(crate) transport: Mutex<M, Transport<T, D>>,
    pub(crate) state: BlockingMutex<M, Cell<State>>,
    baseline: BlockingMutex<M, Cell<Option<Baseline>>>,
    init_lock: Mutex<M, ()>,
    pub(crate) stop: Signal<M, ()>,
    pub(crate) delay: D,
    pub(crate) spawner: S,
    pub(crate) config: Config,
}

impl<M, T, D, S> Sgp30<M, T, D, S>
where
    M: RawMutex,
    T: I2c,
    D: DelayNs + Clone,
{
    pub fn new(i2c: T, delay: D, spawner: S) -> Self {
        Self::with_config(i2c, delay, spawner, Config::default())
    }

    pub fn with_config(i2c: T, delay: D, spawner: S, config: Config) -> Self {
        Self {
            transport: Mutex::new(Transport::new(i2c, delay.clone(), ADDRESS)),
            state: BlockingMutex::new(Cell::new(State::default())),
            baseline: BlockingMutex::new(Cell::new(None)),
            init_lock: Mutex::new(()),
            stop: Signal::new(),
            delay,
            spawner,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.snapshot().initialized
    }

    pub fn is_sampling(&self) -> bool {
        self.snapshot().sampling
    }

    /// Last baseline successfully written with [`Sgp30::set_baseline`], if any.
    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline.lock(|baseline| baseline.get())
    }

    /// 48-bit serial number of the chip.
    pub async fn get_serial_number(&self) -> Result<u64, Error<T::Error>> {
        let mut buffer = [0u8; 9];
        let mut transport = self.transport.lock().await;
        transport
            .write_read(Command::GetSerialNumber, SERIAL_NUMBER_DELAY_MS, &mut buffer)
            .await?;
        let [high, mid, low] = decode_words::<3>(&buffer, &mut transport.crc)?;

        Ok(u64::from(high) << 32 | u64::from(mid) << 16 | u64::from(low))
    }

    /// Product type and version word.
    pub async fn get_feature_set(&self) -> Result<u16, Error<T::Error>> {
        let mut buffer = [0u8; 3];
        let mut transport = self.transport.lock().await;
        transport
            .write_read(Command::GetFeatureSet, FEATURE_SET_DELAY_MS, &mut buffer)
            .await?;
        let [feature_set] = decode_words::<1>(&buffer, &mut transport.crc)?;

        Ok(feature_set)
    }

    pub(crate) fn snapshot(&self) -> State {
        self.state.lock(|state| state.get())
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut State)) {
        self.state.lock(|state| {
            let mut current = state.get();
            f(&mut current);
            state.set(current);
        });
    }
}

impl<M, T, D, S> Sgp30<M, T, D, S>
where
    M: RawMutex + 'static,
    T: I2c + 'static,
    D: DelayNs + Clone + 'static,
    S: SpawnSampler<Sgp30<M, T, D, S>> + 'static,
{
    /// Starts the IAQ algorithm, waits out the burn-in and starts the
    /// sampler. Does nothing once both have happened.
    ///
    /// A failed init command leaves the sensor uninitialized, so the next
    /// call tries again.
    pub async fn init(&'static self) -> Result<(), Error<T::Error>> {
        let state = self.snapshot();
        if state.initialized && state.sampling {
            return Ok(());
        }

        let _guard = self.init_lock.lock().await;

        if !self.snapshot().initialized {
            {
                let mut transport = self.transport.lock().await;
                transport.write_command(Command::InitAirQuality).await?;
                transport.delay_ms(self.config.timings.init).await;
            }

            info!("SGP30 initialized, burn-in for {} ms", self.config.timings.burn_in);
            self.delay
                .clone()
                .delay_ms(self.config.timings.burn_in)
                .await;

            self.update(|state| state.initialized = true);
        }

        if !self.snapshot().sampling {
            self.stop.reset();
            self.spawner.spawn_sampler(self)?;
            self.update(|state| state.sampling = true);
            debug!("SGP30 sampler started");
        }

        Ok(())
    }

    /// Latest readings as one consistent snapshot.
    pub async fn measurement(&'static self) -> Result<Measurement, Error<T::Error>> {
        self.init().await?;
        Ok(self.snapshot().measurement)
    }

    /// Equivalent CO2 [ppm]
    pub async fn eco2(&'static self) -> Result<u16, Error<T::Error>> {
        Ok(self.measurement().await?.eco2())
    }

    /// Total volatile organic compounds [ppb]
    pub async fn tvoc(&'static self) -> Result<u16, Error<T::Error>> {
        Ok(self.measurement().await?.tvoc())
    }

    pub async fn raw_h2(&'static self) -> Result<u16, Error<T::Error>> {
        Ok(self.measurement().await?.h2())
    }

    pub async fn raw_ethanol(&'static self) -> Result<u16, Error<T::Error>> {
        Ok(self.measurement().await?.ethanol())
    }

    /// Compensates the IAQ algorithm for ambient temperature [°C] and
    /// relative humidity [%]. Values outside the sensor's range are clamped.
    pub async fn set_climate_compensation(
        &'static self,
        temperature: f32,
        humidity: f32,
    ) -> Result<(), Error<T::Error>> {
        self.set_absolute_humidity(compensation::encode(temperature, humidity))
            .await
    }

    /// Sets absolute humidity directly as an 8.8 fixed-point value in g/m³.
    /// Zero turns the compensation off.
    pub async fn set_absolute_humidity(&'static self, raw: u16) -> Result<(), Error<T::Error>> {
        self.init().await?;

        let mut transport = self.transport.lock().await;
        transport.write_words(Command::SetHumidity, &[raw]).await?;
        transport.delay_ms(self.config.timings.humidity).await;

        Ok(())
    }

    /// Restores a previously saved IAQ baseline.
    pub async fn set_baseline(&'static self, tvoc: u16, co2: u16) -> Result<(), Error<T::Error>> {
        self.init().await?;

        let mut transport = self.transport.lock().await;
        transport
            .write_words(Command::SetBaseline, &[tvoc, co2])
            .await?;

        self.baseline
            .lock(|baseline| baseline.set(Some(Baseline { tvoc, co2 })));

        transport.delay_ms(self.config.timings.baseline).await;

        Ok(())
    }

    /// Reads the baseline the IAQ algorithm currently runs with.
    pub async fn read_baseline(&'static self) -> Result<Baseline, Error<T::Error>> {
        self.init().await?;

        let mut buffer = [0u8; 6];
        let mut transport = self.transport.lock().await;
        transport
            .write_read(
                Command::GetBaseline,
                self.config.timings.baseline,
                &mut buffer,
            )
            .await?;
        let [co2, tvoc] = decode_words::<2>(&buffer, &mut transport.crc)?;

        Ok(Baseline { tvoc, co2 })
    }
}
