#![no_std]
#![no_main]
#![feature(type_alias_impl_trait)]

use defmt_rtt as _;
use static_cell::make_static;

use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Output, Pin};
use embassy_nrf::interrupt::{self, InterruptExt};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_time::{Duration, Timer};
use embedded_hal_async::delay::DelayNs;

use sgp30_async::{Sgp30, SpawnError, SpawnSampler};

#[cfg(feature = "dev")]
use panic_probe as _;

#[cfg(not(feature = "dev"))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    defmt::error!("panic!");
    cortex_m::peripheral::SCB::sys_reset();
}

#[cortex_m_rt::exception]
unsafe fn HardFault(_frame: &cortex_m_rt::ExceptionFrame) -> ! {
    cortex_m::peripheral::SCB::sys_reset()
}

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

type Sensor = Sgp30<ThreadModeRawMutex, Twim<'static, peripherals::TWISPI0>, Wait, Launcher>;

/// Ambient conditions the node is deployed in, until it gets its own
/// humidity sensor.
const TEMPERATURE: f32 = 22.0;
const HUMIDITY: f32 = 45.0;

const REPORTING_PERIOD: Duration = Duration::from_secs(5);

/// embassy-time backed delay the driver can clone for every task.
#[derive(Clone, Copy)]
struct Wait;

impl DelayNs for Wait {
    async fn delay_ns(&mut self, ns: u32) {
        Timer::after_nanos(ns as u64).await
    }

    async fn delay_us(&mut self, us: u32) {
        Timer::after_micros(us as u64).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        Timer::after_millis(ms as u64).await
    }
}

/// Starts the sampler on the main executor.
struct Launcher(Spawner);

impl SpawnSampler<Sensor> for Launcher {
    fn spawn_sampler(&self, sensor: &'static Sensor) -> Result<(), SpawnError> {
        self.0.spawn(sampler_task(sensor)).map_err(|_| SpawnError)
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = embassy_nrf::config::Config::default();
    config.hfclk_source = embassy_nrf::config::HfclkSource::Internal;
    config.lfclk_source = embassy_nrf::config::LfclkSource::InternalRC;
    config.time_interrupt_priority = interrupt::Priority::P2;
    config.gpiote_interrupt_priority = interrupt::Priority::P7;

    let p = embassy_nrf::init(config);

    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(interrupt::Priority::P2);

    let led = Output::new(
        p.P1_15.degrade(),
        embassy_nrf::gpio::Level::Low,
        embassy_nrf::gpio::OutputDrive::Standard,
    );
    spawner.spawn(blinky(led)).unwrap();

    let twi = Twim::new(p.TWISPI0, Irqs, p.P0_12, p.P0_13, Default::default());
    let sensor: &'static Sensor = make_static!(Sgp30::new(twi, Wait, Launcher(spawner)));

    match sensor.get_serial_number().await {
        Ok(serial_number) => defmt::info!("SGP30 serial number: {=u64:x}", serial_number),
        Err(e) => defmt::error!("Failed to read SGP30 serial number: {}", e),
    }

    // Starts the sampler after the burn-in.
    if let Err(e) = sensor
        .set_climate_compensation(TEMPERATURE, HUMIDITY)
        .await
    {
        defmt::error!("Failed to set SGP30 humidity compensation: {}", e);
    }

    spawner.spawn(reporting_task(sensor)).unwrap();
}

/// Blink the LED for a very short time, to avoid the blinking being distracting at night
#[embassy_executor::task]
async fn blinky(mut led: Output<'static, AnyPin>) {
    loop {
        led.set_high();
        Timer::after_millis(50).await;
        led.set_low();
        Timer::after_secs(60).await;
    }
}

#[embassy_executor::task]
async fn sampler_task(sensor: &'static Sensor) {
    sensor.run().await
}

/// Logs the latest readings every few seconds
#[embassy_executor::task]
async fn reporting_task(sensor: &'static Sensor) {
    loop {
        match sensor.measurement().await {
            Ok(measurement) => {
                defmt::info!(
                    "eCO2: {} ppm, TVOC: {} ppb, H2: {}, Ethanol: {}",
                    measurement.eco2(),
                    measurement.tvoc(),
                    measurement.h2(),
                    measurement.ethanol()
                );
            }
            Err(err) => {
                defmt::error!("Error accessing SGP30: {}", err);
            }
        }

        Timer::after(REPORTING_PERIOD).await;
    }
}
