use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, Operation};
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;

use crate::crc::crc8;
use crate::sampler::{SpawnError, SpawnSampler};
use crate::sgp30::Sgp30;

pub type TestSensor = Sgp30<NoopRawMutex, I2cMock, RecordingDelay, CountingSpawner>;

pub fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

/// Words as the sensor sends them, each followed by its checksum.
pub fn words(values: &[u16]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|word| {
            let [msb, lsb] = word.to_be_bytes();
            [msb, lsb, crc8(msb, lsb)]
        })
        .collect()
}

/// Remembers every millisecond delay asked for and yields once, so other
/// futures get polled while "waiting".
#[derive(Clone, Default)]
pub struct RecordingDelay {
    calls: Rc<RefCell<Vec<u32>>>,
    hook: Rc<RefCell<Option<(u32, Box<dyn Fn()>)>>>,
}

impl RecordingDelay {
    pub fn calls(&self) -> Vec<u32> {
        self.calls.borrow().clone()
    }

    /// Runs `f` whenever a delay of exactly `ms` starts.
    pub fn on_delay(&self, ms: u32, f: impl Fn() + 'static) {
        *self.hook.borrow_mut() = Some((ms, Box::new(f)));
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.calls.borrow_mut().push(ms);
        if let Some((trigger, f)) = self.hook.borrow().as_ref() {
            if *trigger == ms {
                f();
            }
        }
        yield_now().await;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusOp {
    Write(Vec<u8>),
    Read(usize),
}

/// I2C bus that yields before every operation and logs what it saw.
/// Reads are served from a queue of canned responses.
#[derive(Clone, Default)]
pub struct RecordingBus {
    log: Rc<RefCell<Vec<BusOp>>>,
    responses: Rc<RefCell<VecDeque<Vec<u8>>>>,
}

impl RecordingBus {
    pub fn respond(&self, response: Vec<u8>) {
        self.responses.borrow_mut().push_back(response);
    }

    pub fn log(&self) -> Vec<BusOp> {
        self.log.borrow().clone()
    }
}

impl ErrorType for RecordingBus {
    type Error = ErrorKind;
}

impl I2c for RecordingBus {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            yield_now().await;
            match operation {
                Operation::Write(bytes) => {
                    self.log.borrow_mut().push(BusOp::Write(bytes.to_vec()));
                }
                Operation::Read(buffer) => {
                    let response = self
                        .responses
                        .borrow_mut()
                        .pop_front()
                        .ok_or(ErrorKind::Other)?;
                    buffer.copy_from_slice(&response);
                    self.log.borrow_mut().push(BusOp::Read(buffer.len()));
                }
            }
        }
        Ok(())
    }
}

/// Counts sampler launches without running anything.
#[derive(Default)]
pub struct CountingSpawner {
    spawned: Cell<usize>,
    fail_next: Cell<bool>,
}

impl CountingSpawner {
    pub fn spawned(&self) -> usize {
        self.spawned.get()
    }

    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }
}

impl<Sensor: 'static> SpawnSampler<Sensor> for CountingSpawner {
    fn spawn_sampler(&self, _sensor: &'static Sensor) -> Result<(), SpawnError> {
        if self.fail_next.replace(false) {
            return Err(SpawnError);
        }
        self.spawned.set(self.spawned.get() + 1);
        Ok(())
    }
}
