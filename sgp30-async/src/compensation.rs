//! Humidity compensation.
//!
//! The sensor takes absolute humidity in g/m³ as an unsigned 8.8 fixed-point
//! number. It is derived from temperature and relative humidity with the
//! Magnus approximation of the saturation vapor pressure.

pub const MIN_TEMPERATURE: f32 = -45.0;
pub const MAX_TEMPERATURE: f32 = 130.0;
pub const MIN_HUMIDITY: f32 = 0.0;
pub const MAX_HUMIDITY: f32 = 100.0;

/// Clamps temperature [°C] and relative humidity [%] into the range the
/// sensor is specified for. NaN ends up at the lower bound.
pub fn clamp(temperature: f32, humidity: f32) -> (f32, f32) {
    (
        clamp_one(temperature, MIN_TEMPERATURE, MAX_TEMPERATURE),
        clamp_one(humidity, MIN_HUMIDITY, MAX_HUMIDITY),
    )
}

fn clamp_one(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Absolute humidity in g/m³. Inputs are expected to be clamped already.
pub fn absolute_humidity(temperature: f32, humidity: f32) -> f32 {
    let saturation = 6.112 * libm::expf((17.62 * temperature) / (243.12 + temperature));
    216.7 * (humidity / 100.0) * saturation / (273.15 + temperature)
}

/// Encodes temperature and relative humidity into the 8.8 fixed-point
/// absolute humidity word the sensor expects. Out of range inputs are
/// clamped, results beyond the word saturate at `u16::MAX`.
pub fn encode(temperature: f32, humidity: f32) -> u16 {
    let (temperature, humidity) = clamp(temperature, humidity);
    let scaled = libm::roundf(absolute_humidity(temperature, humidity) * 256.0);

    if scaled >= u16::MAX as f32 {
        u16::MAX
    } else if scaled <= 0.0 {
        0
    } else {
        scaled as u16
    }
}
