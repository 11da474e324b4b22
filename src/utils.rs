//! Step/angle conversions.
//!
//! A sensor's `area_resolution` steps span a full revolution, and the front
//! step points along 0 rad. The functions are pure so they can be used on
//! recorded data without a live session; the driver exposes the same math as
//! methods gated on an open connection.

use crate::params::SensorParameters;
use std::f64::consts::PI;

/// Angle in radians of `step`, measured from the sensor's forward axis.
/// Steps outside the valid window are clamped.
pub fn step_to_radian(sensor: &SensorParameters, first_step: i32, step: i32) -> f64 {
    let actual = step.clamp(0, sensor.last_index);
    let index = actual - sensor.front_index + first_step;
    2.0 * PI * f64::from(index) / f64::from(sensor.area_resolution)
}

/// Nearest step for an angle in radians, clamped to the valid window.
pub fn radian_to_step(sensor: &SensorParameters, first_step: i32, radian: f64) -> i32 {
    let step = (f64::from(sensor.area_resolution) * radian / (2.0 * PI) + 0.5).floor() as i32
        + sensor.front_index
        - first_step;
    step.clamp(0, sensor.last_index)
}
