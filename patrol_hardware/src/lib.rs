//! Device implementations for the patrol controller: a simulated rig and,
//! with the `hardware` feature, an HC-SR04 range sensor on Raspberry Pi GPIO.
pub mod error;
#[cfg(feature = "hardware")]
pub mod hcsr04;
pub mod sim;
pub mod util;

pub use sim::{SimBody, SimHead, SimInclination, SimRange};

#[cfg(feature = "hardware")]
pub struct HardwareRange {
    sensor: hcsr04::Hcsr04,
    timeout: std::time::Duration,
}

#[cfg(feature = "hardware")]
impl HardwareRange {
    pub fn new(trig_pin: u8, echo_pin: u8, timeout: std::time::Duration) -> error::Result<Self> {
        let sensor = hcsr04::Hcsr04::new(trig_pin, echo_pin)?;
        Ok(HardwareRange { sensor, timeout })
    }
}

#[cfg(feature = "hardware")]
impl patrol_traits::RangeSensor for HardwareRange {
    fn distance_mm(&mut self) -> patrol_traits::HwResult<f64> {
        let mut attempts = 0;
        let max_attempts = 3;
        loop {
            match self.sensor.read_with_timeout(self.timeout) {
                Ok(mm) => {
                    tracing::debug!(mm, "hc-sr04 sample");
                    return Ok(mm);
                }
                Err(error::HwError::Timeout) if attempts < max_attempts => {
                    attempts += 1;
                    tracing::warn!(retries = attempts, "range timeout, retrying");
                }
                Err(e) => {
                    tracing::error!("range read error: {}", e);
                    return Err(Box::new(e));
                }
            }
        }
    }
}
