use std::time::Duration;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::{echo_to_mm, wait_for_level_with_timeout};

/// HC-SR04 ultrasonic ranger on two GPIO lines.
pub struct Hcsr04 {
    trig: rppal::gpio::OutputPin,
    echo: rppal::gpio::InputPin,
}

impl Hcsr04 {
    pub fn new(trig_pin: u8, echo_pin: u8) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut trig = gpio
            .get(trig_pin)
            .map_err(|e| HwError::Gpio(format!("open trig pin {trig_pin}: {e}")))?
            .into_output();
        let echo = gpio
            .get(echo_pin)
            .map_err(|e| HwError::Gpio(format!("open echo pin {echo_pin}: {e}")))?
            .into_input();
        trig.set_low();
        Ok(Self { trig, echo })
    }

    /// Fire one ping and measure the echo. `timeout` bounds each edge wait.
    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<f64> {
        // 10us trigger pulse
        self.trig.set_high();
        std::thread::sleep(Duration::from_micros(10));
        self.trig.set_low();

        let echo = &self.echo;
        wait_for_level_with_timeout(|| echo.is_high(), timeout, Duration::ZERO)
            .map_err(|_| HwError::Timeout)?;
        let pulse = wait_for_level_with_timeout(|| echo.is_low(), timeout, Duration::ZERO)?;

        let mm = echo_to_mm(pulse);
        trace!(pulse_us = pulse.as_micros() as u64, mm, "hc-sr04 echo");
        Ok(mm)
    }
}
