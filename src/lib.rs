//! # jsn_sr04t
//!
//! This crate provides an interrupt-driven driver for the JSN-SR04T (and HC-SR04 style)
//! ultrasonic distance sensor.
//!
//! The driver is a small state machine. It never blocks and never waits: the application
//! feeds it from two interrupt sources and polls it, or gets called back, when a
//! measurement is done.
//!
//! - [`JsnSr04t::on_tick`] from a periodic timer, every 10 us by default
//! - [`JsnSr04t::on_edge`] from the echo pin interrupt, on both edges
//!
//! Any pin type implementing the `embedded-hal` 1.0 [`OutputPin`](embedded_hal::digital::OutputPin)
//! and [`InputPin`](embedded_hal::digital::InputPin) traits can be used.
//!
//! A measurement runs through these states:
//!
//! ```text
//! Ready/Finished/Failed --start--> WaitingForTrigger --tick--> TriggerUp
//!   --pulse ticks--> WaitingForEcho --edge (high)--> EchoUp --edge (low)--> Finished
//! ```
//!
//! Any timeout or unexpected echo level ends in `Failed`. A new measurement can always be
//! started from `Ready`, `Finished` or `Failed`.
//!
//! The distance is an integer approximation, `echo_us / 64` by default. Use
//! [`Config::with_sound_divisor`] or [`JsnSr04t::echo_time_us`] for your own conversion.
//!
//! # Example
//!
//! ```rust, ignore
//! #![no_std]
//! #![no_main]
//!
//! use defmt::*;
//! use jsn_sr04t::{Config, JsnSr04t, SharedSensor};
//!
//! static SENSOR: SharedSensor<Output<'static>, Input<'static>> = SharedSensor::new();
//!
//! fn main() -> ! {
//!     SENSOR.init(JsnSr04t::new(trigger, echo, Config::default()));
//!
//!     loop {
//!         if SENSOR.start_measurement().is_ok() {
//!             while !SENSOR.is_finished() {}
//!             info!("Distance: {} cm", SENSOR.distance_cm());
//!         }
//!     }
//! }
//!
//! // timer interrupt every 10 us
//! fn on_timer() {
//!     SENSOR.on_tick();
//! }
//!
//! // echo pin interrupt, rising and falling edge
//! fn on_echo() {
//!     SENSOR.on_edge();
//! }
//! ```

#![no_std]

pub mod config;
pub mod distance;
mod sensor;
mod shared;
mod state;

pub use config::Config;
pub use sensor::JsnSr04t;
pub use shared::SharedSensor;
pub use state::{Error, FailureReason, State};

#[cfg(test)]
mod mock {
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use defmt_rtt as _;
    use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

    // timestamp provider
    static COUNT: AtomicU32 = AtomicU32::new(0);
    defmt::timestamp!("{=u32:us}", COUNT.fetch_add(1, Ordering::Relaxed));

    /// A wire both the sensor and the test can see.
    pub struct Line {
        level: AtomicBool,
        broken: AtomicBool,
        writes: AtomicU32,
    }

    impl Line {
        pub const fn new() -> Self {
            Self {
                level: AtomicBool::new(false),
                broken: AtomicBool::new(false),
                writes: AtomicU32::new(0),
            }
        }

        pub fn set(&self, high: bool) {
            self.level.store(high, Ordering::SeqCst);
        }

        pub fn is_high(&self) -> bool {
            self.level.load(Ordering::SeqCst)
        }

        /// Every pin access fails from now on.
        pub fn break_line(&self) {
            self.broken.store(true, Ordering::SeqCst);
        }

        /// Number of successful writes through a [`TriggerPin`].
        pub fn writes(&self) -> u32 {
            self.writes.load(Ordering::SeqCst)
        }

        fn check(&self) -> Result<(), ErrorKind> {
            if self.broken.load(Ordering::SeqCst) {
                Err(ErrorKind::Other)
            } else {
                Ok(())
            }
        }
    }

    pub struct TriggerPin<'a>(pub &'a Line);

    impl ErrorType for TriggerPin<'_> {
        type Error = ErrorKind;
    }

    impl OutputPin for TriggerPin<'_> {
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.check()?;
            self.0.writes.fetch_add(1, Ordering::SeqCst);
            self.0.set(true);
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.check()?;
            self.0.writes.fetch_add(1, Ordering::SeqCst);
            self.0.set(false);
            Ok(())
        }
    }

    pub struct EchoPin<'a>(pub &'a Line);

    impl ErrorType for EchoPin<'_> {
        type Error = ErrorKind;
    }

    impl InputPin for EchoPin<'_> {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            self.0.check()?;
            Ok(self.0.is_high())
        }
        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|high| !high)
        }
    }
}
