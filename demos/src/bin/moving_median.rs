//! # Simple Measurement with Moving Median Filter
//! This example demonstrates how to feed JSN-SR04T distances through a Moving Median Filter.
//! Such filtering can be useful to reduce the noise in the measurements, especially when the sensor is mounted on a moving platform where the angle and distance to objects can change rapidly.
//!
//! Readings at the sensor's "no object" limit and failed measurements are left out of the filter.
//!
//! ## Note
//!
//! The JSN-SR04T is a 5V sensor. The echo pin must be connected to the Pico through a voltage divider.

#![no_std]
#![no_main]

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_time::{Duration, Ticker, Timer};
use embedded_hal::digital::{ErrorType, InputPin};
use jsn_sr04t::{config::TICK_PERIOD_US, Config, JsnSr04t, SharedSensor};
use moving_median::MovingMedian;
use {defmt_rtt as _, panic_probe as _};

static SENSOR: SharedSensor<Output<'static>, LatchedEcho> = SharedSensor::new();
static ECHO_LEVEL: AtomicBool = AtomicBool::new(false);

struct LatchedEcho;

impl ErrorType for LatchedEcho {
    type Error = Infallible;
}

impl InputPin for LatchedEcho {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(ECHO_LEVEL.load(Ordering::Acquire))
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!ECHO_LEVEL.load(Ordering::Acquire))
    }
}

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

// Approximate timing: the ticker shares this executor with `echo_edges` and catches up in
// bursts when it falls behind. Drive `on_tick` from a hardware alarm interrupt for accurate
// distances.
#[embassy_executor::task]
async fn tick() {
    let mut ticker = Ticker::every(Duration::from_micros(TICK_PERIOD_US as u64));
    loop {
        SENSOR.on_tick();
        ticker.next().await;
    }
}

#[embassy_executor::task]
async fn echo_edges(mut echo: Input<'static>) {
    loop {
        echo.wait_for_any_edge().await;
        ECHO_LEVEL.store(echo.is_high(), Ordering::Release);
        SENSOR.on_edge();
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Running!");

    let trigger = Output::new(p.PIN_13, Level::Low);
    let echo = Input::new(p.PIN_28, Pull::None);

    // closer to the real speed of sound than the default shift
    let config = Config::default().with_sound_divisor(58);
    SENSOR.init(JsnSr04t::new(trigger, LatchedEcho, config));

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    unwrap!(high.spawn(tick()));
    unwrap!(high.spawn(echo_edges(echo)));

    let mut moving_median = MovingMedian::<f64, 5>::new();

    loop {
        if SENSOR.start_measurement().is_ok() {
            while !SENSOR.is_finished() {
                Timer::after(Duration::from_millis(1)).await;
            }
            match SENSOR.with(|sensor| sensor.distance_in_range_cm()) {
                Ok(Some(distance)) => {
                    moving_median.add_value(distance as f64);
                    let median_distance = moving_median.median();
                    info!("Median distance: {:?}", median_distance);
                }
                _ => {
                    info!("No valid distance");
                }
            }
        }
        Timer::after(Duration::from_millis(50)).await;
    }
}
