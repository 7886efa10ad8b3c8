//! # Simple Measurement
//! This example demonstrates how to poll the JSN-SR04T driver for a distance in a loop.
//!
//! The driver itself never waits. Two high priority tasks feed it: a 10us ticker calls `on_tick`,
//! and the echo pin task calls `on_edge` on every level change. The main task only starts
//! measurements and polls for the outcome.
//!
//! ## Note
//!
//! The JSN-SR04T is a 5V sensor. The Raspberry Pi Pico is a 3.3V device.
//!
//! - The trigger pin can be directly connected to the controller. 3.3V is enough to trigger the sensor.
//! - The echo pin must be connected to the controller through a voltage divider to reduce the voltage from 5V to 3.3V.

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
use {defmt_rtt as _, panic_probe as _};

static SENSOR: SharedSensor<Output<'static>, LatchedEcho> = SharedSensor::new();

/// Echo level as sampled by the edge task right before it calls `on_edge`.
static ECHO_LEVEL: AtomicBool = AtomicBool::new(false);

/// The echo `Input` is owned by the edge task, the sensor reads the latched level instead.
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

    SENSOR.init(JsnSr04t::new(trigger, LatchedEcho, Config::default()));

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    unwrap!(high.spawn(tick()));
    unwrap!(high.spawn(echo_edges(echo)));

    loop {
        match SENSOR.start_measurement() {
            Ok(()) => {
                while !SENSOR.is_finished() {
                    Timer::after(Duration::from_millis(1)).await;
                }
                match SENSOR.with(|sensor| sensor.outcome()) {
                    Ok(Some(Ok(distance))) => info!("Distance: {} cm", distance),
                    Ok(Some(Err(reason))) => info!("Measurement failed: {:?}", reason),
                    _ => {}
                }
            }
            Err(e) => {
                info!("Error: {:?}", e);
            }
        }
        Timer::after(Duration::from_secs(1)).await;
    }
}
