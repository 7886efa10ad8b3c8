//! # Completion Callback
//! This example demonstrates how to get notified when a measurement is done instead of polling.
//!
//! The callback runs at the end of `on_tick` or `on_edge`, i.e. in the high priority executor,
//! after the sensor lock is released. It only signals the main task, which then reads the result.
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
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};
use embedded_hal::digital::{ErrorType, InputPin};
use jsn_sr04t::{Config, JsnSr04t, SharedSensor, State};
use {defmt_rtt as _, panic_probe as _};

/// This demo runs the timer at 20us, the driver rescales its pulse and timeout.
const TICK_PERIOD_US: u32 = 20;

static SENSOR: SharedSensor<Output<'static>, LatchedEcho> = SharedSensor::new();
static ECHO_LEVEL: AtomicBool = AtomicBool::new(false);
static MEASURED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

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

fn measured() {
    MEASURED.signal(());
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

    let mut sensor = JsnSr04t::new(
        trigger,
        LatchedEcho,
        Config::for_tick_period_us(TICK_PERIOD_US),
    );
    info!("Tick period: {} us", sensor.config().tick_period_us);
    sensor.attach(measured);
    SENSOR.init(sensor);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    unwrap!(high.spawn(tick()));
    unwrap!(high.spawn(echo_edges(echo)));

    loop {
        MEASURED.reset();
        if let Err(e) = SENSOR.start_measurement() {
            info!("Error: {:?}", e);
            Timer::after(Duration::from_millis(100)).await;
            continue;
        }

        MEASURED.wait().await;
        let (state, distance, echo_us) = unwrap!(SENSOR.with(|sensor| (
            sensor.state(),
            sensor.distance_cm(),
            sensor.echo_time_us()
        )));
        match state {
            State::Finished => info!("Distance: {} cm (echo {} us)", distance, echo_us),
            _ => info!("Measurement failed"),
        }

        Timer::after(Duration::from_millis(500)).await;
    }
}
