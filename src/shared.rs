//! Interrupt-safe access to a sensor.
//!
//! The tick timer, the echo pin interrupt and the main loop may all preempt each other.
//! [`SharedSensor`] runs every entry point inside one critical section, so a tick and an
//! edge can never tear the state/counter pair. Whichever handler enters first wins: a
//! tick that lands just before a falling edge is counted, a tick that lands just after it
//! is a no-op.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::sensor::JsnSr04t;
use crate::state::{Error, State};

/// A sensor slot that can live in a `static` and be driven from interrupt handlers.
///
/// ```rust, ignore
/// static SENSOR: SharedSensor<Output<'static>, Input<'static>> = SharedSensor::new();
///
/// // timer interrupt, every 10 us
/// SENSOR.on_tick();
/// // echo pin interrupt, both edges
/// SENSOR.on_edge();
/// ```
pub struct SharedSensor<TRIGPIN, ECHOPIN> {
    inner: Mutex<RefCell<Option<JsnSr04t<TRIGPIN, ECHOPIN>>>>,
}

impl<TRIGPIN, ECHOPIN> Default for SharedSensor<TRIGPIN, ECHOPIN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<TRIGPIN, ECHOPIN> SharedSensor<TRIGPIN, ECHOPIN> {
    /// An empty slot. Install a sensor with [`init`](Self::init).
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install a sensor, returning the one it replaces.
    ///
    /// Called from inside [`with`](Self::with) the slot is in use, nothing is installed and
    /// `sensor` itself is handed back.
    pub fn init(
        &self,
        sensor: JsnSr04t<TRIGPIN, ECHOPIN>,
    ) -> Option<JsnSr04t<TRIGPIN, ECHOPIN>> {
        critical_section::with(|cs| match self.inner.borrow(cs).try_borrow_mut() {
            Ok(mut slot) => slot.replace(sensor),
            Err(_) => Some(sensor),
        })
    }

    /// Remove the sensor from the slot. `None` if empty or in use.
    pub fn take(&self) -> Option<JsnSr04t<TRIGPIN, ECHOPIN>> {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .and_then(|mut slot| slot.take())
        })
    }

    /// Run `f` on the sensor inside a critical section.
    ///
    /// Keep `f` short, interrupts are held off while it runs. Returns
    /// [`Error::Uninitialized`] for an empty slot and [`Error::Busy`] when called from
    /// inside another `f`.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut JsnSr04t<TRIGPIN, ECHOPIN>) -> R,
    ) -> Result<R, Error> {
        critical_section::with(|cs| {
            let mut slot = self.inner.borrow(cs).try_borrow_mut().map_err(|_| Error::Busy)?;
            slot.as_mut().map(f).ok_or(Error::Uninitialized)
        })
    }

    /// The current state. An empty or busy slot reads as [`State::Ready`].
    pub fn state(&self) -> State {
        self.with(|sensor| sensor.state()).unwrap_or(State::Ready)
    }

    pub fn is_finished(&self) -> bool {
        self.with(|sensor| sensor.is_finished()).unwrap_or(false)
    }

    /// See [`JsnSr04t::distance_cm`]. 0 for an empty or busy slot.
    pub fn distance_cm(&self) -> u32 {
        self.with(|sensor| sensor.distance_cm()).unwrap_or(0)
    }
}

impl<TRIGPIN, ECHOPIN> SharedSensor<TRIGPIN, ECHOPIN>
where
    TRIGPIN: OutputPin,
    ECHOPIN: InputPin,
{
    /// See [`JsnSr04t::start_measurement`].
    pub fn start_measurement(&self) -> Result<(), Error> {
        self.with(|sensor| sensor.start_measurement())?
    }

    /// See [`JsnSr04t::on_tick`]. Does nothing for an empty slot.
    ///
    /// The completion callback runs after the critical section is left.
    pub fn on_tick(&self) {
        run_completion(self.with(|sensor| {
            sensor.tick();
            sensor.take_completion()
        }));
    }

    /// See [`JsnSr04t::on_edge`]. Does nothing for an empty slot.
    ///
    /// The completion callback runs after the critical section is left.
    pub fn on_edge(&self) {
        run_completion(self.with(|sensor| {
            sensor.edge();
            sensor.take_completion()
        }));
    }
}

fn run_completion(completion: Result<Option<fn()>, Error>) {
    if let Ok(Some(callback)) = completion {
        callback();
    }
}
