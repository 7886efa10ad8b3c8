//! The module descriptor and its timing state machine.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::Config;
use crate::distance;
use crate::state::{Error, FailureReason, State};

/// The JSN-SR04T ultrasonic distance sensor driver.
///
/// One instance per physical sensor. The driver never blocks: a measurement advances only
/// when the application calls [`on_tick`](Self::on_tick) from a periodic timer and
/// [`on_edge`](Self::on_edge) from the echo pin's edge interrupt.
///
/// # Note
///
/// When the two handlers can preempt each other, wrap the sensor in a
/// [`SharedSensor`](crate::SharedSensor) so every entry point runs in a critical section.
pub struct JsnSr04t<TRIGPIN, ECHOPIN> {
    trigger: TRIGPIN,
    echo: ECHOPIN,
    config: Config,
    state: State,
    counter: u32,
    distance_cm: u32,
    echo_time_us: u32,
    failure: Option<FailureReason>,
    on_complete: Option<fn()>,
    completed: bool,
}

impl<TRIGPIN, ECHOPIN> JsnSr04t<TRIGPIN, ECHOPIN>
where
    TRIGPIN: OutputPin,
    ECHOPIN: InputPin,
{
    /// Initialize a new sensor in [`State::Ready`].
    /// Requires the trigger output and the echo input.
    /// Requires a config, `Config::default()` for a 10 us tick.
    ///
    /// The trigger line is not touched here. Make sure it starts low.
    pub fn new(trigger: TRIGPIN, echo: ECHOPIN, config: Config) -> Self {
        Self {
            trigger,
            echo,
            config,
            state: State::Ready,
            counter: 0,
            distance_cm: 0,
            echo_time_us: 0,
            failure: None,
            on_complete: None,
            completed: false,
        }
    }

    /// Request a measurement. The trigger pulse begins on the next tick.
    ///
    /// Returns [`Error::Busy`] and changes nothing if a measurement is already in flight.
    pub fn start_measurement(&mut self) -> Result<(), Error> {
        if self.state.is_measuring() {
            return Err(Error::Busy);
        }

        self.distance_cm = 0;
        self.echo_time_us = 0;
        self.failure = None;
        self.completed = false;
        self.state = State::WaitingForTrigger;
        defmt::trace!("jsn-sr04t: measurement requested");
        Ok(())
    }

    /// Tick handler. Call from a timer interrupt every `config.tick_period_us`.
    ///
    /// Runs the completion callback, if one is attached and the measurement just ended.
    pub fn on_tick(&mut self) {
        self.tick();
        self.dispatch_completion();
    }

    /// Edge handler. Call from the echo pin interrupt on both rising and falling edges.
    ///
    /// The echo level is sampled here, the edge direction is never assumed. A missed edge
    /// therefore ends in [`State::Failed`] instead of a wrong distance.
    pub fn on_edge(&mut self) {
        self.edge();
        self.dispatch_completion();
    }

    /// [`on_tick`](Self::on_tick) without running the callback. Pair with
    /// [`take_completion`](Self::take_completion).
    pub fn tick(&mut self) {
        match self.state {
            State::WaitingForTrigger => {
                if self.trigger.set_high().is_err() {
                    self.fail(FailureReason::Pin);
                    return;
                }
                self.counter = 0;
                self.state = State::TriggerUp;
            }
            State::TriggerUp => {
                self.counter = self.counter.saturating_add(1);
                if self.counter >= self.config.trigger_pulse_ticks {
                    if self.trigger.set_low().is_err() {
                        self.fail(FailureReason::Pin);
                        return;
                    }
                    self.counter = 0;
                    self.state = State::WaitingForEcho;
                }
            }
            State::WaitingForEcho | State::EchoUp => {
                self.counter = self.counter.saturating_add(1);
                if self.counter >= self.config.echo_timeout_ticks {
                    self.fail(FailureReason::EchoTimeout);
                }
            }
            State::Ready | State::Finished | State::Failed => {}
        }
    }

    /// [`on_edge`](Self::on_edge) without running the callback. Pair with
    /// [`take_completion`](Self::take_completion).
    pub fn edge(&mut self) {
        match self.state {
            State::WaitingForEcho => match self.echo.is_high() {
                Ok(true) => {
                    self.distance_cm = 0;
                    self.counter = 0;
                    self.state = State::EchoUp;
                }
                Ok(false) => self.fail(FailureReason::ProtocolViolation),
                Err(_) => self.fail(FailureReason::Pin),
            },
            State::EchoUp => match self.echo.is_high() {
                Ok(false) => self.finish(),
                Ok(true) => self.fail(FailureReason::ProtocolViolation),
                Err(_) => self.fail(FailureReason::Pin),
            },
            _ => {}
        }
    }
}

impl<TRIGPIN, ECHOPIN> JsnSr04t<TRIGPIN, ECHOPIN> {
    /// Register a function to call when a measurement finishes or fails.
    ///
    /// The callback runs at the end of [`on_tick`](Self::on_tick) or
    /// [`on_edge`](Self::on_edge), i.e. in interrupt context. Keep it short and never block
    /// in it. [`SharedSensor`](crate::SharedSensor) calls it after leaving its critical
    /// section, so the callback may read or restart the shared sensor.
    pub fn attach(&mut self, callback: fn()) {
        self.on_complete = Some(callback);
    }

    /// Remove the completion callback.
    pub fn detach(&mut self) {
        self.on_complete = None;
    }

    /// Take the completion event left by the last transition into `Finished` or `Failed`.
    ///
    /// Returns the attached callback at most once per measurement, `None` if there is no
    /// pending event or no callback. Lets a caller holding a lock run the callback after
    /// releasing it.
    pub fn take_completion(&mut self) -> Option<fn()> {
        if core::mem::take(&mut self.completed) {
            self.on_complete
        } else {
            None
        }
    }

    /// The current state of the measurement.
    pub fn state(&self) -> State {
        self.state
    }

    /// `true` once the last measurement has finished or failed. `false` in Ready.
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Ticks counted in the current interval. Only meaningful while measuring.
    pub fn ticks(&self) -> u32 {
        self.counter
    }

    /// The measured distance in centimeters, or 0 unless the state is [`State::Finished`].
    pub fn distance_cm(&self) -> u32 {
        if self.state == State::Finished {
            self.distance_cm
        } else {
            0
        }
    }

    /// Like [`distance_cm`](Self::distance_cm) but `None` when the echo reached
    /// `config.max_echo_us`, which the sensor reports when nothing is in range.
    pub fn distance_in_range_cm(&self) -> Option<u32> {
        match self.state {
            State::Finished if distance::in_range(self.echo_time_us, &self.config) => {
                Some(self.distance_cm)
            }
            _ => None,
        }
    }

    /// The raw echo pulse width in microseconds, or 0 unless the state is [`State::Finished`].
    ///
    /// For applications that apply their own speed of sound.
    pub fn echo_time_us(&self) -> u32 {
        if self.state == State::Finished {
            self.echo_time_us
        } else {
            0
        }
    }

    /// Why the last measurement failed. Cleared by the next accepted start.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self.state {
            State::Failed => self.failure,
            _ => None,
        }
    }

    /// `None` while idle or measuring, otherwise the distance or the failure reason.
    pub fn outcome(&self) -> Option<Result<u32, FailureReason>> {
        match self.state {
            State::Finished => Some(Ok(self.distance_cm)),
            State::Failed => Some(Err(self.failure.unwrap_or(FailureReason::EchoTimeout))),
            _ => None,
        }
    }

    /// The timing and conversion settings this sensor was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give back the trigger and echo pins.
    pub fn release(self) -> (TRIGPIN, ECHOPIN) {
        (self.trigger, self.echo)
    }

    fn finish(&mut self) {
        self.echo_time_us = distance::echo_time_us(self.counter, &self.config);
        self.distance_cm = distance::distance_cm(self.counter, &self.config);
        self.state = State::Finished;
        defmt::debug!(
            "jsn-sr04t: echo {=u32} us, {=u32} cm",
            self.echo_time_us,
            self.distance_cm
        );
        self.completed = true;
    }

    fn dispatch_completion(&mut self) {
        if let Some(callback) = self.take_completion() {
            callback();
        }
    }
}

impl<TRIGPIN, ECHOPIN> JsnSr04t<TRIGPIN, ECHOPIN>
where
    TRIGPIN: OutputPin,
{
    fn fail(&mut self, reason: FailureReason) {
        if reason == FailureReason::Pin {
            // the pulse may have been left high
            let _ = self.trigger.set_low();
        }
        self.distance_cm = 0;
        self.echo_time_us = 0;
        self.failure = Some(reason);
        self.state = State::Failed;
        defmt::warn!(
            "jsn-sr04t: measurement failed ({}) after {=u32} ticks",
            reason,
            self.counter
        );
        self.completed = true;
    }
}
