//! Timing and conversion constants.
//!
//! All durations inside the state machine are tick counts. The defaults assume the tick
//! handler is called every [`TICK_PERIOD_US`] microseconds. Use
//! [`Config::for_tick_period_us`] when the timer runs at a different period.

/// Reference tick period in microseconds.
pub const TICK_PERIOD_US: u32 = 10;

/// Trigger pulse length in ticks at the reference period (10 us).
pub const TRIGGER_PULSE_TICKS: u32 = 1;

/// Echo timeout in ticks at the reference period (32 ms, the sensor's maximum round trip).
pub const ECHO_TIMEOUT_TICKS: u32 = 3200;

/// Divisor turning echo microseconds into centimeters.
///
/// Sound needs roughly 58 us per centimeter of round trip. 64 is a shift-friendly
/// approximation, so distances read about 10% short.
pub const SOUND_DIVISOR: u32 = 64;

/// Echo pulses this long or longer mean the sensor saw no object.
pub const MAX_ECHO_US: u32 = 30_000;

/// Shortest trigger pulse the sensor reliably accepts.
const TRIGGER_PULSE_US: u32 = 10;

/// Echo timeout budget.
const ECHO_TIMEOUT_US: u32 = 32_000;

/// The configuration for the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct Config {
    /// Period of the tick source in microseconds.
    pub tick_period_us: u32,
    /// Ticks the trigger line is held high.
    pub trigger_pulse_ticks: u32,
    /// Ticks after the trigger pulse, or after the echo rose, before giving up.
    pub echo_timeout_ticks: u32,
    /// Echo microseconds per centimeter.
    pub sound_divisor: u32,
    /// Upper bound for a valid echo, see [`crate::JsnSr04t::distance_in_range_cm`].
    pub max_echo_us: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_period_us: TICK_PERIOD_US,
            trigger_pulse_ticks: TRIGGER_PULSE_TICKS,
            echo_timeout_ticks: ECHO_TIMEOUT_TICKS,
            sound_divisor: SOUND_DIVISOR,
            max_echo_us: MAX_ECHO_US,
        }
    }
}

impl Config {
    /// Rescale the trigger pulse and echo timeout to a tick source running every
    /// `tick_period_us` microseconds.
    ///
    /// Both counts are rounded up, so the trigger pulse is never shorter than 10 us and
    /// neither count is ever zero. A period of zero is treated as 1 us.
    pub fn for_tick_period_us(tick_period_us: u32) -> Self {
        let tick_period_us = tick_period_us.max(1);
        Self {
            tick_period_us,
            trigger_pulse_ticks: ticks_for(TRIGGER_PULSE_US, tick_period_us),
            echo_timeout_ticks: ticks_for(ECHO_TIMEOUT_US, tick_period_us),
            ..Self::default()
        }
    }

    /// Override the divisor, i.e. to use 58 for a closer centimeter conversion.
    pub fn with_sound_divisor(mut self, sound_divisor: u32) -> Self {
        self.sound_divisor = sound_divisor.max(1);
        self
    }

    /// Override the "no object" echo limit.
    pub fn with_max_echo_us(mut self, max_echo_us: u32) -> Self {
        self.max_echo_us = max_echo_us;
        self
    }
}

fn ticks_for(duration_us: u32, tick_period_us: u32) -> u32 {
    duration_us.div_ceil(tick_period_us).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_constants() {
        let config = Config::default();
        assert_eq!(config.tick_period_us, 10);
        assert_eq!(config.trigger_pulse_ticks, 1);
        assert_eq!(config.echo_timeout_ticks, 3200);
        assert_eq!(config.sound_divisor, 64);
        assert_eq!(config.max_echo_us, 30_000);
    }

    #[test]
    fn reference_period_rescales_to_default() {
        assert_eq!(Config::for_tick_period_us(10), Config::default());
    }

    #[test]
    fn faster_tick_scales_counts_up() {
        let config = Config::for_tick_period_us(1);
        assert_eq!(config.trigger_pulse_ticks, 10);
        assert_eq!(config.echo_timeout_ticks, 32_000);
    }

    #[test]
    fn slow_tick_never_shortens_trigger_pulse() {
        let config = Config::for_tick_period_us(15);
        // one 15 us tick already covers the 10 us pulse
        assert_eq!(config.trigger_pulse_ticks, 1);
        assert_eq!(config.echo_timeout_ticks, 2134);

        let config = Config::for_tick_period_us(4);
        assert_eq!(config.trigger_pulse_ticks, 3);
    }

    #[test]
    fn very_slow_tick_keeps_counts_non_zero() {
        let config = Config::for_tick_period_us(100_000);
        assert_eq!(config.trigger_pulse_ticks, 1);
        assert_eq!(config.echo_timeout_ticks, 1);
    }

    #[test]
    fn zero_period_is_clamped() {
        let config = Config::for_tick_period_us(0);
        assert_eq!(config.tick_period_us, 1);
        assert_eq!(config.trigger_pulse_ticks, 10);
    }

    #[test]
    fn sound_divisor_overrides() {
        assert_eq!(Config::default().with_sound_divisor(58).sound_divisor, 58);
        assert_eq!(Config::default().with_sound_divisor(0).sound_divisor, 1);
        assert_eq!(Config::default().with_max_echo_us(25_000).max_echo_us, 25_000);
    }
}
