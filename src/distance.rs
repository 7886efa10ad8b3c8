//! Distance calculator.
//!
//! Integer only. The state machine runs this once, inside the transition to
//! [`crate::State::Finished`].

use crate::config::Config;

/// Echo pulse width in microseconds for `ticks` counted at the configured tick period.
pub fn echo_time_us(ticks: u32, config: &Config) -> u32 {
    ticks.saturating_mul(config.tick_period_us)
}

/// Distance in centimeters for an echo `ticks` long.
///
/// `(ticks * tick_period_us) / sound_divisor`. With the default divisor of 64 this is a
/// fast approximation, not a calibrated conversion.
pub fn distance_cm(ticks: u32, config: &Config) -> u32 {
    echo_time_us(ticks, config) / config.sound_divisor.max(1)
}

/// `false` when the echo reached the "no object" limit.
pub fn in_range(echo_time_us: u32, config: &Config) -> bool {
    echo_time_us < config.max_echo_us
}
