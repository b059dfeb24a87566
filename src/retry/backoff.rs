//! Delay strategies between retry attempts

use rand::Rng;
use std::time::Duration;

/// Strategy for computing the pause before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay before every retry
    Fixed(Duration),

    /// `base * 2^(retry - 1)`, capped at `max`
    Exponential { base: Duration, max: Duration },

    /// A random delay in `[0, exponential delay]` (full jitter)
    Jittered { base: Duration, max: Duration },
}

impl Backoff {
    /// Returns the delay before retry number `retry` (1 = first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, max } => exponential(base, max, retry),
            Self::Jittered { base, max } => {
                let ceiling = exponential(base, max, retry);
                if ceiling.is_zero() {
                    return ceiling;
                }
                let millis = rand::thread_rng().gen_range(0..=ceiling.as_millis() as u64);
                Duration::from_millis(millis)
            }
        }
    }

    /// The base delay the strategy starts from
    pub fn base(&self) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, .. } | Self::Jittered { base, .. } => base,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed(super::DEFAULT_RETRY_DELAY)
    }
}

fn exponential(base: Duration, max: Duration, retry: u32) -> Duration {
    let exponent = retry.saturating_sub(1).min(31);
    base.checked_mul(1u32 << exponent)
        .map_or(max, |delay| delay.min(max))
}
