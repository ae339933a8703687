//! Optional smoothing stage between the transform engine and the signal bus.
//!
//! The pipeline runs unfiltered by default ([`NoFilter`]). Deployments that want
//! less frame-to-frame jitter can plug in one of the filters below, or their own
//! [`SignalFilter`] implementation, through [`crate::transform::TransformEngine::with_filter`].

/// Moving average filter for simple smoothing
pub mod moving_average;

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::signals::{JointSignal, SignalKey};
use crate::{Error, Result};

/// Trait for all signal smoothing stages
pub trait SignalFilter: Send + Sync {
    /// Filter one freshly computed signal before it is written to the bus
    fn apply(&mut self, key: SignalKey, signal: JointSignal) -> JointSignal;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes signals through unchanged
pub struct NoFilter;

impl SignalFilter for NoFilter {
    fn apply(&mut self, _key: SignalKey, signal: JointSignal) -> JointSignal {
        signal
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a filter from a `name[:param]` description, e.g. `exponential:0.3`
pub fn create_filter(description: &str) -> Result<Box<dyn SignalFilter>> {
    let lowered = description.to_lowercase();
    let mut parts = lowered.splitn(2, ':');
    let kind = parts.next().unwrap_or_default();
    let param = parts.next();

    match kind {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "exponential" => {
            let alpha = parse_param(param, 0.5, description)?;
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        "moving_average" | "movingaverage" => {
            let window = parse_param(param, 5_usize, description)?;
            if window == 0 {
                return Err(Error::FilterError("Window size must be greater than 0".to_string()));
            }
            Ok(Box::new(moving_average::MovingAverageFilter::new(window)))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {description}"))),
    }
}

fn parse_param<T: std::str::FromStr>(param: Option<&str>, default: T, description: &str) -> Result<T> {
    match param {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::FilterError(format!("Invalid filter parameter in {description:?}"))),
    }
}

/// Componentwise blend of two signals of the same kind; `None` on a kind change
pub(crate) fn blend(previous: &JointSignal, next: &JointSignal, weight: f64) -> Option<JointSignal> {
    match (previous, next) {
        (JointSignal::Offset(p), JointSignal::Offset(n)) => Some(JointSignal::Offset(p.lerp(n, weight))),
        (JointSignal::Angle(p), JointSignal::Angle(n)) => Some(JointSignal::Angle(p + (n - p) * weight)),
        _ => None,
    }
}
