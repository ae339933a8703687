use super::{blend, SignalFilter};
use crate::signals::{JointSignal, SignalKey};
use std::collections::HashMap;

/// Exponential smoothing filter, one state per signal key
pub struct ExponentialFilter {
    alpha: f64,
    last: HashMap<SignalKey, JointSignal>,
}

impl ExponentialFilter {
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self {
            alpha,
            last: HashMap::new(),
        }
    }
}

impl SignalFilter for ExponentialFilter {
    fn apply(&mut self, key: SignalKey, signal: JointSignal) -> JointSignal {
        let filtered = self
            .last
            .get(&key)
            .and_then(|last| blend(last, &signal, self.alpha))
            .unwrap_or(signal);

        self.last.insert(key, filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last.clear();
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
