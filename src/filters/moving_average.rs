use super::SignalFilter;
use crate::signals::{JointSignal, SignalKey};
use nalgebra::Vector2;
use std::collections::{HashMap, VecDeque};

/// Moving average filter over the last `window_size` values of each key
pub struct MovingAverageFilter {
    window_size: usize,
    buffers: HashMap<SignalKey, VecDeque<JointSignal>>,
}

impl MovingAverageFilter {
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            buffers: HashMap::new(),
        }
    }

    fn average(buffer: &VecDeque<JointSignal>) -> Option<JointSignal> {
        let n = buffer.len() as f64;
        match buffer.front()? {
            JointSignal::Offset(_) => {
                let sum = buffer
                    .iter()
                    .filter_map(JointSignal::as_offset)
                    .fold(Vector2::zeros(), |acc, v| acc + v);
                Some(JointSignal::Offset(sum / n))
            }
            JointSignal::Angle(_) => {
                let sum: f64 = buffer.iter().filter_map(JointSignal::as_angle).sum();
                Some(JointSignal::Angle(sum / n))
            }
        }
    }
}

impl SignalFilter for MovingAverageFilter {
    fn apply(&mut self, key: SignalKey, signal: JointSignal) -> JointSignal {
        let buffer = self
            .buffers
            .entry(key)
            .or_insert_with(|| VecDeque::with_capacity(self.window_size));

        // A key that changes kind starts over
        if buffer
            .front()
            .is_some_and(|front| std::mem::discriminant(front) != std::mem::discriminant(&signal))
        {
            buffer.clear();
        }

        if buffer.len() >= self.window_size {
            buffer.pop_front();
        }
        buffer.push_back(signal);

        Self::average(buffer).unwrap_or(signal)
    }

    fn reset(&mut self) {
        self.buffers.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::JointName;

    #[test]
    fn test_moving_average() {
        let mut filter = MovingAverageFilter::new(3);
        let key = SignalKey::Joint(JointName::RightShoulder);

        assert_eq!(filter.apply(key, JointSignal::Angle(10.0)), JointSignal::Angle(10.0));
        assert_eq!(filter.apply(key, JointSignal::Angle(20.0)), JointSignal::Angle(15.0));
        assert_eq!(filter.apply(key, JointSignal::Angle(30.0)), JointSignal::Angle(20.0));

        // Window is full, oldest value should be dropped
        assert_eq!(filter.apply(key, JointSignal::Angle(40.0)), JointSignal::Angle(30.0));
    }

    #[test]
    fn test_offsets_average_componentwise() {
        let mut filter = MovingAverageFilter::new(2);
        filter.apply(SignalKey::Head, JointSignal::offset(0.0, 10.0));
        let avg = filter.apply(SignalKey::Head, JointSignal::offset(2.0, 20.0));
        assert_eq!(avg, JointSignal::offset(1.0, 15.0));
    }
}
