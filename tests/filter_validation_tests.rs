//! Tests for filter parameter validation and per-key smoothing

use virtual_tryon::filters::{create_filter, exponential::ExponentialFilter, moving_average::MovingAverageFilter, SignalFilter};
use virtual_tryon::keypoint::JointName;
use virtual_tryon::signals::{JointSignal, SignalKey};

#[test]
#[should_panic(expected = "Window size must be greater than 0")]
fn test_moving_average_zero_window() {
    let _ = MovingAverageFilter::new(0);
}

#[test]
#[should_panic(expected = "Alpha must be in (0, 1]")]
fn test_exponential_zero_alpha() {
    let _ = ExponentialFilter::new(0.0);
}

#[test]
#[should_panic(expected = "Alpha must be in (0, 1]")]
fn test_exponential_too_large_alpha() {
    let _ = ExponentialFilter::new(1.5);
}

#[test]
fn test_valid_parameters() {
    let _ = MovingAverageFilter::new(1);
    let _ = ExponentialFilter::new(1.0);
    let _ = ExponentialFilter::new(0.01);
    assert_eq!(create_filter("Exponential:1").unwrap().name(), "ExponentialFilter");
    assert_eq!(create_filter("movingaverage").unwrap().name(), "MovingAverageFilter");
    assert_eq!(create_filter("none").unwrap().name(), "NoFilter");
}

#[test]
fn test_keys_are_smoothed_independently() {
    let elbow = SignalKey::Joint(JointName::LeftElbow);
    let shoulder = SignalKey::Joint(JointName::LeftShoulder);
    let mut filter = MovingAverageFilter::new(2);

    filter.apply(elbow, JointSignal::Angle(1.0));
    filter.apply(shoulder, JointSignal::Angle(-1.0));
    assert_eq!(filter.apply(elbow, JointSignal::Angle(2.0)), JointSignal::Angle(1.5));
    assert_eq!(filter.apply(shoulder, JointSignal::Angle(-3.0)), JointSignal::Angle(-2.0));
}

#[test]
fn test_reset_forgets_history() {
    let mut filters: Vec<Box<dyn SignalFilter>> = vec![
        Box::new(ExponentialFilter::new(0.5)),
        Box::new(MovingAverageFilter::new(3)),
    ];

    for filter in &mut filters {
        filter.apply(SignalKey::Torso, JointSignal::offset(4.0, 4.0));
        filter.apply(SignalKey::Torso, JointSignal::offset(8.0, 8.0));
        filter.reset();

        let after = filter.apply(SignalKey::Torso, JointSignal::offset(1.0, 2.0));
        assert_eq!(after, JointSignal::offset(1.0, 2.0), "{}", filter.name());
    }
}
