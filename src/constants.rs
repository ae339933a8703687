//! Constants used throughout the pipeline

/// Number of PoseNet keypoints per subject
pub const NUM_KEYPOINTS: usize = 17;

/// Default per-part confidence threshold for the keypoint frame
pub const DEFAULT_PART_CONFIDENCE: f64 = 0.5;

/// Default whole-pose confidence below which a detection is ignored
pub const DEFAULT_POSE_CONFIDENCE: f64 = 0.1;

/// Divisor applied to the calibration distance for horizontal offsets
pub const OFFSET_DISTANCE_DIVISOR: f64 = 15.0;

/// Lower bound of the neck/torso extension range, in calibration distances
pub const EXTENSION_RANGE_MIN: f64 = 1.5;

/// Upper bound of the neck/torso extension range, in calibration distances
pub const EXTENSION_RANGE_MAX: f64 = 2.8;

/// Output range of the vertical offset remap
pub const SIGNAL_OUT_MIN: f64 = -2.0;
pub const SIGNAL_OUT_MAX: f64 = 2.0;

/// Minimum confidence of the distance estimate before the avatar is placed
pub const DEFAULT_PLACEMENT_CONFIDENCE: f64 = 0.7;

/// Depth log-fit: `depth = a * ln(distance) + b`
pub const DEFAULT_DEPTH_FIT_A: f64 = -6.035;
pub const DEFAULT_DEPTH_FIT_B: f64 = 30.722;

/// Chest-center to lateral/vertical placement fit
pub const DEFAULT_LATERAL_SCALE: f64 = 0.0125;
pub const DEFAULT_LATERAL_OFFSET: f64 = -4.0;
pub const DEFAULT_VERTICAL_SCALE: f64 = -0.0167;
pub const DEFAULT_VERTICAL_OFFSET: f64 = 4.0;

/// Avatar position used when the subject is out of frame
pub const OUT_OF_FRAME_POSITION: [f64; 3] = [0.0, 0.0, -30.0];

/// Uniform scale applied to an imported avatar
pub const DEFAULT_AVATAR_SCALE: f64 = 5.0;

/// Estimation interval in milliseconds (about 10 Hz)
pub const DEFAULT_ESTIMATION_INTERVAL_MS: u64 = 100;

/// Render interval in milliseconds (about 60 Hz)
pub const DEFAULT_RENDER_INTERVAL_MS: u64 = 16;

/// Camera readiness retry policy
pub const DEFAULT_MAX_CAMERA_ATTEMPTS: u32 = 50;
pub const DEFAULT_CAMERA_BACKOFF_MS: u64 = 200;

/// Idle oscillator step per render tick
pub const DEFAULT_IDLE_STEP: f64 = 0.02;

/// Segments shorter than this are treated as degenerate
pub const EPSILON: f64 = 1e-10;
