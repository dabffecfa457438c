use std::future::Future;

use crate::quiz::error::CaptureError;
use crate::quiz::fingers::{Hand, Landmark, FINGERTIPS, LANDMARK_COUNT, PIP_JOINTS, WRIST};

/// Camera capture plus hand landmark inference.
pub trait LandmarkSource: Send + Sync + 'static {
    /// Brings the detection pipeline up. Failing here makes the quiz unstartable.
    fn initialize(&self) -> impl Future<Output = Result<(), CaptureError>> + Send;

    /// Hands visible in the latest frame, usually zero or one.
    fn capture(&self) -> impl Future<Output = Result<Vec<Hand>, CaptureError>> + Send;
}

/// Builds image-space landmarks for a hand with the given fingers extended.
/// Layout: wrist at the bottom, fingers pointing up, `y` growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandPose {
    /// Thumb, index, middle, ring, pinky.
    pub extended: [bool; 5],
}

const WRIST_POINT: (f32, f32) = (200.0, 300.0);
const FINGER_X: [f32; 5] = [150.0, 160.0, 190.0, 220.0, 250.0];
const KNUCKLE_Y: f32 = 240.0;
const JOINT_Y: f32 = 200.0;

impl HandPose {
    pub fn new(extended: [bool; 5]) -> Self {
        Self { extended }
    }

    #[cfg(test)]
    pub fn fist() -> Self {
        Self::new([false; 5])
    }

    /// Index first, then middle, ring, pinky and finally the thumb,
    /// so 1 to 4 fingers never need the thumb.
    pub fn showing(fingers: u8) -> Self {
        let mut extended = [false; 5];
        for finger in [1, 2, 3, 4, 0].into_iter().take(fingers as usize) {
            extended[finger] = true;
        }
        Self::new(extended)
    }

    pub fn landmarks(&self) -> Hand {
        let mut points = vec![Landmark::default(); LANDMARK_COUNT];
        points[WRIST] = Landmark::new(WRIST_POINT.0, WRIST_POINT.1);

        // Thumb: 1..=4 runs from the base out to the tip
        let (tip_x, tip_y) = if self.extended[0] {
            (110.0, 250.0)
        } else {
            (175.0, 270.0)
        };
        points[1] = Landmark::new(170.0, 285.0);
        points[PIP_JOINTS[0]] = Landmark::new(155.0, 270.0);
        points[3] = Landmark::new((155.0 + tip_x) / 2.0, (270.0 + tip_y) / 2.0);
        points[FINGERTIPS[0]] = Landmark::new(tip_x, tip_y);

        for finger in 1..5 {
            let x = FINGER_X[finger];
            let tip = FINGERTIPS[finger];
            let tip_y = if self.extended[finger] { 140.0 } else { 215.0 };
            points[tip - 3] = Landmark::new(x, KNUCKLE_Y);
            points[PIP_JOINTS[finger]] = Landmark::new(x, JOINT_Y);
            points[tip - 1] = Landmark::new(x, (JOINT_Y + tip_y) / 2.0);
            points[tip] = Landmark::new(x, tip_y);
        }

        points
    }
}
