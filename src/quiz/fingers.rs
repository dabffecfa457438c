use crate::quiz::config::CounterConfig;
use crate::quiz::error::FrameError;

/// Points per detected hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
/// Thumb, index, middle, ring, pinky.
pub const FINGERTIPS: [usize; 5] = [4, 8, 12, 16, 20];
/// Reference joints in the same finger order. The thumb entry is never read,
/// the thumb is judged by its distance to the wrist instead.
pub const PIP_JOINTS: [usize; 5] = [2, 6, 10, 14, 18];

/// Highest count the quiz can map onto an option (D).
pub const MAX_FINGER_COUNT: u8 = 4;

/// One tracked point, in image space with `y` growing downward.
/// Two-dimensional input leaves `z` at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Distance in the image plane, `z` is ignored.
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f32; 2]> for Landmark {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y, z: 0.0 }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Landmarks of one detected hand, expected to be [`LANDMARK_COUNT`] long.
pub type Hand = Vec<Landmark>;

#[derive(Debug, Clone, Copy)]
pub struct FingerCounter {
    thumb_distance_threshold: f32,
    finger_vertical_margin: f32,
}

impl FingerCounter {
    pub fn new(config: &CounterConfig) -> Self {
        Self {
            thumb_distance_threshold: config.thumb_distance_threshold,
            finger_vertical_margin: config.finger_vertical_margin,
        }
    }

    /// Which of thumb, index, middle, ring and pinky are extended.
    pub fn extended(&self, landmarks: &[Landmark]) -> Result<[bool; 5], FrameError> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(FrameError::WrongLandmarkCount(landmarks.len()));
        }

        let wrist = &landmarks[WRIST];
        let mut extended = [false; 5];
        for (finger, is_extended) in extended.iter_mut().enumerate() {
            let tip = &landmarks[FINGERTIPS[finger]];
            *is_extended = if finger == 0 {
                // The thumb folds sideways, so height says nothing about it
                tip.planar_distance(wrist) > self.thumb_distance_threshold
            } else {
                let joint = &landmarks[PIP_JOINTS[finger]];
                tip.y < joint.y - self.finger_vertical_margin
            };
        }

        Ok(extended)
    }

    /// Extended fingers, clamped to [`MAX_FINGER_COUNT`]. An open hand reads as 4.
    pub fn count(&self, landmarks: &[Landmark]) -> Result<u8, FrameError> {
        let extended = self.extended(landmarks)?;
        let count = extended.iter().filter(|e| **e).count() as u8;
        Ok(count.min(MAX_FINGER_COUNT))
    }
}

impl Default for FingerCounter {
    fn default() -> Self {
        Self::new(&CounterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::source::HandPose;

    #[test]
    fn closed_fist_is_zero() {
        let hand = HandPose::fist().landmarks();
        assert_eq!(FingerCounter::default().count(&hand), Ok(0));
    }

    #[test]
    fn counts_index_and_middle() {
        let hand = HandPose::new([false, true, true, false, false]).landmarks();
        assert_eq!(FingerCounter::default().count(&hand), Ok(2));
    }

    #[test]
    fn open_hand_clamps_to_four() {
        let hand = HandPose::new([true; 5]).landmarks();
        let counter = FingerCounter::default();
        assert_eq!(counter.extended(&hand), Ok([true; 5]));
        assert_eq!(counter.count(&hand), Ok(4));
    }

    #[test]
    fn thumb_counts_on_distance_alone() {
        let counter = FingerCounter::default();
        let mut hand = HandPose::fist().landmarks();
        hand[WRIST] = Landmark::new(0.0, 0.0);

        hand[FINGERTIPS[0]] = Landmark::new(60.0, 0.0);
        assert_eq!(counter.count(&hand), Ok(0));

        hand[FINGERTIPS[0]] = Landmark::new(48.0, 36.5);
        assert!(counter.extended(&hand).unwrap()[0]);

        // Thumb below the wrist still counts, direction does not matter
        hand[FINGERTIPS[0]] = Landmark::new(0.0, 61.0);
        assert_eq!(counter.count(&hand), Ok(1));
    }

    #[test]
    fn thumb_is_independent_of_other_fingers() {
        let counter = FingerCounter::default();
        for other in 0..16u8 {
            let mut fingers = [true; 5];
            for bit in 0..4 {
                fingers[bit + 1] = other & (1 << bit) != 0;
            }
            let hand = HandPose::new(fingers).landmarks();
            assert!(counter.extended(&hand).unwrap()[0]);
        }
    }

    #[test]
    fn finger_needs_margin_above_its_joint() {
        let counter = FingerCounter::default();
        let mut hand = HandPose::fist().landmarks();
        let joint_y = hand[PIP_JOINTS[1]].y;

        hand[FINGERTIPS[1]].y = joint_y - 20.0;
        assert_eq!(counter.count(&hand), Ok(0));

        hand[FINGERTIPS[1]].y = joint_y - 20.5;
        assert_eq!(counter.count(&hand), Ok(1));
    }

    #[test]
    fn margin_is_configurable() {
        let counter = FingerCounter::new(&CounterConfig {
            thumb_distance_threshold: 60.0,
            finger_vertical_margin: 100.0,
        });
        let hand = HandPose::new([false, true, true, true, false]).landmarks();
        assert_eq!(counter.count(&hand), Ok(0));
    }

    #[test]
    fn wrong_landmark_count_is_a_frame_error() {
        let counter = FingerCounter::default();
        let mut hand = HandPose::fist().landmarks();
        hand.pop();
        assert_eq!(counter.count(&hand), Err(FrameError::WrongLandmarkCount(20)));
        assert_eq!(counter.count(&[]), Err(FrameError::WrongLandmarkCount(0)));
    }

    #[test]
    fn repeated_calls_agree() {
        let counter = FingerCounter::default();
        let hand = HandPose::new([true, false, true, false, true]).landmarks();
        let first = counter.count(&hand);
        for _ in 0..10 {
            assert_eq!(counter.count(&hand), first);
        }
    }

    #[test]
    fn accepts_two_and_three_coordinate_points() {
        let flat: Landmark = [3.0, 4.0].into();
        let deep: Landmark = [3.0, 4.0, -7.0].into();
        assert_eq!(flat.planar_distance(&Landmark::default()), 5.0);
        assert_eq!(deep.planar_distance(&Landmark::default()), 5.0);
    }
}
