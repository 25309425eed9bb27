use std::fmt;

/// Elapsed time and distance as seen on the last distinct frame.
#[derive(Eq, PartialEq, Default, Clone, Copy)]
pub struct ProgressSnapshot {
    pub time: i32,
    pub distance: i32,
}

impl fmt::Debug for ProgressSnapshot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!(
            "time: {} distance: {}",
            self.time, self.distance
        ))
    }
}

/// Counts consecutive frames on which the agent made no horizontal progress.
///
/// The host may ask for an action several times within one simulated frame,
/// so both halves of the bookkeeping ignore calls whose elapsed time matches
/// the stored snapshot.
#[derive(Debug, Default, Clone)]
pub struct StallTracker {
    snapshot: ProgressSnapshot,
    stall_counter: u32,
}

impl StallTracker {
    pub fn new(time: i32, distance: i32) -> Self {
        Self {
            snapshot: ProgressSnapshot { time, distance },
            stall_counter: 0,
        }
    }

    pub fn begin_frame(&mut self, time: i32, distance: i32) {
        if time == self.snapshot.time {
            return;
        }

        if distance == self.snapshot.distance {
            self.stall_counter = self.stall_counter.saturating_add(1);
        } else {
            self.stall_counter = 0;
        }
    }

    pub fn end_frame(&mut self, time: i32, distance: i32) {
        if time == self.snapshot.time {
            return;
        }

        self.snapshot = ProgressSnapshot { time, distance };
    }

    pub fn reseed(&mut self, time: i32, distance: i32) {
        *self = Self::new(time, distance);
    }

    pub fn stall_counter(&self) -> u32 {
        self.stall_counter
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn step(tracker: &mut StallTracker, time: i32, distance: i32) {
        tracker.begin_frame(time, distance);
        tracker.end_frame(time, distance);
    }

    #[test]
    fn counts_frames_without_progress() {
        let mut tracker = StallTracker::new(0, 0);
        step(&mut tracker, 1, 0);
        step(&mut tracker, 2, 0);
        assert_eq!(tracker.stall_counter(), 2);
        step(&mut tracker, 3, 1);
        assert_eq!(tracker.stall_counter(), 0);
        assert_eq!(tracker.snapshot(), ProgressSnapshot { time: 3, distance: 1 });
    }

    #[test]
    fn repeated_time_is_a_duplicate_call() {
        let mut tracker = StallTracker::new(5, 3);
        step(&mut tracker, 6, 3);
        step(&mut tracker, 6, 3);
        step(&mut tracker, 6, 9);
        assert_eq!(tracker.stall_counter(), 1);
        assert_eq!(tracker.snapshot(), ProgressSnapshot { time: 6, distance: 3 });
    }

    #[test]
    fn reseed_clears_the_counter() {
        let mut tracker = StallTracker::new(0, 0);
        step(&mut tracker, 1, 0);
        tracker.reseed(40, 12);
        assert_eq!(tracker.stall_counter(), 0);
        assert_eq!(tracker.snapshot(), ProgressSnapshot { time: 40, distance: 12 });
    }

    #[test]
    fn random_frame_sequences() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tracker = StallTracker::new(0, 0);

        for _ in 0..2000 {
            let before = tracker.clone();
            // Small ranges so repeats of both time and distance are common
            let time = rng.gen_range(0, 4);
            let distance = rng.gen_range(0, 3);
            step(&mut tracker, time, distance);

            if time == before.snapshot().time {
                assert_eq!(tracker.stall_counter(), before.stall_counter());
                assert_eq!(tracker.snapshot(), before.snapshot());
            } else if distance == before.snapshot().distance {
                assert_eq!(tracker.stall_counter(), before.stall_counter() + 1);
                assert_eq!(tracker.snapshot(), ProgressSnapshot { time, distance });
            } else {
                assert_eq!(tracker.stall_counter(), 0);
                assert_eq!(tracker.snapshot(), ProgressSnapshot { time, distance });
            }
        }
    }

    #[test]
    fn stall_counter_saturates() {
        let mut tracker = StallTracker::new(0, 0);
        tracker.stall_counter = u32::MAX - 1;
        step(&mut tracker, 1, 0);
        assert_eq!(tracker.stall_counter(), u32::MAX);
        step(&mut tracker, 2, 0);
        assert_eq!(tracker.stall_counter(), u32::MAX);
        step(&mut tracker, 3, 1);
        assert_eq!(tracker.stall_counter(), 0);
    }
}
