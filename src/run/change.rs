// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use crate::data::Value;

/// A value which moves linearly towards a target over a number of frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimedChange {
    active: bool,
    start: Value,
    target: Value,
    frame: u32,
    duration: u32,
}

impl TimedChange {
    /// Begin a change from `start` to `target` lasting `duration` frames.
    ///
    /// A change without a duration is complete as soon as it is created.
    pub fn new(start: Value, target: Value, duration: u32) -> Self {
        TimedChange {
            active: duration > 0,
            start,
            target,
            frame: 0,
            duration,
        }
    }

    /// Whether the change is still in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The value at the start of the change.
    pub fn start(&self) -> Value {
        self.start
    }

    /// The value at the end of the change.
    pub fn target(&self) -> Value {
        self.target
    }

    /// The number of frames which have elapsed.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// The length of the change in frames.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// The current value of the change.
    pub fn value(&self) -> Value {
        if self.frame >= self.duration {
            self.target
        } else {
            let step = (self.target - self.start) / (self.duration as Value);
            self.start + step * (self.frame as Value)
        }
    }

    /// Advance the change by one frame.
    ///
    /// Returns the new value while the change is active. The final frame yields the target value
    /// exactly and deactivates the change.
    pub fn advance(&mut self) -> Option<Value> {
        if !self.active {
            return None;
        }

        self.frame += 1;
        if self.frame >= self.duration {
            self.frame = self.duration;
            self.active = false;
        }

        Some(self.value())
    }

    /// Stop the change where it is.
    pub fn cancel(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod test {
    use crate::run::TimedChange;

    #[test]
    fn test_change_interpolates() {
        let mut change = TimedChange::new(0., 90., 4);
        assert!(change.is_active());
        assert_eq!(change.value(), 0.);

        assert_eq!(change.advance(), Some(22.5));
        assert_eq!(change.advance(), Some(45.));
        assert_eq!(change.advance(), Some(67.5));
        assert!(change.is_active());
        assert_eq!(change.advance(), Some(90.));
        assert!(!change.is_active());
        assert_eq!(change.frame(), change.duration());
        assert_eq!(change.advance(), None);
    }

    #[test]
    fn test_change_hits_target_exactly() {
        let mut change = TimedChange::new(0.1, 0.7, 3);

        let last = (0..3).filter_map(|_| change.advance()).last();
        assert_eq!(last, Some(0.7));
        assert_eq!(change.value(), 0.7);
    }

    #[test]
    fn test_change_without_duration() {
        let mut change = TimedChange::new(3., 5., 0);

        assert!(!change.is_active());
        assert_eq!(change.value(), 5.);
        assert_eq!(change.advance(), None);
    }

    #[test]
    fn test_change_cancel() {
        let mut change = TimedChange::new(0., 10., 10);
        change.advance();
        change.cancel();

        assert!(!change.is_active());
        assert_eq!(change.advance(), None);
        assert_eq!(change.frame(), 1);
    }

    #[test]
    fn test_change_default_is_inactive() {
        assert!(!TimedChange::default().is_active());
    }
}
