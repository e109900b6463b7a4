use std::time::Duration;
use tracing::debug;

use crate::display::{Display, KnobId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    fn offset(&self, positions: usize) -> usize {
        match self {
            Rotation::Clockwise => 1,
            Rotation::CounterClockwise => positions - 1,
        }
    }
}

/// where the knob is in its animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Idle,
    Stepping {
        target: usize,
        rotation: Rotation,
        /// when the next step is taken
        due: Duration,
    },
}

/// called with the knob's new position once it comes to rest
pub type ChangeListener = Box<dyn FnMut(usize)>;

/// Shortest way round from `from` to `to` on a knob with `positions` stops;
/// `None` if there's nowhere to go. Half way round counts as direct.
pub fn rotation_to(from: usize, to: usize, positions: usize) -> Option<Rotation> {
    if from == to {
        return None;
    }
    let direct = if to > from {
        Rotation::Clockwise
    } else {
        Rotation::CounterClockwise
    };
    if 2 * from.abs_diff(to) <= positions {
        Some(direct)
    } else if direct == Rotation::Clockwise {
        Some(Rotation::CounterClockwise)
    } else {
        Some(Rotation::Clockwise)
    }
}

/// A rotary switch with discrete stops. Moving it walks through every stop
/// in between, one per step period, and the listener only hears about the
/// stop it finally lands on.
pub struct Selector {
    knob: KnobId,
    angles: Vec<f64>,
    position: usize,
    /// last position the listener was told about (or was set directly)
    settled: usize,
    motion: Motion,
    step_period: Duration,
    listener: Option<ChangeListener>,
}

impl Selector {
    pub fn new(knob: KnobId, mut angles: Vec<f64>, step_period: Duration) -> Self {
        if angles.is_empty() {
            angles.push(0.0);
        }
        Selector {
            knob,
            angles,
            position: 0,
            settled: 0,
            motion: Motion::Idle,
            step_period,
            listener: None,
        }
    }

    pub fn knob(&self) -> KnobId {
        self.knob
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn position_count(&self) -> usize {
        self.angles.len()
    }

    pub fn angle(&self) -> f64 {
        self.angles[self.position]
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn is_moving(&self) -> bool {
        self.motion != Motion::Idle
    }

    /// when the next animation step is due, if moving
    pub fn next_deadline(&self) -> Option<Duration> {
        match self.motion {
            Motion::Idle => None,
            Motion::Stepping { due, .. } => Some(due),
        }
    }

    /// replaces any listener already set
    pub fn set_change_listener(&mut self, listener: ChangeListener) {
        self.listener = Some(listener);
    }

    pub fn clear_change_listener(&mut self) -> bool {
        self.listener.take().is_some()
    }

    /// jump straight to `position` without animating or notifying
    pub fn set_position(&mut self, position: usize, display: &mut dyn Display) {
        let position = position % self.angles.len();
        self.position = position;
        self.settled = position;
        self.motion = Motion::Idle;
        display.set_position(self.knob, position);
    }

    /// Start turning towards `target`. The first step is taken now; if the
    /// knob is already turning it is redirected and keeps its step timing.
    pub fn move_to(&mut self, target: usize, now: Duration, display: &mut dyn Display) {
        let target = target % self.angles.len();
        match rotation_to(self.position, target, self.angles.len()) {
            None => {
                self.motion = Motion::Idle;
                self.settle();
            }
            Some(rotation) => {
                let due = match self.motion {
                    Motion::Stepping { due, .. } => due,
                    Motion::Idle => now,
                };
                self.motion = Motion::Stepping {
                    target,
                    rotation,
                    due,
                };
                self.tick(now, display);
            }
        }
    }

    /// one stop round; stacks on top of a move already under way
    pub fn step(&mut self, rotation: Rotation, now: Duration, display: &mut dyn Display) {
        let from = match self.motion {
            Motion::Stepping { target, .. } => target,
            Motion::Idle => self.position,
        };
        let target = (from + rotation.offset(self.angles.len())) % self.angles.len();
        self.move_to(target, now, display);
    }

    /// take every step that has come due by `now`
    pub fn tick(&mut self, now: Duration, display: &mut dyn Display) {
        while let Motion::Stepping {
            target,
            rotation,
            due,
        } = self.motion
        {
            if due > now {
                break;
            }
            let n = self.angles.len();
            self.position = (self.position + rotation.offset(n)) % n;
            display.set_position(self.knob, self.position);
            if self.position == target {
                self.motion = Motion::Idle;
                self.settle();
            } else {
                self.motion = Motion::Stepping {
                    target,
                    rotation,
                    due: due + self.step_period,
                };
            }
        }
    }

    fn settle(&mut self) {
        if self.position == self.settled {
            return;
        }
        self.settled = self.position;
        debug!(knob = self.knob, position = self.position, "selector settled");
        if let Some(listener) = self.listener.as_mut() {
            listener(self.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use std::cell::RefCell;
    use std::rc::Rc;

    const STEP: Duration = Duration::from_millis(100);

    fn knob(positions: usize) -> Selector {
        let angles = (0..positions).map(|i| i as f64 * 30.0).collect();
        Selector::new(0, angles, STEP)
    }

    fn recorder(s: &mut Selector) -> Rc<RefCell<Vec<usize>>> {
        let heard = Rc::new(RefCell::new(Vec::new()));
        let h = Rc::clone(&heard);
        s.set_change_listener(Box::new(move |p| h.borrow_mut().push(p)));
        heard
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_rotation_to() {
        assert_eq!(rotation_to(3, 3, 12), None);
        assert_eq!(rotation_to(0, 6, 12), Some(Rotation::Clockwise));
        assert_eq!(rotation_to(6, 0, 12), Some(Rotation::CounterClockwise));
        assert_eq!(rotation_to(1, 10, 12), Some(Rotation::CounterClockwise));
        assert_eq!(rotation_to(10, 1, 12), Some(Rotation::Clockwise));
        assert_eq!(rotation_to(0, 7, 12), Some(Rotation::CounterClockwise));
        // odd stop counts: 2*3 > 5 goes the other way
        assert_eq!(rotation_to(0, 3, 5), Some(Rotation::CounterClockwise));
        assert_eq!(rotation_to(0, 2, 5), Some(Rotation::Clockwise));
    }

    #[test]
    fn test_move_forward_steps_in_order() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        let heard = recorder(&mut s);

        s.move_to(6, ms(0), &mut d);
        assert_eq!(d.positions(0), vec![1]);
        for t in 1..=5 {
            assert!(heard.borrow().is_empty());
            s.tick(ms(t * 100), &mut d);
        }
        assert_eq!(d.positions(0), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(*heard.borrow(), vec![6]);
        assert!(!s.is_moving());
        assert_eq!(s.position(), 6);
        assert_eq!(s.angle(), 180.0);
    }

    #[test]
    fn test_move_wraps_backwards() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        s.set_position(1, &mut d);
        d.clear();
        let heard = recorder(&mut s);

        s.move_to(10, ms(1000), &mut d);
        s.tick(ms(1100), &mut d);
        s.tick(ms(1200), &mut d);
        assert_eq!(d.positions(0), vec![0, 11, 10]);
        assert_eq!(*heard.borrow(), vec![10]);
    }

    #[test]
    fn test_late_tick_catches_up() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        let heard = recorder(&mut s);
        s.move_to(4, ms(0), &mut d);
        s.tick(ms(5000), &mut d);
        assert_eq!(d.positions(0), vec![1, 2, 3, 4]);
        assert_eq!(*heard.borrow(), vec![4]);
    }

    #[test]
    fn test_steps_wait_for_their_time() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        s.move_to(3, ms(0), &mut d);
        s.tick(ms(99), &mut d);
        assert_eq!(s.position(), 1);
        assert_eq!(s.next_deadline(), Some(ms(100)));
        s.tick(ms(100), &mut d);
        assert_eq!(s.position(), 2);
        assert_eq!(s.next_deadline(), Some(ms(200)));
    }

    #[test]
    fn test_move_to_current_is_silent() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        let heard = recorder(&mut s);
        s.move_to(0, ms(0), &mut d);
        assert!(d.writes().is_empty());
        assert!(heard.borrow().is_empty());
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_retarget_mid_move() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        let heard = recorder(&mut s);
        s.move_to(5, ms(0), &mut d);
        s.tick(ms(100), &mut d);
        assert_eq!(s.position(), 2);

        // turn back before arriving; timing carries on from the old move
        s.move_to(0, ms(150), &mut d);
        assert_eq!(s.position(), 2);
        s.tick(ms(200), &mut d);
        s.tick(ms(300), &mut d);
        assert_eq!(d.positions(0), vec![1, 2, 1, 0]);
        // came back to where it started, so nothing changed as far as the
        // listener is concerned
        assert!(heard.borrow().is_empty());
        assert!(!s.is_moving());
    }

    #[test]
    fn test_retarget_to_current_position_settles() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        let heard = recorder(&mut s);
        s.move_to(5, ms(0), &mut d);
        s.tick(ms(100), &mut d);
        s.move_to(2, ms(120), &mut d);
        assert!(!s.is_moving());
        assert_eq!(*heard.borrow(), vec![2]);
    }

    #[test]
    fn test_step_accumulates() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        let heard = recorder(&mut s);
        s.step(Rotation::CounterClockwise, ms(0), &mut d);
        assert_eq!(s.position(), 11);
        assert_eq!(*heard.borrow(), vec![11]);

        // a step while turning extends the move already under way
        s.move_to(2, ms(1000), &mut d);
        assert_eq!(s.position(), 0);
        s.step(Rotation::Clockwise, ms(1010), &mut d);
        s.tick(ms(1300), &mut d);
        assert_eq!(d.positions(0), vec![11, 0, 1, 2, 3]);
        assert_eq!(*heard.borrow(), vec![11, 3]);
    }

    #[test]
    fn test_target_wraps_modulo() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        s.move_to(13, ms(0), &mut d);
        assert_eq!(s.position(), 1);
        assert!(!s.is_moving());
    }

    #[test]
    fn test_listener_replaced_not_added() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        let first = recorder(&mut s);
        let second = recorder(&mut s);
        s.move_to(1, ms(0), &mut d);
        assert!(first.borrow().is_empty());
        assert_eq!(*second.borrow(), vec![1]);
        assert!(s.clear_change_listener());
        assert!(!s.clear_change_listener());
        s.move_to(2, ms(100), &mut d);
        assert_eq!(*second.borrow(), vec![1]);
    }

    #[test]
    fn test_set_position_does_not_notify() {
        let mut d = DummyDisplay::new();
        let mut s = knob(12);
        let heard = recorder(&mut s);
        s.set_position(7, &mut d);
        assert_eq!(d.positions(0), vec![7]);
        assert!(heard.borrow().is_empty());
        s.set_position(25, &mut d);
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn test_empty_angles_gives_single_stop() {
        let mut d = DummyDisplay::new();
        let mut s = Selector::new(0, Vec::new(), STEP);
        assert_eq!(s.position_count(), 1);
        s.move_to(5, ms(0), &mut d);
        assert_eq!(s.position(), 0);
    }
}
