// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use std::rc::Rc;

use glam::Vec3;

use crate::data::{Element, Value};
use crate::run::{normalize_degrees, ActionRunner, CoordinatePlane, Parameters, TimedChange};

macro_rules! advance_change {
    ( $change:expr, $value:expr ) => {
        if let Some(v) = $change.advance() {
            $value = v;
        }
    };
}

/// A moving entity driven by BulletML actions.
///
/// Invisible bullets ("shooters") only exist to run commands; visible bullets are drawn and
/// collided with by the host.
#[derive(Debug, Clone)]
pub struct Bullet {
    position: Vec3,
    direction: Value,
    speed: Value,
    horizontal_accel: Value,
    vertical_accel: Value,
    drift: Vec3,
    active: bool,
    visible: bool,
    plane: CoordinatePlane,

    runners: Vec<ActionRunner>,

    direction_change: TimedChange,
    speed_change: TimedChange,
    horizontal_accel_change: TimedChange,
    vertical_accel_change: TimedChange,
}

impl Bullet {
    /// Create a new visible bullet.
    pub fn new(position: Vec3, direction: Value, speed: Value, plane: CoordinatePlane) -> Self {
        Bullet {
            position,
            direction,
            speed,
            horizontal_accel: 0.,
            vertical_accel: 0.,
            drift: Vec3::ZERO,
            active: true,
            visible: true,
            plane,

            runners: Vec::new(),

            direction_change: TimedChange::default(),
            speed_change: TimedChange::default(),
            horizontal_accel_change: TimedChange::default(),
            vertical_accel_change: TimedChange::default(),
        }
    }

    /// Create a stationary, invisible bullet.
    pub fn shooter(position: Vec3, plane: CoordinatePlane) -> Self {
        let mut bullet = Self::new(position, 0., 0., plane);
        bullet.visible = false;
        bullet
    }

    /// The position of the bullet.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the bullet.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// The heading of the bullet in degrees.
    pub fn direction(&self) -> Value {
        self.direction
    }

    /// Set the heading of the bullet.
    pub fn set_direction(&mut self, direction: Value) {
        self.direction = direction;
    }

    /// The speed of the bullet along its heading.
    pub fn speed(&self) -> Value {
        self.speed
    }

    /// Set the speed of the bullet.
    pub fn set_speed(&mut self, speed: Value) {
        self.speed = speed;
    }

    /// The horizontal component of the acceleration.
    pub fn horizontal_accel(&self) -> Value {
        self.horizontal_accel
    }

    /// The vertical component of the acceleration.
    pub fn vertical_accel(&self) -> Value {
        self.vertical_accel
    }

    /// The acceleration of the bullet.
    pub fn acceleration(&self) -> Vec3 {
        self.plane.compose(self.horizontal_accel, self.vertical_accel)
    }

    /// The velocity of the bullet.
    ///
    /// This is the heading at the current speed plus whatever acceleration has accumulated.
    pub fn velocity(&self) -> Vec3 {
        self.plane.vector(self.direction) * self.speed + self.drift
    }

    /// The plane in which the bullet moves.
    pub fn plane(&self) -> CoordinatePlane {
        self.plane
    }

    /// Whether the bullet still exists.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the host should draw the bullet.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the bullet.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Destroy the bullet.
    pub fn vanish(&mut self) {
        self.active = false;
        self.runners.clear();
    }

    /// The in-progress change of direction.
    pub fn direction_change(&self) -> &TimedChange {
        &self.direction_change
    }

    /// The in-progress change of speed.
    pub fn speed_change(&self) -> &TimedChange {
        &self.speed_change
    }

    /// The in-progress changes of acceleration, horizontal then vertical.
    pub fn accel_changes(&self) -> (&TimedChange, &TimedChange) {
        (&self.horizontal_accel_change, &self.vertical_accel_change)
    }

    /// Turn towards a heading over a number of frames.
    ///
    /// The target may lie outside `[0, 360)` to pick the way round; the heading itself is kept
    /// within it.
    pub fn change_direction(&mut self, target: Value, frames: u32) {
        self.direction_change = TimedChange::new(self.direction, target, frames);
        if frames == 0 {
            self.direction = normalize_degrees(target);
        }
    }

    /// Change speed over a number of frames.
    pub fn change_speed(&mut self, target: Value, frames: u32) {
        self.speed_change = TimedChange::new(self.speed, target, frames);
        if frames == 0 {
            self.speed = target;
        }
    }

    /// Change acceleration over a number of frames.
    ///
    /// Axes without a target keep their current acceleration and any change in progress.
    pub fn change_accel(&mut self, horizontal: Option<Value>, vertical: Option<Value>, frames: u32) {
        if let Some(target) = horizontal {
            self.horizontal_accel_change = TimedChange::new(self.horizontal_accel, target, frames);
            if frames == 0 {
                self.horizontal_accel = target;
            }
        }
        if let Some(target) = vertical {
            self.vertical_accel_change = TimedChange::new(self.vertical_accel, target, frames);
            if frames == 0 {
                self.vertical_accel = target;
            }
        }
    }

    /// The stack of action frames; the last runner is the one executing.
    pub fn runners(&self) -> &[ActionRunner] {
        &self.runners
    }

    pub(crate) fn runners_mut(&mut self) -> &mut Vec<ActionRunner> {
        &mut self.runners
    }

    /// The number of frames the executing action is waiting for.
    pub fn pending_wait(&self) -> u32 {
        self.runners
            .last()
            .map_or(0, ActionRunner::pending_wait)
    }

    /// Whether any action frames remain.
    pub fn has_work(&self) -> bool {
        !self.runners.is_empty()
    }

    /// Start running an action on top of whatever is running.
    pub fn push_action(&mut self, action: Rc<Element>, params: Parameters) {
        self.runners.push(ActionRunner::new(action, params));
    }

    /// Push runners so that the first one executes first.
    pub(crate) fn push_runners<I>(&mut self, runners: I)
    where
        I: IntoIterator<Item = ActionRunner>,
        I::IntoIter: DoubleEndedIterator,
    {
        self.runners.extend(runners.into_iter().rev());
    }

    /// Advance the bullet by one frame.
    ///
    /// In-progress changes move forward by one frame regardless of `delta`; `delta` scales the
    /// movement of the bullet.
    pub fn update(&mut self, delta: Value) {
        if !self.active {
            return;
        }

        if let Some(direction) = self.direction_change.advance() {
            self.direction = normalize_degrees(direction);
        }
        advance_change!(self.speed_change, self.speed);
        advance_change!(self.horizontal_accel_change, self.horizontal_accel);
        advance_change!(self.vertical_accel_change, self.vertical_accel);

        self.drift += self.acceleration() * delta;
        self.position += self.velocity() * delta;
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use glam::Vec3;

    use crate::data::{Element, ElementKind};
    use crate::run::{Bullet, CoordinatePlane, Parameters};

    fn assert_vec_close(actual: Vec3, expected: Vec3) {
        assert!(
            actual.abs_diff_eq(expected, 1e-4),
            "{:?} is not close to {:?}",
            actual,
            expected,
        );
    }

    #[test]
    fn test_bullet_moves_along_heading() {
        let mut bullet = Bullet::new(Vec3::ZERO, 90., 2., CoordinatePlane::XY);

        bullet.update(1.);
        assert_vec_close(bullet.position(), Vec3::new(2., 0., 0.));

        bullet.update(0.5);
        assert_vec_close(bullet.position(), Vec3::new(3., 0., 0.));
    }

    #[test]
    fn test_bullet_moves_in_yz() {
        let mut bullet = Bullet::new(Vec3::ONE, 90., 1., CoordinatePlane::YZ);

        bullet.update(1.);
        assert_vec_close(bullet.position(), Vec3::new(1., 1., 2.));
        assert_vec_close(bullet.velocity(), Vec3::Z);
    }

    #[test]
    fn test_bullet_shooter() {
        let shooter = Bullet::shooter(Vec3::new(1., 2., 0.), CoordinatePlane::XY);

        assert!(shooter.is_active());
        assert!(!shooter.is_visible());
        assert_eq!(shooter.speed(), 0.);
        assert!(!shooter.has_work());
    }

    #[test]
    fn test_bullet_vanish_idempotent() {
        let mut bullet = Bullet::new(Vec3::ZERO, 0., 1., CoordinatePlane::XY);
        bullet.push_action(
            Rc::new(Element::empty(ElementKind::Action)),
            Parameters::default(),
        );

        bullet.vanish();
        assert!(!bullet.is_active());
        assert!(!bullet.has_work());

        bullet.vanish();
        assert!(!bullet.is_active());
    }

    #[test]
    fn test_bullet_vanished_does_not_move() {
        let mut bullet = Bullet::new(Vec3::ZERO, 0., 1., CoordinatePlane::XY);
        bullet.vanish();
        bullet.update(1.);

        assert_eq!(bullet.position(), Vec3::ZERO);
    }

    #[test]
    fn test_bullet_change_direction() {
        let mut bullet = Bullet::new(Vec3::ZERO, 0., 0., CoordinatePlane::XY);
        bullet.change_direction(90., 10);

        (0..5).for_each(|_| bullet.update(1.));
        assert!((bullet.direction() - 45.).abs() < 1e-4);
        assert!(bullet.direction_change().is_active());

        (0..5).for_each(|_| bullet.update(1.));
        assert_eq!(bullet.direction(), 90.);
        assert!(!bullet.direction_change().is_active());

        bullet.update(1.);
        assert_eq!(bullet.direction(), 90.);
    }

    #[test]
    fn test_bullet_change_direction_wraps() {
        let mut bullet = Bullet::new(Vec3::ZERO, 350., 0., CoordinatePlane::XY);
        bullet.change_direction(380., 3);

        bullet.update(1.);
        assert_eq!(bullet.direction(), 0.);
        (0..2).for_each(|_| bullet.update(1.));
        assert_eq!(bullet.direction(), 20.);

        bullet.change_direction(-90., 0);
        assert_eq!(bullet.direction(), 270.);
    }

    #[test]
    fn test_bullet_change_immediately() {
        let mut bullet = Bullet::new(Vec3::ZERO, 0., 1., CoordinatePlane::XY);
        bullet.change_speed(3., 0);
        bullet.change_direction(180., 0);

        assert_eq!(bullet.speed(), 3.);
        assert_eq!(bullet.direction(), 180.);
        assert!(!bullet.speed_change().is_active());
    }

    #[test]
    fn test_bullet_change_accel() {
        let mut bullet = Bullet::new(Vec3::ZERO, 0., 0., CoordinatePlane::XY);
        bullet.change_accel(Some(1.), None, 2);

        bullet.update(1.);
        assert_eq!(bullet.horizontal_accel(), 0.5);
        assert_eq!(bullet.vertical_accel(), 0.);
        bullet.update(1.);
        assert_eq!(bullet.horizontal_accel(), 1.);

        let (horizontal, vertical) = bullet.accel_changes();
        assert!(!horizontal.is_active());
        assert!(!vertical.is_active());
    }

    #[test]
    fn test_bullet_acceleration_builds_velocity() {
        let mut bullet = Bullet::new(Vec3::ZERO, 0., 0., CoordinatePlane::XY);
        bullet.change_accel(Some(0.), Some(1.), 0);

        bullet.update(1.);
        assert_vec_close(bullet.velocity(), Vec3::Y);
        assert_vec_close(bullet.position(), Vec3::Y);

        bullet.update(1.);
        assert_vec_close(bullet.velocity(), Vec3::Y * 2.);
        assert_vec_close(bullet.position(), Vec3::Y * 3.);
    }
}
