// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use std::fmt;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::data::{Expression, ExpressionContext, ExpressionError, Value};
use crate::run::{Bullet, Config, CoordinatePlane, DefaultDirection, Parameters};

/// The last values emitted for each quantity.
///
/// `sequence` typed values are relative to these.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SequenceState {
    /// The last emitted heading.
    pub direction: Value,
    /// The last emitted speed.
    pub speed: Value,
    /// The last emitted horizontal acceleration.
    pub horizontal: Value,
    /// The last emitted vertical acceleration.
    pub vertical: Value,
}

#[derive(Debug, Clone)]
struct Randomness {
    rng: ChaCha8Rng,
    fixed: Option<Value>,
}

impl Randomness {
    fn new(seed: u64, fixed: Option<Value>) -> Self {
        Randomness {
            rng: ChaCha8Rng::seed_from_u64(seed),
            fixed,
        }
    }

    fn draw(&mut self) -> Value {
        match self.fixed {
            Some(value) => value,
            None => self.rng.random(),
        }
    }
}

type SpawnCallback = Box<dyn FnMut(Bullet)>;

/// The mutable state shared by all bullets of a simulation.
///
/// This holds the aim target, the difficulty, the random generator behind `$rand`, and the
/// values `sequence` typed commands build upon. Independent simulations use independent
/// contexts.
pub struct Context {
    target: Vec3,
    rank: Value,
    random: Randomness,
    seed: u64,
    plane: CoordinatePlane,
    sequence: SequenceState,
    default_speed: Value,
    default_direction: DefaultDirection,
    max_commands_per_step: usize,
    on_spawn: Option<SpawnCallback>,
    spawned: Vec<Bullet>,
}

fn clamp_rank(rank: Value) -> Value {
    if rank.is_nan() {
        0.
    } else {
        rank.clamp(0., 1.)
    }
}

impl Context {
    /// Create a context from configuration.
    pub fn new(config: Config) -> Self {
        Context {
            target: config.target,
            rank: clamp_rank(config.rank),
            random: Randomness::new(config.seed, config.rand),
            seed: config.seed,
            plane: config.plane,
            sequence: SequenceState::default(),
            default_speed: config.default_speed,
            default_direction: config.default_direction,
            max_commands_per_step: config.max_commands_per_step,
            on_spawn: None,
            spawned: Vec::new(),
        }
    }

    /// The position bullets aim at.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Move the position bullets aim at.
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// The difficulty.
    pub fn rank(&self) -> Value {
        self.rank
    }

    /// Set the difficulty; it is clamped to `[0, 1]`.
    pub fn set_rank(&mut self, rank: Value) {
        self.rank = clamp_rank(rank);
    }

    /// Use a fixed value for `$rand`.
    pub fn set_rand(&mut self, rand: Value) {
        self.random.fixed = Some(rand);
    }

    /// Draw `$rand` from the random generator again.
    pub fn clear_rand(&mut self) {
        self.random.fixed = None;
    }

    /// Restart the random generator with a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.random.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// The plane bullets are created in.
    pub fn plane(&self) -> CoordinatePlane {
        self.plane
    }

    /// Set the plane new bullets are created in.
    pub fn set_plane(&mut self, plane: CoordinatePlane) {
        self.plane = plane;
    }

    /// The last emitted values.
    pub fn sequence(&self) -> SequenceState {
        self.sequence
    }

    pub(crate) fn sequence_mut(&mut self) -> &mut SequenceState {
        &mut self.sequence
    }

    /// Forget the last emitted values and restart the random generator.
    pub fn reset_sequence_values(&mut self) {
        debug!(seed = self.seed, "resetting sequence values");
        self.sequence = SequenceState::default();
        self.reseed(self.seed);
    }

    /// The speed of fired bullets which do not specify one.
    pub fn default_speed(&self) -> Value {
        self.default_speed
    }

    /// The heading policy for fired bullets which do not specify one.
    pub fn default_direction(&self) -> DefaultDirection {
        self.default_direction
    }

    /// The most commands one bullet may run in a single step.
    pub fn max_commands_per_step(&self) -> usize {
        self.max_commands_per_step
    }

    /// Hand spawned bullets to a callback rather than queueing them.
    pub fn set_on_spawn<F>(&mut self, on_spawn: F)
    where
        F: FnMut(Bullet) + 'static,
    {
        self.on_spawn = Some(Box::new(on_spawn));
    }

    /// Queue spawned bullets again.
    pub fn clear_on_spawn(&mut self) {
        self.on_spawn = None;
    }

    /// Take the bullets spawned since the last call.
    pub fn take_spawned(&mut self) -> Vec<Bullet> {
        std::mem::take(&mut self.spawned)
    }

    pub(crate) fn spawn(&mut self, bullet: Bullet) {
        match self.on_spawn.as_mut() {
            Some(on_spawn) => on_spawn(bullet),
            None => self.spawned.push(bullet),
        }
    }

    /// Evaluate an expression with the given parameters bound.
    pub fn evaluate(&mut self, expr: &str, params: &Parameters) -> Result<Value, ExpressionError> {
        let mut scope = Scope {
            params,
            rank: self.rank,
            random: &mut self.random,
        };
        Expression::evaluate(expr, &mut scope)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("target", &self.target)
            .field("rank", &self.rank)
            .field("rand", &self.random.fixed)
            .field("seed", &self.seed)
            .field("plane", &self.plane)
            .field("sequence", &self.sequence)
            .field("on_spawn", &self.on_spawn.is_some())
            .field("spawned", &self.spawned.len())
            .finish()
    }
}

struct Scope<'a> {
    params: &'a Parameters,
    rank: Value,
    random: &'a mut Randomness,
}

impl<'a> ExpressionContext for Scope<'a> {
    fn param(&self, index: usize) -> Option<Value> {
        self.params.get(index)
    }

    fn rand(&mut self) -> Value {
        self.random.draw()
    }

    fn rank(&self) -> Value {
        self.rank
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use crate::data::{ExpressionError, Value};
    use crate::run::{Bullet, Config, Context, CoordinatePlane, Parameters, SequenceState};

    #[test]
    fn test_context_rank_clamped() {
        let mut ctx = Context::new(Config {
            rank: 3.,
            ..Config::default()
        });
        assert_eq!(ctx.rank(), 1.);

        ctx.set_rank(-1.);
        assert_eq!(ctx.rank(), 0.);

        ctx.set_rank(Value::NAN);
        assert_eq!(ctx.rank(), 0.);

        ctx.set_rank(0.25);
        let rank = ctx.evaluate("$rank * 4", &Parameters::default()).unwrap();
        assert_eq!(rank, 1.);
    }

    #[test]
    fn test_context_fixed_rand() {
        let mut ctx = Context::default();
        ctx.set_rand(0.5);

        let value = ctx
            .evaluate("0.7 + 0.9*$rand", &Parameters::default())
            .unwrap();
        assert!((value - 1.15).abs() < 1e-6);

        ctx.clear_rand();
        let value = ctx.evaluate("$rand", &Parameters::default()).unwrap();
        assert!((0. ..1.).contains(&value));
    }

    #[test]
    fn test_context_rand_draws_fresh() {
        let mut ctx = Context::default();

        let draws = (0..8)
            .map(|_| ctx.evaluate("$rand", &Parameters::default()).unwrap())
            .collect::<Vec<_>>();
        assert!(draws.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_context_seeded() {
        let config = Config {
            seed: 1234,
            ..Config::default()
        };
        let mut first = Context::new(config.clone());
        let mut second = Context::new(config);

        for _ in 0..16 {
            let a = first.evaluate("$rand", &Parameters::default()).unwrap();
            let b = second.evaluate("$rand", &Parameters::default()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_context_reset_sequence_values() {
        let mut ctx = Context::default();
        let before = ctx.evaluate("$rand", &Parameters::default()).unwrap();
        ctx.sequence_mut().direction = 30.;
        ctx.sequence_mut().speed = 2.;

        ctx.reset_sequence_values();
        assert_eq!(ctx.sequence(), SequenceState::default());

        let after = ctx.evaluate("$rand", &Parameters::default()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_context_params() {
        let mut ctx = Context::default();
        let params = Parameters::new(vec![10., 2.]);

        assert_eq!(ctx.evaluate("$1 / $2", &params).unwrap(), 5.);

        let err = ctx.evaluate("$3", &params).unwrap_err();
        if let ExpressionError::MissingParameter {
            index,
        } = err
        {
            assert_eq!(index, 3);
        } else {
            panic!("unexpected error: {:?}", err);
        }
    }

    #[test]
    fn test_context_spawn_queue() {
        let mut ctx = Context::default();
        ctx.spawn(Bullet::new(Vec3::ZERO, 0., 1., CoordinatePlane::XY));
        ctx.spawn(Bullet::new(Vec3::ZERO, 90., 1., CoordinatePlane::XY));

        let spawned = ctx.take_spawned();
        assert_eq!(spawned.len(), 2);
        assert_eq!(spawned[1].direction(), 90.);
        assert!(ctx.take_spawned().is_empty());
    }

    #[test]
    fn test_context_spawn_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = Context::default();
        {
            let seen = seen.clone();
            ctx.set_on_spawn(move |bullet| seen.borrow_mut().push(bullet.speed()));
        }

        ctx.spawn(Bullet::new(Vec3::ZERO, 0., 3., CoordinatePlane::XY));
        assert_eq!(*seen.borrow(), vec![3.]);
        assert!(ctx.take_spawned().is_empty());

        ctx.clear_on_spawn();
        ctx.spawn(Bullet::new(Vec3::ZERO, 0., 4., CoordinatePlane::XY));
        assert_eq!(ctx.take_spawned().len(), 1);
        assert_eq!(seen.borrow().len(), 1);
    }
}
