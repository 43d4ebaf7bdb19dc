// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use std::rc::Rc;

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::data::{
    DirectionKind, Document, Element, ElementKind, EntityError, ExpressionError, Value,
};
use crate::run::geometry::{normalize_degrees, shortest_turn};
use crate::run::runner::Poll;
use crate::run::{ActionRunner, Bullet, Context, DefaultDirection, Parameters};

#[derive(Debug, Error)]
enum CommandError {
    #[error("bad expression: {}", source)]
    Expression {
        #[from]
        source: ExpressionError,
    },
    #[error("unresolved reference: {}", source)]
    Entity {
        #[from]
        source: EntityError,
    },
    #[error("`{}` without a `{}` element", command, child)]
    Missing {
        command: ElementKind,
        child: ElementKind,
    },
    #[error("`{}` evaluated to {}", command, value)]
    NotFinite {
        command: ElementKind,
        value: Value,
    },
}

impl CommandError {
    fn missing(command: ElementKind, child: ElementKind) -> Self {
        CommandError::Missing {
            command,
            child,
        }
    }
}

/// What to do with the current runner after a command.
enum Status {
    /// Move on to the next command.
    Next,
    /// Stay on the command for a number of frames.
    Wait(u32),
    /// Move on, then run these frames first (the first one runs first).
    Push(Vec<ActionRunner>),
    /// The bullet is gone.
    Vanish,
}

/// Runs the actions of a document on bullets.
///
/// The executor itself is immutable; all state lives in the bullets and the [`Context`].
#[derive(Debug, Clone)]
pub struct Executor {
    document: Rc<Document>,
}

impl Executor {
    /// Create an executor for a document.
    pub fn new(document: Document) -> Self {
        Executor {
            document: Rc::new(document),
        }
    }

    /// The document being executed.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Create an invisible bullet running the entry point of the document.
    ///
    /// This is the `top` action if there is one, otherwise the first `top*` action.
    pub fn shooter(&self, position: Vec3, ctx: &Context) -> Option<Bullet> {
        let top = self
            .document
            .top_action()
            .or_else(|| self.document.top_actions().into_iter().next())?;

        let mut shooter = Bullet::shooter(position, ctx.plane());
        shooter.push_action(top.clone(), Parameters::default());
        Some(shooter)
    }

    /// Create one invisible bullet for each entry point of the document.
    pub fn shooters(&self, position: Vec3, ctx: &Context) -> Vec<Bullet> {
        self.document
            .top_actions()
            .into_iter()
            .map(|top| {
                let mut shooter = Bullet::shooter(position, ctx.plane());
                shooter.push_action(top.clone(), Parameters::default());
                shooter
            })
            .collect()
    }

    /// Run the commands of a bullet for one frame.
    ///
    /// Commands run until one of them waits or the bullet runs out of commands. Returns whether
    /// the bullet still has work to do. Failing commands are logged and skipped.
    pub fn step(&self, ctx: &mut Context, bullet: &mut Bullet) -> bool {
        if !bullet.is_active() {
            return false;
        }

        let mut budget = ctx.max_commands_per_step();
        loop {
            let poll = match bullet.runners_mut().last_mut() {
                Some(runner) => runner.poll(),
                None => return false,
            };

            let (command, params) = match poll {
                Poll::Suspended => return true,
                Poll::Finished => {
                    bullet.runners_mut().pop();
                    continue;
                },
                Poll::Ready(command, params) => (command, params),
            };

            if budget == 0 {
                warn!(
                    limit = ctx.max_commands_per_step(),
                    "too many commands in one step; yielding"
                );
                return true;
            }
            budget -= 1;

            trace!(command = %command.kind(), depth = bullet.runners().len(), "dispatching");
            let status = self
                .execute(ctx, bullet, &command, &params)
                .unwrap_or_else(|err| {
                    warn!(command = %command.kind(), "skipping command: {}", err);
                    Status::Next
                });

            match status {
                Status::Next | Status::Wait(0) => Self::advance(bullet),
                Status::Wait(frames) => {
                    if let Some(runner) = bullet.runners_mut().last_mut() {
                        runner.suspend(frames - 1);
                    }
                    return true;
                },
                Status::Push(runners) => {
                    Self::advance(bullet);
                    bullet.push_runners(runners);
                },
                Status::Vanish => {
                    bullet.vanish();
                    return false;
                },
            }
        }
    }

    fn advance(bullet: &mut Bullet) {
        if let Some(runner) = bullet.runners_mut().last_mut() {
            runner.advance();
        }
    }

    fn execute(
        &self,
        ctx: &mut Context,
        bullet: &mut Bullet,
        command: &Rc<Element>,
        params: &Parameters,
    ) -> Result<Status, CommandError> {
        Ok(match command.kind() {
            ElementKind::Fire => {
                self.fire(ctx, bullet, command, params)?;
                Status::Next
            },
            ElementKind::FireRef => {
                let fire = self.document.resolve(command)?;
                let params = self.bind_params(ctx, command, params)?;
                self.fire(ctx, bullet, fire, &params)?;
                Status::Next
            },
            ElementKind::Action => {
                Status::Push(vec![ActionRunner::new(command.clone(), params.clone())])
            },
            ElementKind::ActionRef => {
                let action = self.document.resolve(command)?.clone();
                let params = self.bind_params(ctx, command, params)?;
                Status::Push(vec![ActionRunner::new(action, params)])
            },
            ElementKind::Repeat => self.repeat(ctx, command, params)?,
            ElementKind::Wait => Status::Wait(self.eval_frames(ctx, command, params)?),
            ElementKind::Vanish => Status::Vanish,
            ElementKind::ChangeDirection => {
                self.change_direction(ctx, bullet, command, params)?;
                Status::Next
            },
            ElementKind::ChangeSpeed => {
                self.change_speed(ctx, bullet, command, params)?;
                Status::Next
            },
            ElementKind::Accel => {
                self.accel(ctx, bullet, command, params)?;
                Status::Next
            },
            kind => {
                debug!(command = %kind, "ignoring element in action");
                Status::Next
            },
        })
    }

    fn fire(
        &self,
        ctx: &mut Context,
        bullet: &Bullet,
        fire: &Element,
        params: &Parameters,
    ) -> Result<(), CommandError> {
        // Inline templates see the parameters of the firing frame.
        let (template, template_params) = match fire.first_child(ElementKind::Bullet) {
            Some(inline) => (inline.clone(), params.clone()),
            None => {
                let reference = fire
                    .first_child(ElementKind::BulletRef)
                    .ok_or_else(|| CommandError::missing(ElementKind::Fire, ElementKind::Bullet))?;
                let template = self.document.resolve(reference)?.clone();
                (template, self.bind_params(ctx, reference, params)?)
            },
        };

        let direction = if let Some(direction) = fire.first_child(ElementKind::Direction) {
            self.direction(ctx, bullet, direction, params)?
        } else if let Some(direction) = template.first_child(ElementKind::Direction) {
            self.direction(ctx, bullet, direction, &template_params)?
        } else {
            match ctx.default_direction() {
                DefaultDirection::Aim => self.aim(ctx, bullet),
                DefaultDirection::Inherit => bullet.direction(),
            }
        };
        let direction = normalize_degrees(direction);

        let speed = if let Some(speed) = fire.first_child(ElementKind::Speed) {
            self.speed(ctx, bullet, speed, params)?
        } else if let Some(speed) = template.first_child(ElementKind::Speed) {
            self.speed(ctx, bullet, speed, &template_params)?
        } else {
            ctx.default_speed()
        };

        let sequence = ctx.sequence_mut();
        sequence.direction = direction;
        sequence.speed = speed;

        let mut fired = Bullet::new(bullet.position(), direction, speed, ctx.plane());
        let runners = template
            .children()
            .iter()
            .filter_map(|child| {
                match child.kind() {
                    ElementKind::Action => {
                        Some(ActionRunner::new(child.clone(), template_params.clone()))
                    },
                    ElementKind::ActionRef => {
                        self.bullet_action(ctx, child, &template_params)
                            .map_err(|err| warn!("skipping bullet action: {}", err))
                            .ok()
                    },
                    _ => None,
                }
            })
            .collect::<Vec<_>>();
        fired.push_runners(runners);

        ctx.spawn(fired);
        Ok(())
    }

    fn bullet_action(
        &self,
        ctx: &mut Context,
        reference: &Element,
        params: &Parameters,
    ) -> Result<ActionRunner, CommandError> {
        let action = self.document.resolve(reference)?.clone();
        let params = self.bind_params(ctx, reference, params)?;
        Ok(ActionRunner::new(action, params))
    }

    fn repeat(
        &self,
        ctx: &mut Context,
        command: &Element,
        params: &Parameters,
    ) -> Result<Status, CommandError> {
        let times = command
            .first_child(ElementKind::Times)
            .ok_or_else(|| CommandError::missing(ElementKind::Repeat, ElementKind::Times))?;
        let times = self.eval(ctx, times, params)?;
        if times.is_infinite() {
            return Err(CommandError::NotFinite {
                command: ElementKind::Times,
                value: times,
            });
        }
        if times.is_nan() || times < 1. {
            return Ok(Status::Next);
        }

        // Every iteration costs at least one frame push; keep the stack bounded.
        let limit = ctx.max_commands_per_step();
        let count = times as usize;
        let count = if count > limit {
            warn!(times = count, limit, "capping repeat iterations");
            limit
        } else {
            count
        };

        let body = command
            .children()
            .iter()
            .find(|child| matches!(child.kind(), ElementKind::Action | ElementKind::ActionRef))
            .ok_or_else(|| CommandError::missing(ElementKind::Repeat, ElementKind::Action))?;

        let runners = if body.kind() == ElementKind::ActionRef {
            let action = self.document.resolve(body)?;
            (0..count)
                .map(|_| -> Result<_, CommandError> {
                    let params = self.bind_params(ctx, body, params)?;
                    Ok(ActionRunner::new(action.clone(), params))
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![ActionRunner::new(body.clone(), params.clone()); count]
        };

        Ok(Status::Push(runners))
    }

    fn change_direction(
        &self,
        ctx: &mut Context,
        bullet: &mut Bullet,
        command: &Element,
        params: &Parameters,
    ) -> Result<(), CommandError> {
        let direction = command.first_child(ElementKind::Direction).ok_or_else(|| {
            CommandError::missing(ElementKind::ChangeDirection, ElementKind::Direction)
        })?;
        let frames = self.term(ctx, command, params)?;

        let target = self.direction(ctx, bullet, direction, params)?;
        let target = match direction.direction_kind() {
            DirectionKind::Aim | DirectionKind::Absolute => {
                bullet.direction() + shortest_turn(bullet.direction(), target)
            },
            DirectionKind::Relative | DirectionKind::Sequence => target,
        };

        ctx.sequence_mut().direction = normalize_degrees(target);
        bullet.change_direction(target, frames);
        Ok(())
    }

    fn change_speed(
        &self,
        ctx: &mut Context,
        bullet: &mut Bullet,
        command: &Element,
        params: &Parameters,
    ) -> Result<(), CommandError> {
        let speed = command
            .first_child(ElementKind::Speed)
            .ok_or_else(|| CommandError::missing(ElementKind::ChangeSpeed, ElementKind::Speed))?;
        let frames = self.term(ctx, command, params)?;

        let target = self.speed(ctx, bullet, speed, params)?;

        ctx.sequence_mut().speed = target;
        bullet.change_speed(target, frames);
        Ok(())
    }

    fn accel(
        &self,
        ctx: &mut Context,
        bullet: &mut Bullet,
        command: &Element,
        params: &Parameters,
    ) -> Result<(), CommandError> {
        let frames = self.term(ctx, command, params)?;
        let swaps = self.document.orientation().swaps_axes();

        // Values of the document's axes; horizontal documents swap them relative to the bullet.
        let (current_h, current_v) = if swaps {
            (bullet.vertical_accel(), bullet.horizontal_accel())
        } else {
            (bullet.horizontal_accel(), bullet.vertical_accel())
        };

        let horizontal = match command.first_child(ElementKind::Horizontal) {
            Some(element) => {
                let amount = self.eval(ctx, element, params)?;
                let target = element
                    .change_kind()
                    .modify(amount, current_h, ctx.sequence().horizontal);
                ctx.sequence_mut().horizontal = target;
                Some(target)
            },
            None => None,
        };
        let vertical = match command.first_child(ElementKind::Vertical) {
            Some(element) => {
                let amount = self.eval(ctx, element, params)?;
                let target = element
                    .change_kind()
                    .modify(amount, current_v, ctx.sequence().vertical);
                ctx.sequence_mut().vertical = target;
                Some(target)
            },
            None => None,
        };

        if swaps {
            bullet.change_accel(vertical, horizontal, frames);
        } else {
            bullet.change_accel(horizontal, vertical, frames);
        }
        Ok(())
    }

    /// The heading a `direction` element asks for.
    fn direction(
        &self,
        ctx: &mut Context,
        bullet: &Bullet,
        direction: &Element,
        params: &Parameters,
    ) -> Result<Value, CommandError> {
        let value = self.eval(ctx, direction, params)?;

        Ok(match direction.direction_kind() {
            DirectionKind::Aim => self.aim(ctx, bullet) + value,
            DirectionKind::Absolute => self.document.orientation().up(value),
            DirectionKind::Relative => bullet.direction() + value,
            DirectionKind::Sequence => ctx.sequence().direction + value,
        })
    }

    /// The speed a `speed` element asks for.
    fn speed(
        &self,
        ctx: &mut Context,
        bullet: &Bullet,
        speed: &Element,
        params: &Parameters,
    ) -> Result<Value, CommandError> {
        let value = self.eval(ctx, speed, params)?;
        Ok(speed
            .change_kind()
            .modify(value, bullet.speed(), ctx.sequence().speed))
    }

    fn aim(&self, ctx: &Context, bullet: &Bullet) -> Value {
        bullet
            .plane()
            .angle_between(bullet.position(), ctx.target())
    }

    fn term(
        &self,
        ctx: &mut Context,
        command: &Element,
        params: &Parameters,
    ) -> Result<u32, CommandError> {
        match command.first_child(ElementKind::Term) {
            Some(term) => self.eval_frames(ctx, term, params),
            None => Ok(0),
        }
    }

    fn bind_params(
        &self,
        ctx: &mut Context,
        reference: &Element,
        params: &Parameters,
    ) -> Result<Parameters, CommandError> {
        reference
            .children_of(ElementKind::Param)
            .map(|param| self.eval(ctx, param, params))
            .collect::<Result<Vec<_>, _>>()
            .map(Parameters::new)
    }

    fn eval(
        &self,
        ctx: &mut Context,
        element: &Element,
        params: &Parameters,
    ) -> Result<Value, CommandError> {
        Ok(ctx.evaluate(element.text().unwrap_or(""), params)?)
    }

    fn eval_frames(
        &self,
        ctx: &mut Context,
        element: &Element,
        params: &Parameters,
    ) -> Result<u32, CommandError> {
        let frames = self.eval(ctx, element, params)?;
        Ok(if frames.is_nan() || frames <= 0. {
            0
        } else {
            frames.ceil() as u32
        })
    }
}
