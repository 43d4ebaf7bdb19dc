// Distributed under the OSI-approved BSD 2-Clause License.
// See accompanying LICENSE file for details.

use std::rc::Rc;

use crate::data::{Element, Value};

/// Positional parameters bound to an action.
///
/// `$1` refers to the first parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    values: Rc<[Value]>,
}

impl Parameters {
    /// Bind a list of parameter values.
    pub fn new(values: Vec<Value>) -> Self {
        Parameters {
            values: values.into(),
        }
    }

    /// Get a parameter by its (1-based) index.
    pub fn get(&self, index: usize) -> Option<Value> {
        index
            .checked_sub(1)
            .and_then(|index| self.values.get(index))
            .copied()
    }

    /// The number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters are bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// What a runner needs next.
pub(crate) enum Poll {
    /// Still waiting; nothing to do this frame.
    Suspended,
    /// The next command to execute.
    Ready(Rc<Element>, Parameters),
    /// All commands have been executed.
    Finished,
}

/// One suspended frame of execution within an action.
#[derive(Debug, Clone)]
pub struct ActionRunner {
    action: Rc<Element>,
    cursor: usize,
    wait: Option<u32>,
    params: Parameters,
}

impl ActionRunner {
    /// Create a runner at the start of an action.
    pub fn new(action: Rc<Element>, params: Parameters) -> Self {
        ActionRunner {
            action,
            cursor: 0,
            wait: None,
            params,
        }
    }

    /// The action being executed.
    pub fn action(&self) -> &Rc<Element> {
        &self.action
    }

    /// The index of the current command.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The number of frames left to wait.
    pub fn pending_wait(&self) -> u32 {
        self.wait.unwrap_or(0)
    }

    /// The parameters bound to the action.
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// The command under the cursor.
    pub fn current(&self) -> Option<&Rc<Element>> {
        self.action.children().get(self.cursor)
    }

    /// Whether all commands have run and no wait is pending.
    pub fn is_finished(&self) -> bool {
        self.wait.is_none() && self.current().is_none()
    }

    pub(crate) fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Suspend on the current command for the given number of further frames.
    pub(crate) fn suspend(&mut self, frames: u32) {
        self.wait = Some(frames);
    }

    pub(crate) fn poll(&mut self) -> Poll {
        match self.wait {
            Some(0) => {
                // The wait is over; move past the command which started it.
                self.wait = None;
                self.advance();
            },
            Some(frames) => {
                self.wait = Some(frames - 1);
                return Poll::Suspended;
            },
            None => (),
        }

        match self.current() {
            Some(command) => Poll::Ready(command.clone(), self.params.clone()),
            None => Poll::Finished,
        }
    }
}
