
use std::collections::VecDeque;
use std::fmt;

/// Operation is a unit of negotiation work run against the state `C` it is
/// handed when it reaches the head of the queue.
pub(crate) struct Operation<C> {
    run: Option<Box<dyn FnOnce(&mut C) + Send + 'static>>,
    description: &'static str,
    changes_state: bool,
}

impl<C> Operation<C> {
    pub(crate) fn new(
        op: impl FnOnce(&mut C) + Send + 'static,
        description: &'static str,
        changes_state: bool,
    ) -> Self {
        Self {
            run: Some(Box::new(op)),
            description,
            changes_state,
        }
    }
}

impl<C> fmt::Debug for Operation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("description", &self.description)
            .field("changes_state", &self.changes_state)
            .field("started", &self.run.is_none())
            .finish()
    }
}

/// Operations is a strict FIFO of pending operations. The head is the
/// current operation and stays queued until `complete` is called for it.
pub(crate) struct Operations<C> {
    queue: VecDeque<Operation<C>>,
    run_scheduled: bool,
    ran_state_changer: bool,
}

impl<C> Default for Operations<C> {
    fn default() -> Self {
        Operations {
            queue: VecDeque::new(),
            run_scheduled: false,
            ran_state_changer: false,
        }
    }
}

impl<C> Operations<C> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// enqueue appends `op`. If the queue was empty it becomes current and is
    /// scheduled for the next turn.
    pub(crate) fn enqueue(&mut self, op: Operation<C>) {
        log::trace!("enqueue operation {}", op.description);
        self.queue.push_back(op);
        if self.queue.len() == 1 {
            self.run_scheduled = true;
        }
    }

    /// take_scheduled hands out the current operation's work if it has been
    /// scheduled and not started yet.
    pub(crate) fn take_scheduled(&mut self) -> Option<Box<dyn FnOnce(&mut C) + Send + 'static>> {
        if !self.run_scheduled {
            return None;
        }
        self.run_scheduled = false;

        let head = self.queue.front_mut()?;
        log::trace!("run operation {}", head.description);
        head.run.take()
    }

    /// complete retires the current operation and schedules its successor.
    /// It returns true when the queue drained and at least one operation that
    /// ran since it was last empty could change signaling state.
    pub(crate) fn complete(&mut self) -> bool {
        let Some(done) = self.queue.pop_front() else {
            log::warn!("complete called with no current operation");
            return false;
        };
        log::trace!("complete operation {}", done.description);
        self.ran_state_changer |= done.changes_state;

        if self.queue.is_empty() {
            self.run_scheduled = false;
            std::mem::take(&mut self.ran_state_changer)
        } else {
            self.run_scheduled = true;
            false
        }
    }

    /// is_empty checks if there are tasks in the queue
    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub(crate) fn is_run_scheduled(&self) -> bool {
        self.run_scheduled
    }
}
