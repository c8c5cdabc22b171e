//! Scripted [`Sender`] for testing endpoints in isolation.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::cancellation::CancellationSignal;
use crate::error::Result;
use crate::mediator::{Command, Sender};

/// Records every sent command and answers with queued responses.
pub struct MockSender<C: Command> {
    responses: Mutex<VecDeque<Result<C::Output>>>,
    calls: Mutex<Vec<(C, CancellationSignal)>>,
}

impl<C: Command> MockSender<C> {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the answer of the next call.
    pub fn returns(self, response: Result<C::Output>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Commands received so far, with their cancellation signal.
    pub fn calls(&self) -> MutexGuard<'_, Vec<(C, CancellationSignal)>> {
        self.calls.lock().unwrap()
    }
}

#[async_trait]
impl<C: Command> Sender<C> for MockSender<C> {
    async fn send(
        &self,
        command: C,
        cancellation: CancellationSignal,
    ) -> Result<C::Output> {
        self.calls.lock().unwrap().push((command, cancellation));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected command sent to mock")
    }
}
