// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! The mid stage: stream the upstream lines into the preprocessor child and
//! relay its stdout back as a lazy sequence.
//!
//! Nothing is spawned until the first line is demanded. The upstream is then
//! drained completely into the stdin-bound queue (the writer carrier feeds
//! the child concurrently) before stdout is relayed, exactly in the child's
//! emission order. After the stdout sentinel the session shuts down; a
//! non-zero child exit surfaces as the final element of the stream.

use std::time::Duration;

use crate::coprocess::{ChildSession, Entry};
use crate::error::{LineResult, PpguardError};
use crate::settings::ChildCommand;

pub struct MidStage<I> {
    input: Option<I>,
    cmd: ChildCommand,
    queue_size: i64,
    poll: Duration,
    timeout: f64,
    state: State,
}

enum State {
    Idle,
    Running {
        session: Option<ChildSession>,
        stdout: crossbeam_channel::Receiver<Entry>,
    },
    Done,
}

impl<I> MidStage<I> {
    pub fn new(input: I, cmd: ChildCommand, queue_size: i64, poll: Duration, timeout: f64) -> Self {
        Self {
            input: Some(input),
            cmd,
            queue_size,
            poll,
            timeout,
            state: State::Idle,
        }
    }
}

impl<I: Iterator<Item = LineResult>> MidStage<I> {
    fn start(&mut self) -> Result<(), PpguardError> {
        let session = ChildSession::spawn(&self.cmd, self.queue_size, self.poll, self.timeout)?;
        let stdin = session.sender();
        let stdout = session.receiver();
        for item in self.input.take().into_iter().flatten() {
            match item {
                // A send only fails when every carrier is gone, which the
                // session shutdown will report in its own terms.
                Ok(line) => {
                    if stdin.send(Entry::Line(line)).is_err() {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        let _ = stdin.send(Entry::Eof);
        self.state = State::Running {
            session: Some(session),
            stdout,
        };
        Ok(())
    }
}

impl<I: Iterator<Item = LineResult>> Iterator for MidStage<I> {
    type Item = LineResult;

    fn next(&mut self) -> Option<LineResult> {
        loop {
            match &mut self.state {
                State::Done => return None,
                State::Idle => {
                    if let Err(e) = self.start() {
                        self.state = State::Done;
                        return Some(Err(e));
                    }
                }
                State::Running { session, stdout } => {
                    return match stdout.recv() {
                        Ok(Entry::Line(line)) => Some(Ok(line)),
                        Ok(Entry::Eof) | Err(_) => {
                            let session = session.take();
                            self.state = State::Done;
                            match session.map(ChildSession::finish).unwrap_or(Ok(())) {
                                Ok(()) => None,
                                Err(e) => Some(Err(e)),
                            }
                        }
                    };
                }
            }
        }
    }
}
