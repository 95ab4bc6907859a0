// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! One preprocessor child per filtered file, wrapped in a session owning
//! three line queues and the three carrier threads that pump them.
//!
//! The writer drains the stdin-bound queue into the child; the reader pumps
//! child stdout into the stdout-bound queue; the reporter pumps child stderr
//! into the stderr-bound queue, relaying each line as a warning. Every queue
//! ends with a type-tagged [`Entry::Eof`] sentinel so consumers never have
//! to guess where a stream stops.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, warn};

use crate::error::PpguardError;
use crate::settings::ChildCommand;

/// One slot of a carrier queue.
#[derive(Debug)]
pub enum Entry {
    Line(String),
    Eof,
}

fn channel(size: i64) -> (Sender<Entry>, Receiver<Entry>) {
    if size <= 0 {
        unbounded()
    } else {
        bounded(size as usize)
    }
}

pub struct ChildSession {
    child: Child,
    pid: u32,
    poll: Duration,
    timeout: f64,
    stdin_tx: Sender<Entry>,
    stdout_rx: Receiver<Entry>,
    stderr_rx: Receiver<Entry>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
    reporter: Option<JoinHandle<()>>,
    finished: bool,
}

impl ChildSession {
    /// Spawn the preprocessor and start the three carrier threads.
    pub fn spawn(
        cmd: &ChildCommand,
        queue_size: i64,
        poll: Duration,
        timeout: f64,
    ) -> Result<Self, PpguardError> {
        let mut command = match cmd {
            ChildCommand::Shell(script) => {
                let mut c = Command::new("/bin/sh");
                c.arg("-c").arg(script);
                c
            }
            ChildCommand::Argv(argv) => {
                let mut c = Command::new(&argv[0]);
                c.args(&argv[1..]);
                c
            }
        };
        debug!("spawning {command:?}");
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take().ok_or(PpguardError::ClosedPipe(0))?;
        let stdout = child.stdout.take().ok_or(PpguardError::ClosedPipe(1))?;
        let stderr = child.stderr.take().ok_or(PpguardError::ClosedPipe(2))?;
        let pid = child.id();

        let (stdin_tx, stdin_rx) = channel(queue_size);
        let (stdout_tx, stdout_rx) = channel(queue_size);
        let (stderr_tx, stderr_rx) = channel(queue_size);

        let writer = thread::Builder::new()
            .name("writer".to_string())
            .spawn(move || {
                let mut stdin = stdin;
                let mut broken = false;
                for entry in stdin_rx.iter() {
                    match entry {
                        Entry::Eof => break,
                        Entry::Line(_) if broken => {}
                        Entry::Line(line) => {
                            debug!("(stdin):{}", line.trim_end());
                            let sent = stdin
                                .write_all(line.as_bytes())
                                .and_then(|()| stdin.flush());
                            if sent.is_err() {
                                // The child stopped reading; keep draining so
                                // the producer never wedges on a full queue.
                                broken = true;
                            }
                        }
                    }
                }
                drop(stdin);
                debug!("stdin has closed");
            })
            .map_err(PpguardError::Io)?;

        let out_tx = stdout_tx;
        let reader = thread::Builder::new()
            .name("reader".to_string())
            .spawn(move || {
                let mut stdout = BufReader::new(stdout);
                loop {
                    let mut line = String::new();
                    match stdout.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            debug!("(stdout):{}", line.trim_end());
                            if out_tx.send(Entry::Line(line)).is_err() {
                                break;
                            }
                        }
                    }
                }
                let _ = out_tx.send(Entry::Eof);
                debug!("stdout has closed");
            })
            .map_err(PpguardError::Io)?;

        let err_tx = stderr_tx;
        let reporter = thread::Builder::new()
            .name("reporter".to_string())
            .spawn(move || {
                let mut stderr = BufReader::new(stderr);
                loop {
                    let mut line = String::new();
                    match stderr.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            warn!("(stderr):{}", line.trim_end());
                            if err_tx.send(Entry::Line(line)).is_err() {
                                break;
                            }
                        }
                    }
                }
                let _ = err_tx.send(Entry::Eof);
                debug!("stderr has closed");
            })
            .map_err(PpguardError::Io)?;

        Ok(Self {
            child,
            pid,
            poll,
            timeout,
            stdin_tx,
            stdout_rx,
            stderr_rx,
            writer: Some(writer),
            reader: Some(reader),
            reporter: Some(reporter),
            finished: false,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// The stdin-bound queue. Enqueue [`Entry::Eof`] when done.
    pub fn sender(&self) -> Sender<Entry> {
        self.stdin_tx.clone()
    }

    /// The stdout-bound queue. Ends with [`Entry::Eof`].
    pub fn receiver(&self) -> Receiver<Entry> {
        self.stdout_rx.clone()
    }

    /// Orderly shutdown: join the carriers, then reap the child. The caller
    /// must already have enqueued the stdin EOF sentinel and drained stdout
    /// to its sentinel.
    pub fn finish(mut self) -> Result<(), PpguardError> {
        self.finished = true;
        let carriers = [
            ("writer", self.writer.take()),
            ("reader", self.reader.take()),
            ("reporter", self.reporter.take()),
        ];
        for (name, handle) in carriers {
            if let Some(handle) = handle {
                join_carrier(name, handle, self.poll, || match name {
                    "writer" => self.stdin_tx.len(),
                    "reader" => self.stdout_rx.len(),
                    _ => self.stderr_rx.len(),
                });
            }
        }
        let code = self.wait_with_timeout()?;
        if code != 0 {
            return Err(PpguardError::ChildFailed {
                pid: self.pid,
                code,
            });
        }
        Ok(())
    }

    fn wait_with_timeout(&mut self) -> Result<i32, PpguardError> {
        let deadline = Instant::now() + Duration::from_secs_f64(self.timeout.max(0.0));
        loop {
            if let Some(status) = self.child.try_wait()? {
                debug!("child '{}' exited with {status}", self.pid);
                return Ok(status.code().unwrap_or(-1));
            }
            if Instant::now() >= deadline {
                let _ = self.child.kill();
                let _ = self.child.wait();
                return Err(PpguardError::ChildTimeout {
                    pid: self.pid,
                    timeout: self.timeout,
                });
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for ChildSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Abnormal exit: unblock the writer if possible, then reap the child
        // so the carriers see EOF on their pipes. The carriers themselves are
        // left to run out; they own nothing but the pipes.
        let _ = self.stdin_tx.try_send(Entry::Eof);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn join_carrier(name: &str, handle: JoinHandle<()>, poll: Duration, depth: impl Fn() -> usize) {
    let mut checks: u64 = 0;
    loop {
        let deadline = Instant::now() + poll;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10).min(poll));
        }
        if handle.is_finished() {
            break;
        }
        checks += 1;
        warn!(
            "thread '{name}' has not yet finished: checked {checks} time(s): \
             approximate number of remaining lines: {}",
            depth()
        );
    }
    let _ = handle.join();
    debug!("thread '{name}' has successfully terminated");
}
