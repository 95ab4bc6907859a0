#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::rc::Rc;

use tempfile::TempDir;

static TESTS_DIR: &str = "tests";
static FIXTURES_DIR: &str = "fixtures";

static ALREADY_RUN: &str = " you have already run this UCommand, if you want to run \
                            another command in the same test, use TestScenario::new instead of \
                            testing();";

/// A command result is the outputs of a command (streams and status code)
/// within a struct which has convenience assertion functions about those outputs
#[derive(Debug)]
pub struct CmdResult {
    // tmpd is used for convenience functions for asserts against fixtures
    tmpd: Rc<TempDir>,
    /// exit status for command (if there is one)
    pub code: Option<i32>,
    /// zero-exit from running the Command?
    pub success: bool,
    /// captured standard output after running the Command
    pub stdout: String,
    /// captured standard error after running the Command
    pub stderr: String,
}

impl CmdResult {
    pub fn stdout_str(&self) -> &str {
        &self.stdout
    }

    pub fn stderr_str(&self) -> &str {
        &self.stderr
    }

    pub fn code(&self) -> i32 {
        self.code.expect("program must be run first")
    }

    /// asserts that the command resulted in a success (zero) status code
    pub fn success(&self) -> &CmdResult {
        assert!(
            self.success,
            "command failed\nstdout: {}\nstderr: {}",
            self.stdout, self.stderr
        );
        self
    }

    /// asserts that the command resulted in a failure (non-zero) status code
    pub fn failure(&self) -> &CmdResult {
        assert!(
            !self.success,
            "command succeeded unexpectedly\nstdout: {}\nstderr: {}",
            self.stdout, self.stderr
        );
        self
    }

    pub fn code_is(&self, expected: i32) -> &CmdResult {
        assert_eq!(self.code(), expected, "stderr: {}", self.stderr);
        self
    }

    /// asserts that the command resulted in empty (zero-length) stderr stream output
    pub fn no_stderr(&self) -> &CmdResult {
        assert!(self.stderr.is_empty(), "stderr: {}", self.stderr);
        self
    }

    /// asserts that the command resulted in empty (zero-length) stdout stream output
    pub fn no_stdout(&self) -> &CmdResult {
        assert!(self.stdout.is_empty(), "stdout: {}", self.stdout);
        self
    }

    pub fn stdout_is<T: AsRef<str>>(&self, msg: T) -> &CmdResult {
        assert_eq!(self.stdout, msg.as_ref(), "stderr: {}", self.stderr);
        self
    }

    /// like `stdout_is`, but compares against the contents of a fixture file
    pub fn stdout_is_fixture<T: AsRef<str>>(&self, file_rel_path: T) -> &CmdResult {
        let contents = read_scenario_fixture(&self.tmpd, file_rel_path);
        self.stdout_is(contents)
    }

    /// `stdout_is` and `no_stderr` in one step
    pub fn stdout_only<T: AsRef<str>>(&self, msg: T) -> &CmdResult {
        self.no_stderr().stdout_is(msg)
    }

    pub fn stdout_only_fixture<T: AsRef<str>>(&self, file_rel_path: T) -> &CmdResult {
        let contents = read_scenario_fixture(&self.tmpd, file_rel_path);
        self.stdout_only(contents)
    }

    pub fn stdout_matches(&self, regex: &regex::Regex) -> &CmdResult {
        assert!(
            regex.is_match(&self.stdout),
            "stdout does not match {}\nstdout: {}",
            regex,
            self.stdout
        );
        self
    }

    pub fn stderr_contains<T: AsRef<str>>(&self, cmp: T) -> &CmdResult {
        assert!(
            self.stderr.contains(cmp.as_ref()),
            "'{}' not found in stderr: {}",
            cmp.as_ref(),
            self.stderr
        );
        self
    }

    pub fn stdout_contains<T: AsRef<str>>(&self, cmp: T) -> &CmdResult {
        assert!(
            self.stdout.contains(cmp.as_ref()),
            "'{}' not found in stdout: {}",
            cmp.as_ref(),
            self.stdout
        );
        self
    }
}

fn read_scenario_fixture<T: AsRef<str>>(tmpd: &Rc<TempDir>, file_rel_path: T) -> String {
    AtPath::new(tmpd.path()).read(file_rel_path.as_ref())
}

/// Object-oriented path struct that represents and can mutate files below
/// a test scenario's temporary directory
#[derive(Debug, Clone)]
pub struct AtPath {
    pub subdir: PathBuf,
}

impl AtPath {
    pub fn new(subdir: &Path) -> AtPath {
        AtPath {
            subdir: PathBuf::from(subdir),
        }
    }

    pub fn as_string(&self) -> String {
        self.subdir.to_str().unwrap().to_owned()
    }

    pub fn plus(&self, name: &str) -> PathBuf {
        self.subdir.join(name)
    }

    pub fn plus_as_string(&self, name: &str) -> String {
        self.plus(name).to_str().unwrap().to_owned()
    }

    pub fn read(&self, name: &str) -> String {
        let mut contents = String::new();
        let mut f = File::open(self.plus(name))
            .unwrap_or_else(|e| panic!("cannot open {name}: {e}"));
        f.read_to_string(&mut contents)
            .unwrap_or_else(|e| panic!("cannot read {name}: {e}"));
        contents
    }

    pub fn write(&self, name: &str, contents: &str) {
        fs::write(self.plus(name), contents)
            .unwrap_or_else(|e| panic!("cannot write {name}: {e}"));
    }

    pub fn file_exists(&self, name: &str) -> bool {
        self.plus(name).is_file()
    }
}

/// An environment for running a single utility test.
/// Fixtures of the utility are copied to a unique temporary directory,
/// and that directory is the working directory of every command run in it.
pub struct TestScenario {
    bin_path: PathBuf,
    pub fixtures: AtPath,
    tmpd: Rc<TempDir>,
}

impl TestScenario {
    pub fn new(util_name: &str) -> TestScenario {
        let tmpd = Rc::new(TempDir::new().unwrap());
        let ts = TestScenario {
            bin_path: PathBuf::from(env!("CARGO_BIN_EXE_ppguard")),
            fixtures: AtPath::new(tmpd.path()),
            tmpd,
        };
        let fixture_root = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join(TESTS_DIR)
            .join(FIXTURES_DIR)
            .join(util_name);
        if fixture_root.is_dir() {
            recursive_copy(&fixture_root, &ts.fixtures.subdir)
                .unwrap_or_else(|e| panic!("cannot copy fixtures: {e}"));
        }
        ts
    }

    pub fn ucmd(&self) -> UCommand {
        UCommand::new(&self.bin_path, &self.tmpd)
    }
}

fn recursive_copy(src: &Path, dest: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir(&target)?;
            recursive_copy(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// A `Command` wrapper that runs the tested binary inside the scenario's
/// temporary directory and returns a [`CmdResult`].
pub struct UCommand {
    raw: Command,
    tmpd: Rc<TempDir>,
    has_run: bool,
    stdin: Option<Vec<u8>>,
}

impl UCommand {
    pub fn new(bin_path: &Path, tmpd: &Rc<TempDir>) -> UCommand {
        let mut raw = Command::new(bin_path);
        raw.current_dir(tmpd.path());
        // Keep stderr empty on the happy paths the tests assert on.
        raw.env("LOG_LEVEL", "ERROR");
        UCommand {
            raw,
            tmpd: tmpd.clone(),
            has_run: false,
            stdin: None,
        }
    }

    pub fn arg<S: AsRef<std::ffi::OsStr>>(&mut self, arg: S) -> &mut UCommand {
        assert!(!self.has_run, "{}", ALREADY_RUN);
        self.raw.arg(arg);
        self
    }

    pub fn args<S: AsRef<std::ffi::OsStr>>(&mut self, args: &[S]) -> &mut UCommand {
        assert!(!self.has_run, "{}", ALREADY_RUN);
        self.raw.args(args);
        self
    }

    pub fn env<K, V>(&mut self, key: K, value: V) -> &mut UCommand
    where
        K: AsRef<std::ffi::OsStr>,
        V: AsRef<std::ffi::OsStr>,
    {
        assert!(!self.has_run, "{}", ALREADY_RUN);
        self.raw.env(key, value);
        self
    }

    pub fn pipe_in<T: Into<Vec<u8>>>(&mut self, input: T) -> &mut UCommand {
        assert!(!self.has_run, "{}", ALREADY_RUN);
        self.stdin = Some(input.into());
        self
    }

    pub fn run(&mut self) -> CmdResult {
        assert!(!self.has_run, "{}", ALREADY_RUN);
        self.has_run = true;
        let stdin = if self.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut child = self
            .raw
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap_or_else(|e| panic!("cannot spawn {:?}: {e}", self.raw));
        if let Some(input) = self.stdin.take() {
            child
                .stdin
                .take()
                .unwrap()
                .write_all(&input)
                .expect("cannot write to child stdin");
        }
        let output = child.wait_with_output().expect("cannot wait for child");
        CmdResult {
            tmpd: self.tmpd.clone(),
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Spawns the command, feeds any piped input, waits for the result,
    /// and asserts success.
    pub fn succeeds(&mut self) -> CmdResult {
        let cmd_result = self.run();
        cmd_result.success();
        cmd_result
    }

    /// Spawns the command, feeds any piped input, waits for the result,
    /// and asserts failure.
    pub fn fails(&mut self) -> CmdResult {
        let cmd_result = self.run();
        cmd_result.failure();
        cmd_result
    }
}
