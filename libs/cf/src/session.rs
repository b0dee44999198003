//! Finished CLI invocations and the matchers scenarios assert with.

use std::fmt;
use std::time::Duration;

use regex::Regex;

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Exited on its own with this status.
    Code(i32),
    /// Killed by a signal it did not trap.
    Signal(Option<i32>),
    /// Still running at the deadline and killed by the runner.
    TimedOut(Duration),
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exited with status {code}"),
            Self::Signal(Some(signal)) => write!(f, "was killed by signal {signal}"),
            Self::Signal(None) => f.write_str("was killed by a signal"),
            Self::TimedOut(after) => write!(f, "timed out after {after:?}"),
        }
    }
}

/// One CLI invocation after it finished or was killed.
///
/// Output captured before a kill is kept, so a timed-out session can still be
/// matched against.
#[derive(Debug, Clone)]
pub struct Session {
    /// Arguments as displayed; secrets are already redacted.
    pub args: Vec<String>,
    pub exit: Exit,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl Session {
    /// `cf` followed by the displayed arguments.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = String::from("cf");
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self.exit {
            Exit::Code(code) => Some(code),
            _ => None,
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit == Exit::Code(0)
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        matches!(self.exit, Exit::TimedOut(_))
    }

    /// True if every needle appears in stdout, each after the previous one.
    #[must_use]
    pub fn says(&self, needles: &[&str]) -> bool {
        self.first_unsaid(needles).is_none()
    }

    /// Index of the first needle not found after its predecessors.
    #[must_use]
    pub fn first_unsaid(&self, needles: &[&str]) -> Option<usize> {
        let mut rest = self.stdout.as_str();
        for (index, needle) in needles.iter().enumerate() {
            match rest.find(needle) {
                Some(at) => rest = &rest[at + needle.len()..],
                None => return Some(index),
            }
        }
        None
    }

    /// True if stdout or stderr contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.stdout.contains(needle) || self.stderr.contains(needle)
    }

    /// True if stdout matches `pattern`.
    #[must_use]
    pub fn matches(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.stdout)
    }

    /// Stdout followed by stderr, for failure messages.
    #[must_use]
    pub fn output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n--- stderr ---\n{}", self.stdout, self.stderr)
        }
    }

    /// Panics unless the command exited with `code`.
    #[track_caller]
    pub fn assert_exit(&self, code: i32) -> &Self {
        assert!(
            self.exit == Exit::Code(code),
            "`{}` {}, expected exit status {code}\n{}",
            self.command_line(),
            self.exit,
            self.output()
        );
        self
    }

    /// Panics unless stdout says every needle, in order.
    #[track_caller]
    pub fn assert_says(&self, needles: &[&str]) -> &Self {
        if let Some(index) = self.first_unsaid(needles) {
            panic!(
                "`{}` did not say {:?} (after {:?})\n{}",
                self.command_line(),
                needles[index],
                &needles[..index],
                self.output()
            );
        }
        self
    }

    /// Panics if stdout or stderr contains `needle`.
    #[track_caller]
    pub fn assert_not_says(&self, needle: &str) -> &Self {
        assert!(
            !self.contains(needle),
            "`{}` unexpectedly said {needle:?}\n{}",
            self.command_line(),
            self.output()
        );
        self
    }

    /// Panics unless stdout matches `pattern`.
    #[track_caller]
    pub fn assert_matches(&self, pattern: &Regex) -> &Self {
        assert!(
            self.matches(pattern),
            "`{}` output does not match /{pattern}/\n{}",
            self.command_line(),
            self.output()
        );
        self
    }

    /// Panics unless the runner had to kill the command at its deadline.
    #[track_caller]
    pub fn assert_timed_out(&self) -> &Self {
        assert!(
            self.timed_out(),
            "expected `{}` to still be running at its deadline, but it {}\n{}",
            self.command_line(),
            self.exit,
            self.output()
        );
        self
    }
}
