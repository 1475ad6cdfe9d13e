//! Device bridge client (adb)
//!
//! Connects to the Fire TV over the network and delivers key events. What
//! counts as success for each call is a swappable [`BridgePolicy`].

use std::sync::Arc;
use thiserror::Error;

use crate::process::{ProcessError, ProcessOutput, ProcessRunner};

pub const DEFAULT_BRIDGE_PROGRAM: &str = "adb";

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("key event {keycode} rejected (exit {code:?}): {stderr}")]
    Rejected {
        keycode: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Decides whether a bridge call worked from its captured output
pub type Verdict = fn(&ProcessOutput) -> bool;

/// `adb connect` exits 0 even when it fails, so its text is inspected instead
pub fn stdout_mentions_connected(out: &ProcessOutput) -> bool {
    out.stdout.to_lowercase().contains("connected")
}

pub fn exit_status_zero(out: &ProcessOutput) -> bool {
    out.success()
}

#[derive(Debug, Clone, Copy)]
pub struct BridgePolicy {
    pub connect: Verdict,
    pub key_event: Verdict,
}

impl Default for BridgePolicy {
    fn default() -> Self {
        Self {
            connect: stdout_mentions_connected,
            key_event: exit_status_zero,
        }
    }
}

/// Result of a connect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub connected: bool,
    /// Bridge stdout, shown to the user when the connection fails
    pub output: String,
}

#[derive(Clone)]
pub struct DeviceBridge {
    runner: Arc<dyn ProcessRunner>,
    program: String,
    policy: BridgePolicy,
}

impl DeviceBridge {
    pub fn new(runner: Arc<dyn ProcessRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            policy: BridgePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BridgePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// `adb connect <address>`
    pub fn connect(&self, address: &str) -> Result<ConnectOutcome, ProcessError> {
        let out = self.runner.run(&self.program, &["connect", address], None)?;
        let connected = (self.policy.connect)(&out);
        tracing::info!("{} connect {} -> connected={}", self.program, address, connected);
        Ok(ConnectOutcome {
            connected,
            output: out.stdout,
        })
    }

    /// `adb shell input keyevent <code>`. No retry and no timeout; success
    /// only means the bridge accepted the command.
    pub fn send_key_event(&self, keycode: &str) -> Result<(), BridgeError> {
        let out = self
            .runner
            .run(&self.program, &["shell", "input", "keyevent", keycode], None)?;
        if (self.policy.key_event)(&out) {
            Ok(())
        } else {
            Err(BridgeError::Rejected {
                keycode: keycode.to_string(),
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            })
        }
    }
}

impl std::fmt::Debug for DeviceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBridge")
            .field("program", &self.program)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::{FakeRunner, Reply};

    fn bridge(replies: Vec<Reply>) -> (Arc<FakeRunner>, DeviceBridge) {
        let runner = Arc::new(FakeRunner::new(replies));
        let bridge = DeviceBridge::new(runner.clone(), "adb");
        (runner, bridge)
    }

    #[test]
    fn test_connect_success_is_case_insensitive() {
        let (runner, bridge) = bridge(vec![Reply::ok("Connected to 192.168.1.50:5555\n")]);
        let outcome = bridge.connect("192.168.1.50").unwrap();
        assert!(outcome.connected);
        assert_eq!(runner.calls()[0].1, vec!["connect", "192.168.1.50"]);
    }

    #[test]
    fn test_already_connected_counts() {
        let (_, bridge) = bridge(vec![Reply::ok("already connected to 10.0.0.2:5555")]);
        assert!(bridge.connect("10.0.0.2").unwrap().connected);
    }

    #[test]
    fn test_connect_failure_keeps_output() {
        let text = "failed to connect to '10.0.0.9:5555': Connection refused";
        let (_, bridge) = bridge(vec![Reply::ok(text)]);
        let outcome = bridge.connect("10.0.0.9").unwrap();
        assert!(!outcome.connected);
        assert_eq!(outcome.output, text);
    }

    #[test]
    fn test_connect_spawn_failure_is_error() {
        let (_, bridge) = bridge(vec![Reply::SpawnFailure]);
        assert!(bridge.connect("10.0.0.9").is_err());
    }

    #[test]
    fn test_key_event_args_and_no_timeout() {
        let (runner, bridge) = bridge(vec![Reply::ok("")]);
        bridge.send_key_event("KEYCODE_HOME").unwrap();
        let (program, args, timeout) = &runner.calls()[0];
        assert_eq!(program, "adb");
        assert_eq!(args, &["shell", "input", "keyevent", "KEYCODE_HOME"]);
        assert_eq!(*timeout, None);
    }

    #[test]
    fn test_key_event_nonzero_exit_is_rejected() {
        let (_, bridge) = bridge(vec![Reply::exit(1, "error: no devices/emulators found\n")]);
        match bridge.send_key_event("KEYCODE_BACK").unwrap_err() {
            BridgeError::Rejected { keycode, code, stderr } => {
                assert_eq!(keycode, "KEYCODE_BACK");
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "error: no devices/emulators found");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_policy_is_swappable() {
        fn exit_zero_only(out: &ProcessOutput) -> bool {
            out.success()
        }
        let (_, bridge) = bridge(vec![Reply::ok("whatever the bridge says")]);
        let bridge = bridge.with_policy(BridgePolicy {
            connect: exit_zero_only,
            key_event: exit_status_zero,
        });
        assert!(bridge.connect("10.0.0.2").unwrap().connected);
    }
}
