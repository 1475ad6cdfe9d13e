//! Command dispatch: heard phrase -> key event on the device

use crate::bridge::{BridgeError, DeviceBridge};
use crate::commands::{Resolution, Resolver};
use crate::continuous::PhraseSink;

/// What happened to one phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { canonical: String, keycode: String },
    Unknown(String),
    NotConfigured,
    Failed { canonical: String, reason: String },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    resolver: Resolver,
    bridge: DeviceBridge,
    device: Option<String>,
}

impl Dispatcher {
    pub fn new(resolver: Resolver, bridge: DeviceBridge) -> Self {
        Self {
            resolver,
            bridge,
            device: None,
        }
    }

    pub fn set_device(&mut self, address: Option<String>) {
        self.device = address;
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn bridge(&self) -> &DeviceBridge {
        &self.bridge
    }

    /// Resolve a phrase and send its key event. Unknown phrases never reach
    /// the bridge.
    pub fn dispatch(&self, phrase: &str) -> DispatchOutcome {
        if self.device.is_none() {
            println!("[FireTV] Device not configured. Run setup first.");
            return DispatchOutcome::NotConfigured;
        }

        let (canonical, keycode) = match self.resolver.resolve(phrase) {
            Resolution::Command {
                phrase,
                canonical,
                keycode,
                via_alias,
            } => {
                if via_alias {
                    println!("[FireTV] Recognized '{}' as '{}'", phrase, canonical);
                }
                (canonical, keycode)
            }
            Resolution::Unknown(phrase) => {
                println!("[FireTV] ⚠️ Unknown command: {}", phrase);
                println!("[FireTV] Try saying: {}", self.hint());
                return DispatchOutcome::Unknown(phrase);
            }
        };

        println!("[FireTV] 📺 Sending {} ({})...", canonical, keycode);
        match self.bridge.send_key_event(&keycode) {
            Ok(()) => {
                println!("[FireTV] ✅ Command sent successfully: {}", canonical);
                DispatchOutcome::Sent { canonical, keycode }
            }
            Err(e) => {
                let reason = match &e {
                    BridgeError::Rejected { stderr, .. } => stderr.clone(),
                    BridgeError::Process(p) => p.to_string(),
                };
                tracing::warn!("Key event failed: {}", e);
                println!("[FireTV] ❌ Error sending command: {}", reason);
                DispatchOutcome::Failed { canonical, reason }
            }
        }
    }

    fn hint(&self) -> String {
        self.resolver
            .commands()
            .names()
            .filter(|name| !name.contains(' '))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl PhraseSink for Dispatcher {
    fn handle(&mut self, phrase: &str) {
        self.dispatch(phrase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::{FakeRunner, Reply};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn dispatcher(replies: Vec<Reply>) -> (Arc<FakeRunner>, Dispatcher) {
        let runner = Arc::new(FakeRunner::new(replies));
        let resolver = Resolver::builtin_with(&BTreeMap::new()).unwrap();
        let mut d = Dispatcher::new(resolver, DeviceBridge::new(runner.clone(), "adb"));
        d.set_device(Some("192.168.1.50".to_string()));
        (runner, d)
    }

    #[test]
    fn test_alias_is_sent_as_canonical_keycode() {
        let (runner, d) = dispatcher(vec![Reply::ok("")]);
        assert_eq!(
            d.dispatch("Oopar"),
            DispatchOutcome::Sent {
                canonical: "up".to_string(),
                keycode: "KEYCODE_DPAD_UP".to_string(),
            }
        );
        assert_eq!(runner.calls()[0].1, vec!["shell", "input", "keyevent", "KEYCODE_DPAD_UP"]);
    }

    #[test]
    fn test_unknown_phrase_never_touches_bridge() {
        let (runner, d) = dispatcher(vec![]);
        assert_eq!(
            d.dispatch("open netflix"),
            DispatchOutcome::Unknown("open netflix".to_string())
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_unconfigured_device_never_touches_bridge() {
        let (runner, mut d) = dispatcher(vec![]);
        d.set_device(None);
        assert_eq!(d.dispatch("up"), DispatchOutcome::NotConfigured);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_bridge_failure_is_reported_not_raised() {
        let (_, d) = dispatcher(vec![Reply::exit(1, "error: device offline\n")]);
        assert_eq!(
            d.dispatch("home"),
            DispatchOutcome::Failed {
                canonical: "home".to_string(),
                reason: "error: device offline".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_bridge_binary_is_reported() {
        let (_, d) = dispatcher(vec![Reply::SpawnFailure]);
        assert!(matches!(d.dispatch("menu"), DispatchOutcome::Failed { .. }));
    }

    #[test]
    fn test_hint_lists_single_word_commands() {
        let (_, d) = dispatcher(vec![]);
        assert_eq!(
            d.hint(),
            "up, down, left, right, select, play, pause, back, home, menu"
        );
    }
}
