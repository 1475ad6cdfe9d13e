//! Speech capture via an external speech-to-text utility
//!
//! This module handles:
//! - Invoking the utility with a bounded wait
//! - Classifying what came back (heard / nothing / failure)
//! - The manual number menu used whenever recognition fails
//! - The capture side of continuous listening (no menu, short timeout)

use std::sync::Arc;
use std::time::Duration;

use crate::console::Prompt;
use crate::continuous::{CancelToken, Listen, PhraseSource};
use crate::lookups::{EXIT_PHRASE, MENU_LEGEND, menu_choice};
use crate::process::{ProcessError, ProcessRunner};

pub const DEFAULT_SPEECH_PROGRAM: &str = "termux-speech-to-text";

/// Wait for one utterance in single-shot mode
pub const SINGLE_SHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait for one utterance while listening continuously
pub const CONTINUOUS_TIMEOUT: Duration = Duration::from_secs(5);

/// What one invocation of the speech utility produced
#[derive(Debug)]
pub enum Capture {
    /// Recognized text, trimmed and lowercased
    Heard(String),
    /// Exit status 0 but no text
    Empty,
    /// Non-zero exit status
    Failed { code: Option<i32>, stderr: String },
    /// Could not run or timed out
    Error(ProcessError),
}

#[derive(Clone)]
pub struct SpeechCapture {
    runner: Arc<dyn ProcessRunner>,
    program: String,
}

impl SpeechCapture {
    pub fn new(runner: Arc<dyn ProcessRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Run the utility once (no arguments) and classify the result
    pub fn capture(&self, timeout: Duration) -> Capture {
        match self.runner.run(&self.program, &[], Some(timeout)) {
            Ok(out) if out.success() => {
                let text = out.stdout.trim().to_lowercase();
                if text.is_empty() {
                    Capture::Empty
                } else {
                    Capture::Heard(text)
                }
            }
            Ok(out) => Capture::Failed {
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            },
            Err(e) => Capture::Error(e),
        }
    }

    /// Capture one phrase, falling back to the number menu on any failure.
    /// `None` means nothing usable was entered this round.
    pub fn listen_once(&self, prompt: &mut dyn Prompt) -> Option<String> {
        match self.capture(SINGLE_SHOT_TIMEOUT) {
            Capture::Heard(text) => {
                println!("[FireTV] 👂 I heard: {}", text);
                return Some(text);
            }
            Capture::Empty => {
                println!("[FireTV] Could not understand. Switching to manual input...");
            }
            Capture::Failed { code, stderr } => {
                tracing::warn!("{} exited with {:?}: {}", self.program, code, stderr);
                println!("[FireTV] Error with speech recognition. Trying alternative method...");
            }
            Capture::Error(e) => {
                println!("[FireTV] ❌ Error: {}", e);
                println!("[FireTV] Trying alternative method...");
            }
        }
        fallback_menu(prompt)
    }
}

impl std::fmt::Debug for SpeechCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCapture")
            .field("program", &self.program)
            .finish()
    }
}

/// Manual number menu. Closed input selects exit so the program cannot spin
/// on a dead terminal; a read error skips this round.
pub fn fallback_menu(prompt: &mut dyn Prompt) -> Option<String> {
    println!();
    println!("Voice recognition failed. Use numbers instead:");
    for line in MENU_LEGEND {
        println!("{}", line);
    }

    let answer = match prompt.read_line("Enter option: ") {
        Ok(Some(answer)) => answer,
        Ok(None) => return Some(EXIT_PHRASE.to_string()),
        Err(e) => {
            tracing::warn!("Failed to read menu choice: {}", e);
            println!("Error with alternative method: {}", e);
            return None;
        }
    };

    match menu_choice(&answer) {
        Some(phrase) => Some(phrase.to_string()),
        None => {
            println!("Invalid option");
            None
        }
    }
}

impl PhraseSource for SpeechCapture {
    fn next(&mut self, _cancel: &CancelToken) -> Listen {
        match self.capture(CONTINUOUS_TIMEOUT) {
            Capture::Heard(text) => {
                println!("[FireTV] 👂 I heard: {}", text);
                Listen::Phrase(text)
            }
            Capture::Empty => Listen::Nothing,
            Capture::Failed { code, stderr } => {
                tracing::debug!("{} exited with {:?}: {}", self.program, code, stderr);
                Listen::Nothing
            }
            // Silence simply runs into the deadline; listen again right away
            Capture::Error(ProcessError::Timeout { .. }) => Listen::Nothing,
            Capture::Error(e) => {
                println!("[FireTV] ⚠️ Continuous listening error: {}", e);
                Listen::Error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::scripted::{FailingPrompt, ScriptedPrompt};
    use crate::process::fake::{FakeRunner, Reply};

    fn speech(replies: Vec<Reply>) -> (Arc<FakeRunner>, SpeechCapture) {
        let runner = Arc::new(FakeRunner::new(replies));
        let speech = SpeechCapture::new(runner.clone(), DEFAULT_SPEECH_PROGRAM);
        (runner, speech)
    }

    #[test]
    fn test_heard_text_is_normalized() {
        let (runner, speech) = speech(vec![Reply::ok("  Oopar \n")]);
        let mut prompt = ScriptedPrompt::default();
        assert_eq!(speech.listen_once(&mut prompt).as_deref(), Some("oopar"));
        assert!(prompt.asked.is_empty());
        let (program, args, timeout) = &runner.calls()[0];
        assert_eq!(program, DEFAULT_SPEECH_PROGRAM);
        assert!(args.is_empty());
        assert_eq!(*timeout, Some(SINGLE_SHOT_TIMEOUT));
    }

    #[test]
    fn test_nonzero_exit_falls_back_to_menu() {
        let (_, speech) = speech(vec![Reply::exit(1, "no mic")]);
        let mut prompt = ScriptedPrompt::new(["4"]);
        assert_eq!(speech.listen_once(&mut prompt).as_deref(), Some("right"));
        assert_eq!(prompt.asked, vec!["Enter option: "]);
    }

    #[test]
    fn test_empty_output_falls_back_to_menu() {
        let (_, speech) = speech(vec![Reply::ok("   \n")]);
        let mut prompt = ScriptedPrompt::new(["0"]);
        assert_eq!(speech.listen_once(&mut prompt).as_deref(), Some("menu"));
    }

    #[test]
    fn test_timeout_and_spawn_failure_fall_back() {
        let (_, speech) = speech(vec![Reply::Timeout, Reply::SpawnFailure]);
        let mut prompt = ScriptedPrompt::new(["e", "8"]);
        assert_eq!(speech.listen_once(&mut prompt).as_deref(), Some("exit"));
        assert_eq!(speech.listen_once(&mut prompt).as_deref(), Some("back"));
    }

    #[test]
    fn test_invalid_menu_choice_yields_nothing() {
        let (_, speech) = speech(vec![Reply::exit(2, "")]);
        let mut prompt = ScriptedPrompt::new(["z"]);
        assert_eq!(speech.listen_once(&mut prompt), None);
    }

    #[test]
    fn test_closed_input_in_menu_means_exit() {
        let mut prompt = ScriptedPrompt::default();
        assert_eq!(fallback_menu(&mut prompt).as_deref(), Some("exit"));
    }

    #[test]
    fn test_unreadable_menu_input_retries_instead_of_exiting() {
        let mut prompt = FailingPrompt::default();
        assert_eq!(fallback_menu(&mut prompt), None);
        assert_eq!(prompt.attempts, 1);
    }

    #[test]
    fn test_continuous_capture_never_prompts() {
        let (runner, mut speech) = speech(vec![
            Reply::ok("Up"),
            Reply::exit(1, ""),
            Reply::Timeout,
            Reply::SpawnFailure,
        ]);
        let cancel = CancelToken::new();
        assert_eq!(speech.next(&cancel), Listen::Phrase("up".to_string()));
        assert_eq!(speech.next(&cancel), Listen::Nothing);
        assert_eq!(speech.next(&cancel), Listen::Nothing);
        assert!(matches!(speech.next(&cancel), Listen::Error(_)));
        assert!(runner.calls().iter().all(|(_, _, t)| *t == Some(CONTINUOUS_TIMEOUT)));
    }
}
