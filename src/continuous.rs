//! Continuous listening: a listener thread feeding a dispatcher thread
//!
//! The listener captures phrases and pushes them onto a bounded queue; the
//! dispatcher pops them in order and sends them to the device. A stop phrase
//! or an external cancel closes the queue. The dispatcher always finishes
//! what is already queued before the session returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};

use crate::lookups::is_continuous_stop;

/// One round of listening
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listen {
    Phrase(String),
    /// Nothing recognized this round
    Nothing,
    /// Capture failed; the listener backs off before trying again
    Error(String),
    /// The source has nothing more to offer
    Exhausted,
}

/// Produces heard phrases for the listener thread
pub trait PhraseSource: Send + 'static {
    fn next(&mut self, cancel: &CancelToken) -> Listen;
}

/// Consumes phrases on the dispatcher thread
pub trait PhraseSink: Send + 'static {
    fn handle(&mut self, phrase: &str);
}

/// Shared stop signal observed by both threads
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep up to `dur`, waking early on cancel. Returns true if cancelled.
    pub fn sleep(&self, dur: Duration) -> bool {
        let deadline = Instant::now() + dur;
        while !self.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(50)));
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub queue_capacity: usize,
    /// Pause between listener iterations and the dispatcher's receive wait
    pub poll_interval: Duration,
    /// Pause after a capture error
    pub error_backoff: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            poll_interval: Duration::from_millis(100),
            error_backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StopPhrase,
    Cancelled,
    SourceExhausted,
    /// The dispatcher went away before the listener finished
    SinkGone,
    ListenerPanicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub reason: StopReason,
    /// Phrases queued by the listener
    pub heard: usize,
    /// Phrases handed to the sink
    pub dispatched: usize,
}

pub struct ContinuousSession {
    settings: SessionSettings,
    cancel: CancelToken,
}

impl ContinuousSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            cancel: CancelToken::new(),
        }
    }

    /// Token that stops the session from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run until a stop phrase, a cancel, or an exhausted source. Blocks until
    /// both threads have finished and every queued phrase was dispatched.
    pub fn run<S: PhraseSource, K: PhraseSink>(self, source: S, sink: K) -> SessionReport {
        let capacity = self.settings.queue_capacity.max(1);
        let (tx, rx) = flume::bounded::<String>(capacity);

        let listener = {
            let cancel = self.cancel.clone();
            let settings = self.settings.clone();
            thread::spawn(move || run_listener(source, tx, cancel, settings))
        };

        let dispatcher = {
            let poll = self.settings.poll_interval;
            thread::spawn(move || run_dispatcher(sink, rx, poll))
        };

        // Listener first: once it returns its sender is dropped, which is the
        // dispatcher's signal to drain and stop.
        let (reason, heard) = listener.join().unwrap_or_else(|_| {
            tracing::error!("Listener thread panicked");
            (StopReason::ListenerPanicked, 0)
        });
        self.cancel.cancel();
        let dispatched = dispatcher.join().unwrap_or_else(|_| {
            tracing::error!("Dispatcher thread panicked");
            0
        });

        tracing::info!(
            "Continuous session ended ({:?}): heard {}, dispatched {}",
            reason,
            heard,
            dispatched
        );
        SessionReport {
            reason,
            heard,
            dispatched,
        }
    }
}

fn run_listener<S: PhraseSource>(
    mut source: S,
    tx: Sender<String>,
    cancel: CancelToken,
    settings: SessionSettings,
) -> (StopReason, usize) {
    tracing::debug!("Listener thread started");
    let mut heard = 0;

    let reason = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }

        match source.next(&cancel) {
            Listen::Phrase(phrase) => {
                if is_continuous_stop(&phrase) {
                    println!("[FireTV] Exiting continuous listening mode...");
                    break StopReason::StopPhrase;
                }
                // Blocks while the queue is full
                if tx.send(phrase).is_err() {
                    break StopReason::SinkGone;
                }
                heard += 1;
            }
            Listen::Nothing => {}
            Listen::Error(e) => {
                tracing::warn!("Capture error, backing off: {}", e);
                if cancel.sleep(settings.error_backoff) {
                    break StopReason::Cancelled;
                }
                continue;
            }
            Listen::Exhausted => break StopReason::SourceExhausted,
        }

        if cancel.sleep(settings.poll_interval) {
            break StopReason::Cancelled;
        }
    };

    tracing::debug!("Listener thread stopping ({:?})", reason);
    (reason, heard)
}

fn run_dispatcher<K: PhraseSink>(mut sink: K, rx: Receiver<String>, poll: Duration) -> usize {
    tracing::debug!("Dispatcher thread started");
    let mut dispatched = 0;

    loop {
        match rx.recv_timeout(poll) {
            Ok(phrase) => {
                sink.handle(&phrase);
                dispatched += 1;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Drain remaining
    for phrase in rx.drain() {
        sink.handle(&phrase);
        dispatched += 1;
    }

    tracing::debug!("Dispatcher thread stopping after {} phrase(s)", dispatched);
    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Script(VecDeque<Listen>);

    impl Script {
        fn new(items: Vec<Listen>) -> Self {
            Self(items.into())
        }
    }

    impl PhraseSource for Script {
        fn next(&mut self, _cancel: &CancelToken) -> Listen {
            self.0.pop_front().unwrap_or(Listen::Exhausted)
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl PhraseSink for Recorder {
        fn handle(&mut self, phrase: &str) {
            self.0.lock().unwrap().push(phrase.to_string());
        }
    }

    fn fast() -> SessionSettings {
        SessionSettings {
            queue_capacity: 4,
            poll_interval: Duration::from_millis(1),
            error_backoff: Duration::from_millis(5),
        }
    }

    fn phrase(s: &str) -> Listen {
        Listen::Phrase(s.to_string())
    }

    #[test]
    fn test_stop_phrase_ends_session_after_draining() {
        let sink = Recorder::default();
        let script = Script::new(vec![
            phrase("up"),
            Listen::Nothing,
            phrase("down"),
            phrase("stop listening"),
            phrase("left"),
        ]);
        let report = ContinuousSession::new(fast()).run(script, sink.clone());
        assert_eq!(report.reason, StopReason::StopPhrase);
        assert_eq!(report.heard, 2);
        assert_eq!(report.dispatched, 2);
        assert_eq!(*sink.0.lock().unwrap(), vec!["up", "down"]);
    }

    #[test]
    fn test_errors_back_off_and_continue() {
        let sink = Recorder::default();
        let script = Script::new(vec![
            Listen::Error("mic busy".to_string()),
            phrase("select"),
        ]);
        let report = ContinuousSession::new(fast()).run(script, sink.clone());
        assert_eq!(report.reason, StopReason::SourceExhausted);
        assert_eq!(*sink.0.lock().unwrap(), vec!["select"]);
    }

    struct Endless;

    impl PhraseSource for Endless {
        fn next(&mut self, cancel: &CancelToken) -> Listen {
            cancel.sleep(Duration::from_millis(5));
            Listen::Nothing
        }
    }

    #[test]
    fn test_external_cancel_stops_session() {
        let session = ContinuousSession::new(fast());
        let cancel = session.cancel_token();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            cancel.cancel();
        });
        let report = session.run(Endless, Recorder::default());
        stopper.join().unwrap();
        assert_eq!(report.reason, StopReason::Cancelled);
        assert_eq!(report.dispatched, 0);
    }

    #[test]
    fn test_cancel_sleep_wakes_early() {
        let token = CancelToken::new();
        assert!(!token.sleep(Duration::from_millis(1)));
        token.cancel();
        let started = Instant::now();
        assert!(token.sleep(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
