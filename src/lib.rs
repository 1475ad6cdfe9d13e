//! Voice remote for the Fire TV Stick
//!
//! Spoken phrases come from an external speech-to-text utility, are resolved
//! through the alias and command tables, and go to the device as key events
//! over adb.

pub mod app;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod console;
pub mod continuous;
pub mod dispatch;
pub mod lookups;
pub mod process;
pub mod speech;

pub use app::{App, AppOptions};
pub use bridge::{BridgePolicy, ConnectOutcome, DeviceBridge};
pub use commands::{AliasTable, CommandTable, Resolution, Resolver, TableError};
pub use config::{Config, ConfigStore};
pub use continuous::{
    CancelToken, ContinuousSession, Listen, PhraseSink, PhraseSource, SessionReport,
    SessionSettings,
};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use process::{ProcessError, ProcessOutput, ProcessRunner, SystemRunner};
pub use speech::SpeechCapture;
