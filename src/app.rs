//! Interactive loop: setup, help, then listen -> dispatch until "exit"

use anyhow::Result;
use std::io;
use std::sync::Arc;

use crate::bridge::DeviceBridge;
use crate::commands::{Resolver, normalize};
use crate::config::{Config, ConfigStore};
use crate::console::{Prompt, confirm};
use crate::continuous::{ContinuousSession, SessionReport, SessionSettings};
use crate::dispatch::Dispatcher;
use crate::lookups::{
    CONTINUOUS_START_PHRASES, CONTINUOUS_STOP_PHRASES, EXIT_PHRASE, HELP_PHRASE,
    is_continuous_start,
};
use crate::process::ProcessRunner;
use crate::speech::SpeechCapture;

/// Startup choices that do not live in the config file
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub bridge_program: String,
    pub speech_program: String,
    /// Use this address instead of asking
    pub address: Option<String>,
    /// Force continuous mode off regardless of the config file
    pub disable_continuous: bool,
    pub session: SessionSettings,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            bridge_program: crate::bridge::DEFAULT_BRIDGE_PROGRAM.to_string(),
            speech_program: crate::speech::DEFAULT_SPEECH_PROGRAM.to_string(),
            address: None,
            disable_continuous: false,
            session: SessionSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct App {
    store: ConfigStore,
    config: Config,
    options: AppOptions,
    dispatcher: Dispatcher,
    speech: SpeechCapture,
    prompt: Box<dyn Prompt>,
}

impl App {
    pub fn new(
        store: ConfigStore,
        runner: Arc<dyn ProcessRunner>,
        prompt: Box<dyn Prompt>,
        options: AppOptions,
    ) -> Result<Self> {
        let config = store.load();

        let resolver = match Resolver::builtin_with(&config.aliases) {
            Ok(resolver) => resolver,
            Err(e) => {
                tracing::warn!("Ignoring aliases from {:?}: {}", store.path(), e);
                println!("[FireTV] ⚠️ Ignoring custom aliases: {}", e);
                Resolver::builtin_with(&Default::default())?
            }
        };

        let bridge = DeviceBridge::new(runner.clone(), options.bridge_program.clone());
        let mut dispatcher = Dispatcher::new(resolver, bridge);
        dispatcher.set_device(config.device_ip.clone());
        let speech = SpeechCapture::new(runner, options.speech_program.clone());

        Ok(Self {
            store,
            config,
            options,
            dispatcher,
            speech,
            prompt,
        })
    }

    pub fn continuous_enabled(&self) -> bool {
        self.config.continuous_mode && !self.options.disable_continuous
    }

    pub fn device(&self) -> Option<&str> {
        self.dispatcher.device()
    }

    pub fn run(&mut self) -> Result<()> {
        println!();
        println!("==== Fire TV Voice Control ====");
        println!("This program lets you control your Fire TV Stick with voice commands.");
        println!("Works with English, Hindi, and some other languages.");

        match self.options.address.clone() {
            Some(address) => self.setup_with(&address),
            None => self.setup(),
        }

        self.show_help();

        loop {
            self.print_listen_hint();
            let Some(phrase) = self.speech.listen_once(self.prompt.as_mut()) else {
                continue;
            };
            if self.handle(&phrase) == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Ask for (or confirm) the device address and connect to it. Unreadable
    /// input ends setup like closed input does.
    pub fn setup(&mut self) {
        println!();
        println!("==== Fire TV Voice Control Setup ====");

        if let Err(e) = self.setup_interactive() {
            tracing::warn!("Setup input failed: {}", e);
            println!("[FireTV] ⚠️ Could not read input: {}", e);
            if self.device().is_none() {
                println!("[FireTV] Device not configured.");
            }
        }
    }

    fn setup_interactive(&mut self) -> io::Result<()> {
        loop {
            let address = match self.config.device_ip.clone() {
                Some(saved) => {
                    println!("Found saved Fire TV IP: {}", saved);
                    if confirm(self.prompt.as_mut(), "Change IP? (y/n): ")? {
                        match self.ask_address()? {
                            Some(address) => address,
                            None => return Ok(()),
                        }
                    } else {
                        saved
                    }
                }
                None => match self.ask_address()? {
                    Some(address) => address,
                    None => {
                        println!("[FireTV] No address entered. Device not configured.");
                        return Ok(());
                    }
                },
            };

            self.remember(&address);
            if self.connect(&address) {
                return Ok(());
            }
            if !confirm(self.prompt.as_mut(), "Retry? (y/n): ")? {
                return Ok(());
            }
        }
    }

    /// Non-interactive setup for an address given on the command line
    pub fn setup_with(&mut self, address: &str) {
        println!();
        println!("==== Fire TV Voice Control Setup ====");
        self.remember(address);
        self.connect(address);
    }

    fn ask_address(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.prompt.read_line("Enter your Fire TV Stick's IP address: ")? {
                Some(answer) if !answer.trim().is_empty() => {
                    return Ok(Some(answer.trim().to_string()));
                }
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }

    fn remember(&mut self, address: &str) {
        if self.config.device_ip.as_deref() != Some(address) {
            match self.store.save_address(address) {
                Ok(config) => self.config = config,
                Err(e) => {
                    tracing::warn!("Failed to save config: {:#}", e);
                    println!("[FireTV] ⚠️ Could not save the address: {:#}", e);
                    self.config.device_ip = Some(address.to_string());
                }
            }
        }
        self.dispatcher.set_device(Some(address.to_string()));
    }

    fn connect(&self, address: &str) -> bool {
        println!("Connecting to Fire TV at {}...", address);
        let output = match self.dispatcher.bridge().connect(address) {
            Ok(outcome) if outcome.connected => {
                println!("[FireTV] ✅ Successfully connected to Fire TV!");
                return true;
            }
            Ok(outcome) => outcome.output,
            Err(e) => e.to_string(),
        };

        println!("[FireTV] ❌ Failed to connect. Please check:");
        println!("1. Fire TV and phone are on the same network");
        println!("2. ADB debugging is enabled on your Fire TV");
        println!("3. IP address is correct");
        println!();
        println!("Error: {}", output.trim());
        false
    }

    fn handle(&mut self, phrase: &str) -> Flow {
        let phrase = normalize(phrase);
        if phrase == EXIT_PHRASE {
            println!("Exiting program.");
            return Flow::Exit;
        }
        if phrase == HELP_PHRASE {
            self.show_help();
            return Flow::Continue;
        }
        if self.continuous_enabled() && is_continuous_start(&phrase) {
            self.run_continuous();
            return Flow::Continue;
        }
        self.dispatcher.dispatch(&phrase);
        Flow::Continue
    }

    /// Listen and dispatch on two threads until a stop phrase is heard
    pub fn run_continuous(&mut self) -> SessionReport {
        println!();
        println!("==== Starting Continuous Listening Mode ====");
        println!("I'll keep listening and executing commands until you say 'stop listening'");
        println!("Speak clearly, one command at a time");
        println!(
            "[FireTV] 👂 Listening continuously... (say '{}' or '{}' to stop)",
            CONTINUOUS_STOP_PHRASES[0], CONTINUOUS_STOP_PHRASES[1]
        );

        let session = ContinuousSession::new(self.options.session.clone());
        let report = session.run(self.speech.clone(), self.dispatcher.clone());

        println!("Exited continuous listening mode");
        report
    }

    fn print_listen_hint(&self) {
        println!();
        if self.continuous_enabled() {
            println!(
                "[FireTV] 🎙️ Listening for command... \
                 (say 'exit' to quit, '{}' to enter continuous mode)",
                CONTINUOUS_START_PHRASES[0]
            );
        } else {
            println!("[FireTV] 🎙️ Listening for command... (say 'exit' to quit)");
        }
    }

    pub fn show_help(&self) {
        let resolver = self.dispatcher.resolver();
        println!();
        println!("==== Available Voice Commands ====");
        for name in resolver.commands().names() {
            println!("• {}", name);
        }
        println!();
        println!("==== Command Aliases ====");
        for (alias, target) in resolver.aliases().iter() {
            println!("• {} → {}", alias, target);
        }
        println!();
        println!("• exit (quits the program)");
        println!("• help (shows this menu)");
        if self.continuous_enabled() {
            println!("• continuous (enters continuous listening mode)");
            println!("• stop listening (exits continuous mode)");
        }
    }
}
