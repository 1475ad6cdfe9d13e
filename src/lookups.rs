//! Lookup tables for the Fire TV remote
//!
//! This module contains the "data" parts of the remote:
//! - Canonical command -> Android key-event code
//! - Spoken alias -> canonical command (English, Hindi, Spanish, French)
//! - Fallback number menu
//! - Special control phrases (exit, help, continuous mode)

/// Canonical commands and the key-event code each one sends, in help order
pub const COMMANDS: &[(&str, &str)] = &[
    ("up", "KEYCODE_DPAD_UP"),
    ("down", "KEYCODE_DPAD_DOWN"),
    ("left", "KEYCODE_DPAD_LEFT"),
    ("right", "KEYCODE_DPAD_RIGHT"),
    ("select", "KEYCODE_ENTER"),
    ("play", "KEYCODE_MEDIA_PLAY"),
    ("pause", "KEYCODE_MEDIA_PAUSE"),
    ("play pause", "KEYCODE_MEDIA_PLAY_PAUSE"),
    ("back", "KEYCODE_BACK"),
    ("home", "KEYCODE_HOME"),
    ("menu", "KEYCODE_MENU"),
];

/// Spoken aliases, including common speech-to-text mishearings
pub const ALIASES: &[(&str, &str)] = &[
    // English mishearings and synonyms
    ("cup", "up"),
    ("app", "up"),
    ("hop", "up"),
    ("top", "up"),
    ("dumb", "down"),
    ("town", "down"),
    ("don", "down"),
    ("crown", "down"),
    ("brown", "down"),
    ("laugh", "left"),
    ("lift", "left"),
    ("write", "right"),
    ("bright", "right"),
    ("light", "right"),
    ("ok", "select"),
    ("okay", "select"),
    ("enter", "select"),
    ("click", "select"),
    ("plate", "play"),
    ("stop", "pause"),
    ("boss", "pause"),
    ("return", "back"),
    ("go back", "back"),
    ("start", "home"),
    ("options", "menu"),
    ("forward", "up"),
    ("backward", "down"),
    // Hindi
    ("oopar", "up"),
    ("upar", "up"),
    ("ooper", "up"),
    ("aage", "up"),
    ("neeche", "down"),
    ("neche", "down"),
    ("niche", "down"),
    // Historically listed twice (back, then down); the later entry always won.
    ("peeche", "down"),
    ("bayen", "left"),
    ("baye", "left"),
    ("dayen", "right"),
    ("daye", "right"),
    ("daine", "right"),
    ("dahiney", "right"),
    ("select karo", "select"),
    ("ok karo", "select"),
    ("chalaao", "play"),
    ("chalao", "play"),
    ("play karo", "play"),
    ("roko", "pause"),
    ("rukjaao", "pause"),
    ("pause karo", "pause"),
    ("wapas", "back"),
    ("home jaao", "home"),
    ("menu dikhaao", "menu"),
    ("menu dikhao", "menu"),
    // Spanish
    ("arriba", "up"),
    ("abajo", "down"),
    ("izquierda", "left"),
    ("derecha", "right"),
    // French
    ("gauche", "left"),
    ("droite", "right"),
];

/// Quits the program from the single-shot loop
pub const EXIT_PHRASE: &str = "exit";

/// Prints the command reference
pub const HELP_PHRASE: &str = "help";

/// Phrases that switch into continuous listening
pub const CONTINUOUS_START_PHRASES: &[&str] = &[
    "continuous",
    "continuous mode",
    "listen continuously",
    "keep listening",
];

/// Phrases that end continuous listening
pub const CONTINUOUS_STOP_PHRASES: &[&str] =
    &["stop listening", "exit continuous", "stop continuous"];

/// Legend printed above the fallback number menu
pub const MENU_LEGEND: &[&str] = &[
    "1: UP    2: DOWN    3: LEFT    4: RIGHT",
    "5: SELECT    6: PLAY    7: PAUSE    8: BACK",
    "9: HOME    0: MENU    E: EXIT",
];

/// Map a fallback menu selection to the phrase it stands for
pub fn menu_choice(choice: &str) -> Option<&'static str> {
    match choice.trim().to_lowercase().as_str() {
        "1" => Some("up"),
        "2" => Some("down"),
        "3" => Some("left"),
        "4" => Some("right"),
        "5" => Some("select"),
        "6" => Some("play"),
        "7" => Some("pause"),
        "8" => Some("back"),
        "9" => Some("home"),
        "0" => Some("menu"),
        "e" => Some(EXIT_PHRASE),
        _ => None,
    }
}

pub fn is_continuous_start(phrase: &str) -> bool {
    CONTINUOUS_START_PHRASES.contains(&phrase)
}

pub fn is_continuous_stop(phrase: &str) -> bool {
    CONTINUOUS_STOP_PHRASES.contains(&phrase)
}
