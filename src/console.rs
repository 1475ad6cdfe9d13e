//! Interactive console input
//!
//! Prompts go through the `Prompt` trait so setup and the fallback menu can be
//! driven by scripted input in tests.

use std::io::{self, BufRead, Write};

pub trait Prompt: Send {
    /// Show `message` and read one line without its newline.
    /// Returns `None` once input is closed.
    fn read_line(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// Reads answers from stdin
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn read_line(&mut self, message: &str) -> io::Result<Option<String>> {
        print!("{}", message);
        io::stdout().flush()?;
        read_answer(&mut io::stdin().lock())
    }
}

fn read_answer(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Yes/no question; anything but "y" is a no, including closed input
pub fn confirm(prompt: &mut dyn Prompt, message: &str) -> io::Result<bool> {
    Ok(prompt
        .read_line(message)?
        .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y")))
}


#[cfg(test)]
mod tests {
    use super::scripted::ScriptedPrompt;
    use super::*;

    #[test]
    fn test_read_answer_strips_line_ending() {
        let mut input = io::Cursor::new("192.168.1.50\r\nnext\n");
        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some("192.168.1.50"));
        assert_eq!(read_answer(&mut input).unwrap().as_deref(), Some("next"));
        assert_eq!(read_answer(&mut input).unwrap(), None);
    }

    #[test]
    fn test_confirm() {
        let mut prompt = ScriptedPrompt::new(["Y", "n", " y ", "yes"]);
        assert!(confirm(&mut prompt, "? ").unwrap());
        assert!(!confirm(&mut prompt, "? ").unwrap());
        assert!(confirm(&mut prompt, "? ").unwrap());
        assert!(!confirm(&mut prompt, "? ").unwrap());
        // closed input
        assert!(!confirm(&mut prompt, "? ").unwrap());
    }
}
