//! Operator confirmation on the terminal.

use clqc_recon::Confirm;
use std::io::{BufRead, Write};

/// Answers the engine's confirmation prompts.
///
/// `Prompt` asks on stderr and reads the answer from its input; anything
/// but an explicit yes, including end of input, declines. `AssumeYes`
/// confirms everything (`--yes`).
pub enum Confirmer<R: BufRead> {
    AssumeYes,
    Prompt(R),
}

impl<R: BufRead> Confirmer<R> {
    pub fn new(input: R, assume_yes: bool) -> Self {
        if assume_yes {
            Confirmer::AssumeYes
        } else {
            Confirmer::Prompt(input)
        }
    }
}

impl<R: BufRead> Confirm for Confirmer<R> {
    fn confirm(&mut self, prompt: &str) -> bool {
        match self {
            Confirmer::AssumeYes => {
                log::info!("assumed yes: {}", prompt.replace('\n', " "));
                true
            }
            Confirmer::Prompt(input) => {
                eprint!("{} [y/N] ", prompt);
                let _ = std::io::stderr().flush();
                let mut line = String::new();
                match input.read_line(&mut line) {
                    Ok(_) => is_yes(&line),
                    Err(e) => {
                        log::warn!("could not read answer: {}", e);
                        false
                    }
                }
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers() {
        let mut confirm = Confirmer::new("y\nno\n\nYES\n".as_bytes(), false);
        assert!(confirm.confirm("first?"));
        assert!(!confirm.confirm("second?"));
        assert!(!confirm.confirm("third?"));
        assert!(confirm.confirm("fourth?"));
        // end of input declines
        assert!(!confirm.confirm("fifth?"));
    }

    #[test]
    fn test_assume_yes_ignores_input() {
        let mut confirm = Confirmer::new("n\n".as_bytes(), true);
        assert!(confirm.confirm("anything?"));
        assert!(confirm.confirm("again?"));
    }
}
