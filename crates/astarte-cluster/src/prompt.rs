use std::io::{self, Write};

/// Blocking yes/no question, answered by the operator of the CLI.
pub trait ConfirmPrompt {
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Prompt on stdout, answer from stdin. Anything but an explicit yes
/// declines.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl ConfirmPrompt for StdinPrompt {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        print!("{question} [y/N] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
