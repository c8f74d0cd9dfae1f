use std::io::{self, BufRead, Write};

/// Interactive questions asked during batch operations.
pub trait Prompt {
    fn confirm(&self, question: &str) -> io::Result<bool>;

    /// Reads a password without echoing it.
    fn password(&self) -> io::Result<String>;
}

pub struct Terminal;

impl Prompt for Terminal {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        print!("{} [y/N]: ", question);
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }

    fn password(&self) -> io::Result<String> {
        rpassword::prompt_password("Password: ")
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
