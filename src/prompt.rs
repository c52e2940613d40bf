//! Line-oriented prompts with defaults.
//!
//! In non-interactive mode every prompt resolves to its default without
//! touching the input stream.
use anyhow::{Context, Result};
use std::fmt::Display;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::str::FromStr;

pub struct Prompter<R, W> {
    input: R,
    output: W,
    interactive: bool,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio(interactive: bool) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), interactive)
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, interactive: bool) -> Self {
        Self {
            input,
            output,
            interactive,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Print `prompt` and read one trimmed line; EOF reads as empty.
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}").context("write prompt")?;
        self.output.flush().context("flush prompt")?;
        let mut line = String::new();
        self.input.read_line(&mut line).context("read answer")?;
        Ok(line.trim().to_string())
    }

    pub fn ask(&mut self, label: &str, default: &str) -> Result<String> {
        if !self.interactive {
            return Ok(default.to_string());
        }
        let answer = self.read_line(&format!("{label} (default: {default}): "))?;
        if answer.is_empty() {
            return Ok(default.to_string());
        }
        Ok(answer)
    }

    /// Like [`Prompter::ask`], falling back to the default on unparsable input.
    pub fn ask_number<T>(&mut self, label: &str, default: T) -> Result<T>
    where
        T: FromStr + Display + Copy,
    {
        let answer = self.ask(label, &default.to_string())?;
        match answer.parse() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::debug!(label, answer = %answer, "unparsable number; using default");
                Ok(default)
            }
        }
    }

    pub fn ask_yes_no(&mut self, label: &str, default: bool) -> Result<bool> {
        if !self.interactive {
            return Ok(default);
        }
        let hint = if default { "y" } else { "n" };
        let answer = self.read_line(&format!("{label} (y/n, default: {hint}): "))?;
        Ok(parse_yes_no(&answer).unwrap_or(default))
    }

    /// Ask for explicit consent; anything but yes declines.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        if !self.interactive {
            return Ok(true);
        }
        let answer = self.read_line(&format!("{question} [y/N]: "))?;
        Ok(parse_yes_no(&answer).unwrap_or(false))
    }
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scripted(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), true)
    }

    #[test]
    fn empty_answer_and_eof_use_default() {
        let mut prompter = scripted("\n");
        assert_eq!(prompter.ask("Network", "default").expect("ask"), "default");
        assert_eq!(prompter.ask("Subnet", "").expect("ask at eof"), "");
        let transcript = String::from_utf8(prompter.output.clone()).expect("utf8");
        assert_eq!(transcript, "Network (default: default): Subnet (default: ): ");
    }

    #[test]
    fn answers_are_trimmed() {
        let mut prompter = scripted("  my-lb  \n");
        assert_eq!(prompter.ask("Load Balancer Name", "gcloud-lb").expect("ask"), "my-lb");
    }

    #[test]
    fn non_interactive_never_reads() {
        let mut prompter = Prompter::new(Cursor::new(b"ignored\n".to_vec()), Vec::new(), false);
        assert_eq!(prompter.ask("Project Name", "my-project").expect("ask"), "my-project");
        assert_eq!(prompter.ask_number("Port", 8080u16).expect("number"), 8080);
        assert!(!prompter.ask_yes_no("Use SSL/TLS?", false).expect("yes/no"));
        assert!(prompter.confirm("Proceed?").expect("confirm"));
        assert!(prompter.output.is_empty());
        assert!(!prompter.is_interactive());
    }

    #[test]
    fn numbers_fall_back_on_garbage() {
        let mut prompter = scripted("9090\nabc\n");
        assert_eq!(prompter.ask_number("Port", 8080u16).expect("number"), 9090);
        assert_eq!(prompter.ask_number("Port", 8080u16).expect("number"), 8080);
    }

    #[test]
    fn yes_no_accepts_words_and_defaults() {
        let mut prompter = scripted("YES\nn\n\nmaybe\n");
        assert!(prompter.ask_yes_no("Use SSL/TLS?", false).expect("yes"));
        assert!(!prompter.ask_yes_no("Use SSL/TLS?", true).expect("no"));
        assert!(prompter.ask_yes_no("Use SSL/TLS?", true).expect("default"));
        assert!(!prompter.ask_yes_no("Use SSL/TLS?", false).expect("unknown"));
    }

    #[test]
    fn confirm_defaults_to_no() {
        let mut prompter = scripted("\ny\n");
        assert!(!prompter.confirm("Proceed with project creation?").expect("empty"));
        assert!(prompter.confirm("Proceed with project creation?").expect("yes"));
    }
}
