//! Console prompts

use glcaps_core::ContextConfiguration;
use glcaps_render::ConfirmFallback;
use std::io::{self, BufRead, Write};

/// Asks on a text console whether a fallback context is acceptable.
///
/// Anything but an explicit yes declines, including EOF and read errors.
pub struct ConsoleConfirm<R, W> {
    input: R,
    output: W,
}

impl ConsoleConfirm<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsoleConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask a yes/no question; only `y` or `yes` accepts
    pub fn ask(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{question} [y/N] ")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

impl<R: BufRead, W: Write> ConfirmFallback for ConsoleConfirm<R, W> {
    fn confirm(&mut self, preferred: &ContextConfiguration, fallback: &ContextConfiguration) -> bool {
        let question = format!(
            "{} is not available. Continue with {}?",
            preferred.label(),
            fallback.label()
        );
        self.ask(&question).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read answer, declining fallback");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glcaps_core::{Api, Profile};

    fn answer(input: &str) -> (bool, String) {
        let preferred = ContextConfiguration::new(Api::Gl, 4, 6, Profile::ForwardCompatible);
        let fallback = ContextConfiguration::new(Api::GlEs, 3, 0, Profile::Core);
        let mut output = Vec::new();
        let accepted = ConsoleConfirm::new(input.as_bytes(), &mut output).confirm(&preferred, &fallback);
        (accepted, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_yes_accepts() {
        let (accepted, prompt) = answer("yes\n");
        assert!(accepted);
        assert!(prompt.contains("GL 4.6 forward-compatible"));
        assert!(prompt.contains("GLES 3.0 core"));
        assert!(answer(" Y \n").0);
    }

    #[test]
    fn test_plain_question() {
        let mut output = Vec::new();
        let mut console = ConsoleConfirm::new("y\n".as_bytes(), &mut output);
        assert!(console.ask("Continue without a reference database?").unwrap());
        drop(console);
        assert_eq!(String::from_utf8(output).unwrap(), "Continue without a reference database? [y/N] ");
    }

    #[test]
    fn test_anything_else_declines() {
        assert!(!answer("n\n").0);
        assert!(!answer("\n").0);
        assert!(!answer("").0);
        assert!(!answer("maybe\n").0);
    }
}
