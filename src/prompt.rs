use std::io::{self, BufRead, StdinLock, Stdout, Write};

use console::style;

use crate::errors::ChatResult;

pub const PROMPT: &str = "> ";
pub const EXIT_COMMAND: &str = "exit()";

pub trait Prompt {
    /// Show the prompt marker and read the next line from the user.
    fn get_input(&mut self) -> ChatResult<Input>;
    /// Echo input that was supplied up front instead of typed.
    fn preset_input(&mut self, text: String) -> ChatResult<Input>;
    /// Write streamed text as-is, without a line break.
    fn render(&mut self, text: &str) -> ChatResult<()>;
    fn render_line(&mut self, text: &str) -> ChatResult<()> {
        self.render(text)?;
        self.render("\n")
    }
    fn show_exit_hint(&mut self) -> ChatResult<()> {
        self.render_line(&format!(
            "{}",
            style(format!("In order to exit, type `{}`", EXIT_COMMAND)).dim()
        ))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Absent for control inputs such as Exit
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputType {
    AskAgain, // Nothing to send, prompt again
    Message,  // User sent a message
    Exit,     // User wants to exit the session
}

impl Input {
    /// Classify one line of user text. Only the exact exit command ends the
    /// session; surrounding whitespace makes it an ordinary message.
    pub fn from_line(line: String) -> Self {
        if line == EXIT_COMMAND {
            Self::exit()
        } else if line.is_empty() {
            Self {
                input_type: InputType::AskAgain,
                content: None,
            }
        } else {
            Self {
                input_type: InputType::Message,
                content: Some(line),
            }
        }
    }

    pub fn exit() -> Self {
        Self {
            input_type: InputType::Exit,
            content: None,
        }
    }
}

/// Line-oriented prompt over any reader/writer pair.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn get_input(&mut self) -> ChatResult<Input> {
        self.render(PROMPT)?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            // End of input: leave the terminal on a fresh line and stop
            self.render("\n")?;
            return Ok(Input::exit());
        }

        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Input::from_line(line))
    }

    fn preset_input(&mut self, text: String) -> ChatResult<Input> {
        self.render(PROMPT)?;
        self.render_line(&text)?;
        Ok(Input::from_line(text))
    }

    fn render(&mut self, text: &str) -> ChatResult<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(input: &str) -> TerminalPrompt<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_from_line() {
        assert_eq!(Input::from_line("exit()".to_string()), Input::exit());
        assert_eq!(
            Input::from_line(String::new()).input_type,
            InputType::AskAgain
        );

        let input = Input::from_line(" exit() ".to_string());
        assert_eq!(input.input_type, InputType::Message);
        assert_eq!(input.content.as_deref(), Some(" exit() "));
    }

    #[test]
    fn test_get_input_reads_lines() -> anyhow::Result<()> {
        let mut prompt = prompt("hello\r\n\nexit()\n");

        let input = prompt.get_input()?;
        assert_eq!(input.input_type, InputType::Message);
        assert_eq!(input.content.as_deref(), Some("hello"));

        assert_eq!(prompt.get_input()?.input_type, InputType::AskAgain);
        assert_eq!(prompt.get_input()?.input_type, InputType::Exit);

        assert_eq!(String::from_utf8(prompt.into_output())?, "> > > ");
        Ok(())
    }

    #[test]
    fn test_end_of_input_exits() -> anyhow::Result<()> {
        let mut prompt = prompt("last line without newline");

        let input = prompt.get_input()?;
        assert_eq!(input.content.as_deref(), Some("last line without newline"));

        assert_eq!(prompt.get_input()?, Input::exit());
        assert_eq!(prompt.get_input()?, Input::exit());
        Ok(())
    }

    #[test]
    fn test_preset_input_is_echoed() -> anyhow::Result<()> {
        let mut prompt = prompt("");
        let input = prompt.preset_input("hello".to_string())?;

        assert_eq!(input.content.as_deref(), Some("hello"));
        assert_eq!(String::from_utf8(prompt.into_output())?, "> hello\n");
        Ok(())
    }

    #[test]
    fn test_exit_hint_mentions_command() -> anyhow::Result<()> {
        let mut prompt = prompt("");
        prompt.show_exit_hint()?;

        let output = String::from_utf8(prompt.into_output())?;
        assert!(output.contains("In order to exit, type `exit()`"));
        assert!(output.ends_with('\n'));
        Ok(())
    }
}
