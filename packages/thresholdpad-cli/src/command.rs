//! Parsing of the lines typed at the prompt.

use thresholdpad_core::{Field, Panel};

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `set <panel>.<field> <value>`
    Set {
        panel: Panel,
        field: Field,
        value: String,
    },
    /// `generate`
    Generate,
    /// `show`
    Show,
    /// `help`
    Help,
    /// `quit` or `exit`
    Quit,
}

pub const HELP: &str = "\
commands:
  set <panel>.<field> <value>   edit a field; the panel runs once you pause
  generate                      generate a key pair on the keys panel
  show                          print every field
  help                          print this text
  quit                          leave

panels and their input fields:
  keys      secret-key
  sign      secret-key message
  verify    public-key signature message
  encrypt   public-key message
  decrypt   secret-key ciphertext

Everything after the single space following <panel>.<field> is the value,
so messages keep their spaces. Hex values may have surrounding whitespace.";

/// Parse one line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim_end_matches(['\n', '\r']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (word, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    let command = match word.to_ascii_lowercase().as_str() {
        "set" => parse_set(rest)?,
        "generate" | "gen" => Command::Generate,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(command))
}

fn parse_set(rest: &str) -> Result<Command, String> {
    let rest = rest.trim_start_matches(' ');
    let (target, value) = rest.split_once(' ').unwrap_or((rest, ""));
    let (panel, field) = target
        .split_once('.')
        .ok_or_else(|| format!("expected <panel>.<field>, got '{target}'"))?;
    Ok(Command::Set {
        panel: panel.parse()?,
        field: field.parse()?,
        value: value.to_string(),
    })
}
