//! `@ha <action> <target>` command recognition.

use serde::Serialize;

/// Marker a chat message must start with to be treated as a command.
pub const TRIGGER_MARKER: &str = "@ha";

/// Payload posted to the Home Assistant webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub action: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Text does not start with the trigger shape.
    NoMatch,
    /// Trigger shape matched but tokenizing produced fewer than three tokens.
    TooFewTokens(usize),
    Command(Command),
}

/// Classify chat text as a command or not.
///
/// The text must begin with the marker, then whitespace, a word, whitespace
/// and a word, where a word is a run of letters, digits or `_`. Anything
/// after the second word is allowed and ignored.
pub fn parse_command(text: &str) -> ParseOutcome {
    if !matches_trigger(text) {
        return ParseOutcome::NoMatch;
    }
    tokenize(text)
}

fn tokenize(text: &str) -> ParseOutcome {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [_, action, target, ..] => ParseOutcome::Command(Command {
            action: (*action).to_string(),
            target: (*target).to_string(),
        }),
        _ => ParseOutcome::TooFewTokens(tokens.len()),
    }
}

fn matches_trigger(text: &str) -> bool {
    let Some(rest) = text.strip_prefix(TRIGGER_MARKER) else {
        return false;
    };
    let Some(rest) = skip_separator_then_word(rest) else {
        return false;
    };
    skip_separator_then_word(rest).is_some()
}

// Exactly one whitespace character, then one or more word characters.
fn skip_separator_then_word(input: &str) -> Option<&str> {
    let mut chars = input.chars();
    if !chars.next().is_some_and(|ch| ch.is_ascii_whitespace()) {
        return None;
    }
    let rest = chars.as_str();
    let word_len: usize = rest
        .chars()
        .take_while(|ch| is_word_char(*ch))
        .map(char::len_utf8)
        .sum();
    if word_len == 0 {
        return None;
    }
    Some(&rest[word_len..])
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
