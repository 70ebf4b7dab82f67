//! Pure token classification, shared by the parser and the completion engine
//! so the two cannot disagree about what a token is.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// `--` alone: everything after is positional.
    DashDash,
    /// `--name` or `--name=value`.
    Long { name: &'a str, inline: Option<&'a str> },
    /// `-abc` or `-abc=value`: a cluster of short characters.
    Shorts { chars: Vec<char>, inline: Option<&'a str> },
    /// Anything else, including `-`, and negative numbers when no registered
    /// short is a digit.
    Value(&'a str),
}

fn split_eq(s: &str) -> (&str, Option<&str>) {
    match s.find('=') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    }
}

impl<'a> Token<'a> {
    /// `digit_shorts` is true when the active command registered a digit short
    /// character; it disables the negative-number reclassification.
    pub(crate) fn parse(raw: &'a str, digit_shorts: bool) -> Token<'a> {
        if raw == "--" {
            return Token::DashDash;
        }
        if let Some(rest) = raw.strip_prefix("--") {
            if !rest.is_empty() {
                let (name, inline) = split_eq(rest);
                return Token::Long { name, inline };
            }
        }
        if let Some(rest) = raw.strip_prefix('-') {
            if rest.is_empty() {
                return Token::Value(raw);
            }
            if !raw.starts_with("--") {
                // A leading digit or dot makes the token a value, not a
                // cluster; whether it is a well-formed number is the value
                // parser's problem.
                let numeric_start =
                    rest.starts_with(|c: char| c.is_ascii_digit() || c == '.');
                if !digit_shorts && numeric_start {
                    return Token::Value(raw);
                }
                let (cluster, inline) = split_eq(rest);
                return Token::Shorts { chars: cluster.chars().collect(), inline };
            }
        }
        Token::Value(raw)
    }
}
