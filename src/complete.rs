//! Shell completion inference: re-derives the parser's decisions for a
//! partial command line without mutating parse state.

use std::collections::HashSet;
use std::ops::BitOr;

use crate::{cmd::Cmd, token::Token};

/// Bitmask telling the shell how to interpret completion results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive(u8);

impl Directive {
    /// Normal behavior with file completion fallback.
    pub const DEFAULT: Directive = Directive(0);
    /// An error occurred; results should be ignored.
    pub const ERROR: Directive = Directive(1);
    /// Do not add a trailing space after the completion.
    pub const NO_SPACE: Directive = Directive(2);
    /// Do not fall back to file completion.
    pub const NO_FILE_COMP: Directive = Directive(4);

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl Default for Directive {
    fn default() -> Directive {
        Directive::DEFAULT
    }
}

impl BitOr for Directive {
    type Output = Directive;
    fn bitor(self, rhs: Directive) -> Directive {
        Directive(self.0 | rhs.0)
    }
}

impl Cmd {
    /// Computes completion candidates for a partial command line. The last
    /// element is the word being completed, possibly empty. Read-only with
    /// respect to parse state; usually reached through the `__complete`
    /// protocol rather than called directly.
    pub fn complete<I, S>(&mut self, args: I) -> (Vec<String>, Directive)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        compute(self, &args)
    }
}

/// Computes candidates for a `__complete` invocation. The last element of
/// `args` is the word being completed, possibly empty.
pub(crate) fn compute(cmd: &mut Cmd, args: &[String]) -> (Vec<String>, Directive) {
    // Walk the subcommand tree, skipping flags and their consumed values.
    // The scan index runs ahead, but `consumed` only advances on subcommand
    // descent or `--`, so flag tokens that do not lead to a subcommand stay
    // in `remaining` for the preceding-args scan.
    let mut active: &mut Cmd = cmd;
    let mut used: HashSet<String> = HashSet::new();
    let mut saw_dash_dash = false;
    let mut consumed = 0;

    let mut i = 0;
    while i < args.len().saturating_sub(1) {
        let arg = args[i].as_str();

        if arg == "--" {
            saw_dash_dash = true;
            consumed = i + 1;
            break;
        }

        if arg.starts_with('-') {
            scan_flag_token(active, arg, &mut used);
            i += flag_consumed_args(active, arg);
            continue;
        }

        if active.sub_cmds.contains_key(arg) {
            let mut sub = active.sub_cmds.remove(arg).unwrap();
            active.adopt_globals(&mut sub);
            active.sub_cmds.insert(arg.to_string(), sub);
            let walked = active;
            active = walked.sub_cmds.get_mut(arg).unwrap();
            consumed = i + 1;
            i += 1;
            continue;
        }

        // Plain positional: the active command is settled.
        break;
    }

    let remaining = &args[consumed..];

    // Help flags are normally registered lazily at parse time.
    active.ensure_help_flag();

    let (to_complete, preceding) = match remaining.split_last() {
        Some((last, init)) => (last.as_str(), init),
        None => ("", &[] as &[String]),
    };

    // Scan the preceding args for used flags, a pending flag value, and the
    // number of positionals already consumed.
    let digit_shorts = active.digit_shorts();
    let mut prev_needs_value: Option<String> = None;
    let mut positional_count = 0usize;

    let mut idx = 0;
    while idx < preceding.len() {
        let arg = preceding[idx].as_str();
        match Token::parse(arg, digit_shorts) {
            Token::DashDash => {
                saw_dash_dash = true;
                positional_count += preceding.len() - idx - 1;
                break;
            }
            Token::Long { name, inline: Some(_) } => {
                used.insert(name.to_string());
            }
            Token::Long { name, inline: None } => {
                if let Some(flag) = active.flags.get(name) {
                    used.insert(name.to_string());
                    if !flag.borrow().kind.is_bool() {
                        if idx + 1 < preceding.len() {
                            idx += 1; // skip the value
                        } else {
                            prev_needs_value = Some(name.to_string());
                        }
                    }
                }
            }
            Token::Shorts { chars, inline: Some(_) } => {
                for ch in &chars {
                    if let Some((name, _)) = active.flag_by_short(*ch) {
                        used.insert(name);
                    }
                }
            }
            Token::Shorts { chars, inline: None } => {
                for (j, ch) in chars.iter().enumerate() {
                    let Some((name, flag)) = active.flag_by_short(*ch) else { continue };
                    used.insert(name.clone());
                    if !flag.borrow().kind.is_bool() && j == chars.len() - 1 {
                        if idx + 1 < preceding.len() {
                            idx += 1;
                        } else {
                            prev_needs_value = Some(name);
                        }
                    }
                }
            }
            Token::Value(_) => positional_count += 1,
        }
        idx += 1;
    }

    // After --, everything is positional.
    if saw_dash_dash {
        return complete_subcmds_positionals(active, to_complete, positional_count, false);
    }

    // A value-taking flag is waiting for its value.
    if let Some(name) = prev_needs_value {
        return complete_flag_value(active, &name, to_complete);
    }

    // --flag=prefix
    if to_complete.starts_with("--") && to_complete.contains('=') {
        let eq = to_complete.find('=').unwrap();
        let name = &to_complete[2..eq];
        let value_prefix = &to_complete[eq + 1..];
        let (mut candidates, directive) = complete_flag_value(active, name, value_prefix);
        let prefix = &to_complete[..eq + 1];
        for c in &mut candidates {
            *c = format!("{prefix}{c}");
        }
        return (candidates, directive);
    }

    // -x=prefix binds to the last short in the cluster.
    if to_complete.starts_with('-') && !to_complete.starts_with("--") && to_complete.contains('=') {
        let eq = to_complete.find('=').unwrap();
        let shorts = &to_complete[1..eq];
        let value_prefix = &to_complete[eq + 1..];
        if let Some(ch) = shorts.chars().last() {
            if let Some((name, _)) = active.flag_by_short(ch) {
                let (mut candidates, directive) =
                    complete_flag_value(active, &name, value_prefix);
                let prefix = &to_complete[..eq + 1];
                for c in &mut candidates {
                    *c = format!("{prefix}{c}");
                }
                return (candidates, directive);
            }
        }
        return (Vec::new(), Directive::DEFAULT);
    }

    // Long flag name.
    if let Some(prefix) = to_complete.strip_prefix("--") {
        return complete_flag_names(active, prefix, &used);
    }

    // Short or long flag name from a single dash.
    if to_complete.starts_with('-') {
        return complete_short_and_long(active, to_complete, &used);
    }

    complete_subcmds_positionals(active, to_complete, positional_count, true)
}

/// Marks the flags a single token uses; unknown names are ignored except for
/// `--name=value`, which counts as used even when unregistered (the parser
/// would reject it, but the shell should not re-offer it).
fn scan_flag_token(cmd: &Cmd, arg: &str, used: &mut HashSet<String>) {
    match Token::parse(arg, cmd.digit_shorts()) {
        Token::Long { name, inline: Some(_) } => {
            used.insert(name.to_string());
        }
        Token::Long { name, inline: None } => {
            if cmd.flags.contains_key(name) {
                used.insert(name.to_string());
            }
        }
        Token::Shorts { chars, .. } => {
            for ch in chars {
                if let Some((name, _)) = cmd.flag_by_short(ch) {
                    used.insert(name);
                }
            }
        }
        _ => {}
    }
}

/// How many args a flag token consumes, including itself: 1 for bools, inline
/// values, and unknown flags; 2 for known value-taking flags.
fn flag_consumed_args(cmd: &Cmd, arg: &str) -> usize {
    match Token::parse(arg, cmd.digit_shorts()) {
        Token::Long { inline: Some(_), .. } | Token::Shorts { inline: Some(_), .. } => 1,
        Token::Long { name, inline: None } => match cmd.flags.get(name) {
            Some(flag) if !flag.borrow().kind.is_bool() => 2,
            _ => 1,
        },
        Token::Shorts { chars, inline: None } => {
            // The last char in the cluster determines whether a value follows.
            match chars.last().and_then(|ch| cmd.flag_by_short(*ch)) {
                Some((_, flag)) if !flag.borrow().kind.is_bool() => 2,
                _ => 1,
            }
        }
        _ => 1,
    }
}

/// Candidate source priority: completion callback, then enum membership, then
/// file fallback.
fn complete_flag_value(cmd: &Cmd, name: &str, to_complete: &str) -> (Vec<String>, Directive) {
    let Some(flag) = cmd.flags.get(name) else {
        return (Vec::new(), Directive::DEFAULT);
    };
    let completer = flag.borrow().completer.clone();
    if let Some(completer) = completer {
        return completer(to_complete);
    }
    let flag = flag.borrow();
    if let Some(allowed) = flag.kind.enum_values() {
        let candidates = allowed
            .iter()
            .filter(|v| v.starts_with(to_complete))
            .cloned()
            .collect();
        return (candidates, Directive::NO_FILE_COMP);
    }
    (Vec::new(), Directive::DEFAULT)
}

fn complete_flag_names(
    cmd: &Cmd,
    prefix: &str,
    used: &HashSet<String>,
) -> (Vec<String>, Directive) {
    let mut candidates: Vec<String> = Vec::new();
    for (name, flag) in &cmd.flags {
        let f = flag.borrow();
        if f.hidden || f.positional_only {
            continue;
        }
        // List flags stay offerable after use.
        if used.contains(name) && !f.kind.is_list() {
            continue;
        }
        if name.starts_with(prefix) {
            candidates.push(format!("--{name}"));
        }
    }
    candidates.sort();
    (candidates, Directive::NO_FILE_COMP)
}

fn complete_short_and_long(
    cmd: &Cmd,
    to_complete: &str,
    used: &HashSet<String>,
) -> (Vec<String>, Directive) {
    let mut candidates: Vec<String> = Vec::new();
    for (name, flag) in &cmd.flags {
        let f = flag.borrow();
        if f.hidden || f.positional_only {
            continue;
        }
        if used.contains(name) && !f.kind.is_list() {
            continue;
        }
        let long = format!("--{name}");
        if long.starts_with(to_complete) {
            candidates.push(long);
        }
        if let Some(ch) = cmd.visible_short(name) {
            let short = format!("-{ch}");
            if short.starts_with(to_complete) {
                candidates.push(short);
            }
        }
    }
    candidates.sort();
    (candidates, Directive::NO_FILE_COMP)
}

/// Offers subcommand names plus completions for the active positional slot.
/// Subcommand candidates pin the directive to no-file-comp; a positional's
/// own directive only applies when it is the sole candidate source.
fn complete_subcmds_positionals(
    cmd: &Cmd,
    to_complete: &str,
    positional_count: usize,
    include_subcmds: bool,
) -> (Vec<String>, Directive) {
    let mut candidates: Vec<String> = Vec::new();
    let mut directive = Directive::NO_FILE_COMP;

    if include_subcmds {
        for name in cmd.sub_cmds.keys() {
            if name.starts_with(to_complete) {
                candidates.push(name.clone());
            }
        }
    }
    let sub_count = candidates.len();

    // Variadic positionals absorb all remaining positions, so once reached
    // they stay the active slot regardless of the count.
    let mut skipped = 0usize;
    for name in &cmd.positional {
        let Some(flag) = cmd.flags.get(name) else { continue };
        let f = flag.borrow();
        if f.flag_only {
            continue;
        }
        if !f.kind.is_variadic() && skipped < positional_count {
            skipped += 1;
            continue;
        }

        if let Some(completer) = f.completer.clone() {
            drop(f);
            let (vals, dir) = completer(to_complete);
            candidates.extend(vals);
            if sub_count == 0 {
                directive = dir;
            }
        } else if let Some(allowed) = f.kind.enum_values() {
            candidates.extend(
                allowed.iter().filter(|v| v.starts_with(to_complete)).cloned(),
            );
        } else if candidates.is_empty() {
            directive = Directive::DEFAULT;
        }
        break;
    }

    candidates.sort();
    (candidates, directive)
}
