//! The single-pass parsing state machine and the post-scan constraint
//! validator.

use std::io::Write;

use tracing::trace;

use crate::{
    cmd::Cmd,
    flag::{parse_bool, FlagRef},
    token::Token,
    Completions, Error, HelpRequest, Io, Result,
};

/// Per-invocation parse behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub(crate) ignore_unknown: bool,
    pub(crate) variadic_unknown_flags: bool,
    pub(crate) dump: bool,
}

impl ParseOptions {
    pub fn new() -> ParseOptions {
        ParseOptions::default()
    }

    /// Permissive mode: unknown flags and unmatched positionals are collected
    /// into [`Cmd::unknown_args`] instead of aborting. Conversion and
    /// constraint violations still abort.
    pub fn ignore_unknown(mut self, yes: bool) -> ParseOptions {
        self.ignore_unknown = yes;
        self
    }

    /// An open variadic run absorbs flag-looking tokens that do not resolve
    /// to a registered flag.
    pub fn variadic_unknown_flags(mut self, yes: bool) -> ParseOptions {
        self.variadic_unknown_flags = yes;
        self
    }

    /// Skip parsing and surface the diagnostic dump sentinel instead.
    pub fn dump(mut self, yes: bool) -> ParseOptions {
        self.dump = yes;
        self
    }
}

impl Cmd {
    pub fn parse<I, S>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_with(args, ParseOptions::new())
    }

    /// Structured entry point: help, dump, and completion surface as sentinel
    /// [`Error`] variants carrying their payload; no output is produced.
    pub fn parse_with<I, S>(&mut self, args: I, opts: ParseOptions) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.parse_inner(&args, false, &opts)
    }

    /// Boundary entry point: renders usage, dump, completion, and error
    /// messages to the real streams and exits the process.
    pub fn parse_or_exit<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stdout = std::io::stdout();
        let mut stderr = std::io::stderr();
        let mut exit = |code| std::process::exit(code);
        let mut io = Io { stdout: &mut stdout, stderr: &mut stderr, exit: &mut exit };
        self.parse_or_exit_with(args, ParseOptions::new(), &mut io);
    }

    /// Like [`Cmd::parse_or_exit`], but with caller-supplied sinks and exit
    /// function, so the boundary is testable.
    pub fn parse_or_exit_with<I, S>(&mut self, args: I, opts: ParseOptions, io: &mut Io<'_>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let Err(err) = self.parse_inner(&args, false, &opts) else { return };
        match &err {
            Error::HelpRequested(req) => {
                let usage =
                    if req.long { self.generate_long_usage() } else { self.generate_short_usage() };
                let _ = write!(io.stdout, "{usage}");
                (io.exit)(0);
            }
            Error::DumpRequested => {
                let dump = self.generate_dump(&args, &opts);
                let _ = write!(io.stdout, "{dump}");
                (io.exit)(0);
            }
            Error::CompletionRequested(completions) => {
                let _ = completions.render(io.stdout);
                (io.exit)(0);
            }
            Error::Config(_) => {
                // Library misuse: error only, usage would mislead.
                let _ = writeln!(io.stderr, "{err}");
                (io.exit)(1);
            }
            _ => {
                let _ = writeln!(io.stderr, "{err}");
                let _ = writeln!(io.stderr);
                let _ = write!(io.stderr, "{}", self.generate_long_usage());
                (io.exit)(1);
            }
        }
    }

    pub(crate) fn parse_inner(
        &mut self,
        args: &[String],
        nested: bool,
        cfg: &ParseOptions,
    ) -> Result<()> {
        // Nested calls keep the configured status carried over for globals.
        self.reset_parse_state(nested);
        self.ensure_help_flag();

        // `__complete` is only reserved as the first token of the whole
        // invocation, not of a subcommand's tail.
        if self.completion_enabled
            && !nested
            && args.first().map(String::as_str) == Some("__complete")
        {
            let (candidates, directive) = crate::complete::compute(self, &args[1..]);
            return Err(Error::CompletionRequested(Completions { candidates, directive }));
        }

        self.validate_constraint_refs()?;
        self.set_defaults();

        if cfg.dump {
            return Err(Error::DumpRequested);
        }

        if self.auto_help_on_no_args && args.is_empty() && self.has_required_flags() {
            return Err(Error::HelpRequested(HelpRequest { long: false, auto: true }));
        }

        let digit_shorts = self.digit_shorts();
        let mut dash_dash = false;
        let mut i = 0;

        while i < args.len() {
            let raw = args[i].as_str();

            if dash_dash {
                if let Err(err) = self.assign_positional(raw, true) {
                    if cfg.ignore_unknown && err.demotable() {
                        self.unknown.push(raw.to_string());
                    } else {
                        return Err(err);
                    }
                }
                i += 1;
                continue;
            }

            match Token::parse(raw, digit_shorts) {
                Token::DashDash => {
                    dash_dash = true;
                    i += 1;
                }
                Token::Long { name, inline } => {
                    match self.bind_long(name, inline, args, i, cfg) {
                        Ok(consumed) => {
                            self.saw_flag = true;
                            self.last_variadic = None;
                            i += consumed;
                        }
                        Err(err) if cfg.ignore_unknown && err.demotable() => {
                            self.unknown.push(raw.to_string());
                            i += 1;
                        }
                        Err(err) => return Err(err),
                    }
                }
                Token::Shorts { chars, inline } => {
                    match self.bind_shorts(&chars, inline, args, i, cfg) {
                        Ok(consumed) => {
                            self.saw_flag = true;
                            self.last_variadic = None;
                            i += consumed;
                        }
                        Err(err) if cfg.ignore_unknown && err.demotable() => {
                            self.unknown.push(raw.to_string());
                            i += 1;
                        }
                        Err(err) => return Err(err),
                    }
                }
                Token::Value(value) => {
                    if !value.starts_with('-') && self.sub_cmds.contains_key(value) {
                        trace!(cmd = %self.name, sub = %value, "descending into subcommand");
                        let mut sub = self.sub_cmds.remove(value).unwrap();
                        sub.used.set(true);
                        self.adopt_globals(&mut sub);
                        for name in &self.global_names {
                            if self.configured.contains(name) {
                                sub.configured.insert(name.clone());
                            }
                        }
                        let result = sub.parse_inner(&args[i + 1..], true, cfg);
                        self.sub_cmds.insert(value.to_string(), sub);
                        return result;
                    }
                    if let Err(err) = self.assign_positional(value, false) {
                        if cfg.ignore_unknown && err.demotable() {
                            self.unknown.push(raw.to_string());
                        } else {
                            return Err(err);
                        }
                    }
                    i += 1;
                }
            }
        }

        // Help wins over validation, wherever it appeared in the args.
        if self.help_enabled {
            for arg in args {
                if arg.as_str() == "--help" {
                    return Err(Error::HelpRequested(HelpRequest { long: true, auto: false }));
                }
                if arg.as_str() == "-h" {
                    return Err(Error::HelpRequested(HelpRequest { long: false, auto: false }));
                }
            }
        }

        self.validate_required()
    }

    fn set_defaults(&mut self) {
        for (name, flag) in &self.flags {
            if !self.configured.contains(name) {
                flag.borrow_mut().kind.apply_default();
            }
        }
    }

    fn validate_constraint_refs(&self) -> Result<()> {
        for flag in self.flags.values() {
            let flag = flag.borrow();
            for name in flag.requires.iter().chain(flag.excludes.iter()) {
                if !self.flags.contains_key(name) {
                    return Err(Error::Config(format!("Undefined flag '{name}'")));
                }
            }
        }
        Ok(())
    }

    fn bind_long(
        &mut self,
        name: &str,
        inline: Option<&str>,
        args: &[String],
        i: usize,
        cfg: &ParseOptions,
    ) -> Result<usize> {
        let Some(flag) = self.flags.get(name).cloned() else {
            return Err(Error::UnknownFlag(name.to_string()));
        };
        let newly = self.configured.insert(name.to_string());

        let is_bool = flag.borrow().kind.is_bool();
        if is_bool {
            let mut f = flag.borrow_mut();
            match inline {
                Some(v) => {
                    let b = parse_bool(v).ok_or_else(|| {
                        Error::InvalidValue(format!("invalid value for flag --{name}: {v}"))
                    })?;
                    f.kind.set_bool(b);
                }
                None => f.kind.set_bool(true),
            }
            return Ok(1);
        }

        let is_list = flag.borrow().kind.is_list();
        if is_list {
            if newly {
                // First user write replaces a configured default wholesale.
                flag.borrow_mut().kind.clear_list();
            }
            return match inline {
                Some(v) => {
                    flag.borrow_mut().kind.append_list(name, v)?;
                    Ok(1)
                }
                None => self.consume_list_run(&flag, name, args, i, cfg),
            };
        }

        match inline {
            Some(v) => {
                flag.borrow_mut().kind.set_scalar(name, v)?;
                Ok(1)
            }
            None => {
                if i + 1 >= args.len() {
                    return Err(Error::MissingValue(format!("--{name}")));
                }
                flag.borrow_mut().kind.set_scalar(name, &args[i + 1])?;
                Ok(2)
            }
        }
    }

    fn bind_shorts(
        &mut self,
        chars: &[char],
        inline: Option<&str>,
        args: &[String],
        i: usize,
        cfg: &ParseOptions,
    ) -> Result<usize> {
        // Repetition counting: -vvv binds the count to a countable kind.
        // An inline value still wins: -vv=7 is 7, not 2.
        if chars.len() > 1 && chars.iter().all(|c| *c == chars[0]) {
            if let Some((name, flag)) = self.flag_by_short(chars[0]) {
                let countable = flag.borrow().kind.is_countable();
                if countable {
                    self.configured.insert(name.clone());
                    let mut f = flag.borrow_mut();
                    match inline {
                        Some(v) => f.kind.set_scalar(&name, v)?,
                        None => {
                            f.kind.set_count(chars.len());
                        }
                    }
                    return Ok(1);
                }
            }
        }

        let mut consumed = 1;
        for (idx, ch) in chars.iter().enumerate() {
            let last = idx == chars.len() - 1;
            let Some((name, flag)) = self.flag_by_short(*ch) else {
                return Err(Error::UnknownShort(*ch));
            };
            let newly = self.configured.insert(name.clone());

            let is_bool = flag.borrow().kind.is_bool();
            if is_bool {
                let mut f = flag.borrow_mut();
                match inline {
                    Some(v) if last => {
                        let b = parse_bool(v).ok_or_else(|| {
                            Error::InvalidValue(format!("invalid value for flag -{ch}: {v}"))
                        })?;
                        f.kind.set_bool(b);
                    }
                    _ => f.kind.set_bool(true),
                }
                continue;
            }

            if !last {
                return Err(Error::NonBoolInCluster(*ch));
            }

            let is_list = flag.borrow().kind.is_list();
            if is_list {
                if newly {
                    flag.borrow_mut().kind.clear_list();
                }
                match inline {
                    Some(v) => flag.borrow_mut().kind.append_list(&name, v)?,
                    None => consumed = self.consume_list_run(&flag, &name, args, i, cfg)?,
                }
            } else {
                match inline {
                    Some(v) => flag.borrow_mut().kind.set_scalar(&name, v)?,
                    None => {
                        if i + 1 >= args.len() {
                            return Err(Error::MissingValue(format!("-{ch}")));
                        }
                        flag.borrow_mut().kind.set_scalar(&name, &args[i + 1])?;
                        consumed = 2;
                    }
                }
            }
        }
        Ok(consumed)
    }

    /// Consumes the value run for a list flag used in named form. Non-variadic
    /// lists take at most one following token; variadic lists eat tokens until
    /// something flag-shaped appears.
    fn consume_list_run(
        &self,
        flag: &FlagRef,
        name: &str,
        args: &[String],
        i: usize,
        cfg: &ParseOptions,
    ) -> Result<usize> {
        let variadic = flag.borrow().kind.is_variadic();
        if !variadic {
            if i + 1 >= args.len() {
                return Ok(1);
            }
            flag.borrow_mut().kind.append_list(name, &args[i + 1])?;
            return Ok(2);
        }
        let mut consumed = 1;
        while i + consumed < args.len() {
            let tok = args[i + consumed].as_str();
            if tok.starts_with('-') && (!cfg.variadic_unknown_flags || self.is_flag_like(tok)) {
                break;
            }
            flag.borrow_mut().kind.append_list(name, tok)?;
            consumed += 1;
        }
        Ok(consumed)
    }

    /// Whether a `-`-prefixed token resolves to registered syntax, for the
    /// variadic-unknown-flags probe.
    fn is_flag_like(&self, raw: &str) -> bool {
        match Token::parse(raw, self.digit_shorts()) {
            Token::DashDash => true,
            Token::Long { name, .. } => self.flags.contains_key(name),
            Token::Shorts { chars, .. } => {
                chars.first().is_some_and(|ch| self.flag_by_short(*ch).is_some())
            }
            Token::Value(_) => false,
        }
    }

    /// Routes a bare value to the next open dual-nature positional slot, with
    /// variadic stickiness.
    fn assign_positional(&mut self, value: &str, positional_only_mode: bool) -> Result<()> {
        let order = self.positional.clone();
        for name in order {
            let Some(flag) = self.flags.get(&name).cloned() else { continue };
            let (flag_only, is_variadic, is_list) = {
                let f = flag.borrow();
                (f.flag_only, f.kind.is_variadic(), f.kind.is_list())
            };
            if flag_only {
                continue;
            }

            if is_variadic {
                if self.last_variadic.as_deref() == Some(name.as_str()) {
                    self.configured.insert(name.clone());
                    return flag.borrow_mut().kind.append_list(&name, value);
                }
                // After --, keep appending to a variadic that is already open.
                if positional_only_mode && self.configured.contains(&name) {
                    return flag.borrow_mut().kind.append_list(&name, value);
                }
                // A flag token closed this variadic; it does not reopen.
                if self.saw_flag && self.configured.contains(&name) {
                    continue;
                }
                if !self.saw_flag || self.last_variadic.is_none() {
                    let newly = self.configured.insert(name.clone());
                    self.last_variadic = Some(name.clone());
                    let mut f = flag.borrow_mut();
                    if newly {
                        f.kind.clear_list();
                    }
                    return f.kind.append_list(&name, value);
                }
                continue;
            }

            if self.configured.contains(&name) {
                continue;
            }
            self.configured.insert(name.clone());
            let mut f = flag.borrow_mut();
            return if is_list {
                f.kind.clear_list();
                f.kind.append_list(&name, value)
            } else {
                f.kind.set_scalar(&name, value)
            };
        }

        Err(Error::TooManyPositional(value.to_string()))
    }

    // --- constraint validation ---

    fn validate_required(&self) -> Result<()> {
        // A configured bypass flag switches off relational and required
        // validation for the whole command.
        for name in &self.configured {
            if let Some(flag) = self.flags.get(name) {
                if flag.borrow().bypass_validation {
                    return Ok(());
                }
            }
        }

        // Relational pass first: its errors are more specific than a generic
        // missing-required report. Registration order keeps messages stable.
        for name in self.registration_order() {
            let Some(flag) = self.flags.get(name) else { continue };
            if self.relationally_configured(name) {
                let requires = flag.borrow().requires.clone();
                for req in &requires {
                    if !self.relationally_configured(req) {
                        return Err(Error::Relational(format!(
                            "Invalid args: '{name}' requires '{req}', but '{req}' was not set"
                        )));
                    }
                }
            }
            self.check_exclusion(name)?;
        }

        let mut missing: Vec<String> = Vec::new();
        for name in self.registration_order() {
            if self.is_required(name)
                && !self.configured.contains(name)
                && !self.excluded_by_configured(name)
            {
                missing.push(name.clone());
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingRequired(missing));
        }
        Ok(())
    }

    fn check_exclusion(&self, name: &str) -> Result<()> {
        if !self.relationally_configured(name) {
            return Ok(());
        }
        if let Some(flag) = self.flags.get(name) {
            let excludes = flag.borrow().excludes.clone();
            for excluded in &excludes {
                if self.relationally_configured(excluded) {
                    return Err(Error::Relational(format!(
                        "Invalid args: '{name}' excludes '{excluded}', but '{excluded}' was set"
                    )));
                }
            }
        }
        // Symmetric direction: another configured flag excluding this one.
        for other in self.registration_order() {
            if other == name || !self.relationally_configured(other) {
                continue;
            }
            let Some(other_flag) = self.flags.get(other) else { continue };
            if other_flag.borrow().excludes.iter().any(|e| e == name) {
                return Err(Error::Relational(format!(
                    "Invalid args: '{other}' excludes '{name}', but '{name}' was set"
                )));
            }
        }
        Ok(())
    }

    /// Configured for relational purposes: bools count only when true; other
    /// kinds count when explicitly set or carrying a default.
    fn relationally_configured(&self, name: &str) -> bool {
        let Some(flag) = self.flags.get(name) else { return false };
        let flag = flag.borrow();
        match flag.kind.bool_value() {
            Some(v) => v,
            None => self.configured.contains(name) || flag.kind.has_default(),
        }
    }

    fn is_required(&self, name: &str) -> bool {
        let Some(flag) = self.flags.get(name) else { return false };
        let flag = flag.borrow();
        flag.kind.requirable() && !flag.optional && !flag.kind.has_default()
    }

    fn excluded_by_configured(&self, name: &str) -> bool {
        for other in &self.configured {
            if other == name {
                continue;
            }
            let Some(flag) = self.flags.get(other) else { continue };
            let flag = flag.borrow();
            // A configured-but-false bool does not exclude anything.
            if flag.kind.bool_value() == Some(false) {
                continue;
            }
            if flag.excludes.iter().any(|e| e == name) {
                return true;
            }
        }
        false
    }

    pub(crate) fn has_required_flags(&self) -> bool {
        self.registration_order().any(|name| self.is_required(name))
    }
}
