use std::{
    cell::Cell,
    collections::{BTreeMap, HashMap, HashSet},
    rc::Rc,
};

use tracing::trace;

use crate::{
    flag::{Flag, FlagRef, Kind, RegisterOptions, Scalar},
    Error, Result,
};

/// Section headers used by the usage renderer; override via
/// [`Cmd::usage_headers`].
#[derive(Debug, Clone)]
pub struct UsageHeaders {
    pub usage: String,
    pub commands: String,
    pub arguments: String,
    pub global_options: String,
}

impl Default for UsageHeaders {
    fn default() -> UsageHeaders {
        UsageHeaders {
            usage: "Usage:".to_string(),
            commands: "Commands:".to_string(),
            arguments: "Arguments:".to_string(),
            global_options: "Global options:".to_string(),
        }
    }
}

/// A command: a set of flags, plus subcommands forming a tree.
///
/// Every flag that is not flag-only doubles as a positional argument, in
/// registration order. Flags registered as global are shared by reference
/// with all subcommands.
pub struct Cmd {
    pub(crate) name: String,
    pub(crate) description: Option<String>,

    pub(crate) flags: HashMap<String, FlagRef>,
    /// Dual-nature flag names, registration order.
    pub(crate) positional: Vec<String>,
    /// Flag-only names, registration order.
    pub(crate) non_positional: Vec<String>,
    pub(crate) global_names: Vec<String>,
    pub(crate) short_to_name: HashMap<char, String>,
    pub(crate) sub_cmds: BTreeMap<String, Cmd>,

    // Shadow bookkeeping. Globals are never copied; when a local flag takes a
    // global's name or short, the canonical Rc is parked here so subcommand
    // propagation and residual parent-side lookups keep working.
    pub(crate) overridden_globals: HashMap<String, FlagRef>,
    /// Shorts that still resolve to a name-shadowed global at this command.
    pub(crate) overridden_shorts: HashMap<char, String>,
    pub(crate) shadowed_names: HashSet<String>,
    /// Globals whose short was claimed by a local flag at this command.
    pub(crate) shadowed_shorts: HashSet<String>,

    // Options.
    pub(crate) help_enabled: bool,
    pub(crate) auto_help_on_no_args: bool,
    pub(crate) exclude_name_from_usage: bool,
    pub(crate) completion_enabled: bool,
    pub(crate) usage_headers: UsageHeaders,

    // Parse state.
    pub(crate) configured: HashSet<String>,
    pub(crate) unknown: Vec<String>,
    /// Open variadic positional; later positionals stick to it.
    pub(crate) last_variadic: Option<String>,
    /// A flag token appeared since the last variadic opened.
    pub(crate) saw_flag: bool,
    pub(crate) used: Rc<Cell<bool>>,
}

impl Cmd {
    pub fn new(name: impl Into<String>) -> Cmd {
        Cmd {
            name: name.into(),
            description: None,
            flags: HashMap::new(),
            positional: Vec::new(),
            non_positional: Vec::new(),
            global_names: Vec::new(),
            short_to_name: HashMap::new(),
            sub_cmds: BTreeMap::new(),
            overridden_globals: HashMap::new(),
            overridden_shorts: HashMap::new(),
            shadowed_names: HashSet::new(),
            shadowed_shorts: HashSet::new(),
            help_enabled: true,
            auto_help_on_no_args: false,
            exclude_name_from_usage: false,
            completion_enabled: true,
            usage_headers: UsageHeaders::default(),
            configured: HashSet::new(),
            unknown: Vec::new(),
            last_variadic: None,
            saw_flag: false,
            used: Rc::new(Cell::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(mut self, desc: impl Into<String>) -> Cmd {
        self.description = Some(desc.into());
        self
    }

    /// Default true: a global `--help`/`-h` bool is auto-registered at first
    /// parse unless a `help` flag already exists.
    pub fn help_enabled(mut self, enable: bool) -> Cmd {
        self.help_enabled = enable;
        self
    }

    /// Show short help when invoked with no arguments and required flags
    /// exist.
    pub fn auto_help_on_no_args(mut self, enable: bool) -> Cmd {
        self.auto_help_on_no_args = enable;
        self
    }

    pub fn exclude_name_from_usage(mut self, exclude: bool) -> Cmd {
        self.exclude_name_from_usage = exclude;
        self
    }

    /// Default true: the reserved first token `__complete` triggers the
    /// completion protocol.
    pub fn completion_enabled(mut self, enable: bool) -> Cmd {
        self.completion_enabled = enable;
        self
    }

    pub fn usage_headers(mut self, headers: UsageHeaders) -> Cmd {
        self.usage_headers = headers;
        self
    }

    /// Registers `sub` under this command and returns a handle that reads
    /// true after a parse that dispatched into it.
    pub fn register_cmd(&mut self, sub: Cmd) -> Result<Rc<Cell<bool>>> {
        if self.sub_cmds.contains_key(&sub.name) {
            return Err(Error::Config(format!("command \"{}\" already defined", sub.name)));
        }
        let name = sub.name.clone();
        let used = sub.used.clone();
        let mut sub = sub;
        self.adopt_globals(&mut sub);
        trace!(parent = %self.name, sub = %name, "registered subcommand");
        self.sub_cmds.insert(name, sub);
        Ok(used)
    }

    /// Whether a flag was explicitly configured by the user, here or in any
    /// invoked subcommand.
    pub fn configured(&self, name: &str) -> bool {
        if self.configured.contains(name) {
            return true;
        }
        self.sub_cmds
            .values()
            .any(|sub| sub.used.get() && sub.configured(name))
    }

    /// Arguments that failed to match anything, collected in permissive mode.
    pub fn unknown_args(&self) -> &[String] {
        &self.unknown
    }

    /// Shares this command's globals with `sub`, skipping names the
    /// subcommand already has. The name-shadowed original is preferred over
    /// the local flag occupying its name slot.
    pub(crate) fn adopt_globals(&self, sub: &mut Cmd) {
        for name in &self.global_names {
            let flag = self
                .overridden_globals
                .get(name)
                .or_else(|| self.flags.get(name));
            let Some(flag) = flag else { continue };
            if sub.flags.contains_key(name) {
                continue;
            }
            sub.flags.insert(name.clone(), flag.clone());
            let short = flag.borrow().short;
            if let Some(ch) = short {
                sub.short_to_name.entry(ch).or_insert_with(|| name.clone());
            }
            sub.global_names.push(name.clone());
            sub.non_positional.push(name.clone());
        }
    }

    /// Registers a flag record. Builders call this; it owns collision policy,
    /// the global-shadow rules, and the registration invariants.
    pub(crate) fn insert_flag(&mut self, mut flag: Flag, opts: RegisterOptions) -> Result<FlagRef> {
        if flag.name.is_empty() {
            return Err(Error::Config("flag name cannot be empty".to_string()));
        }
        if flag.positional_only && flag.flag_only {
            return Err(Error::Config(format!(
                "flag \"{}\" cannot be both positional-only and flag-only (mutually exclusive)",
                flag.name
            )));
        }
        if let Err(msg) = flag.kind.check_default() {
            return Err(Error::Config(format!(
                "invalid default value for flag \"{}\": {msg}",
                flag.name
            )));
        }

        self.resolve_collisions(&flag.name, flag.short, opts.global)?;

        flag.bypass_validation = opts.bypass_validation;
        if opts.global {
            // A required global would poison every subcommand.
            flag.flag_only = true;
            flag.optional = true;
            self.global_names.push(flag.name.clone());
        }

        if let Some(ch) = flag.short {
            if self.short_to_name.contains_key(&ch) {
                return Err(Error::Config(format!("short flag \"{ch}\" already defined")));
            }
            self.short_to_name.insert(ch, flag.name.clone());
        }

        if !flag.flag_only && flag.positional_only {
            self.ensure_no_variadic_before(&flag.name)?;
        }

        let name = flag.name.clone();
        if flag.flag_only {
            self.non_positional.push(name.clone());
        } else {
            self.positional.push(name.clone());
        }
        trace!(cmd = %self.name, flag = %name, global = opts.global, "registered flag");
        let slot = Rc::new(std::cell::RefCell::new(flag));
        self.flags.insert(name, slot.clone());
        Ok(slot)
    }

    fn resolve_collisions(&mut self, name: &str, short: Option<char>, global: bool) -> Result<()> {
        if let Some(existing) = self.flags.get(name).cloned() {
            let existing_global = self.global_names.iter().any(|g| g == name);
            if global || !existing_global {
                return Err(Error::Config(format!("flag \"{name}\" already defined")));
            }
            // Local flag takes over a global's name. The global stays
            // propagatable, and keeps a residual parent-side presence through
            // its short unless the local claims that too.
            trace!(cmd = %self.name, flag = %name, "local flag shadows global name");
            self.overridden_globals.insert(name.to_string(), existing.clone());
            self.shadowed_names.insert(name.to_string());
            let global_short = existing.borrow().short;
            if let Some(gch) = global_short {
                self.short_to_name.remove(&gch);
                if short != Some(gch) {
                    self.overridden_shorts.insert(gch, name.to_string());
                }
            }
            self.positional.retain(|n| n != name);
            self.non_positional.retain(|n| n != name);
            return Ok(());
        }

        if global {
            return Ok(());
        }
        let Some(ch) = short else { return Ok(()) };
        let Some(existing_name) = self.short_to_name.get(&ch).cloned() else {
            return Ok(());
        };
        let existing_global = self.global_names.iter().any(|g| g == &existing_name);
        if !existing_global {
            return Err(Error::Config(format!("short flag \"{ch}\" already defined")));
        }
        // Local flag claims a global's short. The global stays reachable at
        // this command by full name only; subcommands still see its short.
        trace!(cmd = %self.name, flag = %existing_name, short = %ch, "local flag shadows global short");
        let existing = self.flags.get(&existing_name).cloned();
        if let Some(existing) = existing {
            self.overridden_globals.insert(existing_name.clone(), existing);
        }
        self.shadowed_shorts.insert(existing_name);
        self.short_to_name.remove(&ch);
        Ok(())
    }

    fn ensure_no_variadic_before(&self, name: &str) -> Result<()> {
        for existing in &self.positional {
            let Some(flag) = self.flags.get(existing) else { continue };
            if flag.borrow().kind.is_variadic() {
                return Err(Error::Config(format!(
                    "cannot register positional-only flag \"{name}\" after variadic \
                     positional flag \"{existing}\" (positional-only flags cannot be \
                     set after variadic flags)"
                )));
            }
        }
        Ok(())
    }

    /// Resolves a short character, including shorts that residually point at
    /// a name-shadowed global.
    pub(crate) fn flag_by_short(&self, ch: char) -> Option<(String, FlagRef)> {
        if let Some(name) = self.short_to_name.get(&ch) {
            return self.flags.get(name).map(|f| (name.clone(), f.clone()));
        }
        if let Some(name) = self.overridden_shorts.get(&ch) {
            return self
                .overridden_globals
                .get(name)
                .map(|f| (name.clone(), f.clone()));
        }
        None
    }

    /// The short character this command actually answers to for `name`, which
    /// differs from the flag record's own short when shadowed.
    pub(crate) fn visible_short(&self, name: &str) -> Option<char> {
        let flag = self.flags.get(name)?;
        let ch = flag.borrow().short?;
        match self.short_to_name.get(&ch) {
            Some(owner) if owner == name => Some(ch),
            _ => None,
        }
    }

    /// Negative numbers stop being reclassified as values once any registered
    /// short is a digit.
    pub(crate) fn digit_shorts(&self) -> bool {
        self.short_to_name
            .keys()
            .chain(self.overridden_shorts.keys())
            .any(|ch| ch.is_ascii_digit())
    }

    /// Registration order: positional flags first, then flag-only.
    pub(crate) fn registration_order(&self) -> impl Iterator<Item = &String> {
        self.positional.iter().chain(self.non_positional.iter())
    }

    pub(crate) fn reset_parse_state(&mut self, preserve_configured: bool) {
        if !preserve_configured {
            self.configured.clear();
        }
        self.unknown.clear();
        self.last_variadic = None;
        self.saw_flag = false;
    }

    /// Auto-registered once per command; a pre-existing `help` flag wins.
    pub(crate) fn ensure_help_flag(&mut self) {
        if !self.help_enabled || self.flags.contains_key("help") {
            return;
        }
        let help = Flag {
            name: "help".to_string(),
            short: Some('h'),
            usage: "Print usage string.".to_string(),
            custom_usage_type: None,
            optional: true,
            hidden: false,
            hidden_in_short_help: false,
            positional_only: false,
            flag_only: false,
            requires: Vec::new(),
            excludes: Vec::new(),
            bypass_validation: false,
            completer: None,
            kind: Kind::Bool(Scalar { value: false, default: None }),
        };
        // -h may be taken by a user flag; help then answers to --help only.
        let _ = self.insert_flag(help, RegisterOptions::new().global(true));
    }
}
