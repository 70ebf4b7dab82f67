//! Diagnostic dump: the full command structure and parse context, rendered
//! when parsing runs with [`ParseOptions::dump`].

use crate::{cmd::Cmd, flag::Flag, parse::ParseOptions};

impl Cmd {
    /// Renders the dump report. `args` are the arguments that would have been
    /// parsed; only the root command shows them.
    pub fn generate_dump(&self, args: &[String], opts: &ParseOptions) -> String {
        self.dump_with_depth(args, 0, opts)
    }

    fn dump_with_depth(&self, args: &[String], depth: usize, opts: &ParseOptions) -> String {
        let indent = "  ".repeat(depth);
        let mut out = String::new();

        if depth == 0 {
            out.push_str("Command Dump\n");
            out.push_str(&"=".repeat(50));
            out.push_str("\n\n");
        } else {
            out.push_str(&format!("{indent}Subcommand Dump ({})\n", self.name));
            out.push_str(&format!("{indent}{}\n\n", "-".repeat(30)));
        }

        out.push_str(&format!("{indent}Parse Configuration:\n"));
        out.push_str(&format!("{indent}  Ignore Unknown: {}\n", opts.ignore_unknown));
        out.push_str(&format!("{indent}  Dump Enabled: {}\n\n", opts.dump));

        out.push_str(&format!("{indent}Command Information:\n"));
        out.push_str(&format!("{indent}  Name: {}\n", self.name));
        out.push_str(&format!(
            "{indent}  Description: {}\n",
            self.description.as_deref().unwrap_or("<not set>")
        ));
        out.push_str(&format!("{indent}  Help Enabled: {}\n", self.help_enabled));
        out.push_str(&format!("{indent}  Auto Help on No Args: {}\n", self.auto_help_on_no_args));
        out.push_str(&format!(
            "{indent}  Exclude Name from Usage: {}\n",
            self.exclude_name_from_usage
        ));
        out.push_str(&format!("{indent}  Completion Enabled: {}\n", self.completion_enabled));
        if self.sub_cmds.is_empty() {
            out.push_str(&format!("{indent}  Subcommands: none\n\n"));
        } else {
            let names: Vec<&str> = self.sub_cmds.keys().map(String::as_str).collect();
            out.push_str(&format!(
                "{indent}  Subcommands ({}): {}\n\n",
                names.len(),
                names.join(", ")
            ));
        }

        if depth == 0 {
            out.push_str("Arguments to Parse:\n");
            if args.is_empty() {
                out.push_str("  <no arguments>\n");
            } else {
                for (i, arg) in args.iter().enumerate() {
                    out.push_str(&format!("  [{i}]: {arg:?}\n"));
                }
            }
            out.push('\n');
        }

        out.push_str(&self.flags_section(&indent));

        if !self.sub_cmds.is_empty() {
            if depth == 0 {
                out.push_str("\nSubcommand Details:\n");
                out.push_str(&"=".repeat(50));
                out.push_str("\n\n");
            }
            let last = self.sub_cmds.keys().last().cloned();
            for (name, sub) in &self.sub_cmds {
                out.push_str(&sub.dump_with_depth(&[], depth + 1, opts));
                if Some(name) != last.as_ref() {
                    out.push('\n');
                }
            }
        }

        out
    }

    fn flags_section(&self, indent: &str) -> String {
        let mut out = format!("{indent}Flags Structure:\n");
        out.push_str(&format!("{indent}  Total Flags: {}\n", self.flags.len()));
        out.push_str(&format!("{indent}  Positional Flags: {}\n", self.positional.len()));
        out.push_str(&format!("{indent}  Non-Positional Flags: {}\n", self.non_positional.len()));
        out.push_str(&format!("{indent}  Global Flags: {}\n\n", self.global_names.len()));

        if !self.positional.is_empty() {
            out.push_str(&format!("{indent}  Positional Flags (in order):\n"));
            for (i, name) in self.positional.iter().enumerate() {
                if let Some(flag) = self.flags.get(name) {
                    out.push_str(&format!(
                        "{indent}    [{i}] {}\n",
                        self.format_flag(name, &flag.borrow())
                    ));
                }
            }
            out.push('\n');
        }
        if !self.non_positional.is_empty() {
            out.push_str(&format!("{indent}  Non-Positional Flags:\n"));
            for name in &self.non_positional {
                if let Some(flag) = self.flags.get(name) {
                    out.push_str(&format!(
                        "{indent}    {}\n",
                        self.format_flag(name, &flag.borrow())
                    ));
                }
            }
            out.push('\n');
        }
        if !self.global_names.is_empty() {
            out.push_str(&format!("{indent}  Global Flags:\n"));
            for name in &self.global_names {
                if let Some(flag) = self.flags.get(name) {
                    out.push_str(&format!(
                        "{indent}    {}\n",
                        self.format_flag(name, &flag.borrow())
                    ));
                }
            }
            out.push('\n');
        }

        if !self.overridden_globals.is_empty()
            || !self.shadowed_shorts.is_empty()
            || !self.shadowed_names.is_empty()
        {
            out.push_str(&format!("{indent}  Flag Conflicts:\n"));
            let mut section = |label: &str, names: Vec<&String>| {
                if names.is_empty() {
                    return;
                }
                let mut names = names;
                names.sort();
                out.push_str(&format!("{indent}    {label}:\n"));
                for name in names {
                    out.push_str(&format!("{indent}      {name}\n"));
                }
            };
            section("Overridden Global Flags", self.overridden_globals.keys().collect());
            section("Shadowed Short Flags", self.shadowed_shorts.iter().collect());
            section("Shadowed Name Flags", self.shadowed_names.iter().collect());
            out.push('\n');
        }

        out
    }

    fn format_flag(&self, name: &str, f: &Flag) -> String {
        let mut parts: Vec<String> = Vec::new();
        match self.visible_short(name) {
            Some(ch) => parts.push(format!("{name} (-{ch})")),
            None => parts.push(name.to_string()),
        }
        parts.push(format!("type:{}", dump_type(f)));

        let has_default = f.kind.has_default() || !f.kind.requirable();
        if f.optional {
            parts.push("optional".to_string());
        } else if has_default {
            let default = f.kind.render_default().unwrap_or_else(|| {
                if f.kind.is_bool() { "false".to_string() } else { "[]".to_string() }
            });
            parts.push(format!("optional (default:{default})"));
        } else {
            parts.push("required".to_string());
        }

        if let Some(current) = current_display(f) {
            parts.push(format!("current:{current}"));
        }
        if self.configured.contains(name) {
            parts.push("configured".to_string());
        }
        if !f.requires.is_empty() {
            parts.push(format!("requires:[{}]", f.requires.join(",")));
        }
        if !f.excludes.is_empty() {
            parts.push(format!("excludes:[{}]", f.excludes.join(",")));
        }

        let mut props: Vec<&str> = Vec::new();
        if f.hidden {
            props.push("hidden");
        }
        if f.hidden_in_short_help {
            props.push("hidden-in-short");
        }
        if f.positional_only {
            props.push("positional-only");
        }
        if f.flag_only {
            props.push("flag-only");
        }
        if f.bypass_validation {
            props.push("bypass-validation");
        }
        if !props.is_empty() {
            parts.push(format!("flags:[{}]", props.join(",")));
        }

        if !f.usage.is_empty() {
            parts.push(format!("usage:{:?}", f.usage));
        }
        parts.join(" ")
    }
}

fn dump_type(f: &Flag) -> String {
    let mut out = f.kind.type_name().to_string();
    if let Some(range) = f.kind.range_display() {
        out.push_str(&range.replace(", ", ","));
    }
    if let Some(values) = f.kind.enum_values() {
        out.push_str(&format!("{{{}}}", values.join(",")));
    }
    if let Some(pattern) = f.kind.regex_display() {
        out.push_str(&format!("~{pattern}"));
    }
    if f.kind.is_variadic() {
        out.push_str("(variadic)");
    }
    if let Some(sep) = f.kind.separator() {
        out.push_str(&format!(" sep:{sep:?}"));
    }
    out
}

/// Current value, only when it differs from the uninteresting baseline.
fn current_display(f: &Flag) -> Option<String> {
    let rendered = f.kind.render_value();
    if f.kind.is_bool() {
        let default_true = f.kind.render_default().as_deref() == Some("true");
        if rendered == "true" || default_true {
            return Some(rendered);
        }
        return None;
    }
    match rendered.as_str() {
        "" | "0" | "[]" => None,
        _ => Some(rendered),
    }
}
