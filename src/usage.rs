//! Plain-text help rendering: synopsis, Commands, Arguments, and Global
//! options sections.

use crate::{cmd::Cmd, flag::FlagRef};

/// One row of a flag table. `name` is None for a name-shadowed global that is
/// only reachable through its short character.
struct Entry {
    flag: FlagRef,
    name: Option<String>,
    short: Option<char>,
}

impl Cmd {
    pub fn generate_usage(&self, long_help: bool) -> String {
        let mut out = String::new();
        if let Some(desc) = &self.description {
            out.push_str(desc);
            out.push_str("\n\n");
        }
        out.push_str(&self.usage_headers.usage);
        out.push_str("\n  ");
        out.push_str(&self.generate_synopsis(long_help));
        out.push('\n');
        out.push_str(&self.commands_section());
        let (script, global) = self.split_script_and_global();
        out.push_str(&self.flag_section(&self.usage_headers.arguments, &script, long_help));
        out.push_str(&self.flag_section(&self.usage_headers.global_options, &global, long_help));
        out
    }

    pub fn generate_short_usage(&self) -> String {
        self.generate_usage(false)
    }

    pub fn generate_long_usage(&self) -> String {
        self.generate_usage(true)
    }

    pub fn generate_synopsis(&self, long_help: bool) -> String {
        let mut out = String::new();
        if !self.exclude_name_from_usage {
            out.push_str(&self.name);
        }

        let visible = |name: &str| -> Option<FlagRef> {
            let flag = self.flags.get(name)?;
            let f = flag.borrow();
            if f.hidden || (!long_help && f.hidden_in_short_help) {
                return None;
            }
            drop(f);
            Some(flag.clone())
        };

        if !self.sub_cmds.is_empty() {
            out.push_str(" [subcommand]");
            for name in &self.positional {
                let Some(flag) = visible(name) else { continue };
                let f = flag.borrow();
                if !f.positional_only && f.kind.is_bool() {
                    continue;
                }
                let arg = if f.kind.is_variadic() { format!("{name}...") } else { name.clone() };
                if f.optional || f.kind.has_default() {
                    out.push_str(&format!(" [{arg}]"));
                } else {
                    out.push_str(&format!(" <{arg}>"));
                }
            }
            out.push_str(" [OPTIONS]");
            return out;
        }

        let mut positional_only: Vec<String> = Vec::new();
        let mut rest: Vec<String> = Vec::new();
        for name in &self.positional {
            let Some(flag) = visible(name) else { continue };
            let f = flag.borrow();
            if f.kind.is_bool() {
                continue;
            }
            if f.positional_only {
                positional_only.push(name.clone());
            } else {
                rest.push(name.clone());
            }
        }
        // Required named flags appear in the synopsis too.
        for name in &self.non_positional {
            if self.global_names.iter().any(|g| g == name) {
                continue;
            }
            let Some(flag) = visible(name) else { continue };
            let f = flag.borrow();
            if f.kind.is_bool() || f.optional {
                continue;
            }
            if !rest.contains(name) {
                rest.push(name.clone());
            }
        }

        for name in &positional_only {
            let flag = &self.flags[name];
            let f = flag.borrow();
            let variadic = f.kind.is_variadic();
            let arg = if variadic { format!("{name}...") } else { name.clone() };
            if f.optional || f.kind.has_default() {
                out.push_str(&format!(" [{arg}]"));
            } else {
                out.push_str(&format!(" <{arg}>"));
            }
            // Nothing can follow the first variadic positional.
            if variadic {
                out.push_str(" [OPTIONS]");
                return out;
            }
        }
        for name in &rest {
            let flag = &self.flags[name];
            let f = flag.borrow();
            if f.kind.is_variadic() {
                out.push_str(&format!(" [{name}...]"));
                out.push_str(" [OPTIONS]");
                return out;
            }
            if f.optional || f.kind.has_default() {
                out.push_str(&format!(" [{name}]"));
            } else {
                out.push_str(&format!(" <{name}>"));
            }
        }
        out.push_str(" [OPTIONS]");
        out
    }

    fn commands_section(&self) -> String {
        if self.sub_cmds.is_empty() {
            return String::new();
        }
        let mut out = format!("\n{}\n", self.usage_headers.commands);
        for (name, sub) in &self.sub_cmds {
            match &sub.description {
                Some(desc) => out.push_str(&format!("  {name:<30}{desc}\n")),
                None => out.push_str(&format!("  {name}\n")),
            }
        }
        out
    }

    /// Splits flags into the command's own table and the inherited-globals
    /// table, honoring the shadow bookkeeping: a local flag that took over a
    /// global's name belongs to the script table, the shadowed global shows
    /// short-only (or not at all when the local claimed both).
    fn split_script_and_global(&self) -> (Vec<Entry>, Vec<Entry>) {
        let mut script: Vec<Entry> = Vec::new();
        for name in self.registration_order() {
            let Some(flag) = self.flags.get(name) else { continue };
            let originally_global =
                self.global_names.iter().any(|g| g == name) && !self.shadowed_names.contains(name);
            if originally_global {
                continue;
            }
            script.push(Entry {
                flag: flag.clone(),
                name: Some(name.clone()),
                short: self.visible_short(name),
            });
        }

        let mut global: Vec<Entry> = Vec::new();
        for name in &self.global_names {
            if self.shadowed_names.contains(name) {
                // Residual presence through the short alone, if any survived.
                let residual = self
                    .overridden_shorts
                    .iter()
                    .find(|(_, owner)| *owner == name)
                    .map(|(ch, _)| *ch);
                let (Some(ch), Some(flag)) = (residual, self.overridden_globals.get(name)) else {
                    continue;
                };
                global.push(Entry { flag: flag.clone(), name: None, short: Some(ch) });
                continue;
            }
            let Some(flag) = self.flags.get(name) else { continue };
            global.push(Entry {
                flag: flag.clone(),
                name: Some(name.clone()),
                short: self.visible_short(name),
            });
        }
        (script, global)
    }

    fn flag_section(&self, header: &str, entries: &[Entry], long_help: bool) -> String {
        let body = self.format_flags(entries, long_help);
        if body.is_empty() {
            return String::new();
        }
        format!("\n{header}\n{body}")
    }

    fn format_flags(&self, entries: &[Entry], long_help: bool) -> String {
        // First pass computes the left column for alignment.
        let mut parts: Vec<String> = Vec::new();
        let mut width = 0;
        for entry in entries {
            let f = entry.flag.borrow();
            if f.hidden || (!long_help && f.hidden_in_short_help) {
                parts.push(String::new());
                continue;
            }
            let mut part = match (&entry.name, entry.short) {
                _ if f.positional_only => format!("  {}", entry.name.as_deref().unwrap_or("")),
                (None, Some(ch)) => format!("  -{ch}"),
                (Some(name), Some(ch)) => format!("  -{ch}, --{name}"),
                (Some(name), None) => format!("      --{name}"),
                (None, None) => "  (unnamed flag)".to_string(),
            };
            let type_str = f
                .custom_usage_type
                .clone()
                .unwrap_or_else(|| usage_type(&f.kind));
            if type_str != "bool" {
                part = format!("{part} {type_str}");
            }
            width = width.max(part.len());
            parts.push(part);
        }
        width += 3;

        let mut out = String::new();
        for (entry, part) in entries.iter().zip(&parts) {
            if part.is_empty() {
                continue;
            }
            let f = entry.flag.borrow();
            out.push_str(part);

            let constraints = constraint_string(&f);
            if !f.usage.is_empty() || !constraints.is_empty() {
                let padding = (width.saturating_sub(part.len())).max(1);
                out.push_str(&" ".repeat(padding));

                let has_default = f.kind.has_default() || !f.kind.requirable();
                let show_optional = if f.positional_only {
                    f.optional
                } else {
                    f.optional && !has_default
                };
                if show_optional && !f.kind.is_variadic() {
                    out.push_str("(optional) ");
                }

                if !f.usage.is_empty() {
                    out.push_str(&f.usage);
                    if !constraints.is_empty() {
                        if f.usage.ends_with('.') {
                            out.push(' ');
                        } else {
                            out.push_str(". ");
                        }
                    }
                }
                out.push_str(&constraints);
            }
            out.push('\n');
        }
        out
    }
}

fn usage_type(kind: &crate::flag::Kind) -> String {
    if kind.is_variadic() {
        format!("[{}...]", kind.type_name())
    } else {
        kind.type_name().to_string()
    }
}

fn constraint_string(f: &crate::flag::Flag) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(range) = f.kind.range_display() {
        parts.push(format!("Range: {range}"));
    }
    if let Some(values) = f.kind.enum_values() {
        if !values.is_empty() {
            parts.push(format!("Valid values: [{}]", values.join(", ")));
        }
    }
    if let Some(pattern) = f.kind.regex_display() {
        parts.push(format!("Regex: {pattern}"));
    }
    if let Some(sep) = f.kind.separator() {
        parts.push(format!("Separator: \"{sep}\""));
    }
    if !f.requires.is_empty() {
        parts.push(format!("Requires: {}", f.requires.join(", ")));
    }
    if !f.excludes.is_empty() {
        parts.push(format!("Excludes: {}", f.excludes.join(", ")));
    }
    let mut out = parts.join(". ");
    if let Some(default) = default_display(&f.kind) {
        if out.is_empty() {
            out = format!("(default {default})");
        } else {
            out = format!("{out} (default {default})");
        }
    }
    out
}

/// Defaults worth surfacing: a false bool default and an empty list default
/// are indistinguishable from the implicit ones, so they stay silent.
fn default_display(kind: &crate::flag::Kind) -> Option<String> {
    let rendered = kind.render_default()?;
    if kind.is_bool() && rendered == "false" {
        return None;
    }
    if rendered == "[]" {
        return None;
    }
    Some(rendered)
}
