use std::{cell::RefCell, fmt, marker::PhantomData, rc::Rc, str::FromStr};

use regex::Regex;

use crate::{cmd::Cmd, complete::Directive, Error, Result};

/// Custom completion source for one flag: gets the prefix typed so far,
/// returns candidates plus a directive for the shell.
pub type Completer = Rc<dyn Fn(&str) -> (Vec<String>, Directive)>;

pub(crate) type FlagRef = Rc<RefCell<Flag>>;

/// The canonical flag record. The defining `Cmd` owns the `Rc`; subcommands
/// alias it, which is what makes global-flag writes visible across the tree.
pub(crate) struct Flag {
    pub(crate) name: String,
    pub(crate) short: Option<char>,
    pub(crate) usage: String,
    pub(crate) custom_usage_type: Option<String>,
    pub(crate) optional: bool,
    pub(crate) hidden: bool,
    pub(crate) hidden_in_short_help: bool,
    pub(crate) positional_only: bool,
    pub(crate) flag_only: bool,
    pub(crate) requires: Vec<String>,
    pub(crate) excludes: Vec<String>,
    pub(crate) bypass_validation: bool,
    pub(crate) completer: Option<Completer>,
    pub(crate) kind: Kind,
}

#[doc(hidden)]
pub struct Scalar<T> {
    pub(crate) value: T,
    pub(crate) default: Option<T>,
}

/// Min/max bound plus whether it is inclusive.
#[doc(hidden)]
pub struct NumBounds<T> {
    pub(crate) min: Option<(T, bool)>,
    pub(crate) max: Option<(T, bool)>,
}

#[doc(hidden)]
pub struct StrChecks {
    pub(crate) one_of: Option<Vec<String>>,
    pub(crate) pattern: Option<Regex>,
}

#[doc(hidden)]
pub struct ListSlot<T> {
    pub(crate) values: Vec<T>,
    pub(crate) default: Option<Vec<T>>,
    pub(crate) separator: Option<String>,
    pub(crate) variadic: bool,
}

/// Closed set of flag kinds, carrying constraints, default, and the current
/// value. Every kind dispatch in the crate goes through the methods below;
/// no other module matches on the variants.
#[doc(hidden)]
pub enum Kind {
    Bool(Scalar<bool>),
    Str(Scalar<String>, StrChecks),
    Int(Scalar<i32>, NumBounds<i32>),
    Int64(Scalar<i64>, NumBounds<i64>),
    Float(Scalar<f64>, NumBounds<f64>),
    StrList(ListSlot<String>),
    IntList(ListSlot<i32>),
    Int64List(ListSlot<i64>),
    FloatList(ListSlot<f64>),
    BoolList(ListSlot<bool>),
}

/// Permissive bool literals: true/false in any case, plus 1/0.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" => Some(true),
        "0" => Some(false),
        _ => match value.to_ascii_lowercase().as_str() {
            "true" | "t" => Some(true),
            "false" | "f" => Some(false),
            _ => None,
        },
    }
}

fn bounds_violation<T: PartialOrd + fmt::Display + Copy>(
    val: T,
    bounds: &NumBounds<T>,
) -> Option<String> {
    if let Some((min, inclusive)) = bounds.min {
        if inclusive && val < min {
            return Some(format!("is < minimum {min}"));
        }
        if !inclusive && val <= min {
            return Some(format!("is <= minimum (exclusive) {min}"));
        }
    }
    if let Some((max, inclusive)) = bounds.max {
        if inclusive && val > max {
            return Some(format!("is > maximum {max}"));
        }
        if !inclusive && val >= max {
            return Some(format!("is >= maximum (exclusive) {max}"));
        }
    }
    None
}

fn parse_num<T>(name: &str, what: &str, value: &str, bounds: &NumBounds<T>) -> Result<T>
where
    T: FromStr + PartialOrd + fmt::Display + Copy,
{
    let val: T = value
        .parse()
        .map_err(|_| Error::InvalidValue(format!("invalid {what} value for {name}: {value}")))?;
    if let Some(msg) = bounds_violation(val, bounds) {
        return Err(Error::InvalidValue(format!("'{name}' value {val} {msg}")));
    }
    Ok(val)
}

fn check_str(name: &str, value: &str, checks: &StrChecks) -> Result<()> {
    if let Some(allowed) = &checks.one_of {
        if !allowed.iter().any(|a| a == value) {
            return Err(Error::InvalidValue(format!(
                "Invalid '{name}' value: {value} (valid values: {})",
                allowed.join(", ")
            )));
        }
    }
    if let Some(pattern) = &checks.pattern {
        if !pattern.is_match(value) {
            return Err(Error::InvalidValue(format!(
                "Invalid '{name}' value: {value} (must match regex: {pattern})"
            )));
        }
    }
    Ok(())
}

fn split_items<'v>(value: &'v str, separator: &Option<String>) -> Vec<&'v str> {
    match separator {
        Some(sep) => value.split(sep.as_str()).collect(),
        None => vec![value],
    }
}

impl Kind {
    pub(crate) fn is_bool(&self) -> bool {
        matches!(self, Kind::Bool(_))
    }

    pub(crate) fn is_list(&self) -> bool {
        matches!(
            self,
            Kind::StrList(_)
                | Kind::IntList(_)
                | Kind::Int64List(_)
                | Kind::FloatList(_)
                | Kind::BoolList(_)
        )
    }

    pub(crate) fn is_variadic(&self) -> bool {
        match self {
            Kind::StrList(s) => s.variadic,
            Kind::IntList(s) => s.variadic,
            Kind::Int64List(s) => s.variadic,
            Kind::FloatList(s) => s.variadic,
            Kind::BoolList(s) => s.variadic,
            _ => false,
        }
    }

    /// Kinds that support short-flag repetition counting (`-vvv`).
    pub(crate) fn is_countable(&self) -> bool {
        matches!(self, Kind::Int(..) | Kind::Int64(..))
    }

    /// Bools implicitly default to false and bool lists to empty, so neither
    /// can be required; variadic lists likewise.
    pub(crate) fn requirable(&self) -> bool {
        match self {
            Kind::Bool(_) | Kind::BoolList(_) => false,
            Kind::StrList(s) => !s.variadic,
            Kind::IntList(s) => !s.variadic,
            Kind::Int64List(s) => !s.variadic,
            Kind::FloatList(s) => !s.variadic,
            _ => true,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Kind::Bool(_) => "bool",
            Kind::Str(..) => "str",
            Kind::Int(..) => "int",
            Kind::Int64(..) => "int64",
            Kind::Float(..) => "float",
            Kind::StrList(_) => "strs",
            Kind::IntList(_) => "ints",
            Kind::Int64List(_) => "int64s",
            Kind::FloatList(_) => "floats",
            Kind::BoolList(_) => "bools",
        }
    }

    pub(crate) fn has_default(&self) -> bool {
        match self {
            Kind::Bool(s) => s.default.is_some(),
            Kind::Str(s, _) => s.default.is_some(),
            Kind::Int(s, _) => s.default.is_some(),
            Kind::Int64(s, _) => s.default.is_some(),
            Kind::Float(s, _) => s.default.is_some(),
            Kind::StrList(s) => s.default.is_some(),
            Kind::IntList(s) => s.default.is_some(),
            Kind::Int64List(s) => s.default.is_some(),
            Kind::FloatList(s) => s.default.is_some(),
            Kind::BoolList(s) => s.default.is_some(),
        }
    }

    /// Resets the value to the default. Lists without a default reset to
    /// empty, so a stale value from an earlier parse never leaks through.
    pub(crate) fn apply_default(&mut self) {
        fn scalar<T: Clone>(s: &mut Scalar<T>) {
            if let Some(d) = &s.default {
                s.value = d.clone();
            }
        }
        fn list<T: Clone>(s: &mut ListSlot<T>) {
            s.values = s.default.clone().unwrap_or_default();
        }
        match self {
            Kind::Bool(s) => scalar(s),
            Kind::Str(s, _) => scalar(s),
            Kind::Int(s, _) => scalar(s),
            Kind::Int64(s, _) => scalar(s),
            Kind::Float(s, _) => scalar(s),
            Kind::StrList(s) => list(s),
            Kind::IntList(s) => list(s),
            Kind::Int64List(s) => list(s),
            Kind::FloatList(s) => list(s),
            Kind::BoolList(s) => list(s),
        }
    }

    /// Validates a configured default against the kind's own constraints.
    /// Returns the violation message; the caller wraps it with the flag name.
    pub(crate) fn check_default(&self) -> Result<(), String> {
        fn num<T: PartialOrd + fmt::Display + Copy>(
            s: &Scalar<T>,
            b: &NumBounds<T>,
        ) -> Result<(), String> {
            match s.default {
                Some(d) => match bounds_violation(d, b) {
                    Some(msg) => Err(format!("value {d} {msg}")),
                    None => Ok(()),
                },
                None => Ok(()),
            }
        }
        match self {
            Kind::Int(s, b) => num(s, b),
            Kind::Int64(s, b) => num(s, b),
            Kind::Float(s, b) => num(s, b),
            Kind::Str(s, checks) => {
                let Some(d) = &s.default else { return Ok(()) };
                if let Some(allowed) = &checks.one_of {
                    if !allowed.iter().any(|a| a == d) {
                        return Err(format!(
                            "value \"{d}\" not in allowed enum values [{}]",
                            allowed.join(", ")
                        ));
                    }
                }
                if let Some(pattern) = &checks.pattern {
                    if !pattern.is_match(d) {
                        return Err(format!(
                            "value \"{d}\" does not match regex pattern {pattern}"
                        ));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Binds one token to a scalar kind, running per-value checks.
    pub(crate) fn set_scalar(&mut self, name: &str, value: &str) -> Result<()> {
        match self {
            Kind::Bool(s) => {
                s.value = parse_bool(value).ok_or_else(|| {
                    Error::InvalidValue(format!("invalid bool value for {name}: {value}"))
                })?;
                Ok(())
            }
            Kind::Str(s, checks) => {
                check_str(name, value, checks)?;
                s.value = value.to_string();
                Ok(())
            }
            Kind::Int(s, b) => {
                s.value = parse_num(name, "integer", value, b)?;
                Ok(())
            }
            Kind::Int64(s, b) => {
                s.value = parse_num(name, "int64", value, b)?;
                Ok(())
            }
            Kind::Float(s, b) => {
                s.value = parse_num(name, "float", value, b)?;
                Ok(())
            }
            _ => Err(Error::Config(format!(
                "flag \"{name}\" is a list, cannot bind a scalar value"
            ))),
        }
    }

    /// Appends one token to a list kind, splitting on the separator if set.
    pub(crate) fn append_list(&mut self, name: &str, value: &str) -> Result<()> {
        match self {
            Kind::StrList(s) => {
                for item in split_items(value, &s.separator) {
                    s.values.push(item.to_string());
                }
                Ok(())
            }
            Kind::IntList(s) => {
                for item in split_items(value, &s.separator) {
                    let v: i32 = item.parse().map_err(|_| {
                        Error::InvalidValue(format!("invalid integer value for {name}: {item}"))
                    })?;
                    s.values.push(v);
                }
                Ok(())
            }
            Kind::Int64List(s) => {
                for item in split_items(value, &s.separator) {
                    let v: i64 = item.parse().map_err(|_| {
                        Error::InvalidValue(format!("invalid int64 value for {name}: {item}"))
                    })?;
                    s.values.push(v);
                }
                Ok(())
            }
            Kind::FloatList(s) => {
                for item in split_items(value, &s.separator) {
                    let v: f64 = item.parse().map_err(|_| {
                        Error::InvalidValue(format!("invalid float value for {name}: {item}"))
                    })?;
                    s.values.push(v);
                }
                Ok(())
            }
            Kind::BoolList(s) => {
                for item in split_items(value, &s.separator) {
                    let v = parse_bool(item).ok_or_else(|| {
                        Error::InvalidValue(format!("invalid bool value for {name}: {item}"))
                    })?;
                    s.values.push(v);
                }
                Ok(())
            }
            _ => Err(Error::Config(format!(
                "flag \"{name}\" is not a list, cannot append"
            ))),
        }
    }

    /// Drops accumulated values so the first user-supplied token replaces a
    /// configured default wholesale instead of appending to it.
    pub(crate) fn clear_list(&mut self) {
        match self {
            Kind::StrList(s) => s.values.clear(),
            Kind::IntList(s) => s.values.clear(),
            Kind::Int64List(s) => s.values.clear(),
            Kind::FloatList(s) => s.values.clear(),
            Kind::BoolList(s) => s.values.clear(),
            _ => {}
        }
    }

    pub(crate) fn set_bool(&mut self, v: bool) {
        if let Kind::Bool(s) = self {
            s.value = v;
        }
    }

    /// Repetition count for `-vvv` style shorts; false for non-counting kinds.
    pub(crate) fn set_count(&mut self, n: usize) -> bool {
        match self {
            Kind::Int(s, _) => {
                s.value = n as i32;
                true
            }
            Kind::Int64(s, _) => {
                s.value = n as i64;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn bool_value(&self) -> Option<bool> {
        match self {
            Kind::Bool(s) => Some(s.value),
            _ => None,
        }
    }

    pub(crate) fn enum_values(&self) -> Option<&[String]> {
        match self {
            Kind::Str(_, checks) => checks.one_of.as_deref(),
            _ => None,
        }
    }

    /// Interval notation for numeric bounds: `[0, 10]`, `(0, )`, ...
    pub(crate) fn range_display(&self) -> Option<String> {
        fn range<T: fmt::Display + Copy>(b: &NumBounds<T>) -> Option<String> {
            if b.min.is_none() && b.max.is_none() {
                return None;
            }
            let left = match b.min {
                Some((v, true)) => format!("[{v}"),
                Some((v, false)) => format!("({v}"),
                None => "(".to_string(),
            };
            let right = match b.max {
                Some((v, true)) => format!("{v}]"),
                Some((v, false)) => format!("{v})"),
                None => ")".to_string(),
            };
            Some(format!("{left}, {right}"))
        }
        match self {
            Kind::Int(_, b) => range(b),
            Kind::Int64(_, b) => range(b),
            Kind::Float(_, b) => range(b),
            _ => None,
        }
    }

    pub(crate) fn regex_display(&self) -> Option<String> {
        match self {
            Kind::Str(_, checks) => checks.pattern.as_ref().map(|p| p.to_string()),
            _ => None,
        }
    }

    pub(crate) fn separator(&self) -> Option<&str> {
        match self {
            Kind::StrList(s) => s.separator.as_deref(),
            Kind::IntList(s) => s.separator.as_deref(),
            Kind::Int64List(s) => s.separator.as_deref(),
            Kind::FloatList(s) => s.separator.as_deref(),
            Kind::BoolList(s) => s.separator.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn render_value(&self) -> String {
        fn list<T: fmt::Display>(values: &[T]) -> String {
            let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            format!("[{}]", items.join(", "))
        }
        match self {
            Kind::Bool(s) => s.value.to_string(),
            Kind::Str(s, _) => s.value.clone(),
            Kind::Int(s, _) => s.value.to_string(),
            Kind::Int64(s, _) => s.value.to_string(),
            Kind::Float(s, _) => s.value.to_string(),
            Kind::StrList(s) => list(&s.values),
            Kind::IntList(s) => list(&s.values),
            Kind::Int64List(s) => list(&s.values),
            Kind::FloatList(s) => list(&s.values),
            Kind::BoolList(s) => list(&s.values),
        }
    }

    pub(crate) fn render_default(&self) -> Option<String> {
        fn list<T: fmt::Display>(values: &Option<Vec<T>>) -> Option<String> {
            values.as_ref().map(|vs| {
                let items: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                format!("[{}]", items.join(", "))
            })
        }
        match self {
            Kind::Bool(s) => s.default.map(|d| d.to_string()),
            Kind::Str(s, _) => s.default.clone(),
            Kind::Int(s, _) => s.default.map(|d| d.to_string()),
            Kind::Int64(s, _) => s.default.map(|d| d.to_string()),
            Kind::Float(s, _) => s.default.map(|d| d.to_string()),
            Kind::StrList(s) => list(&s.default),
            Kind::IntList(s) => list(&s.default),
            Kind::Int64List(s) => list(&s.default),
            Kind::FloatList(s) => list(&s.default),
            Kind::BoolList(s) => list(&s.default),
        }
    }
}

/// Typed handle onto a registered flag's shared value slot.
///
/// Reads go through the canonical record, so a value bound anywhere in the
/// command tree (for globals) is observable from any handle.
pub struct Binding<T> {
    slot: FlagRef,
    _ty: PhantomData<T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Binding { slot: self.slot.clone(), _ty: PhantomData }
    }
}

impl<T: FlagValue> Binding<T> {
    pub fn get(&self) -> T {
        T::extract(&self.slot.borrow().kind)
    }
}

/// Value types extractable from a [`Binding`]. Implemented for exactly the
/// types the flag kinds produce.
pub trait FlagValue: Sized {
    #[doc(hidden)]
    fn extract(kind: &Kind) -> Self;
}

macro_rules! flag_value {
    ($ty:ty, $variant:ident, $field:ident) => {
        impl FlagValue for $ty {
            fn extract(kind: &Kind) -> Self {
                match kind {
                    Kind::$variant(s, ..) => s.$field.clone(),
                    _ => unreachable!("flag kind and binding type diverged"),
                }
            }
        }
    };
}

flag_value!(bool, Bool, value);
flag_value!(String, Str, value);
flag_value!(i32, Int, value);
flag_value!(i64, Int64, value);
flag_value!(f64, Float, value);
flag_value!(Vec<String>, StrList, values);
flag_value!(Vec<i32>, IntList, values);
flag_value!(Vec<i64>, Int64List, values);
flag_value!(Vec<f64>, FloatList, values);
flag_value!(Vec<bool>, BoolList, values);

/// Options applied at registration time, not carried on the builder: whether
/// the flag is global (shared with subcommands) and whether a configured
/// occurrence of it bypasses relational/required validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOptions {
    pub(crate) global: bool,
    pub(crate) bypass_validation: bool,
}

impl RegisterOptions {
    pub fn new() -> RegisterOptions {
        RegisterOptions::default()
    }

    pub fn global(mut self, yes: bool) -> RegisterOptions {
        self.global = yes;
        self
    }

    pub fn bypass_validation(mut self, yes: bool) -> RegisterOptions {
        self.bypass_validation = yes;
        self
    }
}

/// Fluent flag builder; `K` carries the kind-specific data. Use the aliases
/// ([`BoolFlag`], [`StrFlag`], [`IntFlag`], ...) rather than this type
/// directly.
pub struct FlagBuilder<K> {
    name: String,
    short: Option<char>,
    usage: String,
    custom_usage_type: Option<String>,
    optional: bool,
    hidden: bool,
    hidden_in_short_help: bool,
    positional_only: bool,
    flag_only: bool,
    requires: Vec<String>,
    excludes: Vec<String>,
    completer: Option<Completer>,
    kind: K,
}

pub type BoolFlag = FlagBuilder<BoolSpec>;
pub type StrFlag = FlagBuilder<StrSpec>;
pub type IntFlag = FlagBuilder<NumSpec<i32>>;
pub type Int64Flag = FlagBuilder<NumSpec<i64>>;
pub type FloatFlag = FlagBuilder<NumSpec<f64>>;
pub type StrListFlag = FlagBuilder<ListSpec<String>>;
pub type IntListFlag = FlagBuilder<ListSpec<i32>>;
pub type Int64ListFlag = FlagBuilder<ListSpec<i64>>;
pub type FloatListFlag = FlagBuilder<ListSpec<f64>>;
pub type BoolListFlag = FlagBuilder<ListSpec<bool>>;

#[derive(Default)]
pub struct BoolSpec {
    default: Option<bool>,
}

#[derive(Default)]
pub struct StrSpec {
    default: Option<String>,
    one_of: Option<Vec<String>>,
    pattern: Option<Regex>,
}

pub struct NumSpec<T> {
    default: Option<T>,
    min: Option<(T, bool)>,
    max: Option<(T, bool)>,
}

impl<T> Default for NumSpec<T> {
    fn default() -> Self {
        NumSpec { default: None, min: None, max: None }
    }
}

pub struct ListSpec<T> {
    default: Option<Vec<T>>,
    separator: Option<String>,
    variadic: bool,
}

impl<T> Default for ListSpec<T> {
    fn default() -> Self {
        ListSpec { default: None, separator: None, variadic: false }
    }
}

impl<K: Default> FlagBuilder<K> {
    fn with_name(name: impl Into<String>) -> FlagBuilder<K> {
        FlagBuilder {
            name: name.into(),
            short: None,
            usage: String::new(),
            custom_usage_type: None,
            optional: false,
            hidden: false,
            hidden_in_short_help: false,
            positional_only: false,
            flag_only: false,
            requires: Vec::new(),
            excludes: Vec::new(),
            completer: None,
            kind: K::default(),
        }
    }
}

impl<K> FlagBuilder<K> {
    pub fn short(mut self, ch: char) -> Self {
        self.short = Some(ch);
        self
    }

    pub fn usage(mut self, text: impl Into<String>) -> Self {
        self.usage = text.into();
        self
    }

    /// Overrides the auto-detected type string in help output.
    pub fn custom_usage_type(mut self, ty: impl Into<String>) -> Self {
        self.custom_usage_type = Some(ty.into());
        self
    }

    pub fn optional(mut self, yes: bool) -> Self {
        self.optional = yes;
        self
    }

    pub fn hidden(mut self, yes: bool) -> Self {
        self.hidden = yes;
        self
    }

    pub fn hidden_in_short_help(mut self, yes: bool) -> Self {
        self.hidden_in_short_help = yes;
        self
    }

    pub fn positional_only(mut self, yes: bool) -> Self {
        self.positional_only = yes;
        self
    }

    pub fn flag_only(mut self, yes: bool) -> Self {
        self.flag_only = yes;
        self
    }

    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn excludes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn completer(
        mut self,
        f: impl Fn(&str) -> (Vec<String>, Directive) + 'static,
    ) -> Self {
        self.completer = Some(Rc::new(f));
        self
    }

    fn finish<T: FlagValue>(
        self,
        cmd: &mut Cmd,
        opts: RegisterOptions,
        kind: Kind,
    ) -> Result<Binding<T>> {
        let flag = Flag {
            name: self.name,
            short: self.short,
            usage: self.usage,
            custom_usage_type: self.custom_usage_type,
            optional: self.optional,
            hidden: self.hidden,
            hidden_in_short_help: self.hidden_in_short_help,
            positional_only: self.positional_only,
            flag_only: self.flag_only,
            requires: self.requires,
            excludes: self.excludes,
            bypass_validation: false,
            completer: self.completer,
            kind,
        };
        let slot = cmd.insert_flag(flag, opts)?;
        Ok(Binding { slot, _ty: PhantomData })
    }
}

impl BoolFlag {
    pub fn new(name: impl Into<String>) -> BoolFlag {
        FlagBuilder::with_name(name)
    }

    pub fn default(mut self, v: bool) -> Self {
        self.kind.default = Some(v);
        self
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<bool>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<bool>> {
        let kind = Kind::Bool(Scalar { value: false, default: self.kind.default });
        self.finish(cmd, opts, kind)
    }
}

impl StrFlag {
    pub fn new(name: impl Into<String>) -> StrFlag {
        FlagBuilder::with_name(name)
    }

    pub fn default(mut self, v: impl Into<String>) -> Self {
        self.kind.default = Some(v.into());
        self
    }

    /// Restricts values to a fixed set. An empty set removes the constraint.
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.kind.one_of = if values.is_empty() { None } else { Some(values) };
        self
    }

    pub fn regex(mut self, pattern: Regex) -> Self {
        self.kind.pattern = Some(pattern);
        self
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<String>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<String>> {
        let kind = Kind::Str(
            Scalar { value: String::new(), default: self.kind.default.clone() },
            StrChecks { one_of: self.kind.one_of.clone(), pattern: self.kind.pattern.clone() },
        );
        self.finish(cmd, opts, kind)
    }
}

impl<T: Copy> FlagBuilder<NumSpec<T>> {
    pub fn default(mut self, v: T) -> Self {
        self.kind.default = Some(v);
        self
    }

    pub fn min(mut self, v: T, inclusive: bool) -> Self {
        self.kind.min = Some((v, inclusive));
        self
    }

    pub fn max(mut self, v: T, inclusive: bool) -> Self {
        self.kind.max = Some((v, inclusive));
        self
    }
}

impl IntFlag {
    pub fn new(name: impl Into<String>) -> IntFlag {
        FlagBuilder::with_name(name)
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<i32>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<i32>> {
        let kind = Kind::Int(
            Scalar { value: 0, default: self.kind.default },
            NumBounds { min: self.kind.min, max: self.kind.max },
        );
        self.finish(cmd, opts, kind)
    }
}

impl Int64Flag {
    pub fn new(name: impl Into<String>) -> Int64Flag {
        FlagBuilder::with_name(name)
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<i64>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<i64>> {
        let kind = Kind::Int64(
            Scalar { value: 0, default: self.kind.default },
            NumBounds { min: self.kind.min, max: self.kind.max },
        );
        self.finish(cmd, opts, kind)
    }
}

impl FloatFlag {
    pub fn new(name: impl Into<String>) -> FloatFlag {
        FlagBuilder::with_name(name)
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<f64>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<f64>> {
        let kind = Kind::Float(
            Scalar { value: 0.0, default: self.kind.default },
            NumBounds { min: self.kind.min, max: self.kind.max },
        );
        self.finish(cmd, opts, kind)
    }
}

impl<T> FlagBuilder<ListSpec<T>> {
    pub fn default<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        self.kind.default = Some(values.into_iter().collect());
        self
    }

    /// Splits each supplied value on this separator before appending.
    pub fn separator(mut self, sep: impl Into<String>) -> Self {
        self.kind.separator = Some(sep.into());
        self
    }

    /// Variadic lists greedily consume a run of positional tokens.
    pub fn variadic(mut self, yes: bool) -> Self {
        self.kind.variadic = yes;
        self
    }

    fn into_slot(self) -> (FlagBuilder<ListSpec<T>>, ListSlot<T>) {
        let slot = ListSlot {
            values: Vec::new(),
            default: None,
            separator: self.kind.separator.clone(),
            variadic: self.kind.variadic,
        };
        (self, slot)
    }
}

impl StrListFlag {
    pub fn new(name: impl Into<String>) -> StrListFlag {
        FlagBuilder::with_name(name)
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<Vec<String>>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(
        self,
        cmd: &mut Cmd,
        opts: RegisterOptions,
    ) -> Result<Binding<Vec<String>>> {
        let (this, mut slot) = self.into_slot();
        slot.default = this.kind.default.clone();
        this.finish(cmd, opts, Kind::StrList(slot))
    }
}

impl IntListFlag {
    pub fn new(name: impl Into<String>) -> IntListFlag {
        FlagBuilder::with_name(name)
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<Vec<i32>>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<Vec<i32>>> {
        let (this, mut slot) = self.into_slot();
        slot.default = this.kind.default.clone();
        this.finish(cmd, opts, Kind::IntList(slot))
    }
}

impl Int64ListFlag {
    pub fn new(name: impl Into<String>) -> Int64ListFlag {
        FlagBuilder::with_name(name)
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<Vec<i64>>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<Vec<i64>>> {
        let (this, mut slot) = self.into_slot();
        slot.default = this.kind.default.clone();
        this.finish(cmd, opts, Kind::Int64List(slot))
    }
}

impl FloatListFlag {
    pub fn new(name: impl Into<String>) -> FloatListFlag {
        FlagBuilder::with_name(name)
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<Vec<f64>>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<Vec<f64>>> {
        let (this, mut slot) = self.into_slot();
        slot.default = this.kind.default.clone();
        this.finish(cmd, opts, Kind::FloatList(slot))
    }
}

impl BoolListFlag {
    pub fn new(name: impl Into<String>) -> BoolListFlag {
        FlagBuilder::with_name(name)
    }

    pub fn register(self, cmd: &mut Cmd) -> Result<Binding<Vec<bool>>> {
        self.register_with(cmd, RegisterOptions::new())
    }

    pub fn register_with(self, cmd: &mut Cmd, opts: RegisterOptions) -> Result<Binding<Vec<bool>>> {
        let (this, mut slot) = self.into_slot();
        slot.default = this.kind.default.clone();
        this.finish(cmd, opts, Kind::BoolList(slot))
    }
}
