//! Dual-nature command line arguments: every declared argument can be supplied
//! positionally or as a named flag, interchangeably.
//!
//! ```
//! let mut cmd = dflags::Cmd::new("greet");
//! let name = dflags::StrFlag::new("name").register(&mut cmd).unwrap();
//! let loud = dflags::BoolFlag::new("loud").short('l').register(&mut cmd).unwrap();
//!
//! cmd.parse(["world", "-l"]).unwrap();
//! assert_eq!(name.get(), "world");
//! assert!(loud.get());
//! ```
//!
//! Commands form a tree; a flag registered as global on a parent is shared by
//! reference with every subcommand, so a write from deep in the tree is
//! visible from the root. Help, a diagnostic dump, and shell completion
//! surface as sentinel [`Error`] variants rather than in-band output, which
//! keeps [`Cmd::parse`] pure; [`Cmd::parse_or_exit_with`] renders them
//! through caller-supplied sinks.

use std::io::Write;

pub use crate::{
    cmd::{Cmd, UsageHeaders},
    complete::Directive,
    flag::{
        Binding, BoolFlag, BoolListFlag, Completer, FlagValue, FloatFlag, FloatListFlag, Int64Flag,
        Int64ListFlag, IntFlag, IntListFlag, RegisterOptions, StrFlag, StrListFlag,
    },
    parse::ParseOptions,
};

mod cmd;
mod complete;
mod dump;
mod flag;
mod parse;
mod shell;
mod token;
mod usage;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything a parse or registration call can report.
///
/// Three families: user input errors, configuration errors (bugs in the
/// calling code, not in the input), and control-flow sentinels that are not
/// failures at all — callers branch on them and exit zero.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown flag: --{0}")]
    UnknownFlag(String),
    #[error("unknown shorthand flag: '{0}' in -{0}")]
    UnknownShort(char),
    #[error("flag {0} requires a value")]
    MissingValue(String),
    #[error("{0}")]
    InvalidValue(String),
    #[error("non-bool flag -{0} must be last in cluster")]
    NonBoolInCluster(char),
    #[error("{0}")]
    Relational(String),
    #[error("Missing required arguments: [{}]", .0.join(", "))]
    MissingRequired(Vec<String>),
    #[error("Too many positional arguments. Unused: [{0}]")]
    TooManyPositional(String),
    /// Library misuse: duplicate registrations, defaults violating their own
    /// constraints, dangling `requires`/`excludes` references.
    #[error("{0}")]
    Config(String),
    #[error("help invoked")]
    HelpRequested(HelpRequest),
    #[error("dump invoked")]
    DumpRequested,
    #[error("completion invoked")]
    CompletionRequested(Completions),
}

impl Error {
    /// Sentinels signal a terminal condition, not a failure.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            Error::HelpRequested(_) | Error::DumpRequested | Error::CompletionRequested(_)
        )
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_sentinel() {
            0
        } else {
            1
        }
    }

    /// Conditions that permissive mode collects instead of aborting on.
    pub(crate) fn demotable(&self) -> bool {
        matches!(
            self,
            Error::UnknownFlag(_) | Error::UnknownShort(_) | Error::TooManyPositional(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpRequest {
    /// `--help` asked for the long form; `-h` and auto-help use the short one.
    pub long: bool,
    /// Triggered by an empty invocation of a command with required flags.
    pub auto: bool,
}

/// Payload of the completion sentinel: what `__complete` computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completions {
    pub candidates: Vec<String>,
    pub directive: Directive,
}

impl Completions {
    /// Renders the shell wire protocol: candidate lines, then `:<directive>`.
    pub fn render(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for candidate in &self.candidates {
            writeln!(out, "{candidate}")?;
        }
        writeln!(out, ":{}", self.directive.bits())
    }
}

/// Injectable process boundary for [`Cmd::parse_or_exit_with`].
///
/// Tests hand in buffers and a recording exit closure; production code uses
/// the real streams via [`Cmd::parse_or_exit`].
pub struct Io<'a> {
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
    pub exit: &'a mut dyn FnMut(i32),
}
