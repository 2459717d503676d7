// Launch arguments and the one-time launch decision

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::Parser;

use crate::task_store::TaskRecord;

/// Daily "one big thing" reminder
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "one-big-thing", version, about, ignore_errors = true)]
pub struct LaunchArgs {
    /// Exit immediately without touching anything
    #[arg(long)]
    pub quit: bool,

    /// Ask for today's task if there is none yet, otherwise show the reminder
    #[arg(long)]
    pub prompt: bool,

    /// Write this process's PID to FILE once the reminder is on screen
    #[arg(long, value_name = "FILE", hide = true)]
    pub handoff_ready: Option<PathBuf>,

    /// Register a login item that runs `--prompt` every time you log in
    #[arg(long, conflicts_with = "disable_autostart")]
    pub enable_autostart: bool,

    /// Remove the login item
    #[arg(long)]
    pub disable_autostart: bool,
}

impl LaunchArgs {
    /// Parse from the process arguments. Unknown flags (such as the `-psn_*`
    /// argument some macOS launchers inject) are ignored.
    pub fn from_env() -> Self {
        Self::parse_args(std::env::args_os())
    }

    /// Parse `args` (program name first). Flags are found wherever they
    /// appear; anything unrecognized is dropped before clap sees it.
    pub fn parse_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(known_args(args))
    }

    pub fn autostart_change(&self) -> Option<bool> {
        if self.enable_autostart {
            Some(true)
        } else if self.disable_autostart {
            Some(false)
        } else {
            None
        }
    }
}

const FLAGS: &[&str] = &["--quit", "--prompt", "--enable-autostart", "--disable-autostart"];
const VALUE_FLAGS: &[&str] = &["--handoff-ready"];

enum ArgKind {
    Flag,
    /// Flag whose value is the next argument
    FlagThenValue,
    Unknown,
}

fn classify(arg: &OsStr) -> ArgKind {
    let Some(text) = arg.to_str() else {
        return ArgKind::Unknown;
    };
    if FLAGS.contains(&text) {
        return ArgKind::Flag;
    }
    if VALUE_FLAGS.contains(&text) {
        return ArgKind::FlagThenValue;
    }
    // `--handoff-ready=FILE`
    let inline_value = VALUE_FLAGS.iter().any(|flag| {
        text.strip_prefix(flag)
            .is_some_and(|rest| rest.starts_with('='))
    });
    if inline_value {
        ArgKind::Flag
    } else {
        ArgKind::Unknown
    }
}

/// Keep the program name and our own flags (with their values), in order
fn known_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut kept: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        match classify(&arg) {
            ArgKind::Flag => kept.push(arg),
            ArgKind::FlagThenValue => {
                if let Some(value) = args.next() {
                    kept.push(arg);
                    kept.push(value);
                }
            }
            ArgKind::Unknown => {}
        }
    }
    kept
}

/// What the process does after launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPlan {
    /// `--quit`: exit without reading the store
    Quit,
    /// No task for today yet: block the screen and ask for one
    BlockingPrompt,
    /// Show the floating reminder for this task
    FloatingReminder(TaskRecord),
    /// Nothing to remind about and no reason to prompt
    NothingToDo,
}

impl LaunchPlan {
    /// Decide once at launch. The store is only consulted (through
    /// `load_task`) when the arguments don't say to quit.
    pub fn decide<F>(args: &LaunchArgs, load_task: F) -> Self
    where
        F: FnOnce() -> Option<TaskRecord>,
    {
        if args.quit {
            return Self::Quit;
        }

        match (load_task(), args.prompt) {
            (Some(task), _) => Self::FloatingReminder(task),
            (None, true) => Self::BlockingPrompt,
            (None, false) => Self::NothingToDo,
        }
    }

    pub fn shows_surface(&self) -> bool {
        matches!(self, Self::BlockingPrompt | Self::FloatingReminder(_))
    }
}
