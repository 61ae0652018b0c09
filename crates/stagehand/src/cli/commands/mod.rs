//! CLI commands

mod cleanup;
mod completions;
mod intake;
mod list;
mod normalize;
mod publish;

pub use cleanup::CleanupCommand;
pub use completions::CompletionsCommand;
pub use intake::IntakeCommand;
pub use list::ListCommand;
pub use normalize::NormalizeCommand;
pub use publish::PublishCommand;

/// Resolve a `--flag` / `--no-flag` pair; `None` when neither was given
pub(crate) fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
