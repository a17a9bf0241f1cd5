//! Confirmation prompt shown before a deployment when `warn.enabled` is set.

use anyhow::{bail, Result};
use dialoguer::Input;
use is_terminal::IsTerminal;

use stagehand::StagehandError;

/// Prompt text for a deployment described by `description`.
pub fn prompt_text(description: Option<&str>) -> String {
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("run this deployment");
    format!("Are you sure you want to {}? Type 'yes' to continue", description)
}

pub fn is_confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Ask for `yes`. Non-interactive stdin aborts.
pub fn confirm_deployment(description: Option<&str>) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        bail!("confirmation required but stdin is not a terminal (pass --yes)");
    }
    let answer: String = Input::new()
        .with_prompt(prompt_text(description))
        .allow_empty(true)
        .interact_text()?;
    if is_confirmed(&answer) {
        Ok(())
    } else {
        Err(StagehandError::Aborted.into())
    }
}
