//! Read or update the last-verified marker

use chrono::Utc;
use qualities::core::ports::BaselineStore;
use qualities::output::{BaselineResult, OutputMode};

use super::project::Project;
use crate::cli::app::BaselineAction;

/// Mark now as verified, or show the stored marker
pub fn baseline(action: &BaselineAction, mode: OutputMode) -> anyhow::Result<()> {
    let project = Project::load()?;

    let marked = match action {
        BaselineAction::Mark => {
            project.baseline.save(Utc::now())?;
            true
        },
        BaselineAction::Show => false,
    };

    let last_verified = project.baseline.load()?.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    BaselineResult {
        last_verified,
        marked,
    }
    .render(mode);
    Ok(())
}
