//! Initialize qualities in a project

use std::fs;

use qualities::config::STARTER_CONFIG;
use qualities::output::{OperationResult, OutputMode};
use qualities::paths;

/// Write the starter `.qualities.toml` and create `.qualities/`
pub fn init(force: bool, mode: OutputMode) -> anyhow::Result<()> {
    let config_path = paths::qualities_toml();

    if config_path.exists() && !force {
        OperationResult {
            success: false,
            message: format!(
                "Already initialized ({} exists). Use --force to overwrite.",
                paths::QUALITIES_TOML
            ),
        }
        .render(mode);
        anyhow::bail!("{} already exists", paths::QUALITIES_TOML);
    }

    fs::write(&config_path, STARTER_CONFIG)?;
    log::info!("wrote {}", config_path.display());

    fs::create_dir_all(paths::manifests_dir())?;
    fs::write(paths::qualities_dir().join(".gitignore"), "*\n")?;

    OperationResult {
        success: true,
        message: format!(
            "Created {} and {}/\n\nNext steps:\n  qualities scan\n  qualities run --preflight",
            paths::QUALITIES_TOML,
            paths::QUALITIES_DIR
        ),
    }
    .render(mode);

    Ok(())
}
