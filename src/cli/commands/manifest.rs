//! Generate, check and show configuration-unit manifests

use chrono::Utc;
use qualities::core::ports::ManifestStore;
use qualities::core::services::parse_manifest;
use qualities::output::{
    GeneratedManifest, ManifestGenerateResult, ManifestShowResult, OutputMode, UnitCheck,
    UnitCheckResult,
};

use super::project::Project;
use crate::cli::app::ManifestAction;

/// Dispatch a manifest action
pub fn manifest(action: ManifestAction, mode: OutputMode) -> anyhow::Result<()> {
    let project = Project::load()?;
    match action {
        ManifestAction::Generate { unit, all } => generate(&project, unit, all, mode),
        ManifestAction::Check { unit, expire, .. } => check(&project, unit, expire, mode),
        ManifestAction::Show { unit } => show(&project, &unit, mode),
    }
}

/// Unit ids an action applies to: one named unit, or all of them
fn selected_units(project: &Project, unit: Option<String>) -> anyhow::Result<Vec<String>> {
    match unit {
        Some(id) => {
            project.verifier().unit(&id)?;
            Ok(vec![id])
        },
        None => Ok(project.config.units.iter().map(|u| u.id.clone()).collect()),
    }
}

fn generate(project: &Project, unit: Option<String>, all: bool, mode: OutputMode) -> anyhow::Result<()> {
    let ids = selected_units(project, if all { None } else { unit })?;
    if ids.is_empty() {
        anyhow::bail!("No configuration units declared in .qualities.toml");
    }

    let verifier = project.verifier();
    let now = Utc::now();
    let mut generated = Vec::with_capacity(ids.len());
    for id in &ids {
        let manifest = verifier.generate(id, now)?;
        generated.push(GeneratedManifest {
            unit: manifest.unit,
            unit_digest: manifest.unit_digest,
            files: manifest.files.len(),
        });
    }

    ManifestGenerateResult { generated }.render(mode);
    Ok(())
}

fn check(project: &Project, unit: Option<String>, expire: bool, mode: OutputMode) -> anyhow::Result<()> {
    let verifier = project.verifier();
    let mut units = Vec::new();

    for id in selected_units(project, unit)? {
        let status = verifier.status(&id)?;
        let expired = if !status.is_fresh() && expire {
            verifier.expire(&id)?;
            true
        } else {
            false
        };
        units.push(UnitCheck {
            unit: id,
            status,
            expired,
        });
    }

    let passed = units.iter().all(|u| u.status.is_fresh());
    UnitCheckResult { passed, units }.render(mode);

    if !passed {
        std::process::exit(1);
    }

    Ok(())
}

fn show(project: &Project, unit: &str, mode: OutputMode) -> anyhow::Result<()> {
    project.verifier().unit(unit)?;

    let (manifest, problem) = match project.manifests.load(unit)? {
        None => (None, None),
        Some(raw) => match parse_manifest(&raw) {
            Ok(manifest) => (Some(manifest), None),
            Err(reason) => (None, Some(reason.to_string())),
        },
    };

    ManifestShowResult {
        unit: unit.to_string(),
        manifest,
        problem,
    }
    .render(mode);
    Ok(())
}
