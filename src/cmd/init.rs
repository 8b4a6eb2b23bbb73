use crate::data::{default_fields, AppSettings, FieldDef, FormValues, Persistable};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Combined struct for serializing config.yaml in one pass.
/// `AppSettings` and `FormSchema` both read config.yaml independently,
/// so writing them separately would overwrite each other.
#[derive(Serialize)]
struct ConfigFile {
    settings: AppSettings,
    fields: Vec<FieldDef>,
}

pub fn run() -> Result<()> {
    let dir = crate::data::persistence::get_data_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    run_in_dir(&dir)?;
    println!("Data files initialized in {}", dir.display());
    Ok(())
}

/// Writes all default data files into `dir`. Exposed for unit testing.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    write_config(dir)?;
    FormValues::default().save_to(dir)?;
    Ok(())
}

fn write_config(dir: &Path) -> Result<()> {
    let config = ConfigFile {
        settings: AppSettings::default(),
        fields: default_fields(),
    };
    let yaml = serde_norway::to_string(&config).context("failed to serialize config")?;
    let path = dir.join("config.yaml");
    fs::write(&path, yaml).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
