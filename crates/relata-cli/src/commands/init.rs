use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use relata_config::RelataConfig;
use relata_loader::CONFIG_FILE;

pub fn cmd_init() -> Result<()> {
    let path = PathBuf::from(CONFIG_FILE);
    if path.exists() {
        bail!("{CONFIG_FILE} already exists");
    }

    let config = RelataConfig::default();
    let json = serde_json::to_string_pretty(&config).context("serialize default config")?;
    fs::write(&path, json).with_context(|| format!("write {CONFIG_FILE}"))?;
    println!("created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::CwdGuard;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn cmd_init_creates_config() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());

        cmd_init().unwrap();
        let config = relata_loader::load_config().unwrap();
        assert_eq!(config, RelataConfig::default());
    }

    #[test]
    #[serial]
    fn cmd_init_fails_when_exists() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());

        cmd_init().unwrap();
        let err = cmd_init().unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
