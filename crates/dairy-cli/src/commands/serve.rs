//! `dairy serve` - Start the HTTP API.

use anyhow::Context;
use dairy_core::DairyConfig;
use std::path::Path;

/// Load `path`, or defaults when it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<DairyConfig> {
    DairyConfig::load_or_default(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

pub async fn run(config: DairyConfig) -> anyhow::Result<()> {
    tracing::info!(
        bind = %config.server.bind,
        audit_enabled = config.audit.enabled,
        audit_backend = ?config.audit.storage.backend,
        geo_enabled = config.geo.enabled,
        "Loaded configuration"
    );
    dairy_server::run(config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("dairy.yaml")).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn test_example_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../dairy.example.yaml");
        let config = load_config(&path).unwrap();
        assert!(config.server.trust_forwarded_for);
        assert_eq!(config.audit.storage.file_path, "data/audit.jsonl");
        assert!(!config.geo.enabled);
    }

    #[test]
    fn test_invalid_config_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "auth:\n  token_ttl_secs: 0").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to load configuration"));
    }
}
