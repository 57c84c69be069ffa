//! File-based defaults for the `mount_stat` demo (§4.10, C10) — ambient convenience around the
//! core, layered under explicit call arguments. Mirrors the teacher crate's declared `serde`
//! dependency.

use serde::Deserialize;

/// Defaults loaded from a TOML file, each overridable by an explicit CLI flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    pub server: Option<String>,
    pub export: Option<String>,
    pub client_name: Option<String>,
}

impl ClientConfig {
    /// Loads a config from `path`, or returns the all-`None` default if the file does not
    /// exist. A file that exists but fails to parse is still an error.
    pub fn load(path: &std::path::Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_all_none_defaults() {
        let config = ClientConfig::load(std::path::Path::new("/nonexistent/path.toml")).unwrap();
        assert!(config.server.is_none());
        assert!(config.export.is_none());
        assert!(config.client_name.is_none());
    }

    #[test]
    fn parses_a_partial_config() {
        let toml = "server = \"10.0.0.1\"\n";
        let config: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.as_deref(), Some("10.0.0.1"));
        assert!(config.export.is_none());
    }
}
