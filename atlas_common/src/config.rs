//! Command line arguments and config file loading.

use crate::error::{ProviderError, Result};
use ::serde::de::DeserializeOwned;
use ::serde_json::from_reader;
use ::std::{fs::File, io::BufReader, path::Path};

/// Command line arguments shared by the provider binaries.
#[derive(::clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// path to the config file
    #[arg(long)]
    pub config_path: String,
}

/// Load a JSON config file into `C`.
pub fn load_config<C: DeserializeOwned>(path: impl AsRef<Path>) -> Result<C> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ProviderError::fail_to_load_config(format!("cannot open {}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);
    from_reader(reader).map_err(ProviderError::fail_to_load_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::serde::Deserialize;
    use ::std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        name: String,
    }

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "atlas_common_config_{}_{}.json",
            name,
            std::process::id()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_config_from_file() -> anyhow::Result<()> {
        let path = temp_file("ok", r#"{"name": "atlas"}"#);
        let config: Sample = load_config(&path)?;
        assert_eq!(
            config,
            Sample {
                name: "atlas".to_owned()
            }
        );
        Ok(())
    }

    #[test]
    fn missing_file() {
        let result = load_config::<Sample>("/does/not/exist.json");
        assert!(result.is_err_and(|e| e
            .to_string()
            .starts_with("Failed to load config: cannot open /does/not/exist.json")));
    }

    #[test]
    fn invalid_content() {
        let path = temp_file("bad", r#"{"name": "atlas", "extra": 1}"#);
        let result = load_config::<Sample>(&path);
        assert!(result.is_err_and(|e| matches!(e, ProviderError::FailToLoadConfig(msg) if msg.starts_with("unknown field `extra`"))));
    }
}
