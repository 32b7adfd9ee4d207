use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::errors::RagError;
use crate::mcp::RemoteDocsConfig;

/// Runtime configuration, resolved as defaults <- YAML file <- environment.
///
/// Secrets (API keys) are never written to the YAML file in examples; they
/// are expected through the environment (`GEMINI_API_KEY` and friends).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM backend: `gemini` or `openai-compat`.
    pub provider: String,
    pub model: String,
    pub embedding_model: String,
    pub gemini_base_url: String,
    pub openai_base_url: String,
    pub temperature: f32,
    pub chunk_size: usize,
    pub top_k: usize,
    pub history_window: usize,
    pub max_search_results: usize,
    pub docs_path: PathBuf,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub gemini_api_key: Option<String>,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub remote_docs: Option<RemoteDocsConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            openai_base_url: "http://localhost:1234".to_string(),
            temperature: 0.0,
            chunk_size: 500,
            top_k: 3,
            history_window: 5,
            max_search_results: 5,
            docs_path: PathBuf::from("./documents"),
            db_path: PathBuf::from("./ragbot.db"),
            log_dir: PathBuf::from("./logs"),
            gemini_api_key: None,
            search_api_key: None,
            search_engine_id: None,
            remote_docs: None,
        }
    }
}

impl Config {
    /// Loads configuration. An explicit path must exist; otherwise
    /// `RAGBOT_CONFIG`, then `./ragbot.yml`, then pure defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, RagError> {
        let mut config = match resolve_config_path(path) {
            Some(file) => {
                let contents = fs::read_to_string(&file)
                    .map_err(|e| RagError::config(format!("{}: {}", file.display(), e)))?;
                serde_yaml::from_str::<Config>(&contents)
                    .map_err(|e| RagError::config(format!("{}: {}", file.display(), e)))?
            }
            None => Config::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(value) = env::var("RAGBOT_PROVIDER") {
            self.provider = value;
        }
        if let Ok(value) = env::var("RAGBOT_MODEL") {
            self.model = value;
        }
        if let Ok(value) = env::var("RAGBOT_EMBEDDING_MODEL") {
            self.embedding_model = value;
        }
        if let Ok(value) = env::var("RAGBOT_DB_PATH") {
            self.db_path = PathBuf::from(value);
        }
        if let Ok(value) = env::var("RAGBOT_LOG_DIR") {
            self.log_dir = PathBuf::from(value);
        }
        if let Ok(value) = env::var("GEMINI_API_KEY") {
            if !value.trim().is_empty() {
                self.gemini_api_key = Some(value);
            }
        }
        if let Ok(value) = env::var("RAGBOT_SEARCH_API_KEY") {
            if !value.trim().is_empty() {
                self.search_api_key = Some(value);
            }
        }
        if let Ok(value) = env::var("RAGBOT_SEARCH_ENGINE_ID") {
            if !value.trim().is_empty() {
                self.search_engine_id = Some(value);
            }
        }
    }

    fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        match self.provider.as_str() {
            "gemini" | "openai-compat" | "openai" | "lmstudio" => Ok(()),
            other => Err(RagError::Config(format!("unknown provider '{}'", other))),
        }
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var("RAGBOT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from("./ragbot.yml");
    if local.exists() {
        return Some(local);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_settings() {
        let config = Config::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.embedding_model, "text-embedding-004");
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.history_window, 5);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let config: Config =
            serde_yaml::from_str("provider: openai-compat\nchunk_size: 120\n").unwrap();
        assert_eq!(config.provider, "openai-compat");
        assert_eq!(config.chunk_size, 120);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.top_k, 3);
    }

    #[test]
    fn load_rejects_missing_explicit_file() {
        let result = Config::load(Some(Path::new("/nonexistent/ragbot.yml")));
        assert!(matches!(result, Err(RagError::Config(_))));
    }

    #[test]
    fn load_reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size: 64\ntop_k: 7").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.chunk_size, 64);
        assert_eq!(config.top_k, 7);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = Config {
            chunk_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = Config {
            provider: "bard".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn env_overrides_apply_to_deployment_fields() {
        for key in [
            "RAGBOT_PROVIDER",
            "RAGBOT_MODEL",
            "RAGBOT_EMBEDDING_MODEL",
            "RAGBOT_DB_PATH",
            "RAGBOT_LOG_DIR",
            "GEMINI_API_KEY",
        ] {
            env::remove_var(key);
        }

        env::set_var("RAGBOT_PROVIDER", "lmstudio");
        env::set_var("RAGBOT_MODEL", "qwen2.5-7b-instruct");
        env::set_var("RAGBOT_DB_PATH", "/tmp/override.db");
        env::set_var("GEMINI_API_KEY", "   ");

        let mut config = Config::default();
        config.apply_env();

        assert_eq!(config.provider, "lmstudio");
        assert_eq!(config.model, "qwen2.5-7b-instruct");
        assert_eq!(config.db_path, PathBuf::from("/tmp/override.db"));
        // Unset vars keep their defaults; blank secrets are ignored.
        assert_eq!(config.embedding_model, "text-embedding-004");
        assert!(config.gemini_api_key.is_none());

        for key in [
            "RAGBOT_PROVIDER",
            "RAGBOT_MODEL",
            "RAGBOT_DB_PATH",
            "GEMINI_API_KEY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn remote_docs_section_parses() {
        let yaml = r#"
remote_docs:
  command: "npx"
  args: ["-y", "docs-mcp-server"]
  tool: "get_documents"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let remote = config.remote_docs.expect("remote_docs parsed");
        assert_eq!(remote.command, "npx");
        assert_eq!(remote.args, vec!["-y", "docs-mcp-server"]);
        assert_eq!(remote.tool.as_deref(), Some("get_documents"));
    }
}
