use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ChatError, ChatResult};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3928;
pub const DEFAULT_ENGINE: &str = "cortex.llamacpp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    LlamaCpp,
    OnnxRuntime,
    TensorRtLlm,
    Other,
}

impl EngineKind {
    fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("llamacpp") {
            EngineKind::LlamaCpp
        } else if name.contains("onnx") {
            EngineKind::OnnxRuntime
        } else if name.contains("tensorrt") {
            EngineKind::TensorRtLlm
        } else {
            EngineKind::Other
        }
    }
}

/// Inference backend descriptor, classified once when the configuration is
/// built. The original name is kept because the server expects it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Engine {
    name: String,
    kind: EngineKind,
}

impl Engine {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = EngineKind::from_name(&name);
        Self { name, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Only llama.cpp answers the model status endpoint.
    pub fn supports_model_status(&self) -> bool {
        self.kind == EngineKind::LlamaCpp
    }
}

impl From<String> for Engine {
    fn from(name: String) -> Self {
        Engine::new(name)
    }
}

impl From<Engine> for String {
    fn from(engine: Engine) -> Self {
        engine.name
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(DEFAULT_ENGINE)
    }
}

/// Model parameters the chat client needs, usually read from a model YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default)]
    pub engine: Engine,
    #[serde(default)]
    pub stop: Vec<String>,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, engine: Engine, stop: Vec<String>) -> Self {
        Self {
            name: name.into(),
            engine,
            stop,
        }
    }

    pub fn from_yaml_str(content: &str) -> ChatResult<Self> {
        let config: ModelConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> ChatResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Replace file values with explicitly given ones. An empty `stop` list
    /// keeps the existing stop strings.
    pub fn with_overrides(
        mut self,
        name: Option<String>,
        engine: Option<String>,
        stop: Vec<String>,
    ) -> Self {
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(engine) = engine {
            self.engine = Engine::new(engine);
        }
        if !stop.is_empty() {
            self.stop = stop;
        }
        self
    }

    fn validate(&self) -> ChatResult<()> {
        if self.name.trim().is_empty() {
            return Err(ChatError::Config("model name must not be empty".to_string()));
        }
        if self.engine.name().trim().is_empty() {
            return Err(ChatError::Config("engine must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Where the inference server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Load from `CORTEX_HOST` / `CORTEX_PORT`, falling back to the defaults.
    pub fn from_env() -> ChatResult<Self> {
        let host = get_env("CORTEX_HOST", false, Some(DEFAULT_HOST.to_string()))?
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match get_env("CORTEX_PORT", false, None)? {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| ChatError::Config(format!("CORTEX_PORT '{}': {}", port, e)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self::new(host, port))
    }
}

/// Helper function to get environment variables with error handling
pub fn get_env(key: &str, required: bool, default: Option<String>) -> ChatResult<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) if !required => Ok(default),
        Err(env::VarError::NotPresent) => Err(ChatError::Config(format!(
            "Environment variable '{}' is required but not set.",
            key
        ))),
        Err(e) => Err(ChatError::Config(format!("{}: {}", key, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_engine_classification() {
        assert_eq!(Engine::new("cortex.llamacpp").kind(), EngineKind::LlamaCpp);
        assert_eq!(Engine::new("llamacpp").kind(), EngineKind::LlamaCpp);
        assert_eq!(Engine::new("cortex.onnx").kind(), EngineKind::OnnxRuntime);
        assert_eq!(
            Engine::new("cortex.tensorrt-llm").kind(),
            EngineKind::TensorRtLlm
        );
        assert_eq!(Engine::new("openai").kind(), EngineKind::Other);
    }

    #[test]
    fn test_only_llamacpp_supports_model_status() {
        assert!(Engine::new("cortex.llamacpp").supports_model_status());
        assert!(!Engine::new("cortex.onnx").supports_model_status());
        assert!(!Engine::new("cortex.tensorrt-llm").supports_model_status());
        assert!(!Engine::new("openai").supports_model_status());
    }

    #[test]
    fn test_engine_serializes_as_plain_name() -> anyhow::Result<()> {
        let engine = Engine::new("cortex.llamacpp");
        assert_eq!(serde_json::to_value(&engine)?, serde_json::json!("cortex.llamacpp"));
        Ok(())
    }

    #[test]
    fn test_model_config_from_yaml() -> anyhow::Result<()> {
        let config = ModelConfig::from_yaml_str(
            r#"
name: tinyllama
engine: cortex.llamacpp
stop:
  - "</s>"
  - "<|im_end|>"
"#,
        )?;

        assert_eq!(config.name, "tinyllama");
        assert_eq!(config.engine.name(), "cortex.llamacpp");
        assert!(config.engine.supports_model_status());
        assert_eq!(config.stop, vec!["</s>", "<|im_end|>"]);
        Ok(())
    }

    #[test]
    fn test_model_config_defaults() -> anyhow::Result<()> {
        let config = ModelConfig::from_yaml_str("name: phi3\n")?;
        assert_eq!(config.engine.name(), DEFAULT_ENGINE);
        assert!(config.stop.is_empty());
        Ok(())
    }

    #[test]
    fn test_model_config_rejects_empty_name() {
        let result = ModelConfig::from_yaml_str("name: \"\"\nengine: cortex.onnx\n");
        assert!(matches!(result, Err(ChatError::Config(_))));
    }

    #[test]
    fn test_model_config_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "name: mistral\nengine: cortex.onnx\nstop: [\"[INST]\"]")?;

        let config = ModelConfig::from_yaml_file(file.path())?;
        assert_eq!(config.name, "mistral");
        assert_eq!(config.engine.kind(), EngineKind::OnnxRuntime);
        assert_eq!(config.stop, vec!["[INST]"]);
        Ok(())
    }

    #[test]
    fn test_overrides_replace_file_values() -> anyhow::Result<()> {
        let yaml = "name: phi3\nengine: cortex.llamacpp\nstop: [\"<|end|>\"]\n";
        let config = ModelConfig::from_yaml_str(yaml)?.with_overrides(
            Some("phi3-mini".to_string()),
            Some("cortex.onnx".to_string()),
            vec![],
        );

        assert_eq!(config.name, "phi3-mini");
        assert_eq!(config.engine.kind(), EngineKind::OnnxRuntime);
        assert!(!config.engine.supports_model_status());
        assert_eq!(config.stop, vec!["<|end|>"]);

        let config = config.with_overrides(None, None, vec!["###".to_string()]);
        assert_eq!(config.name, "phi3-mini");
        assert_eq!(config.stop, vec!["###"]);
        Ok(())
    }

    #[test]
    fn test_model_config_missing_file() {
        let result = ModelConfig::from_yaml_file(Path::new("/nonexistent/model.yml"));
        assert!(matches!(result, Err(ChatError::Io(_))));
    }

    #[test]
    fn test_get_env_optional_default() -> anyhow::Result<()> {
        let value = get_env(
            "CORTEX_CHAT_TEST_SURELY_UNSET",
            false,
            Some("fallback".to_string()),
        )?;
        assert_eq!(value.as_deref(), Some("fallback"));
        Ok(())
    }

    #[test]
    fn test_get_env_required_missing() {
        let result = get_env("CORTEX_CHAT_TEST_SURELY_UNSET", true, None);
        assert!(result.is_err());
    }
}
