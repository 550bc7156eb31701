//! Configuration management for the Aura gateway

use std::path::PathBuf;
use std::time::Duration;

use crate::controller::VoiceIdentity;
use crate::{Error, Result};

/// Default completion model for the hosted responder
pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";

/// System prompt sent with every hosted completion
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are Aura. Be concise like Alexa. You remember everything.";

/// Aura gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database, config file)
    pub data_dir: PathBuf,

    /// Path to the conversation vault database
    pub db_path: PathBuf,

    /// Voice pipeline configuration
    pub voice: VoiceConfig,

    /// Hosted responder configuration
    pub llm: LlmConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Completed turns carried into each hosted completion
    pub context_turns: usize,
}

/// Voice pipeline configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Preferred voice identity for synthesis
    pub identity: VoiceIdentity,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS model
    pub tts_model: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// How long a listen window waits for speech before giving up
    pub listen_timeout: Duration,

    /// Ambient noise sampled at the start of each listen window
    pub calibration: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            identity: VoiceIdentity::default(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_speed: 1.0,
            listen_timeout: Duration::from_secs(10),
            calibration: Duration::from_millis(300),
        }
    }
}

/// Hosted responder configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Completion model identifier
    pub model: String,

    /// Completion token cap
    pub max_tokens: u32,

    /// System prompt
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_LLM_MODEL.to_string(),
            max_tokens: 150,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Groq API key (hosted completions)
    pub groq: Option<String>,

    /// `OpenAI` API key (Whisper STT and TTS)
    pub openai: Option<String>,

    /// Deepgram API key (optional STT)
    pub deepgram: Option<String>,

    /// Brave Search API key (optional web search tool)
    pub brave: Option<String>,

    /// Serper API key (optional web search tool)
    pub serper: Option<String>,
}

/// Optional `aura.toml` overrides
#[derive(Debug, Default, serde::Deserialize)]
struct FileConfig {
    voice: Option<FileVoiceConfig>,
    llm: Option<FileLlmConfig>,
    context_turns: Option<usize>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct FileVoiceConfig {
    identity: Option<String>,
    stt_model: Option<String>,
    tts_model: Option<String>,
    tts_speed: Option<f32>,
    listen_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct FileLlmConfig {
    model: Option<String>,
    max_tokens: Option<u32>,
    system_prompt: Option<String>,
}

impl Config {
    /// Load configuration from the data directory and the environment
    ///
    /// Precedence: environment variables over `aura.toml` over defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created or the
    /// config file cannot be parsed
    pub fn load() -> Result<Self> {
        let data_dir = data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join("conversation_vault.db");

        let file = Self::load_file(&data_dir)?;

        let api_keys = ApiKeys {
            groq: std::env::var("GROQ_API_KEY").ok(),
            openai: std::env::var("OPENAI_API_KEY").ok(),
            deepgram: std::env::var("DEEPGRAM_API_KEY").ok(),
            brave: std::env::var("BRAVE_API_KEY").ok(),
            serper: std::env::var("SERPER_API_KEY").ok(),
        };

        let file_voice = file.voice.unwrap_or_default();
        let defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            identity: std::env::var("AURA_VOICE")
                .ok()
                .or(file_voice.identity)
                .map(|s| VoiceIdentity::from_str(&s))
                .unwrap_or_default(),
            stt_model: std::env::var("AURA_STT_MODEL")
                .ok()
                .or(file_voice.stt_model)
                .unwrap_or(defaults.stt_model),
            tts_model: std::env::var("AURA_TTS_MODEL")
                .ok()
                .or(file_voice.tts_model)
                .unwrap_or(defaults.tts_model),
            tts_speed: std::env::var("AURA_TTS_SPEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(file_voice.tts_speed)
                .unwrap_or(defaults.tts_speed),
            listen_timeout: std::env::var("AURA_LISTEN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(file_voice.listen_timeout_secs)
                .map_or(defaults.listen_timeout, Duration::from_secs),
            calibration: defaults.calibration,
        };

        let file_llm = file.llm.unwrap_or_default();
        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            model: std::env::var("AURA_LLM_MODEL")
                .ok()
                .or(file_llm.model)
                .unwrap_or(llm_defaults.model),
            max_tokens: std::env::var("AURA_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(file_llm.max_tokens)
                .unwrap_or(llm_defaults.max_tokens),
            system_prompt: std::env::var("AURA_SYSTEM_PROMPT")
                .ok()
                .or(file_llm.system_prompt)
                .unwrap_or(llm_defaults.system_prompt),
        };

        let context_turns = std::env::var("AURA_CONTEXT_TURNS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file.context_turns)
            .unwrap_or(4);

        Ok(Self {
            data_dir,
            db_path,
            voice,
            llm,
            api_keys,
            context_turns,
        })
    }

    fn load_file(data_dir: &std::path::Path) -> Result<FileConfig> {
        let path = std::env::var("AURA_CONFIG")
            .map_or_else(|_| data_dir.join("aura.toml"), PathBuf::from);

        if !path.exists() {
            return Ok(FileConfig::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Groq key, required by the hosted responder
    ///
    /// # Errors
    ///
    /// Returns error if the key is absent
    pub fn groq_key(&self) -> Result<&str> {
        self.api_keys.groq.as_deref().ok_or_else(|| {
            Error::Config("GROQ_API_KEY is required for the hosted responder".to_string())
        })
    }

    /// `OpenAI` key, required for STT and TTS
    ///
    /// # Errors
    ///
    /// Returns error if the key is absent
    pub fn openai_key(&self) -> Result<&str> {
        self.api_keys.openai.as_deref().ok_or_else(|| {
            Error::Config("OPENAI_API_KEY is required for speech input and output".to_string())
        })
    }
}

/// Data directory (`~/.local/share/aura` on Linux), overridable for tests
fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AURA_DATA_DIR") {
        return PathBuf::from(dir);
    }

    directories::ProjectDirs::from("dev", "aura", "aura")
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().to_path_buf())
}
