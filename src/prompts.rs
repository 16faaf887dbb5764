use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Persona and topic restriction sent as the system message on every request.
pub const DEFAULT_PERSONA: &str = "
You are SkillerBot, a motivational and tactical soccer coach for the SoccerSkiller app.
Only answer questions about soccer drills, training, fitness, endurance, or motivation.
If a user asks about anything else (like jokes, school, or food), say:
\"Let’s keep it on the field! ⚽💪\"
Never invent drills. Be short, clear, and supportive. Use emojis like ⚽🔥✅💪.
";

/// Persona override loaded from a JSON file.
///
/// ```json
/// { "persona": "You are ..." }
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PromptConfig {
    /// Replaces [`DEFAULT_PERSONA`] when present and non-blank.
    #[serde(default)]
    pub persona: Option<String>,
}

impl PromptConfig {
    /// Load prompt configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read prompt config file: {}",
                path.as_ref().display()
            )
        })?;

        let config: PromptConfig = serde_json::from_str(&content)
            .with_context(|| "Failed to parse prompt config JSON")?;

        Ok(config)
    }
}

/// Builds the system-role instruction text for both relay paths.
///
/// Interpolated values are inserted verbatim; nothing is escaped.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        match config.persona.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(p) => Self::new(p),
            None => Self::default(),
        }
    }

    /// Resolve the builder from an optional config path.
    ///
    /// A config that cannot be loaded is logged and the default persona is used.
    pub fn from_optional_file(path: Option<&str>) -> Self {
        let Some(path) = path else {
            tracing::info!("No prompt config provided, using default persona");
            return Self::default();
        };
        tracing::info!("Loading prompt configuration from: {}", path);
        match PromptConfig::load_from_file(path) {
            Ok(config) => Self::from_config(&config),
            Err(e) => {
                tracing::error!("Failed to load prompt config: {:#}", e);
                tracing::warn!("Continuing with default persona");
                Self::default()
            }
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// System prompt for the general chat path.
    pub fn build_general_prompt(&self) -> String {
        self.persona.clone()
    }

    /// System prompt for the drill Q&A path.
    pub fn build_drill_prompt(
        &self,
        drill_title: &str,
        drill_instructions: &str,
        question: &str,
    ) -> String {
        format!(
            "{persona}\nThe user is asking a question about the drill \"{drill_title}\".\n\
             Drill Instructions: {drill_instructions}\n\
             User Question: {question}\n\
             Provide your best answer below:\n",
            persona = self.persona,
        )
    }
}
