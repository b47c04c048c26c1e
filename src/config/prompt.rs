use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use log::info;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "Sen bir günlük asistanısın; kullanıcıdan gelen cümleyi analiz edip Duygu :(pozitif/nötr/negatif) Renk : (kullanıcının duygusunu ifade eden rengi hex formatında ver) Özet : (1 cümle) Öneri : (kısa tavsiye) alanlarını üret; doğal konuş, tekrar yapma, tıbbi/psikolojik teşhis koyma ve çıktıyı json formatında ver.";

pub const DEFAULT_GREETING: &str = "Gününüzü Anlatın!";

#[derive(Debug)]
pub enum PromptError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    EmptyInstruction(String),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
            PromptError::EmptyInstruction(path) =>
                write!(f, "Prompt file '{}' has an empty system_instruction", path),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// Text sent alongside every journal entry, plus the greeting shown on an
/// empty chat. Both can be overridden from a JSON file.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PromptConfig {
    pub system_instruction: String,
    pub greeting: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<PromptConfig, PromptError> {
    let path = path.as_ref();
    let file_content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    if config.system_instruction.trim().is_empty() {
        return Err(PromptError::EmptyInstruction(path.display().to_string()));
    }
    info!("Loaded prompts from: {}", path.display());
    Ok(config)
}

pub fn resolve_prompts(path: Option<&str>) -> Result<PromptConfig, PromptError> {
    match path {
        Some(p) if !p.trim().is_empty() => load_prompts(p),
        _ => Ok(PromptConfig::default()),
    }
}
