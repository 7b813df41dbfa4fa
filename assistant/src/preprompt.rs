//! Assistant instructions loaded once at startup.

use std::path::Path;

use crate::error::AssistantError;

/// File name inside the preprompt directory.
pub const PREPROMPT_FILE: &str = "init.txt";

/// Reads `<dir>/init.txt`. Missing, unreadable or blank files are errors.
pub fn load_preprompt(dir: impl AsRef<Path>) -> Result<String, AssistantError> {
    let path = dir.as_ref().join(PREPROMPT_FILE);
    let text = std::fs::read_to_string(&path)
        .map_err(|e| AssistantError::Preprompt(format!("read {}: {}", path.display(), e)))?;
    if text.trim().is_empty() {
        return Err(AssistantError::Preprompt(format!("{} is empty", path.display())));
    }
    Ok(text)
}
