//! Saved assistant descriptor: reuse the remote assistant across restarts.

use std::path::Path;

use tracing::{info, warn};

use crate::api::AssistantApi;
use crate::error::AssistantError;
use crate::types::AssistantDescriptor;

/// What to register when no saved descriptor exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantSpec {
    pub name: String,
    pub model: String,
    pub instructions: String,
}

fn read_descriptor(path: &Path) -> Option<AssistantDescriptor> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read assistant descriptor");
            return None;
        }
    };
    match serde_json::from_str::<AssistantDescriptor>(&content) {
        Ok(d) if !d.id.is_empty() => Some(d),
        Ok(_) => {
            warn!(path = %path.display(), "assistant descriptor has empty id");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot parse assistant descriptor");
            None
        }
    }
}

/// Returns the descriptor saved at `path`, or registers a new assistant and saves it there.
///
/// An unreadable or corrupt file is treated like a missing one.
pub async fn load_or_create_descriptor(
    api: &dyn AssistantApi,
    path: impl AsRef<Path>,
    spec: &AssistantSpec,
) -> Result<AssistantDescriptor, AssistantError> {
    let path = path.as_ref();
    if let Some(saved) = read_descriptor(path) {
        if saved.instructions.as_deref() != Some(spec.instructions.as_str()) {
            warn!(
                assistant_id = %saved.id,
                "saved assistant instructions differ from preprompt; delete the descriptor to re-register"
            );
        }
        info!(assistant_id = %saved.id, path = %path.display(), "reusing saved assistant");
        return Ok(saved);
    }

    let mut created = api.create_assistant(spec).await?;
    if created.created_at.is_none() {
        created.created_at = Some(chrono::Utc::now().timestamp());
    }
    let body = serde_json::to_string_pretty(&created)
        .map_err(|e| AssistantError::Descriptor(e.to_string()))?;
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| AssistantError::Descriptor(format!("{}: {}", dir.display(), e)))?;
    }
    std::fs::write(path, body)
        .map_err(|e| AssistantError::Descriptor(format!("{}: {}", path.display(), e)))?;
    info!(assistant_id = %created.id, path = %path.display(), "registered new assistant");
    Ok(created)
}
