// Local persistence bridge.
//
// The wizard state is mirrored to durable storage on every mutation so a
// crash or reload resumes at the same step with prior answers intact. Two
// JSON documents under fixed keys: raw field values in one, session /
// verification / progress metadata in the other. Both are removed together,
// and only on final submission success or an explicit reset.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::models::fields::RegistrationFields;
use crate::models::state::{ServerLinkage, VerificationState, WizardState};
use crate::utils::path_resolver::resolve_state_folder;

pub const FIELDS_KEY: &str = "registration_fields";
pub const SESSION_KEY: &str = "registration_session";

/// Session/verification/progress metadata, stored separately from the raw
/// field values under `SESSION_KEY`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SessionBlob {
    current_step: usize,
    completed_steps: BTreeSet<usize>,
    verification: VerificationState,
    server_linkage: ServerLinkage,
}

#[derive(Debug, Clone)]
pub struct WizardStore {
    dir: PathBuf,
}

impl WizardStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform state folder (or `ONBOARDING_STATE_DIR`).
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(resolve_state_folder()?))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Persist the full wizard state as the two fixed-key documents.
    pub fn save(&self, state: &WizardState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create state folder {:?}", self.dir))?;

        let session = SessionBlob {
            current_step: state.current_step,
            completed_steps: state.completed_steps.clone(),
            verification: state.verification.clone(),
            server_linkage: state.server_linkage.clone(),
        };

        write_json(&self.key_path(FIELDS_KEY), &state.fields)?;
        write_json(&self.key_path(SESSION_KEY), &session)?;
        Ok(())
    }

    /// Rehydrate a wizard state, merging both documents over a fresh state.
    /// Returns `None` when no prior session exists. A corrupt document is
    /// logged and treated as absent rather than aborting the wizard.
    pub fn load(&self) -> Result<Option<WizardState>> {
        let fields: Option<RegistrationFields> = read_json(&self.key_path(FIELDS_KEY))?;
        let session: Option<SessionBlob> = read_json(&self.key_path(SESSION_KEY))?;

        if fields.is_none() && session.is_none() {
            return Ok(None);
        }

        let mut state = WizardState::new();
        if let Some(fields) = fields {
            state.fields = fields;
        }
        if let Some(session) = session {
            state.current_step = session.current_step.max(1);
            state.completed_steps = session.completed_steps;
            state.verification = session.verification;
            state.server_linkage = session.server_linkage;
        }

        info!(
            "[PHASE: persistence] [STEP: load] Resumed wizard session (current_step={}, completed={})",
            state.current_step,
            state.completed_steps.len()
        );
        Ok(Some(state))
    }

    /// Remove both documents. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        for key in [FIELDS_KEY, SESSION_KEY] {
            let path = self.key_path(key);
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(anyhow::anyhow!("Failed to remove {:?}: {}", path, e));
                }
            }
        }
        info!("[PHASE: persistence] [STEP: clear] Wizard session cleared");
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {:?}", path))?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(anyhow::anyhow!("Failed to read {:?}: {}", path, e)),
    };
    match serde_json::from_str(&text) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            warn!(
                "[PHASE: persistence] [STEP: load] Discarding corrupt state document {:?}: {}",
                path, e
            );
            Ok(None)
        }
    }
}
