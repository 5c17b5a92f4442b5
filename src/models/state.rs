// Wizard session state.
//
// `WizardState` is the single mutable value the wizard operates on. It is
// split into two persisted blobs (raw field values vs. session/verification
// metadata, see `persistence`) so a reload can resume exactly where the
// applicant left off.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::fields::{Field, RegistrationFields};

/// Verification channels with their own confirm protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Phone,
    Email,
    Bvn,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Phone => "phone",
            Channel::Email => "email",
            Channel::Bvn => "bvn",
        }
    }
}

/// Per-channel verification record.
///
/// `verified` is only meaningful together with `verified_value`: the moment
/// the live field value differs from `verified_value`, the flag must be
/// reset. The engine enforces this on every field write, not just on submit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelVerification {
    pub verified: bool,
    pub verified_value: String,
}

impl ChannelVerification {
    pub fn mark_verified(&mut self, value: &str) {
        self.verified = true;
        self.verified_value = value.to_string();
    }

    pub fn invalidate(&mut self) {
        self.verified = false;
    }

    /// True when the channel is verified for exactly this value.
    pub fn is_verified_for(&self, value: &str) -> bool {
        self.verified && self.verified_value == value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationState {
    pub phone: ChannelVerification,
    pub email: ChannelVerification,
    pub bvn: ChannelVerification,
}

impl VerificationState {
    pub fn channel(&self, channel: Channel) -> &ChannelVerification {
        match channel {
            Channel::Phone => &self.phone,
            Channel::Email => &self.email,
            Channel::Bvn => &self.bvn,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut ChannelVerification {
        match channel {
            Channel::Phone => &mut self.phone,
            Channel::Email => &mut self.email,
            Channel::Bvn => &mut self.bvn,
        }
    }
}

/// Tracks which server-side records already exist for this session so a
/// retry after a partial failure reuses them instead of creating duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerLinkage {
    /// Immutable once set; later steps attach sub-resources to this id.
    pub customer_id: Option<String>,
    pub financial_data_saved: bool,
    pub employment_data_saved: bool,
    pub selfie_saved: bool,
}

/// The whole wizard session. Lives for the duration of the registration,
/// persisted across reloads, cleared only on final success or explicit reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardState {
    pub fields: RegistrationFields,
    /// 1-based; bounds [1, total step count].
    pub current_step: usize,
    pub completed_steps: BTreeSet<usize>,
    pub verification: VerificationState,
    pub server_linkage: ServerLinkage,
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            current_step: 1,
            ..Default::default()
        }
    }

    /// Write a field value, invalidating any verification tied to it when the
    /// value moves away from what was verified, and dropping the owning
    /// step's completion mark so it re-validates on the next pass.
    pub fn apply_field_change(&mut self, field: Field, value: &str, owning_step: Option<usize>) {
        let previous = self.fields.get(field);
        if previous == value {
            return;
        }
        self.fields.set(field, value);

        if let Some(channel) = field.verification_channel() {
            let record = self.verification.channel_mut(channel);
            if record.verified && record.verified_value != value {
                record.invalidate();
            }
        }

        if let Some(step) = owning_step {
            self.completed_steps.remove(&step);
        }
    }
}
