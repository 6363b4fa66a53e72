//! Workspace bindings.
//!
//! A binding attaches exactly one concrete volume source to a workspace
//! declared by the task.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::validation::rules::validate_unique_names;
use crate::validation::{FieldErrors, Validate, ValidationContext};

const VOLUME_SOURCE_FIELDS: [&str; 5] = [
    "persistentvolumeclaim",
    "volumeclaimtemplate",
    "emptydir",
    "configmap",
    "secret",
];

/// Existing persistent volume claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSource {
    /// Claim name
    #[serde(default)]
    pub claim_name: String,
    /// Mount read-only
    #[serde(default)]
    pub read_only: bool,
}

/// Template for a claim created per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VolumeClaimTemplate {
    /// Access modes of the created claim
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_modes: Vec<String>,
    /// Requested storage, e.g. `1Gi`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// Scratch directory living as long as the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmptyDirSource {
    /// Storage medium
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub medium: String,
}

/// Config map projected as files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapSource {
    /// Config map name
    #[serde(default)]
    pub name: String,
    /// Key to path projections
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub items: BTreeMap<String, String>,
}

/// Secret projected as files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecretSource {
    /// Secret name
    #[serde(default)]
    pub secret_name: String,
}

/// Volume bound to a declared workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceBinding {
    /// Name of the declared workspace
    pub name: String,

    /// Directory within the volume to expose
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,

    /// Existing claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimSource>,

    /// Claim created for the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_claim_template: Option<VolumeClaimTemplate>,

    /// Scratch directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirSource>,

    /// Config map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMapSource>,

    /// Secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretSource>,
}

impl WorkspaceBinding {
    /// Binds `name` to a fresh scratch directory
    #[must_use]
    pub fn empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            empty_dir: Some(EmptyDirSource::default()),
            ..Self::default()
        }
    }

    /// Binds `name` to an existing claim
    #[must_use]
    pub fn claim(name: impl Into<String>, claim_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persistent_volume_claim: Some(PersistentVolumeClaimSource {
                claim_name: claim_name.into(),
                read_only: false,
            }),
            ..Self::default()
        }
    }

    fn source_count(&self) -> usize {
        [
            self.persistent_volume_claim.is_some(),
            self.volume_claim_template.is_some(),
            self.empty_dir.is_some(),
            self.config_map.is_some(),
            self.secret.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

impl Validate for WorkspaceBinding {
    fn validate(&self, _ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.name.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["name"]));
        }

        match self.source_count() {
            0 => return errs.also(FieldErrors::missing_one_of(&VOLUME_SOURCE_FIELDS)),
            1 => {}
            _ => return errs.also(FieldErrors::multiple_one_of(&VOLUME_SOURCE_FIELDS)),
        }

        if self
            .persistent_volume_claim
            .as_ref()
            .is_some_and(|pvc| pvc.claim_name.is_empty())
        {
            errs = errs.also(FieldErrors::missing_field(&["persistentvolumeclaim.claimname"]));
        }
        if self.config_map.as_ref().is_some_and(|cm| cm.name.is_empty()) {
            errs = errs.also(FieldErrors::missing_field(&["configmap.name"]));
        }
        if self.secret.as_ref().is_some_and(|s| s.secret_name.is_empty()) {
            errs = errs.also(FieldErrors::missing_field(&["secret.secretname"]));
        }
        errs
    }
}

/// Validates a binding list, reporting repeated names at the repeat's index
#[must_use]
pub fn validate_workspace_bindings(
    bindings: &[WorkspaceBinding],
    ctx: &ValidationContext,
) -> FieldErrors {
    let names = bindings.iter().map(|b| b.name.as_str());
    bindings
        .validate(ctx)
        .via_field("workspaces")
        .also(validate_unique_names("workspaces", names, false))
}
