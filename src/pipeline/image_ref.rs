//! Container image references.
//!
//! Accepted form: `[registry[:port]/]repo/path[:tag][@sha256:<hex>]`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static REGISTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::[0-9]+)?$")
        .expect("valid registry pattern")
});

static REPOSITORY_COMPONENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").expect("valid repository pattern")
});

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w][\w.-]{0,127}$").expect("valid tag pattern"));

static DIGEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sha256:[a-f0-9]{64}$").expect("valid digest pattern"));

/// Image reference parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not parse reference: {0}")]
pub struct ReferenceError(pub String);

/// Parsed image reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    /// Registry host, when the reference names one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    /// Repository path
    pub repository: String,
    /// Tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Content digest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ImageReference {
    /// Returns true if the reference pins content by digest
    #[must_use]
    pub fn is_digest(&self) -> bool {
        self.digest.is_some()
    }
}

impl FromStr for ImageReference {
    type Err = ReferenceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = || ReferenceError(text.to_string());
        if text.is_empty() || text.chars().any(char::is_whitespace) {
            return Err(error());
        }

        let (name, digest) = match text.split_once('@') {
            Some((name, digest)) if DIGEST.is_match(digest) => (name, Some(digest.to_string())),
            Some(_) => return Err(error()),
            None => (text, None),
        };

        let (name, tag) = match name.rfind(':') {
            Some(colon) if name.rfind('/').is_none_or(|slash| colon > slash) => {
                let tag = &name[colon + 1..];
                if !TAG.is_match(tag) {
                    return Err(error());
                }
                (&name[..colon], Some(tag.to_string()))
            }
            _ => (name, None),
        };

        let mut components: Vec<&str> = name.split('/').collect();
        let names_registry = components.len() > 1
            && (components[0].contains(['.', ':']) || components[0] == "localhost");
        let registry = if names_registry {
            let host = components.remove(0);
            if !REGISTRY.is_match(host) {
                return Err(error());
            }
            Some(host.to_string())
        } else {
            None
        };
        if !components.iter().all(|c| REPOSITORY_COMPONENT.is_match(c)) {
            return Err(error());
        }

        Ok(Self {
            registry,
            repository: components.join("/"),
            tag,
            digest,
        })
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}
