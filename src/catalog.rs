//! Model identifiers and the vehicle catalog
//!
//! An identifier is the versioned, content-hashed URI of a model asset
//! (`static/models/perseverance-3f2a9c.glb.gz`). Its logical name is the part
//! of the file name before the first `-` and groups every historical variant
//! of the same asset.

use std::fmt;

use crate::error::{Result, ViewerError};

const WIKI_BASE: &str = "https://en.wikipedia.org/wiki";

/// Versioned reference to one model asset variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(String);

impl ModelId {
    /// Validate and wrap an identifier
    pub fn new(identifier: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        let trimmed = identifier.trim();
        if trimmed.is_empty() || file_name(trimmed).is_empty() {
            return Err(ViewerError::InvalidIdentifier(identifier));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the identifier
    pub fn file_name(&self) -> &str {
        file_name(&self.0)
    }

    /// Version-independent name shared by all variants of this asset
    pub fn logical_name(&self) -> &str {
        logical_name(&self.0)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn file_name(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Logical name of any cache key or identifier string
pub fn logical_name(uri: &str) -> &str {
    let file = file_name(uri);
    file.split('-').next().unwrap_or(file)
}

/// Vehicles the viewer knows how to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vehicle {
    Perseverance,
    Ingenuity,
}

impl Vehicle {
    pub const ALL: [Vehicle; 2] = [Vehicle::Perseverance, Vehicle::Ingenuity];

    pub fn logical_name(self) -> &'static str {
        match self {
            Self::Perseverance => "perseverance",
            Self::Ingenuity => "ingenuity",
        }
    }

    /// Human-readable name used in navigation
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Perseverance => "Perseverance",
            Self::Ingenuity => "Ingenuity",
        }
    }

    /// Encyclopedia topic holding this vehicle's facts
    pub fn wiki_topic(self) -> &'static str {
        match self {
            Self::Perseverance => "Perseverance_(rover)",
            Self::Ingenuity => "Ingenuity_(helicopter)",
        }
    }

    pub fn wiki_url(self) -> String {
        format!("{WIKI_BASE}/{}", self.wiki_topic())
    }

    pub fn route(self) -> &'static str {
        match self {
            Self::Perseverance => "/",
            Self::Ingenuity => "/ingenuity",
        }
    }

    /// Map a page route to the vehicle it shows
    pub fn from_route(route: &str) -> Option<Self> {
        match route.trim().trim_end_matches('/') {
            "" => Some(Self::Perseverance),
            "/ingenuity" => Some(Self::Ingenuity),
            _ => None,
        }
    }

    pub fn from_logical_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.logical_name() == name)
    }

    pub fn from_identifier(id: &ModelId) -> Option<Self> {
        Self::from_logical_name(id.logical_name())
    }
}
