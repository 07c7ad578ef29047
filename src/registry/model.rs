//! # Registry Entities
//!
//! Every entity carries copies of its ancestors' names instead of a foreign
//! key. The parent chain is written once at creation and never changes;
//! there is no rename operation at any level.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Collection holding namespaces
pub const NAMESPACE_COLLECTION: &str = "namespace";
/// Collection holding modules
pub const MODULE_COLLECTION: &str = "module";
/// Collection holding systems
pub const SYSTEM_COLLECTION: &str = "systems";
/// Collection holding versions
pub const VERSION_COLLECTION: &str = "versions";

/// Level of the registry hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Namespace,
    Module,
    System,
    Version,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Namespace => "namespace",
            Level::Module => "module",
            Level::System => "system",
            Level::Version => "version",
        }
    }

    /// The level directly below this one
    pub fn child(&self) -> Option<Level> {
        match self {
            Level::Namespace => Some(Level::Module),
            Level::Module => Some(Level::System),
            Level::System => Some(Level::Version),
            Level::Version => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record stored in the catalog
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
    const LEVEL: Level;

    /// Stable identifier, unique within the collection
    fn id(&self) -> &str;
}

/// Identifier of a module
pub fn module_id(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// Identifier of a system
pub fn system_id(namespace: &str, module: &str, name: &str) -> String {
    format!("{}/{}/{}", namespace, module, name)
}

/// Identifier of a version
pub fn version_id(namespace: &str, module: &str, system: &str, name: &str) -> String {
    format!("{}/{}/{}/{}", namespace, module, system, name)
}

/// Blob key of a version's archive. Depends only on the coordinates.
pub fn storage_key(namespace: &str, module: &str, system: &str, version: &str) -> String {
    format!("{}/{}/{}/{}.zip", namespace, module, system, version)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Namespace {
    pub fn new(name: &str, owner: &str) -> Self {
        let now = Utc::now();
        Self {
            id: name.to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            created: now,
            updated: now,
        }
    }
}

impl Entity for Namespace {
    const COLLECTION: &'static str = NAMESPACE_COLLECTION;
    const LEVEL: Level = Level::Namespace;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Module {
    pub fn new(namespace: &Namespace, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: module_id(&namespace.name, name),
            name: name.to_string(),
            namespace: namespace.name.clone(),
            created: now,
            updated: now,
        }
    }
}

impl Entity for Module {
    const COLLECTION: &'static str = MODULE_COLLECTION;
    const LEVEL: Level = Level::Module;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub module: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl System {
    pub fn new(module: &Module, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: system_id(&module.namespace, &module.name, name),
            name: name.to_string(),
            namespace: module.namespace.clone(),
            module: module.name.clone(),
            created: now,
            updated: now,
        }
    }
}

impl Entity for System {
    const COLLECTION: &'static str = SYSTEM_COLLECTION;
    const LEVEL: Level = Level::System;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub module: String,
    pub system: String,
    pub storage_key: String,
    pub created: DateTime<Utc>,
}

impl Version {
    pub fn new(namespace: &Namespace, module: &Module, system: &System, name: &str) -> Self {
        Self {
            id: version_id(&namespace.name, &module.name, &system.name, name),
            name: name.to_string(),
            namespace: namespace.name.clone(),
            module: module.name.clone(),
            system: system.name.clone(),
            storage_key: storage_key(&namespace.name, &module.name, &system.name, name),
            created: Utc::now(),
        }
    }
}

impl Entity for Version {
    const COLLECTION: &'static str = VERSION_COLLECTION;
    const LEVEL: Level = Level::Version;

    fn id(&self) -> &str {
        &self.id
    }
}
