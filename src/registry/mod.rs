//! # Registry
//!
//! Namespace → module → system → version hierarchy, its uniqueness and
//! delete-protection rules, and the mapping from coordinates to stored
//! artifacts.

pub mod catalog;
pub mod download;
pub mod errors;
pub mod facade;
pub mod locks;
pub mod model;
pub mod module;
pub mod names;
pub mod namespace;
pub mod system;
pub mod version;

pub use catalog::Catalog;
pub use download::{DownloadLocator, DownloadMode, DownloadSigner, SignedLink};
pub use errors::{RegistryError, RegistryResult};
pub use facade::{Registry, RegistryOptions};
pub use locks::CoordinateLocks;
pub use model::{Level, Module, Namespace, System, Version};
pub use module::ModuleResolver;
pub use namespace::NamespaceResolver;
pub use system::SystemResolver;
pub use version::VersionManager;
