//! # Download Indirection
//!
//! Clients are handed a location to fetch the archive from instead of the
//! bytes themselves. When the blob backend cannot serve clients directly,
//! the location is this service's `downloadFile` sub-resource carrying a
//! short-lived signature.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::errors::{RegistryError, RegistryResult};
use super::model::Version;

/// Root of the Terraform module registry protocol
pub const MODULES_ROOT: &str = "/modules/v1";

/// Protocol path answering with the download location
pub fn download_path(version: &Version) -> String {
    format!(
        "{}/{}/{}/{}/{}/download",
        MODULES_ROOT, version.namespace, version.module, version.system, version.name
    )
}

/// Path serving the archive bytes
pub fn fetch_path(version: &Version) -> String {
    format!(
        "{}/{}/{}/{}/{}/downloadFile",
        MODULES_ROOT, version.namespace, version.module, version.system, version.name
    )
}

/// How downloads are handed to clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Answer with a location header the client follows
    #[default]
    Redirect,
    /// Stream the bytes through this service
    Proxy,
}

/// Where a client gets a version's archive from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadLocator {
    Redirect { location: String },
    Proxy { storage_key: String },
}

impl DownloadLocator {
    pub fn as_str(&self) -> &str {
        match self {
            DownloadLocator::Redirect { location } => location,
            DownloadLocator::Proxy { storage_key } => storage_key,
        }
    }
}

/// Signature and expiry attached to a `downloadFile` location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink {
    pub token: String,
    pub expires: i64,
}

impl SignedLink {
    pub fn new(token: impl Into<String>, expires: i64) -> Self {
        Self {
            token: token.into(),
            expires,
        }
    }

    pub fn to_query(&self) -> String {
        format!("token={}&expires={}", self.token, self.expires)
    }
}

/// Signs and verifies `downloadFile` links
#[derive(Clone)]
pub struct DownloadSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for DownloadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl DownloadSigner {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            secret: secret.to_vec(),
            ttl: Duration::seconds(ttl_secs.min(u64::from(u32::MAX)) as i64),
        }
    }

    /// Signer with a secret generated for this process
    pub fn random(ttl_secs: u64) -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(&secret, ttl_secs)
    }

    pub fn sign(&self, version: &Version) -> SignedLink {
        let expires = (Utc::now() + self.ttl).timestamp();
        SignedLink {
            token: self.signature(&version.storage_key, expires),
            expires,
        }
    }

    pub fn verify(&self, version: &Version, link: &SignedLink) -> RegistryResult<()> {
        if Utc::now().timestamp() > link.expires {
            return Err(RegistryError::DownloadLinkExpired);
        }

        let expected = self.signature(&version.storage_key, link.expires);
        if expected.as_bytes().ct_eq(link.token.as_bytes()).into() {
            Ok(())
        } else {
            Err(RegistryError::InvalidDownloadLink)
        }
    }

    fn signature(&self, storage_key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(format!("{}/{}", storage_key, expires).as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::model::{Module, Namespace, System};

    fn version(system: &str, name: &str) -> Version {
        let ns = Namespace::new("acme", "alice");
        let module = Module::new(&ns, "net");
        let system = System::new(&module, system);
        Version::new(&ns, &module, &system, name)
    }

    #[test]
    fn test_paths() {
        let v = version("aws", "1.0.0");
        assert_eq!(download_path(&v), "/modules/v1/acme/net/aws/1.0.0/download");
        assert_eq!(fetch_path(&v), "/modules/v1/acme/net/aws/1.0.0/downloadFile");
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = DownloadSigner::new(b"test-secret", 60);
        let v = version("aws", "1.0.0");

        let link = signer.sign(&v);
        assert!(!link.token.is_empty());
        assert!(signer.verify(&v, &link).is_ok());
        assert!(link.to_query().starts_with("token="));
    }

    #[test]
    fn test_link_bound_to_version() {
        let signer = DownloadSigner::new(b"test-secret", 60);
        let link = signer.sign(&version("aws", "1.0.0"));

        assert!(matches!(
            signer.verify(&version("aws", "1.0.1"), &link),
            Err(RegistryError::InvalidDownloadLink)
        ));
        assert!(matches!(
            signer.verify(&version("gcp", "1.0.0"), &link),
            Err(RegistryError::InvalidDownloadLink)
        ));
    }

    #[test]
    fn test_expired_link() {
        let signer = DownloadSigner::new(b"test-secret", 60);
        let v = version("aws", "1.0.0");
        let expires = Utc::now().timestamp() - 10;
        let link = SignedLink::new(signer.signature(&v.storage_key, expires), expires);

        assert!(matches!(
            signer.verify(&v, &link),
            Err(RegistryError::DownloadLinkExpired)
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let v = version("aws", "1.0.0");
        let link = DownloadSigner::random(60).sign(&v);
        assert!(DownloadSigner::random(60).verify(&v, &link).is_err());
    }

    #[test]
    fn test_mode_serde() {
        let mode: DownloadMode = serde_json::from_str("\"proxy\"").unwrap();
        assert_eq!(mode, DownloadMode::Proxy);
        assert_eq!(DownloadMode::default(), DownloadMode::Redirect);
    }
}
