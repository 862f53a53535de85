//! Trusted-root set and root-trust checking
//!
//! A [`TrustedRootSet`] holds the certificates an operator has decided to
//! trust as anchors, keyed by exact-certificate fingerprint rather than
//! subject name: a forged certificate carrying a trusted subject but a
//! different key never matches.
//!
//! The set is loaded once at configuration time. Load failures surface as
//! [`Error::TrustStoreLoad`] at that point - never deferred into evaluation,
//! and never silently downgraded to "root checking disabled". The caller
//! must decide explicitly, e.g. via
//! [`PolicySet::without_root_verification`](crate::PolicySet::without_root_verification).
//!
//! For deployments that rotate anchors at runtime, [`RootStore`] wraps the
//! set in a copy-on-write snapshot: evaluations read an `Arc` snapshot and a
//! concurrent reload swaps the whole set atomically, so no evaluation ever
//! observes a partially updated root set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::cert::{Certificate, CertificateChain, Fingerprint};
use crate::trust::AuditSink;
use crate::{Error, Result};

/// Store-type identifier for fingerprint files, the only supported format
pub const FINGERPRINT_STORE_TYPE: &str = "fingerprints";

/// Set of trusted root certificates, queried by exact-certificate identity
#[derive(Debug, Clone, Default)]
pub struct TrustedRootSet {
    fingerprints: HashSet<Fingerprint>,
}

impl TrustedRootSet {
    /// An empty set (trusts nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from trusted certificates
    pub fn from_roots<'a>(roots: impl IntoIterator<Item = &'a Certificate>) -> Self {
        Self {
            fingerprints: roots.into_iter().map(Certificate::fingerprint).collect(),
        }
    }

    /// Load from a fingerprint file
    ///
    /// One lowercase hex SHA-256 certificate fingerprint (64 digits) per
    /// line; blank lines and `#` comments are skipped.
    ///
    /// # Errors
    ///
    /// [`Error::TrustStoreLoad`] on any I/O failure, malformed hex, or a
    /// fingerprint of the wrong length. Reported at load time so the caller
    /// can make an explicit policy decision instead of evaluating against a
    /// silently empty set.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::TrustStoreLoad(format!("{}: {}", path.display(), e)))?;

        let mut fingerprints = HashSet::new();
        for (lineno, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let decoded = hex::decode(line).map_err(|e| {
                Error::TrustStoreLoad(format!(
                    "{}:{}: invalid hex fingerprint: {}",
                    path.display(),
                    lineno + 1,
                    e
                ))
            })?;
            let fingerprint: Fingerprint = decoded.try_into().map_err(|_| {
                Error::TrustStoreLoad(format!(
                    "{}:{}: fingerprint must be 32 bytes (64 hex digits)",
                    path.display(),
                    lineno + 1,
                ))
            })?;
            fingerprints.insert(fingerprint);
        }

        Ok(Self { fingerprints })
    }

    /// Add one trusted certificate
    pub fn insert(&mut self, root: &Certificate) {
        self.fingerprints.insert(root.fingerprint());
    }

    /// Exact-certificate membership test
    pub fn contains(&self, cert: &Certificate) -> bool {
        self.fingerprints.contains(&cert.fingerprint())
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

/// External trust store location and format
///
/// The store-type identifier is validated up front; an unrecognized type is
/// a [`Error::TrustStoreLoad`] at configuration time, not a surprise later.
#[derive(Debug, Clone)]
pub struct TrustStoreConfig {
    pub path: PathBuf,
    pub store_type: String,
}

impl TrustStoreConfig {
    pub fn new(path: impl Into<PathBuf>, store_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            store_type: store_type.into(),
        }
    }

    /// Load the trusted-root set this config points at
    pub fn load(&self) -> Result<TrustedRootSet> {
        if self.store_type != FINGERPRINT_STORE_TYPE {
            return Err(Error::TrustStoreLoad(format!(
                "unsupported store type: {}",
                self.store_type
            )));
        }
        TrustedRootSet::load(&self.path)
    }
}

/// Reloadable holder of the trusted-root set
///
/// Readers take an [`Arc`] snapshot via [`RootStore::snapshot`] and keep
/// using it for the whole evaluation; [`RootStore::reload`] swaps in a new
/// set without touching snapshots already handed out.
#[derive(Debug)]
pub struct RootStore {
    current: RwLock<Arc<TrustedRootSet>>,
}

impl RootStore {
    pub fn new(roots: TrustedRootSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(roots)),
        }
    }

    /// The current set; stable for as long as the caller holds it
    pub fn snapshot(&self) -> Arc<TrustedRootSet> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the whole set atomically
    pub fn reload(&self, roots: TrustedRootSet) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(roots);
    }
}

/// Check that the chain terminates in a trusted root
///
/// Tests the root-most certificate for exact membership in the set. When it
/// is absent, a chain of exactly one certificate is still accepted if the
/// self-signed exception is enabled; that path notifies the audit sink and
/// emits a `warn!` event so operators can see every trust decision made this
/// way.
///
/// # Errors
///
/// [`Error::RootNotTrusted`] when the root is untrusted and the exception
/// does not apply.
pub fn check_root_trust(
    chain: &CertificateChain,
    roots: &TrustedRootSet,
    accept_self_signed: bool,
    audit: Option<&dyn AuditSink>,
    peer_identity: &str,
) -> Result<()> {
    if roots.contains(chain.root()) {
        return Ok(());
    }

    if chain.len() == 1 && accept_self_signed {
        warn!(
            peer_identity,
            "accepting self-signed certificate of remote server"
        );
        if let Some(sink) = audit {
            sink.self_signed_accepted(peer_identity);
        }
        return Ok(());
    }

    Err(Error::RootNotTrusted {
        peer_identity: peer_identity.to_string(),
    })
}
