//! Certificate and chain data model
//!
//! The evaluator never parses X.509 byte encodings itself; certificates
//! arrive from the TLS layer already parsed into the [`Certificate`] form
//! below. A certificate is immutable once obtained from the peer and is only
//! borrowed for the duration of one evaluation.
//!
//! [`Certificate::tbs_bytes`] produces a canonical length-prefixed encoding
//! of everything except the signature itself; the signature on a certificate
//! covers exactly those bytes. [`Certificate::fingerprint`] hashes the whole
//! certificate (to-be-signed bytes plus signature) and is the identity used
//! for exact-certificate membership in the trusted-root set.

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// TLS SignatureScheme for Ed25519 (RFC 8446)
pub const ED25519_SIGNATURE_SCHEME: u16 = 0x0807;

/// TLS SignatureScheme for ECDSA P-256 SHA-256 (RFC 8446)
pub const ECDSA_SECP256R1_SHA256: u16 = 0x0403;

/// SHA-256 hash identifying one exact certificate (32 bytes)
pub type Fingerprint = [u8; 32];

/// A distinguished-name-like identity, e.g. `"CN=chat.example.com"`
///
/// Stored as normalized text. Equality is exact string equality, which is
/// what chain linkage checking compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistinguishedName(String);

impl DistinguishedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The common-name component, per the `CN=` prefix convention
    ///
    /// Returns the name with a leading `CN=` stripped, or the full name text
    /// when no such prefix is present.
    pub fn common_name(&self) -> &str {
        self.0.strip_prefix("CN=").unwrap_or(&self.0)
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DistinguishedName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Temporal validity bounds of a certificate (Unix epoch seconds, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub not_before: u64,
    pub not_after: u64,
}

impl ValidityWindow {
    /// Whether the reference instant falls within the window
    pub fn contains(&self, at: u64) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// A parsed server certificate as delivered by the TLS layer
///
/// # Fields
///
/// - `subject` / `issuer` - distinguished names for linkage checking
/// - `spki` - DER-encoded SubjectPublicKeyInfo of the certified key
/// - `validity` - not-before/not-after instants
/// - `server_identity` - dedicated server-identity extension, when present;
///   preferred over the subject common name for identity matching
/// - `algorithm` - TLS SignatureScheme of the issuer's signature
/// - `signature` - signature over [`Certificate::tbs_bytes`], verifiable
///   against the issuer's SPKI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    pub spki: Vec<u8>,
    pub validity: ValidityWindow,
    pub server_identity: Option<String>,
    pub algorithm: u16,
    pub signature: Vec<u8>,
}

impl Certificate {
    /// Canonical to-be-signed encoding of the certificate
    ///
    /// Length-prefixed fields in fixed order: subject, issuer, SPKI,
    /// validity bounds, server identity (presence byte then value), and the
    /// signature algorithm. The signature bytes are excluded.
    pub fn tbs_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        push_opaque(&mut buf, self.subject.as_str().as_bytes());
        push_opaque(&mut buf, self.issuer.as_str().as_bytes());
        push_opaque(&mut buf, &self.spki);

        buf.extend_from_slice(&self.validity.not_before.to_be_bytes());
        buf.extend_from_slice(&self.validity.not_after.to_be_bytes());

        match &self.server_identity {
            Some(identity) => {
                buf.push(1);
                push_opaque(&mut buf, identity.as_bytes());
            }
            None => buf.push(0),
        }

        buf.extend_from_slice(&self.algorithm.to_be_bytes());
        buf
    }

    /// SHA-256 fingerprint over the full certificate (TBS bytes + signature)
    ///
    /// Two certificates share a fingerprint only when every field, including
    /// the key and the signature, is identical. This is the membership key of
    /// [`TrustedRootSet`](crate::TrustedRootSet): a forged certificate that
    /// copies a trusted subject but carries a different key never matches.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.tbs_bytes());
        hasher.update(&self.signature);
        hasher.finalize().into()
    }

    /// Whether subject and issuer name the same entity
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    /// Verify this certificate's signature against an issuer SPKI
    ///
    /// Returns `false` for an unknown algorithm, a malformed key or
    /// signature, or a failed verification; the chain verifier maps all of
    /// those to [`Error::SignatureVerification`](crate::Error).
    pub fn signature_is_valid(&self, issuer_spki: &[u8]) -> bool {
        let tbs = self.tbs_bytes();

        if self.algorithm == ED25519_SIGNATURE_SCHEME {
            use ed25519_dalek::{Signature, Verifier, VerifyingKey};

            let Some(public_key) = crate::issue::decode_ed25519_spki(issuer_spki) else {
                return false;
            };
            let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key) else {
                return false;
            };
            let Ok(signature) = Signature::from_slice(&self.signature) else {
                return false;
            };
            verifying_key.verify(&tbs, &signature).is_ok()
        } else if self.algorithm == ECDSA_SECP256R1_SHA256 {
            use p256::ecdsa::signature::hazmat::PrehashVerifier;
            use p256::ecdsa::{Signature, VerifyingKey};

            let Some(public_key) = crate::issue::decode_ecdsa_p256_spki(issuer_spki) else {
                return false;
            };
            let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&public_key) else {
                return false;
            };
            let Ok(signature) = Signature::from_der(&self.signature) else {
                return false;
            };

            // ECDSA with SHA-256 - hash first, then verify against the hash
            let digest = Sha256::digest(&tbs);
            verifying_key.verify_prehash(&digest, &signature).is_ok()
        } else {
            false
        }
    }
}

/// Write a u16 length prefix followed by the data
fn push_opaque(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u16).to_be_bytes());
    buf.extend_from_slice(data);
}

/// An ordered, non-empty certificate chain as presented by the peer
///
/// Index 0 is the leaf (the peer's own certificate); increasing index moves
/// toward the root. No ordering invariant beyond non-emptiness is assumed at
/// construction; linkage is what the chain verifier checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
}

impl CertificateChain {
    /// Wrap the presented certificates, rejecting an empty sequence
    pub fn new(certs: Vec<Certificate>) -> Result<Self> {
        if certs.is_empty() {
            return Err(Error::EmptyChain);
        }
        Ok(Self { certs })
    }

    /// The peer's own certificate (index 0)
    pub fn leaf(&self) -> &Certificate {
        &self.certs[0]
    }

    /// The root-most certificate (last element)
    pub fn root(&self) -> &Certificate {
        &self.certs[self.certs.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        false // non-empty by construction
    }

    pub fn certs(&self) -> &[Certificate] {
        &self.certs
    }
}
