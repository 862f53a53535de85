//! Server certificate trust evaluation for TLS client connections
//!
//! This library decides whether a certificate chain presented by a remote
//! server during TLS negotiation should be trusted, under a set of
//! independently toggleable verification policies. It is invoked by a
//! TLS/connection layer that supplies the peer's chain and the hostname the
//! caller dialed, and returns an accept/reject decision that layer uses to
//! complete or abort the handshake.
//!
//! # Overview
//!
//! Trust evaluation runs up to four checks, in fixed order, short-circuiting
//! on the first failure:
//!
//! - **Chain verification** - issuer/subject linkage and cryptographic
//!   signatures across the presented chain
//! - **Root trust** - the chain terminates in a certificate the operator has
//!   explicitly trusted, with an optional (audited) self-signed exception
//! - **Domain match** - the leaf certificate's claimed identity matches the
//!   dialed hostname, honoring a single-level `*.` wildcard form
//! - **Expiry** - every certificate in the chain is valid at the reference
//!   instant
//!
//! Each check is gated by its [`PolicySet`] flag; with everything disabled,
//! any non-empty chain is trusted.
//!
//! # Architecture
//!
//! The high-level entry point is [`TrustEvaluator::evaluate`], which
//! orchestrates the checks per policy. The individual checks are also
//! exported ([`verify_chain_linkage`], [`check_root_trust`],
//! [`check_identity`], [`check_validity`]) for callers composing custom
//! policies; they return the same typed errors the orchestrator propagates,
//! never wrapped or reclassified.
//!
//! Certificates arrive pre-parsed as [`Certificate`] values - X.509 byte
//! decoding belongs to the TLS layer, not to this crate. The minting
//! helpers ([`issue_certificate`], [`self_signed`]) produce real, verifiably
//! signed certificates (Ed25519 or ECDSA P-256) for provisioning and tests.
//!
//! # Trusted Roots
//!
//! [`TrustedRootSet`] keys trust by exact-certificate fingerprint, not
//! subject name. It loads from a fingerprint file once at configuration
//! time; a load failure is a [`Error::TrustStoreLoad`] the caller must act
//! on - root checking is never silently disabled. [`RootStore`] adds
//! copy-on-write reload for deployments that rotate anchors while
//! connections are in flight.
//!
//! # Example
//!
//! ```
//! use server_trust::*;
//! use std::sync::Arc;
//!
//! # fn main() -> server_trust::Result<()> {
//! let key = CertificateSigner::ed25519(ed25519_dalek::SigningKey::from_bytes(&[1u8; 32]));
//! let cert = self_signed(
//!     CertificateParams {
//!         subject: "CN=chat.example.com".into(),
//!         validity: ValidityWindow { not_before: 0, not_after: 2000000000 },
//!         server_identity: None,
//!     },
//!     &key,
//! );
//! let chain = CertificateChain::new(vec![cert])?;
//!
//! // Strict policy rejects the unanchored self-signed certificate...
//! let strict = TrustEvaluator::new(Arc::new(TrustedRootSet::new()), PolicySet::default());
//! assert!(strict.evaluate(&chain, "chat.example.com", 1700000000).is_err());
//!
//! // ...the explicit exception accepts it, with an audit event
//! let lenient = TrustEvaluator::new(
//!     Arc::new(TrustedRootSet::new()),
//!     PolicySet { accept_self_signed_if_untrusted: true, ..PolicySet::default() },
//! );
//! assert!(lenient.evaluate(&chain, "chat.example.com", 1700000000).is_ok());
//! # Ok(())
//! # }
//! ```
//!
//! # Security Considerations
//!
//! - **Fail-closed defaults**: [`PolicySet::default`] enables all four
//!   checks and disables the self-signed exception
//! - **Exact-certificate trust**: root membership compares fingerprints, so
//!   a forged certificate with a trusted subject but a different key never
//!   matches
//! - **Audited exceptions**: every self-signed acceptance notifies the
//!   [`AuditSink`] and emits a `tracing` warning
//! - **Loose wildcards**: domain wildcard matching is suffix-only (see
//!   [`check_identity`]) - preserved legacy semantics, documented rather
//!   than silently changed
//! - **Explicit store failures**: a trust store that fails to load is an
//!   error at configuration time, never an evaluation that quietly runs
//!   with an empty set

mod cert;
mod chain;
mod error;
mod identity;
mod issue;
mod roots;
mod validity;

mod trust;

pub use cert::{
    Certificate, CertificateChain, DistinguishedName, Fingerprint, ValidityWindow,
    ECDSA_SECP256R1_SHA256, ED25519_SIGNATURE_SCHEME,
};
pub use chain::verify_chain_linkage;
pub use error::{Error, Result};
pub use identity::{check_identity, peer_identity};
pub use issue::{
    encode_ecdsa_p256_spki, encode_ed25519_spki, issue_certificate, self_signed,
    CertificateParams, CertificateSigner, ECDSA_P256_SPKI_PREFIX, ED25519_SPKI_PREFIX,
};
pub use roots::{
    check_root_trust, RootStore, TrustStoreConfig, TrustedRootSet, FINGERPRINT_STORE_TYPE,
};
pub use trust::{AuditSink, PolicySet, TrustEvaluator, Trusted};
pub use validity::check_validity;
