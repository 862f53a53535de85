//! Trust evaluation orchestration
//!
//! This module implements the trust decision made during TLS negotiation of
//! a client connection: given the certificate chain a remote server
//! presented and the hostname the caller dialed, decide whether to complete
//! or abort the handshake.
//!
//! # Overview
//!
//! [`TrustEvaluator`] runs up to four independent checks over the chain, in
//! a fixed order, each gated by its [`PolicySet`] flag and each
//! short-circuiting the rest on failure:
//!
//! 1. **Chain verification** - issuer/subject linkage and signatures
//!    ([`verify_chain_linkage`](crate::verify_chain_linkage))
//! 2. **Root trust** - chain terminates in a trusted anchor, with an
//!    optional self-signed escape hatch
//!    ([`check_root_trust`](crate::check_root_trust))
//! 3. **Domain match** - leaf identity vs. target hostname
//!    ([`check_identity`](crate::check_identity))
//! 4. **Expiry** - every certificate valid at the reference instant
//!    ([`check_validity`](crate::check_validity))
//!
//! If every enabled check passes (or all are disabled) the connection is
//! [`Trusted`]. On rejection the specific check's error propagates unwrapped
//! so the TLS layer can surface it and abort the handshake.
//!
//! # Concurrency
//!
//! The evaluator holds only read-only state (policy flags plus an `Arc`
//! trusted-root snapshot), so one evaluator instance can serve many
//! concurrent handshakes. Evaluation is synchronous, CPU-bound, and pure
//! given its inputs, apart from the audit side effect below. Nothing is
//! cached across calls.
//!
//! # Audit Channel
//!
//! Accepting an untrusted self-signed certificate is a policy decision an
//! operator should be able to see. When that exception is exercised the
//! evaluator notifies its [`AuditSink`] (exactly once per evaluation) and
//! emits a `tracing` warning; it is never absorbed silently.
//!
//! # Example
//!
//! ```
//! use server_trust::*;
//! use std::sync::Arc;
//!
//! # fn main() -> server_trust::Result<()> {
//! // Operator-provisioned anchor
//! let ca_key = CertificateSigner::ed25519(ed25519_dalek::SigningKey::from_bytes(&[1u8; 32]));
//! let ca = self_signed(
//!     CertificateParams {
//!         subject: "CN=Example Root".into(),
//!         validity: ValidityWindow { not_before: 0, not_after: 2000000000 },
//!         server_identity: None,
//!     },
//!     &ca_key,
//! );
//! let roots = Arc::new(TrustedRootSet::from_roots([&ca]));
//!
//! // Server presents its chain during the handshake
//! let server_key = CertificateSigner::ed25519(ed25519_dalek::SigningKey::from_bytes(&[2u8; 32]));
//! let server_cert = issue_certificate(
//!     CertificateParams {
//!         subject: "CN=chat.example.com".into(),
//!         validity: ValidityWindow { not_before: 0, not_after: 2000000000 },
//!         server_identity: None,
//!     },
//!     server_key.spki(),
//!     "CN=Example Root".into(),
//!     &ca_key,
//! );
//! let chain = CertificateChain::new(vec![server_cert, ca])?;
//!
//! let evaluator = TrustEvaluator::new(roots, PolicySet::default());
//! let trusted = evaluator.evaluate(&chain, "chat.example.com", 1700000000)?;
//! assert_eq!(trusted.peer_identity, "chat.example.com");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::cert::CertificateChain;
use crate::chain::verify_chain_linkage;
use crate::identity::{check_identity, peer_identity};
use crate::roots::{check_root_trust, TrustedRootSet};
use crate::validity::check_validity;
use crate::Result;

/// Independent verification policy switches
///
/// The flags have no ordering dependency between them, except that
/// `accept_self_signed_if_untrusted` only has an effect while `verify_root`
/// is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySet {
    /// Verify issuer/subject linkage and signatures across the chain
    pub verify_chain: bool,
    /// Require the chain to terminate in a trusted root
    pub verify_root: bool,
    /// Require the leaf identity to match the target hostname
    pub check_domain_match: bool,
    /// Require every certificate to be valid at the reference instant
    pub check_expiry: bool,
    /// Accept a single untrusted self-signed certificate anyway
    pub accept_self_signed_if_untrusted: bool,
}

impl Default for PolicySet {
    /// Fail-closed defaults: all four checks on, self-signed exception off
    fn default() -> Self {
        Self {
            verify_chain: true,
            verify_root: true,
            check_domain_match: true,
            check_expiry: true,
            accept_self_signed_if_untrusted: false,
        }
    }
}

impl PolicySet {
    /// All checks disabled; every non-empty chain evaluates as trusted
    pub fn disabled() -> Self {
        Self {
            verify_chain: false,
            verify_root: false,
            check_domain_match: false,
            check_expiry: false,
            accept_self_signed_if_untrusted: false,
        }
    }

    /// This policy with root verification switched off
    ///
    /// The explicit form of the decision a caller faces when the trust store
    /// fails to load: keep the remaining checks, drop root trust, and own
    /// that choice instead of having it made silently.
    pub fn without_root_verification(mut self) -> Self {
        self.verify_root = false;
        self
    }
}

/// Observer for security-relevant trust decisions
///
/// Invoked synchronously from [`TrustEvaluator::evaluate`]; implementations
/// should be cheap and must be thread-safe, since many handshakes may
/// evaluate concurrently.
pub trait AuditSink: Send + Sync {
    /// The self-signed exception was exercised for this peer
    fn self_signed_accepted(&self, peer_identity: &str);
}

/// Successful trust decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trusted {
    /// The identity the accepted leaf certificate claimed
    pub peer_identity: String,
}

/// Evaluates server certificate chains against a verification policy
///
/// Constructed once per policy domain and reused across connection
/// attempts; holds no mutable state. See the [module docs](self) for the
/// check sequence and an end-to-end example.
pub struct TrustEvaluator {
    roots: Arc<TrustedRootSet>,
    policy: PolicySet,
    audit: Option<Arc<dyn AuditSink>>,
}

impl TrustEvaluator {
    pub fn new(roots: Arc<TrustedRootSet>, policy: PolicySet) -> Self {
        Self {
            roots,
            policy,
            audit: None,
        }
    }

    /// Attach an audit observer for self-signed acceptance events
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn policy(&self) -> PolicySet {
        self.policy
    }

    /// Evaluate a presented chain against the target hostname
    ///
    /// `at` is the reference instant (Unix seconds) for expiry checking;
    /// inject a fixed value for reproducible tests, or use
    /// [`evaluate_at_now`](Self::evaluate_at_now).
    ///
    /// Checks run in fixed order - chain, root, domain, expiry - each gated
    /// by its policy flag; the first failure propagates unchanged. Pure per
    /// call apart from the audit notification.
    pub fn evaluate(
        &self,
        chain: &CertificateChain,
        target_identity: &str,
        at: u64,
    ) -> Result<Trusted> {
        let peer = peer_identity(chain.leaf());

        if self.policy.verify_chain {
            verify_chain_linkage(chain, &peer)?;
        }

        if self.policy.verify_root {
            check_root_trust(
                chain,
                &self.roots,
                self.policy.accept_self_signed_if_untrusted,
                self.audit.as_deref(),
                &peer,
            )?;
        }

        if self.policy.check_domain_match {
            check_identity(chain.leaf(), target_identity)?;
        }

        if self.policy.check_expiry {
            check_validity(chain, at, target_identity)?;
        }

        debug!(peer_identity = %peer, target_identity, "server certificate chain trusted");
        Ok(Trusted {
            peer_identity: peer,
        })
    }

    /// [`evaluate`](Self::evaluate) with the current system time
    pub fn evaluate_at_now(
        &self,
        chain: &CertificateChain,
        target_identity: &str,
    ) -> Result<Trusted> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.evaluate(chain, target_identity, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::{Certificate, ValidityWindow, ED25519_SIGNATURE_SCHEME};
    use crate::issue::{issue_certificate, self_signed, CertificateParams, CertificateSigner};
    use crate::Error;
    use ed25519_dalek::SigningKey;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: u64 = 1700000000;

    fn window() -> ValidityWindow {
        ValidityWindow {
            not_before: 0,
            not_after: 2000000000,
        }
    }

    fn params(subject: &str) -> CertificateParams {
        CertificateParams {
            subject: subject.into(),
            validity: window(),
            server_identity: None,
        }
    }

    /// [leaf, root] chain for chat.example.com plus the trusted-root set
    /// containing its root
    fn server_chain() -> (CertificateChain, Arc<TrustedRootSet>) {
        let ca_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[1u8; 32]));
        let server_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[2u8; 32]));

        let ca = self_signed(params("CN=Example Root"), &ca_key);
        let leaf = issue_certificate(
            params("CN=chat.example.com"),
            server_key.spki(),
            "CN=Example Root".into(),
            &ca_key,
        );

        let roots = Arc::new(TrustedRootSet::from_roots([&ca]));
        (CertificateChain::new(vec![leaf, ca]).unwrap(), roots)
    }

    fn self_signed_chain(subject: &str, seed: u8) -> CertificateChain {
        let key = CertificateSigner::ed25519(SigningKey::from_bytes(&[seed; 32]));
        CertificateChain::new(vec![self_signed(params(subject), &key)]).unwrap()
    }

    struct CountingSink(AtomicUsize);

    impl AuditSink for CountingSink {
        fn self_signed_accepted(&self, _peer_identity: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_full_policy_accepts_valid_chain() {
        let (chain, roots) = server_chain();
        let evaluator = TrustEvaluator::new(roots, PolicySet::default());

        let trusted = evaluator.evaluate(&chain, "chat.example.com", NOW).unwrap();
        assert_eq!(trusted.peer_identity, "chat.example.com");
    }

    #[test]
    fn test_self_signed_accepted_with_exception_and_audit_fires_once() {
        let chain = self_signed_chain("CN=standalone.example.com", 7);
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let policy = PolicySet {
            accept_self_signed_if_untrusted: true,
            ..PolicySet::default()
        };
        let evaluator = TrustEvaluator::new(Arc::new(TrustedRootSet::new()), policy)
            .with_audit_sink(sink.clone());

        let result = evaluator.evaluate(&chain, "standalone.example.com", NOW);
        assert!(result.is_ok());
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_signed_rejected_without_exception() {
        let chain = self_signed_chain("CN=standalone.example.com", 7);
        let evaluator =
            TrustEvaluator::new(Arc::new(TrustedRootSet::new()), PolicySet::default());

        assert!(matches!(
            evaluator.evaluate(&chain, "standalone.example.com", NOW),
            Err(Error::RootNotTrusted { .. })
        ));
    }

    #[test]
    fn test_linkage_failure_short_circuits_before_root_check() {
        // Leaf names the wrong issuer; even a trusted root set cannot save it
        let ca_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[1u8; 32]));
        let server_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[2u8; 32]));

        let ca = self_signed(params("CN=Example Root"), &ca_key);
        let leaf = issue_certificate(
            params("CN=chat.example.com"),
            server_key.spki(),
            "CN=Unrelated CA".into(),
            &ca_key,
        );
        let roots = Arc::new(TrustedRootSet::from_roots([&ca]));
        let chain = CertificateChain::new(vec![leaf, ca]).unwrap();

        let evaluator = TrustEvaluator::new(roots, PolicySet::default());
        assert!(matches!(
            evaluator.evaluate(&chain, "chat.example.com", NOW),
            Err(Error::ChainLinkage { .. })
        ));
    }

    #[test]
    fn test_wildcard_domain_match() {
        let ca_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[1u8; 32]));
        let server_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[2u8; 32]));

        let ca = self_signed(params("CN=Example Root"), &ca_key);
        let leaf = issue_certificate(
            params("CN=*.example.com"),
            server_key.spki(),
            "CN=Example Root".into(),
            &ca_key,
        );
        let roots = Arc::new(TrustedRootSet::from_roots([&ca]));
        let chain = CertificateChain::new(vec![leaf, ca]).unwrap();
        let evaluator = TrustEvaluator::new(roots, PolicySet::default());

        assert!(evaluator.evaluate(&chain, "chat.example.com", NOW).is_ok());
        assert!(matches!(
            evaluator.evaluate(&chain, "chat.other.com", NOW),
            Err(Error::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_expired_root_gated_by_check_expiry() {
        // Chain valid in every respect except the root's validity window
        let ca_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[1u8; 32]));
        let server_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[2u8; 32]));

        let ca = self_signed(
            CertificateParams {
                subject: "CN=Example Root".into(),
                validity: ValidityWindow {
                    not_before: 0,
                    not_after: NOW - 1,
                },
                server_identity: None,
            },
            &ca_key,
        );
        let leaf = issue_certificate(
            params("CN=chat.example.com"),
            server_key.spki(),
            "CN=Example Root".into(),
            &ca_key,
        );
        let roots = Arc::new(TrustedRootSet::from_roots([&ca]));
        let chain = CertificateChain::new(vec![leaf, ca]).unwrap();

        let strict = TrustEvaluator::new(roots.clone(), PolicySet::default());
        assert!(matches!(
            strict.evaluate(&chain, "chat.example.com", NOW),
            Err(Error::ExpiredCertificate { target }) if target == "chat.example.com"
        ));

        let lenient = TrustEvaluator::new(
            roots,
            PolicySet {
                check_expiry: false,
                ..PolicySet::default()
            },
        );
        assert!(lenient.evaluate(&chain, "chat.example.com", NOW).is_ok());
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let (chain, roots) = server_chain();
        let evaluator = TrustEvaluator::new(roots, PolicySet::default());

        let first = evaluator.evaluate(&chain, "chat.example.com", NOW).unwrap();
        let second = evaluator.evaluate(&chain, "chat.example.com", NOW).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_flags_disabled_trusts_anything() {
        // Garbage chain: no linkage, no signatures, expired, wrong name
        let garbage = Certificate {
            subject: "CN=nonsense".into(),
            issuer: "CN=elsewhere".into(),
            spki: vec![],
            validity: ValidityWindow {
                not_before: 0,
                not_after: 1,
            },
            server_identity: None,
            algorithm: ED25519_SIGNATURE_SCHEME,
            signature: vec![],
        };
        let chain = CertificateChain::new(vec![garbage]).unwrap();

        let evaluator =
            TrustEvaluator::new(Arc::new(TrustedRootSet::new()), PolicySet::disabled());
        let trusted = evaluator.evaluate(&chain, "chat.example.com", NOW).unwrap();
        assert_eq!(trusted.peer_identity, "nonsense");
    }

    #[test]
    fn test_without_root_verification_keeps_other_checks() {
        let policy = PolicySet::default().without_root_verification();
        assert!(!policy.verify_root);
        assert!(policy.verify_chain && policy.check_domain_match && policy.check_expiry);

        // An untrusted chain now passes, but only because root checking is off
        let (chain, _) = server_chain();
        let evaluator = TrustEvaluator::new(Arc::new(TrustedRootSet::new()), policy);
        assert!(evaluator.evaluate(&chain, "chat.example.com", NOW).is_ok());
    }

    #[test]
    fn test_domain_mismatch_reported_with_peer_identity() {
        let (chain, roots) = server_chain();
        let evaluator = TrustEvaluator::new(roots, PolicySet::default());

        assert!(matches!(
            evaluator.evaluate(&chain, "chat.other.com", NOW),
            Err(Error::IdentityMismatch { peer_identity }) if peer_identity == "chat.example.com"
        ));
    }

    #[test]
    fn test_evaluate_at_now_accepts_currently_valid_chain() {
        let (chain, roots) = server_chain();
        let evaluator = TrustEvaluator::new(roots, PolicySet::default());
        // Fixture windows span the present; both entry points agree
        assert!(evaluator.evaluate_at_now(&chain, "chat.example.com").is_ok());
    }
}
