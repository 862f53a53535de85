//! Temporal validity checking
//!
//! Every certificate in the chain must be valid at the reference instant.
//! The instant is injected by the caller (normally "now") so evaluations are
//! reproducible in tests.

use crate::cert::CertificateChain;
use crate::{Error, Result};

/// Check that every certificate's validity window contains `at`
///
/// Walks leaf to root and fails fast on the first out-of-window certificate;
/// the order does not affect the outcome since all must pass. The error
/// carries the *target* identity rather than the offending certificate's
/// subject, matching the diagnostic shape callers already log against.
///
/// # Errors
///
/// [`Error::ExpiredCertificate`] when some certificate is expired or not yet
/// valid at the reference instant.
pub fn check_validity(chain: &CertificateChain, at: u64, target: &str) -> Result<()> {
    for cert in chain.certs() {
        if !cert.validity.contains(at) {
            return Err(Error::ExpiredCertificate {
                target: target.to_string(),
            });
        }
    }
    Ok(())
}
