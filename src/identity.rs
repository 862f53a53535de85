//! Peer identity extraction and domain matching
//!
//! Decides whether the leaf certificate actually names the host the caller
//! dialed. The claimed identity comes from the dedicated server-identity
//! extension when the certificate carries one, otherwise from the common-name
//! component of the subject distinguished name.

use crate::cert::Certificate;
use crate::{Error, Result};

/// Wildcard marker for identities matching subdomains
const WILDCARD_PREFIX: &str = "*.";

/// The identity claimed by the peer's leaf certificate
///
/// Prefers the server-identity extension; falls back to the subject's
/// common name (`CN=` prefix stripped) when no extension is present.
pub fn peer_identity(cert: &Certificate) -> String {
    match &cert.server_identity {
        Some(identity) => identity.clone(),
        None => cert.subject.common_name().to_string(),
    }
}

/// Check the leaf certificate's claimed identity against the dialed host
///
/// A claimed identity starting with `*.` matches when the target ends with
/// the remainder after stripping the marker; anything else requires exact
/// equality.
///
/// Note the wildcard check is suffix-only: it does not enforce a label
/// boundary, so `*.example.com` also matches `evil-example.com`. That
/// matches the legacy behavior this component preserves; strict single-label
/// matching is an open semantics question, not silently fixed here.
///
/// # Errors
///
/// [`Error::IdentityMismatch`] on any non-match, carrying the computed peer
/// identity (the stripped suffix, in the wildcard case).
pub fn check_identity(leaf: &Certificate, target: &str) -> Result<()> {
    let identity = peer_identity(leaf);

    match identity.strip_prefix(WILDCARD_PREFIX) {
        Some(suffix) => {
            if target.ends_with(suffix) {
                Ok(())
            } else {
                Err(Error::IdentityMismatch {
                    peer_identity: suffix.to_string(),
                })
            }
        }
        None => {
            if target == identity {
                Ok(())
            } else {
                Err(Error::IdentityMismatch {
                    peer_identity: identity,
                })
            }
        }
    }
}
