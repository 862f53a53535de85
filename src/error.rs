//! Error types for trust evaluation operations
//!
//! This module defines the error types returned when a presented certificate
//! chain is rejected. All errors implement the standard [`std::error::Error`]
//! trait.
//!
//! Every rejection is terminal for the current handshake: nothing here is
//! retried by the evaluator itself. Each variant carries the peer or target
//! identity string so callers can log a meaningful audit trail.
//!
//! # Common Error Types
//!
//! - [`Error::ChainLinkage`] - issuer/subject mismatch inside the chain
//! - [`Error::SignatureVerification`] - a certificate's signature does not verify
//! - [`Error::RootNotTrusted`] - chain root absent from the trusted set
//! - [`Error::IdentityMismatch`] - peer identity does not match the dialed host
//! - [`Error::ExpiredCertificate`] - some certificate is outside its validity window
//! - [`Error::TrustStoreLoad`] - the trusted-root store could not be read
//!
//! # Result Type Alias
//!
//! [`Result<T>`] is a convenient alias for `std::result::Result<T, Error>`.

/// Error types for trust evaluation operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Subject/issuer linkage broken between adjacent chain certificates
    #[error("subject/issuer verification failed of {peer_identity}")]
    ChainLinkage { peer_identity: String },

    /// A certificate's signature does not verify against its issuer's key
    #[error("signature verification failed of {peer_identity}")]
    SignatureVerification { peer_identity: String },

    /// Chain root is not in the trusted set and no exception applies
    #[error("root certificate not trusted of {peer_identity}")]
    RootNotTrusted { peer_identity: String },

    /// Peer identity does not match the target hostname
    #[error("target verification failed of {peer_identity}")]
    IdentityMismatch { peer_identity: String },

    /// Some certificate in the chain is outside its validity window
    #[error("invalid date of {target}")]
    ExpiredCertificate { target: String },

    /// Trusted-root store could not be read or parsed at configuration time
    ///
    /// Never raised during evaluation; the caller must decide whether to
    /// proceed with root verification disabled or abort configuration.
    #[error("trust store load failed: {0}")]
    TrustStoreLoad(String),

    /// A certificate chain must contain at least one certificate
    #[error("certificate chain is empty")]
    EmptyChain,
}

/// Result type alias for trust evaluation operations
pub type Result<T> = std::result::Result<T, Error>;
