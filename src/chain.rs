//! Chain linkage and signature verification
//!
//! Confirms that the presented chain is internally consistent: every
//! certificate names its issuer correctly and carries a signature the named
//! issuer's key actually made.

use crate::cert::CertificateChain;
use crate::{Error, Result};

/// Verify issuer/subject linkage and signatures across the chain
///
/// Walks from the root-most end toward the leaf. For every adjacent pair the
/// subject of the more-root-ward certificate must equal the issuer named in
/// the more-leaf-ward certificate, and the leaf-ward certificate's signature
/// must verify against the root-ward certificate's public key. The walk
/// direction is deliberate: each step needs the next certificate's key
/// already established as the subject just checked.
///
/// A single-certificate chain passes trivially (no pairs to check). The
/// root-most certificate's own signature is not checked here; whether that
/// certificate is trusted at all is the root-trust check's concern.
///
/// # Errors
///
/// - [`Error::ChainLinkage`] when a subject/issuer pair mismatches
/// - [`Error::SignatureVerification`] when a signature fails to verify
///   (including malformed keys or signature bytes)
pub fn verify_chain_linkage(chain: &CertificateChain, peer_identity: &str) -> Result<()> {
    let certs = chain.certs();

    // Pairs (i, i+1), root-most pair first
    for i in (0..certs.len() - 1).rev() {
        let cert = &certs[i];
        let issuer_cert = &certs[i + 1];

        if cert.issuer != issuer_cert.subject {
            return Err(Error::ChainLinkage {
                peer_identity: peer_identity.to_string(),
            });
        }
        if !cert.signature_is_valid(&issuer_cert.spki) {
            return Err(Error::SignatureVerification {
                peer_identity: peer_identity.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::{Certificate, ValidityWindow};
    use crate::issue::{issue_certificate, self_signed, CertificateParams, CertificateSigner};
    use ed25519_dalek::SigningKey;

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

    /// Root -> intermediate -> leaf, all properly signed
    fn well_formed_chain() -> (Vec<Certificate>, CertificateSigner) {
        let root_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[1u8; 32]));
        let inter_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[2u8; 32]));
        let leaf_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[3u8; 32]));

        let root = self_signed(params("CN=Example Root"), &root_key);
        let inter = issue_certificate(
            params("CN=Example Intermediate"),
            inter_key.spki(),
            "CN=Example Root".into(),
            &root_key,
        );
        let leaf = issue_certificate(
            params("CN=chat.example.com"),
            leaf_key.spki(),
            "CN=Example Intermediate".into(),
            &inter_key,
        );

        (vec![leaf, inter, root], root_key)
    }

    #[test]
    fn test_well_formed_chain_passes() {
        let (certs, _) = well_formed_chain();
        let chain = CertificateChain::new(certs).unwrap();
        assert!(verify_chain_linkage(&chain, "chat.example.com").is_ok());
    }

    #[test]
    fn test_single_cert_chain_passes_trivially() {
        let key = CertificateSigner::ed25519(SigningKey::from_bytes(&[4u8; 32]));
        let chain =
            CertificateChain::new(vec![self_signed(params("CN=solo"), &key)]).unwrap();
        assert!(verify_chain_linkage(&chain, "solo").is_ok());
    }

    #[test]
    fn test_issuer_subject_mismatch_fails() {
        // Leaf names an issuer the root is not, regardless of signatures
        let root_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[1u8; 32]));
        let leaf_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[2u8; 32]));

        let root = self_signed(params("CN=Actual Root"), &root_key);
        let leaf = issue_certificate(
            params("CN=chat.example.com"),
            leaf_key.spki(),
            "CN=Some Other CA".into(),
            &root_key,
        );

        let chain = CertificateChain::new(vec![leaf, root]).unwrap();
        assert!(matches!(
            verify_chain_linkage(&chain, "chat.example.com"),
            Err(Error::ChainLinkage { peer_identity }) if peer_identity == "chat.example.com"
        ));
    }

    #[test]
    fn test_signature_by_wrong_key_fails() {
        // Linkage is consistent but the leaf was signed by an impostor key
        let root_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[1u8; 32]));
        let impostor_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[9u8; 32]));
        let leaf_key = CertificateSigner::ed25519(SigningKey::from_bytes(&[2u8; 32]));

        let root = self_signed(params("CN=Example Root"), &root_key);
        let leaf = issue_certificate(
            params("CN=chat.example.com"),
            leaf_key.spki(),
            "CN=Example Root".into(),
            &impostor_key,
        );

        let chain = CertificateChain::new(vec![leaf, root]).unwrap();
        assert!(matches!(
            verify_chain_linkage(&chain, "chat.example.com"),
            Err(Error::SignatureVerification { .. })
        ));
    }

    #[test]
    fn test_break_in_middle_of_long_chain_detected() {
        let (mut certs, _) = well_formed_chain();
        // Corrupt the intermediate's signature
        certs[1].signature[0] ^= 1;
        let chain = CertificateChain::new(certs).unwrap();
        assert!(matches!(
            verify_chain_linkage(&chain, "chat.example.com"),
            Err(Error::SignatureVerification { .. })
        ));
    }
}
