//! Certificate minting
//!
//! Builds [`Certificate`] values signed with Ed25519 or ECDSA P-256. The
//! evaluator itself never issues anything; this module exists for the other
//! side of the seam - operator tooling that provisions trusted roots, and
//! test fixtures that need real, verifiable signatures rather than mocks.

use ed25519_dalek::{Signer, SigningKey};
use p256::ecdsa::SigningKey as EcdsaSigningKey;
use sha2::{Digest, Sha256};

use crate::cert::{
    Certificate, DistinguishedName, ValidityWindow, ECDSA_SECP256R1_SHA256,
    ED25519_SIGNATURE_SCHEME,
};

/// Ed25519 SPKI prefix (DER encoding of AlgorithmIdentifier + BIT STRING header)
///
/// Structure:
/// ```text
/// 30 2a                          ; SEQUENCE (42 bytes total)
///    30 05                       ; SEQUENCE (5 bytes) - AlgorithmIdentifier
///       06 03 2b 65 70           ; OID 1.3.101.112 (Ed25519)
///    03 21 00                    ; BIT STRING (33 bytes, 0 unused bits)
///       <32 bytes of public key>
/// ```
pub const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, // SEQUENCE (42 bytes)
    0x30, 0x05, // SEQUENCE (5 bytes)
    0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112
    0x03, 0x21, 0x00, // BIT STRING (33 bytes, 0 unused)
];

/// ECDSA P-256 SPKI prefix (DER encoding of AlgorithmIdentifier + BIT STRING header)
///
/// Structure:
/// ```text
/// 30 59                          ; SEQUENCE (89 bytes)
///    30 13                       ; SEQUENCE (19 bytes) - AlgorithmIdentifier
///       06 07 2a 86 48 ce 3d 02 01   ; OID 1.2.840.10045.2.1 (ecPublicKey)
///       06 08 2a 86 48 ce 3d 03 01 07 ; OID 1.2.840.10045.3.1.7 (secp256r1)
///    03 42 00                    ; BIT STRING (66 bytes, 0 unused)
///       04 <64 bytes of uncompressed point>
/// ```
pub const ECDSA_P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, // SEQUENCE (89 bytes)
    0x30, 0x13, // SEQUENCE (19 bytes)
    0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, // OID 1.2.840.10045.2.1
    0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, // OID 1.2.840.10045.3.1.7
    0x03, 0x42, 0x00, // BIT STRING (66 bytes, 0 unused)
];

/// Encode an Ed25519 public key as DER-encoded SPKI
pub fn encode_ed25519_spki(public_key: &[u8; 32]) -> Vec<u8> {
    let mut spki = Vec::with_capacity(44);
    spki.extend_from_slice(&ED25519_SPKI_PREFIX);
    spki.extend_from_slice(public_key);
    spki
}

/// Encode an ECDSA P-256 public key (uncompressed point) as DER-encoded SPKI
pub fn encode_ecdsa_p256_spki(public_key: &[u8; 65]) -> Vec<u8> {
    let mut spki = Vec::with_capacity(91);
    spki.extend_from_slice(&ECDSA_P256_SPKI_PREFIX);
    spki.extend_from_slice(public_key);
    spki
}

/// Extract the raw Ed25519 public key from a DER-encoded SPKI
///
/// Returns `None` when the length or the Ed25519 OID prefix does not match.
pub(crate) fn decode_ed25519_spki(spki: &[u8]) -> Option<[u8; 32]> {
    if spki.len() != 44 || spki[..12] != ED25519_SPKI_PREFIX {
        return None;
    }
    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&spki[12..44]);
    Some(public_key)
}

/// Extract the raw ECDSA P-256 public key from a DER-encoded SPKI
pub(crate) fn decode_ecdsa_p256_spki(spki: &[u8]) -> Option<[u8; 65]> {
    if spki.len() != 91 || spki[..26] != ECDSA_P256_SPKI_PREFIX {
        return None;
    }
    let mut public_key = [0u8; 65];
    public_key.copy_from_slice(&spki[26..91]);
    Some(public_key)
}

/// A certificate-signing key, Ed25519 or ECDSA P-256
pub enum CertificateSigner {
    Ed25519(SigningKey),
    EcdsaP256(EcdsaSigningKey),
}

impl CertificateSigner {
    pub fn ed25519(key: SigningKey) -> Self {
        Self::Ed25519(key)
    }

    pub fn ecdsa_p256(key: EcdsaSigningKey) -> Self {
        Self::EcdsaP256(key)
    }

    /// DER-encoded SPKI of the verifying key
    pub fn spki(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => encode_ed25519_spki(key.verifying_key().as_bytes()),
            Self::EcdsaP256(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                let mut pk_array = [0u8; 65];
                pk_array.copy_from_slice(point.as_bytes());
                encode_ecdsa_p256_spki(&pk_array)
            }
        }
    }

    /// TLS SignatureScheme code point of signatures this key produces
    pub fn algorithm(&self) -> u16 {
        match self {
            Self::Ed25519(_) => ED25519_SIGNATURE_SCHEME,
            Self::EcdsaP256(_) => ECDSA_SECP256R1_SHA256,
        }
    }

    /// Sign the to-be-signed bytes of a certificate
    ///
    /// Ed25519 signatures are raw 64-byte; ECDSA signatures are DER-encoded
    /// over the SHA-256 prehash, matching what
    /// [`Certificate::signature_is_valid`] expects.
    pub fn sign(&self, tbs: &[u8]) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => key.sign(tbs).to_bytes().to_vec(),
            Self::EcdsaP256(key) => {
                // ECDSA with SHA-256 - hash first, then sign the hash
                // (not the Signer trait, which may double-hash)
                use p256::ecdsa::signature::hazmat::PrehashSigner;
                let digest = Sha256::digest(tbs);
                let signature: p256::ecdsa::Signature =
                    key.sign_prehash(&digest).expect("failed to sign");
                signature.to_der().as_bytes().to_vec()
            }
        }
    }
}

/// Subject-side inputs to certificate issuance
#[derive(Debug, Clone)]
pub struct CertificateParams {
    pub subject: DistinguishedName,
    pub validity: ValidityWindow,
    /// Dedicated server-identity extension value, when the certificate
    /// should carry one (may be a `*.` wildcard pattern)
    pub server_identity: Option<String>,
}

/// Issue a certificate for `subject_spki`, signed by `issuer_key`
///
/// The issuer's name goes into the `issuer` field and the signature is made
/// over the new certificate's canonical TBS bytes.
pub fn issue_certificate(
    params: CertificateParams,
    subject_spki: Vec<u8>,
    issuer_name: DistinguishedName,
    issuer_key: &CertificateSigner,
) -> Certificate {
    let mut cert = Certificate {
        subject: params.subject,
        issuer: issuer_name,
        spki: subject_spki,
        validity: params.validity,
        server_identity: params.server_identity,
        algorithm: issuer_key.algorithm(),
        signature: Vec::new(),
    };
    cert.signature = issuer_key.sign(&cert.tbs_bytes());
    cert
}

/// Issue a self-signed certificate: subject = issuer, key signs itself
pub fn self_signed(params: CertificateParams, key: &CertificateSigner) -> Certificate {
    let issuer_name = params.subject.clone();
    issue_certificate(params, key.spki(), issuer_name, key)
}
