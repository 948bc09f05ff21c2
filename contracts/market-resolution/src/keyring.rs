//! Off-chain signing for admins.
//!
//! Admin signing keys are stored sealed. A key is decrypted only for the
//! duration of one signing call: the plaintext lives in `Zeroizing` and the
//! `SigningKey` wipes itself on drop, so both are cleared on every exit path,
//! including early returns and unwinding. Only the detached signature leaves
//! this module.

use core::fmt;

use ed25519_dalek::{Signer, SigningKey};
use zeroize::Zeroizing;

/// An encrypted ed25519 secret plus the public key it must decrypt to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SealedSecret {
    pub public_key: [u8; 32],
    pub ciphertext: [u8; 32],
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyringError {
    /// The vault could not open the secret
    Decrypt,
    /// Decrypted secret does not match the sealed public key
    KeyMismatch,
    /// Key is not a member of the quorum being signed for
    UnauthorizedSigner,
}

impl fmt::Display for KeyringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyringError::Decrypt => write!(f, "secret could not be decrypted"),
            KeyringError::KeyMismatch => write!(f, "decrypted key does not match public key"),
            KeyringError::UnauthorizedSigner => write!(f, "key is not a quorum member"),
        }
    }
}

/// Decrypts sealed admin secrets. Implemented by whatever holds the
/// encryption key (HSM, KMS, local keystore).
pub trait SecretVault {
    fn decrypt(&self, sealed: &SealedSecret) -> Result<Zeroizing<[u8; 32]>, KeyringError>;
}

/// Run `f` with the decrypted signing key. The key does not outlive the call.
pub fn with_signing_key<V, F, R>(vault: &V, sealed: &SealedSecret, f: F) -> Result<R, KeyringError>
where
    V: SecretVault + ?Sized,
    F: FnOnce(&SigningKey) -> R,
{
    let secret = vault.decrypt(sealed)?;
    let signing_key = SigningKey::from_bytes(&secret);
    if signing_key.verifying_key().to_bytes() != sealed.public_key {
        return Err(KeyringError::KeyMismatch);
    }
    Ok(f(&signing_key))
}

/// Detached signature over a settlement digest, for submission to
/// `propose_resolution` or `sign_resolution`.
pub fn partial_sign<V>(
    vault: &V,
    sealed: &SealedSecret,
    quorum_keys: &[[u8; 32]],
    digest: &[u8; 32],
) -> Result<[u8; 64], KeyringError>
where
    V: SecretVault + ?Sized,
{
    if !quorum_keys.contains(&sealed.public_key) {
        return Err(KeyringError::UnauthorizedSigner);
    }
    with_signing_key(vault, sealed, |key| key.sign(digest).to_bytes())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    /// XOR "encryption", enough to exercise the decrypt path.
    pub(crate) struct XorVault {
        pub mask: [u8; 32],
    }

    impl XorVault {
        pub fn seal(&self, secret: &[u8; 32]) -> SealedSecret {
            let mut ciphertext = [0u8; 32];
            for (i, byte) in secret.iter().enumerate() {
                ciphertext[i] = byte ^ self.mask[i];
            }
            SealedSecret {
                public_key: SigningKey::from_bytes(secret).verifying_key().to_bytes(),
                ciphertext,
            }
        }
    }

    impl SecretVault for XorVault {
        fn decrypt(&self, sealed: &SealedSecret) -> Result<Zeroizing<[u8; 32]>, KeyringError> {
            let mut plain = Zeroizing::new([0u8; 32]);
            for (i, byte) in sealed.ciphertext.iter().enumerate() {
                plain[i] = byte ^ self.mask[i];
            }
            Ok(plain)
        }
    }

    struct LockedVault;

    impl SecretVault for LockedVault {
        fn decrypt(&self, _sealed: &SealedSecret) -> Result<Zeroizing<[u8; 32]>, KeyringError> {
            Err(KeyringError::Decrypt)
        }
    }

    #[test]
    fn test_signature_verifies_against_public_key() {
        let vault = XorVault { mask: [0x5a; 32] };
        let sealed = vault.seal(&[11u8; 32]);
        let digest = [7u8; 32];

        let bytes = partial_sign(&vault, &sealed, &[sealed.public_key], &digest).unwrap();

        let verifying = SigningKey::from_bytes(&[11u8; 32]).verifying_key();
        assert!(verifying
            .verify(&digest, &Signature::from_bytes(&bytes))
            .is_ok());
    }

    #[test]
    fn test_non_member_is_refused_before_decrypt() {
        let sealed = XorVault { mask: [1; 32] }.seal(&[11u8; 32]);
        let other = [9u8; 32];
        // LockedVault would fail with Decrypt if it were reached
        assert_eq!(
            partial_sign(&LockedVault, &sealed, &[other], &[0u8; 32]),
            Err(KeyringError::UnauthorizedSigner)
        );
    }

    #[test]
    fn test_wrong_vault_key_is_a_mismatch() {
        let sealed = XorVault { mask: [1; 32] }.seal(&[11u8; 32]);
        let wrong = XorVault { mask: [2; 32] };
        assert_eq!(
            with_signing_key(&wrong, &sealed, |_| ()),
            Err(KeyringError::KeyMismatch)
        );
    }

    #[test]
    fn test_decrypt_failure_propagates() {
        let sealed = XorVault { mask: [1; 32] }.seal(&[11u8; 32]);
        assert_eq!(
            with_signing_key(&LockedVault, &sealed, |_| ()),
            Err(KeyringError::Decrypt)
        );
    }

    #[test]
    fn test_zeroizing_buffer_clears_on_drop() {
        use zeroize::Zeroize;

        let vault = XorVault { mask: [3; 32] };
        let sealed = vault.seal(&[44u8; 32]);
        let mut plain = vault.decrypt(&sealed).unwrap();
        assert_eq!(*plain, [44u8; 32]);
        plain.zeroize();
        assert_eq!(*plain, [0u8; 32]);
    }
}
