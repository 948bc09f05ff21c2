use soroban_sdk::{Bytes, BytesN, Env, Vec};

use crate::errors::Error;
use crate::types::QuorumParams;

/// Domain separator for quorum addresses.
const QUORUM_DOMAIN: &[u8; 12] = b"MultisigAddr";

/// Derives the M-of-N quorum address from a set of signer keys.
///
/// The address is `sha256("MultisigAddr" || version || threshold || keys)`
/// over the keys sorted ascending, so any permutation of the same set yields
/// the same address.
pub struct QuorumAddressDeriver;

impl QuorumAddressDeriver {
    /// # Errors
    ///
    /// `InvalidConfiguration` if `identities.len() != n`, `n` or `threshold`
    /// is zero, `threshold > n`, a key is all zeroes or repeated, or
    /// `version`/`threshold` do not fit in one byte.
    pub fn derive(
        env: &Env,
        version: u32,
        threshold: u32,
        n: u32,
        identities: &Vec<BytesN<32>>,
    ) -> Result<(BytesN<32>, QuorumParams), Error> {
        if n == 0 || identities.len() != n {
            return Err(Error::InvalidConfiguration);
        }
        if threshold == 0 || threshold > n {
            return Err(Error::InvalidConfiguration);
        }
        if version == 0 || version > u8::MAX as u32 || threshold > u8::MAX as u32 {
            return Err(Error::InvalidConfiguration);
        }

        let signers = Self::canonicalize(env, identities)?;
        let address = Self::address_of(env, version, threshold, &signers);

        Ok((
            address,
            QuorumParams {
                version,
                threshold,
                signers,
            },
        ))
    }

    /// Recompute the address for already-canonical params.
    pub fn address_for(env: &Env, params: &QuorumParams) -> BytesN<32> {
        Self::address_of(env, params.version, params.threshold, &params.signers)
    }

    /// Sorted copy of `identities`; rejects malformed and duplicate keys.
    fn canonicalize(env: &Env, identities: &Vec<BytesN<32>>) -> Result<Vec<BytesN<32>>, Error> {
        let mut sorted: Vec<BytesN<32>> = Vec::new(env);
        for key in identities.iter() {
            if key.to_array() == [0u8; 32] {
                return Err(Error::InvalidConfiguration);
            }
            let mut position = sorted.len();
            for (index, existing) in sorted.iter().enumerate() {
                if existing == key {
                    return Err(Error::InvalidConfiguration);
                }
                if existing > key {
                    position = index as u32;
                    break;
                }
            }
            sorted.insert(position, key);
        }
        Ok(sorted)
    }

    fn address_of(env: &Env, version: u32, threshold: u32, signers: &Vec<BytesN<32>>) -> BytesN<32> {
        let mut preimage = Bytes::from_array(env, QUORUM_DOMAIN);
        preimage.push_back(version as u8);
        preimage.push_back(threshold as u8);
        for key in signers.iter() {
            preimage.append(&Bytes::from(key));
        }
        env.crypto().sha256(&preimage).to_bytes()
    }
}
