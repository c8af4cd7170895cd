//! Ed25519 keypairs for signing ledger instructions.

use std::fmt;

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Address, CoreError};

/// An ed25519 keypair. Its public key is the signer's [`Address`].
pub struct Keypair {
    signing_key: SigningKey,
}

/// An ed25519 signature, serialized as base58.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(DalekSignature);

impl Keypair {
    /// Creates a keypair from the operating system's CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Creates a keypair from a 32-byte secret seed.
    #[must_use]
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Returns the signer address (public key bytes).
    #[must_use]
    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Signs a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Address {
    /// Verifies `signature` over `message` with this address as the public key.
    ///
    /// Uses strict verification, which rejects malleable signatures.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidSignature` if the address is not a public key
    /// or the signature does not verify.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CoreError> {
        let key = VerifyingKey::from_bytes(self.as_bytes()).map_err(|_| CoreError::InvalidSignature)?;
        key.verify_strict(message, &signature.0)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl Signature {
    /// Returns the raw signature bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    /// Creates a signature from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(DalekSignature::from_bytes(bytes))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", bs58::encode(self.to_bytes()).into_string())
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&bs58::encode(self.to_bytes()).into_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = bs58::decode(&s).into_vec().map_err(de::Error::custom)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| de::Error::custom("signature must be 64 bytes"))?;
        Ok(Self::from_bytes(&arr))
    }
}
