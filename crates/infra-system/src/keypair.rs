// Keypair reconstruction and integrity checks for generator output
// reason: bs58 for the address/key text encoding, ed25519-dalek for key derivation

use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use vanity_core::port::GenerationError;

/// Secret as printed by the tool, told apart by decoded length
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretMaterial {
    /// 32-byte ed25519 seed
    Seed([u8; SECRET_KEY_LENGTH]),
    /// Anything else; valid only as a 64-byte `seed || public` keypair
    FullKey(Vec<u8>),
}

impl SecretMaterial {
    pub fn decode(token: &str) -> Result<Self, GenerationError> {
        let bytes = bs58::decode(token)
            .into_vec()
            .map_err(|e| GenerationError::ParseFailure(format!("secret key is not base58: {}", e)))?;

        match <[u8; SECRET_KEY_LENGTH]>::try_from(bytes.as_slice()) {
            Ok(seed) => Ok(SecretMaterial::Seed(seed)),
            Err(_) => Ok(SecretMaterial::FullKey(bytes)),
        }
    }

    /// Rebuild the signing key.
    ///
    /// A full key whose public half disagrees with its seed is an integrity
    /// failure, a full key of the wrong length a parse failure.
    pub fn to_signing_key(&self) -> Result<SigningKey, GenerationError> {
        match self {
            SecretMaterial::Seed(seed) => Ok(SigningKey::from_bytes(seed)),
            SecretMaterial::FullKey(bytes) => {
                let keypair = <[u8; KEYPAIR_LENGTH]>::try_from(bytes.as_slice()).map_err(|_| {
                    GenerationError::ParseFailure(format!(
                        "secret key has {} bytes, expected {} or {}",
                        bytes.len(),
                        SECRET_KEY_LENGTH,
                        KEYPAIR_LENGTH
                    ))
                })?;
                SigningKey::from_keypair_bytes(&keypair).map_err(|_| {
                    GenerationError::IntegrityFailure(
                        "public half of secret key does not match its seed".to_string(),
                    )
                })
            }
        }
    }
}

/// A keypair whose secret was proven to produce the printed address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedKeypair {
    /// Base58 public key re-derived from the secret
    pub public_key: String,
    /// Base58 of the 64-byte `seed || public` keypair
    pub secret_key: String,
}

/// Decode both tokens, re-derive the public key and compare it byte for byte
/// against the address.
pub fn verify_keypair(address: &str, secret: &str) -> Result<VerifiedKeypair, GenerationError> {
    let address_bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| GenerationError::ParseFailure(format!("address is not base58: {}", e)))?;
    if address_bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(GenerationError::ParseFailure(format!(
            "address has {} bytes, expected {}",
            address_bytes.len(),
            PUBLIC_KEY_LENGTH
        )));
    }

    let signing_key = SecretMaterial::decode(secret)?.to_signing_key()?;
    let derived = signing_key.verifying_key().to_bytes();

    if derived.as_slice() != address_bytes.as_slice() {
        return Err(GenerationError::IntegrityFailure(format!(
            "secret key derives {} instead of {}",
            bs58::encode(derived).into_string(),
            address
        )));
    }

    Ok(VerifiedKeypair {
        public_key: bs58::encode(derived).into_string(),
        secret_key: bs58::encode(signing_key.to_keypair_bytes()).into_string(),
    })
}
