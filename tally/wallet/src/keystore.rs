use {
    crate::{WalletError, WalletResult},
    aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce, aead::Aead},
    alloy::{
        primitives::{Address, B256, Bytes, FixedBytes},
        signers::local::PrivateKeySigner,
    },
    pbkdf2::pbkdf2_hmac,
    rand::{Rng, rngs::OsRng},
    serde::{Deserialize, Serialize},
    sha2::Sha256,
    std::{fs, path::Path},
};

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const PBKDF2_SALT_LEN: usize = 16;
const PBKDF2_KEY_LEN: usize = 32;
const AES256GCM_NONCE_LEN: usize = 12;

/// Data structure for encrypting a 32-byte private key before saving on disk.
///
/// The address is stored in the clear so that an account can be identified
/// without the password.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Keystore {
    pub address: Address,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    pub salt: FixedBytes<PBKDF2_SALT_LEN>,
    pub nonce: FixedBytes<AES256GCM_NONCE_LEN>,
    pub ciphertext: Bytes,
}

fn default_iterations() -> u32 {
    PBKDF2_ITERATIONS
}

impl Keystore {
    /// Encrypt a signing key with the given password.
    pub fn encrypt<P>(
        signer: &PrivateKeySigner,
        password: P,
        iterations: u32,
    ) -> WalletResult<Self>
    where
        P: AsRef<[u8]>,
    {
        // generate encryption key
        let mut salt = [0u8; PBKDF2_SALT_LEN];
        OsRng.fill(&mut salt);
        let password_hash = derive_key(password.as_ref(), &salt, iterations);

        // encrypt the private key
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&password_hash));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, signer.to_bytes().as_slice())
            .map_err(|_| WalletError::Encryption)?;

        Ok(Self {
            address: signer.address(),
            iterations,
            salt: salt.into(),
            nonce: FixedBytes::from_slice(nonce.as_slice()),
            ciphertext: ciphertext.into(),
        })
    }

    /// Recover the signing key. Fails if the password is wrong or the key
    /// doesn't belong to the stored address.
    pub fn decrypt<P>(&self, password: P) -> WalletResult<PrivateKeySigner>
    where
        P: AsRef<[u8]>,
    {
        // recover encryption key from password and salt
        let password_hash = derive_key(password.as_ref(), self.salt.as_slice(), self.iterations);

        // decrypt the private key
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&password_hash));
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(self.nonce.as_slice()),
                self.ciphertext.as_ref(),
            )
            .map_err(|_| WalletError::Decryption)?;

        let bytes: [u8; 32] = plaintext.try_into().map_err(|bytes: Vec<u8>| {
            WalletError::InvalidKey {
                reason: format!("expecting 32 bytes, got {}", bytes.len()),
            }
        })?;

        let signer = signer_from_bytes(B256::from(bytes))?;

        if signer.address() != self.address {
            return Err(WalletError::AddressMismatch {
                expected: self.address,
                actual: signer.address(),
            });
        }

        Ok(signer)
    }

    /// Read a keystore file.
    pub fn from_file<F>(filename: F) -> WalletResult<Self>
    where
        F: AsRef<Path>,
    {
        let keystore_str = fs::read_to_string(filename)?;

        Ok(serde_json::from_str(&keystore_str)?)
    }

    /// Save the keystore to a file.
    pub fn write_to_file<F>(&self, filename: F) -> WalletResult<()>
    where
        F: AsRef<Path>,
    {
        let keystore_str = serde_json::to_string_pretty(self)?;
        fs::write(filename, keystore_str.as_bytes())?;

        Ok(())
    }
}

/// Generate a new random signing key with the [`OsRng`].
pub fn random_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_signing_key(k256::ecdsa::SigningKey::random(&mut OsRng))
}

pub fn signer_from_bytes(bytes: B256) -> WalletResult<PrivateKeySigner> {
    PrivateKeySigner::from_bytes(&bytes).map_err(|err| WalletError::InvalidKey {
        reason: err.to_string(),
    })
}

fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; PBKDF2_KEY_LEN] {
    let mut password_hash = [0u8; PBKDF2_KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut password_hash);
    password_hash
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*};

    // Keep tests fast; the work factor doesn't change the format.
    const ITERATIONS: u32 = 1_000;

    #[test]
    fn encrypting_and_decrypting() {
        let signer = random_signer();
        let keystore = Keystore::encrypt(&signer, "hunter2", ITERATIONS).unwrap();

        assert_that!(keystore.address).is_equal_to(signer.address());
        assert_that!(keystore.ciphertext.to_vec()).is_not_equal_to(signer.to_bytes().to_vec());

        let recovered = keystore.decrypt("hunter2").unwrap();
        assert_that!(recovered.to_bytes()).is_equal_to(signer.to_bytes());
    }

    #[test]
    fn wrong_password_fails() {
        let keystore = Keystore::encrypt(&random_signer(), "hunter2", ITERATIONS).unwrap();

        assert!(matches!(
            keystore.decrypt("hunter3"),
            Err(WalletError::Decryption)
        ));
    }

    #[test]
    fn tampered_address_is_detected() {
        let mut keystore = Keystore::encrypt(&random_signer(), "hunter2", ITERATIONS).unwrap();
        keystore.address = Address::repeat_byte(0x01);

        assert!(matches!(
            keystore.decrypt("hunter2"),
            Err(WalletError::AddressMismatch { .. })
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.json");

        let keystore = Keystore::encrypt(&random_signer(), "hunter2", ITERATIONS).unwrap();
        keystore.write_to_file(&path).unwrap();

        assert_that!(Keystore::from_file(&path).unwrap()).is_equal_to(keystore);
    }

    #[test]
    fn missing_iterations_default_to_work_factor() {
        let keystore = Keystore::encrypt(&random_signer(), "hunter2", ITERATIONS).unwrap();

        let mut json = serde_json::to_value(&keystore).unwrap();
        json.as_object_mut().unwrap().remove("iterations");

        let decoded: Keystore = serde_json::from_value(json).unwrap();
        assert_that!(decoded.iterations).is_equal_to(PBKDF2_ITERATIONS);
    }
}
