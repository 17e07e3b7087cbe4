use {
    crate::{Keystore, PBKDF2_ITERATIONS, WalletError, WalletResult, random_signer},
    alloy::signers::local::PrivateKeySigner,
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

const KEYSTORE_EXTENSION: &str = "json";

/// A directory of named keystore files, `{dir}/{name}.json`.
#[derive(Debug, Clone)]
pub struct Keyring {
    dir: PathBuf,
    iterations: u32,
}

impl Keyring {
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            dir: dir.into(),
            iterations: PBKDF2_ITERATIONS,
        }
    }

    /// Use a different key derivation work factor for newly written keys.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> WalletResult<PathBuf> {
        // Names become file names; keep them from escaping the directory.
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(WalletError::InvalidName {
                name: name.to_string(),
            });
        }

        Ok(self.dir.join(format!("{name}.{KEYSTORE_EXTENSION}")))
    }

    pub fn exists(&self, name: &str) -> WalletResult<bool> {
        Ok(self.path(name)?.exists())
    }

    /// Names of every keystore in the directory, sorted.
    pub fn list(&self) -> WalletResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = fs::read_dir(&self.dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? != KEYSTORE_EXTENSION {
                    return None;
                }
                Some(path.file_stem()?.to_string_lossy().into_owned())
            })
            .collect::<Vec<_>>();

        names.sort();

        Ok(names)
    }

    pub fn load(&self, name: &str) -> WalletResult<Keystore> {
        let path = self.path(name)?;

        if !path.exists() {
            return Err(WalletError::Unavailable { path });
        }

        Keystore::from_file(path)
    }

    /// Generate a new key and save it under `name`.
    pub fn create(&self, name: &str, password: &str) -> WalletResult<Keystore> {
        self.import(name, &random_signer(), password)
    }

    /// Encrypt an existing key and save it under `name`. Never overwrites.
    pub fn import(
        &self,
        name: &str,
        signer: &PrivateKeySigner,
        password: &str,
    ) -> WalletResult<Keystore> {
        let path = self.path(name)?;

        if path.exists() {
            return Err(WalletError::AlreadyExists { path });
        }

        fs::create_dir_all(&self.dir)?;

        let keystore = Keystore::encrypt(signer, password, self.iterations)?;
        keystore.write_to_file(&path)?;

        tracing::info!(name, address = %keystore.address, "Saved keystore");

        Ok(keystore)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*};

    fn keyring(dir: &Path) -> Keyring {
        Keyring::new(dir.join("keys")).with_iterations(1_000)
    }

    #[test]
    fn creating_and_listing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = keyring(dir.path());

        assert_that!(keyring.list().unwrap()).is_empty();

        let bob = keyring.create("bob", "pw").unwrap();
        keyring.create("alice", "pw").unwrap();

        assert_that!(keyring.list().unwrap())
            .is_equal_to(vec!["alice".to_string(), "bob".to_string()]);
        assert_that!(keyring.load("bob").unwrap()).is_equal_to(bob);
    }

    #[test]
    fn refusing_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let keyring = keyring(dir.path());

        keyring.create("alice", "pw").unwrap();

        assert!(matches!(
            keyring.create("alice", "pw"),
            Err(WalletError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn rejecting_bad_names() {
        let keyring = Keyring::new("/tmp/keys");

        for name in ["", "../alice", ".hidden", "a/b"] {
            assert!(matches!(
                keyring.path(name),
                Err(WalletError::InvalidName { .. })
            ));
        }
    }

    #[test]
    fn loading_a_missing_key() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            keyring(dir.path()).load("alice"),
            Err(WalletError::Unavailable { .. })
        ));
    }
}
