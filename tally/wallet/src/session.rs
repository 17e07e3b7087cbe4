use {
    crate::{Keyring, Keystore, WalletError, WalletResult},
    alloy::{primitives::Address, signers::local::PrivateKeySigner},
    serde::Serialize,
    std::{fmt, path::PathBuf},
    tokio::sync::watch,
};

/// Connection state of a wallet session.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    /// The keystore hasn't been looked for yet.
    Uninitialized,
    /// There is no keystore to connect with.
    Unavailable,
    /// A keystore exists but is locked.
    NotConnected,
    /// The keystore is being decrypted.
    Connecting,
    /// The signing key is available.
    Connected,
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WalletStatus::Uninitialized => "uninitialized",
            WalletStatus::Unavailable => "unavailable",
            WalletStatus::NotConnected => "not connected",
            WalletStatus::Connecting => "connecting",
            WalletStatus::Connected => "connected",
        };

        f.write_str(s)
    }
}

/// The local stand-in for a browser wallet: a keystore file that, once
/// unlocked with its password, provides the active account and its signer.
///
/// Status changes are broadcast; call [`WalletSession::subscribe`] to follow
/// them from another task.
pub struct WalletSession {
    path: PathBuf,
    status: watch::Sender<WalletStatus>,
    keystore: Option<Keystore>,
    signer: Option<PrivateKeySigner>,
}

impl WalletSession {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            path: path.into(),
            status: watch::Sender::new(WalletStatus::Uninitialized),
            keystore: None,
            signer: None,
        }
    }

    /// A session over a named key of a keyring.
    pub fn from_keyring(keyring: &Keyring, name: &str) -> WalletResult<Self> {
        Ok(Self::new(keyring.path(name)?))
    }

    pub fn status(&self) -> WalletStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletStatus> {
        self.status.subscribe()
    }

    /// Look for the keystore file. A connected session stays connected.
    pub fn detect(&mut self) -> WalletResult<WalletStatus> {
        if self.status() == WalletStatus::Connected {
            return Ok(WalletStatus::Connected);
        }

        if !self.path.exists() {
            self.keystore = None;
            self.set_status(WalletStatus::Unavailable);
            return Ok(WalletStatus::Unavailable);
        }

        self.keystore = Some(Keystore::from_file(&self.path)?);
        self.set_status(WalletStatus::NotConnected);

        Ok(WalletStatus::NotConnected)
    }

    /// Unlock the keystore. On failure the session is left not connected.
    ///
    /// Key derivation is deliberately slow, so it runs on the blocking pool.
    pub async fn connect(&mut self, password: String) -> WalletResult<Address> {
        if let Some(signer) = &self.signer {
            return Ok(signer.address());
        }

        if self.detect()? == WalletStatus::Unavailable {
            return Err(WalletError::Unavailable {
                path: self.path.clone(),
            });
        }

        let keystore = self.keystore.clone().ok_or(WalletError::Unavailable {
            path: self.path.clone(),
        })?;

        self.set_status(WalletStatus::Connecting);

        let res = tokio::task::spawn_blocking(move || keystore.decrypt(password))
            .await
            .map_err(WalletError::from)
            .and_then(|res| res);

        match res {
            Ok(signer) => {
                let address = signer.address();

                self.signer = Some(signer);
                self.set_status(WalletStatus::Connected);

                tracing::info!(%address, "Wallet connected");

                Ok(address)
            },
            Err(err) => {
                self.set_status(WalletStatus::NotConnected);

                tracing::warn!(path = %self.path.display(), %err, "Failed to connect wallet");

                Err(err)
            },
        }
    }

    /// Forget the decrypted key.
    pub fn disconnect(&mut self) {
        if self.signer.take().is_some() {
            self.set_status(WalletStatus::NotConnected);
        }
    }

    /// The active account.
    pub fn address(&self) -> WalletResult<Address> {
        self.signer().map(PrivateKeySigner::address)
    }

    /// The account the keystore belongs to, readable without unlocking it.
    pub fn keystore_address(&self) -> Option<Address> {
        self.keystore.as_ref().map(|keystore| keystore.address)
    }

    pub fn signer(&self) -> WalletResult<&PrivateKeySigner> {
        self.signer.as_ref().ok_or(WalletError::NotConnected)
    }

    fn set_status(&self, status: WalletStatus) {
        let previous = self.status.send_replace(status);

        if previous != status {
            tracing::debug!(from = %previous, to = %status, "Wallet status changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*};

    fn setup() -> (tempfile::TempDir, Keyring) {
        let dir = tempfile::tempdir().unwrap();
        let keyring = Keyring::new(dir.path()).with_iterations(1_000);

        (dir, keyring)
    }

    #[tokio::test]
    async fn missing_keystore_is_unavailable() {
        let (_dir, keyring) = setup();
        let mut session = WalletSession::from_keyring(&keyring, "alice").unwrap();

        assert_that!(session.status()).is_equal_to(WalletStatus::Uninitialized);
        assert_that!(session.detect().unwrap()).is_equal_to(WalletStatus::Unavailable);

        assert!(matches!(
            session.connect("pw".to_string()).await,
            Err(WalletError::Unavailable { .. })
        ));
        assert!(matches!(session.address(), Err(WalletError::NotConnected)));
    }

    #[tokio::test]
    async fn connecting_and_disconnecting() {
        let (_dir, keyring) = setup();
        let keystore = keyring.create("alice", "pw").unwrap();

        let mut session = WalletSession::from_keyring(&keyring, "alice").unwrap();
        let mut updates = session.subscribe();

        assert_that!(session.detect().unwrap()).is_equal_to(WalletStatus::NotConnected);
        assert_that!(session.keystore_address()).is_equal_to(Some(keystore.address));
        assert!(matches!(session.signer(), Err(WalletError::NotConnected)));

        let address = session.connect("pw".to_string()).await.unwrap();

        assert_that!(address).is_equal_to(keystore.address);
        assert_that!(session.status()).is_equal_to(WalletStatus::Connected);
        assert_that!(session.address().unwrap()).is_equal_to(keystore.address);
        assert_that!(updates.has_changed().unwrap()).is_true();
        assert_that!(*updates.borrow_and_update()).is_equal_to(WalletStatus::Connected);

        session.disconnect();

        assert_that!(session.status()).is_equal_to(WalletStatus::NotConnected);
        assert!(matches!(session.address(), Err(WalletError::NotConnected)));
    }

    #[tokio::test]
    async fn wrong_password_leaves_session_locked() {
        let (_dir, keyring) = setup();
        keyring.create("alice", "pw").unwrap();

        let mut session = WalletSession::from_keyring(&keyring, "alice").unwrap();

        assert!(matches!(
            session.connect("wrong".to_string()).await,
            Err(WalletError::Decryption)
        ));
        assert_that!(session.status()).is_equal_to(WalletStatus::NotConnected);
    }
}
