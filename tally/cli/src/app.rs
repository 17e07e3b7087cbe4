use {
    crate::{config::Config, home_directory::HomeDirectory, prompt::read_password},
    anyhow::{anyhow, bail},
    chrono::Utc,
    colored::Colorize,
    tally_client::TallyClient,
    tally_contract::EvmBinder,
    tally_directory::{Directory, FirestoreDirectory},
    tally_types::Address,
    tally_wallet::{Keyring, PrivateKeySigner, WalletSession, WalletStatus},
    url::Url,
};

pub type Client = TallyClient<FirestoreDirectory, EvmBinder>;

/// Everything a command needs from the environment: the home directory, the
/// parsed config and the global flags.
pub struct App {
    pub home: HomeDirectory,
    pub cfg: Config,
    /// Name of the keystore that acts as the current account.
    pub key: String,
    /// Print JSON instead of tables.
    pub json: bool,
}

impl App {
    pub fn keyring(&self) -> Keyring {
        Keyring::new(self.home.keys_dir())
    }

    pub fn directory(&self) -> anyhow::Result<Directory<FirestoreDirectory>> {
        let store = FirestoreDirectory::new(self.cfg.firestore.clone())?;

        Ok(Directory::new(store))
    }

    /// The current account's keystore, still locked.
    fn wallet(&self) -> anyhow::Result<WalletSession> {
        let mut session = WalletSession::from_keyring(&self.keyring(), &self.key)?;

        if session.detect()? == WalletStatus::Unavailable {
            bail!(
                "no key named `{}`; create one with `tally keys new {}`",
                self.key,
                self.key
            );
        }

        Ok(session)
    }

    /// The current account, read from the keystore without unlocking it.
    pub fn account(&self) -> anyhow::Result<Address> {
        self.wallet()?
            .keystore_address()
            .ok_or(anyhow!("keystore `{}` has no address", self.key))
    }

    /// Unlock the current account's keystore.
    pub async fn unlock(&self) -> anyhow::Result<PrivateKeySigner> {
        let mut session = self.wallet()?;

        let prompt = format!("🔑 Enter the password of key `{}`", self.key);
        let password = read_password(prompt.bold())?;
        session.connect(password).await?;

        Ok(session.signer()?.clone())
    }

    /// A client that can only read from the contract.
    pub fn reader(&self) -> anyhow::Result<Client> {
        let binder = EvmBinder::connect_http(self.rpc_url()?);

        self.client(binder)
    }

    /// A client whose transactions are signed by the current account.
    pub async fn signer(&self) -> anyhow::Result<(Client, Address)> {
        let signer = self.unlock().await?;
        let address = signer.address();
        let binder = EvmBinder::connect_http_with_signer(self.rpc_url()?, signer);

        Ok((self.client(binder)?, address))
    }

    fn client(&self, binder: EvmBinder) -> anyhow::Result<Client> {
        Ok(TallyClient::new(self.directory()?, binder)
            .with_max_concurrency(self.cfg.reconciler.max_concurrency))
    }

    fn rpc_url(&self) -> anyhow::Result<Url> {
        Ok(self.cfg.ethereum.rpc_url.parse()?)
    }
}

/// Current Unix time in seconds.
pub fn now() -> anyhow::Result<u64> {
    Ok(u64::try_from(Utc::now().timestamp())?)
}
