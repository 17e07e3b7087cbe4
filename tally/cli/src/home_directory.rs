use {
    anyhow::anyhow,
    std::{ops::Deref, path::PathBuf},
};

const DEFAULT_APP_DIR: &str = ".tally";

/// Where the CLI keeps its config file and keystores.
pub struct HomeDirectory {
    home: PathBuf,
}

impl HomeDirectory {
    pub fn new(home: PathBuf) -> Self {
        Self { home }
    }

    /// Use the given directory, or `~/.tally` if none is given.
    pub fn new_or_default(maybe_home: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(home) = maybe_home {
            return Ok(Self::new(home));
        }

        let user_home = home::home_dir().ok_or(anyhow!("failed to find user home directory"))?;

        Ok(Self::new(user_home.join(DEFAULT_APP_DIR)))
    }

    /// Used for keystores.
    pub fn keys_dir(&self) -> PathBuf {
        self.home.join("keys")
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.join("app.toml")
    }
}

impl Deref for HomeDirectory {
    type Target = PathBuf;

    fn deref(&self) -> &Self::Target {
        &self.home
    }
}
