use {crate::home_directory::HomeDirectory, anyhow::ensure, clap::Parser};

#[derive(Parser)]
pub struct InitCmd;

impl InitCmd {
    pub fn run(&self, home: &HomeDirectory) -> anyhow::Result<()> {
        ensure!(
            !home.exists(),
            "home directory already exists: {}",
            home.display()
        );

        std::fs::create_dir_all(home.as_path())?;
        std::fs::create_dir(home.keys_dir())?;

        std::fs::write(
            home.config_file(),
            include_str!("../testdata/default_config.toml"),
        )?;

        tracing::info!("Tally directory initiated at: {}", home.display());

        Ok(())
    }
}
