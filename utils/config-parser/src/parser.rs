use {
    crate::error::Error,
    config::{Config, Environment, File},
    serde::de::DeserializeOwned,
    std::path::{Path, PathBuf},
};

pub struct ConfigParser {}

impl ConfigParser {
    /// Read the TOML file at `path`, then apply environment overrides.
    ///
    /// Nested keys are addressed with a double underscore, e.g. the variable
    /// `FIRESTORE__PROJECT_ID` overrides `project_id` under `[firestore]`.
    pub fn parse<D>(path: PathBuf) -> Result<D, Error>
    where
        D: DeserializeOwned,
    {
        let env_override = Environment::default().separator("__");

        let config = Config::builder()
            .add_source(File::from(path))
            .add_source(env_override)
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Parse the config file, failing with a readable message if it's missing.
pub fn parse_config<P, D>(path: P) -> Result<D, Error>
where
    P: AsRef<Path>,
    D: DeserializeOwned,
{
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }

    ConfigParser::parse(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*};

    #[derive(Debug, serde::Deserialize)]
    struct TestSettings {
        rpc_url: String,
        firestore: Firestore,
    }

    #[derive(Debug, serde::Deserialize)]
    struct Firestore {
        project_id: String,
        timeout_secs: u64,
    }

    #[test]
    fn test_parse_config_file() {
        std::env::set_var("FIRESTORE__PROJECT_ID", "emulator");

        let config: TestSettings = ConfigParser::parse(PathBuf::from("fixtures/config_test1.toml"))
            .expect("Failed to parse file");

        assert_that!(config.rpc_url.as_str()).is_equal_to("http://127.0.0.1:7545");
        assert_that!(config.firestore.project_id.as_str()).is_equal_to("emulator");
        assert_that!(config.firestore.timeout_secs).is_equal_to(30);
    }

    #[test]
    fn missing_file_is_reported() {
        let res: Result<TestSettings, _> = parse_config("fixtures/does_not_exist.toml");

        assert!(matches!(res, Err(Error::NotFound(_))));
    }
}
