use {
    serde::{Deserialize, Serialize},
    tally_client::DEFAULT_MAX_CONCURRENCY,
    tally_directory::FirestoreConfig,
};

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub ethereum: EthereumConfig,
    pub firestore: FirestoreConfig,
    pub reconciler: ReconcilerConfig,
    pub sentry: SentryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ethereum: EthereumConfig::default(),
            firestore: FirestoreConfig::default(),
            reconciler: ReconcilerConfig::default(),
            sentry: SentryConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct EthereumConfig {
    pub rpc_url: String,
}

impl Default for EthereumConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:7545".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub max_concurrency: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SentryConfig {
    pub enabled: bool,
    pub dsn: String,
    pub environment: String,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, config_parser::parse_config};

    #[test]
    fn default_config_file_parses() {
        let cfg: Config = parse_config("testdata/default_config.toml").unwrap();

        assert_that!(cfg.ethereum.rpc_url.as_str()).is_equal_to("http://127.0.0.1:7545");
        assert_that!(cfg.firestore.project_id.as_str()).is_equal_to("voting-system");
        assert_that!(cfg.firestore.timeout_secs).is_equal_to(30);
        assert_that!(cfg.reconciler.max_concurrency).is_equal_to(8);
        assert_that!(cfg.sentry.enabled).is_false();
    }
}
