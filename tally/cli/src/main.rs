use {
    sentry::integrations::tracing::layer as sentry_layer,
    tracing_subscriber::{fmt, prelude::*, registry},
};

mod app;
mod config;
mod counter;
mod home_directory;
mod init;
mod keys;
mod manager;
mod prompt;
mod vote;
mod voter;
mod whoami;

use {
    crate::{
        app::App, counter::CounterCmd, home_directory::HomeDirectory, init::InitCmd,
        keys::KeysCmd, manager::ManagerCmd, vote::VoteCmd, voter::VoterCmd,
    },
    clap::Parser,
    config::Config,
    config_parser::parse_config,
    std::path::PathBuf,
    tracing::metadata::LevelFilter,
};

#[derive(Parser)]
#[command(author, version, about, next_display_order = None)]
struct Cli {
    /// Directory for the config file and keystores [default: ~/.tally]
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Name of the key acting as the current account
    #[arg(long, global = true, default_value = "default")]
    key: String,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Create the home directory with a default config file
    Init(InitCmd),

    /// Manage keys
    #[command(subcommand, next_display_order = None)]
    Keys(KeysCmd),

    /// Show the current account's role and contract
    Whoami,

    /// Register a contract and inspect groups
    #[command(subcommand, next_display_order = None)]
    Manager(ManagerCmd),

    /// Manage group membership and vote access
    #[command(subcommand, next_display_order = None)]
    Voter(VoterCmd),

    /// Create, cast and inspect votes
    #[command(subcommand, next_display_order = None)]
    Vote(VoteCmd),

    /// Inspect or initialize the vote id counter
    #[command(subcommand, next_display_order = None)]
    Counter(CounterCmd),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Find the home directory from the CLI `--home` flag.
    let app_dir = HomeDirectory::new_or_default(cli.home)?;

    // Parse the config file. `init` is what creates it.
    let cfg: Config = if matches!(cli.command, Command::Init(_)) {
        Config::default()
    } else {
        parse_config(app_dir.config_file())?
    };

    let max_level = cfg.log_level.parse::<LevelFilter>()?;

    let _sentry_guard = if cfg.sentry.enabled {
        let guard = sentry::init((cfg.sentry.dsn.clone(), sentry::ClientOptions {
            environment: Some(cfg.sentry.environment.clone().into()),
            release: sentry::release_name!(),
            sample_rate: cfg.sentry.sample_rate,
            traces_sample_rate: cfg.sentry.traces_sample_rate,
            ..Default::default()
        }));

        sentry::configure_scope(|scope| {
            scope.set_tag("firestore-project", &cfg.firestore.project_id);
        });

        registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_filter(max_level))
            .with(sentry_layer())
            .init();

        tracing::info!("Sentry initialized");

        Some(guard)
    } else {
        // Set up tracing. Logs go to stderr so that stdout stays parsable.
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(max_level)
            .init();

        None
    };

    let app = App {
        home: app_dir,
        cfg,
        key: cli.key,
        json: cli.json,
    };

    match cli.command {
        Command::Init(cmd) => cmd.run(&app.home),
        Command::Keys(cmd) => cmd.run(&app),
        Command::Whoami => whoami::run(&app).await,
        Command::Manager(cmd) => cmd.run(&app).await,
        Command::Voter(cmd) => cmd.run(&app).await,
        Command::Vote(cmd) => cmd.run(&app).await,
        Command::Counter(cmd) => cmd.run(&app).await,
    }
}
