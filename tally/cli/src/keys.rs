use {
    crate::{
        app::App,
        prompt::{label, print_json_pretty, read_new_password, read_password},
    },
    alloy::primitives::B256,
    clap::Subcommand,
    colored::Colorize,
    serde::Serialize,
    std::str::FromStr,
    tally_types::Address,
    tally_wallet::{Keystore, signer_from_bytes},
};

#[derive(Serialize)]
struct KeyEntry {
    name: String,
    address: Address,
}

#[derive(Subcommand)]
pub enum KeysCmd {
    /// Generate a new secp256k1 private key and save it to an encrypted file
    New {
        /// A human-readable name for the key
        name: String,
    },
    /// Encrypt an existing private key and save it to a file
    Import {
        /// A human-readable name for the key
        name: String,
    },
    /// Display a key by name, or list every key if no name is given
    #[command(alias = "ls")]
    Show {
        /// Name of the key to display
        name: Option<String>,
    },
}

impl KeysCmd {
    pub fn run(self, app: &App) -> anyhow::Result<()> {
        match self {
            KeysCmd::New { name } => new(app, &name),
            KeysCmd::Import { name } => import(app, &name),
            KeysCmd::Show { name: Some(name) } => show(app, &name),
            KeysCmd::Show { name: None } => list(app),
        }
    }
}

fn new(app: &App, name: &str) -> anyhow::Result<()> {
    let keyring = app.keyring();
    let path = keyring.path(name)?;

    let password =
        read_new_password(format!("🔑 Enter a password to encrypt file {path:?}").bold())?;
    let keystore = keyring.create(name, &password)?;

    print_keystore(app, name, &keystore)?;

    println!(
        "\n{} there is no way to recover the key if you forget the password.",
        "Important:".bold()
    );

    Ok(())
}

fn import(app: &App, name: &str) -> anyhow::Result<()> {
    let keyring = app.keyring();
    let path = keyring.path(name)?;

    let hex = read_password("🔑 Enter the private key in hex".bold())?;
    let signer = signer_from_bytes(B256::from_str(hex.trim())?)?;

    let password =
        read_new_password(format!("🔑 Enter a password to encrypt file {path:?}").bold())?;
    let keystore = keyring.import(name, &signer, &password)?;

    print_keystore(app, name, &keystore)
}

fn show(app: &App, name: &str) -> anyhow::Result<()> {
    let keystore = app.keyring().load(name)?;

    print_keystore(app, name, &keystore)
}

fn list(app: &App) -> anyhow::Result<()> {
    let keyring = app.keyring();
    let mut keys = Vec::new();

    for name in keyring.list()? {
        let keystore = keyring.load(&name)?;
        keys.push(KeyEntry {
            name,
            address: keystore.address,
        });
    }

    if app.json {
        return print_json_pretty(&keys);
    }

    if keys.is_empty() {
        println!("No keys found in {:?}", keyring.dir());
    }

    for key in &keys {
        println!("{:<20} {}", key.name, key.address);
    }

    Ok(())
}

fn print_keystore(app: &App, name: &str, keystore: &Keystore) -> anyhow::Result<()> {
    if app.json {
        return print_json_pretty(keystore);
    }

    println!("{} {name}", label("name"));
    println!("{} {}", label("address"), keystore.address);

    Ok(())
}
