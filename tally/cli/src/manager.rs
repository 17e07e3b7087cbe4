use {
    crate::{
        app::App,
        prompt::{label, print_json_pretty},
    },
    clap::Subcommand,
    colored::Colorize,
    tally_types::Address,
};

#[derive(Subcommand)]
pub enum ManagerCmd {
    /// Register the current account as the manager of a deployed contract
    Register {
        /// Address of the voting contract
        contract: Address,
    },
    /// List the current account's groups and their members
    Groups,
}

impl ManagerCmd {
    pub async fn run(self, app: &App) -> anyhow::Result<()> {
        let manager = app.account()?;
        let directory = app.directory()?;

        match self {
            ManagerCmd::Register { contract } => {
                let record = directory.register_manager(manager, contract).await?;

                if app.json {
                    return print_json_pretty(&record);
                }

                println!("{}", "✅ Registered!".green().bold());
                println!("{} {manager}", label("manager"));
                println!("{} {contract}", label("contract"));
            },
            ManagerCmd::Groups => {
                let groups = directory.group_addresses(&manager).await?;

                if app.json {
                    return print_json_pretty(&groups);
                }

                if groups.is_empty() {
                    println!("No groups yet. Add a voter with `tally voter add`.");
                }

                for (group, members) in groups {
                    println!("{} ({} members)", format!("group {group}").bold(), members.len());

                    for member in members {
                        println!("  {member}");
                    }
                }
            },
        }

        Ok(())
    }
}
