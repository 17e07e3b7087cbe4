use {
    crate::{
        app::App,
        prompt::{label, print_json_pretty},
    },
    clap::Subcommand,
    colored::Colorize,
    tally_types::{Address, GroupId, VoteId},
};

#[derive(Subcommand)]
pub enum VoterCmd {
    /// Add an address to one of the current account's groups
    Add {
        /// Group to add the voter to
        group: GroupId,
        /// Address of the voter
        address: Address,
    },
    /// Give an address access to a single vote
    Grant {
        /// Vote to grant access to
        vote_id: VoteId,
        /// Address of the voter
        address: Address,
        /// Group the voter is registered under in the contract
        group: GroupId,
    },
}

impl VoterCmd {
    pub async fn run(self, app: &App) -> anyhow::Result<()> {
        match self {
            VoterCmd::Add { group, address } => {
                let manager = app.account()?;

                app.reader()?
                    .register_voter(manager, group, address)
                    .await?;

                println!("{}", format!("✅ Added {address} to group {group}").green().bold());
            },
            VoterCmd::Grant {
                vote_id,
                address,
                group,
            } => {
                let (client, manager) = app.signer().await?;
                let outcome = client
                    .grant_vote_access(manager, vote_id, address, group)
                    .await?;

                if app.json {
                    return print_json_pretty(&outcome);
                }

                println!(
                    "{}",
                    format!("✅ Granted {address} access to vote {vote_id}").green().bold()
                );
                println!("{} {}", label("tx hash"), outcome.tx_hash);
            },
        }

        Ok(())
    }
}
