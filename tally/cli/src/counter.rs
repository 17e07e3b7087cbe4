use {
    crate::{app::App, prompt::print_json_pretty},
    clap::Subcommand,
    colored::Colorize,
    serde_json::json,
};

#[derive(Subcommand)]
pub enum CounterCmd {
    /// Show the most recently allocated vote id
    Show,
    /// Create the vote id counter if it doesn't exist yet
    Init,
}

impl CounterCmd {
    pub async fn run(self, app: &App) -> anyhow::Result<()> {
        let directory = app.directory()?;

        match self {
            CounterCmd::Show => {
                let current = directory.get_current_vote_id().await?;

                if app.json {
                    return print_json_pretty(&json!({ "current_id": current }));
                }

                println!("{} {current}", "Current vote id:".bold());
            },
            CounterCmd::Init => {
                let created = directory.initialize_vote_counter().await?;

                if app.json {
                    return print_json_pretty(&json!({ "created": created }));
                }

                if created {
                    println!("{}", "✅ Vote id counter initialized".green().bold());
                } else {
                    println!("Vote id counter already exists, nothing to do.");
                }
            },
        }

        Ok(())
    }
}
