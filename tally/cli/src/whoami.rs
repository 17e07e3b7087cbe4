use {
    crate::{
        app::App,
        prompt::{label, print_json_pretty},
    },
    tally_directory::AccountRole,
};

/// Resolve the current account against the directory.
pub async fn run(app: &App) -> anyhow::Result<()> {
    let address = app.account()?;
    let role = app.directory()?.resolve_account(&address).await?;

    if app.json {
        return print_json_pretty(&role);
    }

    println!("{} {address}", label("account"));

    match role {
        AccountRole::Manager { contract, .. } => {
            println!("{} manager", label("role"));
            println!("{} {contract}", label("contract"));
        },
        AccountRole::Voter {
            manager,
            contract,
            group,
            ..
        } => {
            println!("{} voter", label("role"));
            println!("{} {manager}", label("manager"));
            println!("{} {contract}", label("contract"));
            println!("{} {group}", label("group"));
        },
    }

    Ok(())
}
