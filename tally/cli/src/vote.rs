use {
    crate::{
        app::{App, now},
        prompt::{confirm, label, print_json_pretty},
    },
    chrono::{DateTime, Utc},
    clap::Subcommand,
    colored::Colorize,
    serde::Serialize,
    tally_client::{Reconciliation, VoteResults, VoteStatus},
    tally_types::{CreateVote, GroupId, VoteId},
};

#[derive(Subcommand)]
pub enum VoteCmd {
    /// Create a vote for one of the current account's groups
    Create {
        /// Title of the vote
        #[arg(long)]
        name: String,
        /// Group whose members may take part
        #[arg(long)]
        group: GroupId,
        /// How long the vote stays open, in days
        #[arg(long, default_value_t = 1.0)]
        days: f64,
        /// An option to vote for; repeat for every option
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        /// Opening time in RFC 3339 format [default: now]
        #[arg(long)]
        start: Option<DateTime<Utc>>,
    },
    /// Cast a ballot
    Cast {
        /// Vote to cast the ballot in
        vote_id: VoteId,
        /// Index of the chosen option, as shown by `tally vote list`
        option: u64,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// List the votes the current account takes part in
    #[command(alias = "ls")]
    List {
        /// List every vote of a group instead
        #[arg(long)]
        group: Option<GroupId>,
    },
    /// Show the tallies of a vote
    Results {
        /// Vote to show
        vote_id: VoteId,
    },
}

impl VoteCmd {
    pub async fn run(self, app: &App) -> anyhow::Result<()> {
        match self {
            VoteCmd::Create {
                name,
                group,
                days,
                options,
                start,
            } => {
                let request = CreateVote {
                    name,
                    start_time: start.map(|start| u64::try_from(start.timestamp())).transpose()?,
                    duration_days: days,
                    group,
                    options,
                };

                create(app, request).await
            },
            VoteCmd::Cast {
                vote_id,
                option,
                yes,
            } => cast(app, vote_id, option, yes).await,
            VoteCmd::List { group } => list(app, group).await,
            VoteCmd::Results { vote_id } => results(app, vote_id).await,
        }
    }
}

async fn create(app: &App, request: CreateVote) -> anyhow::Result<()> {
    let (client, manager) = app.signer().await?;
    let created = client.create_vote(manager, request, now()?).await?;

    if app.json {
        return print_json_pretty(&created);
    }

    println!("{}", format!("✅ Created vote {}", created.id).green().bold());
    println!("{} {}", label("tx hash"), created.outcome.tx_hash);
    println!("{} {} accounts", label("indexed"), created.participants.len());

    Ok(())
}

async fn cast(app: &App, vote_id: VoteId, option: u64, yes: bool) -> anyhow::Result<()> {
    if !yes && !confirm(format!("🗳️  Cast option {option} in vote {vote_id}?").bold())? {
        println!("🤷 User aborted");
        return Ok(());
    }

    let (client, voter) = app.signer().await?;
    let session = client.session(voter).await?;
    let outcome = client.cast_vote(&session, vote_id, option, now()?).await?;

    if app.json {
        return print_json_pretty(&outcome);
    }

    println!("{}", "✅ Ballot cast!".green().bold());
    println!("{} {}", label("tx hash"), outcome.tx_hash);

    Ok(())
}

async fn list(app: &App, group: Option<GroupId>) -> anyhow::Result<()> {
    let client = app.reader()?;
    let session = client.session(app.account()?).await?;
    let now = now()?;

    let reconciliation = match group {
        Some(group) => client.group_votes(&session, group, now).await?,
        None => client.my_votes(&session, now).await?,
    };

    if app.json {
        return print_json_pretty(&VoteListing::from(&reconciliation));
    }

    print_votes(&reconciliation.votes);

    for (id, err) in &reconciliation.failures {
        eprintln!("{} couldn't load vote {id}: {err}", "warning:".yellow().bold());
    }

    Ok(())
}

async fn results(app: &App, vote_id: VoteId) -> anyhow::Result<()> {
    let client = app.reader()?;
    let session = client.session(app.account()?).await?;
    let results = client.vote_results(&session, vote_id).await?;

    if app.json {
        return print_json_pretty(&results);
    }

    print_results(&results);

    Ok(())
}

#[derive(Serialize)]
struct VoteListing<'a> {
    votes: &'a [VoteStatus],
    failures: Vec<FailedVote>,
}

#[derive(Serialize)]
struct FailedVote {
    id: VoteId,
    error: String,
}

impl<'a> From<&'a Reconciliation> for VoteListing<'a> {
    fn from(reconciliation: &'a Reconciliation) -> Self {
        Self {
            votes: &reconciliation.votes,
            failures: reconciliation
                .failures
                .iter()
                .map(|(id, err)| FailedVote {
                    id: *id,
                    error: err.to_string(),
                })
                .collect(),
        }
    }
}

fn print_votes(votes: &[VoteStatus]) {
    if votes.is_empty() {
        println!("No votes found.");
        return;
    }

    println!(
        "{}",
        format!("{:<6} {:<24} {:<8} {:<12} OPTIONS", "ID", "NAME", "STATUS", "TIME LEFT").bold()
    );

    for vote in votes {
        let status = if vote.is_open {
            format!("{:<8}", "open").green()
        } else {
            format!("{:<8}", "closed").red()
        };

        let options = vote
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| format!("{index}: {} ({})", option.name, option.count))
            .collect::<Vec<_>>()
            .join(", ");

        println!(
            "{:<6} {:<24} {status} {:<12} {options}",
            vote.id,
            vote.name,
            vote.time_left.to_string()
        );
    }
}

fn print_results(results: &VoteResults) {
    println!("{}", format!("Vote {}: {}", results.id, results.name).bold());

    let winner = results.winner();

    for (index, option) in results.options.iter().enumerate() {
        let line = format!(
            "{index:>3}  {:<24} {:>6}  {:>5.1}%",
            option.name,
            option.count,
            results.percentage(index)
        );

        if winner == Some(index) {
            println!("{}", line.green().bold());
        } else {
            println!("{line}");
        }
    }

    println!("{} {}", label("total"), results.total());
}
