use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crm_cli::cli::{parse_filter, watch_leads, CliConfig, Kind, ListArgs, Workspace};
use crm_core::models::ProspectStatus;
use crm_core::notice::Notice;
use crm_core::tracing_setup::init_tracing;
use crm_core::{CrmData, CrmError, Fixture, Prospect, SessionContext};
use serde_json::{json, Value};
use tracing::info;

#[derive(Parser)]
#[command(name = "crm-cli")]
#[command(about = "Browse and edit real-estate CRM records from a JSON data file")]
struct Cli {
    /// Path to JSON config file (apiBaseUrl, dataFile, session, ...)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Data file to use instead of the configured dataFile
    #[arg(long, short = 'd')]
    data: Option<PathBuf>,

    /// Act as this user id from the data file
    #[arg(long, short = 'u')]
    user: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Write changes back to the data file
    #[arg(long)]
    save: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the records visible to the current user
    List {
        #[arg(value_enum)]
        kind: Kind,
        /// Search text; join terms with '+' to require all of them
        #[arg(long, short)]
        search: Option<String>,
        /// Category filter such as status=new (repeatable)
        #[arg(long = "filter", short = 'f', value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Assign records to a sales agent
    Assign {
        #[arg(value_enum)]
        kind: Kind,
        /// Agent user id
        #[arg(long, short)]
        agent: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Change the status of records
    Status {
        #[arg(value_enum)]
        kind: Kind,
        status: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete records
    Delete {
        #[arg(value_enum)]
        kind: Kind,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Remove records whose phone number repeats an earlier one
    Dedupe {
        #[arg(value_enum)]
        kind: Kind,
    },

    /// Dashboard summary for the current user
    Stats,

    /// Create a prospect
    CreateProspect {
        #[arg(long, short)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        budget: Option<f64>,
        /// Preferred location
        #[arg(long)]
        location: Option<String>,
        /// apartment, villa, plot, ...
        #[arg(long)]
        property_type: Option<String>,
        /// hot, warm or cold
        #[arg(long)]
        status: Option<ProspectStatus>,
        /// Agent user id to own the prospect
        #[arg(long, short)]
        agent: Option<String>,
        /// Send to the backend API before recording it locally
        #[arg(long)]
        remote: bool,
    },

    /// Poll the backend for new-lead counts until Ctrl-C
    WatchLeads {
        /// Agent user id (defaults to the signed-in user)
        #[arg(long, short)]
        agent: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<CrmError>() {
            Some(err) => eprintln!("Error: {}", Notice::from_error(err).message),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::resolve(cli.config.as_deref())?;
    let data_path = cli.data.clone().unwrap_or_else(|| config.core.data_file.clone());
    let fixture = Fixture::load(&data_path)
        .with_context(|| format!("Failed to load data file: {}", data_path.display()))?;

    let session = match config.session.clone() {
        Some(session) => SessionContext::with_session(session),
        None => SessionContext::new(),
    };
    let mut ws = Workspace::new(CrmData::from_fixture(fixture), session);
    if let Some(user_id) = &cli.user {
        ws.login_as(user_id)?;
    }

    let (output, mutated) = match cli.command {
        Commands::List {
            kind,
            search,
            filters,
            from,
            to,
        } => {
            let args = ListArgs {
                search,
                filters,
                from,
                to,
            };
            (ws.list(kind, &args)?, false)
        }
        Commands::Assign { kind, agent, ids } => (ws.assign(kind, &agent, &ids)?, true),
        Commands::Status { kind, status, ids } => (ws.set_status(kind, &status, &ids)?, true),
        Commands::Delete { kind, ids } => (ws.delete(kind, &ids)?, true),
        Commands::Dedupe { kind } => (ws.dedupe(kind)?, true),
        Commands::Stats => (ws.stats()?, false),
        Commands::CreateProspect {
            name,
            phone,
            email,
            budget,
            location,
            property_type,
            status,
            agent,
            remote,
        } => {
            let mut prospect = Prospect::new(name, phone);
            prospect.email = email;
            prospect.budget = budget;
            prospect.preferred_location = location.unwrap_or_default();
            prospect.property_type = property_type.unwrap_or_default();
            prospect.status = status.unwrap_or_default();
            prospect.agent_id = agent;

            let created = if remote {
                ws.create_prospect_remote(&config.core, prospect).await?
            } else {
                ws.create_prospect(prospect)?
            };
            (created, true)
        }
        Commands::WatchLeads { agent } => {
            let pretty = cli.pretty;
            watch_leads(&config.core, &ws.session, agent, |agent_id, count| {
                print_json(&json!({ "agentId": agent_id, "newLeads": count }), pretty);
            })
            .await?;
            return Ok(());
        }
    };

    if !mutated {
        print_json(&output, cli.pretty);
        return Ok(());
    }

    let notice = if cli.save {
        ws.data
            .to_fixture()
            .save(&data_path)
            .with_context(|| format!("Failed to save data file: {}", data_path.display()))?;
        info!(path = %data_path.display(), "saved data file");
        Notice::success(format!("Saved {}", data_path.display()))
    } else {
        Notice::info("Not saved; pass --save to write changes")
    };
    print_json(&json!({ "result": output, "notice": notice }), cli.pretty);
    Ok(())
}

fn print_json(value: &Value, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}
