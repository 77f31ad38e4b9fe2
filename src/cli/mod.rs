pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SessionContext;
use crate::config;
use crate::database::manager::DatabaseManager;

#[derive(Parser)]
#[command(name = "touradmin")]
#[command(about = "Tour admin CLI - manage stops, sections, facts and FAQs for a tour")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "TOUR_ADMIN_TOKEN", hide_env_values = true, help = "Session token (JWT)")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Tour to operate on (required for super admins)")]
    pub tour: Option<Uuid>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Tour stops")]
    Stops {
        #[command(subcommand)]
        cmd: commands::lists::ListCommands,
    },

    #[command(about = "Tour information sections")]
    Sections {
        #[command(subcommand)]
        cmd: commands::lists::ListCommands,
    },

    #[command(about = "Did-you-know facts")]
    Facts {
        #[command(subcommand)]
        cmd: commands::lists::ListCommands,
    },

    #[command(about = "Frequently asked questions")]
    Faqs {
        #[command(subcommand)]
        cmd: commands::lists::ListCommands,
    },

    #[command(about = "Stop image galleries")]
    Images {
        #[command(subcommand)]
        cmd: commands::images::ImageCommands,
    },

    #[command(about = "Tour registry (super admin)")]
    Tours {
        #[command(subcommand)]
        cmd: commands::tours::TourCommands,
    },

    #[command(about = "Session token management")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Resolved global options shared by the list and tour commands
pub struct CliContext {
    pub token: Option<String>,
    pub tour: Option<Uuid>,
    pub format: OutputFormat,
}

impl CliContext {
    pub fn session(&self) -> anyhow::Result<SessionContext> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No session token: pass --token or set TOUR_ADMIN_TOKEN"))?;
        Ok(SessionContext::from_token(token)?)
    }

    /// Connect and ping, so a bad URL fails before any command runs
    pub async fn database(&self) -> anyhow::Result<DatabaseManager> {
        let database = DatabaseManager::connect(&config::config().database).await?;
        database.health_check().await?;
        Ok(database)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext {
        format: OutputFormat::from_cli(&cli),
        token: cli.token,
        tour: cli.tour,
    };

    match cli.command {
        Commands::Stops { cmd } => commands::lists::handle_stops(cmd, &ctx).await,
        Commands::Sections { cmd } => commands::lists::handle_sections(cmd, &ctx).await,
        Commands::Facts { cmd } => commands::lists::handle_facts(cmd, &ctx).await,
        Commands::Faqs { cmd } => commands::lists::handle_faqs(cmd, &ctx).await,
        Commands::Images { cmd } => commands::images::handle(cmd, &ctx).await,
        Commands::Tours { cmd } => commands::tours::handle(cmd, &ctx).await,
        Commands::Token { cmd } => commands::token::handle(cmd, ctx.format).await,
    }
}
