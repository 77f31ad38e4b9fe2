use std::sync::Arc;

use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_empty_collection, output_rows, output_success, report_list_error, ConsoleNotifier};
use crate::cli::{CliContext, OutputFormat};
use crate::controller::{ListController, ReorderOutcome};
use crate::database::models::{Publishable, Stop, TourFact, TourFaq, TourSection};
use crate::database::repository::{PgEntity, PgRepository};

#[derive(Subcommand)]
pub enum ListCommands {
    #[command(about = "List entries in display order")]
    List,

    #[command(about = "Add an entry at the end of the list")]
    Add {
        #[arg(help = "Fields as JSON, e.g. '{\"title\": \"Old Mill\"}'")]
        data: String,
    },

    #[command(about = "Edit fields of an entry")]
    Edit {
        #[arg(help = "Entry ID")]
        id: Uuid,
        #[arg(help = "Fields to change as JSON")]
        data: String,
    },

    #[command(about = "Move the entry at one position to another (0-based)")]
    Move {
        #[arg(help = "Current position")]
        from: usize,
        #[arg(help = "New position")]
        to: usize,
    },

    #[command(about = "Publish or hide an entry in the mobile app")]
    Toggle {
        #[arg(help = "Entry ID")]
        id: Uuid,
    },

    #[command(about = "Delete an entry")]
    Delete {
        #[arg(help = "Entry ID")]
        id: Uuid,
        #[arg(long, help = "Confirm the delete")]
        yes: bool,
    },
}

type PgController<T> = ListController<T, PgRepository<T>>;

async fn open<T: PgEntity>(ctx: &CliContext) -> anyhow::Result<PgController<T>> {
    let session = ctx.session()?;
    let database = ctx.database().await?;
    let repository = PgRepository::<T>::new(database.pool());
    let notifier = Arc::new(ConsoleNotifier::new(ctx.format));

    ListController::load(session, ctx.tour, repository, notifier)
        .await
        .map_err(|e| report_list_error(&ctx.format, e))
}

pub async fn handle_stops(cmd: ListCommands, ctx: &CliContext) -> anyhow::Result<()> {
    handle::<Stop>(cmd, ctx).await
}

pub async fn handle_sections(cmd: ListCommands, ctx: &CliContext) -> anyhow::Result<()> {
    handle_publishable::<TourSection>(cmd, ctx).await
}

pub async fn handle_facts(cmd: ListCommands, ctx: &CliContext) -> anyhow::Result<()> {
    handle_publishable::<TourFact>(cmd, ctx).await
}

pub async fn handle_faqs(cmd: ListCommands, ctx: &CliContext) -> anyhow::Result<()> {
    handle_publishable::<TourFaq>(cmd, ctx).await
}

async fn handle_publishable<T: PgEntity + Publishable>(cmd: ListCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let ListCommands::Toggle { id } = cmd else {
        return handle::<T>(cmd, ctx).await;
    };

    let controller = open::<T>(ctx).await?;
    let published = controller
        .toggle_published(id)
        .await
        .map_err(|e| report_list_error(&ctx.format, e))?;

    json_only(&ctx.format, "Visibility updated", json!({ "id": id, "is_published": published }))
}

async fn handle<T: PgEntity>(cmd: ListCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let format = &ctx.format;
    let fail = |e| report_list_error(format, e);

    if let ListCommands::Toggle { .. } = cmd {
        anyhow::bail!("{} have no published flag", T::PLURAL);
    }

    let controller = open::<T>(ctx).await?;

    match cmd {
        ListCommands::List => {
            let items = controller.items().await;
            if items.is_empty() {
                return output_empty_collection(format, T::PLURAL, &format!("No {} yet", T::PLURAL));
            }
            let rows = items
                .iter()
                .map(|item| (item.id().to_string(), item.headline().to_string()))
                .collect();
            output_rows(format, T::PLURAL, rows, json!(items))
        }
        ListCommands::Add { data } => {
            let draft: T::Draft = parse_json(&data)?;
            let created = controller.create(draft).await.map_err(fail)?;
            json_only(format, "Created", json!({ "record": created }))
        }
        ListCommands::Edit { id, data } => {
            let patch: T::Patch = parse_json(&data)?;
            controller.update(id, patch).await.map_err(fail)?;
            json_only(format, "Updated", json!({ "id": id }))
        }
        ListCommands::Move { from, to } => {
            let outcome = controller.reorder(from, to).await.map_err(fail)?;
            let message = match outcome {
                ReorderOutcome::Committed => format!("Moved {} from position {} to {}", T::LABEL, from, to),
                ReorderOutcome::Unchanged => "Position unchanged".to_string(),
                ReorderOutcome::InFlight => "Another reorder is still in progress".to_string(),
            };
            output_success(format, &message, Some(json!({ "order": controller.items().await })))
        }
        ListCommands::Delete { id, yes } => {
            controller.request_delete(id).await.map_err(fail)?;
            if !yes {
                controller.cancel_delete().await;
                eprintln!("Re-run with --yes to delete {} {}", T::LABEL, id);
            }
            controller.confirm_delete().await.map_err(fail)?;
            json_only(format, "Deleted", json!({ "id": id }))
        }
        ListCommands::Toggle { .. } => Ok(()),
    }
}

/// Text mode already printed the controller's notice
fn json_only(format: &OutputFormat, message: &str, data: serde_json::Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => output_success(format, message, Some(data)),
        OutputFormat::Text => Ok(()),
    }
}

fn parse_json<D: serde::de::DeserializeOwned>(data: &str) -> anyhow::Result<D> {
    serde_json::from_str(data).context("Fields must be a JSON object")
}
