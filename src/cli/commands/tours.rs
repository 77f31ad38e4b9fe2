use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_empty_collection, output_error, output_rows, output_success};
use crate::cli::{CliContext, OutputFormat};
use crate::database::models::{NewTour, TourPatch};
use crate::services::{PgTourStore, TourError, TourService};

#[derive(Subcommand)]
pub enum TourCommands {
    #[command(about = "List tours visible to this session")]
    List,

    #[command(about = "Create a new (unpublished) tour")]
    Create {
        #[arg(long, help = "Tour name")]
        name: String,
        #[arg(long, help = "URL slug (derived from the name when omitted)")]
        slug: Option<String>,
        #[arg(long, help = "Location shown in the app")]
        location: Option<String>,
        #[arg(long, help = "Short description")]
        description: Option<String>,
    },

    #[command(about = "Edit tour settings (uses --tour for super admins)")]
    Edit {
        #[arg(help = "Fields to change as JSON, null clears a field")]
        data: String,
    },

    #[command(about = "Publish or unpublish the tour in the mobile app")]
    Publish,
}

pub async fn handle(cmd: TourCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let database = ctx.database().await?;
    let service = TourService::new(session, PgTourStore::new(database.pool()));
    let format = &ctx.format;

    match cmd {
        TourCommands::List => {
            let tours = service.list().await?;
            if tours.is_empty() {
                return output_empty_collection(format, "tours", "No tours yet");
            }
            let rows = tours
                .iter()
                .map(|tour| {
                    let status = if tour.is_published.unwrap_or(false) { "published" } else { "draft" };
                    (tour.id.to_string(), format!("{} ({}, {})", tour.name, tour.slug, status))
                })
                .collect();
            output_rows(format, "tours", rows, json!(tours))
        }
        TourCommands::Create { name, slug, location, description } => {
            let draft = NewTour {
                name,
                slug: slug.unwrap_or_default(),
                location,
                description,
            };
            match service.create(draft).await {
                Ok(tour) => output_success(
                    format,
                    &format!("Created tour {} ({})", tour.name, tour.slug),
                    Some(json!({ "tour": tour })),
                ),
                Err(e) => report_tour_error(format, e),
            }
        }
        TourCommands::Edit { data } => {
            let patch: TourPatch = serde_json::from_str(&data).context("Invalid JSON for tour settings")?;
            match service.update(ctx.tour, patch).await {
                Ok(tour) => output_success(format, "Settings saved", Some(json!({ "tour": tour }))),
                Err(e) => report_tour_error(format, e),
            }
        }
        TourCommands::Publish => {
            let mut tour = service.get(ctx.tour).await?;
            match service.toggle_published(&mut tour).await {
                Ok(published) => {
                    let message = if published { "Tour published" } else { "Tour unpublished" };
                    output_success(format, message, Some(json!({ "id": tour.id, "is_published": published })))
                }
                Err(e) => {
                    output_error(format, "Failed to update publish status", None, None)?;
                    Err(e.into())
                }
            }
        }
    }
}

fn report_tour_error(format: &OutputFormat, err: TourError) -> anyhow::Result<()> {
    match err {
        TourError::SlugTaken(slug) => {
            output_error(
                format,
                "A tour with this URL slug already exists. Please choose a different one.",
                Some("SLUG_TAKEN"),
                Some(json!({ "slug": slug })),
            )?;
            anyhow::bail!("slug already taken")
        }
        TourError::Validation(v) => {
            output_error(format, &v.message, Some("VALIDATION_ERROR"), Some(json!(v.field_errors)))?;
            Err(v.into())
        }
        e => Err(e.into()),
    }
}
