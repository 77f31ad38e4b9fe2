use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_empty_collection, output_rows, output_success};
use crate::cli::CliContext;
use crate::collection::OrderedCollection;
use crate::database::gateway::Gateway;
use crate::database::models::image::moved_gallery_rows;
use crate::database::models::Stop;
use crate::database::repository::PgRepository;

#[derive(Subcommand)]
pub enum ImageCommands {
    #[command(about = "List a stop's gallery in display order")]
    List {
        #[arg(help = "Stop ID")]
        stop: Uuid,
    },

    #[command(about = "Move a gallery image and save the new order")]
    Move {
        #[arg(help = "Stop ID")]
        stop: Uuid,
        #[arg(help = "Current position")]
        from: usize,
        #[arg(help = "New position")]
        to: usize,
    },
}

pub async fn handle(cmd: ImageCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let tour_id = session.resolve_tour(ctx.tour)?;
    let database = ctx.database().await?;
    let stops = PgRepository::<Stop>::new(database.pool());
    let format = &ctx.format;

    let stop_id = match &cmd {
        ImageCommands::List { stop } | ImageCommands::Move { stop, .. } => *stop,
    };
    // Galleries are only reachable through a stop of the session's tour
    let owned = stops.list_by_tour(tour_id).await?.iter().any(|s| s.id == stop_id);
    if !owned {
        anyhow::bail!("stop {} not found in tour {}", stop_id, tour_id);
    }

    let gallery = OrderedCollection::new(stops.images(stop_id).await?);

    match cmd {
        ImageCommands::List { .. } => {
            if gallery.is_empty() {
                return output_empty_collection(format, "images", "No images yet");
            }
            let images = gallery.to_sorted_vec();
            let rows = images
                .iter()
                .map(|image| (image.id.to_string(), image.alt_text.clone().unwrap_or_else(|| image.image_url.clone())))
                .collect();
            output_rows(format, "images", rows, json!(images))
        }
        ImageCommands::Move { from, to, .. } => match moved_gallery_rows(&gallery, from, to)? {
            Some(rows) => {
                stops.replace_images(stop_id, &rows).await?;
                output_success(format, "Gallery order saved", Some(json!({ "images": rows })))
            }
            None => output_success(format, "Gallery order unchanged", None),
        },
    }
}
