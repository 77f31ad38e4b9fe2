use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims, Role};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a session token signed with the configured secret")]
    Issue {
        #[arg(long, help = "Account email")]
        email: String,
        #[arg(long, default_value = "admin", help = "Role: admin or super_admin")]
        role: Role,
        #[arg(long, help = "Assigned tour (admins only)")]
        tour: Option<Uuid>,
        #[arg(long, help = "User ID (random when omitted)")]
        user_id: Option<Uuid>,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { email, role, tour, user_id } => {
            if role == Role::Admin && tour.is_none() {
                anyhow::bail!("Admin tokens need --tour");
            }

            let claims = Claims::new(user_id.unwrap_or_else(Uuid::new_v4), email, role, tour);
            let token = generate_jwt(&claims)?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": token, "claims": claims })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
    }
}
