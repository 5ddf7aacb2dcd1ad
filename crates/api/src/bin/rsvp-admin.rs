//! Operator CLI for provisioning invitations.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rsvp_api::config::{Config, LoggingConfig};
use rsvp_api::middleware::logging::init_logging;
use rsvp_api::services::{InvitationProvisioner, ProvisionRequest};

#[derive(Parser)]
#[command(name = "rsvp-admin")]
#[command(about = "Manage RSVP invitations")]
struct Cli {
    /// Database URL (defaults to the server configuration)
    #[arg(long, env = "RSVP__DATABASE__URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an invitation and print its shareable link
    Add {
        /// Family or party name shown to guests
        #[arg(long)]
        name: String,

        /// Maximum number of guests
        #[arg(long, default_value_t = 2)]
        guests: i64,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Use this code instead of a generated one
        #[arg(long)]
        code: Option<String>,
    },
    /// List invitations with their guest counts
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let overrides: Vec<(&str, &str)> = cli
        .database_url
        .as_deref()
        .map(|url| ("database.url", url))
        .into_iter()
        .collect();
    let config = Config::load_with_overrides(&overrides)?;

    init_logging(&LoggingConfig {
        level: config.logging.level.clone(),
        format: "compact".to_string(),
    })?;

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;
    persistence::db::run_migrations(&pool).await?;

    let provisioner = InvitationProvisioner::new(pool, &config.server.public_base_url);

    match cli.command {
        Command::Add {
            name,
            guests,
            email,
            phone,
            code,
        } => {
            let invitation = provisioner
                .add(
                    ProvisionRequest {
                        display_name: name,
                        max_guests: guests,
                        contact_email: email,
                        contact_phone: phone,
                        code,
                    },
                    Utc::now(),
                )
                .await?;
            println!("Code: {}", invitation.key);
            println!("Max guests: {}", invitation.max_guests);
            println!("Link: {}", provisioner.invitation_url(&invitation.key));
        }
        Command::List => {
            let overviews = provisioner.list().await?;
            if overviews.is_empty() {
                println!("No invitations yet.");
            }
            for overview in overviews {
                let invitation = &overview.invitation;
                let attending = match invitation.attendance_decision {
                    Some(true) => "attending",
                    Some(false) => "declined",
                    None => "no response",
                };
                println!(
                    "{:<12} {:<30} {}/{} guests  {}",
                    invitation.key,
                    invitation.display_name.as_deref().unwrap_or("-"),
                    overview.guest_count,
                    invitation.max_guests,
                    attending,
                );
            }
        }
    }

    Ok(())
}
