pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tree-nursery-api")]
#[command(about = "Tree nursery ledger - REST API server and operator tooling")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Mint a bearer token for a principal using the configured secret")]
    Token {
        #[arg(help = "Principal id placed in the `id` claim")]
        user_id: i32,
        #[arg(long, help = "Display name claim")]
        name: Option<String>,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, help = "Role claim")]
        role: Option<String>,
        #[arg(long, help = "Override SECURITY_JWT_EXPIRY_HOURS")]
        expiry_hours: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::AppConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::handle(config).await,
        Commands::Migrate => commands::migrate::handle(config).await,
        Commands::Token {
            user_id,
            name,
            email,
            role,
            expiry_hours,
        } => {
            let expiry_hours = expiry_hours.unwrap_or(config.security.jwt_expiry_hours);
            let claims = crate::auth::Claims::new(user_id, name, email, role, expiry_hours)?;
            commands::token::handle(&config, claims, output_format)
        }
    }
}
