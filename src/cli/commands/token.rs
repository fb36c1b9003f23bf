use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(
    config: &AppConfig,
    claims: Claims,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => {
            let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0);
            println!(
                "{}",
                json!({
                    "token": token,
                    "user_id": claims.id,
                    "expires_at": expires_at,
                })
            );
        }
        OutputFormat::Text => println!("{}", token),
    }

    Ok(())
}
