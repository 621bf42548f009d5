use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use backend_domain::{Role, Session, SubRole};
use backend_infrastructure::{AppConfig, JwtSessionProvider};

#[derive(Parser, Debug)]
#[command(name = "stagepass-backend")]
#[command(about = "Stagepass Backend Server", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a signed bearer token for local testing
    IssueToken {
        user_id: String,
        /// ADMIN, ORGANIZER or USER
        #[arg(long, default_value = "USER")]
        role: String,
        /// STAFF or SUPER_ADMIN, admins only
        #[arg(long)]
        sub_role: Option<String>,
        #[arg(long, default_value_t = 60)]
        ttl_minutes: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let _log_guard = backend_bootstrap::telemetry::init_tracing(&config)?;
            backend_bootstrap::run_standalone(config).await
        }
        Command::IssueToken {
            user_id,
            role,
            sub_role,
            ttl_minutes,
        } => {
            let sub_role = match sub_role {
                Some(raw) => Some(
                    SubRole::parse(&raw).ok_or_else(|| anyhow!("unknown sub-role '{}'", raw))?,
                ),
                None => None,
            };
            let session = Session {
                user_id,
                role: Role::from(role.as_str()),
                sub_role,
            };
            let token = JwtSessionProvider::new(&config.jwt_secret)
                .issue(&session, chrono::Duration::minutes(ttl_minutes.max(1)))?;
            println!("{}", token);
            Ok(())
        }
    }
}
