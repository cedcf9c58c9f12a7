use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use taskgate::auth::{AuthGuard, TokenSigner, TokenVerifier};
use taskgate::config::{self, Config, DatabaseConfig};
use taskgate::store::{postgres, PgCredentialStore, PgTaskStore};
use taskgate::{routes, seed, TaskService, TokenIssuer};

/// Task tracking API with bearer-token authentication
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML config file; defaults to the nearest configs/config.yaml
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Apply pending migrations before serving
    #[arg(long)]
    with_migrations: bool,

    /// Insert the demo users before serving
    #[arg(long)]
    seed: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Print the database connection string and exit
    Dsn,
    /// Print the migrations directory and exit
    MigrationsPath,
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let outcome = match cli.command {
        Some(Command::Dsn) => print_database(&cli, |db| println!("{}", db.url)),
        Some(Command::MigrationsPath) => {
            print_database(&cli, |db| println!("{}", db.migrations_dir().display()))
        }
        None => serve(&cli).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_database(
    cli: &Cli,
    print: impl FnOnce(&DatabaseConfig),
) -> Result<(), Box<dyn std::error::Error>> {
    let file = config::load_file(cli.config.as_deref())?;
    print(&DatabaseConfig::from_env(&file)?);
    Ok(())
}

async fn serve(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file = config::load_file(cli.config.as_deref())?;
    let config = Config::from_env(&file)?;
    let pool = postgres::connect(&config).await?;

    if cli.with_migrations {
        log::info!("Applying migrations...");
        postgres::migrate(&pool, config.migrations_path.as_deref()).await?;
        log::info!("Migrations applied successfully");
    }
    if cli.seed {
        seed::seed_users(&pool).await?;
    }

    let task_service = web::Data::new(TaskService::new(Arc::new(PgTaskStore::new(pool.clone()))));
    let issuer = web::Data::new(TokenIssuer::new(
        Arc::new(PgCredentialStore::new(pool)),
        TokenSigner::new(&config.jwt_secret, config.token_ttl),
    ));
    let guard = AuthGuard::new(TokenVerifier::new(&config.jwt_secret));

    log::info!("Starting taskgate server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(task_service.clone())
            .app_data(issuer.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::configure(guard.clone()))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_and_subcommands() {
        let cli = Cli::try_parse_from(["taskgate", "--with-migrations", "--seed"]).unwrap();
        assert!(cli.with_migrations);
        assert!(cli.seed);
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["taskgate", "dsn"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Dsn)));
        assert!(!cli.with_migrations);

        let cli = Cli::try_parse_from(["taskgate", "migrations-path"]).unwrap();
        assert!(matches!(cli.command, Some(Command::MigrationsPath)));
    }

    #[test]
    fn test_misspelled_flag_is_rejected() {
        let err = Cli::try_parse_from(["taskgate", "--with-migration"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
