mod api;
mod cache;
mod config;
mod error;
mod gate;
mod resources;
mod session;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::ClientError;
use crate::gate::{authorize, authorize_action, screen_roles, Access, Permission};
use crate::resources::{Entity, Resources};
use crate::session::SessionStore;

#[derive(Parser)]
#[command(version, author = "TIMETABLE AUTHORS", about = "Timetable Client\nLicensed under AGPLv3", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "client-config.toml")]
    config: String,

    /// Generate a default configuration template to stdout
    #[arg(long)]
    generate_config: bool,

    /// Override the server URL from the config file
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and print the issued session
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the signed-in user and the screens their role may open
    Whoami,
    /// List an entity, optionally filtered: --filter class_id=3
    List {
        entity: Entity,
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Ignore any cached answer for this query
        #[arg(long)]
        fresh: bool,
    },
    /// Fetch one row by id
    Show { entity: Entity, id: i32 },
    /// Create a row from a JSON body
    Create {
        entity: Entity,
        #[arg(long)]
        json: String,
    },
    /// Update a row from a JSON body holding the changed fields
    Update {
        entity: Entity,
        id: i32,
        #[arg(long)]
        json: String,
    },
    /// Delete a row by id
    Delete { entity: Entity, id: i32 },
    /// Replace the subjects a teacher can teach
    AssignSubjects {
        teacher_id: i32,
        #[arg(value_delimiter = ',')]
        subject_ids: Vec<i32>,
    },
    /// Run the timetable generator for a department
    Generate {
        #[arg(long)]
        department_id: Option<i32>,
        #[arg(long)]
        class_id: Option<i32>,
        /// Report the proposal without saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// Dashboard counts
    Stats,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn parse_body(raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| anyhow!("--json is not valid JSON: {}", e))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn sign_in(
    store: &SessionStore,
    config: &Config,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let email = email
        .or_else(|| config.email.clone())
        .ok_or_else(|| anyhow!("no email given (use --email or set `email` in the config)"))?;
    let password = password
        .or_else(|| config.password.clone())
        .ok_or_else(|| anyhow!("no password given (use --password or set `password` in the config)"))?;
    store.login(&email, &password).await?;
    Ok(())
}

/// Adds a hint for the status codes a user can act on.
fn explain(err: anyhow::Error) -> anyhow::Error {
    let hint = match err.downcast_ref::<ClientError>().and_then(ClientError::status) {
        Some(StatusCode::UNAUTHORIZED) => "check the email and password (or sign in again)",
        Some(StatusCode::FORBIDDEN) => "the signed-in role may not do this",
        Some(StatusCode::TOO_MANY_REQUESTS) => "too many attempts, wait a minute and retry",
        _ => return err,
    };
    err.context(hint)
}

async fn run(
    command: Command,
    store: &SessionStore,
    resources: &Resources,
    config: &Config,
) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            sign_in(store, config, email, password).await?;
            let session = store.snapshot();
            if let Some(user) = session.user() {
                println!("Signed in as {} ({})", user.email, user.role);
            }
            if let Some(token) = session.access_token() {
                println!("{}", token);
            }
        }
        Command::Whoami => {
            sign_in(store, config, None, None).await?;
            let user = store.whoami().await?;
            print_json(&user)?;
            println!("permissions: {:?}", user.role.permissions());

            let session = store.snapshot();
            for (screen, _) in gate::SCREENS {
                let roles = screen_roles(screen).unwrap_or(&[]);
                let marker = match authorize(&session, roles) {
                    Access::Allow => "allow",
                    Access::AccessDenied => "denied",
                    Access::RedirectToLogin => "login",
                };
                println!("  {:<16} {}", screen, marker);
            }
        }
        Command::List {
            entity,
            filters,
            fresh,
        } => {
            sign_in(store, config, None, None).await?;
            let rows = if fresh {
                resources.refetch(entity, &filters).await?
            } else {
                resources.list(entity, &filters).await?
            };
            print_json(&rows)?;
        }
        Command::Show { entity, id } => {
            sign_in(store, config, None, None).await?;
            print_json(&resources.get(entity, id).await?)?;
        }
        Command::Create { entity, json } => {
            let body = parse_body(&json)?;
            sign_in(store, config, None, None).await?;
            print_json(&resources.create(entity, &body).await?)?;
        }
        Command::Update { entity, id, json } => {
            let body = parse_body(&json)?;
            sign_in(store, config, None, None).await?;
            print_json(&resources.update(entity, id, &body).await?)?;
        }
        Command::Delete { entity, id } => {
            sign_in(store, config, None, None).await?;
            print_json(&resources.delete(entity, id).await?)?;
        }
        Command::AssignSubjects {
            teacher_id,
            subject_ids,
        } => {
            sign_in(store, config, None, None).await?;
            print_json(
                &resources
                    .replace_teacher_subjects(teacher_id, &subject_ids)
                    .await?,
            )?;
        }
        Command::Generate {
            department_id,
            class_id,
            dry_run,
        } => {
            sign_in(store, config, None, None).await?;
            let session = store.snapshot();
            let needed = [Permission::ManageTimetables, Permission::CreateTimetables];
            if authorize_action(&session, &needed) != Access::Allow {
                let role = session.user().map(|u| u.role.to_string()).unwrap_or_default();
                bail!("role '{}' may not generate timetables", role);
            }
            let request = serde_json::json!({
                "department_id": department_id,
                "class_id": class_id,
                "persist": !dry_run,
            });
            print_json(&resources.generate(&request).await?)?;
        }
        Command::Stats => {
            sign_in(store, config, None, None).await?;
            print_json(&resources.stats().await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::default_template());
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timetable_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let api = Arc::new(ApiClient::new(&config.server_url, config.retry)?);
    let store = SessionStore::new(api.clone());
    let resources = Resources::new(api, config.stale_time());

    let Some(command) = cli.command else {
        println!("Nothing to do. Try --help.");
        return Ok(());
    };

    // Login prints a token for reuse, so only that command keeps its session.
    let keep_session = matches!(command, Command::Login { .. });
    let outcome = run(command, &store, &resources, &config).await;

    if !keep_session && store.snapshot().is_authenticated() {
        store.logout().await;
    }

    outcome.map_err(explain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("class_id=3").unwrap(),
            ("class_id".to_string(), "3".to_string())
        );
        assert!(parse_filter("class_id").is_err());
        assert!(parse_filter("=3").is_err());
    }

    #[test]
    fn test_cli_parses_list_with_filters() {
        let cli = Cli::try_parse_from([
            "timetable-client",
            "list",
            "timetable-entries",
            "--filter",
            "class_id=2",
            "--filter",
            "teacher_id=5",
        ])
        .unwrap();
        match cli.command {
            Some(Command::List {
                entity,
                filters,
                fresh,
            }) => {
                assert_eq!(entity, Entity::TimetableEntries);
                assert_eq!(filters.len(), 2);
                assert!(!fresh);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_cli_parses_subject_list_and_rejects_unknown_entity() {
        let cli = Cli::try_parse_from(["timetable-client", "assign-subjects", "4", "1,2,3"]).unwrap();
        match cli.command {
            Some(Command::AssignSubjects {
                teacher_id,
                subject_ids,
            }) => {
                assert_eq!(teacher_id, 4);
                assert_eq!(subject_ids, vec![1, 2, 3]);
            }
            _ => panic!("expected assign-subjects"),
        }

        assert!(Cli::try_parse_from(["timetable-client", "list", "lecturers"]).is_err());
        assert!(parse_body("{not json").is_err());
    }

    #[test]
    fn test_api_errors_get_a_hint() {
        let forbidden = anyhow::Error::new(ClientError::Api {
            status: StatusCode::FORBIDDEN,
            message: "Role 'teacher' is not allowed to perform this action".into(),
            errors: Vec::new(),
        });
        let explained = format!("{:#}", explain(forbidden));
        assert!(explained.starts_with("the signed-in role may not do this"));
        assert!(explained.contains("403 Forbidden"));

        let other = explain(anyhow!("--json is not valid JSON"));
        assert_eq!(other.to_string(), "--json is not valid JSON");
    }
}
