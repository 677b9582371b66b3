//! # lfgweb CLI Entry Point
//!
//! The main executable for the Looking-For-Group client. This file drives the application
//! lifecycle:
//!
//! 1. **Initialization**: Sets up logging and parses command-line arguments using [`cli::Cli`].
//! 2. **Configuration**: Loads the stored settings and merges them with the flags.
//! 3. **Execution**: Runs the subcommand through a typed [`LfgClient`]. Ctrl-C shuts the client
//!    down, which ends live `watch` subscriptions cleanly.
//! 4. **Presentation**: Prints the results or the error to standard output/error.
mod cli;
mod config;
mod formatter;

use clap::Parser;
use cli::{ApplicationCommands, Cli, Commands, ConfigCommands, GroupCommands};
use config::{ConfigManager, Settings};
use formatter::{ApplicationList, FormattedString, GenericError, GroupList};
use lfg_service::{CallOptions, LfgClient, LfgError, Subscription, pb};
use lfgweb_core::{BoxError, ClientConfig, StreamOutcome, UnaryOutcome, bytes::Bytes};
use std::process;
use tonic::{body::Body, client::GrpcService};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();

    let manager = match args.connection.config.clone() {
        Some(path) => ConfigManager::at(path),
        None => ConfigManager::new().unwrap_or_else(|err| exit_with(GenericError("Config", err))),
    };
    let settings = manager
        .load()
        .unwrap_or_else(|err| exit_with(GenericError("Config", err)));

    let command = match args.command {
        Commands::Config { sub } => return run_config(&manager, settings, sub),
        Commands::Groups { sub } => Command::Groups(sub),
        Commands::Applications { sub } => Command::Applications(sub),
    };

    let config = settings.client_config(&args.connection);
    tracing::debug!(url = %config.url, http2 = args.connection.http2, "starting lfgweb");

    if args.connection.http2 {
        let client = LfgClient::connect(config)
            .await
            .unwrap_or_else(|err| exit_with(err));
        run(client, command).await;
    } else {
        let client = LfgClient::http1(config).unwrap_or_else(|err| exit_with(err));
        run(client, command).await;
    }
}

enum Command {
    Groups(GroupCommands),
    Applications(ApplicationCommands),
}

fn exit_with(err: impl Into<FormattedString>) -> ! {
    let formatted: FormattedString = err.into();
    eprintln!("{formatted}");
    process::exit(1);
}

async fn run<S>(client: LfgClient<S>, command: Command)
where
    S: GrpcService<Body> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::ResponseBody: http_body::Body<Data = Bytes> + Send + 'static,
    <S::ResponseBody as http_body::Body>::Error: Into<BoxError> + Send,
{
    let teardown = client.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupted, shutting down");
            teardown.shutdown();
        }
    });

    let result = match command {
        Command::Groups(sub) => run_groups(client, sub).await,
        Command::Applications(sub) => run_applications(client, sub).await,
    };

    if let Err(err) = result {
        exit_with(err);
    }
}

async fn run_groups<S>(mut client: LfgClient<S>, command: GroupCommands) -> Result<(), LfgError>
where
    S: GrpcService<Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: http_body::Body<Data = Bytes> + Send + 'static,
    <S::ResponseBody as http_body::Body>::Error: Into<BoxError> + Send,
{
    let options = CallOptions::default();

    match command {
        GroupCommands::List => {
            let outcome = client.list_groups(pb::ListGroupsRequest {}, options).await?;
            print_unary(outcome.map(|res| GroupList(res.groups)));
        }
        GroupCommands::Create {
            title,
            min,
            kill_proof,
        } => {
            let request = pb::CreateGroupRequest {
                title,
                kill_proof_minimum: min,
                kill_proof_id: kill_proof as i32,
            };
            print_unary(client.create_group(request, options).await?);
        }
        GroupCommands::Update {
            id,
            title,
            min,
            kill_proof,
        } => {
            let request = pb::UpdateGroupRequest {
                group: Some(pb::Group {
                    id,
                    title,
                    kill_proof_minimum: min,
                    kill_proof_id: kill_proof as i32,
                    ..Default::default()
                }),
            };
            print_unary(client.update_group(request, options).await?);
        }
        GroupCommands::Delete { id } => {
            let request = pb::DeleteGroupRequest { group_id: id.clone() };
            let outcome = client.delete_group(request, options).await?;
            print_unary(outcome.map(|_| FormattedString(format!("Deleted group {id}"))));
        }
        GroupCommands::Watch => {
            let updates = client
                .subscribe_groups(pb::SubscribeGroupsRequest {}, options)
                .await?;
            print_updates(updates).await?;
        }
    }

    Ok(())
}

async fn run_applications<S>(
    mut client: LfgClient<S>,
    command: ApplicationCommands,
) -> Result<(), LfgError>
where
    S: GrpcService<Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: http_body::Body<Data = Bytes> + Send + 'static,
    <S::ResponseBody as http_body::Body>::Error: Into<BoxError> + Send,
{
    let options = CallOptions::default();

    match command {
        ApplicationCommands::List { group_id } => {
            let request = pb::ListGroupApplicationsRequest { group_id };
            let outcome = client.list_group_applications(request, options).await?;
            print_unary(outcome.map(|res| ApplicationList(res.applications)));
        }
        ApplicationCommands::Apply { group_id, account } => {
            let request = pb::CreateGroupApplicationRequest {
                group_id,
                account_name: account,
            };
            print_unary(client.create_group_application(request, options).await?);
        }
        ApplicationCommands::Delete { id } => {
            let request = pb::DeleteGroupApplicationRequest {
                application_id: id.clone(),
            };
            let outcome = client.delete_group_application(request, options).await?;
            print_unary(outcome.map(|_| FormattedString(format!("Withdrew application {id}"))));
        }
        ApplicationCommands::Watch { group_id } => {
            let request = pb::SubscribeGroupApplicationsRequest { group_id };
            let updates = client
                .subscribe_group_applications(request, options)
                .await?;
            print_updates(updates).await?;
        }
    }

    Ok(())
}

fn print_unary<T: Into<FormattedString>>(outcome: UnaryOutcome<T>) {
    match outcome {
        UnaryOutcome::Message(value) => {
            let formatted: FormattedString = value.into();
            println!("{formatted}");
        }
        UnaryOutcome::Canceled => eprintln!("Canceled."),
    }
}

async fn print_updates<B, T>(mut updates: Subscription<B, T>) -> Result<(), LfgError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
    T: Into<FormattedString>,
{
    loop {
        match updates.next().await? {
            StreamOutcome::Message(update) => {
                let formatted: FormattedString = update.into();
                print!("{formatted}");
            }
            StreamOutcome::End => {
                eprintln!("Server closed the subscription.");
                return Ok(());
            }
            StreamOutcome::Canceled => return Ok(()),
        }
    }
}

fn run_config(manager: &ConfigManager, mut settings: Settings, command: ConfigCommands) {
    match command {
        ConfigCommands::Show => {
            let defaults = ClientConfig::default();
            println!("Config file: {}", manager.path().display());
            println!(
                "url:   {}",
                settings.url.as_deref().unwrap_or(defaults.url.as_str())
            );
            println!(
                "token: {}",
                if settings.auth_token.is_some() {
                    "(set)"
                } else {
                    "(none)"
                }
            );
            return;
        }
        ConfigCommands::SetUrl { url } => {
            if let Err(err) = ClientConfig::new(url.clone()).base_uri() {
                exit_with(err);
            }
            settings.url = Some(url);
        }
        ConfigCommands::SetToken { token } => settings.auth_token = Some(token),
    }

    if let Err(err) = manager.save(&settings) {
        exit_with(GenericError("Failed to save config", err));
    }
    println!("Saved {}", manager.path().display());
}
