use crate::{
    config::{Config, ConfigError, SettingsSlot},
    handlers, migrations,
    plugin::{ActivateError, CommandRouter},
    services::{log_events, EventBus, KvService, TelegramHost, UserService},
};
use carapax::{longpoll::LongPoll, Api, ApiError, App, Context};
use clap::{Parser, Subcommand};
use refinery::Error as MigrationError;
use std::{error::Error, fmt, sync::Arc};
use tokio::spawn;
use tokio_postgres::{connect as pg_connect, Error as PgError, NoTls as PgNoTls};

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Parser)]
#[clap(about, author, version)]
pub struct Arguments {
    /// Command to run
    #[clap(subcommand)]
    command: Command,
    /// Path to config
    config: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run migrations
    Migrate,
    /// Start bot
    Start,
}

pub async fn run() -> Result<(), AppError> {
    let args = Arguments::parse();
    let config = Config::read_from_file(&args.config).map_err(AppError::ReadConfig)?;

    let (mut pg_client, pg_connection) = pg_connect(&config.database_url, PgNoTls)
        .await
        .map_err(AppError::PgConnect)?;

    spawn(async move {
        if let Err(err) = pg_connection.await {
            log::error!("PostgreSQL connection error: {}", err);
        }
    });

    match args.command {
        Command::Migrate => {
            migrations::run(&mut pg_client).await.map_err(AppError::Migrate)?;
        }
        Command::Start => {
            let api = Api::new(&config.token).map_err(AppError::CreateApi)?;
            let pg_client = Arc::new(pg_client);
            let user_service = UserService::new(pg_client.clone());

            let events = EventBus::new(EVENT_BUS_CAPACITY);
            spawn(log_events(events.subscribe()));

            let host = TelegramHost::new(api.clone(), user_service.clone(), KvService::new(pg_client), events);
            let settings = SettingsSlot::new(config.silencer.clone());
            let router = CommandRouter::new(host, settings.clone());
            router.activate().await.map_err(AppError::Activate)?;

            #[cfg(unix)]
            spawn(reload_on_hangup(args.config.clone(), settings));

            let mut context = Context::default();
            context.insert(api.clone());
            context.insert(user_service);
            context.insert(router);

            let chain = handlers::setup();
            let app = App::new(context, chain);

            log::info!("Starting long polling");
            LongPoll::new(api, app).run().await;
        }
    }

    Ok(())
}

/// Re-reads the configuration file on SIGHUP and swaps in the new settings.
#[cfg(unix)]
async fn reload_on_hangup(path: String, settings: SettingsSlot) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(err) => {
            log::error!("Could not listen for SIGHUP, settings reload disabled: {}", err);
            return;
        }
    };
    while hangup.recv().await.is_some() {
        let result = Config::read_from_file(&path)
            .map_err(|err| err.to_string())
            .and_then(|config| settings.replace(config.silencer).map_err(|err| err.to_string()));
        match result {
            Ok(()) => log::info!("Reloaded settings from {}", path),
            Err(err) => log::error!("Keeping current settings: {}", err),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Activate(ActivateError),
    CreateApi(ApiError),
    Migrate(MigrationError),
    PgConnect(PgError),
    ReadConfig(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::AppError::*;
        match self {
            Activate(err) => write!(out, "Could not activate silencer: {}", err),
            CreateApi(err) => write!(out, "Could not create API client: {}", err),
            Migrate(err) => write!(out, "Migration error: {}", err),
            PgConnect(err) => write!(out, "PostgreSQL: {}", err),
            ReadConfig(err) => write!(out, "{}", err),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::AppError::*;
        Some(match self {
            Activate(err) => err,
            CreateApi(err) => err,
            Migrate(err) => err,
            PgConnect(err) => err,
            ReadConfig(err) => err,
        })
    }
}
