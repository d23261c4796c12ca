//! Core application

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::data::{ResultShape, TraceStore};
use crate::domain::traces::{JaegerSource, SyncWindow, TraceSync};

pub struct CoreApp {
    pub config: AppConfig,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self {
            config: AppConfig::load(&cli_config)?,
        };

        match command.unwrap_or(Commands::Serve) {
            Commands::Serve => app.serve().await,
            Commands::Sync {
                start,
                end,
                limit,
                if_exists,
            } => {
                app.sync(SyncWindow {
                    start,
                    end,
                    limit,
                    if_exists,
                })
                .await
            }
            Commands::Query { sql, raw } => app.query(&sql, raw).await,
            Commands::Exec { sql } => app.exec(&sql).await,
            Commands::Show => app.show().await,
            Commands::Init => app.init_table().await,
        }
    }

    fn open_store(&self) -> Result<TraceStore> {
        TraceStore::builder()
            .url(self.config.database.url.as_str())
            .build()
            .context("Failed to configure span store")
    }

    /// Build the sync facade from configuration (store not yet connected)
    pub fn build_sync(&self) -> Result<TraceSync> {
        let source = JaegerSource::new(&self.config.tracing.url)
            .context("Failed to configure Jaeger source")?;
        tracing::debug!(endpoint = %source.endpoint(), "Jaeger source configured");
        let sync = TraceSync::new(
            source,
            self.open_store()?,
            self.config.tracing.service.as_str(),
            self.config.database.table.as_str(),
        )
        .with_default_limit(self.config.sync.limit);
        Ok(sync)
    }

    async fn sync(&self, window: SyncWindow) -> Result<()> {
        let mut sync = self.build_sync()?;
        let report = sync.sync_connected(window).await?;

        println!(
            "Synced {} traces ({} rows) of {} into {}",
            report.traces,
            report.rows,
            sync.service(),
            sync.table()
        );
        Ok(())
    }

    async fn query(&self, sql: &str, raw: bool) -> Result<()> {
        let shape = if raw {
            ResultShape::Raw
        } else {
            ResultShape::Table
        };
        let mut store = self.open_store()?;
        let output = store
            .with_connection(async |store: &mut TraceStore| store.query(sql, &[], shape).await)
            .await?;

        let rows = output.row_count();
        match output.into_table() {
            Some(table) => println!("{}", table),
            None => println!("{} rows", rows),
        }
        Ok(())
    }

    async fn exec(&self, sql: &str) -> Result<()> {
        let mut store = self.open_store()?;
        let affected = store
            .with_connection(async |store: &mut TraceStore| store.execute(sql, &[]).await)
            .await?;
        println!("{} rows affected", affected);
        Ok(())
    }

    async fn show(&self) -> Result<()> {
        let table_name = self.config.database.table.as_str();
        let mut store = self.open_store()?;
        let table = store
            .with_connection(async |store: &mut TraceStore| store.read_all(table_name).await)
            .await?;
        println!("{}", table);
        Ok(())
    }

    async fn init_table(&self) -> Result<()> {
        let table_name = self.config.database.table.as_str();
        let mut store = self.open_store()?;
        store
            .with_connection(async |store: &mut TraceStore| store.ensure_table(table_name).await)
            .await?;
        println!("Table {} is ready", table_name);
        Ok(())
    }

    async fn serve(self) -> Result<()> {
        let mut sync = self.build_sync()?;
        sync.store_mut()
            .connect()
            .await
            .context("Failed to open span store")?;

        tracing::info!(
            host = %self.config.server.host,
            port = self.config.server.port,
            service = %self.config.tracing.service,
            table = %self.config.database.table,
            "Starting {}",
            APP_NAME
        );

        ApiServer::new(self.config, sync).start().await
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}
