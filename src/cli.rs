use crate::echo::echo_endpoint;
use crate::encoding::YamlEncoding;
use crate::logging::{init_logging, LogConfig, LogFormat};
use crate::response::StandardResponseFactory;
use crate::runtime_config::PipelineConfig;
use crate::server::{HttpServer, PipelineService};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "brrt-pipeline")]
#[command(about = "Typed request pipeline demo server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the echo endpoint
    Serve {
        /// Bind address; overrides BRRTR_ADDR
        #[arg(long)]
        addr: Option<String>,

        /// Log format (json or pretty); overrides BRRTR_LOG_FORMAT
        #[arg(long)]
        log_format: Option<String>,

        /// Do not offer application/yaml responses
        #[arg(long, default_value_t = false)]
        json_only: bool,
    },
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            addr,
            log_format,
            json_only,
        } => {
            let mut log_config = LogConfig::from_env();
            if let Some(format) = log_format {
                log_config.format = LogFormat::parse(&format);
            }
            init_logging(&log_config)?;

            let config = PipelineConfig::from_env();
            may::config().set_stack_size(config.stack_size);

            let mut factory =
                StandardResponseFactory::json().with_panic_policy(config.panic_policy);
            if !json_only {
                factory = factory.with_encoding(YamlEncoding);
            }
            let service = PipelineService::new(Arc::new(echo_endpoint(factory)));

            let addr = addr.unwrap_or(config.addr);
            info!(
                addr = %addr,
                stack_size = config.stack_size,
                panic_policy = ?config.panic_policy,
                "Starting echo endpoint"
            );
            let handle = HttpServer(service)
                .start(addr.as_str())
                .with_context(|| format!("failed to bind {addr}"))?;
            handle
                .join()
                .map_err(|e| anyhow!("server coroutine panicked: {e:?}"))?;
            Ok(())
        }
    }
}
