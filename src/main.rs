use std::env;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use pgos::logging;
use pgos::prelude::*;
use tracing::{error, info, warn};

const CONFIG_ENV: &str = "PGOS_CONFIG";

fn config_path() -> Option<PathBuf> {
    env::args_os().nth(1).map(PathBuf::from).or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
}

async fn run(config: SamplerConfig) -> Result<u32> {
    let backend = ResctrlBackend::new(&config.resctrl_root);
    if !backend.is_supported() {
        warn!(root = %backend.root().display(), "resctrl L3 monitoring not available, RDT records will read zero");
    }

    let mut scheduler = SampleScheduler::new(config, LinuxPerfSource, backend)?;
    if scheduler.setup() == 0 {
        warn!("none of the configured groups could be resolved");
    }

    let mut sink = TsvSink::new(BufWriter::new(io::stdout().lock()));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    scheduler.run_until(&mut sink, shutdown).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let Some(path) = config_path() else {
        eprintln!("usage: pgos <config.json> (or set {CONFIG_ENV})");
        return ExitCode::from(2);
    };

    let config = match SamplerConfig::from_json_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pgos: {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.rdt_log_path) {
        eprintln!("pgos: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(cycles) => {
            info!(cycles, "sampling finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "sampling failed");
            ExitCode::FAILURE
        }
    }
}
