//! The end-to-end run: inputs, server setup, search, cleanup

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::output::{print_info, print_success, print_warning};
use crate::progress::SpinnerObserver;
use minperm_grants::GrantUniverse;
use minperm_qreader::{fingerprint, plain, Source};
use minperm_search::{CancelFlag, SearchDriver, SearchObserver, SearchReport};
use minperm_tester::mysql::{MySqlAdmin, ScratchDatabase};
use minperm_tester::{Classifier, ErrorPolicy};
use minperm_types::TestCase;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Everything a run needs besides the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dsn: String,
    pub statements: Vec<String>,
    pub sources: Vec<Source>,
    pub prepare_file: Option<PathBuf>,
    pub keep_scratch_db: bool,
    pub show_progress: bool,
}

/// Gather statements from the command line and every configured source, in that
/// order.
pub fn collect_statements(options: &RunOptions) -> CliResult<Vec<TestCase>> {
    let mut cases: Vec<TestCase> = options
        .statements
        .iter()
        .map(|sql| sql.trim().trim_end_matches(';').trim_end())
        .filter(|sql| !sql.is_empty())
        .map(|sql| TestCase::new(sql).with_fingerprint(fingerprint(sql)))
        .collect();

    for source in &options.sources {
        cases.extend(source.read()?);
    }

    if cases.is_empty() {
        return Err(CliError::NoStatements);
    }
    Ok(cases)
}

fn read_prepare_file(path: &Path) -> CliResult<Vec<String>> {
    let path = minperm_qreader::expand_home(path);
    let file = File::open(&path).map_err(|source| minperm_qreader::ReadError::Io {
        path: path.clone(),
        source,
    })?;
    let cases = plain::parse(BufReader::new(file))
        .map_err(|source| minperm_qreader::ReadError::Io { path, source })?;
    Ok(cases.into_iter().map(|case| case.query).collect())
}

pub async fn run(options: RunOptions, config: AppConfig) -> CliResult<SearchReport> {
    let cases = collect_statements(&options)?;
    info!(statements = cases.len(), "Collected statements");

    let prepare = match &options.prepare_file {
        Some(path) => read_prepare_file(path)?,
        None => Vec::new(),
    };

    config.search.validate()?;
    for policy in &config.policies {
        policy.validate()?;
    }

    let admin = MySqlAdmin::connect(&options.dsn, config.connection.clone()).await?;
    let result = run_with_admin(&admin, &options, &config, cases, &prepare).await;
    admin.close().await;
    result
}

async fn run_with_admin(
    admin: &MySqlAdmin,
    options: &RunOptions,
    config: &AppConfig,
    cases: Vec<TestCase>,
    prepare: &[String],
) -> CliResult<SearchReport> {
    admin.check_grant_option().await?;
    let version = admin.server_version().await?;

    // Held until the scratch database is released: an interrupt from here on
    // raises the cancel flag instead of killing the process.
    let signals = SignalGuard::install();
    let mut scratch = admin.create_scratch_database(options.keep_scratch_db).await?;
    let result = search_in(
        admin,
        &scratch,
        options,
        config,
        &version,
        cases,
        prepare,
        signals.cancel_flag(),
    )
    .await;

    if let Err(e) = scratch.release().await {
        warn!(database = scratch.name(), error = %e, "Failed to drop scratch database");
        print_warning(&format!("Could not drop scratch database {}: {e}", scratch.name()));
    } else if options.keep_scratch_db {
        print_info(&format!("Scratch database kept: {}", scratch.name()));
    }

    result
}

#[allow(clippy::too_many_arguments)]
async fn search_in(
    admin: &MySqlAdmin,
    scratch: &ScratchDatabase,
    options: &RunOptions,
    config: &AppConfig,
    version: &minperm_grants::ServerVersion,
    cases: Vec<TestCase>,
    prepare: &[String],
    cancel: CancelFlag,
) -> CliResult<SearchReport> {
    if !prepare.is_empty() {
        admin.run_script(scratch.name(), prepare).await?;
        print_success(&format!(
            "Ran {} preparation statement(s) in {}",
            prepare.len(),
            scratch.name()
        ));
    }

    let universe = GrantUniverse::for_version(version);
    let policy = match ErrorPolicy::select(&config.policies, version) {
        Some(policy) => policy.clone(),
        None => {
            warn!(flavor = %version.flavor(), "No error policy for this server; using the MySQL table");
            ErrorPolicy::mysql()
        }
    };

    let spinner = options.show_progress.then(|| Arc::new(SpinnerObserver::new()));
    let mut driver = SearchDriver::new(
        admin.provisioner(scratch),
        Classifier::new(policy),
        config.search.clone(),
    )
    .with_cancel_flag(cancel);
    if let Some(spinner) = &spinner {
        driver = driver.with_observer(Arc::clone(spinner) as Arc<dyn SearchObserver>);
    }

    let result = driver.run(universe, cases).await;

    if let Some(spinner) = &spinner {
        spinner.finish();
    }

    Ok(result?)
}

/// Listens for Ctrl+C and SIGTERM while alive and raises its cancel flag on either.
pub struct SignalGuard {
    cancel: CancelFlag,
    listener: JoinHandle<()>,
}

impl SignalGuard {
    pub fn install() -> Self {
        let cancel = CancelFlag::new();
        let listener = tokio::spawn(cancel_on_signal(cancel.clone()));
        Self { cancel, listener }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Raise `cancel` on Ctrl+C or SIGTERM.
async fn cancel_on_signal(cancel: CancelFlag) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping after the current combination");
        }
        _ = terminate => {
            info!("Received terminate signal, stopping after the current combination");
        }
    }

    print_warning("Interrupted: finishing the current combination, then cleaning up");
    cancel.cancel();
}
