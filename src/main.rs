//! Mothball CLI entrypoint for stale-issue triage.

use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Utc;
use mothball::github::IssueGateway;
use mothball::telemetry::{StderrJsonlTelemetrySink, TelemetrySink};
use mothball::{
    MothballConfig, OctocrabIssueGateway, PersonalAccessToken, ReadonlyGateway, RepositoryLocator,
    StaleCloser, TriageError, TriageSummary,
};
use ortho_config::OrthoConfig;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), TriageError> {
    let config = load_config()?;

    let (owner, repo) = config.require_repository_info()?;
    let token_value = config.resolve_token()?;

    let locator = build_locator(&config, owner, repo)?;
    let token = PersonalAccessToken::new(token_value)?;
    let gateway = OctocrabIssueGateway::for_token(&token, &locator)?;
    let sink = StderrJsonlTelemetrySink::default();

    let summary = if config.readonly {
        let readonly = ReadonlyGateway::new(gateway);
        triage(&config, &readonly, &sink, locator).await?
    } else {
        triage(&config, &gateway, &sink, locator).await?
    };

    write_summary(&summary, config.readonly)?;
    Ok(())
}

fn build_locator(
    config: &MothballConfig,
    owner: &str,
    repo: &str,
) -> Result<RepositoryLocator, TriageError> {
    config.base_url.as_deref().map_or_else(
        || RepositoryLocator::from_owner_repo(owner, repo),
        |host| {
            let trimmed = host.trim_end_matches('/');
            RepositoryLocator::parse(&format!("{trimmed}/{owner}/{repo}"))
        },
    )
}

async fn triage<Gateway>(
    config: &MothballConfig,
    gateway: &Gateway,
    sink: &dyn TelemetrySink,
    locator: RepositoryLocator,
) -> Result<TriageSummary, TriageError>
where
    Gateway: IssueGateway,
{
    let closer = StaleCloser::new(gateway, sink, locator, config.policy()?)?
        .with_warn_comment(config.warn_comment.as_deref())
        .with_close_comment(config.close_comment.as_deref())
        .with_stale_label(config.stale_label.as_deref())
        .with_actor(config.actor.as_deref());
    closer.run(Utc::now()).await
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`TriageError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<MothballConfig, TriageError> {
    MothballConfig::load().map_err(|error| TriageError::Configuration {
        message: error.to_string(),
    })
}

fn write_summary(summary: &TriageSummary, readonly: bool) -> Result<(), TriageError> {
    let mut stdout = io::stdout().lock();
    let mode = if readonly { " (readonly)" } else { "" };
    let message = format!(
        "Triage complete{mode}: warned {}, closed {}, skipped {}, waiting {}",
        summary.warned, summary.closed, summary.skipped, summary.waiting
    );

    writeln!(stdout, "{message}").map_err(|error| TriageError::Io {
        message: error.to_string(),
    })
}
