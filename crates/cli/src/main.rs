mod args;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::json;

use matchlens_infra::jobs::JobStatus;
use matchlens_infra::{AppConfig, CreateJobRequest, InsightService};

use args::Args;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    matchlens_observability::init();

    let args = Args::parse();
    let config = AppConfig::from_env().context("loading configuration")?;
    let service = InsightService::from_config(&config).context("building service")?;

    let mut request = CreateJobRequest::new(args.riot_id.to_string(), args.region.to_string());
    request.match_limit = args.limit;
    let id = service.create_job(request).await?;
    tracing::info!(job_id = %id, riot_id = %args.riot_id, "job queued");

    let mut last_percent = None;
    let status = loop {
        let view = service.get_job_status(id).await?;
        if last_percent != Some(view.progress.percent) {
            last_percent = Some(view.progress.percent);
            tracing::info!(
                job_id = %id,
                percent = view.progress.percent,
                message = view.progress.message.as_deref().unwrap_or(""),
                "progress"
            );
        }
        if view.status.is_terminal() {
            break view;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    if status.status == JobStatus::Error {
        bail!(
            "job {id} failed: {}",
            status.error.as_deref().unwrap_or("unknown error")
        );
    }

    let outcome = service.get_job_result(id).await?;
    let duo = match &args.duo {
        Some(partner) => Some(
            service
                .get_duo_summary(&args.riot_id, args.region, partner)
                .await
                .with_context(|| format!("duo summary with {partner}"))?,
        ),
        None => None,
    };

    let output = json!({
        "job_id": id,
        "fetch": outcome.fetch,
        "summary": outcome.summary,
        "duo": duo,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
