//! Scrape-job command handlers: launching, one-shot status, and polling.

use std::time::Duration;

use clipdb_core::{AppConfig, CanonicalVideo, JobStatusReport};
use clipdb_jobs::{
    poll_until_settled, AnalyticsOutcome, AnalyticsRequest, AnalyticsService, PollOutcome,
    PollPolicy,
};
use uuid::Uuid;

/// Poll policy from config, with command-line overrides.
pub(crate) fn poll_policy(
    config: &AppConfig,
    interval_secs: Option<u64>,
    max_attempts: Option<u32>,
) -> PollPolicy {
    let base = PollPolicy::from_config(config);
    PollPolicy::new(
        interval_secs.map_or(base.interval, Duration::from_secs),
        max_attempts.unwrap_or(base.max_attempts),
    )
}

pub(crate) fn format_report(report: &JobStatusReport) -> String {
    let mut line = format!("job {} {}", report.job_id, report.status);
    if let Some(count) = report.result_count {
        line.push_str(&format!(" results={count}"));
    }
    if let Some(message) = &report.error_message {
        line.push_str(&format!(" message=\"{message}\""));
    }
    line
}

pub(crate) fn print_videos(videos: &[CanonicalVideo]) {
    let header = format!(
        "{:<24}{:>12}{:>10}{:>10}{:>10}{:>8}",
        "VIDEO", "VIEWS", "LIKES", "COMMENTS", "SHARES", "ER%"
    );
    println!("{header}");
    for v in videos {
        println!(
            "{:<24}{:>12}{:>10}{:>10}{:>10}{:>8.2}",
            v.video_id, v.views, v.likes, v.comments, v.shares, v.engagement_rate
        );
    }
}

/// Requests analytics for a creator. With `watch`, polls a started job until
/// it settles.
///
/// # Errors
///
/// Returns an error for invalid input, a rejected launch, or a persistence
/// failure.
pub(crate) async fn run_scrape(
    service: &AnalyticsService,
    request: AnalyticsRequest,
    watch: Option<PollPolicy>,
) -> anyhow::Result<()> {
    match service.request_analytics(request).await? {
        AnalyticsOutcome::Cached { profile, videos } => {
            println!(
                "serving {} cached video(s) for {}/{}; pass --force to rescrape",
                videos.len(),
                profile.platform,
                profile.username
            );
            print_videos(&videos);
        }
        AnalyticsOutcome::Started { job, profile } => {
            println!(
                "started scrape of {}/{}: {}",
                profile.platform,
                profile.username,
                format_report(&job)
            );
            if let Some(policy) = watch {
                run_watch(service, job.job_id, policy).await?;
            } else {
                println!("check progress with `clipdb-cli status {}`", job.job_id);
            }
        }
    }
    Ok(())
}

/// Reconciles a job once and prints the result.
///
/// # Errors
///
/// Returns an error if the job does not exist or cannot be read.
pub(crate) async fn run_status(service: &AnalyticsService, job_id: Uuid) -> anyhow::Result<()> {
    let report = service.job_status(job_id).await?;
    println!("{}", format_report(&report));
    Ok(())
}

/// Polls a job until it settles. Hitting the attempt cap is reported, not
/// treated as a failure; the remote run may still finish later.
///
/// # Errors
///
/// Returns an error if the job does not exist or cannot be read.
pub(crate) async fn run_watch(
    service: &AnalyticsService,
    job_id: Uuid,
    policy: PollPolicy,
) -> anyhow::Result<()> {
    let outcome = poll_until_settled(service.reconciler(), job_id, policy, |report, attempt| {
        println!("[{attempt}/{}] {}", policy.max_attempts.max(1), format_report(report));
    })
    .await?;

    match outcome {
        PollOutcome::Finished(report) => {
            println!("settled: {}", format_report(&report));
        }
        PollOutcome::TimedOut { last, attempts } => {
            println!(
                "still {} after {attempts} poll(s); run `clipdb-cli watch {}` to keep waiting",
                last.status, last.job_id
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipdb_core::JobStatus;

    #[test]
    fn format_report_includes_optional_fields_only_when_present() {
        let id = Uuid::nil();
        let running = JobStatusReport {
            job_id: id,
            status: JobStatus::Running,
            result_count: None,
            error_message: None,
        };
        assert_eq!(format_report(&running), format!("job {id} running"));

        let completed = JobStatusReport {
            job_id: id,
            status: JobStatus::Completed,
            result_count: Some(0),
            error_message: Some("no public videos".to_string()),
        };
        assert_eq!(
            format_report(&completed),
            format!("job {id} completed results=0 message=\"no public videos\"")
        );
    }
}
