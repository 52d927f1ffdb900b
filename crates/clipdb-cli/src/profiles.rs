//! Read-only profile queries.

use chrono::{DateTime, Utc};
use clipdb_core::Platform;
use clipdb_jobs::AnalyticsService;

fn fmt_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

/// Prints a creator's profile metadata and the summary of stored videos.
///
/// # Errors
///
/// Returns an error if the creator was never requested or the store fails.
pub(crate) async fn run_profile(
    service: &AnalyticsService,
    platform: Platform,
    username: &str,
) -> anyhow::Result<()> {
    let overview = service.profile_overview(platform, username).await?;
    let profile = &overview.profile;
    let summary = &overview.summary;

    println!("{}/{}", profile.platform, profile.username);
    if let Some(name) = &profile.display_name {
        println!("  name:          {name}");
    }
    if let Some(followers) = profile.follower_count {
        println!("  followers:     {followers}");
    }
    println!("  last scraped:  {}", fmt_time(profile.last_scraped_at));
    println!("  stored videos: {}", overview.stored_videos);
    println!("  total views:   {}", summary.total_views);
    println!("  average views: {}", summary.average_views);
    println!("  average ER%:   {:.2}", summary.average_engagement_rate);

    if summary.top_videos.is_empty() {
        println!("no stored videos; run `clipdb-cli scrape {platform} {username}`");
        return Ok(());
    }
    println!();
    println!("top videos by engagement:");
    crate::jobs::print_videos(&summary.top_videos);
    Ok(())
}

/// Prints a creator's scrape jobs, newest first.
///
/// # Errors
///
/// Returns an error if the creator was never requested or the store fails.
pub(crate) async fn run_jobs(
    service: &AnalyticsService,
    platform: Platform,
    username: &str,
    limit: u32,
) -> anyhow::Result<()> {
    let jobs = service.profile_jobs(platform, username, limit).await?;
    if jobs.is_empty() {
        println!("no scrape jobs for {platform}/{username}");
        return Ok(());
    }

    let header = format!(
        "{:<38}{:<11}{:<9}{:<18}{:<18}MESSAGE",
        "JOB", "STATUS", "RESULTS", "CREATED", "COMPLETED"
    );
    println!("{header}");
    for job in &jobs {
        let results = job
            .result_count
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "{:<38}{:<11}{:<9}{:<18}{:<18}{}",
            job.id,
            job.status,
            results,
            fmt_time(Some(job.created_at)),
            fmt_time(job.completed_at),
            job.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
