//! One-shot fetch from the command line: prints elapsed time, count and each record.
//!
//! Usage: `news_probe [KEYWORDS] [OR|AND] [DAYS]`

use std::sync::Arc;
use std::time::Instant;

use chrono::{Days, Local};
use news_radar::config::NewsConfig;
use news_radar::feed::HttpFeedSource;
use news_radar::{Aggregator, CombinationMode, DateWindow, FeedUrlTemplate, FetchWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let keyword = args
        .next()
        .unwrap_or_else(|| "NVIDIA,台積電,AI伺服器".to_string());
    let mode: CombinationMode = match args.next() {
        Some(s) => s.parse()?,
        None => CombinationMode::Or,
    };
    let days: u64 = match args.next() {
        Some(s) => s.parse()?,
        None => 7,
    };

    let cfg = NewsConfig::load_default()?;
    let end = Local::now().date_naive();
    let start = end.checked_sub_days(Days::new(days)).unwrap_or(end);
    let window = DateWindow::new(start, end);

    let source = HttpFeedSource::new(&cfg.feed)?;
    let worker = FetchWorker::new(Arc::new(source), FeedUrlTemplate::from_config(&cfg.feed));
    let aggregator = Aggregator::new(worker).with_worker_timeout(cfg.worker_timeout());

    println!("keyword: '{keyword}' (logic: {mode})");
    println!("window: {} .. {}", window.start, window.end);

    let t0 = Instant::now();
    let agg = aggregator.aggregate(&keyword, window, mode).await;
    println!("done in {:.2}s, {} records", t0.elapsed().as_secs_f64(), agg.records.len());

    for (i, r) in agg.records.iter().enumerate() {
        println!(
            "{}. [{}] {} (source: {})",
            i + 1,
            r.published_at.format(news_radar::model::PUBLISHED_AT_FORMAT),
            r.title,
            r.source
        );
    }
    if !agg.failed_terms.is_empty() {
        println!("failed terms: {:?}", agg.failed_terms);
    }
    Ok(())
}
