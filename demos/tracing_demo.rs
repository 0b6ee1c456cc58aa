//! Demonstrates the tracing events of a poll session
//!
//! Run with: cargo run --example tracing_demo --features tracing

use futures::StreamExt;
use std::time::Duration;
use tidewater::{poll_future, Activity, PollConfig, PollMode, RetryLimit, TimingStrategy};

#[tokio::main]
async fn main() {
    // Set up tracing subscriber
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    tracing::info!("Starting poll demo");

    let activity = Activity::new(true);
    let config = PollConfig::new()
        .with_mode(PollMode::WaitForCompletion)
        .with_delay(TimingStrategy::constant(Duration::from_millis(200)))
        .with_retry(TimingStrategy::exponential(Duration::from_millis(50)))
        .with_retry_limit(RetryLimit::Limited(2))
        .with_activity(&activity);

    // Every third request fails; the session recovers each time.
    let mut request = 0u32;
    let mut polls = poll_future(
        move || {
            request += 1;
            let n = request;
            async move {
                if n % 3 == 0 {
                    Err(format!("request {n} timed out"))
                } else {
                    Ok(n)
                }
            }
        },
        config,
    );

    for _ in 0..4 {
        match polls.next().await {
            Some(Ok(n)) => tracing::info!("Received response {}", n),
            Some(Err(e)) => tracing::error!("Polling gave up: {}", e),
            None => break,
        }
    }

    // Nothing is scheduled while inactive.
    activity.set_active(false);
    let idle = tokio::time::timeout(Duration::from_secs(1), polls.next()).await;
    tracing::info!("Inactive for a second, got value: {}", idle.is_ok());

    activity.set_active(true);
    if let Some(Ok(n)) = polls.next().await {
        tracing::info!("Resumed with response {}", n);
    }
}
