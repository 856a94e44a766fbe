//! Virality CLI command.

use chrono::Utc;
use clap::Args;

use dex_core::{analyze_virality, predict_virality_probability, EngagementMetrics, ViralityScore};

/// Arguments for the virality command.
#[derive(Args, Debug, Clone)]
pub struct ViralityArgs {
    #[arg(long)]
    pub likes: u64,

    #[arg(long)]
    pub retweets: u64,

    #[arg(long)]
    pub replies: u64,

    /// Likes at the previous snapshot (momentum is 0 without one)
    #[arg(long, requires_all = ["prev_retweets", "prev_replies"])]
    pub prev_likes: Option<u64>,

    #[arg(long)]
    pub prev_retweets: Option<u64>,

    #[arg(long)]
    pub prev_replies: Option<u64>,

    /// Hours since the tweet was posted
    #[arg(long, default_value = "1.0")]
    pub age_hours: f64,
}

fn score(args: &ViralityArgs) -> (ViralityScore, f64) {
    let now = Utc::now();
    let current = EngagementMetrics::new(args.likes, args.retweets, args.replies, now);
    let history: Vec<EngagementMetrics> = match (args.prev_likes, args.prev_retweets, args.prev_replies) {
        (Some(likes), Some(retweets), Some(replies)) => {
            vec![EngagementMetrics::new(likes, retweets, replies, now)]
        }
        _ => Vec::new(),
    };

    (
        analyze_virality(&current, &history),
        predict_virality_probability(&current, args.age_hours),
    )
}

/// Runs the virality command.
pub fn run_virality(args: ViralityArgs) {
    let (virality, probability) = score(&args);

    println!();
    println!("Engagement score:   {:.0}", virality.score);
    println!("Momentum:           {:.2}%", virality.momentum_pct);
    println!("Trend:              {}", virality.trend);
    println!("Price multiplier:   {:.4}x", virality.multiplier);
    println!("Viral probability:  {:.0}%", probability * 100.0);
    println!();
}
