//! CLI commands for the tweet market engine.

pub mod markets;
pub mod quote;
pub mod simulate;
pub mod virality;

pub use markets::{run_markets, MarketsArgs};
pub use quote::{run_quote, QuoteArgs};
pub use simulate::{run_simulate, SimulateArgs};
pub use virality::{run_virality, ViralityArgs};
