use clap::{Parser, Subcommand};
use anyhow::Result;
use tracing::info;

use crate::analysis::EventType;
use crate::config::Config;

pub mod commands;

#[derive(Parser)]
#[command(
    name = "event-impact",
    about = "Event-study and news-sentiment analytics over Alpha Vantage data",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the latest quote for a symbol
    Quote {
        #[arg(short, long, default_value = "AAPL")]
        symbol: String,
    },

    /// Fetch company fundamentals
    Overview {
        #[arg(short, long, default_value = "AAPL")]
        symbol: String,
    },

    /// Fetch recent news and summarize its sentiment
    News {
        #[arg(short, long, default_value = "AAPL")]
        symbol: String,

        /// Number of articles to request
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },

    /// List top gainers, losers and most actively traded tickers
    Movers,

    /// Search symbols by keyword
    Search {
        #[arg(short, long)]
        keywords: String,
    },

    /// Compute abnormal returns around an event date
    EventStudy {
        #[arg(short, long)]
        symbol: String,

        /// Benchmark symbol
        #[arg(short, long, default_value = "SPY")]
        benchmark: String,

        /// Event date (YYYY-MM-DD)
        #[arg(short, long)]
        event_date: String,

        /// Trading positions before the event (defaults to config)
        #[arg(long)]
        before: Option<usize>,

        /// Trading positions after the event (defaults to config)
        #[arg(long)]
        after: Option<usize>,
    },

    /// Classify a sentiment score against a price change (offline)
    Classify {
        /// Sentiment score in [-1, 1]
        #[arg(short, long, allow_hyphen_values = true)]
        score: f64,

        /// Price change in percent
        #[arg(short = 'c', long, allow_hyphen_values = true)]
        price_change: f64,
    },

    /// Full event analysis: event study, news sentiment and recommendation
    Analyze {
        #[arg(short, long)]
        symbol: String,

        #[arg(short, long, default_value = "SPY")]
        benchmark: String,

        /// Event date (YYYY-MM-DD)
        #[arg(short, long)]
        event_date: String,

        /// Kind of event
        #[arg(short = 't', long, value_enum)]
        event_type: Option<EventType>,

        /// Trading positions before the event (defaults to config)
        #[arg(long)]
        before: Option<usize>,

        /// Trading positions after the event (defaults to config)
        #[arg(long)]
        after: Option<usize>,

        /// Classify the latest quote's percent change instead of the window CAR
        #[arg(long)]
        use_quote: bool,

        /// Number of news articles to aggregate
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },
}

/// Execute CLI command
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Quote { symbol } => {
            info!("Fetching quote for {}", symbol);
            commands::quote(&config, symbol).await?;
        }
        Commands::Overview { symbol } => {
            info!("Fetching overview for {}", symbol);
            commands::overview(&config, symbol).await?;
        }
        Commands::News { symbol, limit } => {
            info!("Fetching news sentiment for {}", symbol);
            commands::news(&config, symbol, limit).await?;
        }
        Commands::Movers => {
            info!("Fetching top movers");
            commands::movers(&config).await?;
        }
        Commands::Search { keywords } => {
            info!("Searching symbols: {}", keywords);
            commands::search(&config, keywords).await?;
        }
        Commands::EventStudy { symbol, benchmark, event_date, before, after } => {
            info!("Running event study for {} around {}", symbol, event_date);
            commands::event_study(&config, symbol, benchmark, event_date, before, after).await?;
        }
        Commands::Classify { score, price_change } => {
            commands::classify(score, price_change)?;
        }
        Commands::Analyze {
            symbol,
            benchmark,
            event_date,
            event_type,
            before,
            after,
            use_quote,
            limit,
        } => {
            info!("Running event analysis for {} around {}", symbol, event_date);
            let options = commands::AnalyzeOptions {
                event_type,
                before,
                after,
                use_quote,
                limit,
            };
            commands::analyze(&config, symbol, benchmark, event_date, options).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_accepts_window_and_quote_flags() {
        let cli = Cli::try_parse_from([
            "event-impact",
            "analyze",
            "--symbol",
            "MSFT",
            "--event-date",
            "2024-01-02",
            "--before",
            "5",
            "--after",
            "10",
            "--use-quote",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze { before, after, use_quote, benchmark, .. } => {
                assert_eq!(before, Some(5));
                assert_eq!(after, Some(10));
                assert!(use_quote);
                assert_eq!(benchmark, "SPY");
            }
            _ => panic!("expected analyze"),
        }
    }
}
