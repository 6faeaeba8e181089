//! Demo driver: replays a synthetic GBM tape through the engine and prints
//! the committed plan for one contract window as JSON.
//!
//! The market quote is derived from the synthetic tape with a configurable
//! mispricing, so both the "market is right" and "market is stale" cases
//! can be exercised from the command line.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use updown_engine::models::BookLevel;
use updown_engine::{
    Clock, ContractWindow, Engine, EngineConfig, EngineInput, ManualClock, OrderbookSnapshot,
    PriceTick, QuoteSnapshot,
};

#[derive(Parser, Debug)]
#[command(name = "updown-engine", about = "Binary-contract signal engine demo")]
struct Args {
    /// Optional TOML config file; defaults apply when omitted
    #[arg(long, env = "UPDOWN_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// RNG seed for the tape and the simulator
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Contract window length in minutes
    #[arg(long, default_value_t = 15)]
    window_mins: i64,

    /// Warmup ticks before the window opens
    #[arg(long, default_value_t = 30)]
    warmup_ticks: usize,

    /// Annualized vol of the synthetic tape
    #[arg(long, default_value_t = 0.60)]
    tape_vol: f64,

    /// Quote offset from fair value (positive = YES overpriced)
    #[arg(long, default_value_t = 0.0)]
    mispricing: f64,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "updown_engine=info,info".into()),
        )
        .init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    }
    .apply_env();
    cfg.validate()?;

    let start_s: i64 = 1_700_000_000;
    let window = ContractWindow {
        window_id: format!("demo-updown-{}m-{}", args.window_mins, args.seed),
        strike: 100.0,
        start: Utc
            .timestamp_opt(start_s, 0)
            .single()
            .context("window start timestamp")?,
        end: Utc
            .timestamp_opt(start_s + args.window_mins * 60, 0)
            .single()
            .context("window end timestamp")?,
    };

    let mut tape_rng = ChaCha8Rng::seed_from_u64(args.seed);
    let sigma_per_min = args.tape_vol / (525_600.0f64).sqrt();

    // Warmup history so the EWMA estimator is calibrated at the open
    let mut ticks: Vec<PriceTick> = Vec::new();
    let mut close = 100.0;
    for i in 0..args.warmup_ticks {
        let ts_ms = (start_s - (args.warmup_ticks as i64 - i as i64) * 60) * 1000;
        close *= gbm_step(sigma_per_min, &mut tape_rng);
        ticks.push(PriceTick { ts_ms, close });
    }

    let clock = ManualClock::new(start_s * 1000);
    let mut engine = Engine::with_seed(cfg, clock.clone(), args.seed);

    info!(window = %window.window_id, strike = window.strike, "replaying synthetic tape");

    let mut locked = None;
    'replay: for minute in 0..args.window_mins {
        clock.set((start_s + minute * 60) * 1000);
        close *= gbm_step(sigma_per_min, &mut tape_rng);
        ticks.push(PriceTick { ts_ms: clock.now_ms(), close });

        engine.submit(EngineInput {
            ticks: ticks.clone(),
            quote: Some(synthetic_quote(close, window.strike, args.mispricing)),
            book: Some(synthetic_book(close, window.strike)),
            window: window.clone(),
        });

        // Let the debounce elapse, then poll through the rest of the minute
        for _ in 0..4 {
            clock.advance(15_000);
            if let Some(plan) = engine.poll() {
                locked = Some(plan);
                break 'replay;
            }
        }
    }

    match locked {
        Some(plan) => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        None => {
            info!("window ended without a committed plan");
        }
    }
    Ok(())
}

fn gbm_step<R: Rng>(sigma: f64, rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    (sigma * z - 0.5 * sigma * sigma).exp()
}

/// Quote pinned near the distance-to-strike heuristic, shifted by the
/// requested mispricing.
fn synthetic_quote(close: f64, strike: f64, mispricing: f64) -> QuoteSnapshot {
    let moneyness = ((close / strike).ln() * 400.0).tanh();
    let fair = (0.5 + 0.45 * moneyness).clamp(0.05, 0.95);
    let mid = (fair + mispricing).clamp(0.02, 0.98);
    QuoteSnapshot {
        yes_bid: (mid - 0.01).max(0.01),
        yes_ask: (mid + 0.01).min(0.99),
        no_bid: (1.0 - mid - 0.01).max(0.01),
        no_ask: (1.0 - mid + 0.01).min(0.99),
        last_trade: Some(mid),
    }
}

fn synthetic_book(close: f64, strike: f64) -> OrderbookSnapshot {
    // Mild bid skew when spot is above strike, ask skew below
    let skew = if close > strike { 1.2 } else { 0.8 };
    OrderbookSnapshot {
        bids: vec![
            BookLevel { price: 0.49, size: 40.0 * skew },
            BookLevel { price: 0.48, size: 25.0 * skew },
        ],
        asks: vec![
            BookLevel { price: 0.51, size: 40.0 / skew },
            BookLevel { price: 0.52, size: 25.0 / skew },
        ],
    }
}
