// src/bin/pong_train.rs
//
// Continuous DQN training on the volley court. Ctrl+C stops after the
// current step and writes interrupted.ckpt before exiting.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{error, info};

use volley::agent::DqnAgent;
use volley::checkpoint::DirectoryStore;
use volley::config::Config;
use volley::env::{OpponentConfig, PongEnv};
use volley::error::Result;
use volley::metrics::{JsonHistorySink, LogSink, MultiSink};
use volley::trainer::{ResumeFrom, ResumeOutcome, StopSignal, Trainer};

const HISTORY_FILE: &str = "training_stats.json";

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ResumeArg {
    Latest,
    Best,
    None,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OpponentArg {
    Tracking,
    Predictive,
    Network,
}

#[derive(Debug, Parser)]
#[command(name = "pong-train", about = "Train a DQN agent on the volley court", version)]
struct Args {
    /// JSON configuration file; defaults are used for anything it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for checkpoints, trainer state and training history.
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Checkpoint to resume from.
    #[arg(long, value_enum)]
    resume: Option<ResumeArg>,

    /// Exploration value to use after resuming.
    #[arg(long)]
    epsilon: Option<f32>,

    /// Stop after this many episodes (default: run until Ctrl+C).
    #[arg(long)]
    max_episodes: Option<u64>,

    /// Seed for the court and the agent.
    #[arg(long)]
    seed: Option<u64>,

    /// Opponent policy for the right paddle.
    #[arg(long, value_enum)]
    opponent: Option<OpponentArg>,

    /// Checkpoint the network opponent plays with.
    #[arg(long)]
    opponent_model: Option<PathBuf>,

    /// Aiming error scale of the scripted opponents.
    #[arg(long)]
    difficulty: Option<f32>,

    /// Write the effective configuration to this path and exit.
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn effective_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(dir) = &args.checkpoint_dir {
        config.trainer.checkpoint_dir = dir.clone();
    }
    if let Some(resume) = args.resume {
        config.trainer.resume = match resume {
            ResumeArg::Latest => ResumeFrom::Latest,
            ResumeArg::Best => ResumeFrom::Best,
            ResumeArg::None => ResumeFrom::None,
        };
    }
    if args.epsilon.is_some() {
        config.trainer.resume_epsilon = args.epsilon;
    }
    if args.max_episodes.is_some() {
        config.trainer.max_episodes = args.max_episodes;
    }
    if let Some(seed) = args.seed {
        config.agent.seed = Some(seed);
    }

    let current_difficulty = match &config.opponent {
        OpponentConfig::Tracking { difficulty } | OpponentConfig::Predictive { difficulty } => *difficulty,
        OpponentConfig::Network { .. } => 0.2,
    };
    let difficulty = args.difficulty.unwrap_or(current_difficulty);
    match args.opponent {
        Some(OpponentArg::Tracking) => config.opponent = OpponentConfig::Tracking { difficulty },
        Some(OpponentArg::Predictive) => config.opponent = OpponentConfig::Predictive { difficulty },
        Some(OpponentArg::Network) => {
            let checkpoint = args
                .opponent_model
                .clone()
                .unwrap_or_else(|| config.trainer.checkpoint_dir.join("best.ckpt"));
            config.opponent = OpponentConfig::Network { checkpoint };
        }
        None => match &mut config.opponent {
            OpponentConfig::Tracking { difficulty: d } | OpponentConfig::Predictive { difficulty: d } => {
                *d = difficulty;
            }
            OpponentConfig::Network { checkpoint } => {
                if let Some(model) = &args.opponent_model {
                    *checkpoint = model.clone();
                }
            }
        },
    }

    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = effective_config(&args)?;
    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_stop.stop()) {
        error!("Could not install the Ctrl+C handler: {}", e);
    }

    let env = PongEnv::new(config.env.clone(), config.opponent.build()?, config.agent.seed)?;
    let agent = DqnAgent::new(config.agent.clone())?;
    let store = DirectoryStore::new(&config.trainer.checkpoint_dir)?;
    let history_path = store.root().join(HISTORY_FILE);

    let mut trainer = Trainer::new(env, agent, store, config.trainer.clone(), stop)?;
    let history = match trainer.resume()? {
        ResumeOutcome::Fresh => JsonHistorySink::new(history_path),
        ResumeOutcome::Resumed { episode, .. } => JsonHistorySink::resume(history_path, episode)?,
    };

    let mut sink = MultiSink::new()
        .with(LogSink::new(config.trainer.log_interval))
        .with(history);
    let summary = trainer.run(&mut sink)?;

    info!(
        "{} episodes this run, {} overall; best average {}{}",
        summary.episodes_run,
        summary.total_episodes,
        summary.best_average.map_or_else(|| "n/a".to_string(), |best| format!("{:.2}", best)),
        if summary.interrupted { " (interrupted)" } else { "" }
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
