use std::path::PathBuf;

use clap::Parser;
use match_judge::{PlayerKind, SessionController, SessionOutcome, SessionReport};
use memory_match::GameConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    /// Path to a JSON game config. Built-in defaults are used for missing keys
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How many sessions to play
    #[arg(short, long, default_value_t = 10)]
    num_sessions: usize,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Who clicks the cards
    #[arg(short, long, value_enum, default_value_t = PlayerKind::Memory)]
    player: PlayerKind,

    /// Overrides the fail limit from the config; zero or less means unlimited
    #[arg(long, allow_hyphen_values = true)]
    fail_limit: Option<i32>,

    /// Let delays pass instantly instead of waiting in real time
    #[arg(long, default_value_t = false)]
    virtual_clock: bool,

    /// Print the board after every resolved pair
    #[arg(long, default_value_t = false)]
    show_boards: bool,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Default)]
struct Tally {
    victories: usize,
    game_overs: usize,
    abandoned: usize,
    fails: u32,
    pairs_found: u32,
}

impl Tally {
    fn record(&mut self, report: &SessionReport) {
        match report.outcome {
            SessionOutcome::Victory => self.victories += 1,
            SessionOutcome::GameOver => self.game_overs += 1,
            SessionOutcome::Abandoned => self.abandoned += 1,
        }
        self.fails += report.fails;
        self.pairs_found += report.pairs_found;
    }
}

async fn play_sessions(
    controller: &mut SessionController,
    args: &Args,
    rng: &mut StdRng,
) -> anyhow::Result<Tally> {
    let mut player = args.player.create(StdRng::seed_from_u64(rng.gen()));
    let mut tally = Tally::default();

    for session_idx in 0..args.num_sessions {
        let report = controller.play_session(rng, player.as_mut()).await?;
        debug!(session_idx, ?report);
        tally.record(&report);
    }
    controller.finish();

    Ok(tally)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(fail_limit) = args.fail_limit {
        config.fail_limit = fail_limit;
    }

    // Get a random seed
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(args.virtual_clock)
        .build()?;

    let mut controller = SessionController::new(config).show_boards(args.show_boards);
    let tally = runtime.block_on(play_sessions(&mut controller, &args, &mut rng))?;

    let num_sessions = args.num_sessions.max(1) as f32;
    eprintln!(
        "End result after {} sessions with the {:?} player:\n- {} victories ({:.1}%)\n- {} game overs\n- {} abandoned\n- {:.1} fails and {:.1} pairs per session\n- best score {}",
        args.num_sessions,
        args.player,
        tally.victories,
        tally.victories as f32 / num_sessions * 100.0,
        tally.game_overs,
        tally.abandoned,
        tally.fails as f32 / num_sessions,
        tally.pairs_found as f32 / num_sessions,
        controller.scoreboard().best_score(),
    );

    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
