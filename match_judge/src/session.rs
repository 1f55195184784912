use std::sync::Arc;

use memory_match::{
    visualize_board, Board, BoardGenerator, BoardLayout, Card, CardId, GameConfig,
    Headless, PairEvaluator, Scoreboard, SessionEvent, TableCard,
};
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::player::Player;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Victory,
    GameOver,
    /// The player ran out of cards to click before the session ended.
    Abandoned,
}

#[derive(Clone, Copy, Debug)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub layout: BoardLayout,
    pub pairs_found: u32,
    pub fails: u32,
    pub score: u32,
}

/// Runs sessions back to back: builds a board, feeds the player's clicks into
/// a fresh evaluator and waits for the session to end.
pub struct SessionController {
    config: GameConfig,
    generator: BoardGenerator,
    evaluator: Option<PairEvaluator<TableCard>>,
    scoreboard: Scoreboard,
    show_boards: bool,
}

impl SessionController {
    pub fn new(config: GameConfig) -> Self {
        Self {
            generator: config.generator(),
            scoreboard: Scoreboard::new(config.score_per_match),
            config,
            evaluator: None,
            show_boards: false,
        }
    }

    /// Print the board to stdout after every resolved pair.
    pub fn show_boards(mut self, show_boards: bool) -> Self {
        self.show_boards = show_boards;
        self
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Plays one session to the end, then waits out the restart delay.
    ///
    /// Fails if no board can be built from the config.
    pub async fn play_session(
        &mut self,
        rng: &mut StdRng,
        player: &mut dyn Player,
    ) -> anyhow::Result<SessionReport> {
        // Never let two drain loops run at the same time
        if let Some(mut previous) = self.evaluator.take() {
            previous.stop();
        }

        let board = Board::build(&self.generator, rng, Arc::new(Headless))?;
        let layout = board.layout();
        player.new_board(layout);

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let settings = self.config.evaluator_settings(layout.total_pairs);
        self.scoreboard.reset(settings.remaining_fails(0));
        let mut evaluator = PairEvaluator::new(settings, Arc::new(event_tx));
        evaluator.start();
        info!(
            player = player.name(),
            rows = layout.rows,
            columns = layout.columns,
            total_pairs = layout.total_pairs,
            "New session"
        );

        let outcome = loop {
            let Some(first) = click(&board, &evaluator, player, None) else {
                break SessionOutcome::Abandoned;
            };
            if click(&board, &evaluator, player, Some(first)).is_none() {
                break SessionOutcome::Abandoned;
            }

            // Wait until the pair just clicked has been resolved
            let event = event_rx
                .recv()
                .await
                .ok_or_else(|| anyhow::anyhow!("Evaluator dropped its observer"))?;
            self.on_event(&event, &board);
            if !evaluator.is_over() {
                continue;
            }
            // The terminal event is sent right after the one for the last pair
            let event = event_rx
                .recv()
                .await
                .ok_or_else(|| anyhow::anyhow!("Evaluator dropped its observer"))?;
            self.on_event(&event, &board);
            match event {
                SessionEvent::Victory => break SessionOutcome::Victory,
                SessionEvent::GameOver => break SessionOutcome::GameOver,
                other => anyhow::bail!("Expected the end of the session, got {:?}", other),
            }
        };

        let stats = evaluator.stats();
        self.evaluator = Some(evaluator);
        if outcome == SessionOutcome::Abandoned {
            warn!(player = player.name(), "Player found nothing to click");
        }
        info!(?outcome, pairs_found = stats.pairs_found, fails = stats.fails, "{}", self.scoreboard);

        tokio::time::sleep(self.config.restart_delay()).await;

        Ok(SessionReport {
            outcome,
            layout,
            pairs_found: stats.pairs_found,
            fails: stats.fails,
            score: self.scoreboard.score(),
        })
    }

    /// Stops the evaluator of the last session.
    pub fn finish(&mut self) {
        if let Some(mut evaluator) = self.evaluator.take() {
            evaluator.stop();
        }
    }

    fn on_event(&mut self, event: &SessionEvent, board: &Board) {
        debug!(?event);
        self.scoreboard.apply(event);
        if self.show_boards && !event.is_terminal() {
            println!("{}\n{}", visualize_board(board), self.scoreboard);
        }
    }
}

/// Asks the player for a card and forwards the click. Returns the clicked card.
fn click(
    board: &Board,
    evaluator: &PairEvaluator<TableCard>,
    player: &mut dyn Player,
    first: Option<CardId>,
) -> Option<CardId> {
    let id = player.pick(board, first)?;
    let card = board.card(id)?;
    if !card.accepts_click() {
        debug!(card = %id, "Card swallowed the click");
        return None;
    }
    evaluator.handle_selection(card);
    player.observe(id, card.symbol());
    Some(id)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::player::{MemoryPlayer, RandomPlayer};

    fn config(fail_limit: i32) -> GameConfig {
        GameConfig {
            fail_limit,
            restart_delay_ms: 100,
            ..GameConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn memory_player_clears_the_board() {
        let mut controller = SessionController::new(config(-1));
        let mut rng = StdRng::seed_from_u64(11);
        let mut player = MemoryPlayer::new(StdRng::seed_from_u64(12));

        let report = controller.play_session(&mut rng, &mut player).await.unwrap();

        assert_eq!(report.outcome, SessionOutcome::Victory);
        assert_eq!(report.pairs_found, report.layout.total_pairs);
        assert_eq!(report.score, report.layout.total_pairs * 10);
        assert_eq!(controller.scoreboard().best_score(), report.score);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_limit_stops_random_player() {
        let mut controller = SessionController::new(config(1));
        let mut rng = StdRng::seed_from_u64(3);
        let mut player = RandomPlayer::new(StdRng::seed_from_u64(4));

        let report = controller.play_session(&mut rng, &mut player).await.unwrap();

        match report.outcome {
            SessionOutcome::GameOver => assert_eq!(report.fails, 1),
            SessionOutcome::Victory => assert_eq!(report.fails, 0),
            SessionOutcome::Abandoned => panic!("Random player always has a card to click"),
        }
        assert_eq!(controller.scoreboard().lives(), Some(1 - report.fails));
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_run_back_to_back() {
        let mut controller = SessionController::new(config(-1));
        let mut rng = StdRng::seed_from_u64(5);
        let mut player = MemoryPlayer::new(StdRng::seed_from_u64(6));

        let first = controller.play_session(&mut rng, &mut player).await.unwrap();
        let second = controller.play_session(&mut rng, &mut player).await.unwrap();
        controller.finish();

        assert_eq!(first.outcome, SessionOutcome::Victory);
        assert_eq!(second.outcome, SessionOutcome::Victory);
        assert_eq!(second.score, second.layout.total_pairs * 10);
        assert_eq!(
            controller.scoreboard().best_score(),
            first.score.max(second.score)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unsatisfiable_config_is_an_error() {
        let config = GameConfig {
            pair_range: [1, 1],
            max_rows: 1,
            max_columns: 1,
            ..GameConfig::default()
        };
        let mut controller = SessionController::new(config);
        let mut rng = StdRng::seed_from_u64(0);
        let mut player = RandomPlayer::new(StdRng::seed_from_u64(0));

        let err = controller
            .play_session(&mut rng, &mut player)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<memory_match::LayoutError>().is_some());
    }
}
