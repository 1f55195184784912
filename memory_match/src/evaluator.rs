use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::Card;

/// Where the drain loop currently is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing queued, waiting for the next pair.
    Idle,
    /// A pair has been dequeued, and both faces are shown for the configured delay.
    Delaying,
    /// The dequeued pair is being compared and its outcome applied.
    Resolving,
    /// The session ended, or the evaluator was stopped.
    Over,
}

/// Counters of one session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub pairs_found: u32,
    pub fails: u32,
    pub game_over: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvaluatorSettings {
    pub total_pairs: u32,
    /// Applied before every comparison, even though the outcome is known earlier.
    pub delay: Duration,
    /// Zero or less means unlimited.
    pub fail_limit: i32,
}

impl EvaluatorSettings {
    /// How many more mismatches are allowed after `fails` of them,
    /// or `None` without a fail limit.
    pub fn remaining_fails(&self, fails: u32) -> Option<u32> {
        (self.fail_limit > 0).then(|| self.fail_limit.unsigned_abs().saturating_sub(fails))
    }

    fn fail_limit_reached(&self, fails: u32) -> bool {
        self.fail_limit > 0 && fails >= self.fail_limit.unsigned_abs()
    }
}

/// Outcomes reported by the evaluator.
///
/// Each method is called from the drain loop, never while the evaluator's
/// state is locked, so it is fine to call back into the evaluator.
pub trait SessionObserver: Send + Sync {
    fn on_match(&self) {}
    /// `remaining_allowed` is `None` when there is no fail limit.
    fn on_fail(&self, _remaining_allowed: Option<u32>) {}
    /// Called at most once per session.
    fn on_victory(&self) {}
    /// Called at most once per session.
    fn on_game_over(&self) {}
}

/// The same outcomes as [`SessionObserver`], as values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    Matched,
    Failed { remaining: Option<u32> },
    Victory,
    GameOver,
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::Victory | SessionEvent::GameOver)
    }
}

/// Forwards outcomes into a channel. A closed channel is ignored.
impl SessionObserver for mpsc::UnboundedSender<SessionEvent> {
    fn on_match(&self) {
        let _ = self.send(SessionEvent::Matched);
    }

    fn on_fail(&self, remaining_allowed: Option<u32>) {
        let _ = self.send(SessionEvent::Failed {
            remaining: remaining_allowed,
        });
    }

    fn on_victory(&self) {
        let _ = self.send(SessionEvent::Victory);
    }

    fn on_game_over(&self) {
        let _ = self.send(SessionEvent::GameOver);
    }
}

struct PendingPair<C: ?Sized> {
    first: Arc<C>,
    second: Arc<C>,
}

/// What happened to a pair, reported once the state is unlocked again.
enum Resolution {
    /// The session was already over, the cards were just turned back.
    ForcedMiss,
    Matched { victory: bool },
    Missed { remaining: Option<u32>, game_over: bool },
}

struct SessionState<C: ?Sized> {
    queue: VecDeque<PendingPair<C>>,
    /// Revealed cards that are not part of a queued pair yet. Never more than two.
    buffer: Vec<Arc<C>>,
    stats: SessionStats,
    phase: Phase,
    stopped: bool,
}

impl<C: Card + ?Sized> SessionState<C> {
    fn is_over(&self) -> bool {
        self.stats.game_over || self.stopped
    }

    fn resolve(&mut self, pair: &PendingPair<C>, settings: &EvaluatorSettings) -> Resolution {
        self.phase = Phase::Resolving;

        if self.stats.game_over {
            pair.first.hide_as_mismatch();
            pair.second.hide_as_mismatch();
            return Resolution::ForcedMiss;
        }

        if pair.first.symbol() == pair.second.symbol() {
            pair.first.disable();
            pair.second.disable();
            self.stats.pairs_found += 1;
            let victory = self.stats.pairs_found == settings.total_pairs;
            self.stats.game_over = victory;
            Resolution::Matched { victory }
        } else {
            pair.first.hide_as_mismatch();
            pair.second.hide_as_mismatch();
            self.stats.fails += 1;
            let game_over = settings.fail_limit_reached(self.stats.fails);
            self.stats.game_over = game_over;
            Resolution::Missed {
                remaining: settings.remaining_fails(self.stats.fails),
                game_over,
            }
        }
    }
}

/// Everything the drain loop and [`PairEvaluator::handle_selection()`] share.
struct Shared<C: ?Sized> {
    settings: EvaluatorSettings,
    observer: Arc<dyn SessionObserver>,
    state: Mutex<SessionState<C>>,
    /// Signalled whenever a pair is queued.
    work: Notify,
}

impl<C: Card + ?Sized> Shared<C> {
    fn lock(&self) -> MutexGuard<'_, SessionState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, resolution: Resolution) {
        match resolution {
            Resolution::ForcedMiss => trace!("Turned back a pair queued before the session ended"),
            Resolution::Matched { victory } => {
                self.observer.on_match();
                if victory {
                    debug!("All pairs found");
                    self.observer.on_victory();
                }
            }
            Resolution::Missed {
                remaining,
                game_over,
            } => {
                self.observer.on_fail(remaining);
                if game_over {
                    debug!("Fail limit reached");
                    self.observer.on_game_over();
                }
            }
        }
    }
}

/// Turns selected cards into pairs and resolves them one at a time.
///
/// Selections go in through [`handle_selection()`](Self::handle_selection),
/// which only reveals the card and queues complete pairs. A background task,
/// started with [`start()`](Self::start), takes the pairs off the queue in
/// order, shows each for the configured delay, and then either removes both
/// cards or turns them back.
///
/// One evaluator lives for one session. Dropping it stops its task.
pub struct PairEvaluator<C: Card + ?Sized + 'static> {
    shared: Arc<Shared<C>>,
    task: Option<JoinHandle<()>>,
}

impl<C: Card + ?Sized + 'static> PairEvaluator<C> {
    pub fn new(settings: EvaluatorSettings, observer: Arc<dyn SessionObserver>) -> Self {
        let state = SessionState {
            queue: VecDeque::new(),
            buffer: Vec::with_capacity(2),
            stats: SessionStats::default(),
            phase: Phase::Idle,
            stopped: false,
        };
        Self {
            shared: Arc::new(Shared {
                settings,
                observer,
                state: Mutex::new(state),
                work: Notify::new(),
            }),
            task: None,
        }
    }

    /// Spawns the drain loop on the current tokio runtime.
    ///
    /// Does nothing if the loop is already running or the evaluator was stopped.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn start(&mut self) {
        if self.task.is_some() || self.shared.lock().stopped {
            return;
        }
        self.task = Some(tokio::spawn(drain(Arc::clone(&self.shared))));
    }

    /// Cancels the drain loop immediately.
    ///
    /// A pair that is currently being shown is abandoned: its cards stay
    /// revealed and no callback fires for it. Later selections are ignored.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut state = self.shared.lock();
        state.stopped = true;
        state.phase = Phase::Over;
        debug!(stats = ?state.stats, "Evaluator stopped");
    }

    /// Reveals `card` and queues it for comparison once it has a partner.
    ///
    /// Ignored after the session is over, and for a card that is already
    /// waiting for its partner.
    pub fn handle_selection(&self, card: &Arc<C>) {
        let mut state = self.shared.lock();
        if state.is_over() {
            trace!(card = %card.id(), "Ignoring selection, session is over");
            return;
        }
        if state.buffer.iter().any(|selected| selected.id() == card.id()) {
            trace!(card = %card.id(), "Ignoring repeated selection");
            return;
        }

        card.reveal();
        state.buffer.push(Arc::clone(card));

        if state.buffer.len() < 2 {
            return;
        }
        let second = state.buffer.remove(1);
        let first = state.buffer.remove(0);
        trace!(first = %first.id(), second = %second.id(), "Queued pair");
        state.queue.push_back(PendingPair { first, second });
        drop(state);
        self.shared.work.notify_one();
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    pub fn stats(&self) -> SessionStats {
        self.shared.lock().stats
    }

    pub fn settings(&self) -> EvaluatorSettings {
        self.shared.settings
    }

    /// True once the session was won or lost, or the evaluator was stopped.
    pub fn is_over(&self) -> bool {
        self.shared.lock().is_over()
    }
}

impl<C: Card + ?Sized + 'static> Drop for PairEvaluator<C> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn drain<C: Card + ?Sized + 'static>(shared: Arc<Shared<C>>) {
    loop {
        let pair = {
            let mut state = shared.lock();
            if state.stopped {
                return;
            }
            match state.queue.pop_front() {
                Some(pair) => {
                    state.phase = Phase::Delaying;
                    Some(pair)
                }
                None if state.stats.game_over => break,
                None => {
                    state.phase = Phase::Idle;
                    None
                }
            }
        };

        let Some(pair) = pair else {
            shared.work.notified().await;
            continue;
        };

        tokio::time::sleep(shared.settings.delay).await;
        let resolution = {
            let mut state = shared.lock();
            // Cancellation only lands at an await point, so check by hand
            if state.stopped {
                return;
            }
            state.resolve(&pair, &shared.settings)
        };
        shared.report(resolution);
    }

    // A single card may still be waiting for a partner that will never come.
    let mut state = shared.lock();
    for card in state.buffer.drain(..) {
        card.hide_as_mismatch();
    }
    state.phase = Phase::Over;
    debug!(stats = ?state.stats, "Session finished");
}
