use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Identifies a card on the board.
///
/// Boards hand these out in row-major order, so the id doubles as the
/// card's index into [`Board::cards()`](crate::Board::cards).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub usize);

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The logical state of a [card](Card).
///
/// The only transitions are `Hidden -> Revealed`, `Revealed -> Hidden` (after
/// a mismatch) and `Revealed -> Disabled` (after a match).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    /// Face down, can be clicked.
    Hidden,
    /// Face up, showing its symbol.
    Revealed,
    /// Matched and removed from play. Terminal.
    Disabled,
}

/// What the [`PairEvaluator`](crate::PairEvaluator) needs from a card.
///
/// The evaluator is the only caller of the state-changing methods. Anything
/// visual (animations, sounds) happens behind them.
pub trait Card: Send + Sync {
    fn id(&self) -> CardId;
    fn symbol(&self) -> u32;
    fn reveal(&self);
    /// Turn the card face down without any fuss.
    fn hide(&self);
    /// Turn the card face down after a failed comparison.
    fn hide_as_mismatch(&self);
    fn disable(&self);
}

/// Receives the visible side of card transitions.
///
/// This is where a frontend plugs in its animations and sound effects.
/// All methods default to doing nothing.
///
/// Transitions driven by a `PairEvaluator` run while its state is locked, so
/// an implementation must not call back into that evaluator.
pub trait CardPresenter: Send + Sync {
    fn revealed(&self, _card: CardId) {}
    fn hidden(&self, _card: CardId) {}
    fn mismatched(&self, _card: CardId) {}
    fn disabled(&self, _card: CardId) {}
}

/// A presenter for boards nobody looks at.
#[derive(Clone, Copy, Debug, Default)]
pub struct Headless;

impl CardPresenter for Headless {}

/// A card on a [`Board`](crate::Board).
///
/// Holds the logical state and refuses transitions that are not allowed,
/// e.g. a disabled card can never be revealed again.
pub struct TableCard {
    id: CardId,
    symbol: u32,
    state: Mutex<CardState>,
    presenter: Arc<dyn CardPresenter>,
}

impl TableCard {
    pub fn new(id: CardId, symbol: u32, presenter: Arc<dyn CardPresenter>) -> Self {
        Self {
            id,
            symbol,
            state: Mutex::new(CardState::Hidden),
            presenter,
        }
    }

    pub fn state(&self) -> CardState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a click on this card should be forwarded to the evaluator.
    ///
    /// Revealed and disabled cards swallow clicks.
    pub fn accepts_click(&self) -> bool {
        self.state() == CardState::Hidden
    }

    /// Moves to `to` if the current state is `from`. Returns whether the state changed.
    fn transition(&self, from: CardState, to: CardState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            trace!(card = %self.id, current = ?*state, requested = ?to, "Ignoring card transition");
            return false;
        }
        *state = to;
        true
    }
}

impl std::fmt::Debug for TableCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCard")
            .field("id", &self.id)
            .field("symbol", &self.symbol)
            .field("state", &self.state())
            .finish()
    }
}

impl Card for TableCard {
    fn id(&self) -> CardId {
        self.id
    }

    fn symbol(&self) -> u32 {
        self.symbol
    }

    fn reveal(&self) {
        if self.transition(CardState::Hidden, CardState::Revealed) {
            self.presenter.revealed(self.id);
        }
    }

    fn hide(&self) {
        if self.transition(CardState::Revealed, CardState::Hidden) {
            self.presenter.hidden(self.id);
        }
    }

    fn hide_as_mismatch(&self) {
        if self.transition(CardState::Revealed, CardState::Hidden) {
            self.presenter.mismatched(self.id);
        }
    }

    fn disable(&self) {
        if self.transition(CardState::Revealed, CardState::Disabled) {
            self.presenter.disabled(self.id);
        }
    }
}
