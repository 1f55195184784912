use std::collections::BTreeMap;

use clap::ValueEnum;
use memory_match::{Board, BoardLayout, Card, CardId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Someone who clicks cards.
///
/// The controller asks for one card at a time. `first` is the card
/// already picked for the current pair, if any.
pub trait Player {
    fn name(&self) -> &str;
    fn new_board(&mut self, layout: BoardLayout);
    fn pick(&mut self, board: &Board, first: Option<CardId>) -> Option<CardId>;
    /// Called with the face of every card this player revealed.
    fn observe(&mut self, _card: CardId, _symbol: u32) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlayerKind {
    /// Clicks face-down cards at random and forgets everything.
    Random,
    /// Remembers every face it has seen.
    Memory,
}

impl PlayerKind {
    pub fn create(self, rng: StdRng) -> Box<dyn Player> {
        match self {
            PlayerKind::Random => Box::new(RandomPlayer { rng }),
            PlayerKind::Memory => Box::new(MemoryPlayer::new(rng)),
        }
    }
}

fn clickable_cards(board: &Board, first: Option<CardId>) -> Vec<CardId> {
    board
        .cards()
        .iter()
        .filter(|card| card.accepts_click() && Some(card.id()) != first)
        .map(|card| card.id())
        .collect()
}

pub struct RandomPlayer {
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        "random"
    }

    fn new_board(&mut self, _layout: BoardLayout) {}

    fn pick(&mut self, board: &Board, first: Option<CardId>) -> Option<CardId> {
        clickable_cards(board, first).choose(&mut self.rng).copied()
    }
}

pub struct MemoryPlayer {
    rng: StdRng,
    seen: BTreeMap<CardId, u32>,
}

impl MemoryPlayer {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            seen: BTreeMap::new(),
        }
    }

    fn known(&self, card: CardId) -> Option<u32> {
        self.seen.get(&card).copied()
    }

    /// A face-down card known to show `symbol`.
    fn partner_for(&self, symbol: u32, candidates: &[CardId]) -> Option<CardId> {
        candidates
            .iter()
            .copied()
            .find(|&card| self.known(card) == Some(symbol))
    }

    /// The first face-down card whose partner is also known.
    fn known_pair(&self, candidates: &[CardId]) -> Option<CardId> {
        candidates.iter().copied().find(|&card| {
            self.known(card).is_some_and(|symbol| {
                candidates
                    .iter()
                    .any(|&other| other != card && self.known(other) == Some(symbol))
            })
        })
    }

    fn unexplored(&mut self, candidates: &[CardId]) -> Option<CardId> {
        let unknown: Vec<CardId> = candidates
            .iter()
            .copied()
            .filter(|card| !self.seen.contains_key(card))
            .collect();
        unknown
            .choose(&mut self.rng)
            .or_else(|| candidates.choose(&mut self.rng))
            .copied()
    }
}

impl Player for MemoryPlayer {
    fn name(&self) -> &str {
        "memory"
    }

    fn new_board(&mut self, _layout: BoardLayout) {
        self.seen.clear();
    }

    fn pick(&mut self, board: &Board, first: Option<CardId>) -> Option<CardId> {
        let candidates = clickable_cards(board, first);
        let known_choice = match first {
            None => self.known_pair(&candidates),
            Some(card) => self
                .known(card)
                .and_then(|symbol| self.partner_for(symbol, &candidates)),
        };
        known_choice.or_else(|| self.unexplored(&candidates))
    }

    fn observe(&mut self, card: CardId, symbol: u32) {
        self.seen.insert(card, symbol);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use memory_match::{BoardGenerator, Headless};
    use rand::SeedableRng;

    use super::*;

    fn small_board(seed: u64) -> Board {
        let generator = BoardGenerator::new(3..=3, 2, 3);
        let mut rng = StdRng::seed_from_u64(seed);
        Board::build(&generator, &mut rng, Arc::new(Headless)).unwrap()
    }

    #[test]
    fn memory_player_uses_known_pair() {
        let board = small_board(3);
        let mut player = MemoryPlayer::new(StdRng::seed_from_u64(0));
        player.new_board(board.layout());
        for card in board.cards() {
            player.observe(card.id(), card.symbol());
        }

        let first = player.pick(&board, None).unwrap();
        let second = player.pick(&board, Some(first)).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            board.card(first).unwrap().symbol(),
            board.card(second).unwrap().symbol()
        );
    }

    #[test]
    fn memory_player_explores_unknown_cards_first() {
        let board = small_board(5);
        let mut player = MemoryPlayer::new(StdRng::seed_from_u64(0));
        player.new_board(board.layout());
        let card = &board.cards()[0];
        player.observe(card.id(), card.symbol());

        let first = player.pick(&board, None).unwrap();
        assert_ne!(first, card.id());
    }

    #[test]
    fn players_skip_cards_that_swallow_clicks() {
        let board = small_board(9);
        for card in &board.cards()[1..] {
            card.reveal();
        }
        let mut player = RandomPlayer::new(StdRng::seed_from_u64(0));
        assert_eq!(player.pick(&board, None), Some(CardId(0)));
        assert_eq!(player.pick(&board, Some(CardId(0))), None);
    }
}
