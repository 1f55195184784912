use crate::{Board, Card, CardState};

/// Renders the board as a box of cards, with row and column numbers.
///
/// Face-down cards are drawn as `░░`, revealed ones show their symbol,
/// and removed ones leave a gap.
pub fn visualize_board(board: &Board) -> String {
    let layout = board.layout();

    // Draw the top of the box
    let mut result = String::from("    ");
    for column in 0..layout.columns {
        result += &format!(" {:>2}", column);
    }
    result += "\n    ╭";
    for _ in 0..layout.columns {
        result += "───";
    }
    result += "─╮\n";

    for row in 0..layout.rows {
        result += &format!("{:>3} │", row);
        for column in 0..layout.columns {
            let cell = match board.card_at(row, column) {
                Some(card) => match card.state() {
                    CardState::Hidden => String::from("░░"),
                    CardState::Revealed => format!("{:>2}", card.symbol()),
                    CardState::Disabled => String::from("  "),
                },
                None => String::from("  "),
            };
            result += &format!(" {}", cell);
        }
        result += " │\n";
    }

    // Draw the bottom of the box
    result += "    ╰";
    for _ in 0..layout.columns {
        result += "───";
    }
    result += "─╯";
    result
}
