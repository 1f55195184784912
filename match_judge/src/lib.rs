mod player;
mod session;
pub use player::*;
pub use session::*;
