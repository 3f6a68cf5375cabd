mod exchange;
mod render_state;
mod turn;

pub use exchange::*;
pub use render_state::*;
pub use turn::*;
