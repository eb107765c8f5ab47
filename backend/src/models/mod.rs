pub mod ids;
pub mod level;
pub mod macros;
pub mod reference;
pub mod schedule;
pub mod time_grid;

pub use ids::*;
pub use level::*;
pub use reference::*;
pub use schedule::*;
pub use time_grid::*;
