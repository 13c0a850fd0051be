pub mod item;
pub mod pool;
pub mod position;

pub use item::*;
pub use pool::*;
pub use position::*;
