mod calendar;
mod expense;
mod money;
mod split;
mod user;

pub use calendar::*;
pub use expense::*;
pub use money::*;
pub use split::*;
pub use user::*;
