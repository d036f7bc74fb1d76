mod allocator;
mod error;
mod period;
mod rand;
mod runtime;
mod sleep;
mod store;
mod thread_random;
mod time;

pub use crate::allocator::*;
pub use crate::error::*;
pub use crate::period::*;
pub use crate::rand::*;
pub use crate::runtime::*;
pub use crate::sleep::*;
pub use crate::store::*;
pub use crate::thread_random::*;
pub use crate::time::*;
