pub mod session;

pub use session::{AdminGuard, RequestSession};
