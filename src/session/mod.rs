pub mod storage;
pub mod store;

pub use storage::{CookieStorage, MemoryStorage, SessionStorage};
pub use store::{ONBOARDING_KEY, Session, SessionStore, TOKEN_KEY, USER_KEY};
