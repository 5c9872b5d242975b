pub mod session;
pub mod storage;
pub mod voter;

pub use session::{SessionStore, SharedSessionStore};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use voter::{SharedVoterStore, VoterStore};
