pub mod clock;
pub mod identity;
pub mod storage;
pub mod toast;

pub use clock::SystemClock;
pub use identity::MockIdentityService;
pub use storage::{InMemoryStore, JsonFileStore};
pub use toast::TerminalToastSink;
