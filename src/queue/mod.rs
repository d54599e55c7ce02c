pub mod flush;
pub mod store;

pub use flush::{FlushOutcome, Flusher, Scheduler};
pub use store::{PushReceipt, RingStore};
