pub mod key_worker;

pub use key_worker::{KeyWorker, TickReport};
