pub mod batch_ctx;
pub mod batch_worker;
pub mod partition;
pub mod prompts;

pub use batch_ctx::BatchCtx;
pub use batch_worker::BatchWorker;
pub use partition::partition;
