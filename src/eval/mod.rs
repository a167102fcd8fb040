//! Chunked evaluation and the parallel driver.

pub mod driver;
pub mod evaluate;
pub mod progress;
pub mod scratch;

pub use driver::{evaluate_image, negotiate_datatype, EvalOptions};
pub use evaluate::{evaluate, EvalRef};
pub use progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
pub use scratch::WorkerScratch;
