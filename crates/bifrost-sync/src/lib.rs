pub mod config;
pub mod error;
pub mod publish;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod stabilize;
pub mod tracker;

pub use config::{BifrostConfig, PublisherTarget};
pub use error::SyncError;
pub use publish::{
    BatchMetadata, FanoutPublisher, JsonlPublisher, MessageBatch, Publisher, StdoutPublisher,
    WebhookPublisher, METHOD_PERIODIC_SYNC,
};
pub use scheduler::{SchedulerConfig, SchedulerHandle, SyncScheduler};
pub use session::{SessionManager, SessionOutcome};
pub use source::{CaptureChannel, FileTranscriptSource, TranscriptSource};
pub use stabilize::{StabilizationMonitor, StabilizeOutcome, StabilizePolicy};
pub use tracker::BaselineTracker;
