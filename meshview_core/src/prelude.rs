pub use crate::pipeline::{
    export_pipeline, load_pipeline, MessageCallbacks, PipelineCallbacks, ProfilingCallbacks,
};
pub use crate::session::{IngestionSession, RequestId, SessionObserver, SessionState};
