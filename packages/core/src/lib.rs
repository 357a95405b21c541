//! Sentinel core — wire-level types shared by the gateway and processing
//! endpoint integrators: relay frames, correlation ids, and the submission
//! and analysis JSON schemas.

pub mod analysis;
pub mod correlation;
pub mod frame;
pub mod submission;

pub use analysis::{AnalysisReport, EngagementMetrics, ExtractedIntelligence};
pub use correlation::CorrelationId;
pub use frame::Frame;
pub use submission::{InboundMessage, InboundSubmission};
