pub mod assess;
pub mod modifier;
pub mod result;
pub mod risk;
pub mod segment;

pub use assess::Assessor;
pub use modifier::{parse_weight, ActivityRule, ActivityType, LoadBand, LoadRule};
pub use result::{AssessmentContext, AssessmentResult, SegmentScore};
pub use risk::{RiskLevel, RiskThresholds};
pub use segment::{Band, BodySide, Segment, SegmentRule};
