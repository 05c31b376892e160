pub mod landmark;

pub use landmark::{frame_from_json, Landmark, LandmarkFrame, LandmarkIndex, RawLandmark};
