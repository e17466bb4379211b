//! Sensory dissonance: pairwise roughness scoring, the swept dissonance
//! field and the background ticker that keeps both current.

pub mod field;
pub mod model;
pub mod ticker;

pub use field::{dissonance_curve, field, field_raw, normalize, scale_field};
pub use model::{loudness, score, FrequencySet};
pub use ticker::{AnalysisInput, DissonanceMonitor, DissonanceTicker, FieldReport};
