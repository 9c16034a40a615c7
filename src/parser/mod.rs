//! Figure extraction pipeline.
//!
//! Layout derivation, caption expansion, candidate detection, the region
//! sweep and cross-page orphan resolution, driven by [`FigureExtractor`].

mod candidates;
mod captions;
mod extractor;
mod layout;
mod options;
mod orphan;
mod sweep;

pub use candidates::{refine, CandidateDetector, ContourConfig, ContourDetector};
pub use captions::CaptionExpander;
pub use extractor::FigureExtractor;
pub use layout::LayoutBuilder;
pub use options::{ExtractOptions, LayoutOptions, SweepOptions};
pub use orphan::{CrossPageOrphanResolver, OrphanOutcome};
pub use sweep::{Placement, RegionSweepMatcher, SweepOutcome};
