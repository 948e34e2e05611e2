pub mod sample;
pub mod selection;
pub mod store;

pub use sample::ReferenceSample;
pub use selection::SelectionSlot;
pub use store::ReferenceSampleStore;
