pub mod aggregator;
pub mod normalize;
pub mod rules;
pub mod types;

pub use aggregator::{DescriptorAggregator, record_matches};
pub use normalize::{CANONICAL_FRONT_ANGLE, facing_of, normalize_camera_angle};
pub use types::{
    ContextualAttributes, DescriptorRecord, FabricDescriptor, GarmentDescriptor,
    PhotographyDescriptor, PoseDescriptor, StylingContext, UNKNOWN_GARMENT,
};
