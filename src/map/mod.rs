mod clamp;
mod geometry;
mod globe;
mod projection;
pub mod region;
mod renderer;
mod spatial;

pub use clamp::{ViewTransform, ViewportClamp};
pub use globe::{
    altitude_for, build_patches, lonlat_to_vec3, DepthPhase, DepthSorter, DrawKind, GlobeCamera, GlobePatch,
    GLOBE_RADIUS,
};
pub use projection::{natural_earth, polar_stretch, ContentBounds, FlatLayout, RegionPath};
pub use region::{GeoBounds, Region, Winding, WindingReport};
pub use renderer::{MapRenderer, WATER};
