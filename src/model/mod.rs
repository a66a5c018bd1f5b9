//! Static description of the battery box: faces, materials, geometry, and the resolved thermal network.

pub mod face;
pub mod geometry;
pub mod material;
pub mod thermal;

pub use face::{Face, FaceMap};
pub use geometry::Cuboid;
pub use material::{Material, MaterialRegistry};
pub use thermal::{FaceCoupling, ThermalModel};
