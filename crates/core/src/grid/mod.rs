//! Mesh and field storage

mod fields;
mod mesh;

pub use fields::FieldData;
pub use mesh::Mesh;
