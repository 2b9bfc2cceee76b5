#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An arbitrary annotation attached to a single voxel, e.g. the state of an interactive object placed in the volume.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum VoxelMetadata {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<bool> for VoxelMetadata {
    fn from(v: bool) -> Self {
        VoxelMetadata::Bool(v)
    }
}

impl From<i64> for VoxelMetadata {
    fn from(v: i64) -> Self {
        VoxelMetadata::Int(v)
    }
}

impl From<f64> for VoxelMetadata {
    fn from(v: f64) -> Self {
        VoxelMetadata::Float(v)
    }
}

impl From<String> for VoxelMetadata {
    fn from(v: String) -> Self {
        VoxelMetadata::Text(v)
    }
}

impl From<&str> for VoxelMetadata {
    fn from(v: &str) -> Self {
        VoxelMetadata::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for VoxelMetadata {
    fn from(v: Vec<u8>) -> Self {
        VoxelMetadata::Bytes(v)
    }
}
