//! Voxel working buffer: a resizable box of nodes with per-cell scratch flags.
#![forbid(unsafe_code)]

pub mod area;
pub mod buffer;
pub mod direction;

pub use area::VoxelArea;
pub use buffer::{
    FLAG_CHECKED1, FLAG_CHECKED2, FLAG_CHECKED3, FLAG_CHECKED4, FLAG_NO_DATA, VoxelBuffer,
};
pub use direction::Direction;
