//! Debug module for visualization of colliders and rewinds

pub mod draw;

pub use draw::{collection_lines, collider_lines, shape_lines, sphere_lines, DebugLine, RewindDebugColors};
