//! Error types for collision registration and resolution.

use crate::collision_registry::SurfaceId;

/// Errors raised while registering surfaces or resolving contacts.
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// A triangle index points past the end of the vertex list.
    IndexOutOfRange {
        surface: String,
        index: u32,
        vertex_count: usize,
    },
    /// The index list length is not a multiple of three.
    IndicesNotTriangles { surface: String, len: usize },
    /// The surface transform has no inverse.
    SingularTransform { surface: String },
    /// Resolution against a surface produced a NaN or infinite correction.
    NonFinite { surface: String },
    /// The capsule handed to the resolver has NaN or infinite coordinates.
    NonFiniteCapsule,
    /// No surface is registered under this id.
    UnknownSurface(SurfaceId),
}

impl std::fmt::Display for CollisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollisionError::IndexOutOfRange {
                surface,
                index,
                vertex_count,
            } => write!(
                f,
                "Surface '{}': index {} out of range for {} vertices",
                surface, index, vertex_count
            ),
            CollisionError::IndicesNotTriangles { surface, len } => write!(
                f,
                "Surface '{}': {} indices do not form whole triangles",
                surface, len
            ),
            CollisionError::SingularTransform { surface } => {
                write!(f, "Surface '{}': transform is not invertible", surface)
            }
            CollisionError::NonFinite { surface } => {
                write!(f, "Surface '{}': non-finite collision correction", surface)
            }
            CollisionError::NonFiniteCapsule => write!(f, "Capsule is not finite"),
            CollisionError::UnknownSurface(id) => write!(f, "Unknown surface {:?}", id),
        }
    }
}

impl std::error::Error for CollisionError {}

/// Result type for collision operations.
pub type CollisionResult<T> = Result<T, CollisionError>;
