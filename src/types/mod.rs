//! Core value types shared by both codecs.

mod handle;
mod object_type;
mod version;

pub use handle::Handle;
pub use object_type::ObjectType;
pub use version::DxfVersion;

/// Points and 3BD values.
pub type Vector3 = nalgebra::Vector3<f64>;
