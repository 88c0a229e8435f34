//! Pixel types and blend equations for flattening layered documents.

pub mod blend_mode;
pub mod blending;
pub mod color;
pub mod image;

pub use blend_mode::BlendMode;
pub use blending::{apply_blend_mode, blend_colors};
pub use color::Color;
pub use image::{Image, Pixel};
