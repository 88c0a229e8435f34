//! Layer tree model and compositing engine for layered image documents.
//!
//! A [`Document`] owns a tree of layers built from flat [`records::RecordStore`] layer records. Groups, clipping,
//! masks, vector data and layer effects are exposed as cached views, and [`Document::composite`] flattens any
//! subtree into an image.

pub mod adjustment;
pub mod channels;
pub mod clipping;
pub mod composite;
pub mod document;
pub mod effects;
pub mod error;
pub mod fill;
pub mod geometry;
pub mod layers;
pub mod mask;
pub mod origination;
pub mod records;
pub mod smart_object;
pub mod structure;
pub mod text;
pub mod vector;

#[cfg(test)]
mod test_utils;

pub use channels::{ChannelDecoder, RawChannelDecoder};
pub use composite::{CompositeImage, CompositeRequest, CompositeSettings, LayerFilter};
pub use document::Document;
pub use error::DocumentError;
pub use geometry::Rect;
pub use layers::{LayerKey, LayerKind, LayerNode};
pub use layered_raster::{BlendMode, Color, Image};
