use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::LayerKey;
use crate::records::{BlockData, Tag};

use layered_raster::Color;

/// Content of a fill or shape layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillContent<'a> {
	Solid(Color),
	/// Gradient fills are kept as their descriptor and are not rendered.
	Gradient(&'a serde_json::Value),
	/// Pattern fills are kept as their descriptor and are not rendered.
	Pattern(&'a serde_json::Value),
}

impl Document {
	/// The fill block of a fill or shape layer, if the layer has one in a readable form.
	pub fn fill_content(&self, key: LayerKey) -> Result<Option<FillContent<'_>>, DocumentError> {
		let node = self.layer(key)?;
		let content = match node.record.tagged_blocks.get_any(&Tag::FILLS) {
			Some((_, BlockData::SolidColor(color))) => Some(FillContent::Solid(*color)),
			Some((Tag::GradientFillSetting, BlockData::Descriptor(descriptor))) => Some(FillContent::Gradient(descriptor)),
			Some((Tag::PatternFillSetting, BlockData::Descriptor(descriptor))) => Some(FillContent::Pattern(descriptor)),
			Some((tag, _)) => {
				log::debug!("Fill block {tag:?} of \"{}\" has an unexpected payload", node.name());
				None
			}
			None => None,
		};
		Ok(content)
	}
}
