//! Layer nodes stored in the document arena.
//!
//! Each node owns its layer record and channel payloads. Parents are referenced through [`LayerKey`]
//! handles only; a group owns the ordered list of its children's keys.

pub mod name;

use crate::adjustment::AdjustmentKind;
use crate::effects::Effects;
use crate::geometry::Rect;
use crate::mask::Mask;
use crate::origination::Origination;
use crate::records::{BlockData, ChannelData, ChannelId, Clipping, LayerEntry, LayerRecord, SectionDividerKind, Tag};
use crate::vector::{Stroke, VectorMask};

use core::cell::{Cell, OnceCell};
use core::fmt;
use layered_raster::BlendMode;
use slotmap::new_key_type;

new_key_type! {
	/// Stable handle of a layer inside a [`Document`](crate::Document). Handles stay valid while the layer is moved around the tree.
	pub struct LayerKey;
}

// =========
// LayerKind
// =========

/// The closed set of layer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
	Pixel,
	SmartObject,
	Type,
	Shape,
	Adjustment,
	Fill,
	Group,
	Artboard,
}

impl fmt::Display for LayerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			LayerKind::Pixel => "Pixel",
			LayerKind::SmartObject => "Smart Object",
			LayerKind::Type => "Type",
			LayerKind::Shape => "Shape",
			LayerKind::Adjustment => "Adjustment",
			LayerKind::Fill => "Fill",
			LayerKind::Group => "Group",
			LayerKind::Artboard => "Artboard",
		};
		write!(f, "{name}")
	}
}

// =========
// LayerData
// =========

/// Children of a group or artboard, plus the hidden record that closes the group in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupLayer {
	pub(crate) children: Vec<LayerKey>,
	pub(crate) divider: LayerEntry,
}

impl GroupLayer {
	pub fn children(&self) -> &[LayerKey] {
		&self.children
	}

	pub fn divider(&self) -> &LayerEntry {
		&self.divider
	}
}

/// Kind-specific payload of a layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerData {
	Pixel,
	SmartObject,
	Type,
	Shape,
	Adjustment(AdjustmentKind),
	Fill,
	Group(GroupLayer),
	Artboard(GroupLayer),
}

impl LayerData {
	/// Picks the layer variant from the tagged blocks of a (non-group) record.
	pub fn classify(record: &LayerRecord) -> LayerData {
		let blocks = &record.tagged_blocks;
		if blocks.contains(Tag::TypeToolObjectSetting) {
			return LayerData::Type;
		}
		if blocks.contains_any(&Tag::SMART_OBJECTS) {
			return LayerData::SmartObject;
		}
		if let Some(kind) = blocks.iter().find_map(|block| match block.tag {
			Tag::Adjustment(kind) => Some(kind),
			_ => None,
		}) {
			return LayerData::Adjustment(kind);
		}

		let has_vector_mask = blocks.contains_any(&Tag::VECTOR_MASKS);
		if blocks.contains_any(&Tag::FILLS) {
			return if has_vector_mask { LayerData::Shape } else { LayerData::Fill };
		}
		if has_vector_mask && (blocks.contains(Tag::VectorStrokeContentData) || blocks.contains(Tag::VectorOriginationData)) {
			return LayerData::Shape;
		}
		LayerData::Pixel
	}

	pub fn kind(&self) -> LayerKind {
		match self {
			LayerData::Pixel => LayerKind::Pixel,
			LayerData::SmartObject => LayerKind::SmartObject,
			LayerData::Type => LayerKind::Type,
			LayerData::Shape => LayerKind::Shape,
			LayerData::Adjustment(_) => LayerKind::Adjustment,
			LayerData::Fill => LayerKind::Fill,
			LayerData::Group(_) => LayerKind::Group,
			LayerData::Artboard(_) => LayerKind::Artboard,
		}
	}

	pub fn as_group(&self) -> Option<&GroupLayer> {
		match self {
			LayerData::Group(group) | LayerData::Artboard(group) => Some(group),
			_ => None,
		}
	}

	pub fn as_group_mut(&mut self) -> Option<&mut GroupLayer> {
		match self {
			LayerData::Group(group) | LayerData::Artboard(group) => Some(group),
			_ => None,
		}
	}
}

// ==========
// LayerCache
// ==========

/// Lazily derived views of a layer. Each entry is filled on first read and reset by the mutations that can change it.
#[derive(Debug, Default)]
pub(crate) struct LayerCache {
	pub bbox: Cell<Option<Rect>>,
	pub mask: OnceCell<Option<Mask>>,
	pub vector_mask: OnceCell<Option<VectorMask>>,
	pub origination: OnceCell<Vec<Origination>>,
	pub stroke: OnceCell<Option<Stroke>>,
	pub effects: OnceCell<Effects>,
}

impl LayerCache {
	/// Forgets everything derived from the tagged blocks and mask parameters.
	pub fn invalidate_blocks(&mut self) {
		*self = LayerCache::default();
	}
}

// =========
// LayerNode
// =========

#[derive(Debug)]
pub struct LayerNode {
	pub(crate) record: LayerRecord,
	pub(crate) channels: Vec<ChannelData>,
	pub(crate) parent: Option<LayerKey>,
	pub(crate) data: LayerData,
	pub(crate) cache: LayerCache,
	/// Layers clipped onto this one, bottom to top. Derived from sibling order and clipping flags.
	pub(crate) clip_layers: Vec<LayerKey>,
	/// The base this layer is clipped onto, if any.
	pub(crate) clip_base: Option<LayerKey>,
}

impl LayerNode {
	pub(crate) fn new(entry: LayerEntry, data: LayerData) -> Self {
		Self {
			record: entry.record,
			channels: entry.channels,
			parent: None,
			data,
			cache: LayerCache::default(),
			clip_layers: Vec::new(),
			clip_base: None,
		}
	}

	pub fn record(&self) -> &LayerRecord {
		&self.record
	}

	pub fn channels(&self) -> &[ChannelData] {
		&self.channels
	}

	pub fn channel(&self, id: ChannelId) -> Option<&ChannelData> {
		self.record.channel_info.iter().position(|info| info.id == id).and_then(|index| self.channels.get(index))
	}

	pub fn data(&self) -> &LayerData {
		&self.data
	}

	pub fn kind(&self) -> LayerKind {
		self.data.kind()
	}

	/// The parent group, or `None` for the document root and for detached layers.
	pub fn parent(&self) -> Option<LayerKey> {
		self.parent
	}

	pub fn is_group(&self) -> bool {
		self.data.as_group().is_some()
	}

	/// Children keys, bottom to top. Empty for non-group layers.
	pub fn children(&self) -> &[LayerKey] {
		self.data.as_group().map(GroupLayer::children).unwrap_or_default()
	}

	/// The full layer name, preferring the unicode name block over the legacy field.
	pub fn name(&self) -> &str {
		self.record.tagged_blocks.unicode_name().unwrap_or(&self.record.name)
	}

	pub fn layer_id(&self) -> Option<u32> {
		self.record.tagged_blocks.layer_id()
	}

	/// Local visibility, regardless of ancestors.
	pub fn visible(&self) -> bool {
		self.record.visible()
	}

	pub fn opacity(&self) -> u8 {
		self.record.opacity
	}

	pub fn fill_opacity(&self) -> u8 {
		self.record.tagged_blocks.fill_opacity().unwrap_or(255)
	}

	/// The blend mode the layer is composited with. Groups report the section divider's mode when present, which is where pass-through lives.
	pub fn blend_mode(&self) -> BlendMode {
		if self.is_group() {
			if let Some(blend_mode) = self.record.section_divider().and_then(|setting| setting.blend_mode) {
				return blend_mode;
			}
		}
		self.record.blend_mode
	}

	/// Whether the clipping flag is set. See [`LayerNode::clip_base`] for whether the layer is actually clipped onto something.
	pub fn clipping(&self) -> bool {
		self.record.clipping == Clipping::NonBase
	}

	pub fn clip_layers(&self) -> &[LayerKey] {
		&self.clip_layers
	}

	pub fn has_clip_layers(&self) -> bool {
		!self.clip_layers.is_empty()
	}

	pub fn clip_base(&self) -> Option<LayerKey> {
		self.clip_base
	}

	pub fn left(&self) -> i32 {
		self.record.left
	}

	pub fn top(&self) -> i32 {
		self.record.top
	}

	/// The stored right edge, which is zero for fill layers extending to the canvas. See [`Document::layer_rect`].
	///
	/// [`Document::layer_rect`]: crate::document::Document::layer_rect
	pub fn right(&self) -> i32 {
		self.record.right
	}

	/// The stored bottom edge, with the same fill layer caveat as [`Self::right`].
	pub fn bottom(&self) -> i32 {
		self.record.bottom
	}

	/// Width of the stored pixel data.
	pub fn width(&self) -> i32 {
		self.record.width()
	}

	/// Height of the stored pixel data.
	pub fn height(&self) -> i32 {
		self.record.height()
	}

	/// Whether the layer carries any non-empty color channel.
	pub fn has_pixels(&self) -> bool {
		self.record.width() > 0 && self.record.height() > 0 && self.record.channel_info.iter().zip(self.channels.iter()).any(|(info, channel)| info.id.is_color() && !channel.data.is_empty())
	}

	pub fn has_mask(&self) -> bool {
		self.record.mask_data.is_some()
	}

	pub fn has_vector_mask(&self) -> bool {
		self.record.tagged_blocks.contains_any(&Tag::VECTOR_MASKS)
	}

	pub fn has_stroke(&self) -> bool {
		self.record.tagged_blocks.contains(Tag::VectorStrokeData)
	}

	pub fn is_open_folder(&self) -> bool {
		self.record.section_divider().map(|setting| setting.kind == SectionDividerKind::OpenFolder).unwrap_or(false)
	}

	pub(crate) fn unicode_name_block(name: &str) -> BlockData {
		BlockData::UnicodeString(name.to_string())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::records::{ChannelInfo, Compression, SectionDividerSetting};

	fn record_with(tags: &[Tag]) -> LayerRecord {
		let mut record = LayerRecord::default();
		for &tag in tags {
			record.tagged_blocks.set(tag, BlockData::Raw(Vec::new()));
		}
		record
	}

	#[test]
	fn classification() {
		assert_eq!(LayerData::classify(&record_with(&[])).kind(), LayerKind::Pixel);
		assert_eq!(LayerData::classify(&record_with(&[Tag::TypeToolObjectSetting])).kind(), LayerKind::Type);
		assert_eq!(LayerData::classify(&record_with(&[Tag::PlacedLayerData])).kind(), LayerKind::SmartObject);
		assert_eq!(LayerData::classify(&record_with(&[Tag::SolidColorSheetSetting])).kind(), LayerKind::Fill);
		assert_eq!(LayerData::classify(&record_with(&[Tag::SolidColorSheetSetting, Tag::VectorMaskSetting2])).kind(), LayerKind::Shape);
		assert_eq!(LayerData::classify(&record_with(&[Tag::VectorMaskSetting1, Tag::VectorStrokeContentData])).kind(), LayerKind::Shape);
		assert_eq!(LayerData::classify(&record_with(&[Tag::VectorMaskSetting1])).kind(), LayerKind::Pixel);
		assert_eq!(LayerData::classify(&record_with(&[Tag::Adjustment(AdjustmentKind::Curves)])), LayerData::Adjustment(AdjustmentKind::Curves));
	}

	#[test]
	fn group_blend_mode_comes_from_divider() {
		let mut record = LayerRecord::default();
		record.tagged_blocks.set(
			Tag::SectionDividerSetting,
			BlockData::SectionDivider(SectionDividerSetting {
				kind: SectionDividerKind::OpenFolder,
				blend_mode: Some(BlendMode::PassThrough),
				sub_type: None,
			}),
		);
		let node = LayerNode::new(LayerEntry::new(record, Vec::new()), LayerData::Group(GroupLayer::default()));
		assert_eq!(node.blend_mode(), BlendMode::PassThrough);
		assert_eq!(node.record().blend_mode, BlendMode::Normal);
		assert!(node.is_open_folder());
	}

	#[test]
	fn pixels_require_area_and_payload() {
		let mut record = LayerRecord {
			right: 4,
			bottom: 4,
			..Default::default()
		};
		record.channel_info.push(ChannelInfo { id: ChannelId(0), length: 16 });
		let channel = ChannelData {
			compression: Compression::Raw,
			data: vec![0; 16],
		};
		let node = LayerNode::new(LayerEntry::new(record.clone(), vec![channel.clone()]), LayerData::Pixel);
		assert!(node.has_pixels());

		record.right = 0;
		let empty = LayerNode::new(LayerEntry::new(record, vec![channel]), LayerData::Pixel);
		assert!(!empty.has_pixels());
		assert_eq!(empty.width(), 0);
	}
}
