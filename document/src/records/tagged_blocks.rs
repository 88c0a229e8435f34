use crate::adjustment::AdjustmentKind;
use crate::effects::EffectsData;
use crate::origination::OriginationData;
use crate::smart_object::PlacedLayerData;
use crate::text::TypeToolData;
use crate::vector::{VectorMaskSetting, VectorStrokeData};

use layered_raster::{BlendMode, Color};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Keys of the additional layer information blocks the tree model interprets. Every other key is kept as [`Tag::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
	UnicodeLayerName,
	LayerId,
	SectionDividerSetting,
	NestedSectionDividerSetting,
	BlendFillOpacity,
	VectorMaskSetting1,
	VectorMaskSetting2,
	VectorOriginationData,
	VectorStrokeData,
	VectorStrokeContentData,
	ObjectBasedEffectsLayerInfo,
	ObjectBasedEffectsLayerInfoV0,
	ObjectBasedEffectsLayerInfoV1,
	ArtboardData1,
	ArtboardData2,
	ArtboardData3,
	TypeToolObjectSetting,
	PlacedLayerData,
	SmartObjectLayerData1,
	SmartObjectLayerData2,
	SolidColorSheetSetting,
	GradientFillSetting,
	PatternFillSetting,
	Adjustment(AdjustmentKind),
	Other([u8; 4]),
}

impl Tag {
	pub const VECTOR_MASKS: [Tag; 2] = [Tag::VectorMaskSetting1, Tag::VectorMaskSetting2];
	pub const EFFECTS: [Tag; 3] = [Tag::ObjectBasedEffectsLayerInfo, Tag::ObjectBasedEffectsLayerInfoV0, Tag::ObjectBasedEffectsLayerInfoV1];
	pub const ARTBOARDS: [Tag; 3] = [Tag::ArtboardData1, Tag::ArtboardData2, Tag::ArtboardData3];
	pub const SMART_OBJECTS: [Tag; 3] = [Tag::PlacedLayerData, Tag::SmartObjectLayerData1, Tag::SmartObjectLayerData2];
	pub const FILLS: [Tag; 3] = [Tag::SolidColorSheetSetting, Tag::GradientFillSetting, Tag::PatternFillSetting];

	pub fn from_key(key: [u8; 4]) -> Tag {
		match &key {
			b"luni" => Tag::UnicodeLayerName,
			b"lyid" => Tag::LayerId,
			b"lsct" => Tag::SectionDividerSetting,
			b"lsdk" => Tag::NestedSectionDividerSetting,
			b"iOpa" => Tag::BlendFillOpacity,
			b"vmsk" => Tag::VectorMaskSetting1,
			b"vsms" => Tag::VectorMaskSetting2,
			b"vogk" => Tag::VectorOriginationData,
			b"vstk" => Tag::VectorStrokeData,
			b"vscg" => Tag::VectorStrokeContentData,
			b"lfx2" => Tag::ObjectBasedEffectsLayerInfo,
			b"lmfx" => Tag::ObjectBasedEffectsLayerInfoV0,
			b"lfxs" => Tag::ObjectBasedEffectsLayerInfoV1,
			b"artb" => Tag::ArtboardData1,
			b"artd" => Tag::ArtboardData2,
			b"abdd" => Tag::ArtboardData3,
			b"TySh" => Tag::TypeToolObjectSetting,
			b"PlLd" => Tag::PlacedLayerData,
			b"SoLd" => Tag::SmartObjectLayerData1,
			b"SoLE" => Tag::SmartObjectLayerData2,
			b"SoCo" => Tag::SolidColorSheetSetting,
			b"GdFl" => Tag::GradientFillSetting,
			b"PtFl" => Tag::PatternFillSetting,
			other => match AdjustmentKind::from_key(other) {
				Some(kind) => Tag::Adjustment(kind),
				None => Tag::Other(key),
			},
		}
	}

	pub fn key(&self) -> [u8; 4] {
		*match self {
			Tag::UnicodeLayerName => b"luni",
			Tag::LayerId => b"lyid",
			Tag::SectionDividerSetting => b"lsct",
			Tag::NestedSectionDividerSetting => b"lsdk",
			Tag::BlendFillOpacity => b"iOpa",
			Tag::VectorMaskSetting1 => b"vmsk",
			Tag::VectorMaskSetting2 => b"vsms",
			Tag::VectorOriginationData => b"vogk",
			Tag::VectorStrokeData => b"vstk",
			Tag::VectorStrokeContentData => b"vscg",
			Tag::ObjectBasedEffectsLayerInfo => b"lfx2",
			Tag::ObjectBasedEffectsLayerInfoV0 => b"lmfx",
			Tag::ObjectBasedEffectsLayerInfoV1 => b"lfxs",
			Tag::ArtboardData1 => b"artb",
			Tag::ArtboardData2 => b"artd",
			Tag::ArtboardData3 => b"abdd",
			Tag::TypeToolObjectSetting => b"TySh",
			Tag::PlacedLayerData => b"PlLd",
			Tag::SmartObjectLayerData1 => b"SoLd",
			Tag::SmartObjectLayerData2 => b"SoLE",
			Tag::SolidColorSheetSetting => b"SoCo",
			Tag::GradientFillSetting => b"GdFl",
			Tag::PatternFillSetting => b"PtFl",
			Tag::Adjustment(kind) => kind.key(),
			Tag::Other(key) => key,
		}
	}
}

/// Kind of a section divider record.
#[repr(u32)]
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
pub enum SectionDividerKind {
	#[default]
	Other = 0,
	OpenFolder = 1,
	ClosedFolder = 2,
	/// The hidden record marking the bottom end of a group.
	BoundingSectionDivider = 3,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDividerSetting {
	pub kind: SectionDividerKind,
	/// Overrides the record's blend mode. This is where a group's pass-through mode is stored.
	pub blend_mode: Option<BlendMode>,
	pub sub_type: Option<u32>,
}

impl SectionDividerSetting {
	pub fn is_group_start(&self) -> bool {
		matches!(self.kind, SectionDividerKind::OpenFolder | SectionDividerKind::ClosedFolder)
	}
}

/// Artboard descriptor. The rectangle is stored in canvas pixels as left, top, right, bottom.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtboardData {
	pub rect: Option<kurbo::Rect>,
	pub background_color: Option<Color>,
	/// Remaining descriptor fields, preserved as read.
	pub descriptor: serde_json::Value,
}

/// Payload of a tagged block. Blocks without a typed form keep their bytes or descriptor unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockData {
	UnicodeString(String),
	Integer(i64),
	SectionDivider(SectionDividerSetting),
	VectorMask(VectorMaskSetting),
	VectorOrigination(OriginationData),
	VectorStroke(VectorStrokeData),
	Effects(EffectsData),
	Artboard(ArtboardData),
	TypeTool(TypeToolData),
	PlacedLayer(PlacedLayerData),
	SolidColor(Color),
	Descriptor(serde_json::Value),
	Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedBlock {
	pub tag: Tag,
	pub data: BlockData,
}

/// Ordered tagged block map. Insertion order is kept so blocks are written back in the order they were read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedBlocks {
	blocks: Vec<TaggedBlock>,
}

impl TaggedBlocks {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, tag: Tag) -> Option<&BlockData> {
		self.blocks.iter().find(|block| block.tag == tag).map(|block| &block.data)
	}

	pub fn get_mut(&mut self, tag: Tag) -> Option<&mut BlockData> {
		self.blocks.iter_mut().find(|block| block.tag == tag).map(|block| &mut block.data)
	}

	pub fn get_or<'a>(&'a self, tag: Tag, default: &'a BlockData) -> &'a BlockData {
		self.get(tag).unwrap_or(default)
	}

	/// Returns the first of `tags` present, together with its payload.
	pub fn get_any(&self, tags: &[Tag]) -> Option<(Tag, &BlockData)> {
		tags.iter().find_map(|&tag| self.get(tag).map(|data| (tag, data)))
	}

	/// Replaces the block in place if present, otherwise appends it.
	pub fn set(&mut self, tag: Tag, data: BlockData) {
		match self.get_mut(tag) {
			Some(existing) => *existing = data,
			None => self.blocks.push(TaggedBlock { tag, data }),
		}
	}

	pub fn contains(&self, tag: Tag) -> bool {
		self.blocks.iter().any(|block| block.tag == tag)
	}

	pub fn contains_any(&self, tags: &[Tag]) -> bool {
		tags.iter().any(|&tag| self.contains(tag))
	}

	pub fn remove(&mut self, tag: Tag) -> Option<BlockData> {
		let index = self.blocks.iter().position(|block| block.tag == tag)?;
		Some(self.blocks.remove(index).data)
	}

	pub fn iter(&self) -> impl Iterator<Item = &TaggedBlock> {
		self.blocks.iter()
	}

	pub fn len(&self) -> usize {
		self.blocks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.blocks.is_empty()
	}

	pub fn unicode_name(&self) -> Option<&str> {
		match self.get(Tag::UnicodeLayerName)? {
			BlockData::UnicodeString(name) => Some(name),
			_ => None,
		}
	}

	pub fn layer_id(&self) -> Option<u32> {
		match self.get(Tag::LayerId)? {
			BlockData::Integer(id) => u32::try_from(*id).ok(),
			_ => None,
		}
	}

	pub fn section_divider(&self) -> Option<&SectionDividerSetting> {
		match self.get_any(&[Tag::SectionDividerSetting, Tag::NestedSectionDividerSetting])?.1 {
			BlockData::SectionDivider(setting) => Some(setting),
			_ => None,
		}
	}

	pub fn section_divider_mut(&mut self) -> Option<&mut SectionDividerSetting> {
		let tag = if self.contains(Tag::SectionDividerSetting) { Tag::SectionDividerSetting } else { Tag::NestedSectionDividerSetting };
		match self.get_mut(tag)? {
			BlockData::SectionDivider(setting) => Some(setting),
			_ => None,
		}
	}

	pub fn fill_opacity(&self) -> Option<u8> {
		match self.get(Tag::BlendFillOpacity)? {
			BlockData::Integer(opacity) => Some((*opacity).clamp(0, 255) as u8),
			_ => None,
		}
	}

	pub fn artboard(&self) -> Option<&ArtboardData> {
		match self.get_any(&Tag::ARTBOARDS)?.1 {
			BlockData::Artboard(artboard) => Some(artboard),
			_ => None,
		}
	}
}

impl FromIterator<(Tag, BlockData)> for TaggedBlocks {
	fn from_iter<T: IntoIterator<Item = (Tag, BlockData)>>(iter: T) -> Self {
		let mut blocks = TaggedBlocks::new();
		for (tag, data) in iter {
			blocks.set(tag, data);
		}
		blocks
	}
}
