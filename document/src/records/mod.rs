//! The parsed form of a layered document file, as handed over by (and back to) the binary codec.
//!
//! Nothing here reads or writes bytes. Records are plain data that the layer tree owns and writes
//! back into when it is mutated.

mod tagged_blocks;

pub use tagged_blocks::*;

use crate::smart_object::LinkedLayer;

use bitflags::bitflags;
use layered_raster::BlendMode;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Color modes a document header can declare.
#[repr(u16)]
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
pub enum ColorMode {
	Bitmap = 0,
	Grayscale = 1,
	Indexed = 2,
	#[default]
	Rgb = 3,
	Cmyk = 4,
	Multichannel = 7,
	Duotone = 8,
	Lab = 9,
}

impl ColorMode {
	/// Number of color channels (excluding transparency) a layer carries in this mode.
	pub fn channel_count(&self) -> usize {
		match self {
			ColorMode::Bitmap | ColorMode::Grayscale | ColorMode::Indexed | ColorMode::Duotone => 1,
			ColorMode::Rgb | ColorMode::Lab => 3,
			ColorMode::Cmyk => 4,
			ColorMode::Multichannel => 1,
		}
	}
}

/// Compression used for a channel's payload.
#[repr(u16)]
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
pub enum Compression {
	#[default]
	Raw = 0,
	Rle = 1,
	Zip = 2,
	ZipWithPrediction = 3,
}

/// Whether a layer is clipped onto the layer below it.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
pub enum Clipping {
	#[default]
	Base = 0,
	NonBase = 1,
}

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
	#[repr(transparent)]
	pub struct LayerFlags: u8 {
		const TRANSPARENCY_PROTECTED = 0b0000_0001;
		const HIDDEN                 = 0b0000_0010;
		const OBSOLETE               = 0b0000_0100;
		const PHOTOSHOP_5            = 0b0000_1000;
		const PIXEL_DATA_IRRELEVANT  = 0b0001_0000;
	}
}

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
	#[repr(transparent)]
	pub struct MaskFlags: u8 {
		const POSITION_RELATIVE = 0b0000_0001;
		const DISABLED          = 0b0000_0010;
		const INVERT            = 0b0000_0100;
		const FROM_RENDER       = 0b0000_1000;
		const PARAMETERS        = 0b0001_0000;
	}
}

/// Channel identifier. Non-negative values index color channels, negative values are the special channels below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub i16);

impl ChannelId {
	pub const TRANSPARENCY_MASK: ChannelId = ChannelId(-1);
	pub const USER_LAYER_MASK: ChannelId = ChannelId(-2);
	pub const REAL_USER_LAYER_MASK: ChannelId = ChannelId(-3);

	pub fn is_color(&self) -> bool {
		self.0 >= 0
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
	pub id: ChannelId,
	/// Length of the channel payload in the file, including its compression header.
	pub length: u32,
}

/// A channel payload, still in its stored compression.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelData {
	pub compression: Compression,
	pub data: Vec<u8>,
}

impl core::fmt::Debug for ChannelData {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("ChannelData").field("compression", &self.compression).field("data", &self.data.len()).finish()
	}
}

/// Parameters of a layer's raster mask.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskData {
	pub top: i32,
	pub left: i32,
	pub bottom: i32,
	pub right: i32,
	/// Mask value outside of the mask rectangle, either 0 or 255.
	pub background_color: u8,
	pub flags: MaskFlags,
	/// The "real" user mask rectangle, present when both a pixel mask and a vector mask exist.
	pub real_rect: Option<[i32; 4]>,
	pub real_background_color: Option<u8>,
	pub real_flags: Option<MaskFlags>,
}

/// One layer record of the layer and mask section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
	pub top: i32,
	pub left: i32,
	pub bottom: i32,
	pub right: i32,
	pub channel_info: Vec<ChannelInfo>,
	pub blend_mode: BlendMode,
	pub opacity: u8,
	pub clipping: Clipping,
	pub flags: LayerFlags,
	pub mask_data: Option<MaskData>,
	/// Blending ranges are not interpreted and are written back as read.
	pub blending_ranges: Vec<u8>,
	/// Legacy single-byte name. The full name lives in the unicode name block.
	pub name: String,
	pub tagged_blocks: TaggedBlocks,
}

impl Default for LayerRecord {
	fn default() -> Self {
		Self {
			top: 0,
			left: 0,
			bottom: 0,
			right: 0,
			channel_info: Vec::new(),
			blend_mode: BlendMode::Normal,
			opacity: 255,
			clipping: Clipping::Base,
			flags: LayerFlags::empty(),
			mask_data: None,
			blending_ranges: Vec::new(),
			name: String::new(),
			tagged_blocks: TaggedBlocks::default(),
		}
	}
}

impl LayerRecord {
	pub fn width(&self) -> i32 {
		(self.right - self.left).max(0)
	}

	pub fn height(&self) -> i32 {
		(self.bottom - self.top).max(0)
	}

	pub fn visible(&self) -> bool {
		!self.flags.contains(LayerFlags::HIDDEN)
	}

	/// The section divider kind carried in the tagged blocks, if any.
	pub fn section_divider(&self) -> Option<&SectionDividerSetting> {
		self.tagged_blocks.section_divider()
	}
}

/// A record paired with its channel payloads, aligned with `record.channel_info`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerEntry {
	pub record: LayerRecord,
	pub channels: Vec<ChannelData>,
}

impl LayerEntry {
	pub fn new(record: LayerRecord, channels: Vec<ChannelData>) -> Self {
		Self { record, channels }
	}

	/// Looks up the payload of a channel by identifier.
	pub fn channel(&self, id: ChannelId) -> Option<&ChannelData> {
		self.record.channel_info.iter().position(|info| info.id == id).and_then(|index| self.channels.get(index))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
	pub width: u32,
	pub height: u32,
	/// Bits per channel: 1, 8, 16 or 32.
	pub depth: u16,
	pub color_mode: ColorMode,
}

impl Default for FileHeader {
	fn default() -> Self {
		Self {
			width: 0,
			height: 0,
			depth: 8,
			color_mode: ColorMode::Rgb,
		}
	}
}

/// Everything the tree model needs from a parsed file. Layer entries are in file order, bottom to top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
	pub header: FileHeader,
	pub layers: Vec<LayerEntry>,
	pub linked_layers: Vec<LinkedLayer>,
}
