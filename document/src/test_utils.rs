use crate::document::{Document, GROUP_DIVIDER_NAME};
use crate::layers::LayerKey;
use crate::records::*;

pub fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

pub fn header(width: u32, height: u32) -> FileHeader {
	FileHeader {
		width,
		height,
		depth: 8,
		color_mode: ColorMode::Rgb,
	}
}

fn named_record(name: &str) -> LayerRecord {
	let mut record = LayerRecord {
		name: name.to_string(),
		..Default::default()
	};
	record.tagged_blocks.set(Tag::UnicodeLayerName, BlockData::UnicodeString(name.to_string()));
	record
}

/// An 8-bit RGB record covering `[left, top, right, bottom]`, filled with opaque mid gray.
pub fn pixel_entry(name: &str, [left, top, right, bottom]: [i32; 4]) -> LayerEntry {
	let mut record = named_record(name);
	(record.left, record.top, record.right, record.bottom) = (left, top, right, bottom);

	let area = record.width() as usize * record.height() as usize;
	let mut channels = Vec::new();
	for (id, value) in [(ChannelId::TRANSPARENCY_MASK, 255), (ChannelId(0), 128), (ChannelId(1), 128), (ChannelId(2), 128)] {
		record.channel_info.push(ChannelInfo { id, length: area as u32 + 2 });
		channels.push(ChannelData {
			compression: Compression::Raw,
			data: vec![value; area],
		});
	}
	LayerEntry::new(record, channels)
}

/// The hidden record that opens a group in file order.
pub fn divider_entry() -> LayerEntry {
	let mut record = named_record(GROUP_DIVIDER_NAME);
	record.tagged_blocks.set(
		Tag::SectionDividerSetting,
		BlockData::SectionDivider(SectionDividerSetting {
			kind: SectionDividerKind::BoundingSectionDivider,
			..Default::default()
		}),
	);
	LayerEntry::new(record, Vec::new())
}

/// The folder record that closes a group in file order.
pub fn group_entry(name: &str, kind: SectionDividerKind) -> LayerEntry {
	let mut record = named_record(name);
	record.tagged_blocks.set(Tag::SectionDividerSetting, BlockData::SectionDivider(SectionDividerSetting { kind, ..Default::default() }));
	LayerEntry::new(record, Vec::new())
}

/// Adds a gray pixel layer on top of the document.
pub fn add_pixel_layer(document: &mut Document, name: &str, rect: [i32; 4]) -> LayerKey {
	let key = document.new_layer(pixel_entry(name, rect));
	document.add_layer(document.root(), key).unwrap()
}

/// Adds a pixel layer of a single color on top of the document.
pub fn add_filled_layer(document: &mut Document, name: &str, [left, top, right, bottom]: [i32; 4], color: [u8; 4]) -> LayerKey {
	let image = ::image::RgbaImage::from_pixel((right - left) as u32, (bottom - top) as u32, ::image::Rgba(color));
	let key = document.new_pixel_layer(&image, name, top, left).unwrap();
	document.add_layer(document.root(), key).unwrap()
}
