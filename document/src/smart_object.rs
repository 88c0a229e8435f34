//! Smart objects: layers placing embedded or external files, resolved against the document's linked layers.

use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::LayerKey;
use crate::records::{BlockData, Tag};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Payload of the placed layer blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacedLayerData {
	/// Identifier of the linked layer holding the placed file.
	pub unique_id: String,
	/// Corners of the placed content in canvas pixels: top-left, top-right, bottom-right, bottom-left.
	pub transform: [DVec2; 4],
	/// Resolution of the placed content in pixels per inch.
	pub resolution: Option<f64>,
	pub warp: serde_json::Value,
	/// Remaining descriptor fields, preserved as read.
	pub descriptor: serde_json::Value,
}

/// Where the bytes of a linked layer live.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkedLayerKind {
	/// Embedded in the document.
	#[default]
	Data,
	/// A file outside of the document, possibly with a cached copy of its bytes.
	External,
	Alias,
}

/// A file linked from the document's global linked layer section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedLayer {
	pub kind: LinkedLayerKind,
	pub unique_id: String,
	pub filename: String,
	/// Four character file type, such as `8BPS` or `png `.
	pub filetype: [u8; 4],
	pub data: Vec<u8>,
}

/// A smart object layer's placement together with the file it places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmartObject<'a> {
	placed: &'a PlacedLayerData,
	linked: Option<&'a LinkedLayer>,
}

impl<'a> SmartObject<'a> {
	pub fn unique_id(&self) -> &'a str {
		&self.placed.unique_id
	}

	pub fn placed(&self) -> &'a PlacedLayerData {
		self.placed
	}

	/// The linked layer entry. `None` when the document does not carry the file the layer refers to.
	pub fn linked_layer(&self) -> Option<&'a LinkedLayer> {
		self.linked
	}

	pub fn kind(&self) -> Option<LinkedLayerKind> {
		self.linked.map(|linked| linked.kind)
	}

	pub fn filename(&self) -> Option<&'a str> {
		self.linked.map(|linked| linked.filename.trim_end_matches('\0'))
	}

	/// The file type, trimmed and lowercased.
	pub fn filetype(&self) -> Option<String> {
		self.linked.map(|linked| String::from_utf8_lossy(&linked.filetype).trim().to_ascii_lowercase())
	}

	/// The embedded bytes. External links without a cached copy have none.
	pub fn data(&self) -> Option<&'a [u8]> {
		self.linked.map(|linked| linked.data.as_slice()).filter(|data| !data.is_empty())
	}

	pub fn filesize(&self) -> usize {
		self.data().map(<[u8]>::len).unwrap_or(0)
	}

	/// Whether the placed file is itself a layered document.
	pub fn is_document(&self) -> bool {
		matches!(self.filetype().as_deref(), Some("8bps" | "8bpb"))
	}

	pub fn transform(&self) -> [DVec2; 4] {
		self.placed.transform
	}

	pub fn warp(&self) -> &'a serde_json::Value {
		&self.placed.warp
	}
}

impl Document {
	/// Resolves the placed layer block of a smart object layer against the linked layers. `None` for other layers.
	pub fn smart_object(&self, key: LayerKey) -> Result<Option<SmartObject<'_>>, DocumentError> {
		let node = self.layer(key)?;
		let Some((_, BlockData::PlacedLayer(placed))) = node.record.tagged_blocks.get_any(&Tag::SMART_OBJECTS) else {
			return Ok(None);
		};
		let linked = self.linked_layers().iter().find(|linked| linked.unique_id == placed.unique_id);
		if linked.is_none() {
			log::debug!("Smart object \"{}\" refers to missing linked layer {}", node.name(), placed.unique_id);
		}
		Ok(Some(SmartObject { placed, linked }))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::layers::LayerKind;
	use crate::records::RecordStore;
	use crate::test_utils::*;
	use pretty_assertions::assert_eq;

	fn placed_entry(unique_id: &str) -> crate::records::LayerEntry {
		let mut entry = pixel_entry("placed", [0, 0, 2, 2]);
		entry.record.tagged_blocks.set(
			Tag::SmartObjectLayerData1,
			BlockData::PlacedLayer(PlacedLayerData {
				unique_id: unique_id.into(),
				transform: [DVec2::ZERO, DVec2::new(2., 0.), DVec2::new(2., 2.), DVec2::new(0., 2.)],
				..Default::default()
			}),
		);
		entry
	}

	#[test]
	fn placed_layers_resolve_their_file() {
		init_logger();
		let store = RecordStore {
			header: header(4, 4),
			layers: vec![placed_entry("abc"), placed_entry("missing")],
			linked_layers: vec![LinkedLayer {
				kind: LinkedLayerKind::Data,
				unique_id: "abc".into(),
				filename: "inner.psd\0".into(),
				filetype: *b"8BPS",
				data: vec![1, 2, 3],
			}],
		};
		let document = Document::from_store(store).unwrap();
		let [found, missing] = document.group_children(document.root()).unwrap() else { panic!("expected two layers") };
		assert_eq!(document.kind(*found).unwrap(), LayerKind::SmartObject);

		let smart_object = document.smart_object(*found).unwrap().unwrap();
		assert_eq!(smart_object.unique_id(), "abc");
		assert_eq!(smart_object.filename(), Some("inner.psd"));
		assert_eq!(smart_object.filetype().as_deref(), Some("8bps"));
		assert!(smart_object.is_document());
		assert_eq!(smart_object.filesize(), 3);
		assert_eq!(smart_object.transform()[2], DVec2::new(2., 2.));

		let dangling = document.smart_object(*missing).unwrap().unwrap();
		assert_eq!(dangling.linked_layer(), None);
		assert_eq!(dangling.data(), None);
		assert!(!dangling.is_document());
	}

	#[test]
	fn other_layers_have_no_smart_object() {
		let mut document = Document::new(4, 4, crate::records::ColorMode::Rgb);
		let layer = add_pixel_layer(&mut document, "layer", [0, 0, 1, 1]);
		assert_eq!(document.smart_object(layer).unwrap(), None);
	}
}
