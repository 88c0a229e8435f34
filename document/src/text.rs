//! Type tool data of text layers. Text is read-only; the engine data is kept as the parsed descriptor tree.

use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::LayerKey;
use crate::records::{BlockData, Tag};

use glam::DAffine2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of the type tool object block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeToolData {
	/// Placement of the text in canvas pixels.
	pub transform: DAffine2,
	/// The raw text. Paragraphs are separated by carriage returns and the string may end with NULs.
	pub text: String,
	/// Styling and resource information, as the parsed engine data tree.
	pub engine_data: Value,
	pub warp: Value,
	/// Remaining text descriptor fields, preserved as read.
	pub descriptor: Value,
}

impl Default for TypeToolData {
	fn default() -> Self {
		Self {
			transform: DAffine2::IDENTITY,
			text: String::new(),
			engine_data: Value::Null,
			warp: Value::Null,
			descriptor: Value::Null,
		}
	}
}

/// How a text layer lays out its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextType {
	/// Point (character) type, growing from an anchor.
	Point,
	/// Paragraph (area) type, flowing inside a box.
	Paragraph,
}

/// Why a text type could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextGeometry {
	NoShapes,
	ManyShapes(usize),
	UnknownShapeType,
}

impl TypeToolData {
	pub fn text(&self) -> &str {
		self.text.trim_end_matches('\0')
	}

	pub fn engine_dict(&self) -> Option<&Value> {
		self.engine_data.get("EngineDict")
	}

	pub fn resource_dict(&self) -> Option<&Value> {
		self.engine_data.get("ResourceDict")
	}

	pub fn document_resources(&self) -> Option<&Value> {
		self.engine_data.get("DocumentResources")
	}

	/// Reads the text type from the single rendered shape of the engine data.
	pub fn text_type(&self) -> Result<TextType, TextGeometry> {
		let shapes = self
			.engine_dict()
			.and_then(|dict| dict.pointer("/Rendered/Shapes/Children"))
			.and_then(Value::as_array)
			.map(Vec::as_slice)
			.unwrap_or_default();
		match shapes {
			[] => Err(TextGeometry::NoShapes),
			[shape] => match shape.pointer("/Cookie/Photoshop/ShapeType").and_then(Value::as_i64) {
				Some(0) => Ok(TextType::Point),
				Some(1) => Ok(TextType::Paragraph),
				_ => Err(TextGeometry::UnknownShapeType),
			},
			shapes => Err(TextGeometry::ManyShapes(shapes.len())),
		}
	}
}

impl Document {
	/// The type tool data of a text layer, or `None` for other layers.
	pub fn type_tool(&self, key: LayerKey) -> Result<Option<&TypeToolData>, DocumentError> {
		Ok(match self.layer(key)?.record.tagged_blocks.get(Tag::TypeToolObjectSetting) {
			Some(BlockData::TypeTool(data)) => Some(data),
			_ => None,
		})
	}

	/// The layer's text without trailing NULs.
	pub fn text(&self, key: LayerKey) -> Result<Option<&str>, DocumentError> {
		Ok(self.type_tool(key)?.map(TypeToolData::text))
	}

	/// Point or paragraph type. `None` when the engine data does not tell, which is logged as a warning.
	pub fn text_type(&self, key: LayerKey) -> Result<Option<TextType>, DocumentError> {
		let Some(data) = self.type_tool(key)? else { return Ok(None) };
		let name = self.layer(key)?.name();
		Ok(match data.text_type() {
			Ok(text_type) => Some(text_type),
			Err(TextGeometry::NoShapes) => {
				log::warn!("Cannot determine the text type of \"{name}\": the engine data has no rendered shapes");
				None
			}
			Err(TextGeometry::ManyShapes(count)) => {
				log::warn!("Cannot determine the text type of \"{name}\": the engine data has {count} rendered shapes");
				None
			}
			Err(TextGeometry::UnknownShapeType) => {
				log::warn!("Cannot determine the text type of \"{name}\": the rendered shape has no known shape type");
				None
			}
		})
	}

	pub fn text_transform(&self, key: LayerKey) -> Result<Option<DAffine2>, DocumentError> {
		Ok(self.type_tool(key)?.map(|data| data.transform))
	}

	pub fn warp(&self, key: LayerKey) -> Result<Option<&Value>, DocumentError> {
		Ok(self.type_tool(key)?.map(|data| &data.warp))
	}
}
