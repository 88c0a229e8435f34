//! Raster (user) masks.

use crate::channels::ChannelDecoder;
use crate::document::Document;
use crate::error::DocumentError;
use crate::geometry::Rect;
use crate::layers::LayerKey;
use crate::records::{ChannelId, MaskData, MaskFlags};

use layered_raster::Image;

/// Resolved raster mask of a layer.
///
/// When the record carries "real" mask parameters with the parameters-applied flag, those describe the mask that is
/// actually in effect and take precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
	data: MaskData,
}

impl Mask {
	pub fn new(data: MaskData) -> Self {
		Self { data }
	}

	fn has_real(&self) -> bool {
		self.data.real_flags.is_some_and(|flags| flags.contains(MaskFlags::PARAMETERS)) && self.data.real_rect.is_some()
	}

	/// The mask rectangle in canvas pixels. The mask may be larger or smaller than its layer.
	pub fn rect(&self) -> Rect {
		if self.has_real() {
			if let Some(rect) = self.real_rect() {
				return rect;
			}
		}
		self.user_rect()
	}

	/// The rectangle of the plain user mask channel, regardless of real parameters.
	pub fn user_rect(&self) -> Rect {
		Rect::new(self.data.left, self.data.top, self.data.right, self.data.bottom)
	}

	pub fn bbox(&self) -> Rect {
		self.rect()
	}

	/// The real mask rectangle, stored as top, left, bottom, right.
	pub fn real_rect(&self) -> Option<Rect> {
		self.data.real_rect.map(|[top, left, bottom, right]| Rect::new(left, top, right, bottom))
	}

	/// Mask value outside of the mask rectangle, either 0 or 255.
	pub fn background_color(&self) -> u8 {
		if self.has_real() {
			if let Some(color) = self.data.real_background_color {
				return color;
			}
		}
		self.data.background_color
	}

	pub fn flags(&self) -> MaskFlags {
		if self.has_real() { self.data.real_flags.unwrap_or(self.data.flags) } else { self.data.flags }
	}

	pub fn disabled(&self) -> bool {
		self.data.flags.contains(MaskFlags::DISABLED)
	}

	pub fn inverted(&self) -> bool {
		self.flags().contains(MaskFlags::INVERT)
	}

	pub fn position_relative(&self) -> bool {
		self.flags().contains(MaskFlags::POSITION_RELATIVE)
	}

	/// The channel holding the mask pixels.
	pub fn channel_id(&self) -> ChannelId {
		if self.has_real() { ChannelId::REAL_USER_LAYER_MASK } else { ChannelId::USER_LAYER_MASK }
	}

	pub fn data(&self) -> &MaskData {
		&self.data
	}

	/// Mask coverage over `viewport`: the decoded pixels inside the mask rectangle and the background color outside,
	/// inverted when the mask says so.
	pub fn coverage(&self, pixels: Option<&Image<f32>>, viewport: Rect) -> Image<f32> {
		let rect = self.rect();
		let background = self.background_color() as f32 / 255.;
		let inverted = self.inverted();
		Image::from_fn(viewport.width(), viewport.height(), |x, y| {
			let (x, y) = (viewport.left + x as i32, viewport.top + y as i32);
			let value = match pixels {
				Some(pixels) => pixels.sample((x - rect.left) as i64, (y - rect.top) as i64, background),
				None => background,
			};
			if inverted { 1. - value } else { value }
		})
	}
}

impl Document {
	/// The layer's raster mask, if its record carries mask parameters.
	pub fn mask(&self, key: LayerKey) -> Result<Option<&Mask>, DocumentError> {
		let node = self.layer(key)?;
		let mask = node.cache.mask.get_or_init(|| node.record.mask_data.clone().map(Mask::new));
		Ok(mask.as_ref())
	}

	/// Decodes the mask pixels. Returns the mask rectangle along with them.
	pub fn mask_image(&self, key: LayerKey, decoder: &dyn ChannelDecoder) -> Result<Option<(Rect, Image<f32>)>, DocumentError> {
		let Some(mask) = self.mask(key)? else { return Ok(None) };
		let rect = mask.rect();
		Ok(self.channel_image(key, mask.channel_id(), decoder)?.map(|image| (rect, image)))
	}
}
