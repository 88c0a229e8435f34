//! Pixel access: decoding channel payloads into images and writing images back as channels.

use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::{LayerData, LayerKey};
use crate::records::{ChannelData, ChannelId, ChannelInfo, ColorMode, Compression, LayerEntry};

use layered_raster::{Color, Image};

/// Bytes preceding every channel payload in a file: the compression code.
const COMPRESSION_HEADER_LENGTH: u32 = 2;

/// Turns a stored channel payload into uncompressed big-endian samples.
///
/// Decompression lives outside of this crate; implement this trait over the codec in use.
pub trait ChannelDecoder {
	/// Returns exactly `width * height` samples of `depth` bits each, rows padded to whole bytes.
	fn decode(&self, channel: &ChannelData, width: u32, height: u32, depth: u16) -> Result<Vec<u8>, DocumentError>;
}

/// Decoder for uncompressed payloads only. Any other compression fails with [`DocumentError::UnsupportedCompression`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RawChannelDecoder;

impl ChannelDecoder for RawChannelDecoder {
	fn decode(&self, channel: &ChannelData, width: u32, height: u32, depth: u16) -> Result<Vec<u8>, DocumentError> {
		if channel.compression != Compression::Raw {
			return Err(DocumentError::UnsupportedCompression(channel.compression));
		}
		let expected = plane_length(width, height, depth);
		if channel.data.len() != expected {
			return Err(DocumentError::ChannelLength {
				expected,
				actual: channel.data.len(),
			});
		}
		Ok(channel.data.clone())
	}
}

fn plane_length(width: u32, height: u32, depth: u16) -> usize {
	let row = (width as usize * depth as usize).div_ceil(8);
	row * height as usize
}

/// Converts uncompressed big-endian samples into values from 0 to 1.
pub fn decode_plane(bytes: &[u8], width: u32, height: u32, depth: u16) -> Result<Image<f32>, DocumentError> {
	let expected = plane_length(width, height, depth);
	if bytes.len() != expected {
		return Err(DocumentError::ChannelLength { expected, actual: bytes.len() });
	}

	let data = match depth {
		1 => {
			// One bit per pixel with rows padded to whole bytes, and a set bit means black
			let row = (width as usize).div_ceil(8);
			(0..height as usize)
				.flat_map(|y| (0..width as usize).map(move |x| (x, y)))
				.map(|(x, y)| if bytes[y * row + x / 8] & (0x80 >> (x % 8)) != 0 { 0. } else { 1. })
				.collect()
		}
		8 => bytes.iter().map(|&value| value as f32 / 255.).collect(),
		16 => bytes.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as f32 / 65535.).collect(),
		32 => bytes.chunks_exact(4).map(|quad| f32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]])).collect(),
		other => return Err(DocumentError::UnsupportedDepth(other)),
	};
	Ok(Image { width, height, data })
}

/// Converts values from 0 to 1 into uncompressed big-endian samples.
pub fn encode_plane(plane: &Image<f32>, depth: u16) -> Result<Vec<u8>, DocumentError> {
	let bytes = match depth {
		8 => plane.data.iter().map(|&value| (value.clamp(0., 1.) * 255.).round() as u8).collect(),
		16 => plane.data.iter().flat_map(|&value| ((value.clamp(0., 1.) * 65535.).round() as u16).to_be_bytes()).collect(),
		32 => plane.data.iter().flat_map(|&value| value.to_be_bytes()).collect(),
		other => return Err(DocumentError::UnsupportedDepth(other)),
	};
	Ok(bytes)
}

impl Document {
	/// Decodes one channel of a layer. Mask channels use the mask rectangle, everything else the layer rectangle.
	pub fn channel_image(&self, key: LayerKey, id: ChannelId, decoder: &dyn ChannelDecoder) -> Result<Option<Image<f32>>, DocumentError> {
		let node = self.layer(key)?;
		let Some(channel) = node.channel(id) else { return Ok(None) };

		let (width, height) = match id {
			ChannelId::USER_LAYER_MASK | ChannelId::REAL_USER_LAYER_MASK => match self.mask(key)? {
				Some(mask) => {
					let rect = if id == ChannelId::REAL_USER_LAYER_MASK { mask.real_rect().unwrap_or(mask.user_rect()) } else { mask.user_rect() };
					(rect.width(), rect.height())
				}
				None => return Ok(None),
			},
			_ => (node.width() as u32, node.height() as u32),
		};
		if width == 0 || height == 0 {
			return Ok(None);
		}

		let bytes = decoder.decode(channel, width, height, self.depth())?;
		decode_plane(&bytes, width, height, self.depth()).map(Some)
	}

	/// Decodes the color and transparency channels of a layer into an image covering the layer rectangle.
	///
	/// Returns `None` for layers without pixels. Only grayscale and RGB documents can be decoded.
	pub fn layer_image(&self, key: LayerKey, decoder: &dyn ChannelDecoder) -> Result<Option<Image<Color>>, DocumentError> {
		let node = self.layer(key)?;
		if !node.has_pixels() {
			return Ok(None);
		}

		let color_mode = self.color_mode();
		let color_channels = match color_mode {
			ColorMode::Grayscale => 1,
			ColorMode::Rgb => 3,
			other => return Err(DocumentError::UnsupportedColorMode(other)),
		};
		let (width, height) = (node.width() as u32, node.height() as u32);

		let mut planes = Vec::with_capacity(color_channels);
		for index in 0..color_channels as i16 {
			planes.push(self.channel_image(key, ChannelId(index), decoder)?);
		}
		let alpha = self.channel_image(key, ChannelId::TRANSPARENCY_MASK, decoder)?;

		let sample = |plane: &Option<Image<f32>>, index: usize, missing: f32| plane.as_ref().and_then(|plane| plane.data.get(index).copied()).unwrap_or(missing);
		let data = (0..width as usize * height as usize)
			.map(|index| {
				let alpha = sample(&alpha, index, 1.);
				match color_mode {
					ColorMode::Grayscale => Color::from_gray(sample(&planes[0], index, 0.), alpha),
					_ => Color::from_rgbaf32_unchecked(sample(&planes[0], index, 0.), sample(&planes[1], index, 0.), sample(&planes[2], index, 0.), alpha),
				}
			})
			.collect();
		Ok(Some(Image { width, height, data }))
	}

	/// Wraps an image as a new detached pixel layer with its top-left corner at `(left, top)`.
	pub fn new_pixel_layer(&mut self, image: &::image::RgbaImage, name: &str, top: i32, left: i32) -> Result<LayerKey, DocumentError> {
		let mut entry = LayerEntry::default();
		entry.record.name = name.to_string();
		let key = self.new_layer(entry);
		let result = self.set_name(key, name).and_then(|_| self.write_pixels(key, image, top, left));
		if let Err(error) = result {
			self.layers.remove(key);
			return Err(error);
		}
		Ok(key)
	}

	/// Swaps the pixels of a layer, resizing its rectangle around the current top-left corner.
	pub fn replace_pixels(&mut self, key: LayerKey, image: &::image::RgbaImage) -> Result<(), DocumentError> {
		let node = self.layer(key)?;
		if node.is_group() {
			return Err(DocumentError::GroupHasNoPixels(key));
		}
		let (top, left) = (node.top(), node.left());
		self.write_pixels(key, image, top, left)
	}

	fn write_pixels(&mut self, key: LayerKey, image: &::image::RgbaImage, top: i32, left: i32) -> Result<(), DocumentError> {
		let color_mode = self.color_mode();
		let depth = self.depth();
		let image = Image::from_rgba_image(image);

		let mut planes = match color_mode {
			ColorMode::Grayscale => vec![(ChannelId(0), image.map(|color| color.luminosity()))],
			ColorMode::Rgb => vec![(ChannelId(0), image.map(|color| color.r())), (ChannelId(1), image.map(|color| color.g())), (ChannelId(2), image.map(|color| color.b()))],
			other => return Err(DocumentError::UnsupportedColorMode(other)),
		};
		planes.push((ChannelId::TRANSPARENCY_MASK, image.alpha()));

		let mut channel_info = Vec::with_capacity(planes.len());
		let mut channels = Vec::with_capacity(planes.len());
		for (id, plane) in planes {
			let data = encode_plane(&plane, depth)?;
			channel_info.push(ChannelInfo {
				id,
				length: data.len() as u32 + COMPRESSION_HEADER_LENGTH,
			});
			channels.push(ChannelData { compression: Compression::Raw, data });
		}

		let node = self.layer_mut(key)?;
		// Mask channels stay as they are
		let masks = node.record.channel_info.iter().cloned().zip(node.channels.iter().cloned()).filter(|(info, _)| info.id.0 < ChannelId::TRANSPARENCY_MASK.0).collect::<Vec<_>>();
		for (info, channel) in masks {
			channel_info.push(info);
			channels.push(channel);
		}

		node.record.top = top;
		node.record.left = left;
		node.record.bottom = top + image.height as i32;
		node.record.right = left + image.width as i32;
		node.record.channel_info = channel_info;
		node.channels = channels;
		if matches!(node.data, LayerData::Shape) {
			log::debug!("Shape layer \"{}\" now carries pixels, which take precedence over its vector geometry", node.name());
		}
		self.invalidate_bbox(key);
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::records::{FileHeader, MaskData};
	use crate::test_utils::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn planes_decode_per_depth() {
		assert_eq!(decode_plane(&[0, 255], 2, 1, 8).unwrap().data, vec![0., 1.]);
		assert_eq!(decode_plane(&[0xff, 0xff, 0, 0], 1, 2, 16).unwrap().data, vec![1., 0.]);
		assert_eq!(decode_plane(&0.25_f32.to_be_bytes(), 1, 1, 32).unwrap().data, vec![0.25]);
		assert_eq!(decode_plane(&[0b0100_0000], 3, 1, 1).unwrap().data, vec![1., 0., 1.]);
		assert_eq!(decode_plane(&[0], 1, 1, 7), Err(DocumentError::UnsupportedDepth(7)));
		assert_eq!(decode_plane(&[0, 1], 1, 1, 8), Err(DocumentError::ChannelLength { expected: 1, actual: 2 }));
	}

	#[test]
	fn raw_decoder_rejects_compressed_payloads() {
		let channel = ChannelData {
			compression: Compression::Rle,
			data: vec![0; 4],
		};
		assert_eq!(RawChannelDecoder.decode(&channel, 2, 2, 8), Err(DocumentError::UnsupportedCompression(Compression::Rle)));
	}

	#[test]
	fn pixel_layers_roundtrip_through_channels() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		let image = ::image::RgbaImage::from_fn(3, 2, |x, y| ::image::Rgba([x as u8 * 100, y as u8 * 200, 7, 255 - x as u8]));
		let layer = document.new_pixel_layer(&image, "pasted", 1, 2).unwrap();

		let node = document.layer(layer).unwrap();
		assert_eq!((node.left(), node.top(), node.right(), node.bottom()), (2, 1, 5, 3));
		assert_eq!(node.record().channel_info.iter().map(|info| info.id).collect::<Vec<_>>(), vec![ChannelId(0), ChannelId(1), ChannelId(2), ChannelId::TRANSPARENCY_MASK]);
		assert_eq!(node.record().channel_info[0].length, 8);
		assert!(node.has_pixels());
		assert_eq!(node.parent(), None);

		let decoded = document.layer_image(layer, &RawChannelDecoder).unwrap().unwrap();
		assert_eq!(decoded.to_rgba_image(), image);

		let smaller = ::image::RgbaImage::from_pixel(1, 1, ::image::Rgba([1, 2, 3, 4]));
		document.replace_pixels(layer, &smaller).unwrap();
		assert_eq!(document.layer(layer).unwrap().width(), 1);
		assert_eq!(document.layer_image(layer, &RawChannelDecoder).unwrap().unwrap().to_rgba_image(), smaller);
	}

	#[test]
	fn sixteen_bit_grayscale() {
		let header = FileHeader {
			width: 2,
			height: 1,
			depth: 16,
			color_mode: ColorMode::Grayscale,
		};
		let mut document = Document::from_store(crate::records::RecordStore { header, ..Default::default() }).unwrap();
		let image = ::image::RgbaImage::from_pixel(2, 1, ::image::Rgba([255, 255, 255, 255]));
		let layer = document.new_pixel_layer(&image, "gray", 0, 0).unwrap();
		assert_eq!(document.layer(layer).unwrap().channels()[0].data, vec![0xff, 0xff, 0xff, 0xff]);
		assert_eq!(document.layer_image(layer, &RawChannelDecoder).unwrap().unwrap().get_pixel(1, 0), Some(Color::from_gray(1., 1.)));
	}

	#[test]
	fn unsupported_modes_fail() {
		let mut document = Document::new(2, 2, ColorMode::Cmyk);
		let image = ::image::RgbaImage::new(1, 1);
		assert_eq!(document.new_pixel_layer(&image, "cmyk", 0, 0), Err(DocumentError::UnsupportedColorMode(ColorMode::Cmyk)));
	}

	#[test]
	fn mask_channel_uses_the_mask_rectangle() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		let layer = add_pixel_layer(&mut document, "masked", [0, 0, 4, 4]);
		document
			.set_mask_data(
				layer,
				Some(MaskData {
					right: 2,
					bottom: 1,
					..Default::default()
				}),
			)
			.unwrap();
		let node = document.layer_mut(layer).unwrap();
		node.record.channel_info.push(ChannelInfo {
			id: ChannelId::USER_LAYER_MASK,
			length: 4,
		});
		node.channels.push(ChannelData {
			compression: Compression::Raw,
			data: vec![255, 0],
		});
		let mask = document.channel_image(layer, ChannelId::USER_LAYER_MASK, &RawChannelDecoder).unwrap().unwrap();
		assert_eq!((mask.width, mask.height, mask.data), (2, 1, vec![1., 0.]));
	}
}
