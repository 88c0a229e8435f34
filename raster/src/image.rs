use crate::color::Color;
use core::fmt::Debug;

/// Marker for types that can be stored in an [`Image`].
pub trait Pixel: Clone + Copy + Default + PartialEq + Debug {}

impl Pixel for Color {}
impl Pixel for f32 {}

/// Row-major raster where `data[x + y * width]` is the pixel at column `x` and row `y`.
#[derive(Clone, PartialEq, Default)]
pub struct Image<P: Pixel> {
	pub width: u32,
	pub height: u32,
	pub data: Vec<P>,
}

impl<P: Pixel> Debug for Image<P> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let length = self.data.len();
		f.debug_struct("Image")
			.field("width", &self.width)
			.field("height", &self.height)
			.field("data", if length < 100 { &self.data } else { &length })
			.finish()
	}
}

impl<P: Pixel> Image<P> {
	pub fn new(width: u32, height: u32, color: P) -> Self {
		Self {
			width,
			height,
			data: vec![color; width as usize * height as usize],
		}
	}

	/// Builds an image by evaluating `f(x, y)` for every pixel.
	pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> P) -> Self {
		let data = (0..height).flat_map(|y| (0..width).map(move |x| (x, y))).map(|(x, y)| f(x, y)).collect();
		Self { width, height, data }
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}

	#[inline(always)]
	pub fn get_pixel(&self, x: u32, y: u32) -> Option<P> {
		if x >= self.width || y >= self.height {
			return None;
		}
		self.data.get(x as usize + y as usize * self.width as usize).copied()
	}

	#[inline(always)]
	pub fn get_pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut P> {
		if x >= self.width || y >= self.height {
			return None;
		}
		self.data.get_mut(x as usize + y as usize * self.width as usize)
	}

	/// Reads the pixel at signed coordinates, returning `outside` when they fall off the image.
	#[inline(always)]
	pub fn sample(&self, x: i64, y: i64, outside: P) -> P {
		let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else { return outside };
		self.get_pixel(x, y).unwrap_or(outside)
	}

	pub fn map<Q: Pixel>(&self, f: impl Fn(P) -> Q) -> Image<Q> {
		Image {
			width: self.width,
			height: self.height,
			data: self.data.iter().copied().map(f).collect(),
		}
	}

	/// Combines two images of identical dimensions pixel by pixel, writing into `self`.
	pub fn zip_apply<Q: Pixel>(&mut self, other: &Image<Q>, f: impl Fn(P, Q) -> P) {
		debug_assert_eq!((self.width, self.height), (other.width, other.height));
		for (pixel, other) in self.data.iter_mut().zip(other.data.iter()) {
			*pixel = f(*pixel, *other);
		}
	}
}

impl Image<Color> {
	pub fn from_rgba_image(image: &::image::RgbaImage) -> Self {
		let data = image.pixels().map(|pixel| Color::from_rgba8(pixel[0], pixel[1], pixel[2], pixel[3])).collect();
		Image {
			width: image.width(),
			height: image.height(),
			data,
		}
	}

	pub fn to_rgba_image(&self) -> ::image::RgbaImage {
		::image::RgbaImage::from_fn(self.width, self.height, |x, y| ::image::Rgba(self.get_pixel(x, y).unwrap_or_default().to_rgba8()))
	}

	/// The alpha channel as its own plane.
	pub fn alpha(&self) -> Image<f32> {
		self.map(|color| color.a())
	}
}
