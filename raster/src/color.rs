use core::hash::Hash;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Luma weights used by the non-separable blend modes (hue, saturation, color, luminosity) and by
/// the darker/lighter color comparisons.
const LUMA_WEIGHTS: [f32; 3] = [0.3, 0.59, 0.11];

/// Structure that represents a straight (non-premultiplied) color.
/// Every component is stored as `f32` ranging from `0.0` to `1.0`; alpha `0.0` is fully transparent.
#[repr(C)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
	red: f32,
	green: f32,
	blue: f32,
	alpha: f32,
}

#[allow(clippy::derived_hash_with_manual_eq)]
impl Hash for Color {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.red.to_bits().hash(state);
		self.green.to_bits().hash(state);
		self.blue.to_bits().hash(state);
		self.alpha.to_bits().hash(state);
	}
}

impl Color {
	pub const BLACK: Color = Color::from_rgbf32_unchecked(0., 0., 0.);
	pub const WHITE: Color = Color::from_rgbf32_unchecked(1., 1., 1.);
	pub const TRANSPARENT: Color = Self {
		red: 0.,
		green: 0.,
		blue: 0.,
		alpha: 0.,
	};

	/// Returns `Some(Color)` if every component lies within `0.0..=1.0`. NaN and infinity are rejected.
	///
	/// # Examples
	/// ```
	/// use layered_raster::Color;
	/// let color = Color::from_rgbaf32(0.3, 0.14, 0.15, 0.92).unwrap();
	/// assert!(color.components() == (0.3, 0.14, 0.15, 0.92));
	///
	/// let color = Color::from_rgbaf32(1.0, 1.0, 1.0, f32::NAN);
	/// assert!(color == None);
	/// ```
	pub fn from_rgbaf32(red: f32, green: f32, blue: f32, alpha: f32) -> Option<Color> {
		if [red, green, blue, alpha].iter().any(|c| !(0. ..=1.).contains(c)) {
			return None;
		}
		Some(Color { red, green, blue, alpha })
	}

	/// Return an opaque `Color` from given `f32` RGB channels.
	pub const fn from_rgbf32_unchecked(red: f32, green: f32, blue: f32) -> Color {
		Color { red, green, blue, alpha: 1. }
	}

	pub const fn from_rgbaf32_unchecked(red: f32, green: f32, blue: f32, alpha: f32) -> Color {
		Color { red, green, blue, alpha }
	}

	/// Return an opaque `Color` given RGB channels from `0` to `255`.
	pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Color {
		Color::from_rgba8(red, green, blue, 255)
	}

	/// Return a `Color` given RGBA channels from `0` to `255`.
	///
	/// # Examples
	/// ```
	/// use layered_raster::Color;
	/// let color = Color::from_rgba8(0x72, 0x67, 0x62, 0x61);
	/// assert_eq!(color.to_rgba8(), [0x72, 0x67, 0x62, 0x61]);
	/// ```
	pub fn from_rgba8(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
		let map_range = |int_color| int_color as f32 / 255.;
		Color {
			red: map_range(red),
			green: map_range(green),
			blue: map_range(blue),
			alpha: map_range(alpha),
		}
	}

	/// Builds a gray `Color` where every color channel carries `value`.
	pub const fn from_gray(value: f32, alpha: f32) -> Color {
		Color {
			red: value,
			green: value,
			blue: value,
			alpha,
		}
	}

	/// Builds a straight color from premultiplied components. A fully transparent input yields [`Color::TRANSPARENT`].
	pub fn from_premultiplied([red, green, blue, alpha]: [f32; 4]) -> Color {
		if alpha <= 0. {
			return Color::TRANSPARENT;
		}
		let unassociate = |channel: f32| (channel / alpha).clamp(0., 1.);
		Color {
			red: unassociate(red),
			green: unassociate(green),
			blue: unassociate(blue),
			alpha: alpha.min(1.),
		}
	}

	#[inline(always)]
	pub fn r(&self) -> f32 {
		self.red
	}

	#[inline(always)]
	pub fn g(&self) -> f32 {
		self.green
	}

	#[inline(always)]
	pub fn b(&self) -> f32 {
		self.blue
	}

	#[inline(always)]
	pub fn a(&self) -> f32 {
		self.alpha
	}

	pub fn components(&self) -> (f32, f32, f32, f32) {
		(self.red, self.green, self.blue, self.alpha)
	}

	pub fn rgb(&self) -> [f32; 3] {
		[self.red, self.green, self.blue]
	}

	pub fn from_rgb_array([red, green, blue]: [f32; 3], alpha: f32) -> Color {
		Color { red, green, blue, alpha }
	}

	/// The color components multiplied by alpha.
	pub fn premultiplied(&self) -> [f32; 4] {
		[self.red * self.alpha, self.green * self.alpha, self.blue * self.alpha, self.alpha]
	}

	#[must_use]
	pub fn with_alpha(&self, alpha: f32) -> Color {
		Color { alpha, ..*self }
	}

	/// Scales alpha by `factor`, leaving the color untouched.
	#[must_use]
	pub fn multiply_alpha(&self, factor: f32) -> Color {
		Color {
			alpha: self.alpha * factor,
			..*self
		}
	}

	/// Return the all components as a u8 slice, first component is red, followed by green, followed by blue, followed by alpha.
	///
	/// # Examples
	/// ```
	/// use layered_raster::Color;
	/// let color = Color::from_rgbaf32(0.114, 0.103, 0.98, 0.97).unwrap();
	/// assert_eq!(color.to_rgba8(), [29, 26, 250, 247]);
	/// ```
	pub fn to_rgba8(&self) -> [u8; 4] {
		let quantize = |channel: f32| (channel.clamp(0., 1.) * 255.).round() as u8;
		[quantize(self.red), quantize(self.green), quantize(self.blue), quantize(self.alpha)]
	}

	pub fn to_rgba16(&self) -> [u16; 4] {
		let quantize = |channel: f32| (channel.clamp(0., 1.) * 65535.).round() as u16;
		[quantize(self.red), quantize(self.green), quantize(self.blue), quantize(self.alpha)]
	}

	/// Weighted luma of the color channels, ignoring alpha.
	pub fn luminosity(&self) -> f32 {
		lum(self.rgb())
	}

	/// Difference between the largest and the smallest color channel.
	pub fn saturation(&self) -> f32 {
		sat(self.rgb())
	}

	/// Returns a color with the same hue and saturation but with the given luminosity.
	#[must_use]
	pub fn with_luminosity(&self, luminosity: f32) -> Color {
		Color::from_rgb_array(set_lum(self.rgb(), luminosity), self.alpha)
	}

	/// Returns a color with the same hue but with the given saturation. Luminosity is not preserved.
	#[must_use]
	pub fn with_saturation(&self, saturation: f32) -> Color {
		Color::from_rgb_array(set_sat(self.rgb(), saturation), self.alpha)
	}

	#[must_use]
	pub fn map_rgb<F: Fn(f32) -> f32>(&self, f: F) -> Self {
		Color::from_rgbaf32_unchecked(f(self.r()), f(self.g()), f(self.b()), self.a())
	}

	#[must_use]
	pub fn map_rgba<F: Fn(f32) -> f32>(&self, f: F) -> Self {
		Color::from_rgbaf32_unchecked(f(self.r()), f(self.g()), f(self.b()), f(self.a()))
	}

	/// Linearly interpolates between two colors in premultiplied space based on `t`.
	///
	/// T must be between 0 and 1.
	#[must_use]
	pub fn lerp(&self, other: &Color, t: f32) -> Self {
		let start = self.premultiplied();
		let end = other.premultiplied();
		let mix = |index: usize| start[index] + (end[index] - start[index]) * t;
		Color::from_premultiplied([mix(0), mix(1), mix(2), mix(3)])
	}
}

fn lum([red, green, blue]: [f32; 3]) -> f32 {
	LUMA_WEIGHTS[0] * red + LUMA_WEIGHTS[1] * green + LUMA_WEIGHTS[2] * blue
}

fn sat(rgb: [f32; 3]) -> f32 {
	let max = rgb.iter().copied().fold(f32::MIN, f32::max);
	let min = rgb.iter().copied().fold(f32::MAX, f32::min);
	max - min
}

fn clip_color(rgb: [f32; 3]) -> [f32; 3] {
	let luminosity = lum(rgb);
	let min = rgb.iter().copied().fold(f32::MAX, f32::min);
	let max = rgb.iter().copied().fold(f32::MIN, f32::max);

	let mut clipped = rgb;
	if min < 0. {
		clipped = clipped.map(|channel| luminosity + (channel - luminosity) * luminosity / (luminosity - min));
	}
	if max > 1. {
		clipped = clipped.map(|channel| luminosity + (channel - luminosity) * (1. - luminosity) / (max - luminosity));
	}
	clipped
}

fn set_lum(rgb: [f32; 3], luminosity: f32) -> [f32; 3] {
	let delta = luminosity - lum(rgb);
	clip_color(rgb.map(|channel| channel + delta))
}

fn set_sat(rgb: [f32; 3], saturation: f32) -> [f32; 3] {
	let mut order = [0, 1, 2];
	order.sort_by(|&a, &b| rgb[a].total_cmp(&rgb[b]));
	let [min, mid, max] = order;

	let mut result = [0.; 3];
	if rgb[max] > rgb[min] {
		result[mid] = (rgb[mid] - rgb[min]) * saturation / (rgb[max] - rgb[min]);
		result[max] = saturation;
	}
	result
}
