use core::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Blend modes understood by layered documents, keyed in files by a four-character code.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub enum BlendMode {
	/// Group-only pseudo mode: children composite straight into the group's backdrop.
	PassThrough,

	// Basic group
	#[default]
	Normal,
	Dissolve,

	// Darken group
	Darken,
	Multiply,
	ColorBurn,
	LinearBurn,
	DarkerColor,

	// Lighten group
	Lighten,
	Screen,
	ColorDodge,
	LinearDodge,
	LighterColor,

	// Contrast group
	Overlay,
	SoftLight,
	HardLight,
	VividLight,
	LinearLight,
	PinLight,
	HardMix,

	// Inversion group
	Difference,
	Exclusion,
	Subtract,
	Divide,

	// Component group
	Hue,
	Saturation,
	Color,
	Luminosity,
}

impl BlendMode {
	/// All layer blend modes ordered by group. [`BlendMode::PassThrough`] is listed separately since only groups may use it.
	pub fn list() -> [&'static [BlendMode]; 6] {
		use BlendMode::*;
		[
			// Normal group
			&[Normal, Dissolve],
			// Darken group
			&[Darken, Multiply, ColorBurn, LinearBurn, DarkerColor],
			// Lighten group
			&[Lighten, Screen, ColorDodge, LinearDodge, LighterColor],
			// Contrast group
			&[Overlay, SoftLight, HardLight, VividLight, LinearLight, PinLight, HardMix],
			// Inversion group
			&[Difference, Exclusion, Subtract, Divide],
			// Component group
			&[Hue, Saturation, Color, Luminosity],
		]
	}

	/// Looks up a blend mode by the four-character code stored in layer records.
	///
	/// # Examples
	/// ```
	/// use layered_raster::BlendMode;
	/// assert_eq!(BlendMode::from_key(b"mul "), Some(BlendMode::Multiply));
	/// assert_eq!(BlendMode::from_key(b"????"), None);
	/// ```
	pub fn from_key(key: &[u8; 4]) -> Option<BlendMode> {
		use BlendMode::*;
		Some(match key {
			b"pass" => PassThrough,
			b"norm" => Normal,
			b"diss" => Dissolve,
			b"dark" => Darken,
			b"mul " => Multiply,
			b"idiv" => ColorBurn,
			b"lbrn" => LinearBurn,
			b"dkCl" => DarkerColor,
			b"lite" => Lighten,
			b"scrn" => Screen,
			b"div " => ColorDodge,
			b"lddg" => LinearDodge,
			b"lgCl" => LighterColor,
			b"over" => Overlay,
			b"sLit" => SoftLight,
			b"hLit" => HardLight,
			b"vLit" => VividLight,
			b"lLit" => LinearLight,
			b"pLit" => PinLight,
			b"hMix" => HardMix,
			b"diff" => Difference,
			b"smud" => Exclusion,
			b"fsub" => Subtract,
			b"fdiv" => Divide,
			b"hue " => Hue,
			b"sat " => Saturation,
			b"colr" => Color,
			b"lum " => Luminosity,
			_ => return None,
		})
	}

	/// The four-character code written to layer records.
	pub fn key(&self) -> &'static [u8; 4] {
		match self {
			BlendMode::PassThrough => b"pass",
			BlendMode::Normal => b"norm",
			BlendMode::Dissolve => b"diss",
			BlendMode::Darken => b"dark",
			BlendMode::Multiply => b"mul ",
			BlendMode::ColorBurn => b"idiv",
			BlendMode::LinearBurn => b"lbrn",
			BlendMode::DarkerColor => b"dkCl",
			BlendMode::Lighten => b"lite",
			BlendMode::Screen => b"scrn",
			BlendMode::ColorDodge => b"div ",
			BlendMode::LinearDodge => b"lddg",
			BlendMode::LighterColor => b"lgCl",
			BlendMode::Overlay => b"over",
			BlendMode::SoftLight => b"sLit",
			BlendMode::HardLight => b"hLit",
			BlendMode::VividLight => b"vLit",
			BlendMode::LinearLight => b"lLit",
			BlendMode::PinLight => b"pLit",
			BlendMode::HardMix => b"hMix",
			BlendMode::Difference => b"diff",
			BlendMode::Exclusion => b"smud",
			BlendMode::Subtract => b"fsub",
			BlendMode::Divide => b"fdiv",
			BlendMode::Hue => b"hue ",
			BlendMode::Saturation => b"sat ",
			BlendMode::Color => b"colr",
			BlendMode::Luminosity => b"lum ",
		}
	}

	/// Whether the mode operates on each color channel independently.
	pub fn is_separable(&self) -> bool {
		!matches!(self, BlendMode::Hue | BlendMode::Saturation | BlendMode::Color | BlendMode::Luminosity | BlendMode::DarkerColor | BlendMode::LighterColor)
	}

	/// Resolves the mode a non-group layer is composited with. Pass-through is meaningless outside of groups and falls back to normal.
	pub fn for_layer(&self) -> BlendMode {
		match self {
			BlendMode::PassThrough => {
				log::warn!("Pass-through blend mode used on a non-group layer, compositing it as normal");
				BlendMode::Normal
			}
			blend_mode => *blend_mode,
		}
	}
}

impl Display for BlendMode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			BlendMode::PassThrough => write!(f, "Pass Through"),
			// Normal group
			BlendMode::Normal => write!(f, "Normal"),
			BlendMode::Dissolve => write!(f, "Dissolve"),
			// Darken group
			BlendMode::Darken => write!(f, "Darken"),
			BlendMode::Multiply => write!(f, "Multiply"),
			BlendMode::ColorBurn => write!(f, "Color Burn"),
			BlendMode::LinearBurn => write!(f, "Linear Burn"),
			BlendMode::DarkerColor => write!(f, "Darker Color"),
			// Lighten group
			BlendMode::Lighten => write!(f, "Lighten"),
			BlendMode::Screen => write!(f, "Screen"),
			BlendMode::ColorDodge => write!(f, "Color Dodge"),
			BlendMode::LinearDodge => write!(f, "Linear Dodge"),
			BlendMode::LighterColor => write!(f, "Lighter Color"),
			// Contrast group
			BlendMode::Overlay => write!(f, "Overlay"),
			BlendMode::SoftLight => write!(f, "Soft Light"),
			BlendMode::HardLight => write!(f, "Hard Light"),
			BlendMode::VividLight => write!(f, "Vivid Light"),
			BlendMode::LinearLight => write!(f, "Linear Light"),
			BlendMode::PinLight => write!(f, "Pin Light"),
			BlendMode::HardMix => write!(f, "Hard Mix"),
			// Inversion group
			BlendMode::Difference => write!(f, "Difference"),
			BlendMode::Exclusion => write!(f, "Exclusion"),
			BlendMode::Subtract => write!(f, "Subtract"),
			BlendMode::Divide => write!(f, "Divide"),
			// Component group
			BlendMode::Hue => write!(f, "Hue"),
			BlendMode::Saturation => write!(f, "Saturation"),
			BlendMode::Color => write!(f, "Color"),
			BlendMode::Luminosity => write!(f, "Luminosity"),
		}
	}
}
