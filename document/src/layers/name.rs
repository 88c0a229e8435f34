//! Legacy layer name storage. Records keep a single-byte Mac OS Roman name next to the full unicode name.

/// Characters of the Mac OS Roman code page from `0x80` to `0xFF`.
const MAC_ROMAN_HIGH: &str = concat!(
	"ÄÅÇÉÑÖÜáàâäãåçéèêëíìîïñóòôöõúùûü",
	"†°¢£§•¶ß®©™´¨≠ÆØ∞±≤≥¥µ∂∑∏π∫ªºΩæø",
	"¿¡¬√ƒ≈∆«»…\u{a0}ÀÃÕŒœ–—“”‘’÷◊ÿŸ⁄€‹›ﬁﬂ",
	"‡·‚„‰ÂÊÁËÈÍÎÏÌÓÔ\u{f8ff}ÒÚÛÙıˆ˜¯˘˙˚¸˝˛ˇ",
);

/// Placeholder written to the legacy name field when the name has no single-byte form.
pub const LEGACY_NAME_PLACEHOLDER: &str = "?";

/// Upper bound on a layer name, in UTF-16 code units.
pub const MAX_NAME_LENGTH: usize = 255;

/// Whether every character of `name` has a Mac OS Roman encoding.
pub fn is_mac_roman(name: &str) -> bool {
	name.chars().all(|character| character.is_ascii() || MAC_ROMAN_HIGH.contains(character))
}

/// How a name ended up stored in the legacy field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameEncoding {
	/// The legacy field carries the full name.
	Legacy,
	/// The legacy field carries [`LEGACY_NAME_PLACEHOLDER`]; only the unicode name block has the full name.
	Placeholder,
}
