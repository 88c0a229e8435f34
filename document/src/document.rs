use crate::error::DocumentError;
use crate::layers::name::{LEGACY_NAME_PLACEHOLDER, MAX_NAME_LENGTH, NameEncoding, is_mac_roman};
use crate::layers::{GroupLayer, LayerData, LayerKey, LayerKind, LayerNode};
use crate::records::*;
use crate::smart_object::LinkedLayer;

use layered_raster::BlendMode;
use slotmap::SlotMap;

/// Name written into the hidden record that closes a group.
pub const GROUP_DIVIDER_NAME: &str = "</Layer group>";

/// Light angle used by effects that follow the global light, when the file does not provide one.
pub const DEFAULT_GLOBAL_ANGLE: f64 = 120.;

/// A layered image document: canvas properties plus a tree of layers.
///
/// Layers live in an arena and are addressed with [`LayerKey`]s. The root is a hidden group whose children are the top-level layers.
/// Derived data (bounding boxes, masks, effects) is cached inside the nodes with interior mutability, so a document is not `Sync`;
/// only one thread may use it at a time.
#[derive(Debug)]
pub struct Document {
	header: FileHeader,
	linked_layers: Vec<LinkedLayer>,
	global_angle: f64,
	pub(crate) layers: SlotMap<LayerKey, LayerNode>,
	root: LayerKey,
}

impl Document {
	/// Creates an empty document.
	pub fn new(width: u32, height: u32, color_mode: ColorMode) -> Self {
		Self::with_header(FileHeader {
			width,
			height,
			depth: 8,
			color_mode,
		})
	}

	fn with_header(header: FileHeader) -> Self {
		let mut layers = SlotMap::with_key();
		let root = layers.insert(LayerNode::new(LayerEntry::default(), LayerData::Group(GroupLayer::default())));
		Self {
			header,
			linked_layers: Vec::new(),
			global_angle: DEFAULT_GLOBAL_ANGLE,
			layers,
			root,
		}
	}

	/// Builds the layer tree from records listed in file order (bottom to top).
	///
	/// A bounding section divider opens a group, and the next open or closed folder record closes it and becomes the group's own record.
	pub fn from_store(store: RecordStore) -> Result<Self, DocumentError> {
		let RecordStore { header, layers, linked_layers } = store;
		let mut document = Self::with_header(header);
		document.linked_layers = linked_layers;

		// Each pending group collects its children until its folder record shows up
		let mut pending: Vec<(LayerEntry, Vec<LayerKey>)> = Vec::new();
		let mut top_level = Vec::new();

		for entry in layers {
			match entry.record.section_divider().map(|setting| setting.kind) {
				Some(SectionDividerKind::BoundingSectionDivider) => pending.push((entry, Vec::new())),
				Some(SectionDividerKind::OpenFolder | SectionDividerKind::ClosedFolder) => {
					let Some((divider, children)) = pending.pop() else {
						return Err(DocumentError::MalformedRecords(format!("group \"{}\" closes without a section divider", entry.record.name)));
					};
					let group = GroupLayer { children, divider };
					let data = if entry.record.tagged_blocks.contains_any(&Tag::ARTBOARDS) {
						LayerData::Artboard(group)
					} else {
						LayerData::Group(group)
					};
					let key = document.insert_node(LayerNode::new(entry, data));
					pending.last_mut().map(|(_, children)| children).unwrap_or(&mut top_level).push(key);
				}
				_ => {
					let data = LayerData::classify(&entry.record);
					let key = document.insert_node(LayerNode::new(entry, data));
					pending.last_mut().map(|(_, children)| children).unwrap_or(&mut top_level).push(key);
				}
			}
		}
		if !pending.is_empty() {
			return Err(DocumentError::MalformedRecords(format!("{} group(s) are never closed", pending.len())));
		}

		let root = document.root;
		if let Some(group) = document.layers[root].data.as_group_mut() {
			group.children = top_level;
		}
		document.link_parents(root);
		document.update_clipping();

		log::debug!("Built a layer tree of {} layers", document.layers.len() - 1);
		Ok(document)
	}

	fn insert_node(&mut self, node: LayerNode) -> LayerKey {
		let key = self.layers.insert(node);
		// Groups are inserted after their children
		let children = self.layers[key].children().to_vec();
		for child in children {
			self.layers[child].parent = Some(key);
		}
		key
	}

	fn link_parents(&mut self, parent: LayerKey) {
		let children = self.layers[parent].children().to_vec();
		for child in children {
			self.layers[child].parent = Some(parent);
		}
	}

	/// Flattens the tree back into records in file order, emitting the section divider records around every group.
	pub fn to_store(&self) -> RecordStore {
		let mut layers = Vec::with_capacity(self.layers.len());
		self.flatten_into(self.root, &mut layers);
		RecordStore {
			header: self.header,
			layers,
			linked_layers: self.linked_layers.clone(),
		}
	}

	fn flatten_into(&self, parent: LayerKey, entries: &mut Vec<LayerEntry>) {
		for &child in self.layers[parent].children() {
			let node = &self.layers[child];
			if let Some(group) = node.data.as_group() {
				entries.push(group.divider.clone());
				self.flatten_into(child, entries);
			}
			entries.push(LayerEntry::new(node.record.clone(), node.channels.clone()));
		}
	}

	pub fn header(&self) -> &FileHeader {
		&self.header
	}

	pub fn width(&self) -> u32 {
		self.header.width
	}

	pub fn height(&self) -> u32 {
		self.header.height
	}

	pub fn color_mode(&self) -> ColorMode {
		self.header.color_mode
	}

	pub fn depth(&self) -> u16 {
		self.header.depth
	}

	pub fn linked_layers(&self) -> &[LinkedLayer] {
		&self.linked_layers
	}

	pub fn global_angle(&self) -> f64 {
		self.global_angle
	}

	pub fn set_global_angle(&mut self, angle: f64) {
		self.global_angle = angle;
		for node in self.layers.values_mut() {
			node.cache.effects = Default::default();
		}
	}

	/// The hidden group holding the top-level layers.
	pub fn root(&self) -> LayerKey {
		self.root
	}

	pub fn contains(&self, key: LayerKey) -> bool {
		self.layers.contains_key(key)
	}

	/// Returns a reference to the requested layer. Fails if the key belongs to a discarded layer.
	pub fn layer(&self, key: LayerKey) -> Result<&LayerNode, DocumentError> {
		self.layers.get(key).ok_or(DocumentError::LayerNotFound(key))
	}

	pub(crate) fn layer_mut(&mut self, key: LayerKey) -> Result<&mut LayerNode, DocumentError> {
		self.layers.get_mut(key).ok_or(DocumentError::LayerNotFound(key))
	}

	/// Returns the children of the requested group. Fails if the layer is not a group or artboard.
	pub fn group_children(&self, key: LayerKey) -> Result<&[LayerKey], DocumentError> {
		let node = self.layer(key)?;
		node.data.as_group().map(GroupLayer::children).ok_or(DocumentError::NotAGroup(key))
	}

	pub fn kind(&self, key: LayerKey) -> Result<LayerKind, DocumentError> {
		Ok(self.layer(key)?.kind())
	}

	/// Finds an attached layer by its stored layer id.
	pub fn layer_by_id(&self, id: u32) -> Option<LayerKey> {
		self.descendants(self.root, true).find(|&key| self.layers[key].layer_id() == Some(id))
	}

	// ================
	// Layer creation
	// ================

	/// Adds a layer built from a record to the arena, detached. Attach it with [`Document::add_layer`].
	pub fn new_layer(&mut self, entry: LayerEntry) -> LayerKey {
		let data = LayerData::classify(&entry.record);
		self.layers.insert(LayerNode::new(entry, data))
	}

	/// Creates an empty detached group together with its closing section divider record.
	pub fn new_group(&mut self, name: &str, open_folder: bool) -> Result<LayerKey, DocumentError> {
		check_name_length(name)?;
		let kind = if open_folder { SectionDividerKind::OpenFolder } else { SectionDividerKind::ClosedFolder };

		let mut record = self.empty_record();
		record.tagged_blocks.set(Tag::SectionDividerSetting, BlockData::SectionDivider(SectionDividerSetting { kind, ..Default::default() }));

		let mut divider = self.empty_record();
		divider.name = GROUP_DIVIDER_NAME.to_string();
		divider.tagged_blocks.set(Tag::UnicodeLayerName, LayerNode::unicode_name_block(GROUP_DIVIDER_NAME));
		divider.tagged_blocks.set(
			Tag::SectionDividerSetting,
			BlockData::SectionDivider(SectionDividerSetting {
				kind: SectionDividerKind::BoundingSectionDivider,
				..Default::default()
			}),
		);
		let channels = divider.channel_info.iter().map(|_| ChannelData::default()).collect::<Vec<_>>();

		let group = GroupLayer {
			children: Vec::new(),
			divider: LayerEntry::new(divider, channels.clone()),
		};
		let key = self.layers.insert(LayerNode::new(LayerEntry::new(record, channels), LayerData::Group(group)));
		self.set_name(key, name)?;
		Ok(key)
	}

	/// A zero-sized record with an empty channel for transparency and every color channel.
	pub(crate) fn empty_record(&self) -> LayerRecord {
		let channel_info = std::iter::once(ChannelId::TRANSPARENCY_MASK)
			.chain((0..self.header.color_mode.channel_count() as i16).map(ChannelId))
			.map(|id| ChannelInfo { id, length: 2 })
			.collect();
		LayerRecord { channel_info, ..Default::default() }
	}

	/// Removes a layer and its whole subtree from the arena, deleting it from its parent first if needed.
	pub fn discard_layer(&mut self, key: LayerKey) -> Result<(), DocumentError> {
		if key == self.root {
			return Err(DocumentError::RootLayer);
		}
		if self.layer(key)?.parent.is_some() {
			self.delete_layer(key)?;
		}
		let mut stack = vec![key];
		while let Some(current) = stack.pop() {
			if let Some(node) = self.layers.remove(current) {
				stack.extend_from_slice(node.children());
			}
		}
		Ok(())
	}

	// ================
	// Layer properties
	// ================

	/// Renames a layer. Names longer than 255 UTF-16 code units are rejected before anything changes.
	///
	/// The full name always goes into the unicode name block. The legacy field receives the name too when it has a
	/// single-byte encoding, otherwise a placeholder, which is reported as [`NameEncoding::Placeholder`].
	pub fn set_name(&mut self, key: LayerKey, name: &str) -> Result<NameEncoding, DocumentError> {
		check_name_length(name)?;
		let node = self.layer_mut(key)?;

		let encoding = if is_mac_roman(name) {
			node.record.name = name.to_string();
			NameEncoding::Legacy
		} else {
			log::warn!("Layer name \"{name}\" cannot be stored as a legacy name, using a placeholder instead");
			node.record.name = LEGACY_NAME_PLACEHOLDER.to_string();
			NameEncoding::Placeholder
		};
		node.record.tagged_blocks.set(Tag::UnicodeLayerName, LayerNode::unicode_name_block(name));
		Ok(encoding)
	}

	/// Effective visibility: the layer and every ancestor are visible.
	pub fn is_visible(&self, key: LayerKey) -> Result<bool, DocumentError> {
		self.layer(key)?;
		Ok(self.ancestors(key).all(|ancestor| self.layers[ancestor].visible()))
	}

	pub fn set_visible(&mut self, key: LayerKey, visible: bool) -> Result<(), DocumentError> {
		let node = self.layer_mut(key)?;
		if node.visible() == visible {
			return Ok(());
		}
		node.record.flags.set(LayerFlags::HIDDEN, !visible);

		// Group boxes only count effectively visible children, so the whole subtree is affected as well as the ancestors
		self.invalidate_subtree_bbox(key);
		self.invalidate_bbox(key);
		Ok(())
	}

	pub fn set_opacity(&mut self, key: LayerKey, opacity: u8) -> Result<(), DocumentError> {
		self.layer_mut(key)?.record.opacity = opacity;
		Ok(())
	}

	pub fn set_fill_opacity(&mut self, key: LayerKey, opacity: u8) -> Result<(), DocumentError> {
		self.layer_mut(key)?.record.tagged_blocks.set(Tag::BlendFillOpacity, BlockData::Integer(opacity.into()));
		Ok(())
	}

	/// Sets the blend mode. For groups, pass-through is stored in the section divider while the record keeps normal.
	pub fn set_blend_mode(&mut self, key: LayerKey, blend_mode: BlendMode) -> Result<(), DocumentError> {
		let node = self.layer_mut(key)?;
		if !node.is_group() {
			if blend_mode == BlendMode::PassThrough {
				return Err(DocumentError::PassThroughOnLayer(key));
			}
			node.record.blend_mode = blend_mode;
			return Ok(());
		}

		node.record.blend_mode = if blend_mode == BlendMode::PassThrough { BlendMode::Normal } else { blend_mode };
		if let Some(setting) = node.record.tagged_blocks.section_divider_mut() {
			setting.blend_mode = Some(blend_mode);
		}
		Ok(())
	}

	pub fn set_open_folder(&mut self, key: LayerKey, open: bool) -> Result<(), DocumentError> {
		let node = self.layer_mut(key)?;
		if !node.is_group() {
			return Err(DocumentError::NotAGroup(key));
		}
		let kind = if open { SectionDividerKind::OpenFolder } else { SectionDividerKind::ClosedFolder };
		match node.record.tagged_blocks.section_divider_mut() {
			Some(setting) => setting.kind = kind,
			None => node.record.tagged_blocks.set(Tag::SectionDividerSetting, BlockData::SectionDivider(SectionDividerSetting { kind, ..Default::default() })),
		}
		Ok(())
	}

	/// Writes a tagged block. Every view derived from blocks is dropped, and so are the bounding boxes up to the root.
	pub fn set_tagged_block(&mut self, key: LayerKey, tag: Tag, data: BlockData) -> Result<(), DocumentError> {
		let node = self.layer_mut(key)?;
		node.record.tagged_blocks.set(tag, data);
		node.cache.invalidate_blocks();
		self.invalidate_bbox(key);
		Ok(())
	}

	pub fn remove_tagged_block(&mut self, key: LayerKey, tag: Tag) -> Result<Option<BlockData>, DocumentError> {
		let node = self.layer_mut(key)?;
		let removed = node.record.tagged_blocks.remove(tag);
		node.cache.invalidate_blocks();
		self.invalidate_bbox(key);
		Ok(removed)
	}

	/// Replaces the raster mask parameters.
	pub fn set_mask_data(&mut self, key: LayerKey, mask_data: Option<MaskData>) -> Result<(), DocumentError> {
		let node = self.layer_mut(key)?;
		node.record.mask_data = mask_data;
		node.cache.mask = Default::default();
		Ok(())
	}
}

fn check_name_length(name: &str) -> Result<(), DocumentError> {
	let length = name.encode_utf16().count();
	if length > MAX_NAME_LENGTH {
		return Err(DocumentError::InvalidLayerName { length });
	}
	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test_utils::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn records_build_nested_groups() {
		init_logger();
		let store = RecordStore {
			header: header(10, 10),
			layers: vec![
				pixel_entry("bottom", [0, 0, 2, 2]),
				divider_entry(),
				pixel_entry("inner", [1, 1, 3, 3]),
				group_entry("group", SectionDividerKind::OpenFolder),
				pixel_entry("top", [0, 0, 1, 1]),
			],
			linked_layers: Vec::new(),
		};
		let document = Document::from_store(store.clone()).unwrap();
		let names = document.group_children(document.root()).unwrap().iter().map(|&key| document.layer(key).unwrap().name().to_string()).collect::<Vec<_>>();
		assert_eq!(names, vec!["bottom", "group", "top"]);

		let group = document.group_children(document.root()).unwrap()[1];
		assert_eq!(document.kind(group).unwrap(), LayerKind::Group);
		let inner = document.group_children(group).unwrap()[0];
		assert_eq!(document.layer(inner).unwrap().parent(), Some(group));

		assert_eq!(document.to_store(), store);
	}

	#[test]
	fn unbalanced_dividers_are_rejected() {
		let store = RecordStore {
			header: header(10, 10),
			layers: vec![group_entry("group", SectionDividerKind::ClosedFolder)],
			linked_layers: Vec::new(),
		};
		assert!(matches!(Document::from_store(store), Err(DocumentError::MalformedRecords(_))));

		let store = RecordStore {
			header: header(10, 10),
			layers: vec![divider_entry(), pixel_entry("orphan", [0, 0, 1, 1])],
			linked_layers: Vec::new(),
		};
		assert!(matches!(Document::from_store(store), Err(DocumentError::MalformedRecords(_))));
	}

	#[test]
	fn rename() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		let layer = add_pixel_layer(&mut document, "layer", [0, 0, 4, 4]);

		assert_eq!(document.set_name(layer, "Café").unwrap(), NameEncoding::Legacy);
		assert_eq!(document.layer(layer).unwrap().record().name, "Café");

		assert_eq!(document.set_name(layer, "レイヤー 1").unwrap(), NameEncoding::Placeholder);
		assert_eq!(document.layer(layer).unwrap().record().name, "?");
		assert_eq!(document.layer(layer).unwrap().name(), "レイヤー 1");

		let long_name = "x".repeat(256);
		assert_eq!(document.set_name(layer, &long_name), Err(DocumentError::InvalidLayerName { length: 256 }));
		assert_eq!(document.layer(layer).unwrap().name(), "レイヤー 1");
		assert!(document.set_name(layer, &"x".repeat(255)).is_ok());
	}

	#[test]
	fn group_pass_through_lives_in_divider() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		let group = document.new_group("group", true).unwrap();
		let layer = add_pixel_layer(&mut document, "layer", [0, 0, 4, 4]);

		document.set_blend_mode(group, BlendMode::PassThrough).unwrap();
		let node = document.layer(group).unwrap();
		assert_eq!(node.blend_mode(), BlendMode::PassThrough);
		assert_eq!(node.record().blend_mode, BlendMode::Normal);

		assert_eq!(document.set_blend_mode(layer, BlendMode::PassThrough), Err(DocumentError::PassThroughOnLayer(layer)));
		document.set_blend_mode(layer, BlendMode::Screen).unwrap();
		assert_eq!(document.layer(layer).unwrap().blend_mode(), BlendMode::Screen);
	}

	#[test]
	fn new_group_is_detached_with_divider() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		let group = document.new_group("Folder", false).unwrap();
		let node = document.layer(group).unwrap();
		assert_eq!(node.parent(), None);
		assert!(!node.is_open_folder());
		assert_eq!(node.name(), "Folder");

		let divider = node.data().as_group().unwrap().divider();
		assert_eq!(divider.record.name, GROUP_DIVIDER_NAME);
		assert_eq!(divider.record.section_divider().unwrap().kind, SectionDividerKind::BoundingSectionDivider);
		assert_eq!(divider.record.channel_info.len(), 4);
	}
}
