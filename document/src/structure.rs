//! Structural edits of the layer tree and traversal of it.

use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::{LayerData, LayerKey};
use crate::records::{ArtboardData, BlockData, Tag};

use rustc_hash::FxHashSet;

impl Document {
	/// Index of the layer within its parent's children. Fails for detached layers.
	pub fn index_of(&self, key: LayerKey) -> Result<usize, DocumentError> {
		let parent = self.layer(key)?.parent.ok_or(DocumentError::Detached(key))?;
		self.layers[parent].children().iter().position(|&child| child == key).ok_or(DocumentError::Detached(key))
	}

	/// Whether `ancestor` is `key` itself or one of its ancestors.
	pub fn is_ancestor_of(&self, ancestor: LayerKey, key: LayerKey) -> bool {
		self.ancestors(key).any(|current| current == ancestor)
	}

	/// The layer's children, bottom to top.
	pub fn children(&self, key: LayerKey) -> impl Iterator<Item = LayerKey> + '_ {
		self.layers.get(key).map(|node| node.children()).unwrap_or_default().iter().copied()
	}

	/// The layer followed by all of its ancestors, ending at the root (or at the top of a detached subtree).
	pub fn ancestors(&self, key: LayerKey) -> AxisIter<'_> {
		AxisIter {
			layer: self.layers.contains_key(key).then_some(key),
			next_layer: |document, key| document.layers.get(key).and_then(|node| node.parent),
			document: self,
		}
	}

	/// Depth-first pre-order traversal of everything below `key`, not including `key`.
	///
	/// Clip layers are only yielded through their base: right after the base (and the base's own descendants) when
	/// `include_clip` is set, not at all otherwise. Layers flagged as clipping without a base below them are regular layers.
	pub fn descendants(&self, key: LayerKey, include_clip: bool) -> DescendantsIter<'_> {
		DescendantsIter {
			stack: vec![Frame::Children { parent: key, index: 0 }],
			include_clip,
			document: self,
		}
	}

	/// Appends `layer` at the top of `group`. Returns the layer unchanged if it is the group itself.
	///
	/// A layer that is already attached somewhere is moved, so it never appears in two child lists.
	pub fn add_layer(&mut self, group: LayerKey, layer: LayerKey) -> Result<LayerKey, DocumentError> {
		self.move_to_group(layer, group)?;
		Ok(layer)
	}

	/// Detaches the layer from its parent. The layer and its subtree stay in the document and can be attached again.
	pub fn delete_layer(&mut self, layer: LayerKey) -> Result<(), DocumentError> {
		if layer == self.root() {
			return Err(DocumentError::RootLayer);
		}
		if self.layer(layer)?.parent.is_none() {
			return Err(DocumentError::Detached(layer));
		}
		self.detach(layer);
		self.update_clipping();
		Ok(())
	}

	/// Moves the layer to the top of `target`. Moving a layer onto itself does nothing; moving a group into its own subtree fails.
	pub fn move_to_group(&mut self, layer: LayerKey, target: LayerKey) -> Result<(), DocumentError> {
		if layer == target {
			return Ok(());
		}
		self.check_move(layer, target)?;

		self.detach(layer);
		self.attach(layer, target, None);
		self.update_clipping();
		Ok(())
	}

	/// Moves the layer `ranks` positions toward the start (bottom) of its parent's children, stopping at the first position.
	pub fn move_up(&mut self, layer: LayerKey, ranks: usize) -> Result<(), DocumentError> {
		let index = self.index_of(layer)?;
		self.reorder(layer, index.saturating_sub(ranks))
	}

	/// Moves the layer `ranks` positions toward the end (top) of its parent's children, stopping at the last position.
	pub fn move_down(&mut self, layer: LayerKey, ranks: usize) -> Result<(), DocumentError> {
		let index = self.index_of(layer)?;
		self.reorder(layer, index.saturating_add(ranks))
	}

	fn reorder(&mut self, layer: LayerKey, new_index: usize) -> Result<(), DocumentError> {
		let parent = self.layer(layer)?.parent.ok_or(DocumentError::Detached(layer))?;
		let last = self.layers[parent].children().len().saturating_sub(1);
		let new_index = new_index.min(last);
		if self.index_of(layer)? == new_index {
			return Ok(());
		}

		self.detach(layer);
		self.attach(layer, parent, Some(new_index));
		self.update_clipping();
		Ok(())
	}

	/// Creates a group named `name`, moves `layers` into it in the given order, then appends the group to the top of `parent`.
	///
	/// `parent` defaults to the parent of the first layer. Because the new group lands at the top of its parent, the grouped
	/// layers move to the top of the stack visually.
	pub fn group_layers(&mut self, layers: &[LayerKey], name: &str, parent: Option<LayerKey>, open_folder: bool) -> Result<LayerKey, DocumentError> {
		let Some(&first) = layers.first() else {
			return Err(DocumentError::EmptyGroupingRequest);
		};
		let parent = match parent {
			Some(parent) => parent,
			None => self.layer(first)?.parent.unwrap_or(self.root()),
		};
		if self.layer(parent)?.data.as_group().is_none() {
			return Err(DocumentError::NotAGroup(parent));
		}

		let mut seen = FxHashSet::default();
		let layers = layers.iter().copied().filter(|&layer| seen.insert(layer)).collect::<Vec<_>>();
		for &layer in &layers {
			self.check_move(layer, parent)?;
		}

		let group = self.new_group(name, open_folder)?;
		for &layer in &layers {
			self.move_to_group(layer, group)?;
		}
		self.move_to_group(group, parent)?;
		Ok(group)
	}

	/// Turns a group into an artboard covering `artboard_rect`, or back into a plain group when `None` is given.
	///
	/// The node keeps its key, position and children, so nothing else in the tree has to be updated.
	pub fn convert_group(&mut self, key: LayerKey, artboard_rect: Option<kurbo::Rect>) -> Result<(), DocumentError> {
		let node = self.layer_mut(key)?;
		let data = std::mem::replace(&mut node.data, LayerData::Pixel);
		node.data = match (data, artboard_rect) {
			(LayerData::Group(group) | LayerData::Artboard(group), Some(rect)) => {
				let artboard = ArtboardData {
					rect: Some(rect),
					..node.record.tagged_blocks.artboard().cloned().unwrap_or_default()
				};
				let tag = Tag::ARTBOARDS.into_iter().find(|&tag| node.record.tagged_blocks.contains(tag)).unwrap_or(Tag::ArtboardData1);
				node.record.tagged_blocks.set(tag, BlockData::Artboard(artboard));
				LayerData::Artboard(group)
			}
			(LayerData::Group(group) | LayerData::Artboard(group), None) => {
				for tag in Tag::ARTBOARDS {
					node.record.tagged_blocks.remove(tag);
				}
				LayerData::Group(group)
			}
			(other, _) => {
				node.data = other;
				return Err(DocumentError::NotAGroup(key));
			}
		};
		node.cache.invalidate_blocks();
		self.invalidate_bbox(key);
		Ok(())
	}

	/// Rejects moves of the root, of missing layers, into non-groups, and into the layer's own subtree.
	fn check_move(&self, layer: LayerKey, target: LayerKey) -> Result<(), DocumentError> {
		if layer == self.root() {
			return Err(DocumentError::RootLayer);
		}
		self.layer(layer)?;
		if self.layer(target)?.data.as_group().is_none() {
			return Err(DocumentError::NotAGroup(target));
		}
		if self.is_ancestor_of(layer, target) {
			return Err(DocumentError::CyclicStructure { layer, target });
		}
		Ok(())
	}

	/// Removes the layer from its parent's children, returning the former parent.
	fn detach(&mut self, layer: LayerKey) -> Option<LayerKey> {
		let parent = self.layers.get_mut(layer)?.parent.take()?;
		self.invalidate_bbox(parent);
		if let Some(group) = self.layers.get_mut(parent).and_then(|node| node.data.as_group_mut()) {
			group.children.retain(|&child| child != layer);
		}
		self.layers[layer].clip_base = None;
		Some(parent)
	}

	/// Inserts a detached layer into `parent` at `index`, or at the top.
	fn attach(&mut self, layer: LayerKey, parent: LayerKey, index: Option<usize>) {
		if let Some(group) = self.layers.get_mut(parent).and_then(|node| node.data.as_group_mut()) {
			let index = index.unwrap_or(group.children.len()).min(group.children.len());
			group.children.insert(index, layer);
		}
		if let Some(node) = self.layers.get_mut(layer) {
			node.parent = Some(parent);
		}
		self.invalidate_bbox(parent);
		// Effective visibility of the subtree may have changed
		self.invalidate_subtree_bbox(layer);
	}
}

pub struct AxisIter<'a> {
	layer: Option<LayerKey>,
	next_layer: fn(&Document, LayerKey) -> Option<LayerKey>,
	document: &'a Document,
}

impl Iterator for AxisIter<'_> {
	type Item = LayerKey;

	fn next(&mut self) -> Option<Self::Item> {
		let layer = self.layer.take();
		self.layer = layer.and_then(|layer| (self.next_layer)(self.document, layer));
		layer
	}
}

#[derive(Clone, Copy)]
enum Frame {
	Children { parent: LayerKey, index: usize },
	Clips { base: LayerKey, index: usize },
}

/// Lazy pre-order walk. Reads the tree as it is at each step.
#[derive(Clone)]
pub struct DescendantsIter<'a> {
	stack: Vec<Frame>,
	include_clip: bool,
	document: &'a Document,
}

impl DescendantsIter<'_> {
	fn enter(&mut self, key: LayerKey) {
		let Some(node) = self.document.layers.get(key) else { return };
		// Pushed first so the clip layers come after the subtree
		if self.include_clip && node.has_clip_layers() {
			self.stack.push(Frame::Clips { base: key, index: 0 });
		}
		if node.is_group() {
			self.stack.push(Frame::Children { parent: key, index: 0 });
		}
	}
}

impl Iterator for DescendantsIter<'_> {
	type Item = LayerKey;

	fn next(&mut self) -> Option<Self::Item> {
		let document = self.document;
		loop {
			let (list, index, is_children) = match self.stack.last_mut()? {
				Frame::Children { parent, index } => (document.layers.get(*parent).map(|node| node.children()).unwrap_or_default(), index, true),
				Frame::Clips { base, index } => (document.layers.get(*base).map(|node| node.clip_layers()).unwrap_or_default(), index, false),
			};

			let Some(&key) = list.get(*index) else {
				self.stack.pop();
				continue;
			};
			*index += 1;

			if is_children && document.layers[key].clip_base.is_some() {
				continue;
			}
			self.enter(key);
			return Some(key);
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::records::ColorMode;
	use crate::test_utils::*;
	use pretty_assertions::assert_eq;

	fn names(document: &Document, keys: impl IntoIterator<Item = LayerKey>) -> Vec<String> {
		keys.into_iter().map(|key| document.layer(key).unwrap().name().to_string()).collect()
	}

	#[test]
	fn test_tree() {
		init_logger();
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let root = document.root();
		let a = add_pixel_layer(&mut document, "a", [0, 0, 1, 1]);
		let b = add_pixel_layer(&mut document, "b", [0, 0, 1, 1]);
		let group = document.group_layers(&[a, b], "group", None, true).unwrap();
		let c = add_pixel_layer(&mut document, "c", [0, 0, 1, 1]);

		assert_eq!(document.children(root).collect::<Vec<_>>(), vec![group, c]);
		assert_eq!(document.children(group).collect::<Vec<_>>(), vec![a, b]);
		assert_eq!(document.ancestors(b).collect::<Vec<_>>(), vec![b, group, root]);
		assert_eq!(document.descendants(root, false).collect::<Vec<_>>(), vec![group, a, b, c]);
		assert_eq!(document.index_of(c).unwrap(), 1);
	}

	#[test]
	fn descendants_yield_clip_layers_after_their_base() {
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let root = document.root();
		let a = add_pixel_layer(&mut document, "a", [0, 0, 1, 1]);
		let d = add_pixel_layer(&mut document, "d", [0, 0, 1, 1]);
		let b = add_pixel_layer(&mut document, "b", [0, 0, 1, 1]);
		let group = document.group_layers(&[a, d, b], "group", None, true).unwrap();
		let c = add_pixel_layer(&mut document, "c", [0, 0, 1, 1]);
		document.set_clipping(d, true).unwrap();

		assert_eq!(document.layer(a).unwrap().clip_layers(), &[d]);
		assert_eq!(document.descendants(root, true).collect::<Vec<_>>(), vec![group, a, d, b, c]);
		assert_eq!(names(&document, document.descendants(root, false)), vec!["group", "a", "b", "c"]);

		// Restartable
		assert_eq!(document.descendants(root, true).count(), 5);
	}

	#[test]
	fn move_by_ranks_clamps() {
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let root = document.root();
		let layers = ["0", "1", "2", "3"].map(|name| add_pixel_layer(&mut document, name, [0, 0, 1, 1]));

		document.move_up(layers[2], 0).unwrap();
		document.move_down(layers[2], 0).unwrap();
		assert_eq!(document.children(root).collect::<Vec<_>>(), layers.to_vec());

		document.move_up(layers[2], 1).unwrap();
		assert_eq!(names(&document, document.children(root)), vec!["0", "2", "1", "3"]);

		document.move_down(layers[0], 10).unwrap();
		assert_eq!(names(&document, document.children(root)), vec!["2", "1", "3", "0"]);

		document.move_up(layers[3], 10).unwrap();
		assert_eq!(names(&document, document.children(root)), vec!["3", "2", "1", "0"]);
	}

	#[test]
	fn group_and_ungroup_restores_membership() {
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let root = document.root();
		let a = add_pixel_layer(&mut document, "a", [0, 0, 1, 1]);
		let x = add_pixel_layer(&mut document, "x", [0, 0, 1, 1]);
		let b = add_pixel_layer(&mut document, "b", [0, 0, 1, 1]);

		let group = document.group_layers(&[a, b], "G", None, true).unwrap();
		assert_eq!(document.children(root).collect::<Vec<_>>(), vec![x, group]);
		assert_eq!(document.children(group).collect::<Vec<_>>(), vec![a, b]);

		document.move_to_group(a, root).unwrap();
		document.move_to_group(b, root).unwrap();
		document.delete_layer(group).unwrap();

		// The grouped layers come back on top of the stack rather than at their original positions
		assert_eq!(document.children(root).collect::<Vec<_>>(), vec![x, a, b]);
		assert_eq!(document.layer(group).unwrap().parent(), None);
	}

	#[test]
	fn grouping_nothing_fails_without_mutation() {
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let a = add_pixel_layer(&mut document, "a", [0, 0, 1, 1]);
		let before = document.layers.len();
		assert_eq!(document.group_layers(&[], "G", None, true), Err(DocumentError::EmptyGroupingRequest));
		assert_eq!(document.layers.len(), before);
		assert_eq!(document.layer(a).unwrap().parent(), Some(document.root()));
	}

	#[test]
	fn cycles_are_rejected() {
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let root = document.root();
		let a = add_pixel_layer(&mut document, "a", [0, 0, 1, 1]);
		let outer = document.group_layers(&[a], "outer", None, true).unwrap();
		let inner = document.group_layers(&[a], "inner", Some(outer), true).unwrap();

		assert_eq!(document.move_to_group(outer, inner), Err(DocumentError::CyclicStructure { layer: outer, target: inner }));
		assert_eq!(document.group_layers(&[outer], "G", Some(inner), true), Err(DocumentError::CyclicStructure { layer: outer, target: inner }));
		assert_eq!(document.move_to_group(root, outer), Err(DocumentError::RootLayer));
		assert_eq!(document.move_to_group(a, a), Ok(()));
		assert_eq!(document.add_layer(outer, outer), Ok(outer));
		assert_eq!(document.move_to_group(outer, a), Err(DocumentError::NotAGroup(a)));

		// Tree untouched
		assert_eq!(document.ancestors(a).collect::<Vec<_>>(), vec![a, inner, outer, root]);
	}

	#[test]
	fn add_layer_moves_attached_layers() {
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let root = document.root();
		let a = add_pixel_layer(&mut document, "a", [0, 0, 1, 1]);
		let group = document.new_group("group", true).unwrap();
		document.add_layer(root, group).unwrap();
		document.add_layer(group, a).unwrap();

		assert_eq!(document.children(root).collect::<Vec<_>>(), vec![group]);
		assert_eq!(document.children(group).collect::<Vec<_>>(), vec![a]);
	}

	#[test]
	fn delete_keeps_subtree() {
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let a = add_pixel_layer(&mut document, "a", [0, 0, 1, 1]);
		let group = document.group_layers(&[a], "group", None, true).unwrap();

		document.delete_layer(group).unwrap();
		assert_eq!(document.delete_layer(group), Err(DocumentError::Detached(group)));
		assert_eq!(document.children(group).collect::<Vec<_>>(), vec![a]);
		assert_eq!(document.layer(a).unwrap().parent(), Some(group));

		document.discard_layer(group).unwrap();
		assert!(!document.contains(a));
		assert_eq!(document.layer(group).err(), Some(DocumentError::LayerNotFound(group)));
	}

	#[test]
	fn artboard_promotion_keeps_children() {
		let mut document = Document::new(10, 10, ColorMode::Rgb);
		let a = add_pixel_layer(&mut document, "a", [0, 0, 1, 1]);
		let group = document.group_layers(&[a], "board", None, true).unwrap();

		document.convert_group(group, Some(kurbo::Rect::new(0., 0., 8., 6.))).unwrap();
		assert_eq!(document.kind(group).unwrap(), crate::layers::LayerKind::Artboard);
		assert_eq!(document.children(group).collect::<Vec<_>>(), vec![a]);
		assert_eq!(document.layer(a).unwrap().parent(), Some(group));

		document.convert_group(group, None).unwrap();
		assert_eq!(document.kind(group).unwrap(), crate::layers::LayerKind::Group);
		assert!(!document.layer(group).unwrap().record().tagged_blocks.contains_any(&Tag::ARTBOARDS));
		assert_eq!(document.convert_group(a, None), Err(DocumentError::NotAGroup(a)));
		assert_eq!(document.kind(a).unwrap(), crate::layers::LayerKind::Pixel);
	}
}
