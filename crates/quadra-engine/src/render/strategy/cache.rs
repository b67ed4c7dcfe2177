use std::collections::{HashMap, HashSet};

use crate::render::backend::{BufferId, RenderBackend, TextureId};
use crate::scene::{Node, NodeId};

#[derive(Debug)]
struct NodeResources {
    buffer: BufferId,
    geometry_revision: u64,
    texture: Option<(TextureId, u64)>,
}

/// Per-node GPU objects owned by a strategy.
///
/// Entries are created the first time a node is drawn, refreshed when the
/// node's revision counters move, and released once the node is gone from
/// the bucket the strategy draws.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<NodeId, NodeResources>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes holding GPU resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases the resources of every cached node not present in `nodes`.
    pub fn sweep<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, nodes: &[Node]) {
        if self.entries.is_empty() {
            return;
        }

        let live: HashSet<NodeId> = nodes.iter().map(Node::id).collect();
        self.entries.retain(|id, res| {
            if live.contains(id) {
                return true;
            }
            log::trace!("releasing resources of node {id:?}");
            release(backend, res);
            false
        });
    }

    /// Position buffer holding `node.geometry()`, uploaded if stale.
    pub fn position_buffer<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        node: &Node,
    ) -> BufferId {
        let res = self.entries.entry(node.id()).or_insert_with(|| NodeResources {
            buffer: backend.create_buffer(node.geometry()),
            geometry_revision: node.geometry_revision(),
            texture: None,
        });

        if res.geometry_revision != node.geometry_revision() {
            backend.write_buffer(res.buffer, node.geometry());
            res.geometry_revision = node.geometry_revision();
        }

        res.buffer
    }

    /// Texture for `node.texture()`, uploaded if stale.
    ///
    /// Returns `None` (after releasing any previous upload) when the node has
    /// no texture. Call [`Self::position_buffer`] first so the entry exists.
    pub fn texture<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        node: &Node,
    ) -> Option<TextureId> {
        let res = self.entries.get_mut(&node.id())?;

        let Some(image) = node.texture() else {
            if let Some((old, _)) = res.texture.take() {
                backend.release_texture(old);
            }
            return None;
        };

        match res.texture {
            Some((id, revision)) if revision == node.texture_revision() => Some(id),
            stale => {
                if let Some((old, _)) = stale {
                    backend.release_texture(old);
                }
                let id = backend.create_texture(image);
                res.texture = Some((id, node.texture_revision()));
                Some(id)
            }
        }
    }

    /// Releases everything.
    pub fn clear<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        for (_, res) in self.entries.drain() {
            release(backend, &res);
        }
    }
}

fn release<B: RenderBackend + ?Sized>(backend: &mut B, res: &NodeResources) {
    backend.release_buffer(res.buffer);
    if let Some((texture, _)) = res.texture {
        backend.release_texture(texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageHandle;
    use crate::coords::Vec2;
    use crate::render::backend::{Command, HeadlessBackend};

    fn node() -> Node {
        Node::new(Vec2::new(10.0, 20.0))
    }

    #[test]
    fn buffer_created_once_and_rewritten_on_change() {
        let mut backend = HeadlessBackend::default();
        let mut cache = ResourceCache::new();
        let mut n = node();

        let a = cache.position_buffer(&mut backend, &n);
        let b = cache.position_buffer(&mut backend, &n);
        assert_eq!(a, b);
        assert_eq!(backend.count(|c| matches!(c, Command::CreateBuffer(_))), 1);
        assert_eq!(backend.count(|c| matches!(c, Command::WriteBuffer(_))), 0);

        n.set_size(Vec2::new(30.0, 40.0));
        let c = cache.position_buffer(&mut backend, &n);
        assert_eq!(a, c);
        assert_eq!(backend.count(|c| matches!(c, Command::WriteBuffer(_))), 1);
        assert_eq!(backend.buffer_data(c), Some(&n.geometry()[..]));
    }

    #[test]
    fn sweep_releases_missing_nodes_only() {
        let mut backend = HeadlessBackend::default();
        let mut cache = ResourceCache::new();
        let keep = node();
        let gone = node();
        cache.position_buffer(&mut backend, &keep);
        cache.position_buffer(&mut backend, &gone);

        cache.sweep(&mut backend, std::slice::from_ref(&keep));

        assert_eq!(cache.len(), 1);
        assert_eq!(backend.live_buffers(), 1);
    }

    #[test]
    fn texture_follows_node_attachment() {
        let mut backend = HeadlessBackend::default();
        let mut cache = ResourceCache::new();
        let mut n = node();
        cache.position_buffer(&mut backend, &n);

        assert!(cache.texture(&mut backend, &n).is_none());

        n.set_texture(ImageHandle::solid("a", 1, 1, [1; 4]));
        let first = cache.texture(&mut backend, &n).unwrap();
        assert_eq!(cache.texture(&mut backend, &n), Some(first));
        assert_eq!(backend.live_textures(), 1);

        n.set_texture(ImageHandle::solid("b", 1, 1, [2; 4]));
        let second = cache.texture(&mut backend, &n).unwrap();
        assert_ne!(first, second);
        assert_eq!(backend.live_textures(), 1);
        assert_eq!(backend.texture_image(second).map(ImageHandle::name), Some("b"));

        n.clear_texture();
        assert!(cache.texture(&mut backend, &n).is_none());
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn clear_releases_everything() {
        let mut backend = HeadlessBackend::default();
        let mut cache = ResourceCache::new();
        let mut n = node();
        n.set_texture(ImageHandle::solid("a", 1, 1, [0; 4]));
        cache.position_buffer(&mut backend, &n);
        cache.texture(&mut backend, &n);

        cache.clear(&mut backend);

        assert!(cache.is_empty());
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_textures(), 0);
    }
}
