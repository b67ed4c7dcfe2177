use core::fmt;

/// Render bucket a node belongs to.
///
/// Scene buckets and strategy dispatch are both keyed by this tag.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// Flat-colored quad.
    #[default]
    Color,
    /// Image-textured quad.
    Texture,
}

impl NodeKind {
    /// Every kind, in bucket order.
    pub const ALL: [NodeKind; 2] = [NodeKind::Color, NodeKind::Texture];

    pub const COUNT: usize = Self::ALL.len();

    /// Dense index used for bucket storage.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            NodeKind::Color => 0,
            NodeKind::Texture => 1,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Color => "COLOR",
            NodeKind::Texture => "TEXTURE",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_ordered() {
        for (i, kind) in NodeKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(NodeKind::COUNT, 2);
    }

    #[test]
    fn display_uses_tag_name() {
        assert_eq!(NodeKind::Color.to_string(), "COLOR");
        assert_eq!(NodeKind::Texture.to_string(), "TEXTURE");
    }
}
