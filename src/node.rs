use std::fmt;

use thiserror::Error;

/// Level of a node in the quadtree. A node of level `n` covers a square of `2^(n + 1)` cells on a
/// side, so leaves (level `0`) are 2x2 blocks.
pub type Level = u8;

/// Handle to a canonical node inside a [`NodeStore`](crate::store::NodeStore).
///
/// Handles are only meaningful for the store that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "Out of node handles!");

        Self(index as u32)
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The four quadrants of a square region, in `nw, ne, sw, se` order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Quadrants<T> {
    pub nw: T,
    pub ne: T,
    pub sw: T,
    pub se: T,
}

impl<T> Quadrants<T> {
    pub const fn new(nw: T, ne: T, sw: T, se: T) -> Self {
        Self { nw, ne, sw, se }
    }

    pub fn map<U, F>(self, mut f: F) -> Quadrants<U>
    where
        F: FnMut(T) -> U,
    {
        Quadrants {
            nw: f(self.nw),
            ne: f(self.ne),
            sw: f(self.sw),
            se: f(self.se),
        }
    }

    pub fn to_array(self) -> [T; 4] {
        [self.nw, self.ne, self.sw, self.se]
    }
}

impl<T: Copy> Quadrants<T> {
    /// All four quadrants set to `value`
    pub const fn splat(value: T) -> Self {
        Self {
            nw: value,
            ne: value,
            sw: value,
            se: value,
        }
    }
}

impl<T, E> Quadrants<Result<T, E>> {
    /// Turns four results into the result of four values, failing on the first error in `nw, ne,
    /// sw, se` order.
    pub fn transpose(self) -> Result<Quadrants<T>, E> {
        Ok(Quadrants {
            nw: self.nw?,
            ne: self.ne?,
            sw: self.sw?,
            se: self.se?,
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("Quadrant levels differ: nw={} ne={} sw={} se={}", .levels.nw, .levels.ne, .levels.sw, .levels.se)]
    InvariantViolation { levels: Quadrants<Level> },

    #[error("Node {id} is a leaf and has no child nodes")]
    NotInternal { id: NodeId },

    #[error("Node {id} is at the maximum level {level} and cannot grow")]
    LevelOverflow { id: NodeId, level: Level },
}

/// Content-derived key of a node.
///
/// Internal fingerprints are built from the handles of their children. Since children are
/// canonical, equal handles mean equal content, so the key stays fixed width at every level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Cells packed as `nw ne sw se`, from most to least significant bit
    Leaf(u8),
    Internal(Quadrants<NodeId>),
}

impl Fingerprint {
    fn leaf(cells: Quadrants<bool>) -> Self {
        let Quadrants { nw, ne, sw, se } = cells;

        Fingerprint::Leaf((nw as u8) << 3 | (ne as u8) << 2 | (sw as u8) << 1 | se as u8)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Leaf(bits) => write!(f, "{bits:04b}"),
            Fingerprint::Internal(Quadrants { nw, ne, sw, se }) => {
                write!(f, "[{nw} {ne} {sw} {se}]")
            }
        }
    }
}

/// A quadtree node. Immutable once built; deduplication is left to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    /// A 2x2 block of cells
    Leaf(Quadrants<bool>),

    /// A square of `2^(level + 1)` cells made of four nodes of level `level - 1`
    Internal {
        level: Level,
        children: Quadrants<NodeId>,
    },
}

impl Node {
    pub const fn leaf(nw: bool, ne: bool, sw: bool, se: bool) -> Self {
        Node::Leaf(Quadrants::new(nw, ne, sw, se))
    }

    /// Build an internal node from four children whose levels are given by `levels`.
    pub fn internal(
        children: Quadrants<NodeId>,
        levels: Quadrants<Level>,
    ) -> Result<Self, NodeError> {
        let Quadrants { nw, ne, sw, se } = levels;

        if nw != ne || nw != sw || nw != se {
            return Err(NodeError::InvariantViolation { levels });
        }

        let level = nw.checked_add(1).ok_or(NodeError::LevelOverflow {
            id: children.nw,
            level: nw,
        })?;

        Ok(Node::Internal { level, children })
    }

    pub const fn level(&self) -> Level {
        match self {
            Node::Leaf(_) => 0,
            Node::Internal { level, .. } => *level,
        }
    }

    pub const fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn fingerprint(&self) -> Fingerprint {
        match *self {
            Node::Leaf(cells) => Fingerprint::leaf(cells),
            Node::Internal { children, .. } => Fingerprint::Internal(children),
        }
    }

    pub const fn children(&self) -> Option<Quadrants<NodeId>> {
        match self {
            Node::Leaf(_) => None,
            Node::Internal { children, .. } => Some(*children),
        }
    }
}
