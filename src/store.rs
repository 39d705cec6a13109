use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;

use crate::node::Fingerprint;
use crate::node::Level;
use crate::node::Node;
use crate::node::NodeError;
use crate::node::NodeId;
use crate::node::Quadrants;

/// Counters describing how the store has been used. Only ever increase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of intern requests
    pub lookups: u64,

    /// Number of intern requests that created a new canonical node
    pub inserts: u64,

    /// Number of evolutions answered from a memoized result
    pub evolve_hits: u64,

    /// Number of evolutions that had to be computed
    pub evolve_misses: u64,
}

struct Entry {
    node: Node,

    /// Whether every cell under this node is dead
    empty: bool,

    /// The evolved center of this node, one generation later. Written at most once.
    result: Option<NodeId>,
}

/// Canonical set of quadtree nodes.
///
/// Every distinct region is stored exactly once, and is referred to through its [`NodeId`]. Two
/// regions with the same content always get the same handle, so comparing handles compares
/// content.
#[derive(Default)]
pub struct NodeStore {
    /// This is where all of our memory goes
    entries: Vec<Entry>,

    /// Fingerprint to index of the canonical node in `entries`
    index: HashMap<Fingerprint, NodeId>,

    /// `dead[l]` is the canonical all-dead node of level `l`, once it has been asked for
    dead: Vec<NodeId>,

    pub(crate) stats: StoreStats,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of canonical nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.entries[id.index()].node
    }

    pub fn level(&self, id: NodeId) -> Level {
        self.node(id).level()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).is_leaf()
    }

    pub fn fingerprint(&self, id: NodeId) -> Fingerprint {
        self.node(id).fingerprint()
    }

    /// Whether the region under `id` holds no living cell
    pub fn is_dead(&self, id: NodeId) -> bool {
        self.entries[id.index()].empty
    }

    /// Children of an internal node
    pub fn children(&self, id: NodeId) -> Result<Quadrants<NodeId>, NodeError> {
        self.node(id).children().ok_or(NodeError::NotInternal { id })
    }

    /// Return the canonical leaf with the given cells, creating it if needed.
    pub fn intern_leaf(&mut self, cells: Quadrants<bool>) -> NodeId {
        let node = Node::Leaf(cells);
        let empty = !(cells.nw || cells.ne || cells.sw || cells.se);

        self.intern(node, empty)
    }

    /// Return the canonical node with the given children, creating it if needed.
    ///
    /// Fails if the children are not all of the same level.
    pub fn intern_node(&mut self, children: Quadrants<NodeId>) -> Result<NodeId, NodeError> {
        let node = Node::internal(children, children.map(|c| self.level(c)))?;
        let empty = children.to_array().iter().all(|&c| self.is_dead(c));

        Ok(self.intern(node, empty))
    }

    fn intern(&mut self, node: Node, empty: bool) -> NodeId {
        self.stats.lookups += 1;

        match self.index.entry(node.fingerprint()) {
            MapEntry::Occupied(e) => *e.get(),
            MapEntry::Vacant(e) => {
                let id = NodeId::from_index(self.entries.len());

                self.entries.push(Entry {
                    node,
                    empty,
                    result: None,
                });
                self.stats.inserts += 1;

                *e.insert(id)
            }
        }
    }

    /// The canonical all-dead node of `level`.
    pub fn dead(&mut self, level: Level) -> Result<NodeId, NodeError> {
        if let Some(&id) = self.dead.get(level as usize) {
            return Ok(id);
        }

        // Build bottom-up, doubling one level at a time
        let mut id = match self.dead.last() {
            Some(&id) => id,
            None => {
                let id = self.intern_leaf(Quadrants::splat(false));
                self.dead.push(id);
                id
            }
        };

        while self.dead.len() <= level as usize {
            id = self.intern_node(Quadrants::splat(id))?;
            self.dead.push(id);
        }

        Ok(id)
    }

    /// Given four same-level nodes laid out as the quadrants of a larger square, return the node
    /// covering exactly the center of that square. The result has the same level as the inputs.
    pub fn center_of(&mut self, quadrants: Quadrants<NodeId>) -> Result<NodeId, NodeError> {
        let nodes = quadrants.map(|id| *self.node(id));

        match nodes.to_array() {
            [Node::Leaf(nw), Node::Leaf(ne), Node::Leaf(sw), Node::Leaf(se)] => {
                Ok(self.intern_leaf(Quadrants::new(nw.se, ne.sw, sw.ne, se.nw)))
            }
            [
                Node::Internal { children: nw, .. },
                Node::Internal { children: ne, .. },
                Node::Internal { children: sw, .. },
                Node::Internal { children: se, .. },
            ] => self.intern_node(Quadrants::new(nw.se, ne.sw, sw.ne, se.nw)),
            _ => Err(NodeError::InvariantViolation {
                levels: nodes.map(|n| n.level()),
            }),
        }
    }

    /// The centered node one level below `id`.
    pub fn center(&mut self, id: NodeId) -> Result<NodeId, NodeError> {
        let children = self.children(id)?;

        self.center_of(children)
    }

    /// The memoized evolution of `id`, if it has been computed
    pub fn result(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id.index()].result
    }

    /// Memoize the evolution of `id`. The slot is write-once: later writes are ignored.
    pub(crate) fn set_result(&mut self, id: NodeId, result: NodeId) {
        let slot = &mut self.entries[id.index()].result;

        debug_assert!(
            slot.is_none_or(|r| r == result),
            "Memoized result of {id} changed"
        );

        slot.get_or_insert(result);
    }

    /// Number of living cells under `id`
    pub fn population(&self, id: NodeId) -> u64 {
        let mut seen = HashMap::new();

        self.population_memo(id, &mut seen)
    }

    fn population_memo(&self, id: NodeId, seen: &mut HashMap<NodeId, u64>) -> u64 {
        if self.is_dead(id) {
            return 0;
        }

        if let Some(&n) = seen.get(&id) {
            return n;
        }

        let n = match *self.node(id) {
            Node::Leaf(cells) => cells.to_array().iter().filter(|&&c| c).count() as u64,
            Node::Internal { children, .. } => children
                .to_array()
                .iter()
                .map(|&c| self.population_memo(c, seen))
                .sum(),
        };

        seen.insert(id, n);

        n
    }

    /// Build a new store holding only the nodes reachable from `roots`.
    ///
    /// Returns the new store along with the handles of `roots` in it, in the same order.
    /// Memoized results are kept whenever their target survives.
    pub fn compact(&self, roots: &[NodeId]) -> Result<(NodeStore, Vec<NodeId>), NodeError> {
        let mut fresh = NodeStore {
            stats: self.stats,
            ..NodeStore::default()
        };
        let mut remap = HashMap::new();

        let roots = roots
            .iter()
            .map(|&root| fresh.copy_from(self, root, &mut remap))
            .collect::<Result<Vec<_>, _>>()?;

        for (&old, &new) in &remap {
            if let Some(res) = self.result(old)
                && let Some(&res) = remap.get(&res)
            {
                fresh.set_result(new, res);
            }
        }

        Ok((fresh, roots))
    }

    fn copy_from(
        &mut self,
        other: &NodeStore,
        id: NodeId,
        remap: &mut HashMap<NodeId, NodeId>,
    ) -> Result<NodeId, NodeError> {
        if let Some(&new) = remap.get(&id) {
            return Ok(new);
        }

        let new = match *other.node(id) {
            Node::Leaf(cells) => self.intern_leaf(cells),
            Node::Internal { children, .. } => {
                let children = children
                    .map(|c| self.copy_from(other, c, remap))
                    .transpose()?;

                self.intern_node(children)?
            }
        };

        remap.insert(id, new);

        Ok(new)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn leaf(store: &mut NodeStore, bits: [u8; 4]) -> NodeId {
        let [nw, ne, sw, se] = bits.map(|b| b == 1);

        store.intern_leaf(Quadrants::new(nw, ne, sw, se))
    }

    #[test]
    fn interning_a_leaf_twice_returns_the_same_handle() {
        let mut store = NodeStore::new();

        let a = leaf(&mut store, [0, 1, 1, 0]);
        let b = leaf(&mut store, [0, 1, 1, 0]);
        let c = leaf(&mut store, [1, 1, 1, 0]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn interning_the_same_composition_inserts_once() {
        let mut store = NodeStore::new();
        let a = leaf(&mut store, [0, 0, 0, 1]);
        let b = leaf(&mut store, [0, 0, 0, 0]);
        let before = store.stats().inserts;

        let ids: Vec<_> = (0..3)
            .map(|_| store.intern_node(Quadrants::new(a, b, a, b)).unwrap())
            .collect();

        assert!(ids.iter().all(|&id| id == ids[0]));
        assert_eq!(store.stats().inserts - before, 1);
        assert_eq!(store.level(ids[0]), 1);
    }

    #[test]
    fn intern_node_rejects_mixed_levels() {
        let mut store = NodeStore::new();
        let a = leaf(&mut store, [0, 0, 0, 0]);
        let b = store.intern_node(Quadrants::splat(a)).unwrap();

        let err = store.intern_node(Quadrants::new(a, b, a, a)).unwrap_err();

        assert_eq!(
            err,
            NodeError::InvariantViolation {
                levels: Quadrants::new(0, 1, 0, 0)
            }
        );
    }

    #[test]
    fn dead_nodes_are_canonical() {
        let mut store = NodeStore::new();

        let d3 = store.dead(3).unwrap();
        let d1 = store.dead(1).unwrap();

        assert_eq!(store.level(d3), 3);
        assert_eq!(store.level(d1), 1);
        assert_eq!(store.dead(3).unwrap(), d3);
        assert!(store.is_dead(d3));

        let d0 = leaf(&mut store, [0, 0, 0, 0]);
        assert_eq!(store.intern_node(Quadrants::splat(d0)).unwrap(), d1);
    }

    #[test]
    fn center_of_leaves() {
        // 0000
        // 0100
        // 0100
        // 0100
        let mut store = NodeStore::new();
        let nw = leaf(&mut store, [0, 0, 0, 1]);
        let ne = leaf(&mut store, [0, 0, 0, 0]);
        let sw = leaf(&mut store, [0, 1, 0, 1]);
        let se = leaf(&mut store, [0, 0, 0, 0]);

        let center = store.center_of(Quadrants::new(nw, ne, sw, se)).unwrap();

        assert_eq!(*store.node(center), Node::leaf(true, false, true, false));
        assert_eq!(store.fingerprint(center).to_string(), "1010");
    }

    #[test]
    fn center_of_mixed_levels_fails() {
        let mut store = NodeStore::new();
        let a = store.dead(0).unwrap();
        let b = store.dead(1).unwrap();

        assert!(store.center_of(Quadrants::new(a, a, a, b)).is_err());
    }

    #[test]
    fn center_of_a_leaf_fails() {
        let mut store = NodeStore::new();
        let a = leaf(&mut store, [1, 0, 0, 1]);

        assert_eq!(store.center(a), Err(NodeError::NotInternal { id: a }));
    }

    #[test]
    fn population_counts_shared_children_once_per_use() {
        let mut store = NodeStore::new();
        let a = leaf(&mut store, [1, 0, 1, 1]);
        let node = store.intern_node(Quadrants::splat(a)).unwrap();
        let root = store.intern_node(Quadrants::splat(node)).unwrap();

        assert_eq!(store.population(root), 48);
    }

    #[test]
    fn result_slot_is_write_once() {
        let mut store = NodeStore::new();
        let a = leaf(&mut store, [1, 0, 0, 0]);
        let b = store.intern_node(Quadrants::splat(a)).unwrap();

        assert_eq!(store.result(b), None);
        store.set_result(b, a);
        store.set_result(b, a);
        assert_eq!(store.result(b), Some(a));
    }

    #[test]
    fn compact_keeps_only_reachable_nodes() {
        let mut store = NodeStore::new();
        let a = leaf(&mut store, [1, 0, 0, 0]);
        let b = leaf(&mut store, [0, 1, 0, 0]);
        let dead = leaf(&mut store, [0, 0, 0, 0]);
        let _unreachable = store.intern_node(Quadrants::splat(b)).unwrap();
        let root = store.intern_node(Quadrants::new(a, dead, dead, a)).unwrap();

        let (fresh, roots) = store.compact(&[root]).unwrap();

        assert_eq!(fresh.len(), 3);
        assert_eq!(fresh.population(roots[0]), 2);
        assert_eq!(fresh.level(roots[0]), 1);
    }
}
