use thiserror::Error;

use crate::node::Level;
use crate::node::Node;
use crate::node::NodeError;
use crate::node::NodeId;
use crate::node::Quadrants;
use crate::rules;
use crate::store::NodeStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvolveError {
    #[error("Cannot evolve node {id} of level {level}, a level of at least 1 is required")]
    InvalidLevel { id: NodeId, level: Level },

    /// Unreachable through `intern_node`, which only builds level 1 nodes out of leaves
    #[error("Node {id} is at level 1 but its child {child} is not a leaf")]
    NotLeafStructure { id: NodeId, child: NodeId },

    #[error("Node error: {0}")]
    Node(#[from] NodeError),
}

impl NodeStore {
    /// Compute the centered node one level below `id`, one generation later.
    ///
    /// Results are memoized on the node, so any region seen before is answered immediately.
    pub fn evolve(&mut self, id: NodeId) -> Result<NodeId, EvolveError> {
        if let Some(res) = self.result(id) {
            self.stats.evolve_hits += 1;
            return Ok(res);
        }

        self.stats.evolve_misses += 1;

        let res = match self.level(id) {
            0 => return Err(EvolveError::InvalidLevel { id, level: 0 }),
            1 => self.evolve_block(id)?,
            _ => self.evolve_node(id)?,
        };

        self.set_result(id, res);

        Ok(res)
    }

    /// Base case: a level 1 node is a 4x4 block of cells, and its center is stepped directly.
    fn evolve_block(&mut self, id: NodeId) -> Result<NodeId, EvolveError> {
        let children = self.children(id)?;

        let mut block = 0;
        let quadrants = children.to_array();

        for (i, child) in quadrants.into_iter().enumerate() {
            let Node::Leaf(cells) = *self.node(child) else {
                return Err(EvolveError::NotLeafStructure { id, child });
            };

            // top-left corner of this leaf in the block
            let (row, col) = (i / 2 * 2, i % 2 * 2);

            for (j, alive) in cells.to_array().into_iter().enumerate() {
                if alive {
                    block |= rules::bit(row + j / 2, col + j % 2);
                }
            }
        }

        let [nw, ne, sw, se] = rules::step_block(block);

        Ok(self.intern_leaf(Quadrants::new(nw, ne, sw, se)))
    }

    /// Recursive case.
    ///
    /// The node is covered by nine overlapping half-size nodes
    /// ```notrust
    ///   n00 n01 n02
    ///   n10 n11 n12
    ///   n20 n21 n22
    /// ```
    /// each of which is evolved. The nine results are regrouped four at a time into the quadrants
    /// of the answer, and the center of each quadrant is kept.
    fn evolve_node(&mut self, id: NodeId) -> Result<NodeId, EvolveError> {
        let Quadrants { nw, ne, sw, se } = self.children(id)?;
        let [a, b, c, d] = [nw, ne, sw, se].map(|q| self.children(q));
        let (a, b, c, d) = (a?, b?, c?, d?);

        let n00 = nw;
        let n01 = self.intern_node(Quadrants::new(a.ne, b.nw, a.se, b.sw))?;
        let n02 = ne;
        let n10 = self.intern_node(Quadrants::new(a.sw, a.se, c.nw, c.ne))?;
        let n11 = self.intern_node(Quadrants::new(a.se, b.sw, c.ne, d.nw))?;
        let n12 = self.intern_node(Quadrants::new(b.sw, b.se, d.nw, d.ne))?;
        let n20 = sw;
        let n21 = self.intern_node(Quadrants::new(c.ne, d.nw, c.se, d.sw))?;
        let n22 = se;

        let [r00, r01, r02, r10, r11, r12, r20, r21, r22] = [
            self.evolve(n00)?,
            self.evolve(n01)?,
            self.evolve(n02)?,
            self.evolve(n10)?,
            self.evolve(n11)?,
            self.evolve(n12)?,
            self.evolve(n20)?,
            self.evolve(n21)?,
            self.evolve(n22)?,
        ];

        let nw = self.intern_node(Quadrants::new(r00, r01, r10, r11))?;
        let ne = self.intern_node(Quadrants::new(r01, r02, r11, r12))?;
        let sw = self.intern_node(Quadrants::new(r10, r11, r20, r21))?;
        let se = self.intern_node(Quadrants::new(r11, r12, r21, r22))?;

        let quadrants = Quadrants::new(
            self.center(nw)?,
            self.center(ne)?,
            self.center(sw)?,
            self.center(se)?,
        );

        Ok(self.intern_node(quadrants)?)
    }
}
