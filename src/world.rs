use thiserror::Error;
use tracing::debug;
use tracing::trace;

use crate::WorldOffset;
use crate::evolve::EvolveError;
use crate::node::Level;
use crate::node::Node;
use crate::node::NodeError;
use crate::node::NodeId;
use crate::node::Quadrants;
use crate::pattern::Pattern;
use crate::render;
use crate::store::NodeStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldConfig {
    /// Once the store holds more than this many nodes after a generation, nodes unreachable from
    /// the root are dropped. `None` keeps every node for the lifetime of the world.
    pub gc_threshold: Option<usize>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Evolution error: {0}")]
    Evolve(#[from] EvolveError),
}

#[derive(Clone, Copy)]
enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

pub struct World {
    store: NodeStore,

    /// The whole universe. Everything outside its centered half is kept dead between generations.
    root: NodeId,

    generation: u64,
    config: WorldConfig,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world, made of a single dead leaf
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        let mut store = NodeStore::new();
        let root = store.intern_leaf(Quadrants::splat(false));

        Self {
            store,
            root,
            generation: 0,
            config,
        }
    }

    /// Create a world holding `pattern`, with the center of the pattern's enclosing power of two
    /// square at the origin.
    pub fn from_pattern(pattern: &Pattern) -> Result<Self, WorldError> {
        Self::from_pattern_with_config(pattern, WorldConfig::default())
    }

    pub fn from_pattern_with_config(
        pattern: &Pattern,
        config: WorldConfig,
    ) -> Result<Self, WorldError> {
        let mut world = Self::with_config(config);

        let tree = world.node_from_pattern(pattern)?;
        world.root = world.add_border(tree)?;

        debug!(
            width = pattern.width(),
            height = pattern.height(),
            level = world.level(),
            "Loaded pattern"
        );

        Ok(world)
    }

    /// Build the smallest node holding all of `pattern`, with the pattern in its top-left corner.
    pub fn node_from_pattern(&mut self, pattern: &Pattern) -> Result<NodeId, NodeError> {
        let side = pattern.width().max(pattern.height()).max(2).next_power_of_two();
        let level = (side.trailing_zeros() - 1) as Level;

        self.build(pattern, 0, 0, level)
    }

    /// Build the node of `level` whose top-left cell is `(x, y)` in `pattern`
    fn build(
        &mut self,
        pattern: &Pattern,
        x: usize,
        y: usize,
        level: Level,
    ) -> Result<NodeId, NodeError> {
        if x >= pattern.width() || y >= pattern.height() {
            return self.store.dead(level);
        }

        if level == 0 {
            let cells = Quadrants::new(
                pattern.get(x, y),
                pattern.get(x + 1, y),
                pattern.get(x, y + 1),
                pattern.get(x + 1, y + 1),
            );

            return Ok(self.store.intern_leaf(cells));
        }

        let half = 1 << level;
        let children = Quadrants::new(
            self.build(pattern, x, y, level - 1)?,
            self.build(pattern, x + half, y, level - 1)?,
            self.build(pattern, x, y + half, level - 1)?,
            self.build(pattern, x + half, y + half, level - 1)?,
        );

        self.store.intern_node(children)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    /// Level of the root. The world is `2^(level + 1)` cells on a side.
    pub fn level(&self) -> Level {
        self.store.level(self.root)
    }

    /// Number of generations computed so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> u64 {
        self.store.population(self.root)
    }

    /// Whether any living cell of `id` lies on its outermost ring of cells.
    ///
    /// Only the nodes along the border are visited, and dead nodes are skipped entirely.
    pub fn has_living_cell_on_edge(&self, id: NodeId) -> bool {
        [Side::Top, Side::Bottom, Side::Left, Side::Right]
            .into_iter()
            .any(|side| self.alive_on(id, side))
    }

    fn alive_on(&self, id: NodeId, side: Side) -> bool {
        if self.store.is_dead(id) {
            return false;
        }

        match *self.store.node(id) {
            Node::Leaf(c) => match side {
                Side::Top => c.nw || c.ne,
                Side::Bottom => c.sw || c.se,
                Side::Left => c.nw || c.sw,
                Side::Right => c.ne || c.se,
            },
            Node::Internal { children: q, .. } => {
                let (a, b) = match side {
                    Side::Top => (q.nw, q.ne),
                    Side::Bottom => (q.sw, q.se),
                    Side::Left => (q.nw, q.sw),
                    Side::Right => (q.ne, q.se),
                };

                self.alive_on(a, side) || self.alive_on(b, side)
            }
        }
    }

    /// The canonical all-dead node with the same level as `id`
    pub fn dead_duplicate_for(&mut self, id: NodeId) -> Result<NodeId, NodeError> {
        let level = self.store.level(id);

        self.store.dead(level)
    }

    /// Surround `id` with dead cells, returning a node one level up with `id` at its center.
    pub fn add_border(&mut self, id: NodeId) -> Result<NodeId, NodeError> {
        let quadrants = match *self.store.node(id) {
            Node::Leaf(c) => {
                let d = false;

                Quadrants::new(
                    self.store.intern_leaf(Quadrants::new(d, d, d, c.nw)),
                    self.store.intern_leaf(Quadrants::new(d, d, c.ne, d)),
                    self.store.intern_leaf(Quadrants::new(d, c.sw, d, d)),
                    self.store.intern_leaf(Quadrants::new(c.se, d, d, d)),
                )
            }
            Node::Internal { children: q, .. } => {
                let d = self.dead_duplicate_for(q.nw)?;

                Quadrants::new(
                    self.store.intern_node(Quadrants::new(d, d, d, q.nw))?,
                    self.store.intern_node(Quadrants::new(d, d, q.ne, d))?,
                    self.store.intern_node(Quadrants::new(d, q.sw, d, d))?,
                    self.store.intern_node(Quadrants::new(q.se, d, d, d))?,
                )
            }
        };

        self.store.intern_node(quadrants)
    }

    /// Advance the world by one generation.
    pub fn next_gen(&mut self) -> Result<(), WorldError> {
        if self.level() == 0 {
            self.root = self.add_border(self.root)?;
        }

        // Living cells only ever sit in the centered half of the root. If they reach the edge of
        // that half, the next generation could spill out of what `evolve` returns.
        let core = self.store.center(self.root)?;
        if self.has_living_cell_on_edge(core) {
            self.root = self.add_border(self.root)?;

            debug!(level = self.level(), "Grew world");
        }

        let evolved = self.store.evolve(self.root)?;
        self.root = self.add_border(evolved)?;
        self.generation += 1;

        let stats = self.store.stats();
        trace!(
            generation = self.generation,
            level = self.level(),
            nodes = self.store.len(),
            hits = stats.evolve_hits,
            misses = stats.evolve_misses,
            "Next generation"
        );

        if let Some(threshold) = self.config.gc_threshold
            && self.store.len() > threshold
        {
            self.collect_garbage()?;
        }

        Ok(())
    }

    /// Advance the world by `n` generations.
    pub fn step(&mut self, n: u64) -> Result<(), WorldError> {
        for _ in 0..n {
            self.next_gen()?;
        }

        Ok(())
    }

    /// Drop every node that the root does not reach.
    pub fn collect_garbage(&mut self) -> Result<(), WorldError> {
        let before = self.store.len();

        let (store, roots) = self.store.compact(&[self.root])?;
        self.store = store;
        self.root = roots[0];

        debug!(before, after = self.store.len(), "Collected unreachable nodes");

        Ok(())
    }

    /// Coordinates of every living cell relative to the center of the world, sorted by row then
    /// column. Coordinates do not move when the world grows.
    pub fn live_cells(&self) -> Vec<(WorldOffset, WorldOffset)> {
        let half = 1 << self.level();
        let mut cells = Vec::new();

        self.collect_cells(self.root, -half, -half, &mut cells);
        cells.sort_by_key(|&(x, y)| (y, x));

        cells
    }

    fn collect_cells(
        &self,
        id: NodeId,
        x: WorldOffset,
        y: WorldOffset,
        cells: &mut Vec<(WorldOffset, WorldOffset)>,
    ) {
        if self.store.is_dead(id) {
            return;
        }

        match *self.store.node(id) {
            Node::Leaf(c) => {
                let corners = [(0, 0, c.nw), (1, 0, c.ne), (0, 1, c.sw), (1, 1, c.se)];

                for (dx, dy, alive) in corners {
                    if alive {
                        cells.push((x + dx, y + dy));
                    }
                }
            }
            Node::Internal { level, children } => {
                let half = 1 << level;

                self.collect_cells(children.nw, x, y, cells);
                self.collect_cells(children.ne, x + half, y, cells);
                self.collect_cells(children.sw, x, y + half, cells);
                self.collect_cells(children.se, x + half, y + half, cells);
            }
        }
    }

    /// Smallest rectangle holding every living cell, as `(min_x, min_y, max_x, max_y)`
    /// inclusive. `None` for an empty world.
    pub fn bounding_box(&self) -> Option<(WorldOffset, WorldOffset, WorldOffset, WorldOffset)> {
        let cells = self.live_cells();
        let (&(x, y), rest) = cells.split_first()?;

        Some(rest.iter().fold((x, y, x, y), |(x0, y0, x1, y1), &(x, y)| {
            (x0.min(x), y0.min(y), x1.max(x), y1.max(y))
        }))
    }

    /// The living part of the world, cropped to its bounding box
    pub fn snapshot(&self) -> Pattern {
        let Some((x0, y0, x1, y1)) = self.bounding_box() else {
            return Pattern::new(0, 0);
        };

        let mut pattern = Pattern::new((x1 - x0 + 1) as usize, (y1 - y0 + 1) as usize);
        for (x, y) in self.live_cells() {
            pattern.set((x - x0) as usize, (y - y0) as usize, true);
        }

        pattern
    }

    /// The whole world as lines of `1` and `0`
    pub fn render(&self) -> String {
        render::to_text(&self.store, self.root)
    }
}
