use crate::node::Node;
use crate::node::NodeId;
use crate::pattern::Pattern;
use crate::store::NodeStore;

/// Hex values of braille dots
///
/// ```text
///  1   8
///  2  10
///  4  20
/// 40  80
/// ```
///
/// Where the base blank pattern is codepoint `0x2800` (or U+2800)
///
/// To get other configurations, just add the numbers above.
const BRAILLE_EMPTY: u32 = 0x2800;

/// Rows of the region under `id`, with `alive` and `dead` standing for each cell.
///
/// Leaves give two rows of two characters, and an internal node glues the rows of its children
/// side by side, `nw` next to `ne` above `sw` next to `se`.
pub fn rows(store: &NodeStore, id: NodeId, alive: char, dead: char) -> Vec<String> {
    let c = |b: bool| if b { alive } else { dead };

    match *store.node(id) {
        Node::Leaf(cells) => vec![
            [c(cells.nw), c(cells.ne)].iter().collect(),
            [c(cells.sw), c(cells.se)].iter().collect(),
        ],
        Node::Internal { children, .. } => {
            let side = |w: NodeId, e: NodeId| {
                rows(store, w, alive, dead)
                    .into_iter()
                    .zip(rows(store, e, alive, dead))
                    .map(|(w, e)| w + &e)
            };

            side(children.nw, children.ne)
                .chain(side(children.sw, children.se))
                .collect()
        }
    }
}

/// The region under `id` as lines of `1` (alive) and `0` (dead), each ending in a newline.
pub fn to_text(store: &NodeStore, id: NodeId) -> String {
    let mut text = String::new();

    for row in rows(store, id, '1', '0') {
        text.push_str(&row);
        text.push('\n');
    }

    text
}

/// Draw a pattern with braille characters, each covering a 2x4 block of cells.
pub fn to_braille(pattern: &Pattern) -> String {
    let (bw, bh) = (pattern.width().div_ceil(2), pattern.height().div_ceil(4));
    let mut cp = vec![BRAILLE_EMPTY; bw * bh];

    for (x, y) in pattern.live_cells() {
        cp[(y / 4) * bw + (x / 2)] += dot(x, y);
    }

    // Each braille character is 3 bytes, and each line ends with a newline.
    let mut fb = String::with_capacity(3 * (bw * bh) + bh);

    for line in cp.chunks(bw.max(1)) {
        fb.extend(line.iter().filter_map(|&c| char::from_u32(c)));
        fb.push('\n');
    }

    fb
}

fn dot(x: usize, y: usize) -> u32 {
    match (x % 2, y % 4) {
        (0, 0) => 0x1,
        (1, 0) => 0x8,
        (0, 1) => 0x2,
        (1, 1) => 0x10,
        (0, 2) => 0x4,
        (1, 2) => 0x20,
        (0, 3) => 0x40,
        (1, 3) => 0x80,
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::Quadrants;

    fn sample(store: &mut NodeStore) -> NodeId {
        let nw = store.intern_leaf(Quadrants::new(false, false, false, true));
        let ne = store.intern_leaf(Quadrants::new(false, false, false, false));
        let sw = store.intern_leaf(Quadrants::new(false, true, false, true));

        store.intern_node(Quadrants::new(nw, ne, sw, ne)).unwrap()
    }

    #[test]
    fn text_of_a_level_1_node() {
        let mut store = NodeStore::new();
        let id = sample(&mut store);

        assert_eq!(to_text(&store, id), "0000\n0100\n0100\n0100\n");
    }

    #[test]
    fn custom_characters() {
        let mut store = NodeStore::new();
        let id = sample(&mut store);

        assert_eq!(rows(&store, id, '#', '.')[1], ".#..");
    }

    #[test]
    fn braille_dots() {
        let mut p = Pattern::new(3, 4);
        p.set(0, 0, true);
        p.set(1, 3, true);
        p.set(2, 1, true);

        let s = to_braille(&p);

        let expected: String = [0x2800 + 0x1 + 0x80, 0x2800 + 0x2]
            .iter()
            .filter_map(|&c| char::from_u32(c))
            .chain(std::iter::once('\n'))
            .collect();

        assert_eq!(s, expected);
    }
}
