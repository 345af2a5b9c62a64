//! Static neighbour graph consumed by the solver.

use crate::{BoundaryCondition, WfcError};

/// Adjacency of every node, one optional neighbour per fixed direction.
///
/// Stored flat (`node * arity + direction`). `opposite[d]` names the
/// direction that points back from the neighbour, and must be an involution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    node_count: usize,
    arity: usize,
    neighbors: Vec<Option<usize>>,
    opposite: Vec<usize>,
}

/// Grid offsets in axis order `+x, -x, +y, -y, +z, -z`.
const GRID_OFFSETS: [(isize, isize, isize); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

impl Topology {
    /// Builds a topology from explicit per-node neighbour lists.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::Topology` when a list has the wrong length, a
    /// neighbour index is out of range, or `opposite` is not a permutation
    /// that undoes itself.
    pub fn new(neighbors: Vec<Vec<Option<usize>>>, opposite: Vec<usize>) -> Result<Self, WfcError> {
        let node_count = neighbors.len();
        let arity = opposite.len();
        for (direction, &back) in opposite.iter().enumerate() {
            if back >= arity || opposite[back] != direction {
                return Err(WfcError::Topology(format!(
                    "opposite direction table is not an involution at direction {direction}"
                )));
            }
        }
        let mut flat = Vec::with_capacity(node_count * arity);
        for (node, list) in neighbors.into_iter().enumerate() {
            if list.len() != arity {
                return Err(WfcError::Topology(format!(
                    "node {node} lists {} neighbours, expected {arity}",
                    list.len()
                )));
            }
            if let Some(bad) = list.iter().flatten().find(|&&n| n >= node_count) {
                return Err(WfcError::Topology(format!(
                    "node {node} references neighbour {bad} outside 0..{node_count}"
                )));
            }
            flat.extend(list);
        }
        Ok(Self {
            node_count,
            arity,
            neighbors: flat,
            opposite,
        })
    }

    /// Builds a dense grid of `width * height * depth` nodes.
    ///
    /// A single layer gets the four planar directions; anything deeper gets six.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::Topology` if any dimension is zero.
    pub fn grid(
        width: usize,
        height: usize,
        depth: usize,
        boundary: BoundaryCondition,
    ) -> Result<Self, WfcError> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(WfcError::Topology(format!(
                "grid dimensions must be non-zero, got {width}x{height}x{depth}"
            )));
        }
        let arity = if depth == 1 { 4 } else { 6 };
        let dims = [width, height, depth];
        let node_count = width * height * depth;
        let mut neighbors = Vec::with_capacity(node_count * arity);

        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    let coords = [x, y, z];
                    for &(dx, dy, dz) in GRID_OFFSETS.iter().take(arity) {
                        let mut target = [0usize; 3];
                        let mut inside = true;
                        for (axis, delta) in [dx, dy, dz].into_iter().enumerate() {
                            match step(coords[axis], delta, dims[axis], boundary) {
                                Some(value) => target[axis] = value,
                                None => inside = false,
                            }
                        }
                        neighbors.push(inside.then(|| {
                            target[2] * width * height + target[1] * width + target[0]
                        }));
                    }
                }
            }
        }

        Ok(Self {
            node_count,
            arity,
            neighbors,
            opposite: (0..arity).map(|d| d ^ 1).collect(),
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of directions per node.
    pub fn arity(&self) -> usize {
        self.arity
    }

    #[inline]
    pub fn neighbor(&self, node: usize, direction: usize) -> Option<usize> {
        self.neighbors[node * self.arity + direction]
    }

    /// Existing neighbours of `node` as `(direction, neighbour)` pairs.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors[node * self.arity..(node + 1) * self.arity]
            .iter()
            .enumerate()
            .filter_map(|(direction, n)| n.map(|n| (direction, n)))
    }

    #[inline]
    pub fn opposite(&self, direction: usize) -> usize {
        self.opposite[direction]
    }

    /// True when every edge `a -d-> b` has the matching `b -opposite(d)-> a`.
    pub fn is_symmetric(&self) -> bool {
        (0..self.node_count).all(|node| {
            self.neighbors(node)
                .all(|(direction, n)| self.neighbor(n, self.opposite(direction)) == Some(node))
        })
    }
}

fn step(value: usize, delta: isize, size: usize, boundary: BoundaryCondition) -> Option<usize> {
    match delta {
        0 => Some(value),
        1 if value + 1 < size => Some(value + 1),
        -1 if value > 0 => Some(value - 1),
        _ => match boundary {
            BoundaryCondition::Periodic => Some(if delta > 0 { 0 } else { size - 1 }),
            BoundaryCondition::Finite => None,
        },
    }
}
