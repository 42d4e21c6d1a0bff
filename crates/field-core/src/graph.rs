//! Immutable node/edge topology shared by the pulse and routing engines.

use glam::Vec3;
use smallvec::SmallVec;

use crate::error::ConstructionError;

pub type NodeId = u32;
pub type EdgeId = u32;

/// Edge indices touching one node. Layered and grid graphs rarely exceed a
/// handful per node, so these stay inline.
pub type EdgeList = SmallVec<[EdgeId; 8]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
}

impl Edge {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        Self { a, b }
    }
}

#[derive(Clone, Debug)]
pub struct Graph {
    positions: Vec<Vec3>,
    groups: Vec<u32>,
    edges: Vec<Edge>,
    outgoing: Vec<EdgeList>,
    incoming: Vec<EdgeList>,
    incident: Vec<EdgeList>,
}

impl Graph {
    /// Validate and index a graph. Fails on empty node sets, dangling edges and
    /// zero-length edges.
    pub fn new(
        positions: Vec<Vec3>,
        groups: Vec<u32>,
        edges: Vec<Edge>,
    ) -> Result<Self, ConstructionError> {
        let n = positions.len();
        if n == 0 {
            return Err(ConstructionError::EmptyGraph);
        }
        if groups.len() != n {
            return Err(ConstructionError::ColumnLength {
                name: "graph",
                column: "groups",
                actual: groups.len(),
                expected: n,
            });
        }

        let mut outgoing = vec![EdgeList::new(); n];
        let mut incoming = vec![EdgeList::new(); n];
        let mut incident = vec![EdgeList::new(); n];
        for (i, e) in edges.iter().enumerate() {
            for node in [e.a, e.b] {
                if node as usize >= n {
                    return Err(ConstructionError::DanglingEdge {
                        edge: i,
                        node,
                        node_count: n,
                    });
                }
            }
            if positions[e.a as usize].distance_squared(positions[e.b as usize]) == 0.0 {
                return Err(ConstructionError::ZeroLengthEdge { edge: i });
            }
            let id = i as EdgeId;
            outgoing[e.a as usize].push(id);
            incoming[e.b as usize].push(id);
            incident[e.a as usize].push(id);
            incident[e.b as usize].push(id);
        }

        log::debug!("[graph] {} nodes, {} edges", n, edges.len());
        Ok(Self {
            positions,
            groups,
            edges,
            outgoing,
            incoming,
            incident,
        })
    }

    /// Stacked grids of nodes, one grid per `(rows, cols)` layer.
    ///
    /// Layers are spread along X (`layer_gap` apart, centred on the origin);
    /// rows go along Y and columns along Z. Every node is connected to every
    /// node in the next layer.
    pub fn layered(
        layers: &[(u32, u32)],
        layer_gap: f32,
        row_gap: f32,
        col_gap: f32,
    ) -> Result<Self, ConstructionError> {
        let mut positions = Vec::new();
        let mut groups = Vec::new();
        let mut spans = Vec::with_capacity(layers.len());
        let mid = (layers.len() as f32 - 1.0) / 2.0;
        for (li, &(rows, cols)) in layers.iter().enumerate() {
            let start = positions.len() as NodeId;
            let x = (li as f32 - mid) * layer_gap;
            for row in 0..rows {
                for col in 0..cols {
                    let y = (row as f32 - (rows as f32 - 1.0) / 2.0) * row_gap;
                    let z = (col as f32 - (cols as f32 - 1.0) / 2.0) * col_gap;
                    positions.push(Vec3::new(x, y, z));
                    groups.push(li as u32);
                }
            }
            spans.push(start..positions.len() as NodeId);
        }

        let mut edges = Vec::new();
        for pair in spans.windows(2) {
            for a in pair[0].clone() {
                for b in pair[1].clone() {
                    edges.push(Edge::new(a, b));
                }
            }
        }
        Self::new(positions, groups, edges)
    }

    /// Square street grid of `size × size` intersections `cell` apart, centred
    /// on the origin in the XZ plane, plus extra straight segments given as
    /// `[row_a, col_a, row_b, col_b]`.
    pub fn grid(size: u32, cell: f32, diagonals: &[[u32; 4]]) -> Result<Self, ConstructionError> {
        let half = (size as f32 - 1.0) * cell / 2.0;
        let id = |row: u32, col: u32| row * size + col;

        let mut positions = Vec::with_capacity((size * size) as usize);
        for row in 0..size {
            for col in 0..size {
                positions.push(Vec3::new(col as f32 * cell - half, 0.0, row as f32 * cell - half));
            }
        }
        let groups = vec![0; positions.len()];

        let mut edges = Vec::new();
        for row in 0..size {
            for col in 0..size {
                if col + 1 < size {
                    edges.push(Edge::new(id(row, col), id(row, col + 1)));
                }
                if row + 1 < size {
                    edges.push(Edge::new(id(row, col), id(row + 1, col)));
                }
            }
        }
        for &[r1, c1, r2, c2] in diagonals {
            edges.push(Edge::new(id(r1, c1), id(r2, c2)));
        }
        Self::new(positions, groups, edges)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn position(&self, node: NodeId) -> Vec3 {
        self.positions[node as usize]
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn group(&self, node: NodeId) -> u32 {
        self.groups[node as usize]
    }

    #[inline]
    pub fn edge(&self, edge: EdgeId) -> Edge {
        self.edges[edge as usize]
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn outgoing(&self, node: NodeId) -> &[EdgeId] {
        &self.outgoing[node as usize]
    }

    #[inline]
    pub fn incoming(&self, node: NodeId) -> &[EdgeId] {
        &self.incoming[node as usize]
    }

    #[inline]
    pub fn incident(&self, node: NodeId) -> &[EdgeId] {
        &self.incident[node as usize]
    }

    /// Point at fraction `t` along `edge` (clamped to the segment).
    #[inline]
    pub fn point_on(&self, edge: EdgeId, t: f32) -> Vec3 {
        let e = self.edge(edge);
        self.position(e.a).lerp(self.position(e.b), t.clamp(0.0, 1.0))
    }

    /// Edges whose source node carries group tag `group`.
    pub fn edges_from_group(&self, group: u32) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| self.groups[e.a as usize] == group)
            .map(|(i, _)| i as EdgeId)
            .collect()
    }

    /// Segment endpoints as a flat `[ax, ay, az, bx, by, bz, ...]` buffer.
    pub fn segments_flat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.edges.len() * 6);
        for e in &self.edges {
            out.extend_from_slice(&self.position(e.a).to_array());
            out.extend_from_slice(&self.position(e.b).to_array());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_graphs() {
        assert_eq!(
            Graph::new(Vec::new(), Vec::new(), Vec::new()).unwrap_err(),
            ConstructionError::EmptyGraph
        );
        let pts = vec![Vec3::ZERO, Vec3::X];
        assert!(matches!(
            Graph::new(pts.clone(), vec![0, 0], vec![Edge::new(0, 5)]),
            Err(ConstructionError::DanglingEdge { edge: 0, node: 5, .. })
        ));
        assert!(matches!(
            Graph::new(vec![Vec3::ONE, Vec3::ONE], vec![0, 0], vec![Edge::new(0, 1)]),
            Err(ConstructionError::ZeroLengthEdge { edge: 0 })
        ));
    }

    #[test]
    fn layered_network_is_fully_connected_between_neighbours() {
        let g = Graph::layered(&[(2, 2), (3, 3), (4, 4), (4, 4), (3, 3), (2, 2)], 22.0, 10.0, 10.0)
            .unwrap();
        assert_eq!(g.node_count(), 4 + 9 + 16 + 16 + 9 + 4);
        assert_eq!(g.edge_count(), 4 * 9 + 9 * 16 + 16 * 16 + 16 * 9 + 9 * 4);
        assert_eq!(g.edges_from_group(0).len(), 36);
        // input nodes have no incoming edges, output nodes no outgoing ones
        assert!(g.incoming(0).is_empty());
        assert!(g.outgoing(g.node_count() as NodeId - 1).is_empty());
        assert!((g.position(0).x + 55.0).abs() < 1e-4);
    }

    #[test]
    fn street_grid_counts() {
        let g = Graph::grid(11, 18.0, &[[0, 0, 2, 2]]).unwrap();
        assert_eq!(g.node_count(), 121);
        assert_eq!(g.edge_count(), 2 * 11 * 10 + 1);
        // a corner joins two streets plus the diagonal
        assert_eq!(g.incident(0).len(), 3);
        assert_eq!(g.position(0), Vec3::new(-90.0, 0.0, -90.0));
    }
}
