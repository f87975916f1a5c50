use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::topology::{DeviceId, NodeId};

/// Outgoing devices of each node, paired with the neighbour they reach.
pub(crate) type Adjacency = Vec<SmallVec<[(DeviceId, NodeId); 4]>>;

/// First-hop table: `table[src][dst]` is the device `src` sends on to
/// reach `dst`, or `None` when `dst` is unreachable (or is `src`).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RouteTable {
    first_hop: Vec<Vec<Option<DeviceId>>>,
}

impl RouteTable {
    /// Shortest-path (hop count) routes by BFS from every node.
    ///
    /// Ties break towards the neighbour whose device was created first, so
    /// the table is a pure function of construction order.
    pub fn compute(adjacency: &Adjacency) -> Self {
        let n = adjacency.len();
        let mut first_hop = vec![vec![None; n]; n];

        for src in 0..n {
            let mut visited = vec![false; n];
            visited[src] = true;
            let mut frontier = VecDeque::new();

            for &(dev, neighbour) in &adjacency[src] {
                let nb = neighbour.0 as usize;
                if !visited[nb] {
                    visited[nb] = true;
                    first_hop[src][nb] = Some(dev);
                    frontier.push_back(neighbour);
                }
            }

            while let Some(node) = frontier.pop_front() {
                let hop = first_hop[src][node.0 as usize];
                for &(_, neighbour) in &adjacency[node.0 as usize] {
                    let nb = neighbour.0 as usize;
                    if !visited[nb] {
                        visited[nb] = true;
                        first_hop[src][nb] = hop;
                        frontier.push_back(neighbour);
                    }
                }
            }
        }

        Self { first_hop }
    }

    pub fn next_device(&self, from: NodeId, to: NodeId) -> Option<DeviceId> {
        self.first_hop
            .get(from.0 as usize)?
            .get(to.0 as usize)
            .copied()
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.first_hop.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    /// 0 -- 1 -- 2, plus isolated 3.
    fn line() -> Adjacency {
        vec![
            smallvec![(DeviceId(0), NodeId(1))],
            smallvec![(DeviceId(1), NodeId(0)), (DeviceId(2), NodeId(2))],
            smallvec![(DeviceId(3), NodeId(1))],
            smallvec![],
        ]
    }

    #[test]
    fn multi_hop_uses_first_device() {
        let routes = RouteTable::compute(&line());
        assert_eq!(routes.next_device(NodeId(0), NodeId(2)), Some(DeviceId(0)));
        assert_eq!(routes.next_device(NodeId(2), NodeId(0)), Some(DeviceId(3)));
        assert_eq!(routes.next_device(NodeId(1), NodeId(2)), Some(DeviceId(2)));
    }

    #[test]
    fn unreachable_and_self_have_no_route() {
        let routes = RouteTable::compute(&line());
        assert_eq!(routes.next_device(NodeId(0), NodeId(3)), None);
        assert_eq!(routes.next_device(NodeId(1), NodeId(1)), None);
        assert_eq!(routes.next_device(NodeId(9), NodeId(0)), None);
    }
}
