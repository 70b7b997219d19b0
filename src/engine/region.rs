//! Region decomposition
//!
//! Splits a sheet into the units the renderer and the keyboard layer work
//! with: single nodes, and branch regions that start at a split and list one
//! node sequence per child.
//!
//! Convergence policy: a branch region records its convergence node but does
//! not contain it. The node is claimed the moment it is identified, so no
//! branch walk can pass through it, and the traversal then continues directly
//! from it, emitting it as the next region. It is never put back into the
//! pool of unvisited nodes.
//!
//! Nested splits inside a branch are built recursively with the same visited
//! set and flattened, in linear order, into that branch's node sequence.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::linearize::linearize_regions;
use crate::domain::{GraphError, Node, NodeId, Sheet, SheetGraph};

/// The node sequence of one path out of a split
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub nodes: Vec<NodeId>,
}

impl Branch {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// A rendering and navigation unit derived from a sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Region {
    /// One node outside any open split
    Single { node: NodeId },

    /// A split node and its parallel branches
    ///
    /// Branches follow the order of the split's children. A branch is empty
    /// when its child was already claimed elsewhere (typically a direct edge
    /// from the split to the convergence node).
    Branch {
        split: NodeId,
        branches: Vec<Branch>,
        /// Where the branches meet again; emitted by the following region
        convergence: Option<NodeId>,
    },
}

impl Region {
    /// Returns the nodes this region contains, in linear order
    ///
    /// The convergence node of a branch region is not part of it.
    pub fn nodes(&self) -> Vec<&NodeId> {
        match self {
            Region::Single { node } => vec![node],
            Region::Branch {
                split, branches, ..
            } => std::iter::once(split)
                .chain(branches.iter().flat_map(|b| b.nodes.iter()))
                .collect(),
        }
    }

    /// Returns true if this region contains the node
    pub fn contains(&self, id: &NodeId) -> bool {
        match self {
            Region::Single { node } => node == id,
            Region::Branch {
                split, branches, ..
            } => split == id || branches.iter().any(|b| b.nodes.contains(id)),
        }
    }
}

/// Decomposes a sheet into regions
///
/// Roots are visited in insertion order; anything they do not reach (only
/// possible for convergence nodes left unclaimed by nested or shared splits)
/// is picked up afterwards in topological order. Every node ends up in
/// exactly one region.
///
/// Fails with a [`GraphError`] on dangling or one-sided references and on
/// cycles, before any traversal starts.
pub fn build_regions(sheet: &Sheet) -> Result<Vec<Region>, GraphError> {
    let graph = SheetGraph::from_sheet(sheet)?;
    let order = graph.topological_order()?;
    let ranks = graph.ranks()?;

    let builder = RegionBuilder {
        sheet,
        graph: &graph,
        ranks: &ranks,
    };

    let mut visited: HashSet<NodeId> = HashSet::with_capacity(sheet.len());
    let mut regions = Vec::new();

    let starts = sheet.roots().map(|node| &node.id).chain(order.iter());
    for start in starts {
        if visited.insert(start.clone()) {
            builder.walk(start, &[], &mut visited, &mut regions);
        }
    }

    Ok(regions)
}

struct RegionBuilder<'a> {
    sheet: &'a Sheet,
    graph: &'a SheetGraph,
    ranks: &'a HashMap<NodeId, usize>,
}

impl RegionBuilder<'_> {
    /// Emits regions from `start` onward
    ///
    /// `start` must already be marked visited by the caller. The walk never
    /// enters a node in `stops` or one that is already visited.
    fn walk(
        &self,
        start: &NodeId,
        stops: &[NodeId],
        visited: &mut HashSet<NodeId>,
        out: &mut Vec<Region>,
    ) {
        let mut current = start.clone();

        loop {
            let Some(node) = self.sheet.get(&current) else {
                return;
            };

            let next = if node.is_split() {
                self.split(node, stops, visited, out)
            } else {
                out.push(Region::Single {
                    node: current.clone(),
                });
                node.children
                    .first()
                    .filter(|child| !stops.contains(child))
                    .filter(|child| visited.insert((*child).clone()))
                    .cloned()
            };

            match next {
                Some(id) => current = id,
                None => return,
            }
        }
    }

    /// Emits the branch region of a split and returns the claimed convergence
    fn split(
        &self,
        node: &Node,
        stops: &[NodeId],
        visited: &mut HashSet<NodeId>,
        out: &mut Vec<Region>,
    ) -> Option<NodeId> {
        let convergence = self.convergence_of(node);

        // Claim before walking any branch so no branch can pass through it.
        let claimed = convergence.as_ref().is_some_and(|c| {
            !self.beyond_stops(c, stops) && !stops.contains(c) && visited.insert(c.clone())
        });

        let mut branch_stops = stops.to_vec();
        if let Some(c) = &convergence {
            branch_stops.push(c.clone());
        }

        let mut branches = Vec::with_capacity(node.children.len());
        for child in &node.children {
            if branch_stops.contains(child) || !visited.insert(child.clone()) {
                branches.push(Branch::default());
                continue;
            }

            let mut nested = Vec::new();
            self.walk(child, &branch_stops, visited, &mut nested);
            branches.push(Branch::new(linearize_regions(&nested)));
        }

        out.push(Region::Branch {
            split: node.id.clone(),
            branches,
            convergence: convergence.clone(),
        });

        if claimed {
            convergence
        } else {
            None
        }
    }

    /// Nearest node reachable from every child of the split
    fn convergence_of(&self, node: &Node) -> Option<NodeId> {
        let mut children = node.children.iter();
        let first = children.next()?;

        let mut common = self.graph.descendants_or_self(first);
        for child in children {
            let reachable = self.graph.descendants_or_self(child);
            common.retain(|id| reachable.contains(id));
        }

        common
            .into_iter()
            .min_by_key(|id| self.ranks.get(id).copied().unwrap_or(usize::MAX))
    }

    /// True if the node lies at or below one of the stop nodes
    ///
    /// Such a node belongs to whatever continues from the stop, not to the
    /// nested region that happened to find it first.
    fn beyond_stops(&self, id: &NodeId, stops: &[NodeId]) -> bool {
        stops.iter().any(|stop| self.graph.reaches(stop, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{id, ids, sheet_from};

    fn branch(list: &[&str]) -> Branch {
        Branch::new(ids(list))
    }

    fn single(s: &str) -> Region {
        Region::Single { node: id(s) }
    }

    fn assert_each_node_once(sheet: &Sheet, regions: &[Region]) {
        for node in sheet.ids() {
            let holders = regions.iter().filter(|r| r.contains(node)).count();
            assert_eq!(holders, 1, "node {} held by {} regions", node, holders);
        }
    }

    #[test]
    fn chain_is_all_single_regions() {
        let sheet = sheet_from(&[("A", "B"), ("B", "C"), ("C", "")]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(regions, vec![single("A"), single("B"), single("C")]);
    }

    #[test]
    fn diamond_yields_one_branch_region() {
        let sheet = sheet_from(&[("A", "B X"), ("B", "C"), ("X", "C"), ("C", "")]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(
            regions,
            vec![
                Region::Branch {
                    split: id("A"),
                    branches: vec![branch(&["B"]), branch(&["X"])],
                    convergence: Some(id("C")),
                },
                single("C"),
            ]
        );
        let branch_regions = regions
            .iter()
            .filter(|r| matches!(r, Region::Branch { .. }))
            .count();
        assert_eq!(branch_regions, 1);
        assert_each_node_once(&sheet, &regions);
    }

    #[test]
    fn convergence_node_is_emitted_once_and_traversal_continues() {
        let sheet = sheet_from(&[
            ("A", "B X"),
            ("B", "B2"),
            ("B2", "C"),
            ("X", "C"),
            ("C", "D"),
            ("D", ""),
        ]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(
            regions,
            vec![
                Region::Branch {
                    split: id("A"),
                    branches: vec![branch(&["B", "B2"]), branch(&["X"])],
                    convergence: Some(id("C")),
                },
                single("C"),
                single("D"),
            ]
        );
    }

    #[test]
    fn convergence_that_splits_again_starts_next_branch_region() {
        let sheet = sheet_from(&[
            ("A", "B X"),
            ("B", "C"),
            ("X", "C"),
            ("C", "D E"),
            ("D", "F"),
            ("E", "F"),
            ("F", ""),
        ]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(regions.len(), 3);
        assert_eq!(
            regions[1],
            Region::Branch {
                split: id("C"),
                branches: vec![branch(&["D"]), branch(&["E"])],
                convergence: Some(id("F")),
            }
        );
        assert_eq!(regions[2], single("F"));
        assert_each_node_once(&sheet, &regions);
    }

    #[test]
    fn branches_that_never_reconverge() {
        let sheet = sheet_from(&[("A", "B X"), ("B", "C"), ("C", ""), ("X", "")]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(
            regions,
            vec![Region::Branch {
                split: id("A"),
                branches: vec![branch(&["B", "C"]), branch(&["X"])],
                convergence: None,
            }]
        );
    }

    #[test]
    fn direct_edge_to_convergence_is_an_empty_branch() {
        let sheet = sheet_from(&[("A", "B C"), ("B", "C"), ("C", "")]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(
            regions,
            vec![
                Region::Branch {
                    split: id("A"),
                    branches: vec![branch(&["B"]), Branch::default()],
                    convergence: Some(id("C")),
                },
                single("C"),
            ]
        );
    }

    #[test]
    fn nested_split_is_flattened_into_its_branch() {
        let sheet = sheet_from(&[
            ("A", "B X"),
            ("B", "D E"),
            ("D", "C"),
            ("E", "C"),
            ("X", "C"),
            ("C", ""),
        ]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(
            regions,
            vec![
                Region::Branch {
                    split: id("A"),
                    branches: vec![branch(&["B", "D", "E"]), branch(&["X"])],
                    convergence: Some(id("C")),
                },
                single("C"),
            ]
        );
        assert_each_node_once(&sheet, &regions);
    }

    #[test]
    fn nested_split_with_inner_convergence() {
        let sheet = sheet_from(&[
            ("A", "B X"),
            ("B", "D E"),
            ("D", "J"),
            ("E", "J"),
            ("J", "C"),
            ("X", "C"),
            ("C", ""),
        ]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(
            regions[0],
            Region::Branch {
                split: id("A"),
                branches: vec![branch(&["B", "D", "E", "J"]), branch(&["X"])],
                convergence: Some(id("C")),
            }
        );
        assert_each_node_once(&sheet, &regions);
    }

    #[test]
    fn shared_convergence_is_claimed_by_the_first_region() {
        let sheet = sheet_from(&[
            ("A", "B X"),
            ("P", "Q Y"),
            ("B", "C"),
            ("X", "C"),
            ("Q", "C"),
            ("Y", "C"),
            ("C", ""),
        ]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(
            regions,
            vec![
                Region::Branch {
                    split: id("A"),
                    branches: vec![branch(&["B"]), branch(&["X"])],
                    convergence: Some(id("C")),
                },
                single("C"),
                Region::Branch {
                    split: id("P"),
                    branches: vec![branch(&["Q"]), branch(&["Y"])],
                    convergence: Some(id("C")),
                },
            ]
        );
        assert_each_node_once(&sheet, &regions);
    }

    #[test]
    fn join_of_two_roots_emits_join_once() {
        let sheet = sheet_from(&[("R1", "J"), ("R2", "J"), ("J", "")]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(regions, vec![single("R1"), single("J"), single("R2")]);
    }

    #[test]
    fn cycle_is_an_invalid_graph() {
        let sheet = sheet_from(&[("R", "A"), ("A", "B"), ("B", "C"), ("C", "A")]);

        assert!(matches!(
            build_regions(&sheet),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn rootless_cycle_is_an_invalid_graph() {
        let sheet = sheet_from(&[("A", "B"), ("B", "A")]);

        assert!(matches!(
            build_regions(&sheet),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn dangling_reference_is_an_invalid_graph() {
        let mut sheet = sheet_from(&[("A", "B"), ("B", "")]);
        sheet.get_mut(&id("A")).unwrap().children.push(id("ghost"));

        assert!(matches!(
            build_regions(&sheet),
            Err(GraphError::DanglingReference { .. })
        ));
    }

    #[test]
    fn empty_sheet_has_no_regions() {
        let sheet = sheet_from(&[]);
        assert!(build_regions(&sheet).unwrap().is_empty());
    }

    #[test]
    fn region_nodes_exclude_convergence() {
        let region = Region::Branch {
            split: id("A"),
            branches: vec![branch(&["B"]), branch(&["X"])],
            convergence: Some(id("C")),
        };

        assert_eq!(region.nodes(), vec![&id("A"), &id("B"), &id("X")]);
        assert!(!region.contains(&id("C")));
    }

    #[test]
    fn region_json_shape() {
        let region = Region::Branch {
            split: id("A"),
            branches: vec![branch(&["B"])],
            convergence: None,
        };
        let json = serde_json::to_value(&region).unwrap();

        assert_eq!(json["kind"], "branch");
        assert_eq!(json["split"], "A");
        assert_eq!(json["branches"][0]["nodes"], serde_json::json!(["B"]));
        assert!(json["convergence"].is_null());
    }
}
