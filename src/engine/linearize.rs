//! Vertical navigation order
//!
//! Flattens regions into the single sequence the up/down keys walk through.

use super::region::Region;
use crate::domain::NodeId;

/// Flattens regions into one ordered list of node ids
///
/// A branch region contributes its split node, then each branch in order.
/// Its convergence node is not emitted here; the region that follows it
/// does that, so the node appears exactly once.
pub fn linearize_regions(regions: &[Region]) -> Vec<NodeId> {
    let mut order = Vec::new();
    for region in regions {
        match region {
            Region::Single { node } => order.push(node.clone()),
            Region::Branch {
                split, branches, ..
            } => {
                order.push(split.clone());
                for branch in branches {
                    order.extend(branch.nodes.iter().cloned());
                }
            }
        }
    }
    order
}

/// Returns the index of a node in linear order
///
/// This is the only place an index into the navigation order is produced;
/// it is recomputed from the regions on every call.
pub fn position_of(regions: &[Region], id: &NodeId) -> Option<usize> {
    linearize_regions(regions).iter().position(|n| n == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{id, ids, sheet_from};
    use crate::engine::build_regions;
    use std::collections::HashSet;

    #[test]
    fn diamond_order() {
        let sheet = sheet_from(&[("A", "B X"), ("B", "C"), ("X", "C"), ("C", "")]);
        let order = linearize_regions(&build_regions(&sheet).unwrap());

        assert_eq!(order, ids(&["A", "B", "X", "C"]));
    }

    #[test]
    fn branches_follow_child_order() {
        let sheet = sheet_from(&[("A", "X B"), ("B", "C"), ("X", "C"), ("C", "")]);
        let order = linearize_regions(&build_regions(&sheet).unwrap());

        assert_eq!(order, ids(&["A", "X", "B", "C"]));
    }

    #[test]
    fn every_node_appears_exactly_once() {
        let sheet = sheet_from(&[
            ("A", "B X Y"),
            ("B", "B1"),
            ("B1", "C"),
            ("X", "C"),
            ("Y", "C"),
            ("C", "D E"),
            ("D", "F"),
            ("E", "F"),
            ("F", ""),
            ("R", "F"),
        ]);
        let order = linearize_regions(&build_regions(&sheet).unwrap());

        assert_eq!(order.len(), sheet.len());
        let unique: HashSet<_> = order.iter().collect();
        assert_eq!(unique.len(), sheet.len());
    }

    #[test]
    fn position_uses_linear_order_not_insertion_order() {
        // Insertion order puts C first; linear order puts it last.
        let sheet = sheet_from(&[("C", ""), ("A", "B X"), ("B", "C"), ("X", "C")]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(position_of(&regions, &id("C")), Some(3));
        assert_eq!(position_of(&regions, &id("A")), Some(0));
        assert_eq!(position_of(&regions, &id("missing")), None);
    }
}
