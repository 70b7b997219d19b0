//! Keyboard navigation over regions
//!
//! Up/down moves through the linear order; left/right moves between sibling
//! branches of the same split, keeping the depth within the branch.
//! Both take and return node ids; any index is derived on the spot.
//!
//! Nested splits are flattened into the branch that contains them, so
//! left/right only crosses the branches of the outermost split. For
//! `A -> {B -> {D, E}, X}` the first branch is `[B, D, E]`: right from D
//! lands on X, and D and E are only connected through up/down.

use std::fmt;
use std::str::FromStr;

use super::linearize::linearize_regions;
use super::region::{Branch, Region};
use crate::domain::NodeId;

/// Direction across sibling branches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Right,
}

/// Direction along the linear order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Up,
    Down,
}

impl FromStr for Horizontal {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" | "h" => Ok(Horizontal::Left),
            "right" | "l" => Ok(Horizontal::Right),
            _ => Err(()),
        }
    }
}

impl FromStr for Vertical {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "k" => Ok(Vertical::Up),
            "down" | "j" => Ok(Vertical::Down),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Horizontal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Horizontal::Left => f.write_str("left"),
            Horizontal::Right => f.write_str("right"),
        }
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vertical::Up => f.write_str("up"),
            Vertical::Down => f.write_str("down"),
        }
    }
}

/// Moves to the same depth in the neighbouring branch
///
/// Empty branches are skipped. If the neighbouring branch is shorter, its
/// last node is returned. Outside any branch, or at the outermost branch,
/// the current id comes back unchanged.
pub fn navigate_horizontal(regions: &[Region], current: &NodeId, direction: Horizontal) -> NodeId {
    for region in regions {
        let Region::Branch { branches, .. } = region else {
            continue;
        };

        let Some((index, offset)) = locate(branches, current) else {
            continue;
        };

        let target = match direction {
            Horizontal::Left => branches[..index].iter().rev().find(|b| !b.is_empty()),
            Horizontal::Right => branches[index + 1..].iter().find(|b| !b.is_empty()),
        };

        return target
            .and_then(|branch| branch.nodes.get(offset.min(branch.len() - 1)))
            .unwrap_or(current)
            .clone();
    }

    current.clone()
}

/// Moves one step up or down the linear order, clamped at both ends
///
/// Ids that are not in the order come back unchanged.
pub fn navigate_vertical(regions: &[Region], current: &NodeId, direction: Vertical) -> NodeId {
    let order = linearize_regions(regions);
    let Some(index) = order.iter().position(|id| id == current) else {
        return current.clone();
    };

    let next = match direction {
        Vertical::Up => index.saturating_sub(1),
        Vertical::Down => (index + 1).min(order.len() - 1),
    };
    order[next].clone()
}

/// Returns the region containing the node
pub fn region_of<'a>(regions: &'a [Region], id: &NodeId) -> Option<&'a Region> {
    regions.iter().find(|region| region.contains(id))
}

/// Branch index and offset of a node within a branch region
fn locate(branches: &[Branch], id: &NodeId) -> Option<(usize, usize)> {
    branches.iter().enumerate().find_map(|(index, branch)| {
        branch
            .nodes
            .iter()
            .position(|n| n == id)
            .map(|offset| (index, offset))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{id, ids, sheet_from};
    use crate::engine::build_regions;

    fn three_branches() -> Vec<Region> {
        // A splits into B1-B2-B3, X1, Y1-Y2; all meet at C
        let sheet = sheet_from(&[
            ("A", "B1 X1 Y1"),
            ("B1", "B2"),
            ("B2", "B3"),
            ("B3", "C"),
            ("X1", "C"),
            ("Y1", "Y2"),
            ("Y2", "C"),
            ("C", ""),
        ]);
        build_regions(&sheet).unwrap()
    }

    #[test]
    fn right_keeps_offset() {
        let regions = three_branches();

        assert_eq!(
            navigate_horizontal(&regions, &id("Y1"), Horizontal::Left),
            id("X1")
        );
        assert_eq!(
            navigate_horizontal(&regions, &id("X1"), Horizontal::Right),
            id("Y1")
        );
    }

    #[test]
    fn shorter_branch_clamps_to_last_node() {
        let regions = three_branches();

        assert_eq!(
            navigate_horizontal(&regions, &id("B3"), Horizontal::Right),
            id("X1")
        );
        assert_eq!(
            navigate_horizontal(&regions, &id("B2"), Horizontal::Right),
            id("X1")
        );
    }

    #[test]
    fn longer_branch_keeps_same_depth() {
        let regions = three_branches();

        assert_eq!(
            navigate_horizontal(&regions, &id("Y2"), Horizontal::Left),
            id("X1")
        );
        let sheet = sheet_from(&[
            ("A", "P Q"),
            ("P", "P2"),
            ("P2", "C"),
            ("Q", "Q2"),
            ("Q2", "C"),
            ("C", ""),
        ]);
        let regions = build_regions(&sheet).unwrap();
        assert_eq!(
            navigate_horizontal(&regions, &id("P2"), Horizontal::Right),
            id("Q2")
        );
    }

    #[test]
    fn outermost_branch_is_a_no_op() {
        let regions = three_branches();

        assert_eq!(
            navigate_horizontal(&regions, &id("B1"), Horizontal::Left),
            id("B1")
        );
        assert_eq!(
            navigate_horizontal(&regions, &id("Y2"), Horizontal::Right),
            id("Y2")
        );
    }

    #[test]
    fn outside_branches_is_a_no_op() {
        let regions = three_branches();

        for node in ["A", "C", "missing"] {
            assert_eq!(
                navigate_horizontal(&regions, &id(node), Horizontal::Right),
                id(node)
            );
        }
    }

    #[test]
    fn empty_branch_is_skipped() {
        let sheet = sheet_from(&[("A", "B C X"), ("B", "C"), ("X", "C"), ("C", "")]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(
            navigate_horizontal(&regions, &id("B"), Horizontal::Right),
            id("X")
        );
        assert_eq!(
            navigate_horizontal(&regions, &id("X"), Horizontal::Left),
            id("B")
        );
    }

    #[test]
    fn vertical_walks_linear_order() {
        let regions = three_branches();
        let order = ids(&["A", "B1", "B2", "B3", "X1", "Y1", "Y2", "C"]);
        assert_eq!(linearize_regions(&regions), order);

        let mut current = id("A");
        for expected in order.iter().skip(1) {
            current = navigate_vertical(&regions, &current, Vertical::Down);
            assert_eq!(&current, expected);
        }
        for expected in order.iter().rev().skip(1) {
            current = navigate_vertical(&regions, &current, Vertical::Up);
            assert_eq!(&current, expected);
        }
    }

    #[test]
    fn vertical_clamps_at_ends() {
        let regions = three_branches();

        assert_eq!(navigate_vertical(&regions, &id("A"), Vertical::Up), id("A"));
        assert_eq!(navigate_vertical(&regions, &id("C"), Vertical::Down), id("C"));
        assert_eq!(
            navigate_vertical(&regions, &id("missing"), Vertical::Down),
            id("missing")
        );
    }

    #[test]
    fn region_of_finds_owner() {
        let regions = three_branches();

        assert!(matches!(
            region_of(&regions, &id("Y2")),
            Some(Region::Branch { .. })
        ));
        assert_eq!(
            region_of(&regions, &id("C")),
            Some(&Region::Single { node: id("C") })
        );
    }

    #[test]
    fn nested_split_siblings_share_one_branch() {
        let sheet = sheet_from(&[("A", "B X"), ("B", "D E"), ("D", ""), ("E", ""), ("X", "")]);
        let regions = build_regions(&sheet).unwrap();

        assert_eq!(navigate_horizontal(&regions, &id("D"), Horizontal::Right), id("X"));
        assert_eq!(navigate_horizontal(&regions, &id("E"), Horizontal::Right), id("X"));
        assert_eq!(navigate_horizontal(&regions, &id("D"), Horizontal::Left), id("D"));
        assert_eq!(navigate_horizontal(&regions, &id("X"), Horizontal::Left), id("B"));

        assert_eq!(navigate_vertical(&regions, &id("D"), Vertical::Down), id("E"));
        assert_eq!(navigate_vertical(&regions, &id("E"), Vertical::Up), id("D"));
    }

    #[test]
    fn directions_parse() {
        assert_eq!("left".parse::<Horizontal>(), Ok(Horizontal::Left));
        assert_eq!("L".parse::<Horizontal>(), Ok(Horizontal::Right));
        assert_eq!("j".parse::<Vertical>(), Ok(Vertical::Down));
        assert!("sideways".parse::<Vertical>().is_err());
    }
}
