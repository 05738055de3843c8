use std::collections::HashMap;

use crate::core::{CellId, Position};

use super::{CancelFlag, Layout, LayoutSnapshot, SnapshotCell};

/// Computes a complete layout for the snapshot, or None if cancelled.
///
/// Rows are reverse-chronological, ties broken by commit id, and lanes come
/// from a single reservation sweep over the rows, so identical topology
/// always yields identical output regardless of insertion order. The
/// cancellation flag is checked once per row; a cancelled run returns no
/// partial positions.
pub fn compute_layout(snapshot: &LayoutSnapshot, cancel: &CancelFlag) -> Option<Layout> {
    let mut ordered: Vec<&SnapshotCell> = snapshot.cells.iter().collect();
    ordered.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut positions: HashMap<CellId, Position> = HashMap::with_capacity(ordered.len());
    let mut edge_lanes: HashMap<(CellId, CellId), usize> = HashMap::new();
    // Lane reservation table: lane index -> commit id expected to occupy it.
    let mut reserved: Vec<Option<CellId>> = Vec::new();
    let mut lane_count = 0usize;

    for (row, cell) in ordered.iter().enumerate() {
        if cancel.is_cancelled() {
            return None;
        }

        let lane = match lane_reserved_for(&reserved, &cell.id) {
            Some(lane) => lane,
            None => take_free_lane(&mut reserved),
        };
        reserved[lane] = None;
        positions.insert(cell.id.clone(), Position { row, column: lane });
        lane_count = lane_count.max(lane + 1);

        let mut lane_handed_off = false;
        for parent in &cell.parents {
            if lane_reserved_for(&reserved, parent).is_some() {
                // Parent is already expected in another lane; this edge only
                // runs down our column and bends into that lane at the
                // parent's row.
                edge_lanes.insert((cell.id.clone(), parent.clone()), lane);
            } else if let Some(parent_pos) = positions.get(parent) {
                // Out-of-order timestamp put the parent above us; route along
                // the parent's lane.
                edge_lanes.insert((cell.id.clone(), parent.clone()), parent_pos.column);
            } else if !lane_handed_off {
                // First unplaced parent inherits our lane.
                reserved[lane] = Some(parent.clone());
                lane_handed_off = true;
                edge_lanes.insert((cell.id.clone(), parent.clone()), lane);
            } else {
                // Branch point or merge fan-out: the extra parent opens the
                // lowest free lane.
                let new_lane = take_free_lane(&mut reserved);
                reserved[new_lane] = Some(parent.clone());
                lane_count = lane_count.max(new_lane + 1);
                edge_lanes.insert((cell.id.clone(), parent.clone()), new_lane);
            }
        }
        // A root hands nothing off, so its lane stays vacated for reuse.
    }

    Some(Layout {
        positions,
        edge_lanes,
        lane_count,
    })
}

fn lane_reserved_for(reserved: &[Option<CellId>], id: &str) -> Option<usize> {
    reserved
        .iter()
        .position(|slot| slot.as_deref() == Some(id))
}

fn take_free_lane(reserved: &mut Vec<Option<CellId>>) -> usize {
    match reserved.iter().position(Option::is_none) {
        Some(lane) => lane,
        None => {
            reserved.push(None);
            reserved.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use smallvec::{smallvec, SmallVec};

    use super::*;

    fn cell(id: &str, timestamp: i64, parents: &[&str]) -> SnapshotCell {
        SnapshotCell {
            id: id.to_string(),
            timestamp,
            parents: parents.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn layout(cells: Vec<SnapshotCell>) -> Layout {
        compute_layout(&LayoutSnapshot { cells }, &CancelFlag::new())
            .unwrap_or_default()
    }

    fn pos(layout: &Layout, id: &str) -> Position {
        layout.positions[&id.to_string()]
    }

    fn edge_lane(layout: &Layout, child: &str, parent: &str) -> usize {
        layout.edge_lanes[&(child.to_string(), parent.to_string())]
    }

    #[test]
    fn linear_history_uses_one_lane() {
        let result = layout(vec![
            cell("a", 1, &[]),
            cell("b", 2, &["a"]),
            cell("c", 3, &["b"]),
        ]);

        assert_eq!(pos(&result, "c"), Position { row: 0, column: 0 });
        assert_eq!(pos(&result, "b"), Position { row: 1, column: 0 });
        assert_eq!(pos(&result, "a"), Position { row: 2, column: 0 });
        assert_eq!(result.lane_count, 1);
    }

    #[test]
    fn branch_and_merge_scenario() {
        // A (root, t=1), B (parent A, t=2), C (parent A, t=2),
        // D (parents B and C, t=3).
        let result = layout(vec![
            cell("a", 1, &[]),
            cell("b", 2, &["a"]),
            cell("c", 2, &["a"]),
            cell("d", 3, &["b", "c"]),
        ]);

        // Rows: newest first, B/C tie broken by id.
        assert_eq!(pos(&result, "d").row, 0);
        assert_eq!(pos(&result, "b").row, 1);
        assert_eq!(pos(&result, "c").row, 2);
        assert_eq!(pos(&result, "a").row, 3);

        // Two lanes open at the branch point and merge back into one.
        assert_eq!(pos(&result, "d").column, 0);
        assert_eq!(pos(&result, "b").column, 0);
        assert_eq!(pos(&result, "c").column, 1);
        assert_eq!(pos(&result, "a").column, 0);
        assert_eq!(result.lane_count, 2);

        assert_eq!(edge_lane(&result, "d", "b"), 0);
        assert_eq!(edge_lane(&result, "d", "c"), 1);
        assert_eq!(edge_lane(&result, "b", "a"), 0);
        assert_eq!(edge_lane(&result, "c", "a"), 1);
    }

    #[test]
    fn output_is_independent_of_insertion_order() {
        let forward = layout(vec![
            cell("a", 1, &[]),
            cell("b", 2, &["a"]),
            cell("c", 2, &["a"]),
            cell("d", 3, &["b", "c"]),
            cell("e", 4, &["d"]),
        ]);
        let shuffled = layout(vec![
            cell("e", 4, &["d"]),
            cell("c", 2, &["a"]),
            cell("a", 1, &[]),
            cell("d", 3, &["b", "c"]),
            cell("b", 2, &["a"]),
        ]);

        assert_eq!(forward, shuffled);
    }

    #[test]
    fn vacated_lane_is_reused() {
        // Two independent root chains: the second chain starts after the
        // first chain's root has vacated lane 0's sibling lanes.
        let result = layout(vec![
            cell("a", 1, &[]),
            cell("b", 2, &["a"]),
            cell("x", 3, &[]),
            cell("y", 4, &["x"]),
        ]);

        // y/x occupy lane 0 first; once x (a root) vacates it, b/a reuse it.
        assert_eq!(pos(&result, "y").column, 0);
        assert_eq!(pos(&result, "x").column, 0);
        assert_eq!(pos(&result, "b").column, 0);
        assert_eq!(pos(&result, "a").column, 0);
        assert_eq!(result.lane_count, 1);
    }

    #[test]
    fn shared_ancestor_is_positioned_once() {
        let result = layout(vec![
            cell("root", 1, &[]),
            cell("m1", 2, &["root"]),
            cell("f1", 3, &["root"]),
        ]);

        assert_eq!(result.positions.len(), 3);
        // Both children route an edge to the shared root.
        assert!(result
            .edge_lanes
            .contains_key(&("m1".to_string(), "root".to_string())));
        assert!(result
            .edge_lanes
            .contains_key(&("f1".to_string(), "root".to_string())));
    }

    #[test]
    fn cancelled_run_yields_no_partial_layout() {
        let snapshot = LayoutSnapshot {
            cells: vec![cell("a", 1, &[]), cell("b", 2, &["a"])],
        };
        let cancel = CancelFlag::new();
        cancel.cancel();

        assert_eq!(compute_layout(&snapshot, &cancel), None);
    }

    #[test]
    fn octopus_merge_allocates_a_lane_per_extra_parent() {
        let parents: SmallVec<[CellId; 2]> = smallvec![
            "p1".to_string(),
            "p2".to_string(),
            "p3".to_string()
        ];
        let result = layout(vec![
            cell("p1", 1, &[]),
            cell("p2", 1, &[]),
            cell("p3", 1, &[]),
            SnapshotCell {
                id: "m".to_string(),
                timestamp: 2,
                parents,
            },
        ]);

        assert_eq!(pos(&result, "m").column, 0);
        assert_eq!(edge_lane(&result, "m", "p1"), 0);
        assert_eq!(edge_lane(&result, "m", "p2"), 1);
        assert_eq!(edge_lane(&result, "m", "p3"), 2);
        assert_eq!(result.lane_count, 3);
    }
}
