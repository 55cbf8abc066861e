//! Pure order arithmetic over story ids
//!
//! An order is the list of story ids of one rundown, index = position.

/// Where to place a story relative to optional anchors
///
/// `before` is the story that should precede it, `after` the story that
/// should follow it. The `before` anchor wins when both resolve; with no
/// resolvable anchor the story goes last. `order` must not contain the
/// story being placed.
pub fn placement_index(order: &[i64], before: Option<i64>, after: Option<i64>) -> usize {
    let index_of = |id: i64| order.iter().position(|&candidate| candidate == id);

    if let Some(index) = before.and_then(index_of) {
        return index + 1;
    }
    if let Some(index) = after.and_then(index_of) {
        return index;
    }
    order.len()
}

/// Order with `story` re-spliced next to its anchors
pub fn move_story(order: &[i64], story: i64, before: Option<i64>, after: Option<i64>) -> Vec<i64> {
    let mut remaining: Vec<i64> = order.iter().copied().filter(|&id| id != story).collect();
    let index = placement_index(&remaining, before, after);
    remaining.insert(index, story);
    remaining
}

/// Order with the two stories exchanged; `None` if either is missing
pub fn swap_stories(order: &[i64], first: i64, second: i64) -> Option<Vec<i64>> {
    let a = order.iter().position(|&id| id == first)?;
    let b = order.iter().position(|&id| id == second)?;
    let mut swapped = order.to_vec();
    swapped.swap(a, b);
    Some(swapped)
}

/// Position of `story` in `order`
pub fn position_of(order: &[i64], story: i64) -> Option<usize> {
    order.iter().position(|&id| id == story)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: [i64; 4] = [10, 20, 30, 40];

    #[test]
    fn test_move_after_before_anchor() {
        assert_eq!(move_story(&ORDER, 40, Some(10), None), vec![10, 40, 20, 30]);
    }

    #[test]
    fn test_move_before_after_anchor() {
        assert_eq!(move_story(&ORDER, 10, None, Some(40)), vec![20, 30, 10, 40]);
    }

    #[test]
    fn test_move_between_adjacent_anchors() {
        assert_eq!(move_story(&ORDER, 40, Some(10), Some(20)), vec![10, 40, 20, 30]);
    }

    #[test]
    fn test_move_without_anchors_goes_last() {
        assert_eq!(move_story(&ORDER, 20, None, None), vec![10, 30, 40, 20]);
    }

    #[test]
    fn test_move_to_start_before_first() {
        assert_eq!(move_story(&ORDER, 30, None, Some(10)), vec![30, 10, 20, 40]);
    }

    #[test]
    fn test_unresolved_anchor_falls_through() {
        assert_eq!(move_story(&ORDER, 10, Some(99), Some(30)), vec![20, 10, 30, 40]);
        // Anchoring on itself is the same as no anchor
        assert_eq!(move_story(&ORDER, 10, Some(10), None), vec![20, 30, 40, 10]);
    }

    #[test]
    fn test_swap_exchanges_exactly_two() {
        assert_eq!(swap_stories(&ORDER, 20, 40), Some(vec![10, 40, 30, 20]));
        assert_eq!(swap_stories(&ORDER, 20, 20), Some(ORDER.to_vec()));
        assert_eq!(swap_stories(&ORDER, 20, 99), None);
    }

    #[test]
    fn test_position_of() {
        assert_eq!(position_of(&ORDER, 30), Some(2));
        assert_eq!(position_of(&ORDER, 99), None);
    }

    #[test]
    fn test_placement_into_empty_order() {
        assert_eq!(placement_index(&[], Some(1), Some(2)), 0);
    }
}
