//! Harmonic progressions — duration assignment over a timed sequence.
//!
//! A chord symbol on a lead sheet lasts until the next symbol (or the end
//! of the piece). This is pure span arithmetic over (offset, item) pairs;
//! the items are usually [`ChordSymbol`](crate::figure::ChordSymbol)s but
//! nothing here depends on that.

/// An item with its resolved offset and duration.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSpan<T> {
    pub offset: f64,
    pub duration: f64,
    pub item: T,
}

/// Assign each item a duration equal to the gap to the next item, the last
/// one running to `end`. Items are ordered by offset first (stable for
/// equal offsets); an `end` before the last offset clamps that duration to
/// zero.
pub fn assign_durations<T>(items: Vec<(f64, T)>, end: f64) -> Vec<TimedSpan<T>> {
    let mut items = items;
    items.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let offsets: Vec<f64> = items.iter().map(|(o, _)| *o).collect();
    items
        .into_iter()
        .enumerate()
        .map(|(i, (offset, item))| {
            let until = offsets.get(i + 1).copied().unwrap_or(end);
            TimedSpan {
                offset,
                duration: (until - offset).max(0.0),
                item,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_fill_gaps() {
        let spans = assign_durations(vec![(0.0, "C"), (4.0, "F"), (6.0, "G7")], 8.0);
        let durations: Vec<f64> = spans.iter().map(|s| s.duration).collect();
        assert_eq!(durations, vec![4.0, 2.0, 2.0]);
    }

    #[test]
    fn single_item_runs_to_end() {
        let spans = assign_durations(vec![(0.0, "C")], 4.0);
        assert_eq!(spans[0].duration, 4.0);
    }

    #[test]
    fn unsorted_input_is_ordered() {
        let spans = assign_durations(vec![(6.0, "G7"), (0.0, "C"), (4.0, "F")], 8.0);
        let items: Vec<&str> = spans.iter().map(|s| s.item).collect();
        assert_eq!(items, vec!["C", "F", "G7"]);
        assert_eq!(spans[0].duration, 4.0);
    }

    #[test]
    fn end_before_last_offset_clamps() {
        let spans = assign_durations(vec![(0.0, "C"), (4.0, "F")], 2.0);
        assert_eq!(spans[1].duration, 0.0);
    }

    #[test]
    fn empty_sequence() {
        let spans: Vec<TimedSpan<&str>> = assign_durations(vec![], 8.0);
        assert!(spans.is_empty());
    }
}
