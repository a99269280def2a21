//! Iterative introsort driver: median-of-three partitioning bounded by a
//! depth counter, an explicit partition stack in place of recursion, and a
//! handoff to heapsort when a partition refuses to shrink quickly enough.

use super::{heap, partition, shell};
use crate::core::{depth_limit, PartitionRange, PartitionStack, Stats, SMALL_THRESHOLD};
use std::cmp::Ordering;

/// Runs the full introsort pipeline over `data`, optionally filling in
/// `stats` with the comparator-call count and partition-stack high-water
/// mark.
pub(super) fn run<T, F>(data: &mut [T], cmp: &mut F, stats: Option<&mut Stats>)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut comparisons: u64 = 0;
    let mut counted = |a: &T, b: &T| -> Ordering {
        comparisons += 1;
        cmp(a, b)
    };

    let mut stack = PartitionStack::new();
    let len = data.len();

    if len > SMALL_THRESHOLD {
        let mut low = 0usize;
        let mut high = len - 1;
        let mut depth = depth_limit(len);

        'outer: loop {
            while high - low > SMALL_THRESHOLD {
                if depth == 0 {
                    heap::sort(&mut data[low..=high], &mut counted);
                    break;
                }
                depth -= 1;

                let (right, left) = partition::partition(data, low, high, &mut counted);

                // Recurse into the smaller side, push the larger: bounds
                // the explicit stack at O(log n) regardless of input order.
                if right - low > high - left {
                    if right - low > SMALL_THRESHOLD {
                        stack.push(PartitionRange { low, high: right, depth });
                    }
                    low = left;
                } else {
                    if high - left > SMALL_THRESHOLD {
                        stack.push(PartitionRange { low: left, high, depth });
                    }
                    high = right;
                }
            }

            match stack.pop() {
                Some(range) => {
                    low = range.low;
                    high = range.high;
                    depth = range.depth;
                }
                None => break 'outer,
            }
        }
    }

    shell::sort(data, &mut counted);

    if let Some(s) = stats {
        s.comparisons = comparisons;
        s.stack_high_water = stack.high_water_mark();
    }
}
