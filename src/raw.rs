//! Unsafe, opaque byte-buffer sort entry point.
//!
//! Mirrors [`crate::algo`] element for element, but operates on a raw
//! `*mut u8` buffer of `num` fixed-size records instead of a typed slice,
//! and exchanges records through a [`SwapSelector`] instead of `T::swap`.
//! This is the FFI-compatible surface: a caller on the other side of an
//! `extern "C"` boundary that only knows record size and a comparator
//! function pointer can still drive the same algorithm the typed path uses.

use crate::core::{
    depth_limit, PartitionRange, PartitionStack, Stats, SwapSelector, SMALL_THRESHOLD,
};
use std::alloc::{alloc, dealloc, Layout};
use std::cmp::Ordering;
use std::ptr;

/// A C-ABI comparator: returns negative, zero, or positive exactly like
/// `memcmp`/`qsort`'s comparator convention.
pub type CmpFn = unsafe extern "C" fn(*const u8, *const u8) -> i32;

/// Sorts `num` fixed-size records of `size` bytes each, starting at `base`,
/// using `cmp` for ordering and `swap_sel` to exchange records.
///
/// # Safety
/// `base` must point to a live, properly aligned (for the chosen
/// `swap_sel`) buffer of at least `num * size` bytes that the caller
/// exclusively owns for the duration of the call. `cmp` must implement a
/// consistent total order and must not panic across the FFI boundary.
pub unsafe fn sort_raw(base: *mut u8, num: usize, size: usize, cmp: CmpFn, swap_sel: SwapSelector) {
    unsafe { sort_raw_impl(base, num, size, cmp, swap_sel, None) };
}

/// Like [`sort_raw`], but also returns comparator-count and partition-stack
/// instrumentation.
///
/// # Safety
/// Same requirements as [`sort_raw`].
pub unsafe fn sort_raw_instrumented(
    base: *mut u8,
    num: usize,
    size: usize,
    cmp: CmpFn,
    swap_sel: SwapSelector,
) -> Stats {
    let mut stats = Stats::default();
    unsafe { sort_raw_impl(base, num, size, cmp, swap_sel, Some(&mut stats)) };
    stats
}

unsafe fn elem(base: *mut u8, size: usize, i: usize) -> *mut u8 {
    unsafe { base.add(i * size) }
}

unsafe fn call_cmp(cmp: CmpFn, a: *const u8, b: *const u8) -> Ordering {
    match unsafe { cmp(a, b) } {
        0 => Ordering::Equal,
        n if n < 0 => Ordering::Less,
        _ => Ordering::Greater,
    }
}

unsafe fn swap_words64(a: *mut u8, b: *mut u8, size: usize) {
    let n = size / 8;
    let (a, b) = (a as *mut u64, b as *mut u64);
    for i in 0..n {
        unsafe { ptr::swap(a.add(i), b.add(i)) };
    }
}

unsafe fn swap_words32(a: *mut u8, b: *mut u8, size: usize) {
    let n = size / 4;
    let (a, b) = (a as *mut u32, b as *mut u32);
    for i in 0..n {
        unsafe { ptr::swap(a.add(i), b.add(i)) };
    }
}

unsafe fn swap_bytes(a: *mut u8, b: *mut u8, size: usize) {
    for i in 0..size {
        unsafe { ptr::swap(a.add(i), b.add(i)) };
    }
}

unsafe fn do_swap(a: *mut u8, b: *mut u8, size: usize, swap_sel: SwapSelector) {
    if a == b {
        return;
    }
    unsafe {
        match swap_sel {
            SwapSelector::Word64 => swap_words64(a, b, size),
            SwapSelector::Word32 => swap_words32(a, b, size),
            SwapSelector::Bytes => swap_bytes(a, b, size),
            SwapSelector::Custom(f) => f(a, b, size),
        }
    }
}

/// Scratch buffer sized to one record, used to hold the heapsort fallback's
/// sift-down "hole" value. Bytes have no destructor, so unlike
/// [`crate::algo::heap`]'s `Hole` guard this is just a plain temporary copy
/// with no drop-on-unwind obligation.
struct Scratch {
    ptr: *mut u8,
    layout: Layout,
}

impl Scratch {
    fn new(size: usize) -> Self {
        let layout = Layout::array::<u8>(size).expect("record size overflows isize");
        let ptr = unsafe { alloc(layout) };
        assert!(!ptr.is_null(), "allocation failure in sort_raw scratch buffer");
        Scratch { ptr, layout }
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr, self.layout) };
    }
}

unsafe fn sort_raw_impl(
    base: *mut u8,
    num: usize,
    size: usize,
    cmp: CmpFn,
    swap_sel: SwapSelector,
    stats: Option<&mut Stats>,
) {
    if num < 2 || size == 0 {
        return;
    }

    let mut comparisons: u64 = 0;
    let mut stack = PartitionStack::new();

    if num > SMALL_THRESHOLD {
        let mut low = 0usize;
        let mut high = num - 1;
        let mut depth = depth_limit(num);

        'outer: loop {
            while high - low > SMALL_THRESHOLD {
                if depth == 0 {
                    unsafe {
                        heap_sort_raw(
                            elem(base, size, low),
                            high - low + 1,
                            size,
                            cmp,
                            swap_sel,
                            &mut comparisons,
                        )
                    };
                    break;
                }
                depth -= 1;

                let (right, left) =
                    unsafe { partition_raw(base, size, low, high, cmp, swap_sel, &mut comparisons) };

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

    unsafe { shell_sort_raw(base, num, size, cmp, swap_sel, &mut comparisons) };

    if let Some(s) = stats {
        s.comparisons = comparisons;
        s.stack_high_water = stack.high_water_mark();
    }
}

unsafe fn partition_raw(
    base: *mut u8,
    size: usize,
    low: usize,
    high: usize,
    cmp: CmpFn,
    swap_sel: SwapSelector,
    comparisons: &mut u64,
) -> (usize, usize) {
    let mid = low + (high - low) / 2;

    macro_rules! lt {
        ($i:expr, $j:expr) => {{
            *comparisons += 1;
            unsafe { call_cmp(cmp, elem(base, size, $i), elem(base, size, $j)) == Ordering::Less }
        }};
    }
    macro_rules! gt {
        ($i:expr, $j:expr) => {{
            *comparisons += 1;
            unsafe { call_cmp(cmp, elem(base, size, $i), elem(base, size, $j)) == Ordering::Greater }
        }};
    }
    macro_rules! swap_at {
        ($i:expr, $j:expr) => {
            unsafe { do_swap(elem(base, size, $i), elem(base, size, $j), size, swap_sel) }
        };
    }

    if lt!(mid, low) {
        swap_at!(mid, low);
    }
    if gt!(mid, high) {
        swap_at!(mid, high);
        if lt!(mid, low) {
            swap_at!(mid, low);
        }
    }

    let mut left = low + 1;
    let mut right = high - 1;
    let mut mid = mid;

    loop {
        while lt!(left, mid) {
            left += 1;
        }
        while lt!(mid, right) {
            right -= 1;
        }

        if left < right {
            swap_at!(left, right);
            if mid == left {
                mid = right;
            } else if mid == right {
                mid = left;
            }
            left += 1;
            right -= 1;
        } else if left == right {
            left += 1;
            right -= 1;
            break;
        } else {
            break;
        }
    }

    (right, left)
}

unsafe fn heap_sort_raw(
    base: *mut u8,
    len: usize,
    size: usize,
    cmp: CmpFn,
    _swap_sel: SwapSelector,
    comparisons: &mut u64,
) {
    if len < 3 {
        return;
    }
    let part_length = len - 2;
    let scratch = Scratch::new(size);

    fn child(i: usize) -> usize {
        2 * i + 2
    }

    let mut k = part_length / 2;
    loop {
        unsafe {
            let hole_ptr = elem(base, size, k);
            ptr::copy_nonoverlapping(hole_ptr, scratch.ptr, size);
            let mut hole = k;

            let mut j = child(hole);
            while j <= part_length {
                if j < part_length {
                    *comparisons += 1;
                    if call_cmp(cmp, elem(base, size, j), elem(base, size, j + 1)) == Ordering::Less {
                        j += 1;
                    }
                }
                *comparisons += 1;
                if call_cmp(cmp, elem(base, size, j), scratch.ptr) != Ordering::Greater {
                    break;
                }
                ptr::copy_nonoverlapping(elem(base, size, j), elem(base, size, hole), size);
                hole = j;
                j = child(hole);
            }

            ptr::copy_nonoverlapping(scratch.ptr, elem(base, size, hole), size);
        }
        if k == 0 {
            break;
        }
        k -= 1;
    }

    let mut remaining = part_length;
    loop {
        unsafe {
            let src = elem(base, size, remaining);
            ptr::copy_nonoverlapping(src, scratch.ptr, size);
            let mut hole = remaining;

            let mut j = 0usize;
            while j < remaining {
                if j < remaining - 1 {
                    *comparisons += 1;
                    if call_cmp(cmp, elem(base, size, j), elem(base, size, j + 1)) == Ordering::Less {
                        j += 1;
                    }
                }
                ptr::copy_nonoverlapping(elem(base, size, j), elem(base, size, hole), size);
                hole = j;
                j = child(hole);
            }

            while hole > 1 {
                let parent = (hole - 2) >> 1;
                *comparisons += 1;
                if call_cmp(cmp, scratch.ptr, elem(base, size, parent)) != Ordering::Greater {
                    break;
                }
                ptr::copy_nonoverlapping(elem(base, size, parent), elem(base, size, hole), size);
                hole = parent;
            }

            ptr::copy_nonoverlapping(scratch.ptr, elem(base, size, hole), size);
        }
        if remaining == 0 {
            break;
        }
        remaining -= 1;
    }
}

unsafe fn shell_sort_raw(
    base: *mut u8,
    num: usize,
    size: usize,
    cmp: CmpFn,
    swap_sel: SwapSelector,
    comparisons: &mut u64,
) {
    const GAPS: [usize; 2] = [4, 1];
    if num < 2 {
        return;
    }

    for &gap in &GAPS {
        let mut j = gap;
        while j < num {
            let mut k = j;
            while k >= gap {
                *comparisons += 1;
                let greater = unsafe {
                    call_cmp(cmp, elem(base, size, k - gap), elem(base, size, k)) == Ordering::Greater
                };
                if !greater {
                    break;
                }
                unsafe { do_swap(elem(base, size, k), elem(base, size, k - gap), size, swap_sel) };
                k -= gap;
            }
            j += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn cmp_i32(a: *const u8, b: *const u8) -> i32 {
        unsafe {
            let a = *(a as *const i32);
            let b = *(b as *const i32);
            a.cmp(&b) as i32
        }
    }

    #[test]
    fn sorts_an_i32_buffer() {
        let mut v: Vec<i32> = vec![5, 3, 8, 1, 9, 2, 7, 4, 6, 0, -3, 42, 17, 2, 2];
        let expected = {
            let mut e = v.clone();
            e.sort();
            e
        };
        let len = v.len();
        unsafe {
            sort_raw(
                v.as_mut_ptr() as *mut u8,
                len,
                std::mem::size_of::<i32>(),
                cmp_i32,
                SwapSelector::Word32,
            );
        }
        assert_eq!(v, expected);
    }

    #[test]
    fn sorts_unsorted_two_and_three_element_buffers() {
        let mut two: Vec<i32> = vec![2, 1];
        unsafe {
            sort_raw(two.as_mut_ptr() as *mut u8, 2, std::mem::size_of::<i32>(), cmp_i32, SwapSelector::Word32);
        }
        assert_eq!(two, vec![1, 2]);

        let mut three: Vec<i32> = vec![3, 1, 2];
        unsafe {
            sort_raw(three.as_mut_ptr() as *mut u8, 3, std::mem::size_of::<i32>(), cmp_i32, SwapSelector::Word32);
        }
        assert_eq!(three, vec![1, 2, 3]);
    }

    #[test]
    fn sorts_a_large_i32_buffer_with_bytewise_swap() {
        let mut v: Vec<i32> = (0..2000).rev().collect();
        let expected: Vec<i32> = (0..2000).collect();
        let len = v.len();
        let stats = unsafe {
            sort_raw_instrumented(
                v.as_mut_ptr() as *mut u8,
                len,
                std::mem::size_of::<i32>(),
                cmp_i32,
                SwapSelector::Bytes,
            )
        };
        assert_eq!(v, expected);
        assert!(stats.comparisons > 0);
    }
}
