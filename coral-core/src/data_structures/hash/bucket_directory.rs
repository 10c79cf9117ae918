use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

const FIRST_SEGMENT_BITS: u32 = 6;
const FIRST_SEGMENT_LEN: u64 = 1 << FIRST_SEGMENT_BITS;

/// Highest bucket count the directory can address.
pub(crate) const MAX_BUCKETS: u64 = 1 << 32;

// Segment 0 covers [0, 64); segment s >= 1 covers [64 << (s-1), 64 << s).
const SEGMENT_COUNT: usize = (32 - FIRST_SEGMENT_BITS) as usize + 1;

/// Growable table of bucket-sentinel pointers.
///
/// A logically unbounded array split into segments of doubling size, each
/// allocated on first touch and installed with a CAS:
///
/// ```text
///   segments: [ s0 | s1 | s2 | s3 | ... ]
///                │    │    │
///                │    │    └──► [128 .. 256)
///                │    └───────► [64 .. 128)
///                └────────────► [0 .. 64)
/// ```
///
/// Slots only move from null to a sentinel, once. The directory does not own
/// the nodes its slots point at; dropping it frees the segments only.
///
pub(crate) struct BucketDirectory<N> {
    segments: [AtomicPtr<AtomicPtr<N>>; SEGMENT_COUNT],
}

#[inline]
fn locate(index: u64) -> (usize, usize) {
    if index < FIRST_SEGMENT_LEN {
        return (0, index as usize);
    }
    let high_bit = 63 - index.leading_zeros();
    let segment = (high_bit - FIRST_SEGMENT_BITS + 1) as usize;
    (segment, (index - (1u64 << high_bit)) as usize)
}

#[inline]
fn segment_len(segment: usize) -> usize {
    if segment == 0 {
        FIRST_SEGMENT_LEN as usize
    } else {
        (FIRST_SEGMENT_LEN as usize) << (segment - 1)
    }
}

impl<N> BucketDirectory<N> {
    pub(crate) fn new() -> Self {
        BucketDirectory {
            segments: std::array::from_fn(|_| AtomicPtr::new(ptr::null_mut())),
        }
    }

    /// Sentinel published at `index`, or null.
    pub(crate) fn get(&self, index: u64) -> *mut N {
        debug_assert!(index < MAX_BUCKETS);
        let (segment, offset) = locate(index);
        let slots = self.segments[segment].load(Ordering::Acquire);
        if slots.is_null() {
            return ptr::null_mut();
        }
        unsafe { (*slots.add(offset)).load(Ordering::Acquire) }
    }

    /// Publish `node` at `index` unless another thread got there first.
    ///
    /// Returns the winning pointer in either case.
    pub(crate) fn publish(&self, index: u64, node: *mut N) -> *mut N {
        debug_assert!(index < MAX_BUCKETS);
        let (segment, offset) = locate(index);
        let slots = self.segment_or_allocate(segment);
        let slot = unsafe { &*slots.add(offset) };
        match slot.compare_exchange(ptr::null_mut(), node, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => node,
            Err(winner) => winner,
        }
    }

    fn segment_or_allocate(&self, segment: usize) -> *mut AtomicPtr<N> {
        let current = self.segments[segment].load(Ordering::Acquire);
        if !current.is_null() {
            return current;
        }

        let len = segment_len(segment);
        let fresh: Box<[AtomicPtr<N>]> = (0..len).map(|_| AtomicPtr::new(ptr::null_mut())).collect();
        let fresh = Box::into_raw(fresh) as *mut AtomicPtr<N>;

        match self.segments[segment].compare_exchange(
            ptr::null_mut(),
            fresh,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(segment, len, "allocated directory segment");
                fresh
            }
            Err(winner) => {
                unsafe { free_segment(fresh, len) };
                winner
            }
        }
    }
}

unsafe fn free_segment<N>(slots: *mut AtomicPtr<N>, len: usize) {
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(slots, len)) });
}

impl<N> Drop for BucketDirectory<N> {
    fn drop(&mut self) {
        for (segment, slots) in self.segments.iter_mut().enumerate() {
            let slots = *slots.get_mut();
            if !slots.is_null() {
                unsafe { free_segment(slots, segment_len(segment)) };
            }
        }
    }
}
