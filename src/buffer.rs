//! Shared dense storage.
//!
//! [`Buffer`] is the only type in the crate that owns element memory. A
//! matrix holds an `Arc<Buffer<T>>`; every view derived from it clones the
//! `Arc`, so "two matrices share storage" is exactly `Arc` pointer equality.
//!
//! Cells sit behind `UnsafeCell` so that disjoint sub-views of one buffer can
//! be written from different worker threads. The dispatcher partitions the
//! output index range exactly once, which is what makes the `Sync`
//! implementation sound there; single-threaded callers are serialized by the
//! `&mut` receivers on the matrix API.

use std::cell::UnsafeCell;

pub(crate) struct Buffer<T> {
    cells: Box<[UnsafeCell<T>]>,
}

// SAFETY: access is only through `read`/`write`, whose contract requires the
// caller to keep concurrent writers on disjoint cells.
unsafe impl<T: Send> Send for Buffer<T> {}
unsafe impl<T: Send + Sync> Sync for Buffer<T> {}

impl<T: Copy> Buffer<T> {
    pub(crate) fn filled(len: usize, value: T) -> Self {
        Self::from_vec(vec![value; len])
    }

    pub(crate) fn from_vec(values: Vec<T>) -> Self {
        let cells: Vec<UnsafeCell<T>> = values.into_iter().map(UnsafeCell::new).collect();
        Buffer {
            cells: cells.into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Read the cell at physical index `i`.
    ///
    /// # Safety
    /// No other thread may be writing cell `i` during the call. The index is
    /// still bounds-checked.
    #[inline]
    pub(crate) unsafe fn read(&self, i: usize) -> T {
        *self.cells[i].get()
    }

    /// Write the cell at physical index `i`.
    ///
    /// # Safety
    /// No other thread may be reading or writing cell `i` during the call.
    /// The index is still bounds-checked.
    #[inline]
    pub(crate) unsafe fn write(&self, i: usize, value: T) {
        *self.cells[i].get() = value;
    }
}
