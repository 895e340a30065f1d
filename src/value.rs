//! Value types and updaters.
//!
//! A published block's key set never changes, but the single writer may
//! update the value of a key that is already present without republishing.
//! Values therefore live in atomic cells: readers load a whole value and can
//! never observe a half-written one.

use std::sync::atomic::{
    AtomicBool, AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicIsize, AtomicU16, AtomicU32,
    AtomicU64, AtomicU8, AtomicUsize, Ordering,
};

/// A scalar that can be stored in a block and updated in place.
///
/// Cell accesses are `Relaxed`: each cell is one memory location, so its
/// modification order alone gives readers monotonic visibility. Publication of
/// the block holding the cell is ordered separately by the bucket slot.
pub trait AtomicValue: Copy + Send + Sync + 'static {
    /// Atomic storage for `Self`.
    type Cell: Send + Sync;

    /// Wrap a value in a fresh cell.
    fn new_cell(value: Self) -> Self::Cell;

    /// Read the current value.
    fn load(cell: &Self::Cell) -> Self;

    /// Overwrite the current value.
    fn store(cell: &Self::Cell, value: Self);
}

macro_rules! impl_atomic_value {
    ($($ty:ty => $cell:ty),* $(,)?) => {
        $(
            impl AtomicValue for $ty {
                type Cell = $cell;

                #[inline]
                fn new_cell(value: Self) -> Self::Cell {
                    <$cell>::new(value)
                }

                #[inline]
                fn load(cell: &Self::Cell) -> Self {
                    cell.load(Ordering::Relaxed)
                }

                #[inline]
                fn store(cell: &Self::Cell, value: Self) {
                    cell.store(value, Ordering::Relaxed)
                }
            }
        )*
    };
}

impl_atomic_value! {
    bool => AtomicBool,
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    u64 => AtomicU64,
    usize => AtomicUsize,
    i8 => AtomicI8,
    i16 => AtomicI16,
    i32 => AtomicI32,
    i64 => AtomicI64,
    isize => AtomicIsize,
}

macro_rules! impl_atomic_float {
    ($($ty:ty => $cell:ty),* $(,)?) => {
        $(
            impl AtomicValue for $ty {
                type Cell = $cell;

                #[inline]
                fn new_cell(value: Self) -> Self::Cell {
                    <$cell>::new(value.to_bits())
                }

                #[inline]
                fn load(cell: &Self::Cell) -> Self {
                    <$ty>::from_bits(cell.load(Ordering::Relaxed))
                }

                #[inline]
                fn store(cell: &Self::Cell, value: Self) {
                    cell.store(value.to_bits(), Ordering::Relaxed)
                }
            }
        )*
    };
}

impl_atomic_float! {
    f32 => AtomicU32,
    f64 => AtomicU64,
}

/// Updater that replaces the existing value.
#[inline]
pub fn assign<V>(slot: &mut V, value: V) {
    *slot = value;
}

/// Updater that adds the incoming value to the existing one.
#[inline]
pub fn add<V: std::ops::AddAssign>(slot: &mut V, value: V) {
    *slot += value;
}
