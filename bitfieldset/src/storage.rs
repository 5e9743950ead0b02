//! Word storage backends.
//!
//! Accessors only ever load and store whole words, one access per word, through [`Storage`]. Three
//! backends are provided:
//!
//! - `[W; N]`, plain memory. Accesses may be combined or elided by the optimizer.
//! - [`Volatile`], owned memory that is also observed by something outside the program, such as a
//!   DMA descriptor. Every access is a single volatile access of the full word.
//! - [`Mmio`], a borrowed window onto memory-mapped device registers. Every access is a single
//!   volatile access of the full word.
//!
//! Volatile accesses are emitted in program order relative to each other. Nothing here is atomic;
//! two contexts updating fields of the same word need external synchronization.

use core::fmt::{self, Debug, Formatter};
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::Word;

/// An array of words that accessors load from and store to.
pub trait Storage {
    /// The word type.
    type Word: Word;

    /// The number of words.
    const LEN: usize;

    /// Loads word `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= LEN`.
    fn load(&self, index: usize) -> Self::Word;

    /// Stores word `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= LEN`.
    fn store(&mut self, index: usize, value: Self::Word);
}

impl<W: Word, const N: usize> Storage for [W; N] {
    type Word = W;

    const LEN: usize = N;

    #[inline(always)]
    fn load(&self, index: usize) -> W {
        self[index]
    }

    #[inline(always)]
    fn store(&mut self, index: usize, value: W) {
        self[index] = value;
    }
}

/// Owned storage accessed only with volatile loads and stores.
///
/// `Volatile` is not `Clone` or `Copy`, since a copy would read the words without volatile
/// accesses.
#[repr(transparent)]
pub struct Volatile<T>(T);

impl<T> Volatile<T> {
    /// Wraps `value`.
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Unwraps the storage.
    #[inline(always)]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<W: Word, const N: usize> Storage for Volatile<[W; N]> {
    type Word = W;

    const LEN: usize = N;

    #[inline(always)]
    fn load(&self, index: usize) -> W {
        // SAFETY: The reference is valid, aligned and bounds checked.
        unsafe { ptr::read_volatile(&self.0[index]) }
    }

    #[inline(always)]
    fn store(&mut self, index: usize, value: W) {
        // SAFETY: The reference is valid, aligned and bounds checked.
        unsafe { ptr::write_volatile(&mut self.0[index], value) }
    }
}

impl<T> Debug for Volatile<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Volatile").finish_non_exhaustive()
    }
}

/// A borrowed window of `N` words of device memory.
///
/// Loads and stores are volatile, full width and bounds checked.
pub struct Mmio<'a, W, const N: usize> {
    base: NonNull<[W; N]>,
    _phantom_lifetime: PhantomData<&'a mut [W; N]>,
}

impl<'a, W: Word, const N: usize> Mmio<'a, W, N> {
    /// Creates a window onto the `N` words at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be non-null, aligned for `W` and valid for volatile reads and writes of `N`
    /// words for `'a`. No other `Mmio` or reference may access the same words during `'a`.
    #[inline(always)]
    pub const unsafe fn new_unchecked(base: *mut [W; N]) -> Self {
        Self {
            base: NonNull::new_unchecked(base),
            _phantom_lifetime: PhantomData,
        }
    }

    /// Creates a window onto ordinary memory.
    ///
    /// The accesses are still volatile, which makes this useful to stand in for device memory.
    #[inline(always)]
    pub fn from_mut(words: &'a mut [W; N]) -> Self {
        Self {
            base: NonNull::from(words),
            _phantom_lifetime: PhantomData,
        }
    }

    /// Returns the base address.
    #[inline(always)]
    pub fn as_ptr(&self) -> *mut [W; N] {
        self.base.as_ptr()
    }

    #[inline(always)]
    fn word_ptr(&self, index: usize) -> *mut W {
        assert!(index < N, "word index {index} out of range for {N} words");
        // SAFETY: `index` is in bounds of the window, which the constructor requires to be valid.
        unsafe { self.base.as_ptr().cast::<W>().add(index) }
    }
}

impl<W: Word, const N: usize> Storage for Mmio<'_, W, N> {
    type Word = W;

    const LEN: usize = N;

    #[inline(always)]
    fn load(&self, index: usize) -> W {
        // SAFETY: The pointer is in bounds, aligned and valid for reads per the constructor.
        unsafe { ptr::read_volatile(self.word_ptr(index)) }
    }

    #[inline(always)]
    fn store(&mut self, index: usize, value: W) {
        // SAFETY: The pointer is in bounds, aligned and valid for writes per the constructor.
        unsafe { ptr::write_volatile(self.word_ptr(index), value) }
    }
}

impl<W, const N: usize> Debug for Mmio<'_, W, N> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Mmio")
            .field("base", &self.base)
            .field("len", &N)
            .finish()
    }
}
