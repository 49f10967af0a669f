use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::ops::{BitAnd, BitOr, BitXor, Not};

pub trait Word:
    Copy
    + Eq
    + Hash
    + Default
    + fmt::Debug
    + fmt::Binary
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Send
    + Sync
    + 'static
{
    const BITS: u32;
    const ZERO: Self;

    /// Word with only bit `index` set. `index` must be below `BITS`.
    fn bit(index: u32) -> Self;

    fn count_ones(self) -> u32;

    fn trailing_zeros(self) -> u32;

    fn clear_lowest(self) -> Self;

    fn to_u64(self) -> u64;

    /// Keeps the low `BITS` bits of `raw`.
    fn truncate_u64(raw: u64) -> Self;
}

macro_rules! impl_word {
    ($($ty:ty),*) => {$(
        impl Word for $ty {
            const BITS: u32 = <$ty>::BITS;
            const ZERO: Self = 0;

            #[inline]
            fn bit(index: u32) -> Self {
                1 << index
            }

            #[inline]
            fn count_ones(self) -> u32 {
                <$ty>::count_ones(self)
            }

            #[inline]
            fn trailing_zeros(self) -> u32 {
                <$ty>::trailing_zeros(self)
            }

            #[inline]
            fn clear_lowest(self) -> Self {
                self & self.wrapping_sub(1)
            }

            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline]
            fn truncate_u64(raw: u64) -> Self {
                raw as $ty
            }
        }
    )*};
}

impl_word!(u32, u64);

#[inline]
pub fn count_set_bits<W: Word>(mask: W) -> u32 {
    mask.count_ones()
}

/// Indices of the set bits of `mask`, lowest first.
#[inline]
pub fn enumerate_set_bits<W: Word>(mask: W) -> SetBits<W> {
    SetBits { remaining: mask }
}

/// Consumes the lowest remaining bit per step. A clone restarts from bit 0.
#[derive(Clone, Copy, Debug)]
pub struct SetBits<W> {
    remaining: W,
}

impl<W: Word> Iterator for SetBits<W> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == W::ZERO {
            return None;
        }
        let index = self.remaining.trailing_zeros();
        self.remaining = self.remaining.clear_lowest();
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl<W: Word> ExactSizeIterator for SetBits<W> {}

impl<W: Word> FusedIterator for SetBits<W> {}

#[test]
fn count_matches_popcount() {
    assert_eq!(count_set_bits(0u32), 0);
    assert_eq!(count_set_bits(0b1011u32), 3);
    assert_eq!(count_set_bits(u32::MAX), 32);
    assert_eq!(count_set_bits(u64::MAX), 64);
    assert_eq!(count_set_bits(1u64 << 63 | 1), 2);
}

#[test]
fn set_bits_ascending() {
    assert_eq!(enumerate_set_bits(0u32).count(), 0);
    assert_eq!(
        enumerate_set_bits(0b1010_0101u32).collect::<Vec<_>>(),
        vec![0, 2, 5, 7]
    );
    assert_eq!(
        enumerate_set_bits(1u32 << 31 | 1 << 3).collect::<Vec<_>>(),
        vec![3, 31]
    );
    assert_eq!(
        enumerate_set_bits(1u64 << 63 | 1 << 32 | 1).collect::<Vec<_>>(),
        vec![0, 32, 63]
    );
    assert_eq!(enumerate_set_bits(u64::MAX).collect::<Vec<_>>(), (0..64).collect::<Vec<_>>());
}

#[test]
fn set_bits_restartable() {
    let bits = enumerate_set_bits(0b110u64);
    assert_eq!(bits.len(), 2);

    let mut first = bits;
    assert_eq!(first.next(), Some(1));
    assert_eq!(first.next(), Some(2));
    assert_eq!(first.next(), None);
    assert_eq!(first.next(), None);

    // the copy taken before iterating is untouched
    assert_eq!(bits.collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn word_helpers() {
    assert_eq!(<u32 as Word>::bit(31), 0x8000_0000);
    assert_eq!(<u64 as Word>::bit(40), 1 << 40);
    assert_eq!(0b1100u32.clear_lowest(), 0b1000);
    assert_eq!(0u64.clear_lowest(), 0);
    assert_eq!(<u32 as Word>::truncate_u64(0x1_0000_0003), 3);
    assert_eq!((u32::MAX).to_u64(), 0xffff_ffff);
}
