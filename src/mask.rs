use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr, BitXor, Not};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bits::{enumerate_set_bits, SetBits, Word};
use crate::error::{BitSetError, Result};
use crate::position::{from_bit_index, to_bit_index, BitEnum};

/// Set operations shared by every mask width. Binary operations take any
/// [`IntoMask`] operand.
pub trait SetAlgebra: Copy + Eq + Hash + Default + fmt::Debug + IntoMask<Self> {
    type Member: BitEnum;
    type Word: Word;

    /// Wraps `bits` without checking them against declared members.
    fn from_bits(bits: Self::Word) -> Self;

    fn bits(self) -> Self::Word;

    fn bit_mask(value: Self::Member) -> Result<Self> {
        let index = to_bit_index(value, Self::Word::BITS)?;
        Ok(Self::from_bits(Self::Word::bit(index)))
    }

    /// Mask holding every member of `values`, folded left to right.
    fn from_members<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Self::Member>,
    {
        values
            .into_iter()
            .try_fold(Self::default(), |mask, value| mask.union_value(value))
    }

    fn union_value(self, value: Self::Member) -> Result<Self> {
        Ok(Self::from_bits(self.bits() | Self::bit_mask(value)?.bits()))
    }

    fn union<O: IntoMask<Self>>(self, other: O) -> Result<Self> {
        Ok(Self::from_bits(self.bits() | other.into_mask()?.bits()))
    }

    fn intersection<O: IntoMask<Self>>(self, other: O) -> Result<Self> {
        Ok(Self::from_bits(self.bits() & other.into_mask()?.bits()))
    }

    fn difference_value(self, value: Self::Member) -> Result<Self> {
        Ok(Self::from_bits(self.bits() & !Self::bit_mask(value)?.bits()))
    }

    fn difference<O: IntoMask<Self>>(self, other: O) -> Result<Self> {
        Ok(Self::from_bits(self.bits() & !other.into_mask()?.bits()))
    }

    fn symmetric_difference<O: IntoMask<Self>>(self, other: O) -> Result<Self> {
        Ok(Self::from_bits(self.bits() ^ other.into_mask()?.bits()))
    }

    /// Every bit flipped, including bits no declared member maps to.
    fn complement(self) -> Self {
        Self::from_bits(!self.bits())
    }

    fn contains(self, value: Self::Member) -> Result<bool> {
        let bit = Self::bit_mask(value)?.bits();
        Ok(self.bits() & bit != Self::Word::ZERO)
    }

    fn is_subset_of<O: IntoMask<Self>>(self, other: O) -> Result<bool> {
        let other = other.into_mask()?.bits();
        Ok(self.bits() & other == self.bits())
    }

    fn is_superset_of<O: IntoMask<Self>>(self, other: O) -> Result<bool> {
        let other = other.into_mask()?.bits();
        Ok(self.bits() & other == other)
    }

    fn is_proper_subset_of<O: IntoMask<Self>>(self, other: O) -> Result<bool> {
        let other = other.into_mask()?.bits();
        Ok(self.bits() & other == self.bits() && self.bits() != other)
    }

    fn is_proper_superset_of<O: IntoMask<Self>>(self, other: O) -> Result<bool> {
        let other = other.into_mask()?.bits();
        Ok(self.bits() & other == other && self.bits() != other)
    }

    fn overlaps<O: IntoMask<Self>>(self, other: O) -> Result<bool> {
        Ok(self.bits() & other.into_mask()?.bits() != Self::Word::ZERO)
    }

    fn set_equals<O: IntoMask<Self>>(self, other: O) -> Result<bool> {
        Ok(self.bits() == other.into_mask()?.bits())
    }

    fn count(self) -> usize {
        self.bits().count_ones() as usize
    }

    fn have_set_bits(self) -> bool {
        self.bits() != Self::Word::ZERO
    }

    /// Members in ascending bit order.
    fn members(self) -> Members<Self::Member, Self::Word> {
        Members {
            bits: enumerate_set_bits(self.bits()),
            marker: PhantomData,
        }
    }
}

/// Conversion of an operand into a mask of width `M`.
pub trait IntoMask<M> {
    fn into_mask(self) -> Result<M>;
}

impl<M, I> IntoMask<M> for Option<I>
where
    I: IntoMask<M>,
{
    fn into_mask(self) -> Result<M> {
        match self {
            Some(inner) => inner.into_mask(),
            None => Err(BitSetError::ArgumentRequired("other")),
        }
    }
}

impl<'a, M: SetAlgebra> IntoMask<M> for &'a [M::Member] {
    fn into_mask(self) -> Result<M> {
        M::from_members(self.iter().copied())
    }
}

impl<'a, M: SetAlgebra, const N: usize> IntoMask<M> for &'a [M::Member; N] {
    fn into_mask(self) -> Result<M> {
        M::from_members(self.iter().copied())
    }
}

impl<M: SetAlgebra, const N: usize> IntoMask<M> for [M::Member; N] {
    fn into_mask(self) -> Result<M> {
        M::from_members(self)
    }
}

impl<'a, M: SetAlgebra> IntoMask<M> for &'a Vec<M::Member> {
    fn into_mask(self) -> Result<M> {
        M::from_members(self.iter().copied())
    }
}

impl<M: SetAlgebra> IntoMask<M> for Vec<M::Member> {
    fn into_mask(self) -> Result<M> {
        M::from_members(self)
    }
}

/// Members of a mask in ascending bit order.
///
/// Set bits that no declared member maps to are skipped.
pub struct Members<T, W> {
    bits: SetBits<W>,
    marker: PhantomData<fn() -> T>,
}

impl<T, W: Copy> Clone for Members<T, W> {
    fn clone(&self) -> Self {
        Members {
            bits: self.bits,
            marker: PhantomData,
        }
    }
}

impl<T: BitEnum, W: Word> Iterator for Members<T, W> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.bits.by_ref().find_map(from_bit_index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.bits.size_hint().1)
    }
}

impl<T: BitEnum, W: Word> FusedIterator for Members<T, W> {}

macro_rules! bit_mask {
    ($(#[$meta:meta])* $name:ident, $word:ty) => {
        $(#[$meta])*
        pub struct $name<T> {
            bits: $word,
            marker: PhantomData<fn() -> T>,
        }

        impl<T> $name<T> {
            pub const EMPTY: Self = Self::new(0);

            pub const fn new(bits: $word) -> Self {
                $name {
                    bits,
                    marker: PhantomData,
                }
            }

            pub const fn bits(self) -> $word {
                self.bits
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::EMPTY
            }
        }

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.bits == other.bits
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T> Hash for $name<T> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.bits.hash(state)
            }
        }

        impl<T: BitEnum> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.debug_set().entries(self.members()).finish()
            }
        }

        impl<T: BitEnum> SetAlgebra for $name<T> {
            type Member = T;
            type Word = $word;

            #[inline]
            fn from_bits(bits: $word) -> Self {
                Self::new(bits)
            }

            #[inline]
            fn bits(self) -> $word {
                self.bits
            }
        }

        impl<T: BitEnum> IntoMask<$name<T>> for $name<T> {
            fn into_mask(self) -> Result<Self> {
                Ok(self)
            }
        }

        impl<'a, T: BitEnum> IntoMask<$name<T>> for &'a $name<T> {
            fn into_mask(self) -> Result<$name<T>> {
                Ok(*self)
            }
        }

        impl<T: BitEnum> IntoIterator for $name<T> {
            type Item = T;
            type IntoIter = Members<T, $word>;

            fn into_iter(self) -> Self::IntoIter {
                self.members()
            }
        }

        impl<T> BitAnd for $name<T> {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self::new(self.bits & rhs.bits)
            }
        }

        impl<T> BitOr for $name<T> {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self::new(self.bits | rhs.bits)
            }
        }

        impl<T> BitXor for $name<T> {
            type Output = Self;

            fn bitxor(self, rhs: Self) -> Self {
                Self::new(self.bits ^ rhs.bits)
            }
        }

        impl<T> Not for $name<T> {
            type Output = Self;

            fn not(self) -> Self {
                Self::new(!self.bits)
            }
        }

        impl<T> Serialize for $name<T> {
            fn serialize<S: Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                self.bits.serialize(serializer)
            }
        }

        impl<'de, T> Deserialize<'de> for $name<T> {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                <$word>::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

bit_mask!(
    /// Set of up to 32 enumeration members packed in a `u32`.
    BitMask32,
    u32
);

bit_mask!(
    /// Set of up to 64 enumeration members packed in a `u64`.
    BitMask64,
    u64
);

#[cfg(test)]
use crate::test_enums::*;

#[cfg(test)]
fn empty_mask<M: SetAlgebra>() {
    let [zero, one, two, three] = four::<M::Member>();
    let mask = M::default();

    assert_eq!(mask.count(), 0);
    assert!(!mask.have_set_bits());
    assert!(mask.set_equals(&[] as &[M::Member]).unwrap());
    for value in [zero, one, two, three] {
        assert!(!mask.contains(value).unwrap());
        assert!(!mask.set_equals([value]).unwrap());
    }
    assert_eq!(mask.members().next(), None);
}

#[cfg(test)]
fn singleton_mask<M: SetAlgebra>() {
    let [zero, one, two, three] = four::<M::Member>();
    let mask = M::bit_mask(zero).unwrap();

    assert_eq!(mask.count(), 1);
    assert!(mask.have_set_bits());
    assert!(mask.contains(zero).unwrap());
    assert!(!mask.contains(one).unwrap());
    assert!(!mask.contains(two).unwrap());
    assert!(!mask.contains(three).unwrap());
    assert_eq!(mask.members().collect::<Vec<_>>(), vec![zero]);
}

#[cfg(test)]
fn full_mask<M: SetAlgebra>() {
    let [zero, one, two, three] = four::<M::Member>();
    let mask = M::from_members([three, zero, two, one, zero]).unwrap();

    assert_eq!(mask.count(), 4);
    assert!(mask.set_equals([zero, one, two, three]).unwrap());
    assert_eq!(mask.members().collect::<Vec<_>>(), vec![zero, one, two, three]);
    // a fresh traversal starts over
    assert_eq!(mask.members().count(), 4);
}

#[cfg(test)]
fn mask_algebra<M: SetAlgebra>() {
    let [zero, one, two, three] = four::<M::Member>();
    let a = M::from_members([zero, one]).unwrap();

    assert!(a.union([one, three]).unwrap().set_equals([zero, one, three]).unwrap());
    assert!(a.union_value(two).unwrap().set_equals([zero, one, two]).unwrap());
    assert!(a.intersection([one, two]).unwrap().set_equals([one]).unwrap());
    assert!(a.difference([zero, three]).unwrap().set_equals([one]).unwrap());
    assert!(a.difference_value(one).unwrap().set_equals([zero]).unwrap());
    assert!(a.difference_value(two).unwrap().set_equals(a).unwrap());
    assert!(a
        .symmetric_difference([one, three])
        .unwrap()
        .set_equals([zero, three])
        .unwrap());

    assert!(a.overlaps([zero, one, two]).unwrap());
    assert!(a.overlaps([one, three]).unwrap());
    assert!(!a.overlaps(&[] as &[M::Member]).unwrap());
    assert!(!a.overlaps([two, three]).unwrap());

    let z = M::bit_mask(zero).unwrap();
    assert!(z.is_subset_of([zero]).unwrap());
    assert!(z.is_subset_of([zero, three]).unwrap());
    assert!(!z.is_subset_of([one]).unwrap());
    assert!(!z.is_proper_subset_of([zero]).unwrap());
    assert!(z.is_proper_subset_of([zero, two]).unwrap());

    let zt = M::from_members([zero, two]).unwrap();
    assert!(zt.is_superset_of([zero]).unwrap());
    assert!(zt.is_superset_of([zero, two]).unwrap());
    assert!(!zt.is_superset_of([zero, three]).unwrap());
    assert!(zt.is_proper_superset_of([two]).unwrap());
    assert!(!zt.is_proper_superset_of([zero, two]).unwrap());
}

#[cfg(test)]
fn absent_operand<M: SetAlgebra>() {
    let [zero, ..] = four::<M::Member>();
    let mask = M::bit_mask(zero).unwrap();
    let none = None::<&[M::Member]>;
    let required = Err(BitSetError::ArgumentRequired("other"));

    assert_eq!(mask.union(none), required);
    assert_eq!(mask.intersection(none), required);
    assert_eq!(mask.difference(none), required);
    assert_eq!(mask.symmetric_difference(none), required);
    assert_eq!(mask.is_subset_of(none), required.clone().map(|_: M| false));
    assert_eq!(mask.is_superset_of(none), required.clone().map(|_: M| false));
    assert_eq!(mask.is_proper_subset_of(none), required.clone().map(|_: M| false));
    assert_eq!(mask.is_proper_superset_of(none), required.clone().map(|_: M| false));
    assert_eq!(mask.overlaps(none), required.clone().map(|_: M| false));
    assert_eq!(mask.set_equals(none), required.map(|_: M| false));

    assert!(mask.union(Some([zero])).unwrap().set_equals([zero]).unwrap());
}

#[cfg(test)]
fn de_morgan<M: SetAlgebra>() {
    let [zero, one, two, three] = four::<M::Member>();
    let a = M::from_members([zero, two]).unwrap();
    let b = M::from_members([two, three]).unwrap();
    let c = M::from_members([one]).unwrap();

    for (x, y) in [(a, b), (a, c), (b, c), (a, M::default())] {
        let lhs = x.union(y).unwrap().complement();
        let rhs = x.complement().intersection(y.complement()).unwrap();
        assert_eq!(lhs, rhs);
    }
}

#[test]
fn empty_masks() {
    for_each_layout!(empty_mask);
}

#[test]
fn singleton_masks() {
    for_each_layout!(singleton_mask);
}

#[test]
fn full_masks() {
    for_each_layout!(full_mask);
}

#[test]
fn masks_algebra() {
    for_each_layout!(mask_algebra);
}

#[test]
fn masks_reject_absent_operand() {
    for_each_layout!(absent_operand);
}

#[test]
fn masks_de_morgan() {
    for_each_layout!(de_morgan);
}

#[test]
fn mask_operators() {
    let a = BitMask32::<TestEnum32>::new(0b0011);
    let b = BitMask32::<TestEnum32>::new(0b0110);

    assert_eq!((a | b).bits(), 0b0111);
    assert_eq!((a & b).bits(), 0b0010);
    assert_eq!((a ^ b).bits(), 0b0101);
    assert_eq!((!a).bits(), !0b0011);
    assert_eq!(!a, a.complement());
    assert_eq!(a.union(b), Ok(a | b));
    assert_eq!(a.union(&b), Ok(a | b));
}

#[test]
fn mask_layout_matches_style() {
    let ordinal = BitMask64::<TestEnum64>::from_members([TestEnum64::One, TestEnum64::Three]).unwrap();
    assert_eq!(ordinal.bits(), 0b1010);

    let flags = BitMask32::<HighFlags>::from_members([HighFlags::Low, HighFlags::Top32]).unwrap();
    assert_eq!(flags.bits(), 1 << 31 | 1);

    let sparse = BitMask32::<Sparse>::from_members([Sparse::C]).unwrap();
    assert_eq!(sparse.bits(), 0b100);
}

#[test]
fn mask_width_limits() {
    assert_eq!(BitMask32::<Wide>::bit_mask(Wide::W31).map(|m| m.bits()), Ok(1 << 31));
    assert!(matches!(
        BitMask32::<Wide>::bit_mask(Wide::W32),
        Err(BitSetError::OutOfRange { index: 32, width: 32, .. })
    ));
    assert_eq!(BitMask64::<Wide>::bit_mask(Wide::W63).map(|m| m.bits()), Ok(1 << 63));
    assert!(matches!(
        BitMask64::<Wide>::bit_mask(Wide::W64),
        Err(BitSetError::OutOfRange { index: 64, width: 64, .. })
    ));

    // the fold stops at the first unrepresentable member
    assert!(BitMask32::<Wide>::from_members([Wide::W0, Wide::W40]).is_err());
    assert!(BitMask32::<Wide>::default().contains(Wide::W33).is_err());
}

#[test]
fn undeclared_bits_are_kept() {
    let mask = BitMask32::<TestEnum32>::new(1 << 1 | 1 << 20);
    assert_eq!(mask.count(), 2);
    assert_eq!(mask.members().collect::<Vec<_>>(), vec![TestEnum32::One]);
    assert_eq!(format!("{:?}", mask), "{One}");
}

#[test]
fn mask_serde_is_raw() {
    let mask = BitMask64::<TestFlags64>::from_members([TestFlags64::One, TestFlags64::Three]).unwrap();
    assert_eq!(serde_json::to_string(&mask).unwrap(), "10");

    let back: BitMask64<TestFlags64> = serde_json::from_str("10").unwrap();
    assert_eq!(back, mask);
}
