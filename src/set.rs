use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BitSetError, Result};
use crate::mask::{BitMask32, BitMask64, IntoMask, Members, SetAlgebra};
use crate::position::BitEnum;

/// Mutable set of enumeration members backed by a single mask.
///
/// Every mutation computes a complete new mask before storing it, so a
/// failed operation leaves the set untouched. Equality is equality of the
/// masks.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumSet<M> {
    mask: M,
}

/// Set of up to 32 members.
pub type EnumSet32<T> = EnumSet<BitMask32<T>>;

/// Set of up to 64 members.
pub type EnumSet64<T> = EnumSet<BitMask64<T>>;

impl<M: SetAlgebra> EnumSet<M> {
    pub fn new() -> Self {
        EnumSet { mask: M::default() }
    }

    pub fn with(value: M::Member) -> Result<Self> {
        Ok(EnumSet {
            mask: M::bit_mask(value)?,
        })
    }

    pub fn from_members<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = M::Member>,
    {
        Ok(EnumSet {
            mask: M::from_members(values)?,
        })
    }

    /// Every declared member that owns a bit.
    ///
    /// Zero and composite flags values are skipped. Fails if any member
    /// does not fit the mask.
    pub fn all() -> Result<Self> {
        let mut mask = M::default();
        for &(_, value) in <M::Member as BitEnum>::MEMBERS {
            match mask.union_value(value) {
                Ok(next) => mask = next,
                Err(BitSetError::NotSingleBit { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(EnumSet { mask })
    }

    pub fn from_mask(mask: M) -> Self {
        EnumSet { mask }
    }

    pub fn to_mask(&self) -> M {
        self.mask
    }

    /// Wraps a raw mask, keeping bits that no declared member maps to.
    pub fn from_raw(bits: M::Word) -> Self {
        EnumSet {
            mask: M::from_bits(bits),
        }
    }

    pub fn to_raw(&self) -> M::Word {
        self.mask.bits()
    }

    pub fn len(&self) -> usize {
        self.mask.count()
    }

    pub fn is_empty(&self) -> bool {
        !self.mask.have_set_bits()
    }

    /// Whether any bit is set.
    pub fn any(&self) -> bool {
        self.mask.have_set_bits()
    }

    pub fn iter(&self) -> Members<M::Member, M::Word> {
        self.mask.members()
    }

    pub fn contains(&self, value: M::Member) -> Result<bool> {
        self.mask.contains(value)
    }

    /// Inserts `value`, returning whether it was absent.
    pub fn add(&mut self, value: M::Member) -> Result<bool> {
        if self.mask.contains(value)? {
            return Ok(false);
        }
        self.mask = self.mask.union_value(value)?;
        Ok(true)
    }

    /// Removes `value`, returning whether it was present.
    pub fn remove(&mut self, value: M::Member) -> Result<bool> {
        if !self.mask.contains(value)? {
            return Ok(false);
        }
        self.mask = self.mask.difference_value(value)?;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.mask = M::default();
    }

    /// Replaces the whole membership with `values`.
    pub fn replace_with<O: IntoMask<M>>(&mut self, values: O) -> Result<()> {
        self.mask = values.into_mask()?;
        Ok(())
    }

    pub fn union_with<O: IntoMask<M>>(&mut self, other: O) -> Result<()> {
        self.mask = self.mask.union(other)?;
        Ok(())
    }

    pub fn intersect_with<O: IntoMask<M>>(&mut self, other: O) -> Result<()> {
        self.mask = self.mask.intersection(other)?;
        Ok(())
    }

    pub fn except_with<O: IntoMask<M>>(&mut self, other: O) -> Result<()> {
        self.mask = self.mask.difference(other)?;
        Ok(())
    }

    pub fn symmetric_except_with<O: IntoMask<M>>(&mut self, other: O) -> Result<()> {
        self.mask = self.mask.symmetric_difference(other)?;
        Ok(())
    }

    pub fn is_subset_of<O: IntoMask<M>>(&self, other: O) -> Result<bool> {
        self.mask.is_subset_of(other)
    }

    pub fn is_superset_of<O: IntoMask<M>>(&self, other: O) -> Result<bool> {
        self.mask.is_superset_of(other)
    }

    pub fn is_proper_subset_of<O: IntoMask<M>>(&self, other: O) -> Result<bool> {
        self.mask.is_proper_subset_of(other)
    }

    pub fn is_proper_superset_of<O: IntoMask<M>>(&self, other: O) -> Result<bool> {
        self.mask.is_proper_superset_of(other)
    }

    pub fn overlaps<O: IntoMask<M>>(&self, other: O) -> Result<bool> {
        self.mask.overlaps(other)
    }

    pub fn set_equals<O: IntoMask<M>>(&self, other: O) -> Result<bool> {
        self.mask.set_equals(other)
    }

    /// Writes the members into `dest` starting at `offset`, in iteration order.
    ///
    /// Slots before `offset` and after the last member are left alone.
    pub fn copy_to(&self, dest: Option<&mut [M::Member]>, offset: isize) -> Result<()> {
        let dest = dest.ok_or(BitSetError::ArgumentRequired("dest"))?;
        if offset < 0 || offset as usize > dest.len() {
            return Err(BitSetError::InvalidOffset {
                offset,
                len: dest.len(),
            });
        }
        let offset = offset as usize;
        let available = dest.len() - offset;
        let needed = self.iter().count();
        if available < needed {
            return Err(BitSetError::DestinationTooSmall {
                needed,
                offset,
                available,
            });
        }
        for (slot, value) in dest[offset..].iter_mut().zip(self.iter()) {
            *slot = value;
        }
        Ok(())
    }
}

impl<'a, M: SetAlgebra> IntoMask<M> for &'a EnumSet<M> {
    fn into_mask(self) -> Result<M> {
        Ok(self.mask)
    }
}

impl<M: SetAlgebra> IntoMask<M> for EnumSet<M> {
    fn into_mask(self) -> Result<M> {
        Ok(self.mask)
    }
}

impl<'a, M: SetAlgebra> IntoIterator for &'a EnumSet<M> {
    type Item = M::Member;
    type IntoIter = Members<M::Member, M::Word>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<M: SetAlgebra> IntoIterator for EnumSet<M> {
    type Item = M::Member;
    type IntoIter = Members<M::Member, M::Word>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<M: SetAlgebra> fmt::Debug for EnumSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
use crate::test_enums::*;

#[cfg(test)]
fn add_remove_clear<M: SetAlgebra>() {
    let [zero, one, _, three] = four::<M::Member>();
    let mut set = EnumSet::<M>::new();
    assert_eq!(set.len(), 0);
    assert!(set.is_empty());

    assert_eq!(set.add(zero), Ok(true));
    assert_eq!(set.len(), 1);
    assert_eq!(set.add(zero), Ok(false));
    assert_eq!(set.len(), 1);

    assert_eq!(set.add(one), Ok(true));
    assert_eq!(set.add(one), Ok(false));
    assert_eq!(set.add(three), Ok(true));
    assert_eq!(set.add(three), Ok(false));
    assert_eq!(set.len(), 3);
    assert!(set.any());

    assert_eq!(set.remove(zero), Ok(true));
    assert_eq!(set.len(), 2);
    assert_eq!(set.remove(zero), Ok(false));
    assert_eq!(set.len(), 2);

    set.clear();
    assert_eq!(set.len(), 0);
    assert!(!set.any());
    assert_eq!(set, EnumSet::new());
}

#[cfg(test)]
fn empty_set_removes_nothing<M: SetAlgebra>() {
    let mut set = EnumSet::<M>::new();
    for value in four::<M::Member>() {
        assert_eq!(set.contains(value), Ok(false));
        assert_eq!(set.remove(value), Ok(false));
        assert_eq!(set.set_equals([value]), Ok(false));
    }
    assert!(set.set_equals(&[] as &[M::Member]).unwrap());
    assert_eq!(set.iter().next(), None);
}

#[cfg(test)]
fn copy_to_destination<M: SetAlgebra>() {
    let [zero, one, two, three] = four::<M::Member>();
    let set = EnumSet::<M>::from_members([zero, one, two, three]).unwrap();

    let mut dest = [zero; 5];
    set.copy_to(Some(&mut dest[..]), 0).unwrap();
    assert_eq!(dest, [zero, one, two, three, zero]);

    set.copy_to(Some(&mut dest[..]), 1).unwrap();
    assert_eq!(dest, [zero, zero, one, two, three]);

    assert_eq!(
        set.copy_to(None, 0),
        Err(BitSetError::ArgumentRequired("dest"))
    );
    assert_eq!(
        set.copy_to(Some(&mut dest[..]), -1),
        Err(BitSetError::InvalidOffset { offset: -1, len: 5 })
    );
    assert_eq!(
        set.copy_to(Some(&mut dest[..]), 6),
        Err(BitSetError::InvalidOffset { offset: 6, len: 5 })
    );
    assert_eq!(
        set.copy_to(Some(&mut dest[..]), 2),
        Err(BitSetError::DestinationTooSmall {
            needed: 4,
            offset: 2,
            available: 3
        })
    );
    assert!(matches!(
        set.copy_to(Some(&mut dest[..]), 3),
        Err(BitSetError::DestinationTooSmall { .. })
    ));
    // failed copies wrote nothing
    assert_eq!(dest, [zero, zero, one, two, three]);

    let mut short = [zero; 4];
    let mut bigger = set;
    bigger.clear();
    bigger.replace_with([zero, one, two, three]).unwrap();
    assert_eq!(bigger, set);
    assert!(set.copy_to(Some(&mut short[..]), 0).is_ok());
    assert!(set.copy_to(Some(&mut short[..]), 1).is_err());

    let empty = EnumSet::<M>::new();
    assert_eq!(empty.copy_to(Some(&mut short[..]), 4), Ok(()));
}

#[cfg(test)]
fn bulk_mutations<M: SetAlgebra>() {
    let [zero, one, two, three] = four::<M::Member>();

    let mut set = EnumSet::<M>::from_members([one, three]).unwrap();
    set.except_with([zero, one]).unwrap();
    assert!(set.set_equals([three]).unwrap());
    set.except_with([two, one]).unwrap();
    assert!(set.set_equals([three]).unwrap());
    set.except_with([three]).unwrap();
    assert!(set.is_empty());

    let mut set = EnumSet::<M>::from_members([zero, one, two, three]).unwrap();
    set.intersect_with([zero, one, two]).unwrap();
    assert!(set.set_equals([zero, one, two]).unwrap());
    set.intersect_with([zero, two]).unwrap();
    assert!(set.set_equals([zero, two]).unwrap());
    set.intersect_with([one, three]).unwrap();
    assert!(set.is_empty());

    let mut set = EnumSet::<M>::from_members([zero, one]).unwrap();
    set.symmetric_except_with([one, three]).unwrap();
    assert!(set.set_equals([zero, three]).unwrap());
    set.symmetric_except_with([zero, one, three]).unwrap();
    assert!(set.set_equals([one]).unwrap());

    let mut set = EnumSet::<M>::with(two).unwrap();
    set.union_with([zero, one]).unwrap();
    assert!(set.set_equals([zero, one, two]).unwrap());
    let other = EnumSet::<M>::from_members([three]).unwrap();
    set.union_with(&other).unwrap();
    assert_eq!(set, EnumSet::<M>::all().unwrap());
}

#[cfg(test)]
fn absent_operands<M: SetAlgebra>() {
    let [zero, one, ..] = four::<M::Member>();
    let mut set = EnumSet::<M>::from_members([zero, one]).unwrap();
    let before = set;
    let none = None::<&[M::Member]>;
    let required = BitSetError::ArgumentRequired("other");

    assert_eq!(set.union_with(none), Err(required.clone()));
    assert_eq!(set.intersect_with(none), Err(required.clone()));
    assert_eq!(set.except_with(none), Err(required.clone()));
    assert_eq!(set.symmetric_except_with(none), Err(required.clone()));
    assert_eq!(set.replace_with(none), Err(required.clone()));
    assert_eq!(set.overlaps(none), Err(required.clone()));
    assert_eq!(set.is_subset_of(none), Err(required.clone()));
    assert_eq!(set.is_proper_subset_of(none), Err(required.clone()));
    assert_eq!(set.is_superset_of(none), Err(required.clone()));
    assert_eq!(set.is_proper_superset_of(none), Err(required.clone()));
    assert_eq!(set.set_equals(none), Err(required));
    assert_eq!(set, before);
}

#[test]
fn sets_add_remove_clear() {
    for_each_layout!(add_remove_clear);
}

#[test]
fn sets_empty() {
    for_each_layout!(empty_set_removes_nothing);
}

#[test]
fn sets_copy_to() {
    for_each_layout!(copy_to_destination);
}

#[test]
fn sets_bulk_mutations() {
    for_each_layout!(bulk_mutations);
}

#[test]
fn sets_reject_absent_operands() {
    for_each_layout!(absent_operands);
}

#[test]
fn four_member_scenario() {
    use TestEnum32::*;

    let mut set = EnumSet32::<TestEnum32>::new();
    assert_eq!(set.len(), 0);
    assert_eq!(set.contains(Zero), Ok(false));

    assert_eq!(set.add(Zero), Ok(true));
    assert_eq!(set.len(), 1);
    assert_eq!(set.add(Zero), Ok(false));
    assert_eq!(set.len(), 1);

    set.union_with([One, Three]).unwrap();
    assert_eq!(set.set_equals([Zero, One, Three]), Ok(true));

    set.except_with([One]).unwrap();
    assert_eq!(set.set_equals([Zero, Three]), Ok(true));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![Zero, Three]);
    assert_eq!(format!("{:?}", set), "{Zero, Three}");
}

#[test]
fn copy_to_small_destination() {
    let set = EnumSet64::<Wide>::from_members([Wide::W0, Wide::W1, Wide::W2, Wide::W3, Wide::W4]).unwrap();
    let mut dest = [Wide::W63; 4];

    assert!(matches!(
        set.copy_to(Some(&mut dest[..]), 0),
        Err(BitSetError::DestinationTooSmall { needed: 5, .. })
    ));
    assert!(matches!(
        set.copy_to(Some(&mut dest[..]), -1),
        Err(BitSetError::InvalidOffset { offset: -1, .. })
    ));
}

#[test]
fn all_skips_bitless_flags() {
    let all = EnumSet32::<MixedFlags>::all().unwrap();
    assert_eq!(all.to_raw(), 0b11);
    assert_eq!(all.iter().collect::<Vec<_>>(), vec![MixedFlags::Left, MixedFlags::Right]);
    assert!(all.contains(MixedFlags::None).is_err());

    assert_eq!(EnumSet64::<TestFlags64>::all().map(|s| s.to_raw()), Ok(0b1111));
    assert_eq!(EnumSet64::<HighFlags>::all().map(|s| s.len()), Ok(4));
    assert!(matches!(
        EnumSet32::<HighFlags>::all(),
        Err(BitSetError::OutOfRange { .. })
    ));
}

#[test]
fn copy_to_skips_stale_bits() {
    let set = EnumSet32::<TestEnum32>::from_raw(1 | 1 << 20);
    assert_eq!(set.len(), 2);

    let mut dest = [TestEnum32::Three; 2];
    set.copy_to(Some(&mut dest[1..]), 0).unwrap();
    assert_eq!(dest, [TestEnum32::Three, TestEnum32::Zero]);

    set.copy_to(Some(&mut dest[..]), 1).unwrap();
    assert_eq!(
        set.copy_to(Some(&mut dest[..]), 2),
        Err(BitSetError::DestinationTooSmall {
            needed: 1,
            offset: 2,
            available: 0
        })
    );
}

#[test]
fn out_of_range_leaves_set_untouched() {
    let mut set = EnumSet32::<Wide>::from_members([Wide::W1, Wide::W31]).unwrap();
    let before = set;

    assert!(matches!(set.add(Wide::W32), Err(BitSetError::OutOfRange { .. })));
    assert!(set.union_with([Wide::W2, Wide::W40]).is_err());
    assert!(set.replace_with(vec![Wide::W0, Wide::W50]).is_err());
    assert!(set.remove(Wide::W63).is_err());
    assert_eq!(set, before);

    assert!(EnumSet32::<Wide>::all().is_err());
    assert_eq!(EnumSet64::<Wide>::with(Wide::W63).map(|s| s.to_raw()), Ok(1 << 63));
    assert!(EnumSet64::<Wide>::with(Wide::W64).is_err());
}

#[test]
fn equality_is_mask_equality() {
    let a = EnumSet32::<TestFlags32>::from_members([TestFlags32::Two, TestFlags32::Zero]).unwrap();
    let b = EnumSet32::<TestFlags32>::from_members([TestFlags32::Zero, TestFlags32::Two, TestFlags32::Zero]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_raw(), 0b101);
    assert_eq!(EnumSet32::<TestFlags32>::from_raw(0b101), a);
    assert_eq!(EnumSet::from_mask(a.to_mask()), b);
    assert_ne!(a, EnumSet32::new());
}

#[test]
fn random_sequences() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let members = four::<TestEnum64>();

    for _ in 0..200 {
        let len = rng.usize(0..12);
        let values: Vec<TestEnum64> = (0..len).map(|_| members[rng.usize(0..4)]).collect();
        let mut distinct = values.clone();
        distinct.sort_by_key(|v| v.ordinal());
        distinct.dedup();

        let set = EnumSet64::<TestEnum64>::from_members(values.iter().copied()).unwrap();
        assert!(set.set_equals(&values).unwrap());
        assert_eq!(set.len(), distinct.len());
        assert_eq!(set.iter().collect::<Vec<_>>(), distinct);

        let mut reversed = values.clone();
        reversed.reverse();
        assert!(set.set_equals(reversed).unwrap());

        let mut grown = EnumSet64::<TestEnum64>::with(members[rng.usize(0..4)]).unwrap();
        grown.union_with(&values).unwrap();
        assert!(grown.is_superset_of(&values).unwrap());

        let mut same = set;
        same.intersect_with(&set).unwrap();
        assert_eq!(same, set);
        same.union_with(set).unwrap();
        assert_eq!(same, set);

        let x = members[rng.usize(0..4)];
        let mut toggled = set;
        let was_present = toggled.contains(x).unwrap();
        assert_eq!(toggled.add(x).unwrap(), !was_present);
        assert!(!toggled.add(x).unwrap());
        assert!(toggled.remove(x).unwrap());
        assert_eq!(toggled.len(), set.len() - was_present as usize);
        assert!(!toggled.remove(x).unwrap());
    }
}
