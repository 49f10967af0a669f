use std::any;
use std::fmt;

use array_macro::array;

use crate::error::{BitSetError, Result};

pub const MAX_BITS: usize = 64;

/// How members of an enumeration are laid out in a mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Style {
    Ordinal,
    Flags,
}

/// An enumeration that can be stored in a bit mask.
///
/// Usually implemented through [`bit_enum!`](crate::bit_enum) or
/// [`bit_flags!`](crate::bit_flags). A manual implementation must keep
/// `MEMBERS` in declaration order, with `ordinal` returning a member's index
/// into it, and must cache the result of [`EnumInfo::describe`] in `info`.
pub trait BitEnum: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const FLAGS: bool = false;

    const REPR_BITS: u32;

    /// Every declared member with its name, in declaration order.
    const MEMBERS: &'static [(&'static str, Self)];

    fn ordinal(self) -> usize;

    fn repr(self) -> i64;

    fn info() -> &'static EnumInfo<Self>;
}

/// Per-type metadata, built once and never changed afterwards.
pub struct EnumInfo<T: 'static> {
    type_name: &'static str,
    style: Style,
    repr_bits: u32,
    members: &'static [(&'static str, T)],
    by_bit: [Option<T>; MAX_BITS],
}

impl<T: BitEnum> EnumInfo<T> {
    pub fn describe() -> Self {
        let style = if T::FLAGS { Style::Flags } else { Style::Ordinal };
        let type_name = any::type_name::<T>();

        if style == Style::Flags {
            for &(name, value) in T::MEMBERS {
                if flag_bits(value).count_ones() != 1 {
                    log::warn!(
                        "[EnumInfo::describe] {}::{} ({:#x}) is not a single bit and cannot be stored",
                        type_name,
                        name,
                        value.repr()
                    );
                }
            }
        }

        let by_bit = array![i => resolve_bit::<T>(style, i as u32); MAX_BITS];

        log::debug!(
            "[EnumInfo::describe] {}: {} members, {:?}, {}-bit repr",
            type_name,
            T::MEMBERS.len(),
            style,
            T::REPR_BITS
        );

        EnumInfo {
            type_name,
            style,
            repr_bits: T::REPR_BITS,
            members: T::MEMBERS,
            by_bit,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn is_flags(&self) -> bool {
        self.style == Style::Flags
    }

    pub fn repr_bits(&self) -> u32 {
        self.repr_bits
    }

    pub fn members(&self) -> &'static [(&'static str, T)] {
        self.members
    }

    pub fn name_of(&self, value: T) -> &'static str {
        self.members
            .get(value.ordinal())
            .map_or("<undeclared>", |&(name, _)| name)
    }

    pub fn by_name(&self, name: &str) -> Option<T> {
        self.members
            .iter()
            .find(|&&(n, _)| n == name)
            .map(|&(_, value)| value)
    }

    pub fn by_repr(&self, repr: i64) -> Option<T> {
        self.members
            .iter()
            .find(|&&(_, value)| value.repr() == repr)
            .map(|&(_, value)| value)
    }

    pub fn by_bit(&self, index: u32) -> Option<T> {
        self.by_bit.get(index as usize).copied().flatten()
    }

    /// Bit a flags value occupies, declared or not.
    ///
    /// `None` for ordinal enumerations, whose positions only exist for
    /// declared members, and for values that are not a single bit.
    pub fn flag_index(&self, repr: i64) -> Option<u32> {
        if self.style != Style::Flags {
            return None;
        }
        let bits = repr_pattern(repr, self.repr_bits);
        if bits.count_ones() == 1 {
            Some(bits.trailing_zeros())
        } else {
            None
        }
    }
}

impl<T: BitEnum> fmt::Debug for EnumInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EnumInfo")
            .field("type_name", &self.type_name)
            .field("style", &self.style)
            .field("repr_bits", &self.repr_bits)
            .field("members", &self.members)
            .finish()
    }
}

fn resolve_bit<T: BitEnum>(style: Style, index: u32) -> Option<T> {
    match style {
        Style::Ordinal => T::MEMBERS.get(index as usize).map(|&(_, value)| value),
        Style::Flags => {
            if index >= T::REPR_BITS {
                return None;
            }
            let bit = 1u64 << index;
            T::MEMBERS
                .iter()
                .find(|&&(_, value)| flag_bits(value) == bit)
                .map(|&(_, value)| value)
        }
    }
}

fn flag_bits<T: BitEnum>(value: T) -> u64 {
    repr_pattern(value.repr(), T::REPR_BITS)
}

/// `repr` as an unsigned pattern of `repr_bits` bits.
fn repr_pattern(repr: i64, repr_bits: u32) -> u64 {
    let raw = repr as u64;
    if repr_bits >= 64 {
        raw
    } else {
        raw & ((1u64 << repr_bits) - 1)
    }
}

/// Bit position of `value` in a mask `width` bits wide.
pub fn to_bit_index<T: BitEnum>(value: T, width: u32) -> Result<u32> {
    let info = T::info();
    let index = match info.style {
        Style::Ordinal => value.ordinal() as u32,
        Style::Flags => {
            let bits = flag_bits(value);
            if bits.count_ones() != 1 {
                return Err(BitSetError::NotSingleBit {
                    name: info.name_of(value),
                    repr: value.repr(),
                });
            }
            bits.trailing_zeros()
        }
    };
    if index >= width {
        return Err(BitSetError::OutOfRange {
            name: info.name_of(value),
            index,
            width,
        });
    }
    Ok(index)
}

/// Member stored at bit `index`, if any declared member maps there.
///
/// Indices produced by [`to_bit_index`] always resolve. Anything else, such
/// as a bit read back from stale persisted data, yields `None`.
#[inline]
pub fn from_bit_index<T: BitEnum>(index: u32) -> Option<T> {
    T::info().by_bit(index)
}

#[cfg(test)]
use crate::test_enums::*;

#[test]
fn ordinal_positions() {
    assert_eq!(to_bit_index(TestEnum32::Zero, 32), Ok(0));
    assert_eq!(to_bit_index(TestEnum32::Three, 32), Ok(3));
    assert_eq!(to_bit_index(TestEnum64::Two, 64), Ok(2));
    assert_eq!(to_bit_index(Sparse::B, 32), Ok(1));
    assert_eq!(to_bit_index(Sparse::C, 32), Ok(2));

    for &(_, value) in TestEnum32::MEMBERS {
        let index = to_bit_index(value, 32).unwrap();
        assert_eq!(from_bit_index::<TestEnum32>(index), Some(value));
    }
    assert_eq!(from_bit_index::<TestEnum32>(4), None);
    assert_eq!(from_bit_index::<TestEnum32>(200), None);
}

#[test]
fn flags_positions() {
    assert_eq!(to_bit_index(TestFlags32::Zero, 32), Ok(0));
    assert_eq!(to_bit_index(TestFlags32::Three, 32), Ok(3));
    assert_eq!(to_bit_index(TestFlags64::Two, 64), Ok(2));
    assert_eq!(to_bit_index(HighFlags::Top32, 32), Ok(31));
    assert_eq!(to_bit_index(HighFlags::Top64, 64), Ok(63));

    for &(_, value) in HighFlags::MEMBERS {
        let index = to_bit_index(value, 64).unwrap();
        assert_eq!(from_bit_index::<HighFlags>(index), Some(value));
    }
    assert_eq!(from_bit_index::<TestFlags32>(4), None);
    assert_eq!(from_bit_index::<TestFlags32>(40), None);
}

#[test]
fn boundary_positions() {
    assert_eq!(to_bit_index(Wide::W31, 32), Ok(31));
    assert_eq!(
        to_bit_index(Wide::W32, 32),
        Err(BitSetError::OutOfRange {
            name: "W32",
            index: 32,
            width: 32
        })
    );
    assert_eq!(to_bit_index(Wide::W63, 64), Ok(63));
    assert!(matches!(
        to_bit_index(Wide::W64, 64),
        Err(BitSetError::OutOfRange { index: 64, .. })
    ));
    assert!(matches!(
        to_bit_index(HighFlags::Low32, 32),
        Err(BitSetError::OutOfRange { index: 32, .. })
    ));
}

#[test]
fn composite_flags_rejected() {
    assert_eq!(
        to_bit_index(MixedFlags::None, 32),
        Err(BitSetError::NotSingleBit {
            name: "None",
            repr: 0
        })
    );
    assert_eq!(
        to_bit_index(MixedFlags::Both, 32),
        Err(BitSetError::NotSingleBit {
            name: "Both",
            repr: 3
        })
    );
    assert_eq!(to_bit_index(MixedFlags::Right, 32), Ok(1));
    // the composite member never owns a bit
    assert_eq!(from_bit_index::<MixedFlags>(0), Some(MixedFlags::Left));
    assert_eq!(from_bit_index::<MixedFlags>(1), Some(MixedFlags::Right));
}

#[test]
fn info_is_cached() {
    let first = TestFlags32::info();
    let second = TestFlags32::info();
    assert!(std::ptr::eq(first, second));

    assert!(first.is_flags());
    assert_eq!(first.style(), Style::Flags);
    assert_eq!(first.repr_bits(), 32);
    assert!(first.type_name().ends_with("TestFlags32"));
    assert_eq!(TestEnum64::info().style(), Style::Ordinal);
    assert_eq!(TestEnum64::info().repr_bits(), 64);
}

#[test]
fn info_lookups() {
    let info = TestFlags64::info();
    assert_eq!(info.members().len(), 4);
    assert_eq!(info.name_of(TestFlags64::Two), "Two");
    assert_eq!(info.by_name("Three"), Some(TestFlags64::Three));
    assert_eq!(info.by_name("Four"), None);
    assert_eq!(info.by_repr(1 << 1), Some(TestFlags64::One));
    assert_eq!(info.by_repr(1 << 9), None);

    assert_eq!(Sparse::info().by_repr(40), Some(Sparse::C));
    assert_eq!(HighFlags::info().by_repr(1 << 31), Some(HighFlags::Top32));
    assert_eq!(HighFlags::info().by_repr(i64::MIN), Some(HighFlags::Top64));
}

#[test]
fn undeclared_flag_index() {
    let info = TestFlags32::info();
    assert_eq!(info.flag_index(1 << 9), Some(9));
    assert_eq!(info.flag_index(1 << 2), Some(2));
    assert_eq!(info.flag_index(0), None);
    assert_eq!(info.flag_index(3), None);
    // wider than the u32 repr
    assert_eq!(info.flag_index(1 << 40), None);

    assert_eq!(TestFlags64::info().flag_index(i64::MIN), Some(63));
    assert_eq!(Sparse::info().flag_index(1 << 3), None);
}
