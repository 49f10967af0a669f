//! Sets of enumeration members packed into a single `u32` or `u64`.
//!
//! An enumeration declared with [`bit_enum!`] maps each member to the bit at
//! its declaration index, one declared with [`bit_flags!`] uses the member's
//! own single-bit value. [`BitMask32`] and [`BitMask64`] are immutable masks
//! implementing [`SetAlgebra`], and [`EnumSet`] is the mutable set built on
//! top of either.
//!
//! ```
//! use enum_bitset::{bit_enum, EnumSet32};
//!
//! bit_enum! {
//!     pub enum Suit: u8 { Clubs, Diamonds, Hearts, Spades }
//! }
//!
//! let mut red = EnumSet32::new();
//! assert!(red.add(Suit::Hearts)?);
//! red.union_with([Suit::Diamonds])?;
//!
//! assert!(red.is_subset_of(EnumSet32::<Suit>::all()?)?);
//! assert_eq!(red.iter().collect::<Vec<_>>(), [Suit::Diamonds, Suit::Hearts]);
//! # Ok::<(), enum_bitset::BitSetError>(())
//! ```

#[macro_use]
mod macros;
#[cfg(test)]
#[macro_use]
mod test_enums;

mod bits;
mod error;
mod mask;
mod position;
mod serial;
mod set;

pub use bits::{count_set_bits, enumerate_set_bits, SetBits, Word};
pub use error::{BitSetError, Result};
pub use mask::{BitMask32, BitMask64, IntoMask, Members, SetAlgebra};
pub use position::{from_bit_index, to_bit_index, BitEnum, EnumInfo, Style, MAX_BITS};
pub use serial::{named, Encoding, NamedEntry, SerializedSet};
pub use set::{EnumSet, EnumSet32, EnumSet64};
