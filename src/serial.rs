//! Persisted forms of a set.
//!
//! `EnumSet` and the masks serialize as their raw integer, tied to the
//! current bit layout. The name-tagged form stores one `{name, value}` entry
//! per member and survives members being renamed or renumbered.

use serde::{Deserialize, Serialize};

use crate::bits::Word;
use crate::mask::SetAlgebra;
use crate::position::BitEnum;
use crate::set::EnumSet;

/// One member in the name-tagged encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
    pub value: i64,
}

/// Which persisted form [`SerializedSet::encode`] writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Raw,
    Named,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<u64>,

    /// Name-tagged members, in ascending bit order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<NamedEntry>,
}

impl SerializedSet {
    pub fn encode<M: SetAlgebra>(set: &EnumSet<M>, encoding: Encoding) -> Self {
        match encoding {
            Encoding::Raw => SerializedSet {
                mask: Some(set.to_raw().to_u64()),
                entries: Vec::new(),
            },
            Encoding::Named => SerializedSet {
                mask: None,
                entries: set.to_named(),
            },
        }
    }

    /// Rebuilds a set, preferring named entries over the raw mask.
    pub fn decode<M: SetAlgebra>(&self) -> EnumSet<M> {
        if !self.entries.is_empty() {
            return EnumSet::from_named(&self.entries);
        }
        match self.mask {
            Some(raw) => {
                let bits = M::Word::truncate_u64(raw);
                if bits.to_u64() != raw {
                    log::warn!(
                        "[SerializedSet::decode] mask {:#x} does not fit {} bits, high bits dropped",
                        raw,
                        M::Word::BITS
                    );
                }
                EnumSet::from_raw(bits)
            }
            None => EnumSet::new(),
        }
    }
}

impl<M: SetAlgebra> EnumSet<M> {
    /// One entry per addressable member, in ascending bit order.
    pub fn to_named(&self) -> Vec<NamedEntry> {
        let info = M::Member::info();
        self.iter()
            .map(|value| NamedEntry {
                name: info.name_of(value).to_owned(),
                value: value.repr(),
            })
            .collect()
    }

    /// Rebuilds a set from name-tagged entries.
    ///
    /// An entry resolves by name, then by value. A flags value no member
    /// declares is kept as a raw bit, the way the raw form keeps stale bits.
    /// Anything else that cannot be placed in the mask is dropped.
    pub fn from_named<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a NamedEntry>,
    {
        let info = M::Member::info();
        let mut bits = M::Word::ZERO;
        for entry in entries {
            let placed = match info.by_name(&entry.name).or_else(|| info.by_repr(entry.value)) {
                Some(value) => M::bit_mask(value).map(M::bits).ok(),
                None => info
                    .flag_index(entry.value)
                    .filter(|&index| index < M::Word::BITS)
                    .map(M::Word::bit),
            };
            match placed {
                Some(bit) => bits = bits | bit,
                None => log::debug!(
                    "[EnumSet::from_named] dropping {} entry {}={}",
                    info.type_name(),
                    entry.name,
                    entry.value
                ),
            }
        }
        EnumSet::from_raw(bits)
    }
}

/// Name-tagged serde adapter for `EnumSet` fields.
///
/// ```
/// use enum_bitset::EnumSet32;
/// use serde::{Deserialize, Serialize};
///
/// enum_bitset::bit_enum! {
///     pub enum Layer: u8 { Ground, Water, Sky }
/// }
///
/// #[derive(Serialize, Deserialize)]
/// struct Tile {
///     #[serde(with = "enum_bitset::named")]
///     layers: EnumSet32<Layer>,
/// }
/// ```
pub mod named {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::NamedEntry;
    use crate::mask::SetAlgebra;
    use crate::set::EnumSet;

    pub fn serialize<M, S>(set: &EnumSet<M>, serializer: S) -> Result<S::Ok, S::Error>
    where
        M: SetAlgebra,
        S: Serializer,
    {
        set.to_named().serialize(serializer)
    }

    pub fn deserialize<'de, M, D>(deserializer: D) -> Result<EnumSet<M>, D::Error>
    where
        M: SetAlgebra,
        D: Deserializer<'de>,
    {
        let entries = Vec::<NamedEntry>::deserialize(deserializer)?;
        Ok(EnumSet::from_named(&entries))
    }
}

#[cfg(test)]
use crate::mask::{BitMask32, BitMask64};
#[cfg(test)]
use crate::set::{EnumSet32, EnumSet64};
#[cfg(test)]
use crate::test_enums::*;

#[cfg(test)]
fn entry(name: &str, value: i64) -> NamedEntry {
    NamedEntry {
        name: name.to_owned(),
        value,
    }
}

#[cfg(test)]
fn round_trips<M: SetAlgebra + Serialize + for<'de> Deserialize<'de>>() {
    let [zero, one, two, three] = crate::test_enums::four::<M::Member>();
    let sets = [
        EnumSet::<M>::new(),
        EnumSet::<M>::from_members([two]).unwrap(),
        EnumSet::<M>::from_members([three, zero]).unwrap(),
        EnumSet::<M>::from_members([zero, one, two, three]).unwrap(),
    ];
    for set in sets {
        let json = serde_json::to_string(&set).unwrap();
        let raw: EnumSet<M> = serde_json::from_str(&json).unwrap();
        assert!(raw.set_equals(&set).unwrap());

        let named = EnumSet::<M>::from_named(&set.to_named());
        assert!(named.set_equals(&set).unwrap());

        for encoding in [Encoding::Raw, Encoding::Named] {
            let stored = serde_json::to_string(&SerializedSet::encode(&set, encoding)).unwrap();
            let loaded: SerializedSet = serde_json::from_str(&stored).unwrap();
            assert_eq!(loaded.decode::<M>(), set);
        }
    }
}

#[test]
fn persisted_round_trips() {
    for_each_layout!(round_trips);
}

#[test]
fn named_entries_in_bit_order() {
    let set = EnumSet64::<TestFlags64>::from_members([TestFlags64::Three, TestFlags64::Zero]).unwrap();
    assert_eq!(set.to_named(), vec![entry("Zero", 1), entry("Three", 8)]);
    assert_eq!(
        serde_json::to_string(&set.to_named()).unwrap(),
        r#"[{"name":"Zero","value":1},{"name":"Three","value":8}]"#
    );
}

#[test]
fn named_prefers_name_over_value() {
    // "C" was renumbered since it was written
    let set = EnumSet32::<Sparse>::from_named(&[entry("C", 10), entry("A", 999)]);
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![Sparse::A, Sparse::C]);
}

#[test]
fn named_falls_back_to_value() {
    // renamed member, same value
    let set = EnumSet32::<TestFlags32>::from_named(&[entry("Deux", 4), entry("One", 2)]);
    assert!(set.set_equals([TestFlags32::One, TestFlags32::Two]).unwrap());
}

#[test]
fn named_drops_unresolvable_entries() {
    let entries = vec![entry("Gone", 64), entry("Zero", 0), entry("Missing", -5)];
    let set = EnumSet32::<TestEnum32>::from_named(&entries);
    assert!(set.set_equals([TestEnum32::Zero]).unwrap());

    // resolvable but too wide for the mask
    let wide = EnumSet32::<Wide>::from_named(&[entry("W40", 40), entry("W3", 3)]);
    assert!(wide.set_equals([Wide::W3]).unwrap());

    // zero-valued flags have no bit
    let mixed = EnumSet32::<MixedFlags>::from_named(&[entry("None", 0), entry("Right", 2)]);
    assert!(mixed.set_equals([MixedFlags::Right]).unwrap());
}

#[test]
fn raw_keeps_stale_bits() {
    let set: EnumSet32<TestEnum32> = serde_json::from_str("1025").unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![TestEnum32::Zero]);
    assert_eq!(serde_json::to_string(&set).unwrap(), "1025");

    // stale bits do not survive the name-tagged form
    let named = SerializedSet::encode(&set, Encoding::Named);
    assert_eq!(named.entries, vec![entry("Zero", 0)]);
    assert_eq!(named.decode::<BitMask32<TestEnum32>>().to_raw(), 1);
}

#[test]
fn serialized_set_config() {
    let set = EnumSet64::<TestEnum64>::from_members([TestEnum64::One, TestEnum64::Two]).unwrap();

    assert_eq!(Encoding::default(), Encoding::Raw);
    assert_eq!(serde_json::to_string(&Encoding::Named).unwrap(), r#""named""#);

    let raw = SerializedSet::encode(&set, Encoding::Raw);
    assert_eq!(serde_json::to_string(&raw).unwrap(), r#"{"mask":6}"#);

    let named = SerializedSet::encode(&set, Encoding::Named);
    assert_eq!(
        serde_json::to_string(&named).unwrap(),
        r#"{"entries":[{"name":"One","value":1},{"name":"Two","value":2}]}"#
    );

    let empty: SerializedSet = serde_json::from_str("{}").unwrap();
    assert!(empty.decode::<BitMask64<TestEnum64>>().is_empty());

    // entries win over a mask written alongside them
    let both: SerializedSet =
        serde_json::from_str(r#"{"mask":1,"entries":[{"name":"Three","value":3}]}"#).unwrap();
    assert!(both
        .decode::<BitMask64<TestEnum64>>()
        .set_equals([TestEnum64::Three])
        .unwrap());

    let too_wide = SerializedSet {
        mask: Some(1 << 40 | 1),
        entries: Vec::new(),
    };
    assert_eq!(too_wide.decode::<BitMask32<TestEnum32>>().to_raw(), 1);
    assert_eq!(too_wide.decode::<BitMask64<TestEnum64>>().to_raw(), 1 << 40 | 1);
}

#[test]
fn named_field_adapter() {
    #[derive(Serialize, Deserialize)]
    struct Tile {
        #[serde(with = "named")]
        layers: EnumSet64<TestFlags32>,
    }

    let tile = Tile {
        layers: EnumSet64::from_members([TestFlags32::Two]).unwrap(),
    };
    let json = serde_json::to_string(&tile).unwrap();
    assert_eq!(json, r#"{"layers":[{"name":"Two","value":4}]}"#);

    let stale = r#"{"layers":[{"name":"Two","value":4},{"name":"Nine","value":512}]}"#;
    let back: Tile = serde_json::from_str(stale).unwrap();
    assert_eq!(back.layers.to_raw(), 4 | 512);
    assert_eq!(back.layers.iter().collect::<Vec<_>>(), vec![TestFlags32::Two]);
}

#[test]
fn named_keeps_undeclared_flags() {
    let entries = vec![
        entry("Nine", 1 << 9),
        entry("One", 2),
        entry("Both", 3),
        entry("Huge", 1 << 40),
    ];
    let set = EnumSet32::<TestFlags32>::from_named(&entries);
    assert_eq!(set.to_raw(), 1 << 9 | 1 << 1);
    assert_eq!(set.len(), 2);
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![TestFlags32::One]);

    // fits the i64 repr but not a 32-bit mask
    let narrow = EnumSet32::<TestFlags64>::from_named(&[entry("High", 1 << 40)]);
    assert!(narrow.is_empty());
    let wide = EnumSet64::<TestFlags64>::from_named(&[entry("High", 1 << 40)]);
    assert_eq!(wide.to_raw(), 1 << 40);

    // ordinal values only resolve through declared members
    let ordinal = EnumSet32::<TestEnum32>::from_named(&[entry("Seven", 7)]);
    assert!(ordinal.is_empty());
}
