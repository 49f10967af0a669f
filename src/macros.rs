/// Declares an enumeration whose members are stored by declaration index.
///
/// ```
/// enum_bitset::bit_enum! {
///     #[derive(PartialOrd, Ord)]
///     pub enum Weekday: u8 { Mon, Tue, Wed, Thu, Fri, Sat, Sun }
/// }
///
/// let weekend = enum_bitset::EnumSet32::from_members([Weekday::Sat, Weekday::Sun]).unwrap();
/// assert_eq!(weekend.len(), 2);
/// ```
#[macro_export]
macro_rules! bit_enum {
    ($($tt:tt)*) => {
        $crate::__bit_enum_impl!(false; $($tt)*);
    };
}

/// Declares an enumeration whose member values are single-bit masks.
///
/// ```
/// enum_bitset::bit_flags! {
///     pub enum Access: u32 { Read = 1 << 0, Write = 1 << 1, Exec = 1 << 2 }
/// }
///
/// let rw = enum_bitset::EnumSet32::from_members([Access::Read, Access::Write]).unwrap();
/// assert_eq!(rw.to_raw(), 0b011);
/// ```
#[macro_export]
macro_rules! bit_flags {
    ($($tt:tt)*) => {
        $crate::__bit_enum_impl!(true; $($tt)*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __bit_enum_impl {
    (
        $flags:literal;
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $($(#[$vmeta:meta])* $variant:ident $(= $value:expr)?),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant $(= $value)?,)*
        }

        impl $crate::BitEnum for $name {
            const FLAGS: bool = $flags;
            const REPR_BITS: u32 = <$repr>::BITS;
            const MEMBERS: &'static [(&'static str, Self)] =
                &[$((stringify!($variant), $name::$variant)),*];

            #[inline]
            fn ordinal(self) -> usize {
                #[allow(non_camel_case_types, dead_code)]
                enum Ordinal {
                    $($variant,)*
                }
                match self {
                    $($name::$variant => Ordinal::$variant as usize,)*
                }
            }

            #[inline]
            fn repr(self) -> i64 {
                self as $repr as i64
            }

            fn info() -> &'static $crate::EnumInfo<Self> {
                static INFO: ::std::sync::OnceLock<$crate::EnumInfo<$name>> =
                    ::std::sync::OnceLock::new();
                INFO.get_or_init($crate::EnumInfo::describe)
            }
        }
    };
}
