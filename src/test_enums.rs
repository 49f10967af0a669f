bit_enum! {
    pub enum TestEnum32: u32 { Zero, One, Two, Three }
}

bit_enum! {
    pub enum TestEnum64: i64 { Zero, One, Two, Three }
}

bit_flags! {
    pub enum TestFlags32: u32 {
        Zero = 1 << 0,
        One = 1 << 1,
        Two = 1 << 2,
        Three = 1 << 3,
    }
}

bit_flags! {
    pub enum TestFlags64: i64 {
        Zero = 1 << 0,
        One = 1 << 1,
        Two = 1 << 2,
        Three = 1 << 3,
    }
}

bit_enum! {
    /// Explicit discriminants, still laid out by declaration order.
    pub enum Sparse: u8 { A = 10, B = 20, C = 40 }
}

bit_flags! {
    pub enum HighFlags: u64 {
        Low = 1,
        Top32 = 1 << 31,
        Low32 = 1 << 32,
        Top64 = 1 << 63,
    }
}

bit_flags! {
    pub enum MixedFlags: u32 { None = 0, Left = 1, Right = 2, Both = 3 }
}

bit_enum! {
    pub enum Wide: u8 {
        W0, W1, W2, W3, W4, W5, W6, W7, W8, W9,
        W10, W11, W12, W13, W14, W15, W16, W17, W18, W19,
        W20, W21, W22, W23, W24, W25, W26, W27, W28, W29,
        W30, W31, W32, W33, W34, W35, W36, W37, W38, W39,
        W40, W41, W42, W43, W44, W45, W46, W47, W48, W49,
        W50, W51, W52, W53, W54, W55, W56, W57, W58, W59,
        W60, W61, W62, W63, W64,
    }
}

/// Runs a generic test body once per enumeration and mask width.
macro_rules! for_each_layout {
    ($body:ident) => {
        $body::<$crate::BitMask32<$crate::test_enums::TestEnum32>>();
        $body::<$crate::BitMask32<$crate::test_enums::TestEnum64>>();
        $body::<$crate::BitMask32<$crate::test_enums::TestFlags32>>();
        $body::<$crate::BitMask32<$crate::test_enums::TestFlags64>>();
        $body::<$crate::BitMask64<$crate::test_enums::TestEnum32>>();
        $body::<$crate::BitMask64<$crate::test_enums::TestEnum64>>();
        $body::<$crate::BitMask64<$crate::test_enums::TestFlags32>>();
        $body::<$crate::BitMask64<$crate::test_enums::TestFlags64>>();
    };
}

/// The first four declared members, named after their positions.
pub fn four<T: crate::BitEnum>() -> [T; 4] {
    let m = T::MEMBERS;
    [m[0].1, m[1].1, m[2].1, m[3].1]
}
