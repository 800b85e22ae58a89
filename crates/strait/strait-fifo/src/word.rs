//! Fixed-width data words.
//!
//! A FIFO carries words of `W` bits. The carrier is an unsigned integer at
//! least `W` bits wide; bits above `W` do not exist on the queue's data path
//! and are dropped on push.

/// An unsigned integer type usable as the carrier for `W`-bit words.
pub trait Word: Copy + Default + Send + 'static {
    /// Width of the carrier type in bits.
    const BITS: u32;

    /// Keeps the low `bits` bits of `self`. `bits` is in `1..=Self::BITS`.
    fn truncate(self, bits: u32) -> Self;
}

macro_rules! impl_word {
    ($($t:ty),* $(,)?) => {
        $(
            impl Word for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline(always)]
                fn truncate(self, bits: u32) -> Self {
                    if bits >= Self::BITS {
                        self
                    } else {
                        self & (((1 as $t) << bits) - 1)
                    }
                }
            }
        )*
    };
}

impl_word!(u8, u16, u32, u64, u128, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_low_bits() {
        assert_eq!(0xABu8.truncate(4), 0x0B);
        assert_eq!(0xFFFF_FFFFu32.truncate(1), 1);
        assert_eq!(u64::MAX.truncate(64), u64::MAX);
        assert_eq!(0x1234_5678u32.truncate(16), 0x5678);
    }
}
