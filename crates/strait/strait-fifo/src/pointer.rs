//! Wrap-bit pointers and the index arithmetic behind FULL / EMPTY.
//!
//! A FIFO with `C = 2^k` slots uses pointers of `k + 1` bits:
//!
//! ```text
//!   bit k        bits k-1 .. 0
//! ┌──────────┬─────────────────────┐
//! │ wrap bit │      address        │
//! └──────────┴─────────────────────┘
//! ```
//!
//! Pointers only ever advance by one, modulo `2C`. The address walks the
//! storage array; the wrap bit flips each time the address completes a lap.
//! Equal pointers mean the reader has caught up with the writer (EMPTY);
//! equal addresses with different wrap bits mean the writer is exactly one
//! lap ahead (FULL).

/// A `k + 1` bit FIFO pointer in plain binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pointer(u64);

impl Pointer {
    /// The reset value: wrap bit 0, address 0.
    pub const ZERO: Pointer = Pointer(0);

    /// Raw `k + 1` bit value.
    #[inline(always)]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Reflected binary (Gray) encoding of this pointer.
    ///
    /// Successive pointers, including the step from `2C - 1` back to `0`,
    /// differ in exactly one bit of their Gray codes.
    #[inline(always)]
    pub fn to_gray(self) -> GrayCode {
        GrayCode(self.0 ^ (self.0 >> 1))
    }
}

/// A pointer in Gray code, the form in which pointers cross a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GrayCode(u64);

impl GrayCode {
    #[inline(always)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        GrayCode(raw)
    }

    #[inline(always)]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Decodes back to binary with a prefix XOR over the bits.
    #[inline(always)]
    pub fn to_pointer(self) -> Pointer {
        let mut b = self.0;
        let mut shift = 1;
        while shift < u64::BITS {
            b ^= b >> shift;
            shift <<= 1;
        }
        Pointer(b)
    }
}

/// Arithmetic over the pointers of one FIFO geometry.
///
/// Holds `k`; every operation masks to `k + 1` bits so no pointer ever
/// leaves the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerSpace {
    addr_bits: u32,
}

impl PointerSpace {
    /// `addr_bits` must already be validated (`1..=MAX_ADDR_BITS`).
    pub(crate) fn new(addr_bits: u32) -> Self {
        Self { addr_bits }
    }

    #[inline(always)]
    pub fn addr_bits(&self) -> u32 {
        self.addr_bits
    }

    /// Number of storage slots, `C = 2^k`.
    #[inline(always)]
    pub fn capacity(&self) -> u64 {
        1u64 << self.addr_bits
    }

    /// Mask selecting the address bits (`C - 1`).
    #[inline(always)]
    fn addr_mask(&self) -> u64 {
        self.capacity() - 1
    }

    /// Mask selecting all `k + 1` pointer bits (`2C - 1`).
    #[inline(always)]
    fn ptr_mask(&self) -> u64 {
        (self.capacity() << 1) - 1
    }

    /// Builds a pointer from a raw value, discarding bits above `k`.
    #[inline(always)]
    pub fn pointer(&self, raw: u64) -> Pointer {
        Pointer(raw & self.ptr_mask())
    }

    /// Storage index addressed by `p` (its low `k` bits).
    #[inline(always)]
    pub fn address(&self, p: Pointer) -> usize {
        (p.0 & self.addr_mask()) as usize
    }

    #[inline(always)]
    pub fn wrap_bit(&self, p: Pointer) -> bool {
        p.0 & self.capacity() != 0
    }

    /// `p + 1 (mod 2C)`.
    #[inline(always)]
    pub fn next(&self, p: Pointer) -> Pointer {
        Pointer(p.0.wrapping_add(1) & self.ptr_mask())
    }

    /// True when `write` is exactly one lap ahead of `read`: same address,
    /// opposite wrap bit.
    #[inline(always)]
    pub fn is_full(&self, write: Pointer, read: Pointer) -> bool {
        (write.0 ^ read.0) == self.capacity()
    }

    /// True when `read` has caught up with `write`, bit for bit.
    #[inline(always)]
    pub fn is_empty(&self, read: Pointer, write: Pointer) -> bool {
        read == write
    }

    /// Number of increments from `behind` to `ahead`, in `0..2C`.
    ///
    /// For a write pointer and a read pointer of the same queue this is the
    /// number of buffered words, always in `0..=C`.
    #[inline(always)]
    pub fn distance(&self, ahead: Pointer, behind: Pointer) -> u64 {
        ahead.0.wrapping_sub(behind.0) & self.ptr_mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_laps_after_two_capacities() {
        let space = PointerSpace::new(2);
        let mut p = Pointer::ZERO;
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push((space.wrap_bit(p), space.address(p)));
            p = space.next(p);
        }
        assert_eq!(p, Pointer::ZERO);
        assert_eq!(
            seen,
            vec![
                (false, 0),
                (false, 1),
                (false, 2),
                (false, 3),
                (true, 0),
                (true, 1),
                (true, 2),
                (true, 3),
            ]
        );
    }

    #[test]
    fn equal_addresses_are_full_or_empty_by_wrap_bit() {
        let space = PointerSpace::new(3);
        let read = space.pointer(5);
        let lapped = space.pointer(5 + 8);

        assert!(space.is_empty(read, read));
        assert!(!space.is_full(read, read));

        assert!(space.is_full(lapped, read));
        assert!(!space.is_empty(read, lapped));
        assert_eq!(space.distance(lapped, read), 8);
    }

    #[test]
    fn full_holds_across_the_pointer_wrap() {
        // write has wrapped through zero, read has not
        let space = PointerSpace::new(2);
        let read = space.pointer(6);
        let write = space.pointer(2);
        assert!(space.is_full(write, read));
        assert_eq!(space.distance(write, read), 4);
    }

    #[test]
    fn pointer_masks_high_bits() {
        let space = PointerSpace::new(1);
        assert_eq!(space.pointer(0b1111).raw(), 0b11);
        assert_eq!(space.address(space.pointer(0b11)), 1);
    }

    #[test]
    fn gray_codes_differ_in_one_bit_around_a_lap() {
        let space = PointerSpace::new(4);
        let mut p = Pointer::ZERO;
        for _ in 0..space.capacity() * 2 {
            let n = space.next(p);
            let diff = p.to_gray().raw() ^ n.to_gray().raw();
            assert_eq!(diff.count_ones(), 1, "{p:?} -> {n:?}");
            assert_eq!(n.to_gray().to_pointer(), n);
            p = n;
        }
    }

    #[test]
    fn gray_decode_handles_wide_values() {
        let p = Pointer(0x1_2345_6789);
        assert_eq!(p.to_gray().to_pointer(), p);
    }
}
