//! Constant-output RNGs for forcing rolls in tests

use rand::RngCore;

/// Every roll is 0.0: crits and specials always fire
pub struct AlwaysLow;

impl RngCore for AlwaysLow {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(0);
    }
}

/// Every roll is just under 1.0: crits and specials never fire
pub struct AlwaysHigh;

impl RngCore for AlwaysHigh {
    fn next_u32(&mut self) -> u32 {
        u32::MAX
    }

    fn next_u64(&mut self) -> u64 {
        u64::MAX
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(0xff);
    }
}
