/// Stable 32-bit string hash: `h = h * 31 + unit` over UTF-16 code units,
/// so the same name always lands on the same value across runs and platforms
#[inline]
pub fn name_hash(name: &str) -> u32 {
    name.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as u32))
}
