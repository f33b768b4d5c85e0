/// Computes the content hash of a piece of worklet code.
///
/// Two 32-bit accumulators seeded with `5381` and `52711` walk the UTF-16 code units of `code`
/// from the end, each step computing `acc * 33 ^ unit`. The result is
/// `hash1 * 4096 + hash2`, which always fits in the safe integer range of a JavaScript number.
pub fn worklet_hash(code: &str) -> u64 {
  let units: Vec<u16> = code.encode_utf16().collect();

  let (hash1, hash2) = units
    .iter()
    .rev()
    .fold((5381u32, 52711u32), |(hash1, hash2), unit| {
      (
        hash1.wrapping_mul(33) ^ u32::from(*unit),
        hash2.wrapping_mul(33) ^ u32::from(*unit),
      )
    });

  u64::from(hash1) * 4096 + u64::from(hash2)
}
