/// Keyed LFSR digest over `message`.
///
/// Every bit is processed MSB first. When the bit is set the current key is
/// XORed into the running sum; the key is then rolled one position to the
/// right, and if the bit dropped off was set the generator is XORed in.
///
/// This is an integrity/identity tag for low-resource links, not a
/// cryptographic hash: there is no collision resistance.
///
/// ```
/// use growatt_node::checksum::lfsr_digest16;
///
/// assert_eq!(lfsr_digest16(&[0x00], 0x8810, 0x0000), 0x0000);
/// assert_eq!(lfsr_digest16(&[0x80], 0x8810, 0xba95), 0xba95);
/// ```
pub fn lfsr_digest16(message: &[u8], generator: u16, key: u16) -> u16 {
    let mut key = key;
    let mut sum = 0u16;

    for byte in message {
        for bit in (0..8).rev() {
            if (byte >> bit) & 1 == 1 {
                sum ^= key;
            }

            // the dropped lsb decides whether the generator is applied
            key = if key & 1 == 1 {
                (key >> 1) ^ generator
            } else {
                key >> 1
            };
        }
    }

    sum
}
