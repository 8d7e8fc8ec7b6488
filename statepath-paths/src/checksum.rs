//! Path checksums.
//!
//! CRC-16 is CRC-16/IBM-3740 (also known as CCITT-FALSE). CRC-32 is the
//! standard ISO-HDLC checksum used by zip and zlib.

use crc::{Crc, CRC_16_IBM_3740, CRC_32_ISO_HDLC};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}
