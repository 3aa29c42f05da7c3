use crate::bits::BitBuffer;

pub(super) fn encoding_size(count: usize) -> usize {
    8 * count
}

pub(super) fn encode(data: &[u8], buf: &mut BitBuffer) {
    buf.write_bytes(data);
}
