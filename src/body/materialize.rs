use bytes::{BufMut, Bytes, BytesMut};

use super::{AccumulatedBody, BodyError};

impl AccumulatedBody {
    /// Concatenate every accumulated range, in order, into one contiguous
    /// UTF-8 buffer.
    ///
    /// Every byte of every range is included exactly once. Fails when the
    /// bytes are not valid UTF-8, the declared request encoding.
    pub fn materialize(self) -> Result<String, BodyError> {
        let Self { ranges, len } = self;

        let bytes = match <[Bytes; 1]>::try_from(ranges) {
            // single range, no concatenation needed
            Ok([range]) => Vec::from(range),
            Err(ranges) => {
                let mut buf = BytesMut::with_capacity(len as usize);
                for range in ranges {
                    buf.put(range);
                }
                Vec::from(buf)
            }
        };

        String::from_utf8(bytes).map_err(|err| BodyError::utf8(err.utf8_error()))
    }
}
