//! Known-answer test helpers.

use crate::{
    codec::{EncodeBuffer, EncodeIntoBuffer, EncodingOptions},
    utils::escape_byte_string,
};

/// Encodes `object` with default options and compares the raw bytes
/// against `expected`, ignoring chunk boundaries.
pub(crate) fn known_answer_test_encode(object: &impl EncodeIntoBuffer, expected: &[u8]) {
    let mut buf = EncodeBuffer::new(EncodingOptions::default());
    object.encode_into(&mut buf).unwrap();

    let got = buf.dump();

    if expected != got.as_slice() {
        panic!(
            "Left:  <<<{}>>>\nRight: <<<{}>>>",
            escape_byte_string(expected),
            escape_byte_string(&got),
        );
    }
}