//! Core string types.
//!
//! Every type in this module validates its content on construction, so a
//! value that exists is always representable on the wire. Whether a string
//! argument is sent as a quoted string or as a literal is *not* part of the
//! value: the encoder decides per string, driven by the active
//! [`EncodingOptions`](crate::codec::EncodingOptions).

use std::{fmt, num::NonZeroU32, str::from_utf8};

use thiserror::Error;

// ----- character classes (RFC 3501 formal syntax) -----

/// `CHAR = %x01-7F`
pub(crate) fn is_char(byte: u8) -> bool {
    matches!(byte, 0x01..=0x7f)
}

/// `CTL = %x00-1F / %x7F`
pub(crate) fn is_ctl(byte: u8) -> bool {
    matches!(byte, 0x00..=0x1f | 0x7f)
}

/// `quoted-specials = DQUOTE / "\"`
pub(crate) fn is_quoted_specials(byte: u8) -> bool {
    byte == b'"' || byte == b'\\'
}

/// `list-wildcards = "%" / "*"`
pub(crate) fn is_list_wildcards(byte: u8) -> bool {
    byte == b'%' || byte == b'*'
}

/// `resp-specials = "]"`
pub(crate) fn is_resp_specials(byte: u8) -> bool {
    byte == b']'
}

/// `atom-specials = "(" / ")" / "{" / SP / CTL / list-wildcards / quoted-specials / resp-specials`
pub(crate) fn is_atom_specials(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'{' | b' ')
        || is_ctl(byte)
        || is_list_wildcards(byte)
        || is_quoted_specials(byte)
        || is_resp_specials(byte)
}

/// `ATOM-CHAR = <any CHAR except atom-specials>`
pub(crate) fn is_atom_char(byte: u8) -> bool {
    is_char(byte) && !is_atom_specials(byte)
}

/// `ASTRING-CHAR = ATOM-CHAR / resp-specials`
pub(crate) fn is_astring_char(byte: u8) -> bool {
    is_atom_char(byte) || is_resp_specials(byte)
}

/// `list-char = ATOM-CHAR / list-wildcards / resp-specials`
pub(crate) fn is_list_char(byte: u8) -> bool {
    is_atom_char(byte) || is_list_wildcards(byte) || is_resp_specials(byte)
}

/// `TEXT-CHAR = %x01-09 / %x0B-0C / %x0E-7F`
pub(crate) fn is_text_char(byte: u8) -> bool {
    matches!(byte, 0x01..=0x09 | 0x0b..=0x0c | 0x0e..=0x7f)
}

/// `CHAR8 = %x01-ff`
pub(crate) fn is_char8(byte: u8) -> bool {
    byte != 0
}

/// `base64-char = ALPHA / DIGIT / "+" / "/"`
pub(crate) fn is_base64_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/'
}

// ----- tag -----

/// A command tag.
///
/// "Each client command is prefixed with an identifier (typically a short
/// alphanumeric string, e.g., A0001, A0002) called a 'tag'."
/// ([RFC 3501](https://www.rfc-editor.org/rfc/rfc3501.html))
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub(crate) String);

impl Tag {
    pub fn verify(value: impl AsRef<[u8]>) -> Result<(), TagError> {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(TagError::Empty);
        }

        if let Some(position) = value
            .iter()
            .position(|b| !is_astring_char(*b) || *b == b'+')
        {
            return Err(TagError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Tag {
    type Error = TagError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::verify(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Tag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::verify(&value)?;

        Ok(Self(value))
    }
}

impl TryFrom<&[u8]> for Tag {
    type Error = TagError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::verify(value)?;

        // Safety: `verify` leaves ASCII only.
        Ok(Self(from_utf8(value).unwrap().to_owned()))
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum TagError {
    #[error("Must not be empty")]
    Empty,
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- atom -----

/// An atom.
///
/// "An atom consists of one or more non-special characters."
/// ([RFC 3501](https://www.rfc-editor.org/rfc/rfc3501.html))
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub(crate) String);

impl Atom {
    pub fn verify(value: impl AsRef<[u8]>) -> Result<(), AtomError> {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(AtomError::Empty);
        }

        if let Some(position) = value.iter().position(|b| !is_atom_char(*b)) {
            return Err(AtomError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }

    pub(crate) fn unvalidated(value: &str) -> Self {
        debug_assert!(Self::verify(value).is_ok());

        Self(value.to_owned())
    }

    /// Case-insensitive comparison against an ASCII reference word.
    pub(crate) fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl TryFrom<&str> for Atom {
    type Error = AtomError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::verify(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Atom {
    type Error = AtomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::verify(&value)?;

        Ok(Self(value))
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum AtomError {
    #[error("Must not be empty")]
    Empty,
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- string -----

/// A string argument, e.g., a password, a mailbox name, or a search value.
///
/// May contain any octet except NUL. The wire form (quoted string,
/// `{N}`/`{N+}`/`{N-}` literal) is chosen by the encoder; see
/// [`EncodeBuffer::write_string`](crate::codec::EncodeBuffer::write_string).
/// Byte sequences that contain NUL can only be sent as [`Literal8`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IString(pub(crate) Vec<u8>);

impl IString {
    pub fn verify(value: impl AsRef<[u8]>) -> Result<(), IStringError> {
        let value = value.as_ref();

        if let Some(position) = value.iter().position(|b| !is_char8(*b)) {
            return Err(IStringError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl TryFrom<&str> for IString {
    type Error = IStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::verify(value)?;

        Ok(Self(value.as_bytes().to_vec()))
    }
}

impl TryFrom<String> for IString {
    type Error = IStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::verify(&value)?;

        Ok(Self(value.into_bytes()))
    }
}

impl TryFrom<&[u8]> for IString {
    type Error = IStringError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::verify(value)?;

        Ok(Self(value.to_vec()))
    }
}

impl TryFrom<Vec<u8>> for IString {
    type Error = IStringError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::verify(&value)?;

        Ok(Self(value))
    }
}

impl AsRef<[u8]> for IString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum IStringError {
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

/// A binary string (literal8, RFC 3516).
///
/// Unlike [`IString`], NUL bytes are allowed. Encodes as `~{N}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Literal8(pub Vec<u8>);

impl Literal8 {
    pub fn inner(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Literal8 {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Literal8 {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl AsRef<[u8]> for Literal8 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// `nstring = string / nil`
///
/// Produced by the response parser; `None` is wire `NIL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NString(pub Option<Vec<u8>>);

impl NString {
    pub fn as_deref(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }
}

impl From<&str> for NString {
    fn from(value: &str) -> Self {
        Self(Some(value.as_bytes().to_vec()))
    }
}

impl From<&[u8]> for NString {
    fn from(value: &[u8]) -> Self {
        Self(Some(value.to_vec()))
    }
}

// ----- text -----

/// Human-readable response text, `text = 1*TEXT-CHAR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text(pub(crate) String);

impl Text {
    pub fn verify(value: impl AsRef<[u8]>) -> Result<(), TextError> {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(TextError::Empty);
        }

        if let Some(position) = value.iter().position(|b| !is_text_char(*b)) {
            return Err(TextError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }

    pub(crate) fn unvalidated(value: &str) -> Self {
        debug_assert!(Self::verify(value).is_ok());

        Self(value.to_owned())
    }
}

impl TryFrom<&str> for Text {
    type Error = TextError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::verify(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Text {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::verify(&value)?;

        Ok(Self(value))
    }
}

impl AsRef<str> for Text {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum TextError {
    #[error("Must not be empty")]
    Empty,
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- charset -----

/// `charset = atom / quoted` (see errata id: 261)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Charset(pub(crate) String);

impl Charset {
    pub fn verify(value: impl AsRef<[u8]>) -> Result<(), CharsetError> {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(CharsetError::Empty);
        }

        if let Some(position) = value
            .iter()
            .position(|b| !is_text_char(*b) || is_quoted_specials(*b))
        {
            return Err(CharsetError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }

    /// Whether the value fits an atom, i.e., needs no quoting on the wire.
    pub(crate) fn is_atom(&self) -> bool {
        self.0.bytes().all(is_atom_char)
    }

    pub(crate) fn unvalidated(value: &str) -> Self {
        debug_assert!(Self::verify(value).is_ok());

        Self(value.to_owned())
    }
}

impl TryFrom<&str> for Charset {
    type Error = CharsetError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::verify(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl AsRef<str> for Charset {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum CharsetError {
    #[error("Must not be empty")]
    Empty,
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- quoted char -----

/// `QUOTED-CHAR`, e.g., the hierarchy delimiter in LIST responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuotedChar(pub(crate) char);

impl QuotedChar {
    pub fn verify(value: char) -> Result<(), QuotedCharError> {
        if value.is_ascii() && is_text_char(value as u8) {
            Ok(())
        } else {
            Err(QuotedCharError::NotAllowed(value))
        }
    }

    pub fn inner(&self) -> char {
        self.0
    }

    pub(crate) fn unvalidated(value: char) -> Self {
        debug_assert!(Self::verify(value).is_ok());

        Self(value)
    }
}

impl TryFrom<char> for QuotedChar {
    type Error = QuotedCharError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::verify(value)?;

        Ok(Self(value))
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum QuotedCharError {
    #[error("Invalid character {0:?}")]
    NotAllowed(char),
}

// ----- non-empty vector -----

/// A vector that contains at least one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vec1<T>(pub(crate) Vec<T>);

impl<T> Vec1<T> {
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub(crate) fn unvalidated(inner: Vec<T>) -> Self {
        debug_assert!(!inner.is_empty());

        Self(inner)
    }
}

impl<T> From<T> for Vec1<T> {
    fn from(value: T) -> Self {
        Self(vec![value])
    }
}

impl<T> TryFrom<Vec<T>> for Vec1<T> {
    type Error = Vec1Error;

    fn try_from(value: Vec<T>) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(Vec1Error::Empty);
        }

        Ok(Self(value))
    }
}

impl<T> AsRef<[T]> for Vec1<T> {
    fn as_ref(&self) -> &[T] {
        &self.0
    }
}

impl<T> IntoIterator for Vec1<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum Vec1Error {
    #[error("Must not be empty")]
    Empty,
}

// ----- literal mode -----

/// Synchronizing (`{N}`) vs non-synchronizing (`{N+}` / `{N-}`) literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralMode {
    /// The server must answer with a continuation request before the
    /// literal payload may be sent.
    Sync,
    /// The payload follows immediately (RFC 7888).
    NonSync,
}

/// A non-zero message sequence number or UID.
pub type SeqNo = NonZeroU32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag() {
        assert!(Tag::try_from("A1").is_ok());
        assert!(Tag::try_from("a.82").is_ok());
        assert!(Tag::try_from("").is_err());
        assert!(Tag::try_from("A+").is_err());
        assert!(Tag::try_from("A 1").is_err());
    }

    #[test]
    fn test_atom() {
        assert!(Atom::try_from("ok").is_ok());
        assert!(Atom::try_from("").is_err());
        assert!(Atom::try_from("with space").is_err());
        assert!(Atom::try_from("br(ce").is_err());
    }

    #[test]
    fn test_istring_rejects_nul() {
        assert!(IString::try_from("password").is_ok());
        assert!(IString::try_from(b"\x00".as_ref()).is_err());
    }

    #[test]
    fn test_vec1() {
        assert!(Vec1::<u8>::try_from(vec![]).is_err());
        assert_eq!(Vec1::from(1u8).as_slice(), &[1]);
    }
}
