//! Typed cell values.
//!
//! A scalar's tag and width are fixed at construction; comparison and
//! serialization use the declared width exactly. Integers and floats are
//! serialized little-endian, fixed text occupies exactly its width, and
//! variable text is length-prefixed with a little-endian `u32`.

use bytes::Bytes;

/// Declared type (and width) of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Signed 8-bit integer.
    Int8,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// IEEE-754 double.
    Float64,
    /// Exactly N bytes, space-padded.
    FixedText(usize),
    /// Up to N bytes, length-prefixed when serialized.
    VarText(usize),
}

/// An owned cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Signed 8-bit integer.
    Int8(i8),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// IEEE-754 double.
    Float64(f64),
    /// Fixed-width text; the byte length is the declared width.
    FixedText(Bytes),
    /// Variable text up to the column's maximum.
    VarText(Bytes),
}

impl Scalar {
    /// Builds a fixed-width text scalar, padding with spaces up to `width`.
    ///
    /// Text longer than the declared width is truncated; fixed columns
    /// cannot exceed their width by construction.
    #[must_use]
    pub fn fixed_text(text: &str, width: usize) -> Self {
        let mut buf = Vec::with_capacity(width);
        buf.extend_from_slice(text.as_bytes());
        buf.truncate(width);
        buf.resize(width, b' ');
        Self::FixedText(Bytes::from(buf))
    }

    /// Builds a fixed-width text scalar from raw bytes of exactly `width`.
    #[must_use]
    pub fn fixed_text_bytes(bytes: &[u8], width: usize) -> Self {
        let mut buf = bytes.to_vec();
        buf.truncate(width);
        buf.resize(width, b' ');
        Self::FixedText(Bytes::from(buf))
    }

    /// Builds a variable-width text scalar truncated to `max`.
    #[must_use]
    pub fn var_text(text: &str, max: usize) -> Self {
        let mut buf = text.as_bytes().to_vec();
        buf.truncate(max);
        Self::VarText(Bytes::from(buf))
    }

    /// The value as `i32`; zero on tag mismatch.
    #[must_use]
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Int32(v) => *v,
            Self::Int8(v) => i32::from(*v),
            _ => {
                debug_assert!(false, "expected Int32, got {self:?}");
                0
            }
        }
    }

    /// The value as `i64`; zero on tag mismatch.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Int64(v) => *v,
            Self::Int32(v) => i64::from(*v),
            Self::Int8(v) => i64::from(*v),
            _ => {
                debug_assert!(false, "expected Int64, got {self:?}");
                0
            }
        }
    }

    /// The value as `f64`; zero on tag mismatch.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Float64(v) => *v,
            _ => {
                debug_assert!(false, "expected Float64, got {self:?}");
                0.0
            }
        }
    }

    /// The text bytes; empty on tag mismatch.
    #[must_use]
    pub fn as_text(&self) -> &[u8] {
        match self {
            Self::FixedText(b) | Self::VarText(b) => b,
            _ => {
                debug_assert!(false, "expected text, got {self:?}");
                &[]
            }
        }
    }

    /// The text as a lossy UTF-8 string.
    #[must_use]
    pub fn text_string(&self) -> String {
        String::from_utf8_lossy(self.as_text()).into_owned()
    }

    /// Serializes this scalar into `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Int8(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::Int32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::Int64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::Float64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::FixedText(b) => buf.extend_from_slice(b),
            Self::VarText(b) => {
                buf.extend_from_slice(&(b.len() as u32).to_le_bytes());
                buf.extend_from_slice(b);
            }
        }
    }

    /// Decodes one scalar of type `ty` from `buf` starting at `*pos`,
    /// advancing `*pos` past it. Returns `None` on truncated input.
    #[must_use]
    pub fn decode(ty: ScalarType, buf: &[u8], pos: &mut usize) -> Option<Self> {
        let take = |pos: &mut usize, n: usize| -> Option<&[u8]> {
            let slice = buf.get(*pos..*pos + n)?;
            *pos += n;
            Some(slice)
        };
        match ty {
            ScalarType::Int8 => {
                let raw = take(pos, 1)?;
                Some(Self::Int8(i8::from_le_bytes([raw[0]])))
            }
            ScalarType::Int32 => {
                let raw: [u8; 4] = take(pos, 4)?.try_into().ok()?;
                Some(Self::Int32(i32::from_le_bytes(raw)))
            }
            ScalarType::Int64 => {
                let raw: [u8; 8] = take(pos, 8)?.try_into().ok()?;
                Some(Self::Int64(i64::from_le_bytes(raw)))
            }
            ScalarType::Float64 => {
                let raw: [u8; 8] = take(pos, 8)?.try_into().ok()?;
                Some(Self::Float64(f64::from_le_bytes(raw)))
            }
            ScalarType::FixedText(width) => {
                let raw = take(pos, width)?;
                Some(Self::FixedText(Bytes::copy_from_slice(raw)))
            }
            ScalarType::VarText(max) => {
                let len_raw: [u8; 4] = take(pos, 4)?.try_into().ok()?;
                let len = u32::from_le_bytes(len_raw) as usize;
                if len > max {
                    return None;
                }
                let raw = take(pos, len)?;
                Some(Self::VarText(Bytes::copy_from_slice(raw)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_text_pads_to_width() {
        let s = Scalar::fixed_text("Client0", 24);
        assert_eq!(s.as_text().len(), 24);
        assert_eq!(&s.as_text()[..7], b"Client0");
        assert!(s.as_text()[7..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_fixed_text_equality_is_byte_identical() {
        assert_eq!(Scalar::fixed_text("ab", 4), Scalar::fixed_text("ab", 4));
        assert_ne!(Scalar::fixed_text("ab", 4), Scalar::fixed_text("ab ", 4));
    }

    #[test]
    fn test_int_encoding_is_little_endian() {
        let mut buf = Vec::new();
        Scalar::Int32(0x0102_0304).encode_into(&mut buf);
        assert_eq!(buf, vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_var_text_length_prefix() {
        let mut buf = Vec::new();
        Scalar::var_text("pw", 60).encode_into(&mut buf);
        assert_eq!(&buf[..4], &2u32.to_le_bytes());
        assert_eq!(&buf[4..], b"pw");

        let mut pos = 0;
        let decoded = Scalar::decode(ScalarType::VarText(60), &buf, &mut pos).unwrap();
        assert_eq!(decoded.as_text(), b"pw");
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_decode_truncated_input() {
        let mut pos = 0;
        assert!(Scalar::decode(ScalarType::Int64, &[1, 2, 3], &mut pos).is_none());
    }

    #[test]
    fn test_mixed_row_decode() {
        let mut buf = Vec::new();
        Scalar::var_text("Alice", 55).encode_into(&mut buf);
        Scalar::fixed_text("01-06-2020", 10).encode_into(&mut buf);
        Scalar::Int32(3).encode_into(&mut buf);

        let mut pos = 0;
        let cust = Scalar::decode(ScalarType::VarText(55), &buf, &mut pos).unwrap();
        let date = Scalar::decode(ScalarType::FixedText(10), &buf, &mut pos).unwrap();
        let rooms = Scalar::decode(ScalarType::Int32, &buf, &mut pos).unwrap();
        assert_eq!(cust.as_text(), b"Alice");
        assert_eq!(date.as_text(), b"01-06-2020");
        assert_eq!(rooms.as_i32(), 3);
    }
}
