//! Length-delimited framing for wire messages.
//!
//! Every frame is a big-endian `u32` byte length followed by the encoded
//! protobuf message. Frames above [`MAX_FRAME_SIZE`] are rejected rather
//! than buffered.

use std::io::{self, Read, Write};

use prost::Message;

/// Upper bound on a single frame (16 MB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Writes one message as a length-delimited frame.
pub fn write_frame<M: Message>(writer: &mut impl Write, message: &M) -> io::Result<()> {
    let payload = message.encode_to_vec();
    if payload.len() > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame of {} bytes exceeds maximum", payload.len()),
        ));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()
}

/// Reads one length-delimited frame and decodes it.
pub fn read_frame<M: Message + Default>(reader: &mut impl Read) -> io::Result<M> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds maximum"),
        ));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    M::decode(payload.as_slice())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Transaction, TransactionStatus};

    #[test]
    fn test_frame_round_trip() {
        let mut txn = Transaction::default();
        txn.set_id(7);
        txn.set_status(TransactionStatus::Aborted);

        let mut buf = Vec::new();
        write_frame(&mut buf, &txn).unwrap();
        let decoded: Transaction = read_frame(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, txn);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(u32::MAX).to_be_bytes());
        let err = read_frame::<Transaction>(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_frame_errors() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&8u32.to_be_bytes());
        buf.extend_from_slice(&[1, 2, 3]);
        assert!(read_frame::<Transaction>(&mut buf.as_slice()).is_err());
    }
}
