//! Reading and writing words over a byte stream in a configurable byte order.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::Word;
use crate::error::{Error, Result};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Endianness {
  Little,
  Big
}

impl Default for Endianness {
  fn default() -> Endianness {
    Endianness::Little
  }
}

impl Endianness {
  fn decode(&self, bytes: &[u8; 4]) -> Word {
    match self {
      Endianness::Little => LittleEndian::read_u32(bytes),
      Endianness::Big    => BigEndian::read_u32(bytes)
    }
  }

  fn encode(&self, word: Word, bytes: &mut [u8; 4]) {
    match self {
      Endianness::Little => LittleEndian::write_u32(bytes, word),
      Endianness::Big    => BigEndian::write_u32(bytes, word)
    }
  }
}

/**
  Reads words from a byte stream, one 4-byte group at a time.

  A read that finds the stream exhausted before it consumed a single byte is a clean end of
  input, reported by `try_read` as `Ok(false)`. A read that runs out part way through is always
  `Error::UnexpectedEndOfInput`.
*/
pub struct WordReader<R> {
  inner      : R,
  endianness : Endianness,
  /// Number of bytes consumed so far.
  offset     : usize
}

impl<R: Read> WordReader<R> {
  pub fn new(inner: R) -> WordReader<R> {
    WordReader::with_endianness(inner, Endianness::default())
  }

  pub fn with_endianness(inner: R, endianness: Endianness) -> WordReader<R> {
    WordReader {
      inner,
      endianness,
      offset: 0
    }
  }

  pub fn endianness(&self) -> Endianness {
    self.endianness
  }

  pub fn set_endianness(&mut self, endianness: Endianness) {
    self.endianness = endianness;
  }

  pub fn offset(&self) -> usize {
    self.offset
  }

  pub fn into_inner(self) -> R {
    self.inner
  }

  /// Fills `buffer` with raw bytes, without any byte swapping. Returns `Ok(false)` if the stream
  /// was already exhausted.
  pub fn read_raw(&mut self, buffer: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buffer.len() {
      match self.inner.read(&mut buffer[filled..]) {
        Ok(0) => break,
        Ok(n) => filled += n,
        Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(e.into())
      }
    }
    self.offset += filled;

    match filled {
      0 if !buffer.is_empty() => Ok(false),
      n if n == buffer.len()  => Ok(true),
      _                       => Err(Error::UnexpectedEndOfInput)
    }
  }

  /**
    Reads exactly `words.len()` words. Returns `Ok(false)` if the stream ended cleanly before
    the first word; running out anywhere after that is an error.
  */
  pub fn try_read(&mut self, words: &mut [Word]) -> Result<bool> {
    let mut bytes = [0u8; 4];
    for (i, word) in words.iter_mut().enumerate() {
      if !self.read_raw(&mut bytes)? {
        return match i {
          0 => Ok(false),
          _ => Err(Error::UnexpectedEndOfInput)
        };
      }
      *word = self.endianness.decode(&bytes);
    }
    Ok(true)
  }

  /// Reads exactly `words.len()` words. Any shortfall is `Error::UnexpectedEndOfInput`.
  pub fn read(&mut self, words: &mut [Word]) -> Result<()> {
    match self.try_read(words)? {
      true  => Ok(()),
      false => Err(Error::UnexpectedEndOfInput)
    }
  }
}

/// Writes words to a byte stream in the configured byte order.
pub struct WordWriter<W> {
  inner      : W,
  endianness : Endianness,
  offset     : usize
}

impl<W: Write> WordWriter<W> {
  pub fn new(inner: W) -> WordWriter<W> {
    WordWriter::with_endianness(inner, Endianness::default())
  }

  pub fn with_endianness(inner: W, endianness: Endianness) -> WordWriter<W> {
    WordWriter {
      inner,
      endianness,
      offset: 0
    }
  }

  pub fn endianness(&self) -> Endianness {
    self.endianness
  }

  pub fn set_endianness(&mut self, endianness: Endianness) {
    self.endianness = endianness;
  }

  pub fn offset(&self) -> usize {
    self.offset
  }

  pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
    self.inner.write_all(bytes)?;
    self.offset += bytes.len();
    Ok(())
  }

  pub fn write(&mut self, words: &[Word]) -> Result<()> {
    let mut bytes = [0u8; 4];
    for word in words {
      self.endianness.encode(*word, &mut bytes);
      self.write_raw(&bytes)?;
    }
    Ok(())
  }

  pub fn flush(&mut self) -> Result<()> {
    self.inner.flush()?;
    Ok(())
  }

  pub fn into_inner(self) -> W {
    self.inner
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_both_byte_orders() {
    let bytes = [0x01u8, 0x02, 0x03, 0x04];

    let mut little = WordReader::new(&bytes[..]);
    let mut words = [0; 1];
    little.read(&mut words).unwrap();
    assert_eq!(words[0], 0x04030201);

    let mut big = WordReader::with_endianness(&bytes[..], Endianness::Big);
    big.read(&mut words).unwrap();
    assert_eq!(words[0], 0x01020304);
  }

  #[test]
  fn clean_end_is_not_an_error() {
    let bytes: [u8; 4] = [1, 0, 0, 0];
    let mut reader = WordReader::new(&bytes[..]);
    let mut words = [0; 1];
    assert!(reader.try_read(&mut words).unwrap());
    assert!(!reader.try_read(&mut words).unwrap());
    assert_eq!(reader.offset(), 4);
  }

  #[test]
  fn partial_word_is_unexpected_end() {
    let bytes: [u8; 6] = [1, 0, 0, 0, 2, 0];
    let mut reader = WordReader::new(&bytes[..]);
    let mut words = [0; 2];
    match reader.try_read(&mut words) {
      Err(Error::UnexpectedEndOfInput) => {}
      other => panic!("expected unexpected end of input, got {:?}", other)
    }
  }

  #[test]
  fn short_multi_word_read_is_unexpected_end() {
    let bytes: [u8; 4] = [1, 0, 0, 0];
    let mut reader = WordReader::new(&bytes[..]);
    let mut words = [0; 2];
    assert!(matches!(reader.try_read(&mut words), Err(Error::UnexpectedEndOfInput)));
  }

  #[test]
  fn empty_read_needs_no_input() {
    let mut reader = WordReader::new(&[0u8; 0][..]);
    assert!(reader.try_read(&mut []).unwrap());
    assert!(matches!(reader.read(&mut [0; 1]), Err(Error::UnexpectedEndOfInput)));
  }

  #[test]
  fn writes_both_byte_orders() {
    let mut little = WordWriter::new(Vec::new());
    little.write(&[0x04030201]).unwrap();
    assert_eq!(little.into_inner(), vec![1, 2, 3, 4]);

    let mut big = WordWriter::with_endianness(Vec::new(), Endianness::Big);
    big.write(&[0x04030201, 0xAABBCCDD]).unwrap();
    assert_eq!(big.offset(), 8);
    assert_eq!(big.into_inner(), vec![4, 3, 2, 1, 0xAA, 0xBB, 0xCC, 0xDD]);
  }
}
