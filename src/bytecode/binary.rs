/*!
  This module is responsible for framing instructions: splitting the word stream into whole
  instructions on the way in and writing whole instructions on the way out.

    [WordCount:16][Opcode:16] [Operand:32]*

  The word count includes the first word, so the smallest legal instruction is one word long.
*/
use std::io::{Read, Write};

use super::{Opcode, Word, WordReader, WordWriter};
use crate::error::{Error, Result};

/// The largest word count that fits in the high half of an instruction's first word.
pub const MAX_WORD_COUNT: usize = 0xFFFF;

/// Decomposes the first word of an instruction into its word count and opcode.
pub fn split_header_word(word: Word) -> (usize, Opcode) {
  ((word >> 16) as usize, (word & 0xFFFF) as Opcode)
}

/// Composes the first word of an instruction.
pub fn header_word(word_count: usize, opcode: Opcode) -> Result<Word> {
  if word_count < 1 || word_count > MAX_WORD_COUNT {
    return Err(Error::InvalidInstructionSize(word_count));
  }
  Ok(((word_count as Word) << 16) | opcode as Word)
}

/**
  Reads one instruction at a time into a scratch buffer that grows to fit the largest
  instruction seen so far.

  The slice returned by `read_frame` borrows that buffer, so it only lives until the next call.
  Copy it if it needs to outlive the next read.
*/
pub struct FrameReader<R> {
  words        : WordReader<R>,
  scratch      : Vec<Word>,
  /// Byte offset of the most recent frame.
  frame_offset : usize
}

impl<R: Read> FrameReader<R> {
  pub fn new(words: WordReader<R>) -> FrameReader<R> {
    FrameReader {
      words,
      scratch      : Vec::new(),
      frame_offset : 0
    }
  }

  pub fn words(&self) -> &WordReader<R> {
    &self.words
  }

  pub fn words_mut(&mut self) -> &mut WordReader<R> {
    &mut self.words
  }

  /// Byte offset at which the most recently read frame started.
  pub fn frame_offset(&self) -> usize {
    self.frame_offset
  }

  /**
    Reads the next instruction, header word included. Returns `Ok(None)` if the stream ends
    cleanly between instructions. A stream that ends inside an instruction is
    `Error::UnexpectedEndOfInput`.
  */
  pub fn read_frame(&mut self) -> Result<Option<&[Word]>> {
    self.frame_offset = self.words.offset();

    let mut first = [0 as Word; 1];
    if !self.words.try_read(&mut first)? {
      return Ok(None);
    }

    let (word_count, _opcode) = split_header_word(first[0]);
    if word_count < 1 {
      return Err(Error::InvalidInstructionSize(word_count));
    }

    if self.scratch.len() < word_count {
      self.scratch.resize(word_count, 0);
    }
    self.scratch[0] = first[0];
    self.words.read(&mut self.scratch[1..word_count])?;

    Ok(Some(&self.scratch[..word_count]))
  }

  pub fn into_inner(self) -> WordReader<R> {
    self.words
  }
}

/// Writes whole instructions.
pub struct FrameWriter<W> {
  words : WordWriter<W>
}

impl<W: Write> FrameWriter<W> {
  pub fn new(words: WordWriter<W>) -> FrameWriter<W> {
    FrameWriter { words }
  }

  pub fn words(&self) -> &WordWriter<W> {
    &self.words
  }

  pub fn words_mut(&mut self) -> &mut WordWriter<W> {
    &mut self.words
  }

  /**
    Writes the instruction whose first word is `frame[0]`. Exactly as many words as that first
    word claims are written; the slice may be longer, but not shorter.
  */
  pub fn write_frame(&mut self, frame: &[Word]) -> Result<()> {
    let word_count = match frame.first() {
      Some(first) => split_header_word(*first).0,
      None        => return Err(Error::InvalidInstructionSize(0))
    };
    if word_count < 1 || word_count > frame.len() {
      return Err(Error::InvalidInstructionSize(word_count));
    }
    self.words.write(&frame[..word_count])
  }

  pub fn into_inner(self) -> WordWriter<W> {
    self.words
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn bytes_of(words: &[Word]) -> Vec<u8> {
    let mut writer = WordWriter::new(Vec::new());
    writer.write(words).unwrap();
    writer.into_inner()
  }

  #[test]
  fn header_word_layout() {
    assert_eq!(header_word(3, 17).unwrap(), 0x0003_0011);
    assert_eq!(split_header_word(0x0003_0011), (3, 17));
    assert!(matches!(header_word(0, 17), Err(Error::InvalidInstructionSize(0))));
    assert!(matches!(header_word(0x1_0000, 17), Err(Error::InvalidInstructionSize(0x1_0000))));
  }

  #[test]
  fn reads_consecutive_frames() {
    let bytes = bytes_of(&[0x0002_0011, 1, 0x0001_00FD, 0x0003_0005, 9, 0]);
    let mut frames = FrameReader::new(WordReader::new(&bytes[..]));

    assert_eq!(frames.read_frame().unwrap(), Some(&[0x0002_0011, 1][..]));
    assert_eq!(frames.frame_offset(), 0);
    assert_eq!(frames.read_frame().unwrap(), Some(&[0x0001_00FD][..]));
    assert_eq!(frames.frame_offset(), 8);
    assert_eq!(frames.read_frame().unwrap(), Some(&[0x0003_0005, 9, 0][..]));
    assert_eq!(frames.read_frame().unwrap(), None);
  }

  #[test]
  fn zero_word_count_is_invalid() {
    let bytes = bytes_of(&[0x0000_0011, 1]);
    let mut frames = FrameReader::new(WordReader::new(&bytes[..]));
    assert!(matches!(frames.read_frame(), Err(Error::InvalidInstructionSize(0))));
  }

  #[test]
  fn truncated_frame_is_unexpected_end() {
    let bytes = bytes_of(&[0x0004_0011, 1, 2]);
    let mut frames = FrameReader::new(WordReader::new(&bytes[..]));
    assert!(matches!(frames.read_frame(), Err(Error::UnexpectedEndOfInput)));
  }

  #[test]
  fn write_checks_word_count() {
    let mut frames = FrameWriter::new(WordWriter::new(Vec::new()));
    assert!(matches!(frames.write_frame(&[0x0003_0011, 1]), Err(Error::InvalidInstructionSize(3))));
    assert!(matches!(frames.write_frame(&[0x0000_0011]), Err(Error::InvalidInstructionSize(0))));
    assert!(matches!(frames.write_frame(&[]), Err(Error::InvalidInstructionSize(0))));

    // Only the claimed words are written.
    frames.write_frame(&[0x0002_0011, 1, 0xFFFF_FFFF]).unwrap();
    assert_eq!(frames.into_inner().into_inner(), bytes_of(&[0x0002_0011, 1]));
  }
}
