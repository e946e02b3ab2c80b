/*!
  A module is a header followed by an ordered list of instructions. This module owns the four
  whole-module operations:

    load    bytes to `Module`, stopping at the first error
    save    `Module` to bytes, stopping at the first error
    verify  field checks on every instruction, then the logical layout
    strip   remove the debug instructions

  `Decoder` and `Encoder` are the instruction-at-a-time loops underneath `load` and `save`. They
  are exposed for tools that want to report where in a stream a failure happened.
*/

use std::io::{Read, Write};

use crate::bytecode::{
  FrameReader,
  FrameWriter,
  Header,
  Instruction,
  InstructionSet,
  Word,
  WordReader,
  WordWriter,
  INSTRUCTION_SET
};
use crate::error::{Error, Result};
use crate::layout::{self, Category};

#[derive(Clone, Debug, PartialEq)]
pub struct Module {
  pub header : Header,
  pub code   : Vec<Box<dyn Instruction>>
}

impl Default for Module {
  fn default() -> Module {
    Module::new()
  }
}

impl Module {
  /// An empty little-endian module of the supported version.
  pub fn new() -> Module {
    Module::with_header(Header::default())
  }

  pub fn with_header(header: Header) -> Module {
    Module {
      header,
      code: Vec::new()
    }
  }

  pub fn push<I: Instruction>(&mut self, instruction: I) {
    self.code.push(Box::new(instruction));
  }

  /// Loads a module using the shared `INSTRUCTION_SET`.
  pub fn load<R: Read>(reader: R) -> Result<Module> {
    Module::load_with(&INSTRUCTION_SET, reader)
  }

  /**
    Decodes the header, then instructions until the stream ends cleanly between two
    instructions. Any other failure is returned as is; no partial module survives it.
  */
  pub fn load_with<R: Read>(set: &InstructionSet, reader: R) -> Result<Module> {
    let mut decoder = Decoder::new(set, reader);

    let header = match decoder.decode_header() {
      Ok(header) => header,
      Err(error) => {
        log::error!("failed to load module header: {}", error);
        return Err(error);
      }
    };

    let mut module = Module::with_header(header);
    loop {
      match decoder.decode_instruction() {
        Ok(Some(instruction)) => module.code.push(instruction),
        Ok(None) => break,
        Err(error) => {
          log::error!(
            "failed to load instruction {} at byte offset {:#x}: {}",
            decoder.instruction_index(),
            decoder.byte_offset(),
            error
          );
          return Err(error);
        }
      }
    }

    log::debug!("loaded {} instructions ({})", module.code.len(), module.header);
    Ok(module)
  }

  /// Saves the module using the shared `INSTRUCTION_SET`.
  pub fn save<W: Write>(&self, writer: W) -> Result<()> {
    self.save_with(&INSTRUCTION_SET, writer)
  }

  /// Encodes the header, then every instruction in order. The first failure aborts.
  pub fn save_with<W: Write>(&self, set: &InstructionSet, writer: W) -> Result<()> {
    let mut encoder = Encoder::new(set, writer);
    encoder.encode_header(&self.header)?;
    for instruction in &self.code {
      encoder.encode_instruction(&**instruction)?;
    }
    encoder.flush()?;

    log::debug!("saved {} instructions", self.code.len());
    Ok(())
  }

  pub fn to_bytes(&self) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    self.save(&mut bytes)?;
    Ok(bytes)
  }

  /// The category of each instruction, in order.
  pub fn categories(&self) -> Vec<Category> {
    self.code.iter().map(|instruction| instruction.category()).collect()
  }

  /**
    Runs every instruction's own checks, in order, and then matches the instruction
    categories against the logical layout. The first failure is returned.
  */
  pub fn verify(&self) -> Result<()> {
    for instruction in &self.code {
      instruction.verify()?;
    }
    layout::validate(&self.categories())?;

    log::debug!("verified {} instructions", self.code.len());
    Ok(())
  }

  /// Removes every debug instruction, keeping the order of the rest.
  pub fn strip(&mut self) {
    let before = self.code.len();
    self.code.retain(|instruction| instruction.category() != Category::Debug);
    log::debug!("stripped {} debug instructions", before - self.code.len());
  }
}

/**
  Decodes a module one instruction at a time.

  The decoder owns a `FrameReader` and its scratch buffer, so one decoder serves one stream on
  one thread. The `InstructionSet` is only borrowed and may be shared.
*/
pub struct Decoder<'s, R> {
  set               : &'s InstructionSet,
  frames            : FrameReader<R>,
  instruction_index : usize
}

impl<'s, R: Read> Decoder<'s, R> {
  pub fn new(set: &'s InstructionSet, reader: R) -> Decoder<'s, R> {
    Decoder {
      set,
      frames            : FrameReader::new(WordReader::new(reader)),
      instruction_index : 0
    }
  }

  /// Reads the header and fixes the byte order for the rest of the stream.
  pub fn decode_header(&mut self) -> Result<Header> {
    Header::decode(self.frames.words_mut())
  }

  /// The next instruction, or `None` at a clean end of stream.
  pub fn decode_instruction(&mut self) -> Result<Option<Box<dyn Instruction>>> {
    Ok(self.decode_frame()?.map(|(instruction, _)| instruction))
  }

  /**
    Like `decode_instruction`, but also returns the instruction's words. The words borrow the
    decoder's scratch buffer and are overwritten by the next call.
  */
  pub fn decode_frame(&mut self) -> Result<Option<(Box<dyn Instruction>, &[Word])>> {
    let set = self.set;
    #[cfg(feature = "trace_instructions")]
    let offset = self.frames.words().offset();

    let frame = match self.frames.read_frame()? {
      Some(frame) => frame,
      None        => return Ok(None)
    };
    let instruction = set.decode(frame)?;

    #[cfg(feature = "trace_instructions")]
    log::trace!("{:>6} {:#08x}  {:?}", self.instruction_index, offset, instruction);

    self.instruction_index += 1;
    Ok(Some((instruction, frame)))
  }

  /// Number of instructions decoded so far, which after a failure is the failing one's index.
  pub fn instruction_index(&self) -> usize {
    self.instruction_index
  }

  /// Byte offset of the instruction most recently read.
  pub fn byte_offset(&self) -> usize {
    self.frames.frame_offset()
  }
}

/// Encodes a module one instruction at a time, through a scratch buffer owned by the encoder.
pub struct Encoder<'s, W> {
  set               : &'s InstructionSet,
  frames            : FrameWriter<W>,
  scratch           : Vec<Word>,
  instruction_index : usize
}

impl<'s, W: Write> Encoder<'s, W> {
  pub fn new(set: &'s InstructionSet, writer: W) -> Encoder<'s, W> {
    Encoder {
      set,
      frames            : FrameWriter::new(WordWriter::new(writer)),
      scratch           : Vec::new(),
      instruction_index : 0
    }
  }

  /// Writes the header and fixes the byte order for the rest of the stream.
  pub fn encode_header(&mut self, header: &Header) -> Result<()> {
    header.encode(self.frames.words_mut())
  }

  pub fn encode_instruction(&mut self, instruction: &dyn Instruction) -> Result<()> {
    let word_count = instruction.word_count();
    if self.scratch.len() < word_count {
      self.scratch.resize(word_count, 0);
    }

    let written = self.set.encode(instruction, &mut self.scratch)?;
    if written != word_count {
      return Err(Error::InvalidInstructionSize(written));
    }

    #[cfg(feature = "trace_instructions")]
    log::trace!("{:>6} {:#08x}  {:?}", self.instruction_index, self.frames.words().offset(), instruction);

    self.frames.write_frame(&self.scratch[..written])?;
    self.instruction_index += 1;
    Ok(())
  }

  /// Number of instructions encoded so far.
  pub fn instruction_index(&self) -> usize {
    self.instruction_index
  }

  pub fn flush(&mut self) -> Result<()> {
    self.frames.words_mut().flush()
  }

  pub fn into_inner(self) -> W {
    self.frames.into_inner().into_inner()
  }
}
