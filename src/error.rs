//! Errors produced while reading, writing, and verifying modules.
//!
//! Errors are never aggregated. The first failure aborts the enclosing operation and is handed
//! back to the caller as-is.

use std::io;

use thiserror::Error;

use crate::bytecode::{Opcode, Word};
use crate::layout::Category;

#[derive(Debug, Error)]
pub enum Error {
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  /// The byte stream ended in the middle of a read.
  #[error("unexpected end of input")]
  UnexpectedEndOfInput,

  /// The first four bytes match neither byte order of the magic number. Holds the bytes
  /// read most significant first.
  #[error("invalid magic value: {0:#010x}")]
  InvalidMagicValue(Word),

  #[error("unsupported module version: {0:#010x}")]
  UnsupportedVersion(Word),

  /// A word count of zero, one too large for the header word, or one that disagrees with the
  /// buffer holding the instruction.
  #[error("invalid instruction size: {0}")]
  InvalidInstructionSize(usize),

  #[error("missing instruction arguments for opcode {0}")]
  MissingInstructionArguments(Opcode),

  #[error("{count} excess instruction arguments for opcode {opcode}")]
  ExcessInstructionArguments {
    opcode: Opcode,
    count: usize
  },

  #[error("invalid string operand for opcode {0}")]
  InvalidString(Opcode),

  #[error("unknown instruction: {0}")]
  UnknownInstruction(Opcode),

  /// The opcode is reserved and may never appear in a module.
  #[error("unacceptable instruction: {0}")]
  UnacceptableInstruction(Opcode),

  #[error("codec for {codec} cannot encode opcode {opcode}")]
  CodecMismatch {
    opcode: Opcode,
    codec: &'static str
  },

  #[error(
    "verification of {instruction} failed{}: {reason}",
    .field.map(|name| format!(" at field `{}`", name)).unwrap_or_default()
  )]
  FieldVerificationFailed {
    instruction: &'static str,
    /// `None` when the instruction's own check failed rather than one of its fields.
    field: Option<&'static str>,
    reason: String
  },

  #[error("logical layout violation: {0}")]
  Layout(#[from] LayoutViolation),
}

/// The ways an instruction sequence can break the logical layout. Positions are indices into
/// `Module::code`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LayoutViolation {
  /// Holds the position right after the preamble, where the memory model belongs.
  #[error("missing memory model at position {0}")]
  MissingMemoryModel(usize),

  /// `position` is that of the second memory model.
  #[error("too many memory models ({count}), the second at position {position}")]
  TooManyMemoryModels {
    position: usize,
    count: usize
  },

  #[error("missing entry point at position {0}")]
  MissingEntryPoint(usize),

  #[error("entry point at position {0} has no execution mode")]
  MissingExecutionMode(usize),

  /// `found` is `None` when the module ends inside a function definition.
  #[error(
    "malformed function definition at position {position}: {}",
    .found.map(|category| format!("unexpected {} instruction", category))
      .unwrap_or_else(|| String::from("unterminated function"))
  )]
  MalformedFunction {
    position: usize,
    found: Option<Category>
  },

  #[error("misplaced {category} instruction at position {position}")]
  MisplacedInstruction {
    position: usize,
    category: Category
  },
}

pub type Result<T> = std::result::Result<T, Error>;
