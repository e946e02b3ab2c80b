/*!

  A module is a stream of 32 bit words. Words are stored in either byte order, and the byte
  order is fixed by the first four bytes of the stream, which hold the magic number. Four more
  words complete the header:

    Magic:      raw bytes, selects the byte order of everything after it
    Version:    must equal `VERSION` exactly
    Generator:  tool that produced the module
    Bound:      every result id is less than this
    Reserved:   zero

  Instructions follow the header back to back. The first word of an instruction holds its
  total word count in the high 16 bits and its opcode in the low 16 bits:

    [WordCount:16][Opcode:16] [Operand:32]*

  The shape of the operands depends on the opcode and is handled by the `Codec` registered for
  it. Codecs for record types are generated by the `instruction!` macro from an ordered list of
  fields, each of which knows how many words it occupies and how to read and write itself.

*/

mod binary;
mod field;
mod header;
mod instruction;
pub mod packed;
mod registry;
mod stream;

// If you change this you must also change `stream::WordReader` and `stream::WordWriter`.
pub type Word = u32;
/// Opcodes occupy the low half of an instruction's first word.
pub type Opcode = u16;

pub use binary::{header_word, split_header_word, FrameReader, FrameWriter};
pub use field::{Enumerant, Field, FieldReader, FieldWriter, Id};
pub use header::{Header, MAGIC, VERSION};
pub use instruction::{Instruction, Record};
pub use registry::{Builder, Codec, InstructionSet, RecordCodec, INSTRUCTION_SET, RESERVED_OPCODE};
pub use stream::{Endianness, WordReader, WordWriter};
