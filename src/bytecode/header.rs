//! The fixed five-word module header and byte order detection.

use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

use super::{Endianness, Word, WordReader, WordWriter};
use crate::error::{Error, Result};

/// The magic number, as it reads in the module's own byte order.
pub const MAGIC: Word = 0x0723_0203;
/// The only version accepted by the decoder and the encoder. There is no range: a module of any
/// other version is rejected.
pub const VERSION: Word = 0x0001_0000;

/**
  The module header. `magic` holds the first four bytes of the stream read most significant byte
  first. A little-endian module starts with the bytes `07 23 02 03`, so its `magic` is `MAGIC`; a
  big-endian module starts with `03 02 23 07` and its `magic` is `MAGIC.swap_bytes()`. Writing it
  back byte-for-byte reproduces the original byte order.
*/
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Header {
  pub magic     : Word,
  pub version   : Word,
  pub generator : Word,
  /// Every result id in the module is less than `bound`. Informational only.
  pub bound     : Word,
  pub reserved  : Word
}

impl Default for Header {
  fn default() -> Header {
    Header::new(Endianness::Little)
  }
}

impl Header {
  pub fn new(endianness: Endianness) -> Header {
    let magic = match endianness {
      Endianness::Little => MAGIC,
      Endianness::Big    => MAGIC.swap_bytes()
    };
    Header {
      magic,
      version   : VERSION,
      generator : 0,
      bound     : 0,
      reserved  : 0
    }
  }

  /// The byte order selected by `magic`.
  pub fn endianness(&self) -> Result<Endianness> {
    endianness_of(self.magic.to_be_bytes())
  }

  /**
    Reads the header and switches `reader` to the byte order implied by the magic bytes. An
    unrecognized magic value aborts immediately, as nothing after it can be interpreted.
  */
  pub fn decode<R: Read>(reader: &mut WordReader<R>) -> Result<Header> {
    let mut magic = [0u8; 4];
    if !reader.read_raw(&mut magic)? {
      return Err(Error::UnexpectedEndOfInput);
    }
    reader.set_endianness(endianness_of(magic)?);

    let mut words = [0 as Word; 4];
    reader.read(&mut words)?;
    let header = Header {
      magic     : Word::from_be_bytes(magic),
      version   : words[0],
      generator : words[1],
      bound     : words[2],
      reserved  : words[3]
    };

    if header.version != VERSION {
      return Err(Error::UnsupportedVersion(header.version));
    }
    Ok(header)
  }

  /// Writes the header and switches `writer` to the byte order selected by `magic`.
  pub fn encode<W: Write>(&self, writer: &mut WordWriter<W>) -> Result<()> {
    let endianness = self.endianness()?;
    if self.version != VERSION {
      return Err(Error::UnsupportedVersion(self.version));
    }

    writer.write_raw(&self.magic.to_be_bytes())?;
    writer.set_endianness(endianness);
    writer.write(&[self.version, self.generator, self.bound, self.reserved])
  }
}

fn endianness_of(magic: [u8; 4]) -> Result<Endianness> {
  if magic == MAGIC.to_be_bytes() {
    Ok(Endianness::Little)
  } else if magic == MAGIC.to_le_bytes() {
    Ok(Endianness::Big)
  } else {
    Err(Error::InvalidMagicValue(Word::from_be_bytes(magic)))
  }
}

impl Display for Header {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "magic {:#010x}, version {}.{}, generator {:#010x}, bound {}",
      self.magic,
      (self.version >> 16) & 0xFF,
      (self.version >> 8) & 0xFF,
      self.generator,
      self.bound
    )
  }
}
