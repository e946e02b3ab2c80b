/*!
  The instruction set maps each opcode to the `Codec` that decodes and encodes its payload.

  An `InstructionSet` is normally assembled once with a `Builder` and then only read. It can
  still be extended at run time with `register`, which takes a write lock; lookups take a read
  lock, so independent decoders and encoders may share one set across threads.
*/

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use super::{header_word, split_header_word, FieldReader, FieldWriter, Instruction, Opcode, Record, Word};
use crate::error::{Error, Result};

/// Opcode 0 is reserved. It is rejected whether or not a codec was registered for it.
pub const RESERVED_OPCODE: Opcode = 0;

/// Decodes and encodes the instructions of one opcode.
pub trait Codec: Send + Sync {
  /// Decodes an instruction from its payload, that is, every word after the first.
  fn decode(&self, payload: &[Word]) -> Result<Box<dyn Instruction>>;

  /**
    Encodes the whole instruction, first word included, into the front of `out`, and returns
    the number of words written. `out` must hold at least `instruction.word_count()` words.
  */
  fn encode(&self, instruction: &dyn Instruction, out: &mut [Word]) -> Result<usize>;
}

/// The codec for a `Record` type, driven entirely by the record's field list.
pub struct RecordCodec<T> {
  marker: PhantomData<fn() -> T>
}

impl<T: Record> RecordCodec<T> {
  pub fn new() -> RecordCodec<T> {
    RecordCodec { marker: PhantomData }
  }
}

impl<T: Record> Default for RecordCodec<T> {
  fn default() -> RecordCodec<T> {
    RecordCodec::new()
  }
}

impl<T: Record> Codec for RecordCodec<T> {
  fn decode(&self, payload: &[Word]) -> Result<Box<dyn Instruction>> {
    let mut reader = FieldReader::new(T::OPCODE, payload);
    let record = T::read(&mut reader)?;
    reader.finish()?;
    Ok(Box::new(record))
  }

  fn encode(&self, instruction: &dyn Instruction, out: &mut [Word]) -> Result<usize> {
    let record = instruction.downcast_ref::<T>().ok_or(Error::CodecMismatch {
      opcode : instruction.opcode(),
      codec  : T::NAME
    })?;

    let word_count = record.word_count();
    if out.len() < word_count {
      return Err(Error::InvalidInstructionSize(word_count));
    }
    out[0] = header_word(word_count, T::OPCODE)?;

    let mut writer = FieldWriter::new(&mut out[1..word_count]);
    record.write(&mut writer);
    Ok(word_count)
  }
}

/// The opcode to codec table.
pub struct InstructionSet {
  codecs: RwLock<HashMap<Opcode, Arc<dyn Codec>>>
}

impl InstructionSet {
  pub fn builder() -> Builder {
    Builder::new()
  }

  /// An empty instruction set.
  pub fn new() -> InstructionSet {
    Builder::new().build()
  }

  /// An instruction set holding every record in `crate::catalog`.
  pub fn with_catalog() -> InstructionSet {
    Builder::new().with_catalog().build()
  }

  /// Binds `codec` to `opcode`, returning the codec it replaces, if any.
  pub fn register(&self, opcode: Opcode, codec: Arc<dyn Codec>) -> Option<Arc<dyn Codec>> {
    let mut codecs = self.codecs.write().unwrap_or_else(PoisonError::into_inner);
    let previous = codecs.insert(opcode, codec);
    if previous.is_some() {
      log::debug!("replaced codec for opcode {}", opcode);
    }
    previous
  }

  pub fn lookup(&self, opcode: Opcode) -> Option<Arc<dyn Codec>> {
    let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
    codecs.get(&opcode).cloned()
  }

  /// Like `lookup`, but a missing or reserved opcode is an error.
  pub fn codec(&self, opcode: Opcode) -> Result<Arc<dyn Codec>> {
    if opcode == RESERVED_OPCODE {
      return Err(Error::UnacceptableInstruction(opcode));
    }
    self.lookup(opcode).ok_or(Error::UnknownInstruction(opcode))
  }

  pub fn len(&self) -> usize {
    self.codecs.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Every registered opcode, in ascending order.
  pub fn opcodes(&self) -> Vec<Opcode> {
    let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
    let mut opcodes: Vec<Opcode> = codecs.keys().copied().collect();
    opcodes.sort_unstable();
    opcodes
  }

  /**
    Decodes one framed instruction. `frame[0]` is the instruction's first word; the rest is
    handed to the codec registered for its opcode.
  */
  pub fn decode(&self, frame: &[Word]) -> Result<Box<dyn Instruction>> {
    let (first, payload) = frame.split_first().ok_or(Error::InvalidInstructionSize(0))?;
    let (_word_count, opcode) = split_header_word(*first);
    self.codec(opcode)?.decode(payload)
  }

  /// Encodes `instruction` into the front of `out` and returns the number of words written.
  pub fn encode(&self, instruction: &dyn Instruction, out: &mut [Word]) -> Result<usize> {
    self.codec(instruction.opcode())?.encode(instruction, out)
  }
}

impl Default for InstructionSet {
  fn default() -> InstructionSet {
    InstructionSet::new()
  }
}

impl Debug for InstructionSet {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InstructionSet").field("opcodes", &self.opcodes()).finish()
  }
}

/// Collects registrations and produces an `InstructionSet`.
#[derive(Default)]
pub struct Builder {
  codecs: HashMap<Opcode, Arc<dyn Codec>>
}

impl Builder {
  pub fn new() -> Builder {
    Builder::default()
  }

  /// Registers every record in `crate::catalog`.
  pub fn with_catalog(mut self) -> Builder {
    crate::catalog::register(&mut self);
    self
  }

  pub fn register(&mut self, opcode: Opcode, codec: Arc<dyn Codec>) -> &mut Builder {
    self.codecs.insert(opcode, codec);
    self
  }

  /// Registers the generated codec for `T` under `T::OPCODE`.
  pub fn record<T: Record>(&mut self) -> &mut Builder {
    self.register(T::OPCODE, Arc::new(RecordCodec::<T>::new()))
  }

  pub fn build(self) -> InstructionSet {
    InstructionSet {
      codecs: RwLock::new(self.codecs)
    }
  }
}

lazy_static! {
  /// The process-wide instruction set, holding the catalog.
  pub static ref INSTRUCTION_SET: InstructionSet = InstructionSet::with_catalog();
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::thread;

  use crate::bytecode::Id;
  use crate::catalog::{OpCapability, OpName, OpTypeInt, OpTypeVoid, Capability};

  #[test]
  fn unknown_opcode() {
    let set = InstructionSet::new();
    assert!(set.lookup(17).is_none());
    assert!(matches!(set.decode(&[0x0002_0011, 1]), Err(Error::UnknownInstruction(17))));

    let capability = OpCapability { capability: Capability::Shader.into() };
    let mut out = [0; 2];
    assert!(matches!(set.encode(&capability, &mut out), Err(Error::UnknownInstruction(17))));
  }

  #[test]
  fn reserved_opcode_is_unacceptable() {
    let set = InstructionSet::with_catalog();
    assert!(matches!(set.decode(&[0x0001_0000]), Err(Error::UnacceptableInstruction(0))));

    // Even with a codec bound to it.
    set.register(RESERVED_OPCODE, Arc::new(RecordCodec::<OpTypeVoid>::new()));
    assert!(matches!(set.decode(&[0x0002_0000, 1]), Err(Error::UnacceptableInstruction(0))));
  }

  #[test]
  fn dispatch_by_opcode() {
    let set = InstructionSet::with_catalog();
    let decoded = set.decode(&[0x0004_0015, 3, 32, 1]).unwrap();
    assert_eq!(decoded.name(), "OpTypeInt");
    assert_eq!(
      decoded.downcast_ref::<OpTypeInt>(),
      Some(&OpTypeInt { result: Id(3), width: 32, signedness: 1 })
    );

    let mut out = [0; 6];
    assert_eq!(set.encode(&*decoded, &mut out).unwrap(), 4);
    assert_eq!(out, [0x0004_0015, 3, 32, 1, 0, 0]);
  }

  #[test]
  fn codec_rejects_short_payload() {
    let set = InstructionSet::with_catalog();
    assert!(matches!(set.decode(&[0x0003_0015, 3, 32]), Err(Error::MissingInstructionArguments(21))));
  }

  #[test]
  fn encode_needs_room() {
    let set = InstructionSet::with_catalog();
    let name = OpName { target: Id(1), name: String::from("main") };
    let mut out = [0; 3];
    assert!(matches!(set.encode(&name, &mut out), Err(Error::InvalidInstructionSize(4))));
  }

  #[test]
  fn codec_mismatch() {
    let set = InstructionSet::new();
    set.register(17, Arc::new(RecordCodec::<OpTypeVoid>::new()));
    let capability = OpCapability { capability: Capability::Shader.into() };
    let mut out = [0; 2];
    assert!(matches!(
      set.encode(&capability, &mut out),
      Err(Error::CodecMismatch { opcode: 17, codec: "OpTypeVoid" })
    ));
  }

  #[test]
  fn register_replaces() {
    let set = InstructionSet::new();
    assert!(set.register(19, Arc::new(RecordCodec::<OpTypeVoid>::new())).is_none());
    assert!(set.register(19, Arc::new(RecordCodec::<OpTypeVoid>::new())).is_some());
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn builder_collects_records() {
    let mut builder = InstructionSet::builder();
    builder.record::<OpTypeVoid>().record::<OpCapability>();
    let set = builder.build();
    assert_eq!(set.len(), 2);
    assert_eq!(set.opcodes(), vec![17, 19]);
    assert!(set.lookup(19).is_some());
    assert!(set.lookup(17).is_some());
    assert!(set.lookup(21).is_none());
  }

  #[test]
  fn concurrent_lookups_and_registration() {
    let set = Arc::new(InstructionSet::with_catalog());

    let readers: Vec<_> = (0..4)
      .map(|_| {
        let set = Arc::clone(&set);
        thread::spawn(move || {
          for _ in 0..1000 {
            let decoded = set.decode(&[0x0002_0013, 5]).unwrap();
            assert_eq!(decoded.opcode(), 19);
          }
        })
      })
      .collect();

    let writer = {
      let set = Arc::clone(&set);
      thread::spawn(move || {
        for _ in 0..100 {
          set.register(19, Arc::new(RecordCodec::<OpTypeVoid>::new()));
        }
      })
    };

    for reader in readers {
      reader.join().unwrap();
    }
    writer.join().unwrap();
  }

  #[test]
  fn shared_instruction_set_has_catalog() {
    assert!(INSTRUCTION_SET.lookup(14).is_some());
    assert!(!INSTRUCTION_SET.is_empty());
  }
}
