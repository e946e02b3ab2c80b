/*!
  Operand fields. Every record is an ordered list of fields, and every field type implements
  `Field`, which knows how many words a value occupies, how to read it from the front of the
  remaining payload, and how to write it back:

    Word, Id, Enumerant   exactly one word
    String                a packed string, `packed::encoded_len` words
    Option<T>             present only if payload words remain
    Vec<T>                as many `T` as the remaining payload holds
    (A, B)                an `A` followed by a `B`

  Because `Option` and `Vec` consume whatever is left, they belong at the end of a record.
*/

use std::fmt::{self, Debug, Display, Formatter};
use std::marker::PhantomData;

use num_enum::TryFromPrimitive;

use super::{packed, Opcode, Word};
use crate::error::{Error, Result};

/// A cursor over an instruction's payload.
pub struct FieldReader<'a> {
  opcode   : Opcode,
  words    : &'a [Word],
  position : usize
}

impl<'a> FieldReader<'a> {
  pub fn new(opcode: Opcode, words: &'a [Word]) -> FieldReader<'a> {
    FieldReader {
      opcode,
      words,
      position: 0
    }
  }

  pub fn opcode(&self) -> Opcode {
    self.opcode
  }

  pub fn remaining(&self) -> usize {
    self.words.len() - self.position
  }

  pub fn is_empty(&self) -> bool {
    self.remaining() == 0
  }

  pub fn read_word(&mut self) -> Result<Word> {
    match self.words.get(self.position) {
      Some(word) => {
        self.position += 1;
        Ok(*word)
      }
      None => Err(Error::MissingInstructionArguments(self.opcode))
    }
  }

  pub fn read_string(&mut self) -> Result<String> {
    if self.is_empty() {
      return Err(Error::MissingInstructionArguments(self.opcode));
    }
    let (bytes, used) = packed::decode(&self.words[self.position..])
      .ok_or(Error::InvalidString(self.opcode))?;
    let string = String::from_utf8(bytes).map_err(|_| Error::InvalidString(self.opcode))?;
    self.position += used;
    Ok(string)
  }

  /// Fails if any payload words were left unread.
  pub fn finish(self) -> Result<()> {
    match self.remaining() {
      0 => Ok(()),
      count => Err(Error::ExcessInstructionArguments { opcode: self.opcode, count })
    }
  }
}

/**
  A cursor over the payload part of an output buffer. The buffer must already be sized to the
  record's payload length; writing past it is a bug in the record's `payload_len`.
*/
pub struct FieldWriter<'a> {
  words    : &'a mut [Word],
  position : usize
}

impl<'a> FieldWriter<'a> {
  pub fn new(words: &'a mut [Word]) -> FieldWriter<'a> {
    FieldWriter {
      words,
      position: 0
    }
  }

  pub fn position(&self) -> usize {
    self.position
  }

  pub fn write_word(&mut self, word: Word) {
    self.words[self.position] = word;
    self.position += 1;
  }

  pub fn write_string(&mut self, s: &str) {
    self.position += packed::encode(s, &mut self.words[self.position..]);
  }
}

pub trait Field: Sized {
  /// Number of words this value occupies.
  fn word_count(&self) -> usize;

  fn read(reader: &mut FieldReader<'_>) -> Result<Self>;

  fn write(&self, writer: &mut FieldWriter<'_>);

  /// The field's own consistency check. The error is a reason; the caller names the field.
  fn verify(&self) -> std::result::Result<(), String> {
    Ok(())
  }
}

impl Field for Word {
  fn word_count(&self) -> usize {
    1
  }

  fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
    reader.read_word()
  }

  fn write(&self, writer: &mut FieldWriter<'_>) {
    writer.write_word(*self);
  }
}

impl Field for String {
  fn word_count(&self) -> usize {
    packed::encoded_len(self)
  }

  fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
    reader.read_string()
  }

  fn write(&self, writer: &mut FieldWriter<'_>) {
    writer.write_string(self);
  }

  fn verify(&self) -> std::result::Result<(), String> {
    match self.find('\0') {
      Some(index) => Err(format!("string contains a NUL byte at {}", index)),
      None        => Ok(())
    }
  }
}

impl<T: Field> Field for Option<T> {
  fn word_count(&self) -> usize {
    self.as_ref().map_or(0, Field::word_count)
  }

  fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
    match reader.is_empty() {
      true  => Ok(None),
      false => T::read(reader).map(Some)
    }
  }

  fn write(&self, writer: &mut FieldWriter<'_>) {
    if let Some(value) = self {
      value.write(writer);
    }
  }

  fn verify(&self) -> std::result::Result<(), String> {
    self.as_ref().map_or(Ok(()), Field::verify)
  }
}

impl<T: Field> Field for Vec<T> {
  fn word_count(&self) -> usize {
    self.iter().map(Field::word_count).sum()
  }

  fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
    let mut values = Vec::new();
    while !reader.is_empty() {
      values.push(T::read(reader)?);
    }
    Ok(values)
  }

  fn write(&self, writer: &mut FieldWriter<'_>) {
    for value in self {
      value.write(writer);
    }
  }

  fn verify(&self) -> std::result::Result<(), String> {
    for (i, value) in self.iter().enumerate() {
      value.verify().map_err(|reason| format!("element {}: {}", i, reason))?;
    }
    Ok(())
  }
}

/// A pair of operands that always appear together, e.g. the (value, parent) pairs of a phi.
impl<A: Field, B: Field> Field for (A, B) {
  fn word_count(&self) -> usize {
    self.0.word_count() + self.1.word_count()
  }

  fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
    let first = A::read(reader)?;
    Ok((first, B::read(reader)?))
  }

  fn write(&self, writer: &mut FieldWriter<'_>) {
    self.0.write(writer);
    self.1.write(writer);
  }

  fn verify(&self) -> std::result::Result<(), String> {
    self.0.verify()?;
    self.1.verify()
  }
}

/// A result id or a reference to one. Ids are never zero.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Id(pub Word);

impl Display for Id {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "%{}", self.0)
  }
}

impl Field for Id {
  fn word_count(&self) -> usize {
    1
  }

  fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
    reader.read_word().map(Id)
  }

  fn write(&self, writer: &mut FieldWriter<'_>) {
    writer.write_word(self.0);
  }

  fn verify(&self) -> std::result::Result<(), String> {
    match self.0 {
      0 => Err(String::from("id 0 is not a valid id")),
      _ => Ok(())
    }
  }
}

/**
  An enumerated operand. The raw word is kept as decoded so that a module carrying a value
  outside of `E` still round-trips; `verify` is what rejects it.
*/
pub struct Enumerant<E> {
  raw    : Word,
  marker : PhantomData<E>
}

impl<E> Enumerant<E> {
  pub fn from_raw(raw: Word) -> Enumerant<E> {
    Enumerant {
      raw,
      marker: PhantomData
    }
  }

  pub fn raw(&self) -> Word {
    self.raw
  }
}

impl<E: TryFromPrimitive<Primitive = Word>> Enumerant<E> {
  /// The enumerant, if `raw` names one.
  pub fn get(&self) -> Option<E> {
    E::try_from_primitive(self.raw).ok()
  }
}

impl<E: Into<Word>> From<E> for Enumerant<E> {
  fn from(value: E) -> Enumerant<E> {
    Enumerant::from_raw(value.into())
  }
}

impl<E> Clone for Enumerant<E> {
  fn clone(&self) -> Enumerant<E> {
    Enumerant::from_raw(self.raw)
  }
}

impl<E> Copy for Enumerant<E> {}

impl<E> PartialEq for Enumerant<E> {
  fn eq(&self, other: &Enumerant<E>) -> bool {
    self.raw == other.raw
  }
}

impl<E> Eq for Enumerant<E> {}

impl<E: TryFromPrimitive<Primitive = Word> + Debug> Debug for Enumerant<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.get() {
      Some(value) => write!(f, "{:?}", value),
      None        => write!(f, "{}({})", E::NAME, self.raw)
    }
  }
}

impl<E: TryFromPrimitive<Primitive = Word> + Display> Display for Enumerant<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.get() {
      Some(value) => write!(f, "{}", value),
      None        => write!(f, "{}", self.raw)
    }
  }
}

impl<E: TryFromPrimitive<Primitive = Word>> Field for Enumerant<E> {
  fn word_count(&self) -> usize {
    1
  }

  fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
    reader.read_word().map(Enumerant::from_raw)
  }

  fn write(&self, writer: &mut FieldWriter<'_>) {
    writer.write_word(self.raw);
  }

  fn verify(&self) -> std::result::Result<(), String> {
    match self.get() {
      Some(_) => Ok(()),
      None    => Err(format!("{} is not a valid {}", self.raw, E::NAME))
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::StorageClass;

  #[test]
  fn scalars_and_strings_in_order() {
    // OpName-like payload: an id followed by "main".
    let payload = [3, 0x6E69_616D, 0];
    let mut reader = FieldReader::new(5, &payload);
    assert_eq!(Id::read(&mut reader).unwrap(), Id(3));
    assert_eq!(String::read(&mut reader).unwrap(), "main");
    assert!(reader.finish().is_ok());
  }

  #[test]
  fn missing_arguments() {
    let mut reader = FieldReader::new(21, &[1]);
    assert_eq!(Word::read(&mut reader).unwrap(), 1);
    assert!(matches!(Word::read(&mut reader), Err(Error::MissingInstructionArguments(21))));
    assert!(matches!(String::read(&mut reader), Err(Error::MissingInstructionArguments(21))));
  }

  #[test]
  fn unterminated_string() {
    let mut reader = FieldReader::new(5, &[0x6E69_616D]);
    assert!(matches!(String::read(&mut reader), Err(Error::InvalidString(5))));
  }

  #[test]
  fn optional_trailing_field() {
    let mut reader = FieldReader::new(59, &[]);
    assert_eq!(Option::<Id>::read(&mut reader).unwrap(), None);

    let mut reader = FieldReader::new(59, &[9]);
    assert_eq!(Option::<Id>::read(&mut reader).unwrap(), Some(Id(9)));
    assert!(reader.is_empty());
  }

  #[test]
  fn list_consumes_remainder() {
    let mut reader = FieldReader::new(30, &[4, 5, 6]);
    assert_eq!(Vec::<Id>::read(&mut reader).unwrap(), vec![Id(4), Id(5), Id(6)]);
    assert!(reader.finish().is_ok());

    let mut reader = FieldReader::new(30, &[]);
    assert!(Vec::<Id>::read(&mut reader).unwrap().is_empty());
  }

  #[test]
  fn pairs_must_be_complete() {
    let mut reader = FieldReader::new(245, &[10, 11, 12]);
    assert!(matches!(
      Vec::<(Id, Id)>::read(&mut reader),
      Err(Error::MissingInstructionArguments(245))
    ));

    let mut reader = FieldReader::new(245, &[10, 11, 12, 13]);
    let pairs = Vec::<(Id, Id)>::read(&mut reader).unwrap();
    assert_eq!(pairs, vec![(Id(10), Id(11)), (Id(12), Id(13))]);
    assert_eq!(pairs.word_count(), 4);
    assert!(vec![(Id(1), Id(0))].verify().is_err());
  }

  #[test]
  fn excess_arguments() {
    let mut reader = FieldReader::new(19, &[1, 2, 3]);
    Id::read(&mut reader).unwrap();
    assert!(matches!(
      reader.finish(),
      Err(Error::ExcessInstructionArguments { opcode: 19, count: 2 })
    ));
  }

  #[test]
  fn writes_in_order() {
    let mut out = [0; 4];
    let mut writer = FieldWriter::new(&mut out);
    Id(7).write(&mut writer);
    String::from("abcd").write(&mut writer);
    Some(Id(2)).write(&mut writer);
    assert_eq!(writer.position(), 4);
    assert_eq!(out, [7, 0x6463_6261, 0, 2]);
  }

  #[test]
  fn field_checks() {
    assert!(Id(0).verify().is_err());
    assert!(Id(1).verify().is_ok());
    assert!(String::from("a\0b").verify().is_err());
    assert!(vec![Id(1), Id(0)].verify().unwrap_err().starts_with("element 1"));
    assert!(Some(Id(0)).verify().is_err());
    assert!(None::<Id>.verify().is_ok());
  }

  #[test]
  fn enumerants_keep_unknown_values() {
    let known: Enumerant<StorageClass> = StorageClass::Function.into();
    assert_eq!(known.raw(), 7);
    assert_eq!(known.get(), Some(StorageClass::Function));
    assert!(known.verify().is_ok());
    assert_eq!(format!("{}", known), "Function");

    let unknown = Enumerant::<StorageClass>::from_raw(9000);
    assert_eq!(unknown.get(), None);
    assert_eq!(unknown.verify().unwrap_err(), "9000 is not a valid StorageClass");
    assert_eq!(format!("{}", unknown), "9000");
  }
}
