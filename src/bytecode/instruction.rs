use std::any::Any;
use std::fmt::Debug;

use super::{FieldReader, FieldWriter, Opcode};
use crate::error::Result;
use crate::layout::Category;

/**
  A decoded instruction. Instructions are handled as `Box<dyn Instruction>` so that the set of
  instruction types stays open: anything with a registered `Codec` can appear in a module.

  Implement `Record` rather than this trait; every `Record` is an `Instruction`.
*/
pub trait Instruction: Debug + Send + Sync + 'static {
  fn opcode(&self) -> Opcode;

  /// The instruction's name, e.g. `OpMemoryModel`.
  fn name(&self) -> &'static str;

  /// Where the instruction may appear in a module's logical layout.
  fn category(&self) -> Category;

  /// Total number of words in the encoded instruction, including its first word.
  fn word_count(&self) -> usize;

  /// Checks every field that carries a check of its own, then the instruction as a whole.
  fn verify(&self) -> Result<()>;

  fn as_any(&self) -> &dyn Any;

  fn clone_boxed(&self) -> Box<dyn Instruction>;

  fn eq_instruction(&self, other: &dyn Instruction) -> bool;
}

impl dyn Instruction {
  pub fn downcast_ref<T: Instruction>(&self) -> Option<&T> {
    self.as_any().downcast_ref::<T>()
  }

  pub fn is<T: Instruction>(&self) -> bool {
    self.as_any().is::<T>()
  }
}

impl Clone for Box<dyn Instruction> {
  fn clone(&self) -> Box<dyn Instruction> {
    self.clone_boxed()
  }
}

impl PartialEq for dyn Instruction {
  fn eq(&self, other: &dyn Instruction) -> bool {
    self.eq_instruction(other)
  }
}

/**
  An instruction type with a fixed, ordered list of fields. Records are normally declared with
  the `instruction!` macro, which derives every method except `check` from the field list.
*/
pub trait Record: Clone + PartialEq + Debug + Send + Sync + 'static {
  const OPCODE   : Opcode;
  const NAME     : &'static str;
  const CATEGORY : Category;

  /// Reads the fields in declaration order.
  fn read(reader: &mut FieldReader<'_>) -> Result<Self>;

  /// Writes the fields in declaration order.
  fn write(&self, writer: &mut FieldWriter<'_>);

  /// Sum of the fields' word counts.
  fn payload_len(&self) -> usize;

  fn verify_fields(&self) -> Result<()>;

  /// Checks that involve more than one field, or constrain a field beyond its type.
  fn check(&self) -> Result<()> {
    Ok(())
  }
}

impl<T: Record> Instruction for T {
  fn opcode(&self) -> Opcode {
    T::OPCODE
  }

  fn name(&self) -> &'static str {
    T::NAME
  }

  fn category(&self) -> Category {
    T::CATEGORY
  }

  fn word_count(&self) -> usize {
    1 + self.payload_len()
  }

  fn verify(&self) -> Result<()> {
    self.verify_fields()?;
    self.check()
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn clone_boxed(&self) -> Box<dyn Instruction> {
    Box::new(self.clone())
  }

  fn eq_instruction(&self, other: &dyn Instruction) -> bool {
    other.downcast_ref::<T>().map_or(false, |other| self == other)
  }
}

/**
  Declares a record type: a struct with the given fields plus its `Record` implementation.

  ```ignore
  instruction! {
    /// Declares a scalar integer type.
    OpTypeInt = 21 in Declaration {
      result     : Id,
      width      : Word,
      signedness : Word,
    } where check_int_type
  }
  ```

  Fields are read and written in the order listed. The optional `where` clause names a function
  `fn(&Self) -> Result<()>` that runs after the field checks during verification.
*/
#[macro_export]
macro_rules! instruction {
  (@check $record:expr) => { Ok(()) };
  (@check $record:expr, $check:path) => { $check($record) };

  (
    $(#[$meta:meta])*
    $name:ident = $opcode:literal in $category:ident {
      $($field:ident : $ty:ty),* $(,)?
    } $(where $check:path)?
  ) => {
    $(#[$meta])*
    #[derive(Clone, Debug, PartialEq)]
    pub struct $name {
      $(pub $field: $ty,)*
    }

    impl $crate::bytecode::Record for $name {
      const OPCODE   : $crate::bytecode::Opcode = $opcode;
      const NAME     : &'static str = stringify!($name);
      const CATEGORY : $crate::layout::Category = $crate::layout::Category::$category;

      #[allow(unused_variables)]
      fn read(reader: &mut $crate::bytecode::FieldReader<'_>) -> $crate::Result<Self> {
        Ok($name {
          $($field: <$ty as $crate::bytecode::Field>::read(reader)?,)*
        })
      }

      #[allow(unused_variables)]
      fn write(&self, writer: &mut $crate::bytecode::FieldWriter<'_>) {
        $($crate::bytecode::Field::write(&self.$field, writer);)*
      }

      fn payload_len(&self) -> usize {
        0 $(+ $crate::bytecode::Field::word_count(&self.$field))*
      }

      fn verify_fields(&self) -> $crate::Result<()> {
        $(
          $crate::bytecode::Field::verify(&self.$field).map_err(|reason| {
            $crate::Error::FieldVerificationFailed {
              instruction : stringify!($name),
              field       : Some(stringify!($field)),
              reason
            }
          })?;
        )*
        Ok(())
      }

      fn check(&self) -> $crate::Result<()> {
        $crate::instruction!(@check self $(, $check)?)
      }
    }
  };
}
