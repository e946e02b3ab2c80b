/*!
  A codec and structural validator for SPIR-V style modules: a fixed header followed by a stream
  of 32 bit words grouped into opcode-tagged instructions.

  ```ignore
  let module = Module::load(&bytes[..])?;
  module.verify()?;
  ```

  `bytecode` holds the wire format: words, the header, instruction framing, field marshalling,
  and the opcode to codec table. `module` builds the whole-module operations on top of it, and
  `layout` checks instruction order. `catalog` declares the instructions the default instruction
  set knows about.
*/

#[macro_use] extern crate lazy_static;

pub mod bytecode;
pub mod catalog;
pub mod error;
pub mod layout;
pub mod module;

pub use error::{Error, LayoutViolation, Result};
pub use layout::Category;
pub use module::{Decoder, Encoder, Module};
