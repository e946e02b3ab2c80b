/*!
  A representative instruction catalog: enough records to express a complete module in every
  section of the logical layout. Each entry becomes a struct, its `Record` implementation, and a
  line in `register`, which is what `Builder::with_catalog` calls.

  Records are declared in the `instruction!` notation:

  ```ignore
  OpTypeVector = 23 in Declaration {
    result          : Id,
    component_type  : Id,
    component_count : Word,
  } where check_vector_type
  ```

  Fields that are optional or variadic come last.
*/

mod operands;

use crate::bytecode::{Builder, Enumerant, Id, Word};
use crate::error::{Error, Result};

pub use operands::{
  AddressingModel,
  Capability,
  Decoration,
  ExecutionMode,
  ExecutionModel,
  FunctionControl,
  LoopControl,
  MemoryModel,
  SelectionControl,
  SourceLanguage,
  StorageClass
};

/// Declares each record with `instruction!` and collects their names for `register`.
macro_rules! catalog {
  (@collect [$($names:ident)*]) => {
    /// Registers every record of the catalog with `builder`.
    pub(crate) fn register(builder: &mut Builder) {
      $(builder.record::<$names>();)*
    }
  };

  (
    @collect [$($names:ident)*]
    $(#[$meta:meta])*
    $name:ident = $opcode:literal in $category:ident { $($fields:tt)* } where $check:ident
    $($rest:tt)*
  ) => {
    crate::instruction! {
      $(#[$meta])*
      $name = $opcode in $category { $($fields)* } where $check
    }
    catalog!(@collect [$($names)* $name] $($rest)*);
  };

  (
    @collect [$($names:ident)*]
    $(#[$meta:meta])*
    $name:ident = $opcode:literal in $category:ident { $($fields:tt)* }
    $($rest:tt)*
  ) => {
    crate::instruction! {
      $(#[$meta])*
      $name = $opcode in $category { $($fields)* }
    }
    catalog!(@collect [$($names)* $name] $($rest)*);
  };

  ($($definitions:tt)*) => {
    catalog!(@collect [] $($definitions)*);
  };
}

fn field_check(instruction: &'static str, field: &'static str, reason: String) -> Error {
  Error::FieldVerificationFailed {
    instruction,
    field: Some(field),
    reason
  }
}

fn check_int_type(record: &OpTypeInt) -> Result<()> {
  match record.signedness {
    0 | 1 => Ok(()),
    other => Err(field_check("OpTypeInt", "signedness", format!("{} is neither 0 nor 1", other)))
  }
}

fn check_float_type(record: &OpTypeFloat) -> Result<()> {
  match record.width {
    16 | 32 | 64 => Ok(()),
    other => Err(field_check("OpTypeFloat", "width", format!("{} bits is not a float width", other)))
  }
}

fn check_vector_type(record: &OpTypeVector) -> Result<()> {
  match record.component_count {
    0 | 1 => Err(field_check(
      "OpTypeVector",
      "component_count",
      format!("a vector needs at least 2 components, not {}", record.component_count)
    )),
    _ => Ok(())
  }
}

fn check_matrix_type(record: &OpTypeMatrix) -> Result<()> {
  match record.column_count {
    0 | 1 => Err(field_check(
      "OpTypeMatrix",
      "column_count",
      format!("a matrix needs at least 2 columns, not {}", record.column_count)
    )),
    _ => Ok(())
  }
}

// Branch weights come as a pair or not at all.
fn check_branch_weights(record: &OpBranchConditional) -> Result<()> {
  match record.weights.len() {
    0 | 2 => Ok(()),
    count => Err(field_check(
      "OpBranchConditional",
      "weights",
      format!("expected 0 or 2 branch weights, found {}", count)
    ))
  }
}

catalog! {
  OpUndef = 1 in Declaration {
    result_type : Id,
    result      : Id,
  }

  /// Continues the source text of the preceding `OpSource`.
  OpSourceContinued = 2 in Debug {
    source : String,
  }

  OpSource = 3 in Debug {
    language : Enumerant<SourceLanguage>,
    version  : Word,
    file     : Option<Id>,
    source   : Option<String>,
  }

  OpSourceExtension = 4 in Debug {
    extension : String,
  }

  OpName = 5 in Debug {
    target : Id,
    name   : String,
  }

  OpMemberName = 6 in Debug {
    target : Id,
    member : Word,
    name   : String,
  }

  OpString = 7 in Debug {
    result : Id,
    string : String,
  }

  OpLine = 8 in Debug {
    file   : Id,
    line   : Word,
    column : Word,
  }

  OpExtension = 10 in Preamble {
    name : String,
  }

  OpExtInstImport = 11 in Preamble {
    result : Id,
    name   : String,
  }

  OpExtInst = 12 in Body {
    result_type : Id,
    result      : Id,
    set         : Id,
    instruction : Word,
    operands    : Vec<Id>,
  }

  OpMemoryModel = 14 in MemoryModel {
    addressing_model : Enumerant<AddressingModel>,
    memory_model     : Enumerant<MemoryModel>,
  }

  OpEntryPoint = 15 in EntryPoint {
    execution_model : Enumerant<ExecutionModel>,
    entry_point     : Id,
    name            : String,
    interface       : Vec<Id>,
  }

  OpExecutionMode = 16 in ExecutionMode {
    entry_point : Id,
    mode        : Enumerant<ExecutionMode>,
    literals    : Vec<Word>,
  }

  OpCapability = 17 in Preamble {
    capability : Enumerant<Capability>,
  }

  OpTypeVoid = 19 in Declaration {
    result : Id,
  }

  OpTypeBool = 20 in Declaration {
    result : Id,
  }

  OpTypeInt = 21 in Declaration {
    result     : Id,
    width      : Word,
    signedness : Word,
  } where check_int_type

  OpTypeFloat = 22 in Declaration {
    result : Id,
    width  : Word,
  } where check_float_type

  OpTypeVector = 23 in Declaration {
    result          : Id,
    component_type  : Id,
    component_count : Word,
  } where check_vector_type

  OpTypeMatrix = 24 in Declaration {
    result       : Id,
    column_type  : Id,
    column_count : Word,
  } where check_matrix_type

  OpTypeArray = 28 in Declaration {
    result       : Id,
    element_type : Id,
    length       : Id,
  }

  OpTypeRuntimeArray = 29 in Declaration {
    result       : Id,
    element_type : Id,
  }

  OpTypeStruct = 30 in Declaration {
    result  : Id,
    members : Vec<Id>,
  }

  OpTypePointer = 32 in Declaration {
    result        : Id,
    storage_class : Enumerant<StorageClass>,
    pointee_type  : Id,
  }

  OpTypeFunction = 33 in Declaration {
    result          : Id,
    return_type     : Id,
    parameter_types : Vec<Id>,
  }

  OpConstantTrue = 41 in Declaration {
    result_type : Id,
    result      : Id,
  }

  OpConstantFalse = 42 in Declaration {
    result_type : Id,
    result      : Id,
  }

  /// A scalar constant. Values wider than 32 bits take several words, low-order word first.
  OpConstant = 43 in Declaration {
    result_type : Id,
    result      : Id,
    value       : Vec<Word>,
  }

  OpConstantComposite = 44 in Declaration {
    result_type  : Id,
    result       : Id,
    constituents : Vec<Id>,
  }

  OpFunction = 54 in Function {
    result_type   : Id,
    result        : Id,
    control       : FunctionControl,
    function_type : Id,
  }

  OpFunctionParameter = 55 in FunctionParameter {
    result_type : Id,
    result      : Id,
  }

  OpFunctionEnd = 56 in FunctionEnd {}

  OpFunctionCall = 57 in Body {
    result_type : Id,
    result      : Id,
    function    : Id,
    arguments   : Vec<Id>,
  }

  /// Global variables are declarations; function-local ones sit at the start of the first block.
  OpVariable = 59 in Declaration {
    result_type   : Id,
    result        : Id,
    storage_class : Enumerant<StorageClass>,
    initializer   : Option<Id>,
  }

  OpLoad = 61 in Body {
    result_type   : Id,
    result        : Id,
    pointer       : Id,
    memory_access : Option<Word>,
  }

  OpStore = 62 in Body {
    pointer       : Id,
    object        : Id,
    memory_access : Option<Word>,
  }

  OpAccessChain = 65 in Body {
    result_type : Id,
    result      : Id,
    base        : Id,
    indexes     : Vec<Id>,
  }

  OpDecorate = 71 in Annotation {
    target     : Id,
    decoration : Enumerant<Decoration>,
    literals   : Vec<Word>,
  }

  OpMemberDecorate = 72 in Annotation {
    structure_type : Id,
    member         : Word,
    decoration     : Enumerant<Decoration>,
    literals       : Vec<Word>,
  }

  OpDecorationGroup = 73 in Annotation {
    result : Id,
  }

  OpCompositeExtract = 81 in Body {
    result_type : Id,
    result      : Id,
    composite   : Id,
    indexes     : Vec<Word>,
  }

  OpIAdd = 128 in Body {
    result_type : Id,
    result      : Id,
    left        : Id,
    right       : Id,
  }

  OpFAdd = 129 in Body {
    result_type : Id,
    result      : Id,
    left        : Id,
    right       : Id,
  }

  OpISub = 130 in Body {
    result_type : Id,
    result      : Id,
    left        : Id,
    right       : Id,
  }

  OpFSub = 131 in Body {
    result_type : Id,
    result      : Id,
    left        : Id,
    right       : Id,
  }

  OpIMul = 132 in Body {
    result_type : Id,
    result      : Id,
    left        : Id,
    right       : Id,
  }

  OpFMul = 133 in Body {
    result_type : Id,
    result      : Id,
    left        : Id,
    right       : Id,
  }

  OpIEqual = 170 in Body {
    result_type : Id,
    result      : Id,
    left        : Id,
    right       : Id,
  }

  /// Each incoming pair is a value and the label of the block it comes from.
  OpPhi = 245 in Body {
    result_type : Id,
    result      : Id,
    incoming    : Vec<(Id, Id)>,
  }

  OpLoopMerge = 246 in Body {
    merge_block     : Id,
    continue_target : Id,
    control         : LoopControl,
  }

  OpSelectionMerge = 247 in Body {
    merge_block : Id,
    control     : SelectionControl,
  }

  OpLabel = 248 in Label {
    result : Id,
  }

  OpBranch = 249 in Terminator {
    target : Id,
  }

  OpBranchConditional = 250 in Terminator {
    condition   : Id,
    true_label  : Id,
    false_label : Id,
    weights     : Vec<Word>,
  } where check_branch_weights

  OpKill = 252 in Terminator {}

  OpReturn = 253 in Terminator {}

  OpReturnValue = 254 in Terminator {
    value : Id,
  }

  OpUnreachable = 255 in Terminator {}

  OpNoLine = 317 in Debug {}

  OpModuleProcessed = 330 in Debug {
    process : String,
  }
}
