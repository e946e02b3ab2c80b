/*!

This module checks the order of a module's instructions against the logical layout.

Each instruction belongs to a `Category`, and the module's instructions, read as a sequence of
categories, must belong to the language given by the following EBNF:
    ```
    <module>        ::=  <preamble>* MemoryModel <entry_point>+ <debug_info>* <declaration>*
                         <function>*
    <preamble>      ::=  Preamble | Debug
    <entry_point>   ::=  EntryPoint ExecutionMode+
    <debug_info>    ::=  Debug | Annotation
    <declaration>   ::=  Declaration | Debug
    <function>      ::=  Function FunctionParameter* <block>+ FunctionEnd
    <block>         ::=  Label <body>* Terminator
    <body>          ::=  Body | Declaration | Debug
    ```

Declarations may appear in any order among themselves. The grammar is matched with parser
combinators working directly on the category sequence. The memory model is counted before
matching, so that a missing or repeated memory model gets its own error.

*/

use nom::{
  combinator::cut,
  error::ErrorKind,
  multi::{many0_count, many1_count},
  sequence::{pair, tuple},
  Err as NomErr,
  IResult
};
use strum_macros::{Display as StrumDisplay, EnumIter, IntoStaticStr};

use crate::error::LayoutViolation;

/// The token alphabet of the logical layout.
#[derive(StrumDisplay, IntoStaticStr, EnumIter, Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Category {
  /// Capabilities, extensions, and extended instruction set imports.
  Preamble,
  MemoryModel,
  EntryPoint,
  ExecutionMode,
  /// Source, name, string, and line information. Carries no semantics and is removed by
  /// `Module::strip`.
  Debug,
  /// Decorations.
  Annotation,
  /// Types, constants, and global variables.
  Declaration,
  Function,
  FunctionParameter,
  FunctionEnd,
  Label,
  /// Branches and returns, which end a block.
  Terminator,
  /// Everything else that lives inside a block.
  Body
}

impl Category {
  /// Whether an instruction of this category may appear between a label and its terminator.
  pub fn is_block_body(self) -> bool {
    match self {
      | Category::Body
      | Category::Declaration
      | Category::Debug => true,
      _                 => false
    }
  }
}

type Tokens<'a> = &'a [Category];
type TokenResult<'a, O> = IResult<Tokens<'a>, O, (Tokens<'a>, ErrorKind)>;

/// Matches a single token accepted by `accept`.
fn token<'a, P>(accept: P) -> impl Fn(Tokens<'a>) -> TokenResult<'a, Category>
  where P: Fn(Category) -> bool
{
  move |input: Tokens<'a>| {
    match input.split_first() {
      Some((first, rest)) if accept(*first) => Ok((rest, *first)),
      _ => Err(NomErr::Error((input, ErrorKind::Verify)))
    }
  }
}

fn one<'a>(expected: Category) -> impl Fn(Tokens<'a>) -> TokenResult<'a, Category> {
  token(move |category| category == expected)
}

fn preamble(input: Tokens) -> TokenResult<usize> {
  many0_count(token(|c| c == Category::Preamble || c == Category::Debug))(input)
}

fn entry_points(input: Tokens) -> TokenResult<usize> {
  many1_count(pair(one(Category::EntryPoint), many1_count(one(Category::ExecutionMode))))(input)
}

fn debug_info(input: Tokens) -> TokenResult<usize> {
  many0_count(token(|c| c == Category::Debug || c == Category::Annotation))(input)
}

fn declarations(input: Tokens) -> TokenResult<usize> {
  many0_count(token(|c| c == Category::Declaration || c == Category::Debug))(input)
}

/// A block is committed to once its label is seen, so errors point at the offending token.
fn block(input: Tokens) -> TokenResult<()> {
  let (rest, _) = pair(
    one(Category::Label),
    cut(pair(
      many0_count(token(Category::is_block_body)),
      one(Category::Terminator)
    ))
  )(input)?;
  Ok((rest, ()))
}

/// Likewise, once a `Function` token is seen the definition must be complete.
fn function(input: Tokens) -> TokenResult<()> {
  let (rest, _) = pair(
    one(Category::Function),
    cut(tuple((
      many0_count(one(Category::FunctionParameter)),
      block,
      many0_count(block),
      one(Category::FunctionEnd)
    )))
  )(input)?;
  Ok((rest, ()))
}

fn functions(input: Tokens) -> TokenResult<usize> {
  many0_count(function)(input)
}

/// Checks a module's category sequence against the logical layout.
pub fn validate(tokens: &[Category]) -> Result<(), LayoutViolation> {
  let position = |rest: Tokens| tokens.len() - rest.len();

  let mut memory_models = tokens
    .iter()
    .enumerate()
    .filter(|(_, category)| **category == Category::MemoryModel)
    .map(|(i, _)| i);
  match (memory_models.next(), memory_models.next()) {
    (None, _) => {
      let rest = preamble(tokens).map_or(tokens, |(rest, _)| rest);
      return Err(LayoutViolation::MissingMemoryModel(position(rest)));
    }
    (Some(_), Some(second)) => {
      return Err(LayoutViolation::TooManyMemoryModels {
        position : second,
        count    : 2 + memory_models.count()
      });
    }
    (Some(_), None) => {}
  }
  let misplaced = |rest: Tokens| match rest.first() {
    Some(category) => LayoutViolation::MisplacedInstruction {
      position: position(rest),
      category: *category
    },
    None => LayoutViolation::MissingEntryPoint(position(rest))
  };

  let rest = match preamble(tokens) {
    Ok((rest, _)) => rest,
    Err(_)        => tokens
  };

  let rest = match one(Category::MemoryModel)(rest) {
    Ok((rest, _)) => rest,
    Err(_)        => return Err(misplaced(rest))
  };

  let rest = match entry_points(rest) {
    Ok((rest, _)) => rest,
    Err(_) => {
      return Err(match rest.first() {
        Some(Category::EntryPoint) => LayoutViolation::MissingExecutionMode(position(rest)),
        _                          => LayoutViolation::MissingEntryPoint(position(rest))
      });
    }
  };
  if rest.first() == Some(&Category::EntryPoint) {
    return Err(LayoutViolation::MissingExecutionMode(position(rest)));
  }

  let rest = match debug_info(rest) {
    Ok((rest, _)) => rest,
    Err(_)        => rest
  };
  let rest = match declarations(rest) {
    Ok((rest, _)) => rest,
    Err(_)        => rest
  };

  let rest = match functions(rest) {
    Ok((rest, _)) => rest,
    Err(NomErr::Failure((at, _))) => {
      return Err(LayoutViolation::MalformedFunction {
        position : position(at),
        found    : at.first().copied()
      });
    }
    Err(_) => rest
  };

  match rest.is_empty() {
    true  => Ok(()),
    false => Err(misplaced(rest))
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use Category::*;

  /// A minimal module with one function of one block.
  fn minimal() -> Vec<Category> {
    vec![
      Preamble, MemoryModel, EntryPoint, ExecutionMode, Debug, Annotation,
      Declaration, Declaration, Declaration,
      Function, Label, Body, Terminator, FunctionEnd
    ]
  }

  #[test]
  fn only_block_contents_are_block_body() {
    use strum::IntoEnumIterator;
    let body: Vec<Category> = Category::iter().filter(|c| c.is_block_body()).collect();
    assert_eq!(body, vec![Debug, Declaration, Body]);
  }

  #[test]
  fn accepts_minimal_module() {
    assert_eq!(validate(&minimal()), Ok(()));
  }

  #[test]
  fn accepts_module_without_functions() {
    assert_eq!(validate(&[MemoryModel, EntryPoint, ExecutionMode]), Ok(()));
    assert_eq!(
      validate(&[Debug, Preamble, Preamble, MemoryModel, EntryPoint, ExecutionMode, ExecutionMode,
        EntryPoint, ExecutionMode, Annotation, Debug, Declaration, Debug, Declaration]),
      Ok(())
    );
  }

  #[test]
  fn accepts_functions_with_parameters_and_blocks() {
    let mut tokens = minimal();
    tokens.extend_from_slice(&[
      Function, FunctionParameter, FunctionParameter,
      Label, Declaration, Debug, Body, Body, Terminator,
      Label, Terminator,
      FunctionEnd
    ]);
    assert_eq!(validate(&tokens), Ok(()));
  }

  #[test]
  fn memory_model_cardinality() {
    assert_eq!(
      validate(&[Preamble, Debug, EntryPoint, ExecutionMode]),
      Err(LayoutViolation::MissingMemoryModel(2))
    );
    assert_eq!(validate(&[]), Err(LayoutViolation::MissingMemoryModel(0)));

    assert_eq!(
      validate(&[MemoryModel, MemoryModel, EntryPoint, ExecutionMode]),
      Err(LayoutViolation::TooManyMemoryModels { position: 1, count: 2 })
    );
    assert_eq!(
      validate(&[Preamble, MemoryModel, EntryPoint, ExecutionMode, MemoryModel, MemoryModel]),
      Err(LayoutViolation::TooManyMemoryModels { position: 4, count: 3 })
    );
  }

  #[test]
  fn memory_model_out_of_place() {
    assert_eq!(
      validate(&[Annotation, MemoryModel, EntryPoint, ExecutionMode]),
      Err(LayoutViolation::MisplacedInstruction { position: 0, category: Annotation })
    );
  }

  #[test]
  fn entry_points_need_execution_modes() {
    assert_eq!(validate(&[MemoryModel]), Err(LayoutViolation::MissingEntryPoint(1)));
    assert_eq!(
      validate(&[MemoryModel, Declaration]),
      Err(LayoutViolation::MissingEntryPoint(1))
    );
    assert_eq!(
      validate(&[MemoryModel, EntryPoint, Declaration]),
      Err(LayoutViolation::MissingExecutionMode(1))
    );
    assert_eq!(
      validate(&[MemoryModel, EntryPoint, ExecutionMode, EntryPoint, Debug]),
      Err(LayoutViolation::MissingExecutionMode(3))
    );
  }

  #[test]
  fn unterminated_function() {
    let mut tokens = minimal();
    tokens.pop();
    assert_eq!(
      validate(&tokens),
      Err(LayoutViolation::MalformedFunction { position: 13, found: None })
    );
  }

  #[test]
  fn block_without_terminator() {
    let mut tokens = minimal();
    tokens.truncate(12);
    tokens.extend_from_slice(&[Label, Terminator, FunctionEnd]);
    assert_eq!(
      validate(&tokens),
      Err(LayoutViolation::MalformedFunction { position: 12, found: Some(Label) })
    );
  }

  #[test]
  fn function_without_blocks() {
    let mut tokens = minimal();
    tokens.extend_from_slice(&[Function, FunctionParameter, FunctionEnd]);
    assert_eq!(
      validate(&tokens),
      Err(LayoutViolation::MalformedFunction { position: 16, found: Some(FunctionEnd) })
    );
  }

  #[test]
  fn annotation_inside_block() {
    let mut tokens = minimal();
    tokens.insert(11, Annotation);
    assert_eq!(
      validate(&tokens),
      Err(LayoutViolation::MalformedFunction { position: 11, found: Some(Annotation) })
    );
  }

  #[test]
  fn annotation_after_declarations() {
    let mut tokens = minimal();
    tokens.insert(8, Annotation);
    assert_eq!(
      validate(&tokens),
      Err(LayoutViolation::MisplacedInstruction { position: 8, category: Annotation })
    );
  }

  #[test]
  fn stray_instruction_after_functions() {
    let mut tokens = minimal();
    tokens.push(Body);
    assert_eq!(
      validate(&tokens),
      Err(LayoutViolation::MisplacedInstruction { position: 14, category: Body })
    );
  }
}
