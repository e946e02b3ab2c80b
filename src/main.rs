/*!
  `spirv-dump` loads a module, verifies it, and prints its header and instructions as tables.
  With `--output` the (possibly stripped) module is written back out.

  Set `RUST_LOG=debug` to see what the library is doing.
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use prettytable::{format as TableFormat, Table};
use strum::IntoEnumIterator;

use spirv_codec::bytecode::{Instruction, Word, INSTRUCTION_SET};
use spirv_codec::{Category, Decoder, Module};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// The module to dump.
  input: PathBuf,

  /// Remove debug instructions before printing and writing.
  #[arg(short, long)]
  strip: bool,

  /// Skip verification.
  #[arg(long)]
  no_verify: bool,

  /// Show the encoded words of every instruction.
  #[arg(short, long)]
  words: bool,

  /// Write the module back out to this path.
  #[arg(short, long)]
  output: Option<PathBuf>,
}

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

/// Loads `path` instruction by instruction so that a failure can be placed in the stream.
fn load(path: &Path) -> Result<Module> {
  let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
  let mut decoder = Decoder::new(&INSTRUCTION_SET, BufReader::new(file));

  let header = decoder.decode_header().context("cannot decode the module header")?;
  let mut module = Module::with_header(header);

  loop {
    let decoded = decoder.decode_instruction();
    let instruction = decoded.with_context(|| {
      format!(
        "cannot decode instruction {} at byte offset {:#x}",
        decoder.instruction_index(),
        decoder.byte_offset()
      )
    })?;
    match instruction {
      Some(instruction) => module.code.push(instruction),
      None => break
    }
  }
  Ok(module)
}

fn words_of(instruction: &dyn Instruction) -> Result<Vec<Word>> {
  let mut words = vec![0; instruction.word_count()];
  INSTRUCTION_SET.encode(instruction, &mut words)?;
  Ok(words)
}

fn header_table(module: &Module) -> Result<Table> {
  let header = &module.header;
  let mut table = Table::new();
  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Field", ubl->"Value"]);

  table.add_row(row![r->"Magic", format!("{:#010x}", header.magic)]);
  table.add_row(row![r->"Byte order", format!("{:?}", header.endianness()?)]);
  table.add_row(row![
    r->"Version",
    format!("{}.{}", (header.version >> 16) & 0xFF, (header.version >> 8) & 0xFF)
  ]);
  table.add_row(row![r->"Generator", format!("{:#010x}", header.generator)]);
  table.add_row(row![r->"Bound", header.bound]);
  table.add_row(row![r->"Instructions", module.code.len()]);

  let categories = module.categories();
  for category in Category::iter() {
    let count = categories.iter().filter(|c| **c == category).count();
    if count > 0 {
      table.add_row(row![r->category, count]);
    }
  }
  Ok(table)
}

fn instruction_table(module: &Module, show_words: bool) -> Result<Table> {
  let mut table = Table::new();
  table.set_format(*TABLE_DISPLAY_FORMAT);
  match show_words {
    true  => table.set_titles(row![ubr->"#", ubr->"Opcode", ubl->"Category", ubl->"Instruction", ubl->"Words"]),
    false => table.set_titles(row![ubr->"#", ubr->"Opcode", ubl->"Category", ubl->"Instruction"])
  }

  for (i, instruction) in module.code.iter().enumerate() {
    let category: &'static str = instruction.category().into();
    let mut row = row![r->i, r->instruction.opcode(), category, format!("{:?}", instruction)];
    if show_words {
      let words = words_of(&**instruction)?
        .iter()
        .map(|word| format!("{:08x}", word))
        .collect::<Vec<String>>()
        .join(" ");
      row.add_cell(cell!(words));
    }
    table.add_row(row);
  }
  Ok(table)
}

fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();

  let mut module = load(&args.input)?;
  if !args.no_verify {
    module.verify().with_context(|| format!("{} failed verification", args.input.display()))?;
  }
  if args.strip {
    module.strip();
  }

  println!("{}", header_table(&module)?);
  println!("{}", instruction_table(&module, args.words)?);

  if let Some(path) = &args.output {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    module.save(BufWriter::new(file)).with_context(|| format!("cannot write {}", path.display()))?;
    log::info!("wrote {} instructions to {}", module.code.len(), path.display());
  }
  Ok(())
}
