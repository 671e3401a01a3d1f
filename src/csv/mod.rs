//! CSV record pipeline: line accumulation, tokenizing and encoding

mod accumulator;
mod encoder;
mod needle;
mod parser;
mod tokenizer;

pub use accumulator::LineAccumulator;
pub use encoder::CsvEncoder;
pub use parser::CsvParser;
pub use tokenizer::Tokenizer;
