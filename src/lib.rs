#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod error;
pub mod extract;
pub mod grammar;
pub mod parse_grammar;
pub mod parser;
pub mod rules;
pub mod sentence;
pub mod symbol;
pub mod syntree;
pub mod utils;

pub use crate::chart::{Chart, Edge, EdgeIdx};
pub use crate::error::ChartError;
pub use crate::grammar::Grammar;
pub use crate::parser::ChartParser;
pub use crate::rules::{Coord, Rule};
pub use crate::sentence::{Analysis, Sentence, Word};
pub use crate::syntree::{Node, ParseTree};
pub use crate::utils::Err;
