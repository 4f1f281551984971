use std::fmt;

/// A chart cell address: `span` is the number of words covered beyond the
/// first, `start` is the index of the leftmost word
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Coord {
  pub span: usize,
  pub start: usize,
}

impl Coord {
  pub fn new(span: usize, start: usize) -> Self {
    Self { span, start }
  }

  /// Index one past the last word covered by this cell
  pub fn end(&self) -> usize {
    self.start + self.span + 1
  }
}

impl fmt::Display for Coord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({},{})", self.span, self.start)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
  pub head: String,
  pub right: Vec<String>,
  /// Position in `right` of the syntactic head child, if the rule has one
  pub governor: Option<usize>,
}

impl Rule {
  pub fn new(head: impl Into<String>, right: Vec<String>, governor: Option<usize>) -> Self {
    Self {
      head: head.into(),
      right,
      governor,
    }
  }

  pub fn len(&self) -> usize {
    self.right.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn first(&self) -> Option<&str> {
    self.right.first().map(String::as_str)
  }

  /// A unit rule rewrites exactly one symbol, so it fires inside a single cell
  pub fn is_unit(&self) -> bool {
    self.len() == 1
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ==>", self.head)?;
    for (idx, sym) in self.right.iter().enumerate() {
      let sep = if idx == 0 { " " } else { ", " };
      if Some(idx) == self.governor {
        write!(f, "{}+{}", sep, sym)?;
      } else {
        write!(f, "{}{}", sep, sym)?;
      }
    }
    write!(f, " .")
  }
}
