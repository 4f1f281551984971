use std::fmt;

use crate::error::ChartError;
use crate::sentence::Sentence;

/// The word bound to a terminal leaf once parsing is done
#[derive(Debug, PartialEq, Clone)]
pub struct Leaf {
  /// Index of the word in its sentence
  pub position: usize,
  pub form: String,
  pub lemma: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Node {
  pub label: String,
  /// Is this node the syntactic head among its siblings?
  pub head: bool,
  /// Words covered, as a half-open range
  pub span: (usize, usize),
  pub word: Option<Leaf>,
  pub id: Option<String>,
  pub children: Vec<Node>,
}

impl Node {
  pub fn new(label: impl Into<String>, span: (usize, usize)) -> Self {
    Self {
      label: label.into(),
      head: false,
      span,
      word: None,
      id: None,
      children: Vec::new(),
    }
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// Leaves in left-to-right order
  pub fn leaves(&self) -> Vec<&Node> {
    let mut out = Vec::new();
    Self::collect_leaves(self, &mut out);
    out
  }

  fn collect_leaves<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    if node.is_leaf() {
      out.push(node);
    } else {
      for child in node.children.iter() {
        Self::collect_leaves(child, out);
      }
    }
  }

  fn collect_leaves_mut<'a>(node: &'a mut Node, out: &mut Vec<&'a mut Node>) {
    if node.is_leaf() {
      out.push(node);
      return;
    }
    for child in node.children.iter_mut() {
      Self::collect_leaves_mut(child, out);
    }
  }

  /// The child marked as head, if any
  pub fn head_child(&self) -> Option<&Node> {
    self.children.iter().find(|c| c.head)
  }

  /// Preorder walk over this node and all its descendants
  pub fn walk(&self) -> Vec<&Node> {
    let mut out = vec![self];
    for child in self.children.iter() {
      out.extend(child.walk());
    }
    out
  }

  fn header(&self) -> String {
    format!(
      "{}..{}: {}{}",
      self.span.0,
      self.span.1,
      if self.head { "+" } else { "" },
      self.label
    )
  }
}

impl fmt::Display for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (&self.word, self.children.len()) {
      (Some(w), 0) => write!(f, "{} {}", self.header(), w.form),
      (None, 0) => write!(f, "{}", self.header()),
      (_, 1) => write!(f, "({} ({}))", self.header(), self.children[0]),
      _ => {
        write!(f, "({}", self.header())?;
        for child in self.children.iter() {
          let fmt = format!("{}", child);
          for line in fmt.lines() {
            write!(f, "\n  {}", line)?;
          }
        }
        write!(f, ")")
      }
    }
  }
}

/// The tree for one k-best alternative of a sentence
#[derive(Debug, PartialEq, Clone)]
pub struct ParseTree {
  pub root: Node,
  pub kbest: usize,
}

impl ParseTree {
  pub fn new(root: Node, kbest: usize) -> Self {
    Self { root, kbest }
  }

  pub fn leaves(&self) -> Vec<&Node> {
    self.root.leaves()
  }

  /// Binds the leaves one-to-one, left to right, to the sentence's words,
  /// relabelling each with the tag the tagger chose for this alternative
  pub fn fill_leaves(&mut self, sentence: &Sentence) -> Result<(), ChartError> {
    let mut leaves = Vec::new();
    Node::collect_leaves_mut(&mut self.root, &mut leaves);
    if leaves.len() != sentence.len() {
      return Err(ChartError::LeafMismatch {
        leaves: leaves.len(),
        words: sentence.len(),
      });
    }

    for (position, (leaf, word)) in leaves.into_iter().zip(sentence.words()).enumerate() {
      let analysis = word
        .selected(self.kbest)
        .next()
        .ok_or(ChartError::MissingAnalysis {
          word: position,
          kbest: self.kbest,
        })?;
      leaf.label = analysis.tag.clone();
      leaf.word = Some(Leaf {
        position,
        form: word.form.clone(),
        lemma: analysis.lemma.clone(),
      });
    }
    Ok(())
  }

  /// Gives every node a preorder id of the form `<sentence>.<n>`
  pub fn build_node_index(&mut self, sentence_id: &str) {
    fn number(node: &mut Node, sentence_id: &str, next: &mut usize) {
      node.id = Some(format!("{}.{}", sentence_id, next));
      *next += 1;
      for child in node.children.iter_mut() {
        number(child, sentence_id, next);
      }
    }
    number(&mut self.root, sentence_id, &mut 0);
  }

  pub fn find(&self, id: &str) -> Option<&Node> {
    self
      .root
      .walk()
      .into_iter()
      .find(|n| n.id.as_deref() == Some(id))
  }
}

impl fmt::Display for ParseTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.root)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sentence::{Analysis, Word};

  fn tree() -> ParseTree {
    let mut np = Node::new("np", (0, 2));
    np.children.push(Node::new("DT", (0, 1)));
    let mut nc = Node::new("NC", (1, 2));
    nc.head = true;
    np.children.push(nc);

    let mut vb = Node::new("VB", (2, 3));
    vb.head = true;

    let mut s = Node::new("S", (0, 3));
    s.children.push(np);
    s.children.push(vb);
    ParseTree::new(s, 0)
  }

  fn sentence() -> Sentence {
    Sentence::new(
      "s1",
      vec![
        Word::new("The", vec![Analysis::new("the", "DT")]),
        Word::new("dog", vec![Analysis::new("dog", "NCS")]),
        Word::new("barks", vec![Analysis::new("bark", "VBZ")]),
      ],
    )
  }

  #[test]
  fn test_fill_leaves_in_order() {
    let mut t = tree();
    t.fill_leaves(&sentence()).unwrap();

    let leaves = t.leaves();
    assert_eq!(leaves.len(), 3);
    assert_eq!(
      leaves.iter().map(|l| l.label.as_str()).collect::<Vec<_>>(),
      vec!["DT", "NCS", "VBZ"]
    );
    assert_eq!(
      leaves
        .iter()
        .map(|l| l.word.as_ref().unwrap().position)
        .collect::<Vec<_>>(),
      vec![0, 1, 2]
    );
    assert_eq!(leaves[2].word.as_ref().unwrap().lemma, "bark");
    // head flags survive the relabelling
    assert!(leaves[1].head);
  }

  #[test]
  fn test_fill_leaves_count_mismatch() {
    let mut t = tree();
    let short = Sentence::new("s2", vec![Word::new("hi", vec![Analysis::new("hi", "UH")])]);
    assert_eq!(
      t.fill_leaves(&short),
      Err(ChartError::LeafMismatch { leaves: 3, words: 1 })
    );
  }

  #[test]
  fn test_node_index() {
    let mut t = tree();
    t.build_node_index("s1");
    assert_eq!(t.root.id.as_deref(), Some("s1.0"));
    assert_eq!(t.find("s1.2").map(|n| n.label.as_str()), Some("DT"));
    assert_eq!(t.find("s1.4").map(|n| n.label.as_str()), Some("VB"));
    assert!(t.find("s1.5").is_none());
  }

  #[test]
  fn test_display() {
    let mut t = tree();
    t.fill_leaves(&sentence()).unwrap();
    let shown = t.to_string();
    println!("{}", shown);
    assert!(shown.starts_with("(0..3: S"));
    assert!(shown.contains("1..2: +NCS dog"));
    assert!(shown.contains("2..3: +VBZ barks"));
  }
}
