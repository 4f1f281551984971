//! Turns a parsed chart into a tree by following edge backpaths.
//!
//! Extraction is a pure function of the chart: each call returns a fresh
//! [`Node`], and a child that must be spliced into its parent hands its own
//! children back for the parent to adopt. Children are looked up by the head
//! recorded when their slot was filled, never by re-matching a pattern, so a
//! unit rule can't pick itself as its own child.

use crate::chart::{Chart, Edge, EdgeIdx};
use crate::error::ChartError;
use crate::rules::Coord;
use crate::syntree::Node;

/// Builds the tree rooted at `root`, an edge of the chart's top cell
pub fn extract(chart: &Chart, root: EdgeIdx) -> Result<Node, ChartError> {
  from_edge(chart, chart.edge(root), chart.top())
}

/// Builds the subtree for cell `at`. With no label the best completed edge
/// that isn't hidden gives the label; with a label, the best completed edge
/// with exactly that head is used. A label no edge in the cell carries
/// becomes a bare leaf.
pub fn subtree(chart: &Chart, at: Coord, label: Option<&str>) -> Result<Node, ChartError> {
  let g = chart.grammar();

  let chosen = match label {
    None => chart.best_where(at, |e| !g.is_hidden(e.head()))?,
    Some(label) => chart.best_where(at, |e| e.head() == label)?,
  };

  match (chosen, label) {
    (Some(idx), _) => from_edge(chart, chart.edge(idx), at),
    (None, Some(label)) => Ok(Node::new(label, (at.start, at.end()))),
    (None, None) => Err(ChartError::EmptyCell {
      span: at.span,
      start: at.start,
    }),
  }
}

/// Should `child` be replaced by its own children under a `parent` node?
fn splices(chart: &Chart, parent: &str, child: &Node) -> bool {
  let g = chart.grammar();
  let label = child.label.as_str();
  !child.is_leaf()
    && (g.is_hidden(label) || g.is_only_top(label) || (g.is_flat(label) && label == parent))
}

fn from_edge(chart: &Chart, edge: &Edge, at: Coord) -> Result<Node, ChartError> {
  let g = chart.grammar();
  let label = edge.head();
  let mut node = Node::new(label, (at.start, at.end()));
  let mut head_set = false;

  for (idx, (found, &child_at)) in edge.found().iter().zip(edge.backpath()).enumerate() {
    let mut child = subtree(chart, child_at, Some(found.as_str()))?;
    let governs = edge.governor() == Some(idx);

    if splices(chart, label, &child) {
      for mut grandchild in child.children {
        // only the governing child passes its own head down
        if governs {
          head_set |= grandchild.head;
        } else {
          grandchild.head = false;
        }
        node.children.push(grandchild);
      }
    } else {
      if governs {
        child.head = true;
        head_set = true;
      }
      node.children.push(child);
    }
  }

  if !head_set && label != g.start_symbol() && !node.children.is_empty() {
    tracing::warn!(
      label,
      span = %at,
      governor = ?edge.governor(),
      "no child marked as head, falling back to the first"
    );
    node.children[0].head = true;
  }

  Ok(node)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::Grammar;
  use crate::sentence::{Analysis, Sentence, Word};

  fn tagged(tags: &[&str]) -> Sentence {
    let words = tags
      .iter()
      .map(|t| Word::new(t.to_lowercase(), vec![Analysis::new(t.to_lowercase(), *t)]))
      .collect();
    Sentence::new("t", words)
  }

  fn parse(src: &str, tags: &[&str]) -> Node {
    let g: Grammar = src.parse().unwrap();
    let mut chart = Chart::from_sentence(&g, &tagged(tags), 0).unwrap();
    let root = chart.parse().unwrap();
    extract(&chart, root).unwrap()
  }

  fn labels(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|n| n.label.as_str()).collect()
  }

  fn heads(nodes: &[Node]) -> Vec<bool> {
    nodes.iter().map(|n| n.head).collect()
  }

  #[test]
  fn test_governor_is_head() {
    let root = parse("@START S . S ==> NP, +VB .", &["NP", "VB"]);
    assert_eq!(root.label, "S");
    assert_eq!(labels(&root.children), vec!["NP", "VB"]);
    assert_eq!(heads(&root.children), vec![false, true]);
    assert_eq!(root.span, (0, 2));
    assert_eq!(root.children[1].span, (1, 2));
  }

  #[test]
  fn test_nested_constituents() {
    let root = parse(
      r#"
      @START S .
      S ==> np, +vp .
      np ==> DT, +NC .
      vp ==> +VB, np .
    "#,
      &["DT", "NC", "VB", "DT", "NC"],
    );

    assert_eq!(labels(&root.children), vec!["np", "vp"]);
    let vp = &root.children[1];
    assert_eq!(labels(&vp.children), vec!["VB", "np"]);
    assert_eq!(heads(&vp.children), vec![true, false]);
    assert_eq!(labels(&vp.children[1].children), vec!["DT", "NC"]);
    assert_eq!(root.leaves().len(), 5);
  }

  #[test]
  fn test_hidden_children_are_spliced() {
    let root = parse(
      r#"
      @START S .
      @HIDDEN aux .
      S ==> +aux, VB .
      aux ==> VA, +VA .
    "#,
      &["VA", "VA", "VB"],
    );

    // aux's children take its place; it governed, so its head survives
    assert_eq!(labels(&root.children), vec!["VA", "VA", "VB"]);
    assert_eq!(heads(&root.children), vec![false, true, false]);
  }

  #[test]
  fn test_spliced_non_governor_loses_heads() {
    let root = parse(
      r#"
      @START S .
      @ONLYTOP punct .
      S ==> +VB, punct .
      punct ==> Fc, +Fp .
    "#,
      &["VB", "Fc", "Fp"],
    );

    assert_eq!(labels(&root.children), vec!["VB", "Fc", "Fp"]);
    assert_eq!(heads(&root.children), vec![true, false, false]);
  }

  #[test]
  fn test_flat_only_splices_into_same_label() {
    let root = parse(
      r#"
      @START S .
      @FLAT np .
      S ==> +np, VB .
      np ==> np, +NC .
      np ==> +DT .
    "#,
      &["DT", "NC", "VB"],
    );

    // np ==> np NC flattens the inner np, but S keeps its np child
    assert_eq!(labels(&root.children), vec!["np", "VB"]);
    let np = &root.children[0];
    assert_eq!(labels(&np.children), vec!["DT", "NC"]);
    // the inner np didn't govern, so its DT head is dropped
    assert_eq!(heads(&np.children), vec![false, true]);
  }

  #[test]
  fn test_missing_head_defaults_to_first_child() {
    let root = parse("@START S . np ==> DT, NC .", &["DT", "NC"]);
    assert_eq!(root.label, "np");
    assert_eq!(heads(&root.children), vec![true, false]);
  }

  #[test]
  fn test_fallback_root_has_no_forced_head() {
    let root = parse(
      r#"
      @START S .
      NP ==> DT, +NC .
      VP ==> +VB, NC .
    "#,
      &["DT", "NC", "VB", "NC"],
    );

    assert_eq!(root.label, "S");
    assert_eq!(labels(&root.children), vec!["NP", "VP"]);
    assert_eq!(heads(&root.children), vec![false, false]);
    assert_eq!(root.leaves().len(), 4);
  }

  #[test]
  fn test_wildcard_child_resolves_to_matching_edge() {
    let root = parse(
      r#"
      @START S .
      S ==> +VB*, np .
      np ==> +NC .
    "#,
      &["VBZ", "NC"],
    );

    // VBZ(vbz) and VBZ<vbz> carry a qualifier the pattern lacks
    assert_eq!(labels(&root.children), vec!["VBZ", "np"]);
    assert_eq!(heads(&root.children), vec![true, false]);
    assert!(root.children[0].is_leaf());
  }

  #[test]
  fn test_unit_rule_named_like_its_pattern() {
    // VBgroup matches VB* itself, but it filled its slot with the VBZ seed
    let root = parse("@START S . VBgroup ==> +VB* .", &["VBZ"]);
    assert_eq!(root.label, "VBgroup");
    assert_eq!(labels(&root.children), vec!["VBZ"]);
    assert_eq!(heads(&root.children), vec![true]);
    assert!(root.children[0].is_leaf());
  }

  #[test]
  fn test_wildcard_slot_filled_by_nonterminal() {
    let root = parse(
      r#"
      @START S .
      S ==> NP, +VB* .
      VBgroup ==> +VB* .
    "#,
      &["NP", "VBZ"],
    );

    assert_eq!(root.label, "S");
    assert_eq!(labels(&root.children), vec!["NP", "VBgroup"]);
    assert_eq!(labels(&root.children[1].children), vec!["VBZ"]);
  }

  #[test]
  fn test_hidden_full_span_is_spliced_under_start() {
    let root = parse("@START S . @HIDDEN np . np ==> DT, +NC .", &["DT", "NC"]);
    assert_eq!(root.label, "S");
    assert_eq!(labels(&root.children), vec!["DT", "NC"]);
    assert_eq!(root.leaves().len(), 2);
  }

  #[test]
  fn test_subtree_without_label_skips_hidden() {
    let g: Grammar = r#"
      @START S .
      @HIDDEN np .
      @PRIOR np x .
      np ==> +NC .
      x ==> +NC .
    "#
    .parse()
    .unwrap();
    let mut chart = Chart::from_sentence(&g, &tagged(&["NC"]), 0).unwrap();
    chart.parse().unwrap();

    let node = subtree(&chart, Coord::new(0, 0), None).unwrap();
    assert_eq!(node.label, "x");
    assert_eq!(labels(&node.children), vec!["NC"]);
  }
}
