use crate::chart::Chart;
use crate::error::ChartError;
use crate::extract::extract;
use crate::grammar::Grammar;
use crate::sentence::Sentence;
use crate::syntree::ParseTree;

/// Parses sentences against a shared grammar, one chart per k-best
/// alternative. The parser only borrows the grammar, so any number of them
/// can run side by side on different sentences.
#[derive(Debug, Clone, Copy)]
pub struct ChartParser<'g> {
  grammar: &'g Grammar,
}

impl<'g> ChartParser<'g> {
  pub fn new(grammar: &'g Grammar) -> Self {
    Self { grammar }
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  pub fn start_symbol(&self) -> &'g str {
    self.grammar.start_symbol()
  }

  /// Builds the chart for alternative `k` of a sentence
  pub fn chart(&self, sentence: &Sentence, k: usize) -> Result<Chart<'g>, ChartError> {
    Chart::from_sentence(self.grammar, sentence, k)
  }

  /// Parses alternative `k` into a tree whose leaves are bound to the words
  pub fn parse(&self, sentence: &Sentence, k: usize) -> Result<ParseTree, ChartError> {
    let mut chart = self.chart(sentence, k)?;
    let root = chart.parse()?;
    let mut tree = ParseTree::new(extract(&chart, root)?, k);
    tree.fill_leaves(sentence)?;
    tree.build_node_index(&sentence.id);

    tracing::debug!(
      sentence = %sentence.id,
      kbest = k,
      edges = chart.num_edges(),
      root = %tree.root.label,
      "parsed alternative"
    );
    Ok(tree)
  }

  /// Parses every k-best alternative of a sentence and stores the trees on
  /// it. An alternative that fails is logged and left without a tree; the
  /// others are unaffected. Returns the number of trees stored.
  pub fn analyze(&self, sentence: &mut Sentence) -> usize {
    let mut parsed = 0;
    for k in 0..sentence.num_kbest() {
      match self.parse(sentence, k) {
        Ok(tree) => {
          sentence.set_parse_tree(k, tree);
          parsed += 1;
        }
        Err(e) => tracing::error!(sentence = %sentence.id, kbest = k, "parse failed: {}", e),
      }
    }
    parsed
  }
}
