//! Tagged input sentences, as handed over by the tagger.
//!
//! Each word keeps all of its morphological analyses plus, per k-best
//! alternative, which of them the tagger retained.

use std::fmt;

use regex::Regex;

use crate::syntree::ParseTree;
use crate::Err;

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
  pub lemma: String,
  pub tag: String,
  pub prob: f64,
}

impl Analysis {
  pub fn new(lemma: impl Into<String>, tag: impl Into<String>) -> Self {
    Self {
      lemma: lemma.into(),
      tag: tag.into(),
      prob: 1.0,
    }
  }

  pub fn with_prob(mut self, prob: f64) -> Self {
    self.prob = prob;
    self
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
  pub form: String,
  pub lc_form: String,
  pub analyses: Vec<Analysis>,
  /// `selections[k]` holds the indices into `analyses` retained for alternative k
  selections: Vec<Vec<usize>>,
}

impl Word {
  /// A word whose first analysis is selected for alternative 0
  pub fn new(form: impl Into<String>, analyses: Vec<Analysis>) -> Self {
    let form = form.into();
    let selections = if analyses.is_empty() { Vec::new() } else { vec![vec![0]] };
    Self {
      lc_form: form.to_lowercase(),
      form,
      analyses,
      selections,
    }
  }

  /// Replaces the retained analyses for alternative `k`. Indices past the end
  /// of `analyses` are dropped.
  pub fn select(&mut self, k: usize, indices: Vec<usize>) {
    if self.selections.len() <= k {
      self.selections.resize(k + 1, Vec::new());
    }
    let n = self.analyses.len();
    self.selections[k] = indices.into_iter().filter(|&i| i < n).collect();
  }

  pub fn num_kbest(&self) -> usize {
    self.selections.len()
  }

  /// Retained analyses for alternative k, falling back to alternative 0 when
  /// this word has fewer alternatives than the sentence
  pub fn selected(&self, k: usize) -> impl Iterator<Item = &Analysis> {
    self
      .selections
      .get(k)
      .or_else(|| self.selections.first())
      .into_iter()
      .flatten()
      .filter_map(|&i| self.analyses.get(i))
  }

  /// Tag of the first retained analysis for alternative k
  pub fn tag(&self, k: usize) -> Option<&str> {
    self.selected(k).next().map(|a| a.tag.as_str())
  }
}

impl fmt::Display for Word {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.form)?;
    for a in self.analyses.iter() {
      write!(f, "/{}/{}", a.lemma, a.tag)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
  pub id: String,
  words: Vec<Word>,
  trees: Vec<Option<ParseTree>>,
}

impl Sentence {
  pub fn new(id: impl Into<String>, words: Vec<Word>) -> Self {
    Self {
      id: id.into(),
      words,
      trees: Vec::new(),
    }
  }

  /// Reads whitespace separated `form/lemma/TAG[/lemma/TAG...]` tokens. The
  /// i-th lemma/tag pair of a word is its analysis for alternative i.
  ///
  /// ```
  /// let s = shallowchart::Sentence::from_tagged("1", "the/the/DT dogs/dog/NCP/dog/VBZ").unwrap();
  /// assert_eq!(s.len(), 2);
  /// assert_eq!(s.num_kbest(), 2);
  /// assert_eq!(s.words()[1].tag(1), Some("VBZ"));
  /// assert_eq!(s.words()[0].tag(1), Some("DT"));
  /// ```
  pub fn from_tagged(id: impl Into<String>, line: &str) -> Result<Self, Err> {
    lazy_static! {
      static ref TOKEN: Regex = Regex::new(r"^[^/]+(/[^/]+/[^/]+)+$").unwrap();
    }

    let mut words = Vec::new();
    for token in line.split_whitespace() {
      if !TOKEN.is_match(token) {
        return Err(format!("expected form/lemma/TAG[/lemma/TAG...], got {:?}", token).into());
      }
      let mut parts = token.split('/');
      let form = parts.next().unwrap_or(token);
      let rest = parts.collect::<Vec<_>>();

      let analyses = rest
        .chunks(2)
        .map(|pair| Analysis::new(pair[0], pair[1]))
        .collect::<Vec<_>>();
      let mut word = Word::new(form, analyses);
      for k in 1..rest.len() / 2 {
        word.select(k, vec![k]);
      }
      words.push(word);
    }
    Ok(Self::new(id, words))
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  /// Number of tagger alternatives to parse, at least 1
  pub fn num_kbest(&self) -> usize {
    self.words.iter().map(Word::num_kbest).max().unwrap_or(0).max(1)
  }

  pub fn set_parse_tree(&mut self, k: usize, tree: ParseTree) {
    if self.trees.len() <= k {
      self.trees.resize(k + 1, None);
    }
    self.trees[k] = Some(tree);
  }

  pub fn parse_tree(&self, k: usize) -> Option<&ParseTree> {
    self.trees.get(k).and_then(Option::as_ref)
  }
}

impl fmt::Display for Sentence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, w) in self.words.iter().enumerate() {
      if idx > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", w)?;
    }
    Ok(())
  }
}
