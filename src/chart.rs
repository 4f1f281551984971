use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::error::ChartError;
use crate::grammar::Grammar;
use crate::rules::{Coord, Rule};
use crate::sentence::Sentence;
use crate::symbol::check_match;

/// Index of an edge in its chart's arena
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EdgeIdx(pub u32);

impl EdgeIdx {
  fn get(self) -> usize {
    self.0 as usize
  }
}

/// A grammar rule instantiated over a chart cell, with everything left of
/// the dot already matched. `backpath[i]` is the cell that matched
/// `matched()[i]`, and `found()[i]` the head of the edge that filled it there.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
  rule: Arc<Rule>,
  dot: usize,
  backpath: Vec<Coord>,
  found: Vec<String>,
}

impl Edge {
  pub fn new(rule: &Arc<Rule>) -> Self {
    Self {
      rule: rule.clone(),
      dot: 0,
      backpath: Vec::new(),
      found: Vec::new(),
    }
  }

  /// A completed edge for a bare terminal, as seeded from the tagger's output
  pub fn terminal(symbol: impl Into<String>) -> Self {
    Self::new(&Arc::new(Rule::new(symbol, Vec::new(), None)))
  }

  pub fn rule(&self) -> &Arc<Rule> {
    &self.rule
  }

  pub fn head(&self) -> &str {
    &self.rule.head
  }

  pub fn matched(&self) -> &[String] {
    &self.rule.right[..self.dot]
  }

  pub fn remaining(&self) -> &[String] {
    &self.rule.right[self.dot..]
  }

  pub fn backpath(&self) -> &[Coord] {
    &self.backpath
  }

  /// Heads that filled the matched slots; a wildcard slot like `VB*` records
  /// the concrete `VBZ` it consumed
  pub fn found(&self) -> &[String] {
    &self.found
  }

  pub fn governor(&self) -> Option<usize> {
    self.rule.governor
  }

  pub fn is_active(&self) -> bool {
    self.dot < self.rule.len()
  }

  pub fn next_symbol(&self) -> Option<&str> {
    self.rule.right.get(self.dot).map(String::as_str)
  }

  /// Consumes the next expected symbol, recording the cell that matched it
  /// and the head found there
  pub fn shift(&mut self, at: Coord, found: impl Into<String>) -> Result<(), ChartError> {
    if !self.is_active() {
      return Err(ChartError::InactiveShift {
        head: self.head().to_string(),
      });
    }
    self.dot += 1;
    self.backpath.push(at);
    self.found.push(found.into());
    Ok(())
  }

  /// A shifted copy, leaving this edge where it is
  pub fn advance(&self, at: Coord, found: impl Into<String>) -> Result<Self, ChartError> {
    let mut next = self.clone();
    next.shift(at, found)?;
    Ok(next)
  }
}

impl fmt::Display for Edge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ==>", self.head())?;
    for s in self.matched() {
      write!(f, " {}", s)?;
    }
    write!(f, " .")?;
    for s in self.remaining() {
      write!(f, " {}", s)?;
    }
    write!(f, "   backpath:")?;
    for at in self.backpath.iter() {
      write!(f, "{}", at)?;
    }
    Ok(())
  }
}

/// Triangular table of cells over one sentence (one k-best alternative).
/// Cell `(span, start)` holds edges covering words `start ..= start + span`.
#[derive(Debug)]
pub struct Chart<'g> {
  grammar: &'g Grammar,
  size: usize,
  edges: Vec<Edge>,
  cells: Vec<Vec<EdgeIdx>>,
}

impl<'g> Chart<'g> {
  pub fn new(grammar: &'g Grammar, size: usize) -> Self {
    Self {
      grammar,
      size,
      edges: Vec::new(),
      cells: vec![Vec::new(); size * (size + 1) / 2],
    }
  }

  /// A chart with the words of alternative `k` loaded into its bottom row
  pub fn from_sentence(grammar: &'g Grammar, sentence: &Sentence, k: usize) -> Result<Self, ChartError> {
    if sentence.is_empty() {
      return Err(ChartError::EmptySentence);
    }
    let mut chart = Self::new(grammar, sentence.len());
    chart.load_sentence(sentence, k)?;
    Ok(chart)
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  /// Number of words
  pub fn len(&self) -> usize {
    self.size
  }

  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  /// Edges in all cells, active ones included
  pub fn num_edges(&self) -> usize {
    self.edges.len()
  }

  /// The cell spanning the whole sentence
  pub fn top(&self) -> Coord {
    Coord::new(self.size.saturating_sub(1), 0)
  }

  /// Row `span` starts after the `span` longer rows below it, which hold
  /// `n + (n - 1) + ... + (n - span + 1)` cells
  pub fn index(&self, at: Coord) -> Result<usize, ChartError> {
    if at.span >= self.size || at.start >= self.size - at.span {
      return Err(ChartError::CellOutOfBounds {
        span: at.span,
        start: at.start,
        size: self.size,
      });
    }
    Ok(at.start + at.span * (self.size + 1) - at.span * (at.span + 1) / 2)
  }

  pub fn edge(&self, idx: EdgeIdx) -> &Edge {
    &self.edges[idx.get()]
  }

  pub fn cell(&self, at: Coord) -> Result<&[EdgeIdx], ChartError> {
    let idx = self.index(at)?;
    Ok(&self.cells[idx])
  }

  /// Completed edges of a cell, in insertion order
  pub fn completed(&self, at: Coord) -> Result<impl Iterator<Item = (EdgeIdx, &Edge)>, ChartError> {
    Ok(
      self
        .cell(at)?
        .iter()
        .map(move |&idx| (idx, self.edge(idx)))
        .filter(|(_, e)| !e.is_active()),
    )
  }

  /// Appends an edge to a cell unconditionally
  fn insert(&mut self, at: Coord, edge: Edge) -> Result<EdgeIdx, ChartError> {
    let cell = self.index(at)?;
    let idx = EdgeIdx(self.edges.len() as u32);
    self.edges.push(edge);
    self.cells[cell].push(idx);
    Ok(idx)
  }

  /// Adds an edge unless the cell already holds an identical one
  pub fn add(&mut self, at: Coord, edge: Edge) -> Result<Option<EdgeIdx>, ChartError> {
    let cell = self.index(at)?;
    if self.cells[cell].iter().any(|&idx| self.edge(idx) == &edge) {
      Ok(None)
    } else {
      self.insert(at, edge).map(Some)
    }
  }

  /// Seeds cell `(0, j)` with three completed terminal edges per retained
  /// analysis of word j (the bare tag, the tag qualified by the lowercased
  /// form, and the tag qualified by the lemma), closing each over the grammar
  /// so lexicalized rules fire before any words are combined
  pub fn load_sentence(&mut self, sentence: &Sentence, k: usize) -> Result<(), ChartError> {
    for (j, word) in sentence.words().iter().enumerate() {
      let at = Coord::new(0, j);
      let mut any = false;
      for analysis in word.selected(k) {
        any = true;
        let seeds = [
          analysis.tag.clone(),
          format!("{}({})", analysis.tag, word.lc_form),
          format!("{}<{}>", analysis.tag, analysis.lemma),
        ];
        for seed in seeds {
          if self.add(at, Edge::terminal(seed.as_str()))?.is_some() {
            self.find_all_rules(&seed, at)?;
          }
        }
      }
      if !any {
        return Err(ChartError::MissingAnalysis { word: j, kbest: k });
      }
    }
    Ok(())
  }

  /// Closes a cell over every rule that can start with a freshly completed
  /// `head`: each such rule becomes an edge with its first symbol matched at
  /// `at`, and rules that complete immediately feed their own head back in.
  /// Terminals also try the wildcard rules filed under their first character.
  pub fn find_all_rules(&mut self, head: &str, at: Coord) -> Result<(), ChartError> {
    let g = self.grammar;
    let mut pending = VecDeque::new();

    if g.is_terminal(head) {
      if let Some(c) = head.chars().next() {
        for rule in g.rules_right_wildcard(c) {
          if rule.first().is_some_and(|first| check_match(g, first, head)) {
            self.instantiate(rule, at, head, &mut pending)?;
          }
        }
      }
    }

    pending.push_back(head.to_string());
    while let Some(symbol) = pending.pop_front() {
      for rule in g.rules_right(&symbol) {
        self.instantiate(rule, at, &symbol, &mut pending)?;
      }
    }

    Ok(())
  }

  fn instantiate(
    &mut self,
    rule: &Arc<Rule>,
    at: Coord,
    found: &str,
    pending: &mut VecDeque<String>,
  ) -> Result<(), ChartError> {
    let mut edge = Edge::new(rule);
    edge.shift(at, found)?;
    let complete = !edge.is_active();
    if self.add(at, edge)?.is_some() && complete {
      pending.push_back(rule.head.clone());
    }
    Ok(())
  }

  /// The best completed edge in `at` that fills a slot expecting `symbol`
  pub fn best_filler(&self, symbol: &str, at: Coord) -> Result<Option<EdgeIdx>, ChartError> {
    let g = self.grammar;
    self.best_where(at, |e| check_match(g, symbol, e.head()))
  }

  /// Fills every cell above the bottom row, shortest spans first. Cell `(k, i)`
  /// extends each active edge of `(a, i)` with a completed edge of
  /// `(k - a - 1, i + a + 1)`, for every split `a < k`.
  pub fn fill(&mut self) -> Result<(), ChartError> {
    for k in 1..self.size {
      for i in 0..self.size - k {
        let at = Coord::new(k, i);
        for a in 0..k {
          let left = Coord::new(a, i);
          let right = Coord::new(k - a - 1, i + a + 1);

          // cells below `at` are finished, so a snapshot of the left cell is the whole cell
          let candidates = self.cell(left)?.to_vec();
          for idx in candidates {
            let edge = self.edge(idx);
            let next = match edge.next_symbol() {
              Some(s) => s,
              None => continue,
            };
            let filler = match self.best_filler(next, right)? {
              Some(f) => self.edge(f).head(),
              None => continue,
            };

            let extended = edge.advance(right, filler)?;
            let complete = !extended.is_active();
            let head = extended.head().to_string();
            if self.add(at, extended)?.is_some() && complete {
              self.find_all_rules(&head, at)?;
            }
          }
        }
      }
    }
    Ok(())
  }

  /// Runs the fill and returns the root edge, synthesizing one from the best
  /// partial parses when no rule derives the whole sentence
  pub fn parse(&mut self) -> Result<EdgeIdx, ChartError> {
    self.fill()?;
    tracing::trace!("chart:\n{}", self);
    self.root()
  }

  /// Total preference order between completed edges: the start symbol first,
  /// then non-terminals by priority (ties go to the edge with more children),
  /// then terminals by specificity
  pub fn better_edge(&self, e1: &Edge, e2: &Edge) -> bool {
    let g = self.grammar;
    let (h1, h2) = (e1.head(), e2.head());
    let start = g.start_symbol();

    if h1 == start && h2 != start {
      return true;
    }
    if h1 != start && h2 == start {
      return false;
    }

    match (g.is_terminal(h1), g.is_terminal(h2)) {
      (true, true) => g.specificity(h1) < g.specificity(h2),
      (false, false) => {
        let (p1, p2) = (g.priority(h1), g.priority(h2));
        if p1 != p2 {
          p1 < p2
        } else {
          e1.matched().len() > e2.matched().len()
        }
      }
      // a non-terminal beats a terminal
      (terminal1, _) => !terminal1,
    }
  }

  /// The best of some edges; earlier edges win ties
  pub fn best_of(&self, candidates: impl IntoIterator<Item = EdgeIdx>) -> Option<EdgeIdx> {
    candidates.into_iter().fold(None, |best, idx| match best {
      Some(b) if !self.better_edge(self.edge(idx), self.edge(b)) => Some(b),
      _ => Some(idx),
    })
  }

  /// The best completed edge of a cell among those `keep` accepts
  pub fn best_where(
    &self,
    at: Coord,
    keep: impl Fn(&Edge) -> bool,
  ) -> Result<Option<EdgeIdx>, ChartError> {
    let candidates = self
      .completed(at)?
      .filter(|(_, e)| keep(*e))
      .map(|(idx, _)| idx)
      .collect::<Vec<_>>();
    Ok(self.best_of(candidates))
  }

  /// The best completed edge over the whole sentence that may serve as root,
  /// or a synthetic start-symbol edge over the cover of the best partial parses
  pub fn root(&mut self) -> Result<EdgeIdx, ChartError> {
    let g = self.grammar;
    let top = self.top();

    // hidden heads would be spliced away, leaving nothing to hang the tree on
    let rootable = |e: &Edge| !g.is_no_top(e.head()) && !g.is_hidden(e.head());
    if let Some(best) = self.best_where(top, rootable)? {
      return Ok(best);
    }

    let tiles = self.cover(top.span, top.start)?;
    let mut heads = Vec::with_capacity(tiles.len());
    for at in tiles.iter() {
      let best = self.best_where(*at, |_| true)?.ok_or(ChartError::EmptyCell {
        span: at.span,
        start: at.start,
      })?;
      heads.push(self.edge(best).head().to_string());
    }

    tracing::debug!(tiles = tiles.len(), "no full parse, covering with {:?}", heads);

    let rule = Arc::new(Rule::new(g.start_symbol(), heads.clone(), None));
    let mut edge = Edge::new(&rule);
    for (at, head) in tiles.into_iter().zip(heads) {
      edge.shift(at, head)?;
    }
    self.insert(top, edge)
  }

  /// Tiles the words `start ..= start + span` with cells holding completed
  /// edges: takes the best edge from the longest span that has any (leftmost
  /// on ties), then covers whatever is left on either side of it
  pub fn cover(&self, span: usize, start: usize) -> Result<Vec<Coord>, ChartError> {
    let mut found: Option<(Coord, EdgeIdx)> = None;
    for i in (0..=span).rev() {
      for j in start..=start + (span - i) {
        let at = Coord::new(i, j);
        for (idx, e) in self.completed(at)? {
          let better = match found {
            Some((_, b)) => self.better_edge(e, self.edge(b)),
            None => true,
          };
          if better {
            found = Some((at, idx));
          }
        }
      }
      if found.is_some() {
        break;
      }
    }

    let best = match found {
      Some((at, _)) => at,
      None => return Ok(Vec::new()),
    };

    let end = start + span + 1;
    let mut tiles = Vec::new();
    if best.start > start {
      tiles.extend(self.cover(best.start - start - 1, start)?);
    }
    tiles.push(best);
    if best.end() < end {
      tiles.extend(self.cover(end - best.end() - 1, best.end())?);
    }
    Ok(tiles)
  }
}

impl fmt::Display for Chart<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for span in 0..self.size {
      for start in 0..self.size - span {
        let at = Coord::new(span, start);
        let cell = self.cell(at).map_err(|_| fmt::Error)?;
        if cell.is_empty() {
          continue;
        }
        writeln!(f, "Cell {}", at)?;
        for &idx in cell {
          writeln!(f, "  {}", self.edge(idx))?;
        }
      }
    }
    Ok(())
  }
}
