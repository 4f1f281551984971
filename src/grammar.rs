use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::parse_grammar::{parse, Directive};
use crate::rules::Rule;
use crate::symbol::{is_file_qualifier, is_wildcard, qualifier_body, split_qualifier, Shape};
use crate::Err;

/// Priority of non-terminals that no @PRIOR directive mentions
pub const DEFAULT_PRIORITY: i32 = i32::MAX;

/// Read-only rule database queried by the chart parser.
///
/// Built once (from a string or a file) and then shared by any number of
/// charts; every query is a pure lookup.
#[derive(Debug)]
pub struct Grammar {
  start: String,
  rules: Vec<Arc<Rule>>,
  nonterminals: HashSet<String>,
  /// rules keyed by their first right-hand symbol, for non-wildcard symbols
  rules_right: HashMap<String, Vec<Arc<Rule>>>,
  /// rules whose first right-hand symbol is a wildcard, keyed by its first char
  rules_wildcard: HashMap<char, Vec<Arc<Rule>>>,
  priorities: HashMap<String, i32>,
  hidden: HashSet<String>,
  flat: HashSet<String>,
  only_top: HashSet<String>,
  no_top: HashSet<String>,
  word_classes: HashMap<String, HashSet<String>>,
}

impl Grammar {
  pub fn new(rules: Vec<Rule>, directives: Vec<Directive>) -> Result<Self, Err> {
    if rules.is_empty() {
      return Err("empty ruleset".into());
    }

    let mut start = None;
    let mut priorities = HashMap::new();
    let mut hidden = HashSet::new();
    let mut flat = HashSet::new();
    let mut only_top = HashSet::new();
    let mut no_top = HashSet::new();

    for directive in directives {
      match directive {
        Directive::Start(s) => {
          if let Some(prev) = start.replace(s) {
            return Err(format!("@START declared more than once (first as {})", prev).into());
          }
        }
        Directive::Prior(symbols) => {
          for s in symbols {
            let next = priorities.len() as i32;
            priorities.entry(s).or_insert(next);
          }
        }
        Directive::Hidden(symbols) => hidden.extend(symbols),
        Directive::Flat(symbols) => flat.extend(symbols),
        Directive::OnlyTop(symbols) => only_top.extend(symbols),
        Directive::NoTop(symbols) => no_top.extend(symbols),
      }
    }

    let start = start.ok_or("missing @START directive")?;
    let rules = rules.into_iter().map(Arc::new).collect::<Vec<_>>();
    let nonterminals = rules.iter().map(|r| r.head.clone()).collect::<HashSet<_>>();

    let mut rules_right: HashMap<String, Vec<Arc<Rule>>> = HashMap::new();
    let mut rules_wildcard: HashMap<char, Vec<Arc<Rule>>> = HashMap::new();
    for rule in rules.iter() {
      // word classes are only consulted when matching a pattern
      let unmatchable = rule
        .right
        .iter()
        .find(|s| is_file_qualifier(split_qualifier(s).1) && !is_wildcard(s));
      if let Some(s) = unmatchable {
        return Err(format!("word-class symbol {} in `{}` must be a * pattern", s, rule).into());
      }

      let first = rule.first().ok_or_else(|| format!("rule for {} has no symbols", rule.head))?;
      if is_wildcard(first) {
        if let Some(c) = first.chars().next() {
          rules_wildcard.entry(c).or_default().push(rule.clone());
        }
      } else {
        rules_right.entry(first.to_string()).or_default().push(rule.clone());
      }
    }

    for s in priorities.keys() {
      if !nonterminals.contains(s) {
        tracing::warn!(symbol = %s, "@PRIOR mentions a symbol that heads no rule");
      }
    }

    let g = Self {
      start,
      rules,
      nonterminals,
      rules_right,
      rules_wildcard,
      priorities,
      hidden,
      flat,
      only_top,
      no_top,
      word_classes: HashMap::new(),
    };
    g.check_unit_cycles()?;

    tracing::debug!(
      rules = g.rules.len(),
      nonterminals = g.nonterminals.len(),
      start = %g.start,
      "loaded grammar"
    );

    Ok(g)
  }

  /// Reads a grammar file and every word-class file its rules reference.
  /// Word-class paths are resolved relative to the grammar file.
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, Err> {
    let path = path.as_ref();
    let src = fs::read_to_string(path)
      .map_err(|e| -> Err { format!("reading grammar {}: {}", path.display(), e).into() })?;
    let mut g: Self = src
      .parse()
      .map_err(|e| -> Err { format!("in grammar {}: {}", path.display(), e).into() })?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    for name in g.word_class_files() {
      let class_path = dir.join(&name);
      let contents = fs::read_to_string(&class_path).map_err(|e| -> Err {
        format!("reading word class {}: {}", class_path.display(), e).into()
      })?;
      let words = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("//"))
        .filter_map(|l| l.split_whitespace().next())
        .map(str::to_string)
        .collect::<HashSet<_>>();
      tracing::debug!(class = %name, words = words.len(), "loaded word class");
      g.word_classes.insert(name, words);
    }

    Ok(g)
  }

  /// Fills in a word class by hand, for grammars that weren't read from disk
  pub fn with_word_class<I, S>(mut self, name: &str, words: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .word_classes
      .entry(name.to_string())
      .or_default()
      .extend(words.into_iter().map(Into::into));
    self
  }

  /// Names of the word-class files referenced by quoted qualifiers, sorted
  pub fn word_class_files(&self) -> Vec<String> {
    let mut names = self
      .rules
      .iter()
      .flat_map(|r| r.right.iter())
      .filter_map(|s| {
        let (_, qualifier) = split_qualifier(s);
        if is_file_qualifier(qualifier) {
          qualifier_body(qualifier).map(|(_, name)| name.to_string())
        } else {
          None
        }
      })
      .collect::<Vec<_>>();
    names.sort();
    names.dedup();
    names
  }

  /// Unit rules (`A ==> B`) fire inside a single cell during closure, so a
  /// cycle among them would never finish reducing
  fn check_unit_cycles(&self) -> Result<(), Err> {
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for rule in self.rules.iter().filter(|r| r.is_unit()) {
      if let Some(first) = rule.first() {
        if !is_wildcard(first) {
          graph.entry(first).or_default().push(&rule.head);
        }
      }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
      Visiting,
      Done,
    }

    fn visit<'a>(
      node: &'a str,
      graph: &HashMap<&'a str, Vec<&'a str>>,
      marks: &mut HashMap<&'a str, Mark>,
      path: &mut Vec<&'a str>,
    ) -> Result<(), Err> {
      match marks.get(node) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
          let from = path.iter().position(|s| *s == node).unwrap_or(0);
          let mut cycle = path[from..].to_vec();
          cycle.push(node);
          return Err(format!("cycle among unit rules: {}", cycle.join(" -> ")).into());
        }
        None => {}
      }

      marks.insert(node, Mark::Visiting);
      path.push(node);
      for next in graph.get(node).into_iter().flatten() {
        visit(*next, graph, marks, path)?;
      }
      path.pop();
      marks.insert(node, Mark::Done);
      Ok(())
    }

    let mut roots = graph.keys().copied().collect::<Vec<_>>();
    roots.sort();
    let mut marks = HashMap::new();
    for root in roots {
      visit(root, &graph, &mut marks, &mut Vec::new())?;
    }
    Ok(())
  }

  pub fn start_symbol(&self) -> &str {
    &self.start
  }

  pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
    self.rules.iter()
  }

  /// Anything that doesn't head a rule is a terminal, including qualified tags like `NC(dog)`
  pub fn is_terminal(&self, s: &str) -> bool {
    !self.nonterminals.contains(s)
  }

  pub fn is_hidden(&self, s: &str) -> bool {
    self.hidden.contains(s)
  }

  pub fn is_flat(&self, s: &str) -> bool {
    self.flat.contains(s)
  }

  pub fn is_only_top(&self, s: &str) -> bool {
    self.only_top.contains(s)
  }

  pub fn is_no_top(&self, s: &str) -> bool {
    self.no_top.contains(s)
  }

  /// Lower is preferred
  pub fn priority(&self, s: &str) -> i32 {
    self.priorities.get(s).copied().unwrap_or(DEFAULT_PRIORITY)
  }

  /// Lower is more specific: forms beat lemmas beat bare tags
  pub fn specificity(&self, s: &str) -> i32 {
    Shape::of(s).specificity()
  }

  /// Rules whose right-hand side starts with exactly `s`
  pub fn rules_right(&self, s: &str) -> &[Arc<Rule>] {
    self.rules_right.get(s).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Rules whose right-hand side starts with a wildcard pattern beginning with `c`
  pub fn rules_right_wildcard(&self, c: char) -> &[Arc<Rule>] {
    self.rules_wildcard.get(&c).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Is the word inside `found_qualifier` (e.g. `<dog>`) in the word class
  /// that `pattern_qualifier` (e.g. `<"animals.txt">`) names? Bracket kinds must agree.
  pub fn in_file_map(&self, found_qualifier: &str, pattern_qualifier: &str) -> bool {
    match (qualifier_body(found_qualifier), qualifier_body(pattern_qualifier)) {
      (Some((found_open, word)), Some((pattern_open, class))) if found_open == pattern_open => self
        .word_classes
        .get(class)
        .is_some_and(|words| words.contains(word)),
      _ => false,
    }
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "@START {} .", self.start)?;

    let mut prior = self.priorities.iter().collect::<Vec<_>>();
    prior.sort_by_key(|(_, p)| **p);
    if !prior.is_empty() {
      write!(f, "@PRIOR")?;
      for (s, _) in prior {
        write!(f, " {}", s)?;
      }
      writeln!(f, " .")?;
    }

    for (name, set) in [
      ("HIDDEN", &self.hidden),
      ("FLAT", &self.flat),
      ("ONLYTOP", &self.only_top),
      ("NOTOP", &self.no_top),
    ] {
      if set.is_empty() {
        continue;
      }
      let mut symbols = set.iter().map(String::as_str).collect::<Vec<_>>();
      symbols.sort();
      writeln!(f, "@{} {} .", name, symbols.join(" "))?;
    }

    for rule in self.rules.iter() {
      writeln!(f, "{}", rule)?;
    }

    Ok(())
  }
}

impl FromStr for Grammar {
  type Err = Err;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (rules, directives) = parse(s)?;
    Self::new(rules, directives)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SRC: &str = r#"
    @START S .
    @PRIOR vp np .
    @HIDDEN aux .
    @FLAT np .
    @ONLYTOP punct .
    @NOTOP pp .

    np ==> DT, +NC | +NP .
    np ==> np, +np .
    pp ==> +SP, np .
    vp ==> +VB* .
    pet ==> +NC*<"animals.txt"> .
    punct ==> +Fp .
    aux ==> +VA .
  "#;

  #[test]
  fn test_classification() {
    let g: Grammar = SRC.parse().unwrap();

    assert_eq!(g.start_symbol(), "S");
    assert!(g.is_terminal("NC"));
    assert!(g.is_terminal("NC(dog)"));
    assert!(!g.is_terminal("np"));
    assert!(g.is_hidden("aux"));
    assert!(g.is_flat("np"));
    assert!(g.is_only_top("punct"));
    assert!(g.is_no_top("pp"));
    assert!(!g.is_no_top("np"));

    assert_eq!(g.priority("vp"), 0);
    assert_eq!(g.priority("np"), 1);
    assert_eq!(g.priority("pp"), DEFAULT_PRIORITY);

    assert!(g.specificity("NC(dog)") < g.specificity("NC<dog>"));
    assert!(g.specificity("NC<dog>") < g.specificity("NC"));
  }

  #[test]
  fn test_rule_indexes() {
    let g: Grammar = SRC.parse().unwrap();

    let heads = |rules: &[Arc<Rule>]| rules.iter().map(|r| r.head.clone()).collect::<Vec<_>>();

    assert_eq!(heads(g.rules_right("DT")), vec!["np"]);
    assert_eq!(heads(g.rules_right("np")), vec!["np"]);
    assert_eq!(heads(g.rules_right("SP")), vec!["pp"]);
    assert!(g.rules_right("VB*").is_empty());
    assert!(g.rules_right("nothing").is_empty());

    assert_eq!(heads(g.rules_right_wildcard('V')), vec!["vp"]);
    assert_eq!(heads(g.rules_right_wildcard('N')), vec!["pet"]);
    assert!(g.rules_right_wildcard('X').is_empty());
  }

  #[test]
  fn test_word_classes() {
    let g: Grammar = SRC.parse().unwrap();
    assert_eq!(g.word_class_files(), vec!["animals.txt".to_string()]);
    assert!(!g.in_file_map("<dog>", "<\"animals.txt\">"));

    let g = g.with_word_class("animals.txt", ["dog", "cat"]);
    assert!(g.in_file_map("<dog>", "<\"animals.txt\">"));
    assert!(!g.in_file_map("(dog)", "<\"animals.txt\">"));
    assert!(!g.in_file_map("<cow>", "<\"animals.txt\">"));
    assert!(!g.in_file_map("", "<\"animals.txt\">"));
  }

  #[test]
  fn test_load_time_defects() {
    // no start symbol
    assert!("np ==> +NC .".parse::<Grammar>().is_err());
    // two start symbols
    assert!("@START S . @START T . np ==> +NC .".parse::<Grammar>().is_err());
    // nothing to parse with
    assert!("@START S .".parse::<Grammar>().is_err());
    // unit cycles would never finish closing a cell
    assert!("@START S . a ==> +b . b ==> +a .".parse::<Grammar>().is_err());
    assert!("@START S . a ==> +a .".parse::<Grammar>().is_err());
    // a word class on a plain symbol could never match
    assert!("@START S . pet ==> +NC<\"animals.txt\"> .".parse::<Grammar>().is_err());
    // longer rules aren't part of closure, so they can't loop
    assert!("@START S . a ==> b, +a . b ==> +a .".parse::<Grammar>().is_ok());
  }

  #[test]
  fn test_display_reparses() {
    let g: Grammar = SRC.parse().unwrap();
    let again: Grammar = g.to_string().parse().unwrap();
    assert_eq!(again.rules().count(), g.rules().count());
    assert_eq!(again.priority("np"), g.priority("np"));
    assert!(again.is_only_top("punct"));
  }
}
