//! Grammar symbol shapes and the matcher that decides whether a chart edge
//! satisfies a rule's expected symbol.
//!
//! Symbols are plain tags (`NC`), tags qualified by a word form (`NC(dog)`) or
//! lemma (`NC<dog>`), wildcard patterns (`NC*`, `V*<be>`), or patterns whose
//! qualifier names a word-class file (`NC*<"animals.txt">`).

use crate::grammar::Grammar;
use crate::utils::multi_index;

/// Characters that open a form or lemma qualifier
pub const QUALIFIER_OPENERS: &str = "(<";

/// The surface shape of a symbol, from most to least specific. Word-class
/// qualifiers only appear on patterns, so they rank as wildcards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Shape {
  Form,
  Lemma,
  Plain,
  Wildcard,
}

impl Shape {
  pub fn of(symbol: &str) -> Self {
    let (_, qualifier) = split_qualifier(symbol);
    if is_wildcard(symbol) {
      Self::Wildcard
    } else if qualifier.starts_with('(') {
      Self::Form
    } else if qualifier.starts_with('<') {
      Self::Lemma
    } else {
      Self::Plain
    }
  }

  pub fn specificity(self) -> i32 {
    self as i32
  }
}

/// Splits `NC(dog)` into `("NC", "(dog)")`. Unqualified symbols get an empty qualifier.
pub fn split_qualifier(symbol: &str) -> (&str, &str) {
  match multi_index(symbol, QUALIFIER_OPENERS) {
    Some(idx) => symbol.split_at(idx),
    None => (symbol, ""),
  }
}

pub fn is_wildcard(symbol: &str) -> bool {
  symbol.contains('*')
}

pub fn is_file_qualifier(qualifier: &str) -> bool {
  qualifier.contains('"')
}

/// Strips the brackets (and quotes, for file qualifiers) off a qualifier,
/// returning the opening bracket and the inner text
pub fn qualifier_body(qualifier: &str) -> Option<(char, &str)> {
  let open = qualifier.chars().next()?;
  let close = match open {
    '(' => ')',
    '<' => '>',
    _ => return None,
  };
  let inner = qualifier[open.len_utf8()..].strip_suffix(close)?;
  Some((open, inner.trim_matches('"')))
}

/// Decides whether a completed edge headed by `found` can fill a slot that
/// expects `searched`.
///
/// Exact equality always matches. Otherwise `searched` must be a wildcard
/// pattern: `found` has to start with the text before the `*`, and then
/// either both qualifiers are identical (so `NC*` only matches unqualified
/// tags and `NC*(dog)` only tags qualified by that form), or, when the
/// pattern's qualifier is quoted, `found`'s qualifier must be a member of the
/// named word class.
pub fn check_match(g: &Grammar, searched: &str, found: &str) -> bool {
  if searched == found {
    return true;
  }

  let star = match searched.find('*') {
    Some(idx) => idx,
    None => return false,
  };

  if !found.starts_with(&searched[..star]) {
    return false;
  }

  let (_, found_qualifier) = split_qualifier(found);
  let (_, pattern_qualifier) = split_qualifier(searched);

  if is_file_qualifier(pattern_qualifier) {
    g.in_file_map(found_qualifier, pattern_qualifier)
  } else {
    found_qualifier == pattern_qualifier
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn grammar() -> Grammar {
    let g: Grammar = r#"
      @START S .
      S ==> +np .
      np ==> +NC*<"animals.txt"> .
    "#
    .parse()
    .unwrap();
    g.with_word_class("animals.txt", vec!["dog", "cat"])
  }

  #[test]
  fn test_split_qualifier() {
    assert_eq!(split_qualifier("NC(dog)"), ("NC", "(dog)"));
    assert_eq!(split_qualifier("NC<dog>"), ("NC", "<dog>"));
    assert_eq!(split_qualifier("NC"), ("NC", ""));
    assert_eq!(qualifier_body("<\"animals.txt\">"), Some(('<', "animals.txt")));
    assert_eq!(qualifier_body("(dog)"), Some(('(', "dog")));
    assert_eq!(qualifier_body("dog"), None);
  }

  #[test]
  fn test_shapes_order_specificity() {
    assert_eq!(Shape::of("NC(dog)"), Shape::Form);
    assert_eq!(Shape::of("NC<dog>"), Shape::Lemma);
    assert_eq!(Shape::of("NC*<\"animals.txt\">"), Shape::Wildcard);
    assert_eq!(Shape::of("NC"), Shape::Plain);
    assert_eq!(Shape::of("NC*"), Shape::Wildcard);
    assert!(Shape::Form.specificity() < Shape::Lemma.specificity());
    assert!(Shape::Lemma.specificity() < Shape::Plain.specificity());
  }

  #[test]
  fn test_match_is_reflexive() {
    let g = grammar();
    for s in ["NC", "NC(dog)", "NC<dog>", "NC*", "np", "NC*<\"animals.txt\">"] {
      assert!(check_match(&g, s, s), "{} should match itself", s);
    }
  }

  #[test]
  fn test_wildcard_prefix() {
    let g = grammar();
    assert!(check_match(&g, "NC*", "NCS"));
    assert!(check_match(&g, "NC*", "NC"));
    assert!(!check_match(&g, "NC*", "VB"));
    // the qualifier after the wildcard has to line up with the found symbol's
    assert!(!check_match(&g, "NC*", "NCS(dog)"));
    assert!(check_match(&g, "NC*(dog)", "NCS(dog)"));
    assert!(!check_match(&g, "NC*(dog)", "NCS(cat)"));
    assert!(check_match(&g, "NC*<dog>", "NC<dog>"));
    assert!(!check_match(&g, "NC*<dog>", "NC(dog)"));
    // no wildcard, no match unless equal
    assert!(!check_match(&g, "NC", "NCS"));
  }

  #[test]
  fn test_file_membership() {
    let g = grammar();
    let pattern = "NC*<\"animals.txt\">";
    assert!(check_match(&g, pattern, "NCS<dog>"));
    assert!(check_match(&g, pattern, "NC<cat>"));
    assert!(!check_match(&g, pattern, "NC<table>"));
    // bracket kinds must agree
    assert!(!check_match(&g, pattern, "NC(dog)"));
    assert!(!check_match(&g, pattern, "NC"));
  }

  #[test]
  fn test_match_has_no_hidden_state() {
    let g = grammar();
    let first = check_match(&g, "NC*<\"animals.txt\">", "NC<dog>");
    for _ in 0..3 {
      assert_eq!(check_match(&g, "NC*<\"animals.txt\">", "NC<dog>"), first);
    }
  }
}
