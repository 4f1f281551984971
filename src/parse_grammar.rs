//! Simple recursive-descent parsing of grammar rule files

use regex::Regex;

use crate::rules::Rule;
use crate::Err;

/// A line starting with `@`, declaring properties of a list of symbols
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
  Start(String),
  Prior(Vec<String>),
  Hidden(Vec<String>),
  Flat(Vec<String>),
  OnlyTop(Vec<String>),
  NoTop(Vec<String>),
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Err>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// The start of `s`, for error messages
fn excerpt(s: &str) -> &str {
  let line = s.lines().next().unwrap_or("");
  match line.char_indices().nth(32) {
    Some((idx, _)) => &line[..idx],
    None => line,
  }
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => {
      let (_, rest) = s.split_at(m.end());
      (Some(m.as_str()), rest)
    }
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(format!("couldn't match {} at {:?}", re, excerpt(s)).into())
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Try to consume a char, failing if it doesn't match
fn needed_char(c: char, s: &str) -> ParseResult<'_, char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(format!("expected '{}' at {:?}", c, excerpt(s)).into())
  }
}

/// Skips any run of whitespace and // comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"^(\s|//[^\n]*)+");
  optional_re(&WHITESPACE_OR_COMMENT, s).1
}

/// Tries to parse a name made of letters, numbers, -, _ and the * wildcard
fn parse_name(s: &str) -> ParseResult<'_, &str> {
  regex_static!(NAME, r"^[a-zA-Z0-9\-_\*]+");
  needed_re(&NAME, s).map_err(|err| format!("name: {}", err).into())
}

/// Parses an optional `(form)` or `<lemma>` qualifier, which may quote a word-class file name
fn parse_qualifier(s: &str) -> ParseResult<'_, Option<&str>> {
  regex_static!(FORM, r#"^\([^()<>\s]+\)"#);
  regex_static!(LEMMA, r#"^<[^()<>\s]+>"#);

  let re: &'static Regex = if s.starts_with('(') {
    &FORM
  } else if s.starts_with('<') {
    &LEMMA
  } else {
    return Ok((None, s));
  };

  let (q, rest) = needed_re(re, s).map_err(|_| -> Err {
    format!("unterminated or empty qualifier at {:?}", excerpt(s)).into()
  })?;

  let inner = &q[1..q.len() - 1];
  if inner.contains('"') && !(inner.len() >= 3 && inner.starts_with('"') && inner.ends_with('"')) {
    return Err(format!("badly quoted file name in qualifier {}", q).into());
  }
  Ok((Some(q), rest))
}

/// A name followed by an optional qualifier: `NC`, `NC(dog)`, `NC*<"animals.txt">`
fn parse_symbol(s: &str) -> ParseResult<'_, String> {
  let (name, s) = parse_name(s)?;
  let (qualifier, s) = parse_qualifier(s)?;
  Ok((format!("{}{}", name, qualifier.unwrap_or("")), s))
}

/// Comma separated symbols, one of them optionally marked with a leading + as the governor
fn parse_alternative(s: &str) -> ParseResult<'_, (Vec<String>, Option<usize>)> {
  let mut symbols = Vec::new();
  let mut governor = None;
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    let (plus, s) = optional_char('+', rem);
    if plus.is_some() {
      if governor.is_some() {
        return Err(format!("more than one governor in alternative at {:?}", excerpt(rem)).into());
      }
      governor = Some(symbols.len());
    }
    let s = skip_whitespace(s);
    let (symbol, s) =
      parse_symbol(s).map_err(|e| -> Err { format!("rule symbol: {}", e).into() })?;
    symbols.push(symbol);

    let s = skip_whitespace(s);
    let (comma, s) = optional_char(',', s);
    rem = s;
    if comma.is_none() {
      return Ok(((symbols, governor), rem));
    }
  }
}

/// `head ==> alternative | alternative ... .`, one Rule per alternative
fn parse_rule(s: &str) -> ParseResult<'_, Vec<Rule>> {
  #![allow(clippy::trivial_regex)]
  regex_static!(ARROW, "^==>");

  let (head, s) = parse_name(s).map_err(|e| -> Err { format!("rule head: {}", e).into() })?;
  let s = skip_whitespace(s);
  let (_, s) = needed_re(&ARROW, s).map_err(|e| -> Err { format!("rule arrow: {}", e).into() })?;

  let mut rules = Vec::new();
  let mut rem = s;
  loop {
    let trimmed = skip_whitespace(rem);
    if trimmed.starts_with('|') || trimmed.starts_with('.') {
      return Err(format!("empty alternative in rule for {} at {:?}", head, excerpt(trimmed)).into());
    }

    let ((right, governor), s) = parse_alternative(rem)?;
    rules.push(Rule::new(head, right, governor));

    let s = skip_whitespace(s);
    if let (Some(_), s) = optional_char('|', s) {
      rem = s;
      continue;
    }
    let (_, s) = needed_char('.', s).map_err(|e| -> Err { format!("rule end: {}", e).into() })?;
    return Ok((rules, s));
  }
}

/// `@NAME symbol symbol ... .`
fn parse_directive(s: &str) -> ParseResult<'_, Directive> {
  let (_, s) = needed_char('@', s)?;
  let (name, s) = parse_name(s).map_err(|e| -> Err { format!("directive: {}", e).into() })?;

  let mut symbols = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char('.', rem) {
      rem = s;
      break;
    }
    if rem.is_empty() {
      return Err(format!("unterminated @{} directive", name).into());
    }
    let (symbol, s) = parse_symbol(rem).map_err(|e| -> Err { format!("@{}: {}", name, e).into() })?;
    symbols.push(symbol);
    rem = s;
  }

  let directive = match name {
    "START" => {
      if symbols.len() != 1 {
        return Err(format!("@START takes exactly one symbol, got {}", symbols.len()).into());
      }
      Directive::Start(symbols.remove(0))
    }
    "PRIOR" => Directive::Prior(symbols),
    "HIDDEN" => Directive::Hidden(symbols),
    "FLAT" => Directive::Flat(symbols),
    "ONLYTOP" => Directive::OnlyTop(symbols),
    "NOTOP" => Directive::NoTop(symbols),
    other => return Err(format!("unknown directive @{}", other).into()),
  };

  Ok((directive, rem))
}

/// Parses a grammar source into its rules and directives, in file order
pub fn parse(s: &str) -> Result<(Vec<Rule>, Vec<Directive>), Err> {
  let mut rules = Vec::new();
  let mut directives = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Ok((rules, directives));
    }
    if rem.starts_with('@') {
      let (directive, s) = parse_directive(rem)?;
      directives.push(directive);
      rem = s;
    } else {
      let (mut alternatives, s) = parse_rule(rem)?;
      rules.append(&mut alternatives);
      rem = s;
    }
  }
}
