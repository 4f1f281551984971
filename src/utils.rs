use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Returns the byte index of the first char of `s` that appears in `chars`
///
/// ```
/// assert_eq!(shallowchart::utils::multi_index("NC(dog)", "(<"), Some(2));
/// assert_eq!(shallowchart::utils::multi_index("NC<dog>", "(<"), Some(2));
/// assert_eq!(shallowchart::utils::multi_index("NC", "(<"), None);
/// ```
pub fn multi_index(s: &str, chars: &str) -> Option<usize> {
  s.char_indices()
    .find(|(_, c)| chars.contains(*c))
    .map(|(idx, _)| idx)
}
