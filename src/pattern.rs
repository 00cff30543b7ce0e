//! Minimal `*` / `?` wildcard matching for file enumeration.

/// Match `text` against `pattern` where `*` matches any run of characters
/// (including none) and `?` matches exactly one.
///
/// ```
/// use zipfence::pattern::wildcard_match;
///
/// assert!(wildcard_match("*.json", "app.json"));
/// assert!(wildcard_match("log?.txt", "log1.txt"));
/// assert!(!wildcard_match("*.json", "app.yaml"));
/// ```
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    // Iterative backtracking over the most recent star.
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
