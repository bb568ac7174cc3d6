//! Path pattern matching.
//!
//! A pattern is made of literal text, `*` wildcards and `{name}`
//! placeholders. `*` keeps shell-glob semantics and matches any run of
//! characters, `/` included; `{name}` matches a single path segment and
//! stops at the next `/`.

/// True when the pattern contains a wildcard or a parameter placeholder.
pub fn is_pattern(pattern: &str) -> bool {
    pattern.contains('*') || (pattern.contains('{') && pattern.contains('}'))
}

/// Matches a path against a pattern. Exact string equality always matches;
/// otherwise the pattern must contain wildcards or placeholders.
pub fn matches(pattern: &str, path: &str) -> bool {
    if pattern == path {
        return true;
    }
    if !is_pattern(pattern) {
        return false;
    }
    match_tokens(&tokenize(pattern), path)
}

/// Extracts the value of `{name}` from a matched path.
///
/// The literal prefix before the placeholder locates the same offset in the
/// actual path; the value runs to the next `/` or the end of the path. Each
/// call resolves one parameter independently by re-deriving its own prefix
/// offset.
pub fn path_param(pattern: &str, path: &str, name: &str) -> Option<String> {
    let marker = format!("{{{name}}}");
    let prefix_len = pattern.find(&marker)?;
    if prefix_len > path.len() || !path.is_char_boundary(prefix_len) {
        return None;
    }

    let rest = &path[prefix_len..];
    let end = rest.find('/').unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Literal(&'a str),
    Star,
    Param,
}

fn tokenize(pattern: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = pattern;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('*') {
            tokens.push(Token::Star);
            rest = stripped;
            continue;
        }
        if rest.starts_with('{') {
            if let Some(end) = rest.find('}') {
                tokens.push(Token::Param);
                rest = &rest[end + 1..];
                continue;
            }
            // unterminated '{' stays literal
        }
        let end = rest[1..].find(['*', '{']).map(|i| i + 1).unwrap_or(rest.len());
        tokens.push(Token::Literal(&rest[..end]));
        rest = &rest[end..];
    }
    tokens
}

fn match_tokens(tokens: &[Token<'_>], path: &str) -> bool {
    let Some((first, rest)) = tokens.split_first() else {
        return path.is_empty();
    };

    match first {
        Token::Literal(literal) => match path.strip_prefix(literal) {
            Some(remainder) => match_tokens(rest, remainder),
            None => false,
        },
        Token::Star => (0..=path.len())
            .rev()
            .filter(|i| path.is_char_boundary(*i))
            .any(|i| match_tokens(rest, &path[i..])),
        Token::Param => {
            let segment_end = path.find('/').unwrap_or(path.len());
            (0..=segment_end)
                .rev()
                .filter(|i| path.is_char_boundary(*i))
                .any(|i| match_tokens(rest, &path[i..]))
        }
    }
}
