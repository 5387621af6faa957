use crate::recovery::scanner::{self, Class, Scanner, Segment};
use once_cell::sync::Lazy;
use regex::Regex;

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*").unwrap());
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)").unwrap());
static DUPLICATE_COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*,)+").unwrap());
static LEADING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\[{])(\s*),").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());

pub const SIMPLIFIED_ARRAY: &str = "[]";

pub fn strip_fences(text: &str) -> String {
    FENCE.replace_all(text, "").trim().to_string()
}

pub fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

pub fn from_first_brace(text: &str) -> &str {
    text.find('{').map_or(text, |start| &text[start..])
}

// Structural rewrites touch code segments only; quoted text is kept verbatim.
pub fn repair(text: &str) -> String {
    let normalized = normalize_quotes(text);
    scanner::map_code(&normalized, |code| {
        let code = strip_ellipsis(code);
        let code = BARE_KEY.replace_all(&code, "${1}\"${2}\"${3}");
        let code = collapse_commas(&code);
        TRAILING_COMMA.replace_all(&code, "${1}").into_owned()
    })
}

pub fn normalize_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in scanner::segments(text) {
        match segment {
            Segment::Literal(lit) if lit.starts_with('\'') => out.push_str(&requote(lit)),
            Segment::Literal(s) | Segment::Code(s) => out.push_str(s),
        }
    }
    out
}

fn requote(lit: &str) -> String {
    let inner = &lit[1..];
    let (inner, closed) = match inner.strip_suffix('\'') {
        Some(body) if !body.ends_with('\\') || body.ends_with("\\\\") => (body, true),
        _ => (inner, false),
    };

    let mut out = String::with_capacity(lit.len() + 2);
    out.push('"');
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push_str("\\\\"),
            },
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    if closed {
        out.push('"');
    }
    out
}

fn strip_ellipsis(code: &str) -> String {
    code.replace("...", "").replace('\u{2026}', "")
}

fn collapse_commas(code: &str) -> String {
    let code = DUPLICATE_COMMAS.replace_all(code, ",");
    LEADING_COMMA.replace_all(&code, "${1}${2}").into_owned()
}

/// Re-quotes the items of every innermost array: `[Python, "SQL", 3]` becomes
/// `["Python", "SQL", 3]`.
pub fn repair_arrays(text: &str) -> String {
    let mut leaves = leaf_arrays(text);
    leaves.sort_unstable();

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for (start, end) in leaves {
        out.push_str(&text[copied..start]);
        out.push_str(&rebuild_array(&text[start + 1..end]));
        copied = end + 1;
    }
    out.push_str(&text[copied..]);
    out
}

fn leaf_arrays(text: &str) -> Vec<(usize, usize)> {
    struct Open {
        delimiter: char,
        start: usize,
        leaf: bool,
    }

    let mut out = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut scanner = Scanner::new();

    for (i, c) in text.char_indices() {
        if scanner.step(c) != Class::Code {
            continue;
        }
        match c {
            '[' | '{' => {
                if let Some(parent) = stack.last_mut() {
                    parent.leaf = false;
                }
                stack.push(Open {
                    delimiter: c,
                    start: i,
                    leaf: true,
                });
            }
            ']' | '}' => {
                let expected = if c == ']' { '[' } else { '{' };
                if stack.last().map(|open| open.delimiter) != Some(expected) {
                    continue;
                }
                if let Some(open) = stack.pop() {
                    if open.delimiter == '[' && open.leaf {
                        out.push((open.start, i));
                    }
                }
            }
            _ => {}
        }
    }
    out
}

fn rebuild_array(inner: &str) -> String {
    let items: Vec<String> = scanner::split_top_level(inner, ',')
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(requote_item)
        .collect();
    format!("[{}]", items.join(", "))
}

fn requote_item(item: &str) -> String {
    if serde_json::from_str::<serde_json::Value>(item).is_ok() {
        return item.to_string();
    }
    let bare = item.trim_matches(|c| c == '"' || c == '\'').trim();
    serde_json::Value::String(bare.to_string()).to_string()
}

pub fn simplify_arrays(text: &str) -> String {
    let mut outermost: Vec<(usize, usize)> = scanner::array_spans(text)
        .into_iter()
        .filter(|span| span.depth == 1)
        .filter_map(|span| span.end.map(|end| (span.start, end)))
        .collect();
    outermost.sort_by_key(|&(start, _)| std::cmp::Reverse(start));

    let mut out = text.to_string();
    for (start, end) in outermost {
        out.replace_range(start..=end, SIMPLIFIED_ARRAY);
    }
    out
}
