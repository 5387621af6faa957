//! String-literal aware scanning of near-JSON text.
//!
//! `'` opens a literal only where a token can start, so the apostrophe in an unquoted `Can't`
//! stays code.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    InString(char),
    InEscape(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Code,
    Open,
    Inside,
    Close,
}

#[derive(Debug, Clone)]
pub struct Scanner {
    state: State,
    last_code: Option<char>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            state: State::Scanning,
            last_code: None,
        }
    }

    pub fn step(&mut self, c: char) -> Class {
        match self.state {
            State::Scanning => {
                if c == '"' || (c == '\'' && self.token_can_start()) {
                    self.state = State::InString(c);
                    Class::Open
                } else {
                    if !c.is_whitespace() {
                        self.last_code = Some(c);
                    }
                    Class::Code
                }
            }
            State::InString(quote) => {
                if c == '\\' {
                    self.state = State::InEscape(quote);
                    Class::Inside
                } else if c == quote {
                    self.state = State::Scanning;
                    self.last_code = Some(quote);
                    Class::Close
                } else {
                    Class::Inside
                }
            }
            State::InEscape(quote) => {
                self.state = State::InString(quote);
                Class::Inside
            }
        }
    }

    pub fn in_literal(&self) -> bool {
        !matches!(self.state, State::Scanning)
    }

    fn token_can_start(&self) -> bool {
        matches!(self.last_code, None | Some('{' | '[' | ',' | ':'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Code(&'a str),
    /// A quoted literal including its delimiters. May be unterminated at end of input.
    Literal(&'a str),
}

pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut scanner = Scanner::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match scanner.step(c) {
            Class::Open => {
                if i > start {
                    out.push(Segment::Code(&text[start..i]));
                }
                start = i;
            }
            Class::Close => {
                let end = i + c.len_utf8();
                out.push(Segment::Literal(&text[start..end]));
                start = end;
            }
            Class::Code | Class::Inside => {}
        }
    }

    if start < text.len() {
        let rest = &text[start..];
        if scanner.in_literal() {
            out.push(Segment::Literal(rest));
        } else {
            out.push(Segment::Code(rest));
        }
    }
    out
}

pub fn map_code(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Code(code) => out.push_str(&f(code)),
            Segment::Literal(lit) => out.push_str(lit),
        }
    }
    out
}

/// A bracketed region. `start` and `end` are byte offsets of the delimiters themselves; `end` is
/// `None` when the region is never closed. `depth` is 1 for outermost regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: Option<usize>,
    pub depth: usize,
}

impl Span {
    pub fn contains(&self, offset: usize) -> bool {
        self.start < offset && self.end.map_or(true, |end| end > offset)
    }

    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.end.map(|end| &text[self.start..=end])
    }
}

// Stray closers are ignored.
pub fn spans(text: &str, open: char, close: char) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut scanner = Scanner::new();

    for (i, c) in text.char_indices() {
        if scanner.step(c) != Class::Code {
            continue;
        }
        if c == open {
            stack.push(out.len());
            out.push(Span {
                start: i,
                end: None,
                depth: stack.len(),
            });
        } else if c == close {
            if let Some(idx) = stack.pop() {
                out[idx].end = Some(i);
            }
        }
    }
    out
}

pub fn object_spans(text: &str) -> Vec<Span> {
    spans(text, '{', '}')
}

pub fn array_spans(text: &str) -> Vec<Span> {
    spans(text, '[', ']')
}

pub fn enclosing(spans: &[Span], offset: usize) -> Option<Span> {
    spans
        .iter()
        .filter(|span| span.contains(offset))
        .max_by_key(|span| span.depth)
        .copied()
}

/// Splits on `sep` where it occurs outside literals and outside nested brackets/braces.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut scanner = Scanner::new();
    let mut nesting: usize = 0;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if scanner.step(c) != Class::Code {
            continue;
        }
        match c {
            '[' | '{' => nesting += 1,
            ']' | '}' => nesting = nesting.saturating_sub(1),
            _ if c == sep && nesting == 0 => {
                out.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_keep_escaped_quotes_inside_literals() {
        let text = r#"{"a": "say \"hi\"", 'b': 1}"#;
        let segs = segments(text);
        assert_eq!(
            segs,
            vec![
                Segment::Code("{"),
                Segment::Literal(r#""a""#),
                Segment::Code(": "),
                Segment::Literal(r#""say \"hi\"""#),
                Segment::Code(", "),
                Segment::Literal("'b'"),
                Segment::Code(": 1}"),
            ]
        );
    }

    #[test]
    fn apostrophes_inside_double_quotes_do_not_open_literals() {
        let segs = segments(r#"["it's", x]"#);
        assert_eq!(segs[1], Segment::Literal(r#""it's""#));
        assert_eq!(segs[2], Segment::Code(", x]"));
    }

    #[test]
    fn apostrophes_inside_bare_words_stay_code() {
        let text = "[Can't stop, 'quoted', Master's degree]";
        let segs = segments(text);
        assert_eq!(
            segs,
            vec![
                Segment::Code("[Can't stop, "),
                Segment::Literal("'quoted'"),
                Segment::Code(", Master's degree]"),
            ]
        );
        assert_eq!(array_spans(text)[0].end, Some(text.len() - 1));
    }

    #[test]
    fn unterminated_literal_runs_to_end() {
        let segs = segments(r#"{"a": "trunc"#);
        assert_eq!(segs.last(), Some(&Segment::Literal(r#""trunc"#)));
    }

    #[test]
    fn spans_ignore_braces_in_literals() {
        let text = r#"{"a": "}{", "b": {"c": 1}}"#;
        let found = object_spans(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].start, 0);
        assert_eq!(found[0].end, Some(text.len() - 1));
        assert_eq!(found[0].depth, 1);
        assert_eq!(found[1].depth, 2);
        assert_eq!(found[1].slice(text), Some(r#"{"c": 1}"#));
    }

    #[test]
    fn unclosed_spans_have_no_end() {
        let text = r#"[{"a": 1}, {"b": {"c": 2}"#;
        let found = object_spans(text);
        assert_eq!(found.len(), 3);
        assert!(found[0].end.is_some());
        assert!(found[1].end.is_none());
        assert!(found[2].end.is_some());
    }

    #[test]
    fn enclosing_picks_innermost() {
        let text = r#"{"x": {"title": "A"}}"#;
        let found = object_spans(text);
        let offset = text.find("title").unwrap();
        assert_eq!(enclosing(&found, offset).map(|s| s.depth), Some(2));
        assert_eq!(enclosing(&found, 0), None);
    }

    #[test]
    fn split_respects_literals_and_nesting() {
        let parts = split_top_level(r#""a, b", [1, 2], {"k": "v,w"}, plain"#, ',');
        assert_eq!(
            parts,
            vec![r#""a, b""#, " [1, 2]", r#" {"k": "v,w"}"#, " plain"]
        );
    }

    #[test]
    fn map_code_leaves_literals_untouched() {
        let out = map_code(r#"{a: "a: b"}"#, |code| code.replace('a', "z"));
        assert_eq!(out, r#"{z: "a: b"}"#);
    }
}
