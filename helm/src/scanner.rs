//! Lexical scanner: turns HelmScript source text into a lazy, position-
//! tracked token sequence.
//!
//! Matching is longest-match-wins over a fixed pattern table; equal lengths
//! are resolved by [`TokenKind::priority`] (lower wins), which is what makes
//! `on` a keyword rather than an identifier.  Trivia (whitespace, comments,
//! line directives) is consumed silently and attached to the next real
//! token.  Input that matches nothing becomes a one-character
//! [`TokenKind::Unknown`] token, so the cursor always advances and a scan
//! loop can never stall.
//!
//! Callers may pass a candidate subset to [`Scanner::scan`] /
//! [`Scanner::look_ahead`] and only those kinds (plus the skip set) are
//! probed; an empty slice means the whole table.  The full-table path runs
//! one anchored leftmost-longest Aho–Corasick pass over every literal
//! spelling instead of probing them one by one; regex-classed kinds are
//! probed individually on both paths.

use std::collections::HashMap;
use std::sync::OnceLock;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::Regex;

use crate::token::{Token, TokenKind};
use crate::value::Value;

// ── Pattern table ─────────────────────────────────────────────────────────────

enum Matcher {
    /// Fixed spellings, ASCII-case-insensitive.
    Literals(&'static [&'static str]),
    /// Anchored regex (`\A…`) applied to the remaining input.
    Pattern(Regex),
    /// Matches the empty string at end of input, nowhere else.
    EndOfInput,
}

struct KindSpec {
    kind: TokenKind,
    matcher: Matcher,
}

/// Immutable kind → matcher mapping shared by every scanner in the process.
struct PatternTable {
    specs: Vec<KindSpec>,
    index: HashMap<TokenKind, usize>,
    skip: Vec<TokenKind>,
    /// One automaton over every literal spelling in the table.  Patterns are
    /// inserted in table order, so the automaton's equal-length tie-break
    /// (earliest pattern) agrees with the priority tie-break.
    literal_ac: AhoCorasick,
    literal_kinds: Vec<TokenKind>,
}

fn table() -> &'static PatternTable {
    static TABLE: OnceLock<PatternTable> = OnceLock::new();
    TABLE.get_or_init(PatternTable::build)
}

impl PatternTable {
    fn build() -> PatternTable {
        use TokenKind::*;

        fn re(src: &str) -> Matcher {
            Matcher::Pattern(Regex::new(src).expect("token pattern must compile"))
        }
        fn lit(alts: &'static [&'static str]) -> Matcher {
            Matcher::Literals(alts)
        }

        // Declaration order is resolution order: priorities ascend with the
        // list, and every tie-break below depends on it.
        let entries: Vec<(TokenKind, Matcher)> = vec![
            (PlusMinus, lit(&["+", "-"])),
            (Mult, lit(&["*"])),
            (Div, lit(&["/"])),
            (Power, lit(&["^"])),
            (E, lit(&["e"])),
            (And, lit(&["and"])),
            (Or, lit(&["or"])),
            (TrueFalse, lit(&["true", "false"])),
            (Comparator, lit(&[">=", "<=", "=", ">", "<"])),
            (Set, lit(&["set"])),
            (To, lit(&["to"])),
            (If, lit(&["if"])),
            (Until, lit(&["until"])),
            (Lock, lit(&["lock"])),
            (Unlock, lit(&["unlock"])),
            (Print, lit(&["print"])),
            (At, lit(&["at"])),
            (On, lit(&["on"])),
            (Toggle, lit(&["toggle"])),
            (Wait, lit(&["wait"])),
            (When, lit(&["when"])),
            (Then, lit(&["then"])),
            (Off, lit(&["off"])),
            (Stage, lit(&["stage"])),
            (ClearScreen, lit(&["clearscreen"])),
            (Add, lit(&["add"])),
            (Remove, lit(&["remove"])),
            (Log, lit(&["log"])),
            (Break, lit(&["break"])),
            (Declare, lit(&["declare"])),
            (Parameter, lit(&["parameter"])),
            (Switch, lit(&["switch"])),
            (Copy, lit(&["copy"])),
            (From, lit(&["from"])),
            (Rename, lit(&["rename"])),
            (Volume, lit(&["volume"])),
            (File, lit(&["file"])),
            (Delete, lit(&["delete"])),
            (Edit, lit(&["edit"])),
            (Run, lit(&["run"])),
            (List, lit(&["list"])),
            (Reboot, lit(&["reboot"])),
            (Shutdown, lit(&["shutdown"])),
            (BracketOpen, lit(&["("])),
            (BracketClose, lit(&[")"])),
            (CurlyOpen, lit(&["{"])),
            (CurlyClose, lit(&["}"])),
            (Comma, lit(&[","])),
            (Identifier, re(r"\A(?i:[a-z_][a-z0-9_]*)")),
            (VarIdentifier, re(r"\A(?i:[a-z_](?:[a-z0-9_:]*[a-z0-9_])?)")),
            (Integer, re(r"\A[0-9]+")),
            (Double, re(r"\A[0-9]*\.[0-9]+")),
            (Str, re(r#"\A@?"(?:""|[^"])*""#)),
            (EndOfInstruction, lit(&["."])),
            (EndOfFile, Matcher::EndOfInput),
            // Must outrank CommentLine: both match a whole `//…` line.
            (
                LineDirective,
                re(r"\A//@[ \t]*(?P<file>[^:\n]+):(?P<line>[0-9]+)[^\n]*\n?"),
            ),
            (Whitespace, re(r"\A\s+")),
            (CommentLine, re(r"\A//[^\n]*\n?")),
        ];

        let specs: Vec<KindSpec> = entries
            .into_iter()
            .map(|(kind, matcher)| KindSpec { kind, matcher })
            .collect();

        let index = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.kind, i))
            .collect();

        let skip = TokenKind::ALL
            .iter()
            .copied()
            .filter(|kind| kind.is_skip())
            .collect();

        let mut literal_pats: Vec<&'static str> = Vec::new();
        let mut literal_kinds = Vec::new();
        for spec in &specs {
            if let Matcher::Literals(alts) = &spec.matcher {
                for &alt in alts.iter() {
                    literal_pats.push(alt);
                    literal_kinds.push(spec.kind);
                }
            }
        }
        let literal_ac = AhoCorasickBuilder::new()
            .anchored(true)
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&literal_pats);

        PatternTable {
            specs,
            index,
            skip,
            literal_ac,
            literal_kinds,
        }
    }

    fn spec(&self, kind: TokenKind) -> Option<&KindSpec> {
        self.index.get(&kind).map(|&i| &self.specs[i])
    }

    /// Best match at the start of `rest`: longest, then lowest priority.
    /// `None` means nothing matched (the caller synthesizes a fallback).
    fn match_at(&self, rest: &str, candidates: &[TokenKind]) -> Option<(TokenKind, usize)> {
        if candidates.is_empty() {
            self.match_full(rest)
        } else {
            self.match_subset(rest, candidates)
        }
    }

    fn match_full(&self, rest: &str) -> Option<(TokenKind, usize)> {
        if rest.is_empty() {
            return Some((TokenKind::EndOfFile, 0));
        }
        let mut best: Option<(TokenKind, usize)> = None;
        if let Some(m) = self.literal_ac.find(rest) {
            consider(&mut best, self.literal_kinds[m.pattern()], m.end());
        }
        for spec in &self.specs {
            if let Matcher::Pattern(re) = &spec.matcher {
                if let Some(m) = re.find(rest) {
                    consider(&mut best, spec.kind, m.end());
                }
            }
        }
        best
    }

    fn match_subset(&self, rest: &str, candidates: &[TokenKind]) -> Option<(TokenKind, usize)> {
        let mut best: Option<(TokenKind, usize)> = None;
        for &kind in candidates.iter().chain(self.skip.iter()) {
            // Kinds with no matcher (Program, Instruction, Unknown) are
            // legal to request and simply never match.
            let Some(spec) = self.spec(kind) else { continue };
            match &spec.matcher {
                Matcher::Literals(alts) => {
                    for &alt in alts.iter() {
                        if is_ci_prefix(rest, alt) {
                            consider(&mut best, kind, alt.len());
                        }
                    }
                }
                Matcher::Pattern(re) => {
                    if let Some(m) = re.find(rest) {
                        consider(&mut best, kind, m.end());
                    }
                }
                Matcher::EndOfInput => {
                    if rest.is_empty() {
                        consider(&mut best, kind, 0);
                    }
                }
            }
        }
        best
    }

    /// File/line override captured from a matched line directive.
    fn directive_override(&self, text: &str) -> Option<(String, usize)> {
        let spec = self.spec(TokenKind::LineDirective)?;
        let Matcher::Pattern(re) = &spec.matcher else {
            return None;
        };
        let caps = re.captures(text)?;
        let file = caps.name("file")?.as_str().trim().to_owned();
        let line = caps.name("line")?.as_str().parse().ok()?;
        Some((file, line))
    }
}

fn consider(best: &mut Option<(TokenKind, usize)>, kind: TokenKind, len: usize) {
    let replace = match *best {
        None => true,
        Some((bk, bl)) => len > bl || (len == bl && kind.priority() < bk.priority()),
    };
    if replace {
        *best = Some((kind, len));
    }
}

/// Case-insensitive prefix test on bytes.  All literals are ASCII, so a
/// matched length of `lit.len()` bytes always lands on a char boundary.
fn is_ci_prefix(rest: &str, lit: &str) -> bool {
    let r = rest.as_bytes();
    let l = lit.as_bytes();
    r.len() >= l.len() && r[..l.len()].eq_ignore_ascii_case(l)
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

/// Literal payload for value-bearing kinds, decoded at scan time.
fn literal_value(kind: TokenKind, text: &str) -> Option<Value> {
    match kind {
        TokenKind::Integer => text.parse::<i64>().ok().map(Value::Int),
        TokenKind::Double => text.parse::<f64>().ok().map(Value::Float),
        TokenKind::TrueFalse => Some(Value::Bool(text.eq_ignore_ascii_case("true"))),
        TokenKind::Str => Some(Value::Str(unquote(text))),
        _ => None,
    }
}

/// Strip the optional `@` prefix and surrounding quotes, and collapse the
/// `""` escape.
fn unquote(text: &str) -> String {
    let body = text.strip_prefix('@').unwrap_or(text);
    let body = body.strip_prefix('"').unwrap_or(body);
    let body = body.strip_suffix('"').unwrap_or(body);
    body.replace("\"\"", "\"")
}

/// Render a line directive naming `file`, usable as a script preamble.
///
/// The directive grammar cannot carry ':' or a newline inside the file
/// name, so those characters are replaced before formatting.
pub fn directive_line(file: &str, line: usize) -> String {
    let mut clean: String = file
        .chars()
        .map(|c| if c == ':' || c == '\n' { '-' } else { c })
        .collect();
    if clean.is_empty() {
        clean.push('?');
    }
    format!("//@ {clean}:{line}\n")
}

// ── Scanner ───────────────────────────────────────────────────────────────────

/// One pass over one compilation unit.
///
/// Create a scanner per unit and discard it afterwards; it borrows the input
/// and owns the cursor and the single-token lookahead cache.  The cache
/// makes repeated peeks free: it is filled by the first
/// [`look_ahead`](Scanner::look_ahead) and handed out by
/// [`scan`](Scanner::scan), which is also the only operation that commits
/// the cursor.  The cached token is returned even if a later call passes a
/// different candidate list; callers that interleave candidate sets must
/// consume the peeked token first.
pub struct Scanner<'src> {
    input: &'src str,
    table: &'static PatternTable,
    file: String,
    line: usize,
    pos: usize,
    lookahead: Option<Token>,
}

impl<'src> Scanner<'src> {
    pub fn new(input: &'src str, file: impl Into<String>) -> Scanner<'src> {
        Scanner {
            input,
            table: table(),
            file: file.into(),
            line: 1,
            pos: 0,
            lookahead: None,
        }
    }

    /// Committed cursor position (byte offset).
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Peek the next token without consuming it.  Repeated calls return the
    /// identical cached token.
    pub fn look_ahead(&mut self, candidates: &[TokenKind]) -> &Token {
        if self.lookahead.is_none() {
            let tok = self.next_token(candidates);
            self.lookahead = Some(tok);
        }
        // Filled just above.
        self.lookahead.as_ref().unwrap()
    }

    /// Return the next token and advance past it, invalidating the cache.
    pub fn scan(&mut self, candidates: &[TokenKind]) -> Token {
        let tok = match self.lookahead.take() {
            Some(tok) => tok,
            None => self.next_token(candidates),
        };
        self.pos = tok.end;
        self.line = tok.line + count_newlines(&tok.text);
        self.file = tok.file.clone();
        tok
    }

    /// Resolve the next non-skip token from the committed cursor without
    /// touching scanner state.
    fn next_token(&self, candidates: &[TokenKind]) -> Token {
        let mut pos = self.pos;
        let mut line = self.line;
        let mut file = self.file.clone();
        let mut skipped = Vec::new();

        loop {
            let rest = &self.input[pos..];
            let (kind, len) = match self.table.match_at(rest, candidates) {
                Some(hit) => hit,
                None if rest.is_empty() => (TokenKind::EndOfFile, 0),
                None => {
                    // Nothing matched: take the next char so the cursor
                    // still advances.
                    let ch_len = rest.chars().next().map_or(1, char::len_utf8);
                    (TokenKind::Unknown, ch_len)
                }
            };
            debug_assert!(len > 0 || kind == TokenKind::EndOfFile);

            let text = &self.input[pos..pos + len];
            let mut tok = Token {
                kind,
                text: text.to_owned(),
                start: pos,
                end: pos + len,
                file: file.clone(),
                line,
                column: self.column_at(pos),
                skipped: Vec::new(),
                value: literal_value(kind, text),
            };

            if kind.is_skip() {
                pos = tok.end;
                line += count_newlines(text);
                if kind == TokenKind::LineDirective {
                    if let Some((f, l)) = self.table.directive_override(text) {
                        file = f;
                        line = l;
                    }
                }
                skipped.push(tok);
                continue;
            }

            tok.skipped = skipped;
            return tok;
        }
    }

    /// Physical column: byte offset from the most recent newline, 1-based.
    fn column_at(&self, pos: usize) -> usize {
        match self.input[..pos].rfind('\n') {
            Some(nl) => pos - nl,
            None => pos + 1,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
