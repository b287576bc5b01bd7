//! Token model: the closed set of lexeme kinds and the classified lexeme
//! record the scanner produces.
//!
//! Every kind carries an explicit numeric [`priority`](TokenKind::priority)
//! used to break equal-length match ties (lower wins).  Priorities ascend in
//! declaration order with gaps of 10 so a new kind can be wedged between two
//! existing ones without renumbering the table.

use std::fmt;

use crate::value::Value;

// ── TokenKind ─────────────────────────────────────────────────────────────────

/// Every lexeme category HelmScript knows about.
///
/// `Program` and `Instruction` never come out of the scanner; parsers use
/// them as span-carrying grouping nodes via [`Token::update_range`].
/// `Unknown` is synthesized for input no pattern matches and `EndOfFile`
/// matches the empty string at end of input only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Grouping nodes.
    Program,
    Instruction,

    // Operators.
    PlusMinus,
    Mult,
    Div,
    Power,
    E,
    And,
    Or,
    TrueFalse,
    Comparator,

    // Keywords.
    Set,
    To,
    If,
    Until,
    Lock,
    Unlock,
    Print,
    At,
    On,
    Toggle,
    Wait,
    When,
    Then,
    Off,
    Stage,
    ClearScreen,
    Add,
    Remove,
    Log,
    Break,
    Declare,
    Parameter,
    Switch,
    Copy,
    From,
    Rename,
    Volume,
    File,
    Delete,
    Edit,
    Run,
    List,
    Reboot,
    Shutdown,

    // Punctuation.
    BracketOpen,
    BracketClose,
    CurlyOpen,
    CurlyClose,
    Comma,

    // Value-bearing terminals.  A plain name must resolve to `Identifier`,
    // so it is declared (and prioritized) ahead of `VarIdentifier`.
    Identifier,
    VarIdentifier,
    Integer,
    Double,
    Str,

    // Structure.
    EndOfInstruction,
    EndOfFile,

    // Trivia (the skip set).  `LineDirective` must outrank `CommentLine`:
    // both match a whole `//…` line, and the tie has to go to the directive.
    LineDirective,
    Whitespace,
    CommentLine,

    // Fallback, never pattern-matched.
    Unknown,
}

impl TokenKind {
    /// All kinds in declaration order.
    pub const ALL: &'static [TokenKind] = &[
        TokenKind::Program,
        TokenKind::Instruction,
        TokenKind::PlusMinus,
        TokenKind::Mult,
        TokenKind::Div,
        TokenKind::Power,
        TokenKind::E,
        TokenKind::And,
        TokenKind::Or,
        TokenKind::TrueFalse,
        TokenKind::Comparator,
        TokenKind::Set,
        TokenKind::To,
        TokenKind::If,
        TokenKind::Until,
        TokenKind::Lock,
        TokenKind::Unlock,
        TokenKind::Print,
        TokenKind::At,
        TokenKind::On,
        TokenKind::Toggle,
        TokenKind::Wait,
        TokenKind::When,
        TokenKind::Then,
        TokenKind::Off,
        TokenKind::Stage,
        TokenKind::ClearScreen,
        TokenKind::Add,
        TokenKind::Remove,
        TokenKind::Log,
        TokenKind::Break,
        TokenKind::Declare,
        TokenKind::Parameter,
        TokenKind::Switch,
        TokenKind::Copy,
        TokenKind::From,
        TokenKind::Rename,
        TokenKind::Volume,
        TokenKind::File,
        TokenKind::Delete,
        TokenKind::Edit,
        TokenKind::Run,
        TokenKind::List,
        TokenKind::Reboot,
        TokenKind::Shutdown,
        TokenKind::BracketOpen,
        TokenKind::BracketClose,
        TokenKind::CurlyOpen,
        TokenKind::CurlyClose,
        TokenKind::Comma,
        TokenKind::Identifier,
        TokenKind::VarIdentifier,
        TokenKind::Integer,
        TokenKind::Double,
        TokenKind::Str,
        TokenKind::EndOfInstruction,
        TokenKind::EndOfFile,
        TokenKind::LineDirective,
        TokenKind::Whitespace,
        TokenKind::CommentLine,
        TokenKind::Unknown,
    ];

    /// Tie-break priority: when two kinds match the same length of input,
    /// the lower number wins.
    pub fn priority(self) -> u16 {
        match self {
            TokenKind::Program => 0,
            TokenKind::Instruction => 10,
            TokenKind::PlusMinus => 100,
            TokenKind::Mult => 110,
            TokenKind::Div => 120,
            TokenKind::Power => 130,
            TokenKind::E => 140,
            TokenKind::And => 150,
            TokenKind::Or => 160,
            TokenKind::TrueFalse => 170,
            TokenKind::Comparator => 180,
            TokenKind::Set => 190,
            TokenKind::To => 200,
            TokenKind::If => 210,
            TokenKind::Until => 220,
            TokenKind::Lock => 230,
            TokenKind::Unlock => 240,
            TokenKind::Print => 250,
            TokenKind::At => 260,
            TokenKind::On => 270,
            TokenKind::Toggle => 280,
            TokenKind::Wait => 290,
            TokenKind::When => 300,
            TokenKind::Then => 310,
            TokenKind::Off => 320,
            TokenKind::Stage => 330,
            TokenKind::ClearScreen => 340,
            TokenKind::Add => 350,
            TokenKind::Remove => 360,
            TokenKind::Log => 370,
            TokenKind::Break => 380,
            TokenKind::Declare => 390,
            TokenKind::Parameter => 400,
            TokenKind::Switch => 410,
            TokenKind::Copy => 420,
            TokenKind::From => 430,
            TokenKind::Rename => 440,
            TokenKind::Volume => 450,
            TokenKind::File => 460,
            TokenKind::Delete => 470,
            TokenKind::Edit => 480,
            TokenKind::Run => 490,
            TokenKind::List => 500,
            TokenKind::Reboot => 510,
            TokenKind::Shutdown => 520,
            TokenKind::BracketOpen => 530,
            TokenKind::BracketClose => 540,
            TokenKind::CurlyOpen => 550,
            TokenKind::CurlyClose => 560,
            TokenKind::Comma => 570,
            TokenKind::Identifier => 580,
            TokenKind::VarIdentifier => 590,
            TokenKind::Integer => 600,
            TokenKind::Double => 610,
            TokenKind::Str => 620,
            TokenKind::EndOfInstruction => 630,
            TokenKind::EndOfFile => 640,
            TokenKind::LineDirective => 650,
            TokenKind::Whitespace => 660,
            TokenKind::CommentLine => 670,
            TokenKind::Unknown => 680,
        }
    }

    /// Trivia kinds the scanner consumes but never returns.
    pub fn is_skip(self) -> bool {
        matches!(
            self,
            TokenKind::LineDirective | TokenKind::Whitespace | TokenKind::CommentLine
        )
    }

    /// Human description for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Program => "program",
            TokenKind::Instruction => "instruction",
            TokenKind::PlusMinus => "'+' or '-'",
            TokenKind::Mult => "'*'",
            TokenKind::Div => "'/'",
            TokenKind::Power => "'^'",
            TokenKind::E => "'e'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::TrueFalse => "'true' or 'false'",
            TokenKind::Comparator => "comparison operator",
            TokenKind::Set => "'set'",
            TokenKind::To => "'to'",
            TokenKind::If => "'if'",
            TokenKind::Until => "'until'",
            TokenKind::Lock => "'lock'",
            TokenKind::Unlock => "'unlock'",
            TokenKind::Print => "'print'",
            TokenKind::At => "'at'",
            TokenKind::On => "'on'",
            TokenKind::Toggle => "'toggle'",
            TokenKind::Wait => "'wait'",
            TokenKind::When => "'when'",
            TokenKind::Then => "'then'",
            TokenKind::Off => "'off'",
            TokenKind::Stage => "'stage'",
            TokenKind::ClearScreen => "'clearscreen'",
            TokenKind::Add => "'add'",
            TokenKind::Remove => "'remove'",
            TokenKind::Log => "'log'",
            TokenKind::Break => "'break'",
            TokenKind::Declare => "'declare'",
            TokenKind::Parameter => "'parameter'",
            TokenKind::Switch => "'switch'",
            TokenKind::Copy => "'copy'",
            TokenKind::From => "'from'",
            TokenKind::Rename => "'rename'",
            TokenKind::Volume => "'volume'",
            TokenKind::File => "'file'",
            TokenKind::Delete => "'delete'",
            TokenKind::Edit => "'edit'",
            TokenKind::Run => "'run'",
            TokenKind::List => "'list'",
            TokenKind::Reboot => "'reboot'",
            TokenKind::Shutdown => "'shutdown'",
            TokenKind::BracketOpen => "'('",
            TokenKind::BracketClose => "')'",
            TokenKind::CurlyOpen => "'{'",
            TokenKind::CurlyClose => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Identifier => "identifier",
            TokenKind::VarIdentifier => "qualified identifier",
            TokenKind::Integer => "integer literal",
            TokenKind::Double => "real literal",
            TokenKind::Str => "string literal",
            TokenKind::EndOfInstruction => "'.'",
            TokenKind::EndOfFile => "end of input",
            TokenKind::LineDirective => "line directive",
            TokenKind::Whitespace => "whitespace",
            TokenKind::CommentLine => "comment",
            TokenKind::Unknown => "unrecognized character",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

/// A classified lexeme with position and provenance metadata.
///
/// `start`/`end` are byte offsets into the scanned text (`end >= start`);
/// `file` and `line` are the *virtual* values in effect at the match site,
/// which a line directive may have overridden.  `skipped` holds the trivia
/// elided since the previous real token, in input order.  Apart from
/// [`update_range`](Token::update_range), a token is never mutated once the
/// scanner hands it out.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub skipped: Vec<Token>,
    pub value: Option<Value>,
}

impl Token {
    /// A bare token with empty position metadata; the scanner fills the rest.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
            start: 0,
            end: 0,
            file: String::new(),
            line: 1,
            column: 1,
            skipped: Vec::new(),
            value: None,
        }
    }

    /// Widen this token's span to cover `other` as well.
    ///
    /// Grouping nodes built by a parser start from their first child and
    /// absorb each further child's range.
    pub fn update_range(&mut self, other: &Token) {
        if other.start < self.start {
            self.start = other.start;
        }
        if other.end > self.end {
            self.end = other.end;
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_ascend_in_declaration_order() {
        for pair in TokenKind::ALL.windows(2) {
            assert!(
                pair[0].priority() < pair[1].priority(),
                "{:?} must outrank {:?}",
                pair[0],
                pair[1],
            );
        }
    }

    #[test]
    fn keywords_outrank_identifiers() {
        assert!(TokenKind::On.priority() < TokenKind::Identifier.priority());
        assert!(TokenKind::Set.priority() < TokenKind::Identifier.priority());
        assert!(TokenKind::Identifier.priority() < TokenKind::VarIdentifier.priority());
    }

    #[test]
    fn directive_outranks_comment() {
        assert!(TokenKind::LineDirective.priority() < TokenKind::CommentLine.priority());
    }

    #[test]
    fn skip_set() {
        assert!(TokenKind::Whitespace.is_skip());
        assert!(TokenKind::CommentLine.is_skip());
        assert!(TokenKind::LineDirective.is_skip());
        assert!(!TokenKind::Identifier.is_skip());
        assert!(!TokenKind::EndOfFile.is_skip());
        assert!(!TokenKind::Unknown.is_skip());
    }

    #[test]
    fn update_range_widens() {
        let mut group = Token::new(TokenKind::Instruction, "");
        group.start = 4;
        group.end = 7;
        let mut child = Token::new(TokenKind::Integer, "5");
        child.start = 9;
        child.end = 10;
        group.update_range(&child);
        assert_eq!((group.start, group.end), (4, 10));

        child.start = 1;
        child.end = 2;
        group.update_range(&child);
        assert_eq!((group.start, group.end), (1, 10));
    }

    #[test]
    fn display() {
        let tok = Token::new(TokenKind::Set, "set");
        assert_eq!(tok.to_string(), "'set' 'set'");
        assert_eq!(TokenKind::Identifier.to_string(), "identifier");
    }
}
