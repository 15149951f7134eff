use crate::lang::source_buffer::SourceBuffer;

/// A single token pulled out of the source text.
///
/// The language only ever needs to know whether a token's text should be treated verbatim (the
/// body of a quoted literal) or whether it is an ordinary, case-folded identifier/number — so
/// unlike a more general-purpose tokenizer there is no separate number/word/string variant here.
/// The compiler is the one that decides whether a token's text parses as a number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The token's text. Case-folded to uppercase unless `literal` is set or this token
    /// immediately follows an `INCLUDE` token.
    pub text: String,

    /// Set for the body of a quoted literal (`."`, `.(`, `.'`). Literal tokens are never
    /// case-folded and may contain embedded whitespace.
    pub literal: bool,
}

impl Token {
    fn word(text: String) -> Token {
        Token {
            text,
            literal: false,
        }
    }

    fn literal(text: String) -> Token {
        Token {
            text,
            literal: true,
        }
    }

    /// The empty sentinel token emitted after a quoted literal's body. It carries no content and
    /// exists purely so that the driver sees a clean boundary after a `."` ... body pair.
    pub fn is_sentinel(&self) -> bool {
        self.text.is_empty()
    }
}

/// The normalized form every quote opener (`."`, `.(`, `.'`) is rewritten to once tokenized.
pub const QUOTE_OPENER: &str = ".\"";

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n'
}

/// Read a run of non-whitespace characters as one raw word.
fn read_word(buffer: &mut SourceBuffer) -> String {
    let mut text = String::new();

    while let Some(c) = buffer.peek_next() {
        if is_separator(c) {
            break;
        }

        text.push(c);
        buffer.next_char();
    }

    text
}

/// Read the body of a quoted literal up to (and consuming) `closing`, or up to but not
/// consuming a newline if the quote is left unterminated on this line.
fn read_quoted_body(buffer: &mut SourceBuffer, closing: char) -> String {
    let mut text = String::new();

    while let Some(c) = buffer.peek_next() {
        if c == closing {
            buffer.next_char();
            return text;
        }

        if c == '\n' {
            // Unterminated quote: stop at the newline without consuming it, keeping whatever
            // was accumulated so far as the body.
            return text;
        }

        text.push(c);
        buffer.next_char();
    }

    text
}

fn quote_closing_char(opener: &str) -> Option<char> {
    match opener {
        ".\"" => Some('"'),
        ".(" => Some(')'),
        ".'" => Some('\''),
        _ => None,
    }
}

/// Tokenize a complete buffer of source text.
///
/// This is a single forward-only pass: the only lookback the tokenizer needs is the text of the
/// immediately preceding token, tracked as `previous_was_include` below, so that the filename
/// following `INCLUDE` keeps its original case.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut buffer = SourceBuffer::new(source);
    let mut tokens = Vec::new();
    let mut in_comment = false;
    let mut previous_was_include = false;

    loop {
        // Skip whitespace and comment runs. A newline always ends a line comment.
        loop {
            match buffer.peek_next() {
                None => break,
                Some('\n') => {
                    buffer.next_char();
                    in_comment = false;
                }
                Some(c) if in_comment => {
                    buffer.next_char();
                }
                Some(c) if c == ' ' || c == '\t' => {
                    buffer.next_char();
                }
                _ => break,
            }
        }

        if buffer.peek_next().is_none() {
            break;
        }

        let raw = read_word(&mut buffer);

        if raw == "\\" {
            in_comment = true;
            continue;
        }

        if let Some(closing) = quote_closing_char(&raw) {
            tokens.push(Token::word(QUOTE_OPENER.to_string()));
            previous_was_include = false;

            let body = read_quoted_body(&mut buffer, closing);
            tokens.push(Token::literal(body));
            tokens.push(Token::literal(String::new()));

            continue;
        }

        let text = if previous_was_include {
            raw
        } else {
            raw.to_uppercase()
        };

        previous_was_include = text == "INCLUDE";
        tokens.push(Token::word(text));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_on_whitespace_and_folds_case() {
        let tokens = tokenize("dup swap\tdrop\n1 2 +");
        assert_eq!(
            words(&tokens),
            vec!["DUP", "SWAP", "DROP", "1", "2", "+"]
        );
    }

    #[test]
    fn line_comment_is_discarded() {
        let tokens = tokenize("1 \\ this is a comment\n2 +");
        assert_eq!(words(&tokens), vec!["1", "2", "+"]);
    }

    #[test]
    fn include_filename_keeps_case() {
        let tokens = tokenize("INCLUDE MyLib.fs DUP");
        assert_eq!(words(&tokens), vec!["INCLUDE", "MyLib.fs", "DUP"]);
    }

    #[test]
    fn quoted_literal_preserves_spaces_and_case() {
        let tokens = tokenize(r#"." Hello, World!""#);
        assert_eq!(tokens[0].text, ".\"");
        assert!(!tokens[0].literal);
        assert_eq!(tokens[1].text, " Hello, World!");
        assert!(tokens[1].literal);
        assert!(tokens[2].is_sentinel());
    }

    #[test]
    fn alternate_quote_delimiters_are_normalized() {
        let tokens = tokenize(".( parenthesized )");
        assert_eq!(tokens[0].text, ".\"");
        assert_eq!(tokens[1].text, " parenthesized ");

        let tokens = tokenize(".' ticked '");
        assert_eq!(tokens[0].text, ".\"");
        assert_eq!(tokens[1].text, " ticked ");
    }

    #[test]
    fn unterminated_quote_stops_at_newline() {
        let tokens = tokenize(".\" no closing delimiter\nDUP");
        assert_eq!(tokens[1].text, " no closing delimiter");
        assert!(tokens[2].is_sentinel());
        assert_eq!(tokens[3].text, "DUP");
    }

    #[test]
    fn round_trips_when_no_quotes_are_present() {
        let source = "1 2 + dup swap drop";
        let tokens = tokenize(source);
        let rejoined = words(&tokens).join(" ");
        assert_eq!(rejoined, source.to_uppercase());
    }
}
