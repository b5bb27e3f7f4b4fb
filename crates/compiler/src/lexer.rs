//! Hand-written lexer (§1.1 of the expanded requirements): one token type,
//! a single forward scan, line tracking on every token. Not a grammar the
//! rest of the toolchain reviews closely — it exists to hand the parser a
//! token stream, nothing more.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    // Keywords
    Algoritmo,
    Variaveis,
    FimVariaveis,
    Inicio,
    Fim,
    Funcao,
    Se,
    Entao,
    Senao,
    FimSe,
    Enquanto,
    FimEnquanto,
    Repita,
    Ate,
    Para,
    De,
    Passo,
    FimPara,
    Retorne,
    Matriz,
    E,
    Ou,
    Nao,

    // Type keywords
    Inteiro,
    RealKw,
    Caractere,
    LiteralKw,
    Logico,

    // Literals
    IntLit(i64),
    RealLit(f64),
    CharLit(char),
    StrLit(String),
    Verdadeiro,
    Falso,

    Ident(String),

    // Punctuation / operators
    Assign,     // :=
    Colon,      // :
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,

    Eof,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub line: u32,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexError {}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.tok == Tok::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        Ok(out)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    // lookahead for // comment
                    let mut la = self.chars.clone();
                    la.next();
                    if la.peek().map(|&(_, c)| c) == Some('/') {
                        while let Some(c) = self.peek_char() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let line = self.line;
        let c = match self.peek_char() {
            None => return Ok(Token { tok: Tok::Eof, line }),
            Some(c) => c,
        };

        if c.is_ascii_digit() {
            return self.lex_number(line);
        }
        if c == '"' {
            return self.lex_string(line);
        }
        if c == '\'' {
            return self.lex_char(line);
        }
        if is_ident_start(c) {
            return self.lex_ident_or_keyword(line);
        }

        self.bump();
        let tok = match c {
            ':' => {
                if self.peek_char() == Some('=') {
                    self.bump();
                    Tok::Assign
                } else {
                    Tok::Colon
                }
            }
            ',' => Tok::Comma,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            '[' => Tok::LBracket,
            ']' => Tok::RBracket,
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' => Tok::Star,
            '/' => Tok::Slash,
            '%' => Tok::Percent,
            '&' => Tok::Amp,
            '|' => Tok::Pipe,
            '^' => Tok::Caret,
            '~' => Tok::Tilde,
            '=' => {
                if self.peek_char() == Some('=') {
                    self.bump();
                    Tok::EqEq
                } else {
                    return Err(LexError {
                        message: "'=' inesperado (use '==' para comparação ou ':=' para atribuição)"
                            .to_string(),
                        line,
                    });
                }
            }
            '!' => {
                if self.peek_char() == Some('=') {
                    self.bump();
                    Tok::NotEq
                } else {
                    return Err(LexError {
                        message: "'!' inesperado".to_string(),
                        line,
                    });
                }
            }
            '<' => {
                if self.peek_char() == Some('=') {
                    self.bump();
                    Tok::Le
                } else {
                    Tok::Lt
                }
            }
            '>' => {
                if self.peek_char() == Some('=') {
                    self.bump();
                    Tok::Ge
                } else {
                    Tok::Gt
                }
            }
            other => {
                return Err(LexError {
                    message: format!("caractere inesperado '{other}'"),
                    line,
                });
            }
        };
        Ok(Token { tok, line })
    }

    fn lex_number(&mut self, line: u32) -> Result<Token, LexError> {
        let start = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len());

        if self.peek_char() == Some('0') {
            let mut la = self.chars.clone();
            la.next();
            match la.peek().map(|&(_, c)| c) {
                Some('x') | Some('X') => {
                    self.bump();
                    self.bump();
                    return self.lex_radix(line, 16, |c| c.is_ascii_hexdigit());
                }
                Some('c') | Some('C') => {
                    self.bump();
                    self.bump();
                    return self.lex_radix(line, 8, |c| ('0'..='7').contains(&c));
                }
                Some('b') | Some('B') => {
                    self.bump();
                    self.bump();
                    return self.lex_radix(line, 2, |c| c == '0' || c == '1');
                }
                _ => {}
            }
        }

        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_real = false;
        if self.peek_char() == Some('.') {
            let mut la = self.chars.clone();
            la.next();
            if matches!(la.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
                is_real = true;
                self.bump();
                while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let end = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len());
        let text = &self.src[start..end];
        if is_real {
            let v: f64 = text.parse().map_err(|_| LexError {
                message: format!("literal real inválido '{text}'"),
                line,
            })?;
            Ok(Token { tok: Tok::RealLit(v), line })
        } else {
            let v: i64 = text.parse().map_err(|_| LexError {
                message: format!("literal inteiro inválido '{text}'"),
                line,
            })?;
            Ok(Token { tok: Tok::IntLit(v), line })
        }
    }

    fn lex_radix(
        &mut self,
        line: u32,
        radix: u32,
        accept: impl Fn(char) -> bool,
    ) -> Result<Token, LexError> {
        let start = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len());
        while matches!(self.peek_char(), Some(c) if accept(c)) {
            self.bump();
        }
        let end = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len());
        let text = &self.src[start..end];
        if text.is_empty() {
            return Err(LexError {
                message: "literal numérico vazio após prefixo de base".to_string(),
                line,
            });
        }
        let v = i64::from_str_radix(text, radix).map_err(|_| LexError {
            message: format!("literal inválido na base {radix}: '{text}'"),
            line,
        })?;
        Ok(Token { tok: Tok::IntLit(v), line })
    }

    fn lex_string(&mut self, line: u32) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(LexError {
                        message: "string literal não terminada".to_string(),
                        line,
                    });
                }
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => s.push(other),
                    None => {
                        return Err(LexError {
                            message: "string literal não terminada".to_string(),
                            line,
                        });
                    }
                },
                Some(c) => s.push(c),
            }
        }
        Ok(Token { tok: Tok::StrLit(s), line })
    }

    fn lex_char(&mut self, line: u32) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let c = match self.bump() {
            Some('\\') => match self.bump() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('\'') => '\'',
                Some('\\') => '\\',
                Some(other) => other,
                None => {
                    return Err(LexError {
                        message: "caractere literal não terminado".to_string(),
                        line,
                    });
                }
            },
            Some(c) => c,
            None => {
                return Err(LexError {
                    message: "caractere literal não terminado".to_string(),
                    line,
                });
            }
        };
        match self.bump() {
            Some('\'') => {}
            _ => {
                return Err(LexError {
                    message: "caractere literal deve conter exatamente um caractere".to_string(),
                    line,
                });
            }
        }
        Ok(Token { tok: Tok::CharLit(c), line })
    }

    fn lex_ident_or_keyword(&mut self, line: u32) -> Result<Token, LexError> {
        let start = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len());
        while matches!(self.peek_char(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        let end = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len());
        let mut text = self.src[start..end].to_string();

        // `fim-se`, `fim-enquanto`, `fim-para` and `fim-variaveis` are single
        // keywords spelled with a hyphen. `-` is ordinary subtraction
        // everywhere else, so only swallow it here when the combined
        // spelling actually names a keyword — peek into a cloned iterator
        // first and commit only on a match, leaving `-` as `Minus` otherwise.
        if self.peek_char() == Some('-') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some(&(_, c)) if is_ident_start(c)) {
                let tail_start = lookahead.peek().map(|&(i, _)| i).unwrap();
                while matches!(lookahead.peek(), Some(&(_, c)) if is_ident_continue(c)) {
                    lookahead.next();
                }
                let tail_end = lookahead.peek().map(|&(i, _)| i).unwrap_or(self.src.len());
                let combined = format!("{text}-{}", &self.src[tail_start..tail_end]);
                if keyword(&combined).is_some() {
                    self.chars = lookahead;
                    text = combined;
                }
            }
        }

        let tok = keyword(&text).unwrap_or_else(|| Tok::Ident(text));
        Ok(Token { tok, line })
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Keyword lookup. Both the accented and unaccented spellings of
/// `variáveis`/`fim-variáveis`/`até`/`não` are accepted (the GLOSSARY uses
/// the accented forms; §8's scenarios are written with the unaccented
/// ASCII spellings, and both are in circulation in real G-Portugol
/// sources) — this lexer normalizes them to the same token rather than
/// forcing one spelling.
fn keyword(text: &str) -> Option<Tok> {
    Some(match text {
        "algoritmo" => Tok::Algoritmo,
        "variaveis" | "variáveis" => Tok::Variaveis,
        "fim-variaveis" | "fim-variáveis" => Tok::FimVariaveis,
        "inicio" | "início" => Tok::Inicio,
        "fim" => Tok::Fim,
        "funcao" | "função" => Tok::Funcao,
        "se" => Tok::Se,
        "entao" | "então" => Tok::Entao,
        "senao" | "senão" => Tok::Senao,
        "fim-se" => Tok::FimSe,
        "enquanto" => Tok::Enquanto,
        "fim-enquanto" => Tok::FimEnquanto,
        "repita" => Tok::Repita,
        "ate" | "até" => Tok::Ate,
        "para" => Tok::Para,
        "de" => Tok::De,
        "passo" => Tok::Passo,
        "fim-para" => Tok::FimPara,
        "retorne" => Tok::Retorne,
        "matriz" => Tok::Matriz,
        "e" => Tok::E,
        "ou" => Tok::Ou,
        "nao" | "não" => Tok::Nao,
        "inteiro" => Tok::Inteiro,
        "real" => Tok::RealKw,
        "caractere" => Tok::Caractere,
        "literal" => Tok::LiteralKw,
        "logico" | "lógico" => Tok::Logico,
        "verdadeiro" => Tok::Verdadeiro,
        "falso" => Tok::Falso,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.tok)
            .collect()
    }

    #[test]
    fn lexes_assignment_and_identifiers() {
        assert_eq!(
            toks("a := 3"),
            vec![Tok::Ident("a".into()), Tok::Assign, Tok::IntLit(3), Tok::Eof]
        );
    }

    #[test]
    fn lexes_hex_octal_binary_prefixes() {
        assert_eq!(toks("0x1F"), vec![Tok::IntLit(31), Tok::Eof]);
        assert_eq!(toks("0c17"), vec![Tok::IntLit(15), Tok::Eof]);
        assert_eq!(toks("0b101"), vec![Tok::IntLit(5), Tok::Eof]);
    }

    #[test]
    fn lexes_real_literal() {
        assert_eq!(toks("3.14"), vec![Tok::RealLit(3.14), Tok::Eof]);
    }

    #[test]
    fn lexes_string_and_char_literals() {
        assert_eq!(
            toks(r#""ola" 'x'"#),
            vec![Tok::StrLit("ola".into()), Tok::CharLit('x'), Tok::Eof]
        );
    }

    #[test]
    fn accepts_accented_and_unaccented_keywords() {
        assert_eq!(toks("variaveis"), vec![Tok::Variaveis, Tok::Eof]);
        assert_eq!(toks("variáveis"), vec![Tok::Variaveis, Tok::Eof]);
        assert_eq!(toks("nao"), vec![Tok::Nao, Tok::Eof]);
        assert_eq!(toks("não"), vec![Tok::Nao, Tok::Eof]);
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            toks("a := 1 // comentario\nb := 2"),
            vec![
                Tok::Ident("a".into()),
                Tok::Assign,
                Tok::IntLit(1),
                Tok::Ident("b".into()),
                Tok::Assign,
                Tok::IntLit(2),
                Tok::Eof
            ]
        );
    }

    #[test]
    fn reports_line_numbers_across_newlines() {
        let tokens = Lexer::new("a\nb\nc").tokenize().unwrap();
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
    }
}
