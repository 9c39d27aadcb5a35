//! Tokenizer and parser for the restricted SQL this engine accepts:
//! `SELECT COUNT(*) FROM t`, `SELECT c1, c2 FROM t [WHERE col = 'val']`, and
//! the two dot-commands `.dbinfo` / `.tables`.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("expected SELECT keyword")]
    ExpectedSelect,
    #[error("expected a column name or COUNT(*)")]
    ExpectedSelection,
    #[error("expected FROM keyword")]
    ExpectedFrom,
    #[error("expected a table name after FROM")]
    ExpectedTableName,
    #[error("expected '=' in WHERE clause")]
    ExpectedEquals,
    #[error("expected a string literal in WHERE clause")]
    ExpectedLiteral,
    #[error("unexpected trailing input")]
    TrailingInput,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(String),
    Identifier(String),
    StringLiteral(String),
    Symbol(char),
    Asterisk,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    DotDbInfo,
    DotTables,
    CountStar { table: String },
    Select {
        columns: Vec<String>,
        table: String,
        filter: Option<(String, String)>,
    },
}

pub fn parse(input: &str) -> Result<Command, Error> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case(".dbinfo") {
        return Ok(Command::DotDbInfo);
    }
    if trimmed.eq_ignore_ascii_case(".tables") {
        return Ok(Command::DotTables);
    }
    let tokens = tokenize(trimmed)?;
    parse_tokens(tokens)
}

fn tokenize(sql: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match word.to_uppercase().as_str() {
                    "SELECT" | "FROM" | "WHERE" | "COUNT" => Token::Keyword(word),
                    _ => Token::Identifier(word),
                };
                tokens.push(token);
            }
            '\'' => {
                chars.next();
                let mut lit = String::new();
                loop {
                    match chars.next() {
                        None => return Err(Error::UnterminatedString),
                        Some('\'') => {
                            // A doubled quote is an escaped literal quote.
                            if chars.peek() == Some(&'\'') {
                                lit.push('\'');
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        Some(c) => lit.push(c),
                    }
                }
                tokens.push(Token::StringLiteral(lit));
            }
            '*' => {
                tokens.push(Token::Asterisk);
                chars.next();
            }
            '(' | ')' | ',' | '=' => {
                tokens.push(Token::Symbol(c));
                chars.next();
            }
            other => return Err(Error::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

fn parse_tokens(tokens: Vec<Token>) -> Result<Command, Error> {
    let mut iter = tokens.into_iter().peekable();

    match iter.next() {
        Some(Token::Keyword(k)) if k.eq_ignore_ascii_case("SELECT") => {}
        _ => return Err(Error::ExpectedSelect),
    }

    // COUNT(*) is distinguished up front: it has its own executor path and
    // cannot be mixed with a column list.
    if let Some(Token::Keyword(k)) = iter.peek() {
        if k.eq_ignore_ascii_case("COUNT") {
            iter.next();
            expect_symbol(&mut iter, '(')?;
            match iter.next() {
                Some(Token::Asterisk) => {}
                _ => return Err(Error::ExpectedSelection),
            }
            expect_symbol(&mut iter, ')')?;
            expect_from_keyword(&mut iter)?;
            let table = expect_identifier(&mut iter, Error::ExpectedTableName)?;
            if iter.peek().is_some() {
                return Err(Error::TrailingInput);
            }
            return Ok(Command::CountStar { table });
        }
    }

    let mut columns = Vec::new();
    loop {
        let col = expect_identifier(&mut iter, Error::ExpectedSelection)?;
        columns.push(col);
        match iter.peek() {
            Some(Token::Symbol(',')) => {
                iter.next();
                continue;
            }
            _ => break,
        }
    }

    expect_from_keyword(&mut iter)?;
    let table = expect_identifier(&mut iter, Error::ExpectedTableName)?;

    let filter = match iter.peek() {
        Some(Token::Keyword(k)) if k.eq_ignore_ascii_case("WHERE") => {
            iter.next();
            let col = expect_identifier(&mut iter, Error::ExpectedTableName)?;
            expect_symbol(&mut iter, '=')?;
            let val = match iter.next() {
                Some(Token::StringLiteral(s)) => s,
                _ => return Err(Error::ExpectedLiteral),
            };
            Some((col, val))
        }
        _ => None,
    };

    if iter.peek().is_some() {
        return Err(Error::TrailingInput);
    }

    Ok(Command::Select { columns, table, filter })
}

fn expect_symbol(
    iter: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    c: char,
) -> Result<(), Error> {
    match iter.next() {
        Some(Token::Symbol(s)) if s == c => Ok(()),
        _ if c == '=' => Err(Error::ExpectedEquals),
        _ => Err(Error::ExpectedSelection),
    }
}

fn expect_from_keyword(
    iter: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
) -> Result<(), Error> {
    match iter.next() {
        Some(Token::Keyword(k)) if k.eq_ignore_ascii_case("FROM") => Ok(()),
        _ => Err(Error::ExpectedFrom),
    }
}

fn expect_identifier(
    iter: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    on_missing: Error,
) -> Result<String, Error> {
    match iter.next() {
        Some(Token::Identifier(s)) => Ok(s),
        _ => Err(on_missing),
    }
}
