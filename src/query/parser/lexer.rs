//! 规则词法分析器

/// 词法标记
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
}

/// 标记类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Keyword,        // MATCH, WHERE, CREATE, SET, ...
    Identifier,     // 变量名、标签名、类型名、属性键
    LiteralString,  // 字符串字面量
    LiteralNumber,  // 数字字面量
    Operator,       // + - * / % = == != <> < <= > >= -> <-
    Punctuation,    // ( ) [ ] { } : , . ..
    Eof,
}

/// 规则文本词法分析器
#[derive(Debug)]
pub struct RuleLexer {
    chars: Vec<char>,
    position: usize,
}

const KEYWORDS: &[&str] = &[
    "MATCH", "WHERE", "CREATE", "SET", "RETURN", "AND", "OR", "NOT", "IN", "IS", "NULL", "TRUE",
    "FALSE", "AS",
];

impl RuleLexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
        }
    }

    /// 词法分析；跳过空白与注释，末尾追加 EOF 标记
    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            if self.is_eof() {
                break;
            }
            tokens.push(self.next_token()?);
        }

        tokens.push(Token {
            token_type: TokenType::Eof,
            value: String::new(),
            position: self.position,
        });
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, String> {
        let ch = self.peek_char().expect("checked non-eof before next_token");
        let position = self.position;

        match ch {
            '"' | '\'' => {
                let value = self.read_string(ch)?;
                Ok(Token {
                    token_type: TokenType::LiteralString,
                    value,
                    position,
                })
            }

            '0'..='9' => {
                let value = self.read_number();
                Ok(Token {
                    token_type: TokenType::LiteralNumber,
                    value,
                    position,
                })
            }

            'a'..='z' | 'A'..='Z' | '_' => {
                let value = self.read_identifier();
                let token_type = if Self::is_keyword(&value) {
                    TokenType::Keyword
                } else {
                    TokenType::Identifier
                };
                Ok(Token {
                    token_type,
                    value,
                    position,
                })
            }

            '(' | ')' | '[' | ']' | '{' | '}' | ':' | ',' => {
                self.consume_char();
                Ok(Token {
                    token_type: TokenType::Punctuation,
                    value: ch.to_string(),
                    position,
                })
            }

            '.' => {
                self.consume_char();
                // 双点是跳数范围分隔符
                if self.peek_char() == Some('.') {
                    self.consume_char();
                    Ok(Token {
                        token_type: TokenType::Punctuation,
                        value: "..".to_string(),
                        position,
                    })
                } else {
                    Ok(Token {
                        token_type: TokenType::Punctuation,
                        value: ".".to_string(),
                        position,
                    })
                }
            }

            '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' => {
                let value = self.read_operator();
                Ok(Token {
                    token_type: TokenType::Operator,
                    value,
                    position,
                })
            }

            _ => Err(format!(
                "unrecognized character '{}' at position {}",
                ch, position
            )),
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String, String> {
        self.consume_char(); // opening quote
        let mut string = String::new();

        loop {
            match self.peek_char() {
                None => return Err("unterminated string literal".to_string()),
                Some(ch) if ch == quote => {
                    self.consume_char();
                    return Ok(string);
                }
                Some('\\') => {
                    self.consume_char();
                    string.push(self.read_escape_sequence()?);
                }
                Some(ch) => {
                    string.push(ch);
                    self.consume_char();
                }
            }
        }
    }

    fn read_escape_sequence(&mut self) -> Result<char, String> {
        let escaped = match self.peek_char() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            other => {
                return Err(format!(
                    "invalid escape sequence '\\{}'",
                    other.unwrap_or(' ')
                ))
            }
        };
        self.consume_char();
        Ok(escaped)
    }

    fn read_number(&mut self) -> String {
        let mut number = String::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.consume_char();
            } else if ch == '.'
                && !number.contains('.')
                && self
                    .peek_next_char()
                    .map(|c| c.is_ascii_digit())
                    .unwrap_or(false)
            {
                // A lone or doubled dot after digits belongs to a hop range.
                number.push(ch);
                self.consume_char();
            } else {
                break;
            }
        }

        number
    }

    fn read_identifier(&mut self) -> String {
        let mut identifier = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.consume_char();
            } else {
                break;
            }
        }
        identifier
    }

    fn read_operator(&mut self) -> String {
        let first = self.peek_char().expect("operator start checked by caller");
        let mut operator = first.to_string();
        self.consume_char();

        if let Some(next) = self.peek_char() {
            match (first, next) {
                ('=', '=')
                | ('!', '=')
                | ('<', '=')
                | ('>', '=')
                | ('<', '>')
                | ('-', '>')
                | ('<', '-') => {
                    operator.push(next);
                    self.consume_char();
                }
                _ => {}
            }
        }

        operator
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), String> {
        loop {
            match self.peek_char() {
                Some(ch) if ch.is_whitespace() => self.consume_char(),
                Some('/') if self.peek_next_char() == Some('/') => {
                    while let Some(ch) = self.peek_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.consume_char();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn is_keyword(word: &str) -> bool {
        KEYWORDS.contains(&word.to_ascii_uppercase().as_str())
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_next_char(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn consume_char(&mut self) {
        self.position += 1;
    }

    fn is_eof(&self) -> bool {
        self.position >= self.chars.len()
    }
}
