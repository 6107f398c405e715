use std::iter::Peekable;
use std::str::Chars;

/// 词法单元。引号已经被解析掉，`quoted` 记录该词是否含有引号或转义部分，
/// 以便解析器只把未加引号的 `|`、`>` 等视为运算符。
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub text: String,
    pub quoted: bool,
}

#[cfg(test)]
impl Token {
    pub fn word(text: &str) -> Self {
        Self {
            text: text.to_string(),
            quoted: false,
        }
    }

    pub fn quoted(text: &str) -> Self {
        Self {
            text: text.to_string(),
            quoted: true,
        }
    }
}

impl Token {
    /// 未加引号且文本完全等于 `op`。
    pub fn is_operator(&self, op: &str) -> bool {
        !self.quoted && self.text == op
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn tokenize(line: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(line);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    /// 读取下一个词；输入结束时返回 `None`。未闭合的引号视为在行尾闭合。
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        self.peek_char()?;

        let mut text = String::new();
        let mut quoted = false;
        let mut quote = Quote::None;

        while let Some(c) = self.read_char() {
            match quote {
                Quote::None => match c {
                    c if c.is_whitespace() => break,
                    '\\' => match self.read_char() {
                        Some(next) => {
                            text.push(next);
                            quoted = true;
                        }
                        // 行尾孤立的反斜杠按字面保留
                        None => text.push('\\'),
                    },
                    '\'' => {
                        quote = Quote::Single;
                        quoted = true;
                    }
                    '"' => {
                        quote = Quote::Double;
                        quoted = true;
                    }
                    c => text.push(c),
                },
                Quote::Single => match c {
                    '\'' => quote = Quote::None,
                    c => text.push(c),
                },
                Quote::Double => match c {
                    '"' => quote = Quote::None,
                    '\\' => match self.peek_char() {
                        Some(next @ ('"' | '\\' | '$' | '`')) => {
                            self.read_char();
                            text.push(next);
                        }
                        _ => text.push('\\'),
                    },
                    c => text.push(c),
                },
            }
        }

        Some(Token { text, quoted })
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }
}
