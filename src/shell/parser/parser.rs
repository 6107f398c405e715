use std::path::PathBuf;

use log::debug;
use thiserror::Error;

use super::ast::{Command, Pipeline, Redirection};
use super::lexer::{Lexer, Token};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("zest: syntax error: missing command")]
    MissingCommand,
}

pub struct Parser {
    tokens: Vec<Token>,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self::from_tokens(Lexer::tokenize(input))
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Parser { tokens }
    }

    /// 按未加引号的 `|` 切分成若干命令；空行得到空的 Pipeline。
    pub fn parse_pipeline(self) -> Result<Pipeline, ParseError> {
        if self.tokens.is_empty() {
            return Ok(Pipeline::default());
        }

        let mut commands = Vec::new();
        let mut run = Vec::new();
        for token in self.tokens {
            if token.is_operator("|") {
                commands.push(Self::parse_simple_command(std::mem::take(&mut run))?);
            } else {
                run.push(token);
            }
        }
        commands.push(Self::parse_simple_command(run)?);

        debug!("解析得到 {} 个命令", commands.len());
        Ok(Pipeline { commands })
    }

    fn parse_simple_command(tokens: Vec<Token>) -> Result<Command, ParseError> {
        let mut command = Command::default();
        let mut tokens = tokens.into_iter();

        while let Some(token) = tokens.next() {
            let operator = if token.quoted {
                None
            } else {
                Redirection::operator(&token.text)
            };
            match operator {
                Some((stream, mode)) => match tokens.next() {
                    Some(target) => command.set_redirection(Redirection {
                        stream,
                        mode,
                        target: PathBuf::from(target.text),
                    }),
                    // 缺少文件名时静默忽略该运算符
                    None => debug!("重定向 {} 缺少文件名，已忽略", token.text),
                },
                None => command.arguments.push(token.text),
            }
        }

        match command.arguments.first() {
            Some(name) => command.name = name.clone(),
            None => return Err(ParseError::MissingCommand),
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::super::ast::{RedirectMode, Stream};
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn parse(line: &str) -> Pipeline {
        Parser::new(line).parse_pipeline().unwrap()
    }

    #[test]
    fn test_simple_command() {
        let pipeline = parse("ls -l");
        assert_eq!(pipeline.len(), 1);
        let cmd = &pipeline.commands[0];
        assert_eq!(cmd.name, "ls");
        assert_eq!(cmd.arguments, vec!["ls", "-l"]);
        assert!(cmd.stdout.is_none());
        assert!(cmd.stderr.is_none());
    }

    #[test]
    fn test_empty_line_is_empty_pipeline() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
    }

    #[test]
    fn test_pipeline() {
        let pipeline = parse("ls -l | grep foo | wc -l");
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.commands[0].arguments, vec!["ls", "-l"]);
        assert_eq!(pipeline.commands[1].arguments, vec!["grep", "foo"]);
        assert_eq!(pipeline.commands[2].name, "wc");
    }

    #[test]
    fn test_quoted_pipe_is_an_argument() {
        let pipeline = parse(r"echo '|' \| x");
        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline.commands[0].arguments, vec!["echo", "|", "|", "x"]);
    }

    #[test]
    fn test_redirection() {
        let pipeline = parse("echo hello > output.txt");
        let cmd = &pipeline.commands[0];
        assert_eq!(cmd.arguments, vec!["echo", "hello"]);
        assert_eq!(
            cmd.stdout,
            Some(Redirection {
                stream: Stream::Stdout,
                mode: RedirectMode::Truncate,
                target: PathBuf::from("output.txt"),
            })
        );
    }

    #[test]
    fn test_all_redirection_operators() {
        let cases = [
            (">", Stream::Stdout, RedirectMode::Truncate),
            ("1>", Stream::Stdout, RedirectMode::Truncate),
            (">>", Stream::Stdout, RedirectMode::Append),
            ("1>>", Stream::Stdout, RedirectMode::Append),
            ("2>", Stream::Stderr, RedirectMode::Truncate),
            ("2>>", Stream::Stderr, RedirectMode::Append),
        ];
        for (op, stream, mode) in cases {
            let pipeline = parse(&format!("cmd a {} f.txt b", op));
            let cmd = &pipeline.commands[0];
            assert_eq!(cmd.arguments, vec!["cmd", "a", "b"], "operator {}", op);
            let redirection = cmd.redirection(stream);
            assert_eq!(redirection.map(|r| r.mode), Some(mode), "operator {}", op);
        }
    }

    #[test]
    fn test_last_redirection_wins() {
        let pipeline = parse("echo hi > a.txt 2> e1 >> b.txt 2>> e2");
        let cmd = &pipeline.commands[0];
        assert_eq!(cmd.arguments, vec!["echo", "hi"]);
        let stdout = cmd.stdout.as_ref().map(|r| (r.target.clone(), r.mode));
        assert_eq!(stdout, Some((PathBuf::from("b.txt"), RedirectMode::Append)));
        let stderr = cmd.stderr.as_ref().map(|r| (r.target.clone(), r.mode));
        assert_eq!(stderr, Some((PathBuf::from("e2"), RedirectMode::Append)));
    }

    #[test]
    fn test_missing_target_is_dropped() {
        let pipeline = parse("echo hi >");
        let cmd = &pipeline.commands[0];
        assert_eq!(cmd.arguments, vec!["echo", "hi"]);
        assert!(cmd.stdout.is_none());
    }

    #[test]
    fn test_quoted_operator_is_an_argument() {
        let pipeline = parse(r#"echo ">" "2>>" x"#);
        let cmd = &pipeline.commands[0];
        assert_eq!(cmd.arguments, vec!["echo", ">", "2>>", "x"]);
        assert!(cmd.stdout.is_none());
        assert!(cmd.stderr.is_none());
    }

    #[test]
    fn test_redirection_inside_pipeline_stage() {
        let pipeline = parse("echo hi | cat > out.txt");
        assert_eq!(pipeline.commands[1].arguments, vec!["cat"]);
        assert!(pipeline.commands[1].stdout.is_some());
    }

    #[test]
    fn test_missing_command() {
        for line in ["| cat", "echo hi |", "echo a | | cat", "> out.txt"] {
            assert_eq!(
                Parser::new(line).parse_pipeline(),
                Err(ParseError::MissingCommand),
                "line {:?}",
                line
            );
        }
    }
}
