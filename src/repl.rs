use crate::indicator::IndicatorKind;

/// One line of input in the interactive chat.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Ask(String),
    Symbol(String),
    Symbols,
    Examples,
    Example(usize),
    Show(Vec<IndicatorKind>),
    History,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP: &str = "\
Type a question, or one of:
  /symbol SYM      switch stock (clears chat history)
  /symbols         list available symbols
  /examples        list example questions
  /example N       ask example question N
  /show [KINDS]    metrics and indicators (sma ema rsi macd)
  /history         print the conversation so far
  /help            this message
  /quit            leave";

pub fn parse_command(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_owned());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (name, args.as_slice()) {
        ("symbol", [sym]) => ChatCommand::Symbol(sym.to_ascii_uppercase()),
        ("symbol", _) => ChatCommand::Invalid("usage: /symbol SYM".into()),
        ("symbols", []) => ChatCommand::Symbols,
        ("examples", []) => ChatCommand::Examples,
        ("example", [n]) => match n.parse::<usize>() {
            Ok(n) if n > 0 => ChatCommand::Example(n),
            _ => ChatCommand::Invalid(format!("not an example number: {n}")),
        },
        ("example", _) => ChatCommand::Invalid("usage: /example N".into()),
        ("show", kinds) => {
            let mut parsed = Vec::with_capacity(kinds.len());
            for k in kinds {
                match IndicatorKind::parse(k) {
                    Some(kind) => parsed.push(kind),
                    None => return ChatCommand::Invalid(format!("unknown indicator: {k}")),
                }
            }
            ChatCommand::Show(parsed)
        }
        ("history", []) => ChatCommand::History,
        ("help", _) => ChatCommand::Help,
        ("quit" | "exit", _) => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("unknown command: /{name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            parse_command("  How is the stock performing?  "),
            ChatCommand::Ask("How is the stock performing?".into())
        );
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(parse_command("   "), ChatCommand::Empty);
    }

    #[test]
    fn symbol_is_uppercased() {
        assert_eq!(parse_command("/symbol msft"), ChatCommand::Symbol("MSFT".into()));
        assert!(matches!(parse_command("/symbol"), ChatCommand::Invalid(_)));
    }

    #[test]
    fn example_number_must_be_positive() {
        assert_eq!(parse_command("/example 3"), ChatCommand::Example(3));
        assert!(matches!(parse_command("/example 0"), ChatCommand::Invalid(_)));
        assert!(matches!(parse_command("/example x"), ChatCommand::Invalid(_)));
    }

    #[test]
    fn show_parses_indicator_kinds() {
        assert_eq!(parse_command("/show"), ChatCommand::Show(vec![]));
        assert_eq!(
            parse_command("/show SMA macd"),
            ChatCommand::Show(vec![IndicatorKind::Sma, IndicatorKind::Macd])
        );
        assert!(matches!(parse_command("/show vwap"), ChatCommand::Invalid(_)));
    }

    #[test]
    fn quit_aliases() {
        assert_eq!(parse_command("/quit"), ChatCommand::Quit);
        assert_eq!(parse_command("/exit"), ChatCommand::Quit);
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(parse_command("/frobnicate"), ChatCommand::Invalid(_)));
    }
}
