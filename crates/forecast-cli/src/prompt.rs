//! Interactive input for the prediction client

use std::io::{self, BufRead, Write};

/// Horizon used when the prompt is left blank
pub const DEFAULT_HORIZON: u32 = 10;

/// Trimmed, upper-cased symbol, or `None` when blank
pub fn parse_symbol(input: &str) -> Option<String> {
    let symbol = input.trim();
    (!symbol.is_empty()).then(|| symbol.to_uppercase())
}

/// Positive horizon; blank input selects [`DEFAULT_HORIZON`]
pub fn parse_horizon(input: &str) -> Result<u32, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(DEFAULT_HORIZON);
    }
    match input.parse::<u32>() {
        Ok(0) | Err(_) => Err(format!("horizon must be a positive integer, got '{input}'")),
        Ok(horizon) => Ok(horizon),
    }
}

fn read_line(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line)
}

/// Ask until a non-blank symbol is entered
pub fn prompt_symbol(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<String> {
    loop {
        let line = read_line(input, output, "Symbol: ")?;
        match parse_symbol(&line) {
            Some(symbol) => return Ok(symbol),
            None => writeln!(output, "Symbol must not be empty")?,
        }
    }
}

/// Ask until a valid horizon (or blank, for the default) is entered
pub fn prompt_horizon(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<u32> {
    loop {
        let line = read_line(input, output, &format!("Horizon [{DEFAULT_HORIZON}]: "))?;
        match parse_horizon(&line) {
            Ok(horizon) => return Ok(horizon),
            Err(msg) => writeln!(output, "{msg}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_symbol() {
        assert_eq!(parse_symbol(" amzn\n"), Some("AMZN".to_string()));
        assert_eq!(parse_symbol("   \n"), None);
    }

    #[test]
    fn test_parse_horizon() {
        assert_eq!(parse_horizon("\n"), Ok(DEFAULT_HORIZON));
        assert_eq!(parse_horizon(" 5 "), Ok(5));
        assert!(parse_horizon("0").is_err());
        assert!(parse_horizon("-3").is_err());
        assert!(parse_horizon("ten").is_err());
    }

    #[test]
    fn test_prompts_retry_until_valid() {
        let mut input = Cursor::new("\n  \nmsft\nabc\n0\n7\n");
        let mut output = Vec::new();

        assert_eq!(prompt_symbol(&mut input, &mut output).unwrap(), "MSFT");
        assert_eq!(prompt_horizon(&mut input, &mut output).unwrap(), 7);

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Symbol must not be empty").count(), 2);
        assert_eq!(shown.matches("horizon must be a positive integer").count(), 2);
    }

    #[test]
    fn test_prompt_eof() {
        let mut input = Cursor::new("");
        let err = prompt_symbol(&mut input, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
