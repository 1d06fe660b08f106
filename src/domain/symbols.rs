//! Comma-separated symbol lists, as typed on the command line.

use crate::domain::asset::normalize_symbol;
use crate::domain::error::BuilderError;
use std::collections::HashSet;

/// Split `input` on commas, normalize each ticker and reject empty tokens
/// and duplicates. Order is preserved.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, BuilderError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let symbol = normalize_symbol(token)?;
        if !seen.insert(symbol.clone()) {
            return Err(BuilderError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_uppercases() {
        assert_eq!(
            parse_symbols("aapl, nvda ,Tsla").unwrap(),
            vec!["AAPL", "NVDA", "TSLA"]
        );
    }

    #[test]
    fn single_symbol() {
        assert_eq!(parse_symbols("spy").unwrap(), vec!["SPY"]);
    }

    #[test]
    fn empty_token_rejected() {
        assert!(matches!(
            parse_symbols("AAPL,,NVDA"),
            Err(BuilderError::InvalidSymbol(_))
        ));
        assert!(matches!(
            parse_symbols(""),
            Err(BuilderError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn inner_whitespace_rejected() {
        assert!(matches!(
            parse_symbols("BRK B"),
            Err(BuilderError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn duplicates_rejected_case_insensitively() {
        match parse_symbols("aapl,AAPL") {
            Err(BuilderError::DuplicateSymbol(s)) => assert_eq!(s, "AAPL"),
            other => panic!("expected duplicate, got {other:?}"),
        }
    }
}
