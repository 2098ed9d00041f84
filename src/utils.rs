//! Utils

use clap::Parser;

/// Arguments for the quote demo
#[derive(Debug, Parser)]
pub struct ExampleQuoteArgs {
    /// Fixture set to load the club, packages and people from
    #[clap(short, long, default_value = "riverside")]
    pub fixture: String,

    /// Registrant as `person=package` fixture keys; repeat for a batch
    #[clap(short, long = "registrant", value_parser = parse_assignment)]
    pub registrants: Vec<(String, String)>,

    /// Price a custom package for one person instead, as `person=activity,activity,...`
    #[clap(short, long, value_parser = parse_assignment, conflicts_with = "registrants")]
    pub custom: Option<(String, String)>,

    /// Treat everyone as a returning member (no enrollment fee)
    #[clap(long)]
    pub returning: bool,

    /// VAT registration number, enabling the club's configured VAT rate
    #[clap(long)]
    pub vat_number: Option<String>,
}

/// Split a `key=value` argument.
///
/// # Errors
///
/// Returns a message if there is no `=` or either side is blank.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got {s}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_assignment_splits_on_equals() {
        assert_eq!(
            parse_assignment("kit=kids-swim"),
            Ok(("kit".to_string(), "kids-swim".to_string()))
        );
        assert!(parse_assignment("kit").is_err(), "no separator");
        assert!(parse_assignment("=kids-swim").is_err(), "blank key");
    }
}
