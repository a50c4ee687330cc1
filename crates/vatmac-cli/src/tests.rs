use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["vatmac-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn prices_defaults_to_inr_and_flat_policy() {
    let cli = Cli::try_parse_from(["vatmac-cli", "prices"]).expect("expected valid cli args");
    match cli.command {
        Some(Commands::Prices {
            currency,
            policy,
            json,
        }) => {
            assert_eq!(currency, "INR");
            assert_eq!(policy, VatPolicy::flat());
            assert!(!json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn prices_accepts_currency_policy_and_json() {
    let cli = Cli::try_parse_from([
        "vatmac-cli",
        "prices",
        "--currency",
        "usd",
        "--policy",
        "inclusive",
        "--json",
    ])
    .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Prices {
            currency,
            policy,
            json,
        }) => {
            assert_eq!(currency, "usd");
            assert_eq!(policy, VatPolicy::inclusive());
            assert!(json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn prices_rejects_unknown_policy() {
    let result = Cli::try_parse_from(["vatmac-cli", "prices", "--policy", "generous"]);
    assert!(result.is_err());
}

#[test]
fn rate_takes_currency() {
    let cli = Cli::try_parse_from(["vatmac-cli", "rate", "--currency", "EUR"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Rate { ref currency }) if currency == "EUR"
    ));
}

#[test]
fn parses_scrape_command() {
    let cli = Cli::try_parse_from(["vatmac-cli", "scrape"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Scrape)));
}

#[test]
fn scrape_takes_no_arguments() {
    let result = Cli::try_parse_from(["vatmac-cli", "scrape", "--currency", "USD"]);
    assert!(result.is_err());
}
