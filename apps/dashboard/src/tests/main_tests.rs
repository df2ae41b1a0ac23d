use super::*;

#[test]
fn tip_percent_is_taken_from_the_remaining_balance() {
    assert!((tip_for(200.0, 0.0, Some(10.0)) - 20.0).abs() < 1e-9);
    assert!((tip_for(200.0, 5.0, None) - 5.0).abs() < 1e-9);
    assert_eq!(tip_for(0.0, 0.0, Some(15.0)), 0.0);
}

#[test]
fn payment_methods_parse_case_insensitively() {
    assert_eq!(parse_method("Card"), Ok(PaymentMethod::Card));
    assert_eq!(parse_method(" cash "), Ok(PaymentMethod::Cash));
    assert!(parse_method("cheque").is_err());
}

#[test]
fn pay_rejects_both_tip_forms() {
    let parsed = Cli::try_parse_from([
        "dashboard", "pay", "1", "20", "--tip", "2", "--tip-percent", "10",
    ]);
    assert!(parsed.is_err());

    let parsed = Cli::try_parse_from(["dashboard", "pay", "1", "20", "--tip-percent", "10"])
        .expect("args");
    assert!(matches!(
        parsed.command,
        Command::Pay {
            tip_percent: Some(percent),
            ..
        } if percent == 10.0
    ));
}
