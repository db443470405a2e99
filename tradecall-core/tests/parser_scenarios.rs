//! End-to-end parser scenarios against the contract-master fixtures.
//!
//! The catalog is loaded from `tests/fixtures/*.csv` exactly as production
//! loads the exchange contract masters.

use chrono::DateTime;
use std::path::PathBuf;
use tradecall_core::{
    Action, ChannelParser, InstrumentCatalog, Outcome, PaidCallParser, ParseContext, ParseError,
    ProductType, RangeAlertParser, SmsStyleParser, Stage, SymbolResolver, Timestamp,
};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn catalog() -> InstrumentCatalog {
    InstrumentCatalog::load_dir(&fixture_dir(), &["NFO".into(), "BFO".into()]).unwrap()
}

fn ts() -> Timestamp {
    DateTime::parse_from_rfc3339("2024-01-18T10:05:00+05:30").unwrap()
}

fn outcome(parser: &dyn ChannelParser, channel: &str, text: &str) -> Outcome {
    let catalog = catalog();
    let resolver = SymbolResolver::default();
    parser.get_signal(&ParseContext::new(&catalog, &resolver), channel, ts(), text)
}

const SCENARIO_A: &str = "BUY #NIFTY 20000 CE NEAR 120.5 130 TARGET 150 160 170 SL-100";

#[test]
fn scenario_a_range_alert_success() {
    let out = outcome(&RangeAlertParser, "Premium jackpot", SCENARIO_A);
    let s = out.signal().expect("signal");
    assert_eq!(s.trading_symbol(), "NIFTY24JAN20000CE");
    assert_eq!(s.entry_range().join(" | "), "120.5 | 130");
    assert_eq!(s.target_range().join(" | "), "150 | 160 | 170");
    assert_eq!(s.stop_loss(), "100");
    assert_eq!(s.product(), Some(ProductType::Mis));
    assert_eq!(s.action(), Action::Buy);
    assert_eq!(s.timestamp(), ts());
}

#[test]
fn scenario_b_range_alert_cancellation() {
    let text = SCENARIO_A.replace("BUY", "EXIT");
    let buy = outcome(&RangeAlertParser, "Premium jackpot", SCENARIO_A);
    let exit = outcome(&RangeAlertParser, "Premium jackpot", &text);
    let (buy, exit) = (buy.signal().unwrap(), exit.signal().unwrap());

    assert_eq!(exit.action(), Action::Cancel);
    assert_eq!(exit.trading_symbol(), buy.trading_symbol());
    assert_eq!(exit.entry_range(), buy.entry_range());
    assert_eq!(exit.target_range(), buy.target_range());
    assert_eq!(exit.stop_loss(), buy.stop_loss());
    assert_eq!(exit.product(), buy.product());
}

#[test]
fn scenario_c_range_alert_resolution_failure() {
    let text = "BUY #ZOMATO 150 CE NEAR 5 6 TARGET 8 9 SL-3";
    let out = outcome(&RangeAlertParser, "Premium jackpot", text);
    let f = out.failure().expect("failure");
    assert_eq!(f.message(), text);
    assert_eq!(f.error().stage(), Stage::Resolve);
    assert!(f.detail().contains("ZOMATO"), "{}", f.detail());
}

#[test]
fn scenario_d_sms_missing_stop_loss() {
    let text = "BUY NIFTY24JAN20000CE ONLY IN RANGE @ 120-130 TARGET 150 160 SL FOR TRADE @ AS PER CHART";
    let out = outcome(&SmsStyleParser, "SmsOptionsPremium", text);
    assert!(out.signal().is_none());
    let f = out.failure().expect("failure");
    assert!(matches!(
        f.error(),
        ParseError::FieldExtraction { field, .. } if field == "sl"
    ));
}

#[test]
fn scenario_e_paid_call_fallback_symbol() {
    let text = "Paid call 24TH JAN expiry BUY 46000 PE ABV 250-260 TARGET 300 350 SL-200";
    let out = outcome(&PaidCallParser::new(2024), "PaidCallPut", text);
    let s = out.signal().expect("signal");
    assert_eq!(s.trading_symbol(), "BANKNIFTY24JAN46000PE");
    assert_eq!(s.entry_range(), ["250", "260"]);
    assert_eq!(s.action(), Action::Buy);
}

#[test]
fn paid_call_with_hash_typo_resolves_underlying() {
    let text = "#FINIFTY 23 JAN expiry BUY 21000 CE ABV 90 TARGET 120 SL-70";
    let out = outcome(&PaidCallParser::new(2024), "PaidCallPut", text);
    assert_eq!(out.signal().unwrap().trading_symbol(), "FINNIFTY24JAN21000CE");
}

#[test]
fn range_alert_on_bse_underlying() {
    let text = "BUY #BANKEX 52000 CE NEAR 300 310 TARGET 350 SL-280";
    let out = outcome(&RangeAlertParser, "Premium jackpot", text);
    assert_eq!(out.signal().unwrap().trading_symbol(), "BANKEX2412952000CE");
}

#[test]
fn sms_polarity_is_inverted() {
    let plain = "BUY NIFTY24JAN20000CE ONLY IN RANGE @ 120 TARGET 150 SL FOR TRADE @ 100";
    let cancel = outcome(&SmsStyleParser, "SmsOptionsPremium", plain);
    assert_eq!(cancel.signal().unwrap().action(), Action::Cancel);

    let with_keyword = format!("{plain} EXIT AT COST");
    let buy = outcome(&SmsStyleParser, "SmsOptionsPremium", &with_keyword);
    assert_eq!(buy.signal().unwrap().action(), Action::Buy);
}

#[test]
fn every_parser_yields_exactly_one_outcome_on_garbage() {
    let parsers: Vec<(&str, Box<dyn ChannelParser>)> = vec![
        ("Premium jackpot", Box::new(RangeAlertParser)),
        ("SmsOptionsPremium", Box::new(SmsStyleParser)),
        ("PaidCallPut", Box::new(PaidCallParser::new(2024))),
    ];
    for (channel, parser) in &parsers {
        for text in ["", "   ", "good morning traders", "BUY", "|||", "TARGET SL- expiry"] {
            match outcome(parser.as_ref(), channel, text) {
                Outcome::Failure(f) => assert_eq!(f.channel(), *channel),
                Outcome::Signal(s) => panic!("{channel}: unexpected signal {s:?} for {text:?}"),
            }
        }
    }
}
