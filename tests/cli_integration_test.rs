//! CLI integration tests.
//!
//! Tests cover:
//! - Settings loading from INI files on disk
//! - Template generation from symbol lists
//! - Validate and run commands against JSON documents on disk

mod common;

use clap::Parser;
use common::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use stratbuilder::adapters::static_quote_adapter::StaticQuoteAdapter;
use stratbuilder::adapters::json_document::{load_document, parse_document, to_json};
use stratbuilder::cli::{self, Cli};
use stratbuilder::domain::builder::{Step, StrategyBuilder};
use stratbuilder::domain::config_validation::BuilderSettings;
use stratbuilder::domain::error::BuilderError;
use stratbuilder::domain::outcome::SubmissionReceipt;
use stratbuilder::domain::timeframe::Timeframe;

const VALID_INI: &str = r#"
[builder]
default_investment = 5000
default_max_loss = 250
default_timeframe = 1d

[submission]
latency_ms = 0

[quotes]
poll_interval_secs = 20
"#;

const VALID_DOCUMENT: &str = r#"{"stocks":[
  {"symbol":"aapl","investment":1000,"max_loss":50,"timeframe":"1h",
   "start_date":"2023-01-01","end_date":"","since_ipo":false,
   "entry_rules":[
     {"indicator":"rsi","timeframe":"1h","params":{"period":14,"source":"close"},
      "operator":"crossesBelow","value":30},
     {"indicator":"sma","params":{"period":20},"operator":"crossesAbove",
      "compareTo":"sma","comparePeriod":50}
   ],
   "exit_conditions":[{"type":"take_profit","value":100},{"type":"stop_loss","value":50}],
   "earningsPlay":{"enabled":true,"daysBefore":3,"daysAfter":1},
   "newsPlay":{"enabled":false,"category":"all"}}
]}"#;

const INVALID_DOCUMENT: &str = r#"{"stocks":[
  {"symbol":"tsla","investment":100,"max_loss":150,
   "entry_rules":[{"indicator":"cci","operator":">"}],
   "exit_conditions":[{"type":"stop_loss","value":5}]}
]}"#;

fn run_cli(args: &[&str]) -> ExitCode {
    let mut argv = vec!["stratbuilder"];
    argv.extend_from_slice(args);
    cli::run(Cli::parse_from(argv))
}

mod settings {
    use super::*;

    #[test]
    fn load_settings_from_ini() {
        let file = write_temp(VALID_INI, ".ini");
        let settings = cli::load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.defaults.investment, 5000.0);
        assert_eq!(settings.defaults.max_loss, 250.0);
        assert_eq!(settings.defaults.timeframe, Timeframe::D1);
    }

    #[test]
    fn no_config_uses_defaults() {
        assert_eq!(cli::load_settings(None).unwrap(), BuilderSettings::default());
    }

    #[test]
    fn invalid_config_value_rejected() {
        let file = write_temp("[builder]\ndefault_max_loss = -3\n", ".ini");
        assert!(matches!(
            cli::load_settings(Some(file.path())),
            Err(BuilderError::ConfigInvalid { .. })
        ));
    }
}

mod template {
    use super::*;

    #[test]
    fn template_uses_configured_defaults() {
        let file = write_temp(VALID_INI, ".ini");
        let settings = cli::load_settings(Some(file.path())).unwrap();
        let doc = cli::template_document("aapl, nvda", &settings).unwrap();
        assert_eq!(doc.symbols(), vec!["AAPL", "NVDA"]);
        assert!(doc.assets().iter().all(|a| a.investment == 5000.0));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn template_rejects_duplicate_symbols() {
        let err = cli::template_document("spy,SPY", &BuilderSettings::default()).unwrap_err();
        assert!(matches!(err, BuilderError::DuplicateSymbol(_)));
    }

    #[test]
    fn template_output_round_trips_through_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("template.json");
        let code = run_cli(&[
            "template",
            "--symbols",
            "msft,amd",
            "--output",
            path.to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::SUCCESS);
        let doc = load_document(&path).unwrap();
        assert_eq!(doc.symbols(), vec!["MSFT", "AMD"]);
    }
}

mod validate {
    use super::*;

    #[test]
    fn valid_document_passes() {
        let file = write_temp(VALID_DOCUMENT, ".json");
        assert_eq!(
            run_cli(&["validate", "--document", file.path().to_str().unwrap()]),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn invalid_document_reports_problems() {
        let doc = parse_document(INVALID_DOCUMENT).unwrap();
        let problems = doc.problems();
        // sizing, missing threshold
        assert!(problems.len() >= 2, "{problems:?}");
        assert!(problems.iter().all(|p| p.symbol == "tsla"));

        let file = write_temp(INVALID_DOCUMENT, ".json");
        let code = run_cli(&["validate", "--document", file.path().to_str().unwrap()]);
        assert_ne!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn malformed_symbol_fails_validate_and_run_alike() {
        let json = VALID_DOCUMENT.replace("\"aapl\"", "\"aa pl\"");
        let file = write_temp(&json, ".json");
        let path = file.path().to_str().unwrap();
        assert_eq!(run_cli(&["validate", "--document", path]), ExitCode::from(3));
        assert_eq!(run_cli(&["run", "--document", path]), ExitCode::from(3));
    }

    #[test]
    fn missing_document_fails() {
        let code = run_cli(&["validate", "--document", "/nonexistent/doc.json"]);
        assert_eq!(code, ExitCode::from(1));
    }
}

mod run_command {
    use super::*;

    #[test]
    fn walk_to_review_stops_at_failing_gate() {
        let doc = parse_document(INVALID_DOCUMENT).unwrap();
        let mut builder = StrategyBuilder::default();
        builder.import(doc).unwrap();
        let err = cli::walk_to_review(&mut builder).unwrap_err();
        assert!(matches!(
            err,
            BuilderError::GateFailed {
                step: Step::Sizing,
                ..
            }
        ));
    }

    #[test]
    fn run_submits_and_writes_receipt() {
        let doc_file = write_temp(VALID_DOCUMENT, ".json");
        let dir = tempfile::TempDir::new().unwrap();
        let receipt_path = dir.path().join("receipt.json");
        let code = run_cli(&[
            "run",
            "--document",
            doc_file.path().to_str().unwrap(),
            "--output",
            receipt_path.to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::SUCCESS);

        let receipt: SubmissionReceipt =
            serde_json::from_str(&std::fs::read_to_string(&receipt_path).unwrap()).unwrap();
        assert_eq!(receipt.results.len(), 1);
        assert_eq!(receipt.results[0].symbol, "AAPL");
        assert_eq!(receipt.results[0].summary.num_trades, 2);
    }

    #[test]
    fn run_with_rejecting_backend_fails() {
        let doc_file = write_temp(VALID_DOCUMENT, ".json");
        let cfg = write_temp("[submission]\nreject_message = closed for maintenance\n", ".ini");
        let code = run_cli(&[
            "run",
            "--document",
            doc_file.path().to_str().unwrap(),
            "--config",
            cfg.path().to_str().unwrap(),
        ]);
        assert_eq!(code, ExitCode::from(5));
    }

    #[test]
    fn run_with_invalid_document_fails_at_gate() {
        let doc_file = write_temp(INVALID_DOCUMENT, ".json");
        let code = run_cli(&["run", "--document", doc_file.path().to_str().unwrap()]);
        assert_eq!(code, ExitCode::from(4));
    }

    #[test]
    fn document_serializes_resolved_params() {
        let doc = parse_document(VALID_DOCUMENT).unwrap();
        let json: serde_json::Value = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();
        let sma = &json["stocks"][0]["entry_rules"][1];
        assert_eq!(sma["params"]["source"], "close");
        assert_eq!(sma["compareTo"], "sma");
        assert_eq!(sma["comparePeriod"], 50);
        assert!(json["stocks"][0]["end_date"].is_null());
    }
}

mod quote_command {
    use super::*;

    #[test]
    fn prints_quote_from_price_flag() {
        assert_eq!(
            run_cli(&["quote", "--symbol", "aapl", "--price", "189.5"]),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn reads_prices_from_config() {
        let cfg = write_temp("[quotes]\nprices = NVDA:121.25\npoll_interval_secs = 1\n", ".ini");
        assert_eq!(
            run_cli(&[
                "quote",
                "--symbol",
                "nvda",
                "--config",
                cfg.path().to_str().unwrap(),
            ]),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn unknown_symbol_fails_fast() {
        assert_eq!(run_cli(&["quote", "--symbol", "zzzz"]), ExitCode::from(3));
    }

    #[tokio::test(start_paused = true)]
    async fn polls_at_configured_interval() {
        let file = write_temp("[quotes]\npoll_interval_secs = 5\n", ".ini");
        let settings = cli::load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.poll_interval, Duration::from_secs(5));

        let port = Arc::new(StaticQuoteAdapter::new([("SPY", 500.0)]));
        let start = tokio::time::Instant::now();
        let quotes = cli::poll_quotes(port, "SPY", &settings, 3).await.unwrap();
        assert_eq!(quotes.len(), 3);
        assert!(quotes.iter().all(|q| q.symbol == "SPY" && q.price == 500.0));
        assert!(start.elapsed() >= Duration::from_secs(10));
    }
}
