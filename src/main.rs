use chrono::{DateTime, Utc};
use clap::{Arg, Command};
use flock_sms::processor::UNKNOWN_NAME;
use flock_sms::{Config, InboundSmsProcessor, Recipient};
use log::LevelFilter;
use std::process;

fn main() {
    let matches = Command::new("flock-sms")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keyword matching and auto-reply engine for organisation SMS accounts")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("flock-sms.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a sample configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate keyword definitions and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("body")
                .short('b')
                .long("body")
                .value_name("TEXT")
                .help("Simulate an inbound message with this body")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .value_name("NUMBER")
                .help("Sender number for the simulated message")
                .default_value("+15550000000"),
        )
        .arg(
            Arg::new("first-name")
                .long("first-name")
                .value_name("NAME")
                .help("Sender first name (defaults to the unknown-contact sentinel)")
                .default_value(UNKNOWN_NAME),
        )
        .arg(
            Arg::new("at")
                .long("at")
                .value_name("RFC3339")
                .help("Receive time for the simulated message (defaults to now)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        let config = Config::default();
        match config.to_file(generate_path) {
            Ok(()) => println!("Sample configuration written to {generate_path}"),
            Err(e) => {
                eprintln!("Error writing configuration: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match Config::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        println!("Keywords defined: {}", config.keywords.len());
        for keyword in &config.keywords {
            let status = if keyword.is_archived { " (archived)" } else { "" };
            println!("  {}{status}", keyword.keyword);
        }
        match config.validate() {
            Ok(()) => println!("Configuration is valid."),
            Err(e) => {
                eprintln!("Configuration validation failed: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let Some(body) = matches.get_one::<String>("body") else {
        eprintln!("Nothing to do: pass --body to simulate a message, or --test-config.");
        process::exit(1);
    };

    let received_at = match matches.get_one::<String>("at") {
        Some(raw) => match raw.parse::<DateTime<Utc>>() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Invalid --at timestamp: {e}");
                process::exit(1);
            }
        },
        None => Utc::now(),
    };

    let sender = Recipient {
        number: matches.get_one::<String>("from").unwrap().clone(),
        first_name: matches.get_one::<String>("first-name").unwrap().clone(),
        last_name: String::new(),
        is_blocking: false,
        do_not_reply: false,
        never_contact: false,
    };

    let processor = InboundSmsProcessor::new(config);
    let outcome = processor.process(&sender, body, received_at);

    println!("Matched: {}", outcome.matched);
    if outcome.reply.is_empty() {
        println!("Reply: (none)");
    } else {
        println!("Reply: {}", outcome.reply);
    }
    match serde_json::to_string_pretty(&outcome.commands) {
        Ok(json) => println!("Commands: {json}"),
        Err(e) => {
            eprintln!("Error serialising commands: {e}");
            process::exit(1);
        }
    }
}
