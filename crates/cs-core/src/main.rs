use std::io::{self, IsTerminal, Read};

use cs_core::config::Config;
use cs_core::logging::init_logging;
use cs_core::run::run_message;

fn print_help() {
    println!("chatstream — stream a chat reply to the terminal");
    println!();
    println!("Usage:");
    println!("  chatstream \"message\"            Send a message, print the reply as it streams");
    println!("  echo \"message\" | chatstream     Message from stdin");
    println!();
    println!("Options:");
    println!("  --verbose, -v     Debug logging to stderr");
    println!("  --version         Print version");
    println!("  --help            Print this help");
    println!();
    println!("Environment:");
    println!("  CHATSTREAM_API_URL   Override server.base_url");
    println!("  CHATSTREAM_TOKEN     Bearer token (default token source)");
    println!("  CHATSTREAM_LOG       tracing filter directive");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("chatstream {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");

    let config = Config::load_or_default();
    init_logging(&config.log.filter, verbose);

    let non_flag_args: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
    let message = if !non_flag_args.is_empty() {
        non_flag_args
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    } else if !io::stdin().is_terminal() {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("error: failed to read stdin: {e}");
            std::process::exit(1);
        }
        buf.trim().to_string()
    } else {
        String::new()
    };

    if message.trim().is_empty() {
        print_help();
        std::process::exit(2);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create async runtime: {e}");
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(run_message(&config, &message));
    std::process::exit(code);
}
