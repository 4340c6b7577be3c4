use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "reminders-bridge")]
#[command(about = "Local bridge from the browser extension to Apple Reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the bridge on the loopback interface. A new auth token is generated and written to the token file on every start.
    Serve {
        /// Config file path (default: REMINDERS_BRIDGE_CONFIG_PATH or ~/.reminders-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 19092)
        #[arg(long, short)]
        port: Option<u16>,

        /// Where to write the auth token (default: bridge_config.json next to the executable)
        #[arg(long, value_name = "PATH")]
        token_file: Option<std::path::PathBuf>,
    },

    /// Print the script that would be sent to the interpreter for these fields, without running it.
    Script {
        /// Reminder title
        #[arg(long)]
        text: Option<String>,

        /// Due date (ISO-8601, e.g. 2024-02-02T10:00:00.000Z)
        #[arg(long, value_name = "ISO")]
        due: Option<String>,

        /// Source page title (goes into the notes)
        #[arg(long)]
        source_title: Option<String>,

        /// Source page URL (goes into the notes)
        #[arg(long)]
        source_url: Option<String>,

        /// Target list (default from config)
        #[arg(long)]
        list: Option<String>,

        /// Config file path (default: REMINDERS_BRIDGE_CONFIG_PATH or ~/.reminders-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("reminders-bridge {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve {
            config,
            port,
            token_file,
        }) => {
            if let Err(e) = run_serve(config, port, token_file).await {
                log::error!("bridge failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Script {
            text,
            due,
            source_title,
            source_url,
            list,
            config,
        }) => {
            let request = lib::reminder::ReminderRequest {
                text,
                due_at: due,
                source_url,
                source_title,
                list_name: list,
            };
            if let Err(e) = run_script(config, request) {
                log::error!("script failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    token_file: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let (mut config, _) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.bridge.port = p;
    }
    if let Some(path) = token_file {
        config.bridge.token_file = Some(path);
    }
    let runner = Arc::new(lib::exec::Interpreter::new(
        config.reminders.interpreter.clone(),
        config.reminders.interpreter_args.clone(),
    ));
    let bridge = lib::bridge::Bridge::bind(&config, runner).await?;
    print_banner(&bridge)?;
    bridge.serve().await
}

fn run_script(
    config_path: Option<std::path::PathBuf>,
    request: lib::reminder::ReminderRequest,
) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let reminder = request.validate(&config.reminders.default_list)?;
    print!("{}", reminder.script());
    Ok(())
}

fn print_banner(bridge: &lib::bridge::Bridge) -> anyhow::Result<()> {
    let addr = bridge.local_addr()?;
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("Apple Reminders Bridge - SECURITY NOTICE");
    println!("{}", rule);
    println!("Bridge running on: http://{}{}", addr, lib::bridge::REMINDER_PATH);
    println!("Auth Token: {}", bridge.token().as_str());
    println!();
    println!("SETUP:");
    match bridge.token_file() {
        Some(path) => {
            println!("- Token saved to {}", path.display());
            println!("- The extension reads the token from that file; no manual copy needed");
        }
        None => {
            println!("- Token file could not be written");
            println!("- Copy the token above into the extension settings manually");
        }
    }
    println!();
    println!("SECURITY:");
    println!("- Only run this bridge when needed");
    println!("- Stop the bridge when not in use (Ctrl+C)");
    println!("- Token changes each restart");
    println!("- Bridge only accepts connections from localhost");
    println!();
    println!("Press Ctrl+C to stop");
    println!("{}", rule);
    Ok(())
}
