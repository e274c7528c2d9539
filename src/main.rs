mod app;
mod assist;
mod catalog;
mod command;
mod config;
mod event;
mod library;
mod rig;
mod rpc;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use app::App;
use assist::{CommandAssistant, OfflineAssistant, ToneAssistant};
use config::Settings;
use library::SetupLibrary;
use rpc::run_as_proxy;
use session::EditorSession;

/// ToneShare - guitar rig editor with undo history and a setup library
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.toneshare/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Setup library directory
    #[arg(long)]
    library: Option<PathBuf>,

    /// JSON-RPC socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Create the setup library, seed the demo setups and exit
    #[arg(long)]
    install: bool,

    /// Print the pedal and amp catalog and exit
    #[arg(long)]
    list_catalog: bool,

    /// Forward JSON-RPC between stdio and a running editor's socket
    #[arg(long)]
    proxy: bool,

    /// Start with no pedals instead of the default one
    #[arg(long)]
    empty_chain: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let mut settings = Settings::load(&config_path)?;
    if let Some(dir) = args.library {
        settings.library_dir = dir;
    }
    if let Some(path) = args.socket {
        settings.socket_path = path;
    }
    settings.empty_chain |= args.empty_chain;

    if args.list_catalog {
        print_catalog();
        return Ok(());
    }

    if args.install {
        let library = SetupLibrary::new(&settings.library_dir);
        let seeded = library.install()?;
        println!(
            "Library ready at {} ({} demo setups added)",
            library.dir().display(),
            seeded
        );
        return Ok(());
    }

    // Proxy mode requires an editor to be running (connects via socket)
    if args.proxy {
        if let Err(e) = run_as_proxy(&settings.socket_path) {
            // Write a JSON-RPC error to stdout so clients see a clear message
            let msg = format!(
                "toneshare editor is not running. Start it first with: toneshare ({})",
                e
            );
            let err_response = serde_json::json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {
                    "code": -32000,
                    "message": msg
                }
            });
            println!("{}", err_response);
            return Err(anyhow::anyhow!("{}", msg));
        }
        return Ok(());
    }

    let assistant: Box<dyn ToneAssistant> = match settings.assistant.command.split_first() {
        Some((program, rest)) => {
            log::info!("assistant: {}", program);
            Box::new(CommandAssistant::new(
                program.clone(),
                rest.to_vec(),
                settings.assistant.timeout(),
            ))
        }
        None => {
            log::info!("no assistant configured, using offline replies");
            Box::new(OfflineAssistant)
        }
    };

    let session = if settings.empty_chain {
        EditorSession::empty()
    } else {
        EditorSession::with_default_pedal()
    };

    let mut app = App::new(&settings, session, assistant)?;
    app.serve(&settings.socket_path)?;
    app.run()
}

fn print_catalog() {
    println!("Pedals:");
    for (category, pedals) in catalog::group_by_category(&catalog::filter_pedals(&Default::default())) {
        println!("  {}", category.name());
        for p in pedals {
            let keys: Vec<&str> = p.settings.iter().map(|(k, _)| *k).collect();
            println!("    {:>3}  {} {}  [{}]", p.id, p.brand, p.name, keys.join(", "));
        }
    }
    println!("Amplifiers:");
    for a in catalog::AMPS {
        let mut extras = Vec::new();
        if !a.channels.is_empty() {
            extras.push(format!("channels: {}", a.channels.join("/")));
        }
        if !a.variants.is_empty() {
            extras.push(format!("variants: {}", a.variants.join("/")));
        }
        println!("  {:>5}  {} {}  {}", a.id, a.brand, a.name, extras.join("; "));
    }
}
