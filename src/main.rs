use clap::{Parser, Subcommand};
use tracing_subscriber;

use plugbot::application::messaging::MessageParser;
use plugbot::domain::traits::Bot;
use plugbot::infrastructure::adapters::ConsoleAdapter;
use plugbot::infrastructure::config::Config;
use plugbot::plugins::{builtin, PlugBot};

#[derive(Parser)]
#[command(name = "plugbot")]
#[command(about = "A pluggable bot framework", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config);
        }
        Commands::Version => {
            println!("plugbot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config(&cli.config);
        }
    }
}

fn run_bot(config_path: String) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting plugbot: {}", config.bot.name);

    let mut bot = PlugBot::new(config, builtin::factories());
    bot.start();
    tracing::info!("{} plugin(s) registered", bot.registry().len());

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let adapter = ConsoleAdapter::new();
        run_console_bot(adapter, bot).await;
    });
}

async fn run_console_bot(adapter: ConsoleAdapter, mut bot: PlugBot) {
    if let Err(e) = adapter.start().await {
        tracing::error!("Failed to start console adapter: {}", e);
        return;
    }

    let prefix = bot.commands().prefix().to_string();
    let parser = MessageParser::new(&prefix);
    println!(
        "Type {}help for commands; 'quit' to exit, 'reload' to reload plugins, 'reset' for a full restart",
        prefix
    );

    loop {
        let Some(line) = adapter.read_line("> ").await else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        // Admin lines handled by the host, not the command table
        match line.as_str() {
            "quit" | "exit" => break,
            "reload" => {
                bot.registry_mut().reload_all();
                continue;
            }
            "reset" => {
                bot.reset();
                continue;
            }
            _ => {}
        }

        let msg = parser.parse("console", line, None);
        match bot.handle(&msg) {
            Ok(Some(reply)) => {
                let _ = adapter.send_message("console", &reply).await;
            }
            Ok(None) => {}
            Err(e) => {
                let _ = adapter.send_message("console", &format!("Error: {}", e)).await;
            }
        }
    }

    bot.stop();
}

fn init_config(path: &str) {
    if std::path::Path::new(path).exists() {
        tracing::warn!("Config already exists at {}, not overwriting", path);
        return;
    }

    let yaml = match Config::default().to_yaml() {
        Ok(yaml) => yaml,
        Err(e) => {
            tracing::error!("Failed to render default config: {}", e);
            return;
        }
    };

    match std::fs::write(path, yaml) {
        Ok(()) => tracing::info!("Wrote default config to {}", path),
        Err(e) => tracing::error!("Failed to write config: {}", e),
    }
}
