mod join;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use parley_core::IceServerConfig;
use parley_core::utils::{DEFAULT_SIGNALING_PORT, DEFAULT_STUN_ADDR};
use parley_server::ServerConfig;
use std::net::{IpAddr, SocketAddr};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "WebRTC rendezvous server and command-line peer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve(ServeArgs),
    /// Join a room and call everyone in it.
    Join(join::JoinArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_SIGNALING_PORT)]
    port: u16,

    #[arg(long, env = "PARLEY_STUN", default_value = DEFAULT_STUN_ADDR)]
    stun: String,

    #[arg(long, env = "TURN_URL")]
    turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME", requires = "turn_url")]
    turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL", requires = "turn_url")]
    turn_credential: Option<String>,

    #[arg(long, default_value_t = 1024)]
    router_queue: usize,
}

impl ServeArgs {
    fn into_config(self) -> ServerConfig {
        let mut ice_servers = vec![IceServerConfig::stun(self.stun)];
        if let Some(url) = self.turn_url {
            ice_servers.push(IceServerConfig {
                urls: vec![url],
                username: self.turn_username,
                credential: self.turn_credential,
            });
        }

        ServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
            ice_servers,
            router_queue: self.router_queue,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Serve(args) => {
            let config = args.into_config();
            println!(
                "{} {}",
                "📡 Parley signaling on".green().bold(),
                config.bind_addr.to_string().cyan()
            );
            parley_server::serve(config)
                .await
                .context("Signaling server stopped")?;
        }
        Commands::Join(args) => join::run(args).await?,
    }

    Ok(())
}
