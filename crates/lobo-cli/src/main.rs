use clap::Parser;
use tracing_subscriber::EnvFilter;

use lobo_client::config::ClientConfig;
use lobo_client::session::LocalUser;

mod client;
mod input;
mod render;

use client::Destination;

#[derive(Parser)]
#[command(name = "lobo")]
#[command(about = "Play Lobo from the terminal", long_about = None)]
struct Cli {
    /// Server base URL [default: $LOBO_SERVER or http://127.0.0.1:3000]
    #[arg(short, long)]
    server: Option<String>,

    /// Your user id
    #[arg(short, long)]
    user: String,

    /// Your display name
    #[arg(short, long)]
    name: String,

    /// Avatar key
    #[arg(long)]
    avatar: Option<String>,

    /// Room ID to join
    #[arg(short, long, conflicts_with = "create")]
    room: Option<String>,

    /// Create a room with this name and join it
    #[arg(short, long)]
    create: Option<String>,

    /// Room password; a created room becomes private
    #[arg(short, long)]
    password: Option<String>,

    /// Seconds on the local day/night clock [default: $LOBO_PHASE_SECS or 90]
    #[arg(long)]
    phase_secs: Option<u32>,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(server) = &self.server {
            config.server_url.clone_from(server);
        }
        if let Some(secs) = self.phase_secs {
            config.phase_secs = secs.max(1);
        }
        config
    }

    fn destination(&self) -> Destination {
        match (&self.create, &self.room) {
            (Some(name), _) => Destination::Create {
                name: name.clone(),
                password: self.password.clone(),
            },
            (None, Some(room_id)) => Destination::Join {
                room_id: room_id.clone(),
                password: self.password.clone(),
            },
            (None, None) => Destination::Lobby,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    let destination = cli.destination();

    let mut user = LocalUser::new(cli.user, cli.name);
    user.avatar = cli.avatar;

    println!("Conectando a {} como '{}'...", config.server_url, user.name);

    if let Err(e) = client::start_client(config, user, destination).await {
        eprintln!("Error: {e}");
    }
}
