use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use seedr_api::{ClientConfig, Folder, SeedrClient, TorrentSource};
use tracing_subscriber::EnvFilter;

mod store;

use store::TokenStore;

#[derive(Parser)]
#[command(name = "seedr", version, about = "Seedr.cc command-line client")]
struct Cli {
    /// Token file (default: <config dir>/seedr/token.json)
    #[arg(long, global = true, value_name = "PATH")]
    token_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with email and password, or with the device-code flow
    Login {
        #[arg(long, requires = "password", required_unless_present = "device")]
        email: Option<String>,
        #[arg(long, requires = "email")]
        password: Option<String>,
        /// Authorize this machine from a browser instead
        #[arg(long, conflicts_with = "email")]
        device: bool,
    },
    /// Forget the saved token
    Logout,
    /// Show the account profile
    Whoami,
    /// Show storage and bandwidth usage
    Usage,
    /// List a folder
    Ls {
        /// Folder ID (root if omitted)
        #[arg(default_value = "0")]
        folder: String,
    },
    /// Add a torrent from a magnet link, a local file, a URL or the wishlist
    #[command(group(ArgGroup::new("source").required(true)))]
    Add {
        #[arg(group = "source")]
        magnet: Option<String>,
        /// Local .torrent file
        #[arg(long, group = "source", value_name = "PATH")]
        file: Option<PathBuf>,
        /// Remote .torrent file
        #[arg(long, group = "source")]
        url: Option<String>,
        /// Wishlist entry ID
        #[arg(long, group = "source", value_name = "ID")]
        wishlist: Option<String>,
        /// Target folder ID
        #[arg(long)]
        folder: Option<String>,
    },
    /// Find torrents on a web page
    Scan { url: String },
    /// Print a download link for a file
    Fetch { file_id: String },
    /// Create a zip archive of a folder
    Archive { folder_id: String },
    /// Search files and folders
    Search { query: String },
    /// Create a folder
    Mkdir { name: String },
    /// Rename a file or folder
    Rename {
        kind: RenameKind,
        id: String,
        name: String,
    },
    /// Delete a file, folder, torrent or wishlist entry
    Rm { kind: RemoveKind, id: String },
    /// List devices authorized on the account
    Devices,
    /// Print the saved token
    Token {
        #[arg(short, long, default_value = "json")]
        format: TokenFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum RenameKind {
    File,
    Folder,
}

#[derive(Clone, ValueEnum)]
enum RemoveKind {
    File,
    Folder,
    Torrent,
    Wishlist,
}

#[derive(Clone, ValueEnum)]
enum TokenFormat {
    Json,
    Base64,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match cli.token_file {
        Some(path) => TokenStore::new(path),
        None => TokenStore::default_location()?,
    };

    match cli.command {
        Command::Login {
            email,
            password,
            device,
        } => cmd_login(&store, email, password, device),
        Command::Logout => cmd_logout(&store),
        Command::Token { format } => cmd_token(&store, &format),
        command => {
            let client = connect(&store)?;
            run(&client, command)
        }
    }
}

/// Commands that need a logged-in client.
fn run(client: &SeedrClient, command: Command) -> Result<()> {
    match command {
        Command::Whoami => cmd_whoami(client),
        Command::Usage => cmd_usage(client),
        Command::Ls { folder } => cmd_ls(client, &folder),
        Command::Add {
            magnet,
            file,
            url,
            wishlist,
            folder,
        } => {
            let source = match (magnet, file, url, wishlist) {
                (Some(m), ..) => TorrentSource::Magnet(m),
                (_, Some(f), ..) => TorrentSource::File(f),
                (_, _, Some(u), _) => TorrentSource::Url(u),
                (.., Some(w)) => TorrentSource::Wishlist(w),
                _ => bail!("nothing to add"),
            };
            cmd_add(client, source, folder.as_deref())
        }
        Command::Scan { url } => cmd_scan(client, &url),
        Command::Fetch { file_id } => {
            let link = client.fetch_file(&file_id)?;
            println!("{} ({})", link.name, human_size(link.size));
            println!("{}", link.url);
            Ok(())
        }
        Command::Archive { folder_id } => {
            let archive = client.create_archive(&folder_id)?;
            println!("Archive {} -> {}", archive.archive_id, archive.archive_url);
            Ok(())
        }
        Command::Search { query } => {
            let found = client.search_files(&query)?;
            print_folder(&found);
            Ok(())
        }
        Command::Mkdir { name } => {
            client.add_folder(&name)?;
            println!("Created {name}");
            Ok(())
        }
        Command::Rename { kind, id, name } => {
            match kind {
                RenameKind::File => client.rename_file(&id, &name)?,
                RenameKind::Folder => client.rename_folder(&id, &name)?,
            };
            println!("Renamed {id} -> {name}");
            Ok(())
        }
        Command::Rm { kind, id } => {
            match kind {
                RemoveKind::File => client.delete_file(&id)?,
                RemoveKind::Folder => client.delete_folder(&id)?,
                RemoveKind::Torrent => client.delete_torrent(&id)?,
                RemoveKind::Wishlist => client.delete_wishlist(&id)?,
            };
            println!("Deleted {id}");
            Ok(())
        }
        Command::Devices => cmd_devices(client),
        Command::Login { .. } | Command::Logout | Command::Token { .. } => {
            unreachable!("handled before connecting")
        }
    }
}

/// Build a client from the saved token; refreshed tokens are written back.
fn connect(store: &TokenStore) -> Result<SeedrClient> {
    let token = store
        .load()?
        .context("not logged in; run `seedr login` first")?;
    let config = ClientConfig::from_env()?;
    let writer = store.clone();
    let client = SeedrClient::new(token, config)?.on_token_refresh(move |token| {
        if let Err(e) = writer.save(&token) {
            eprintln!("warning: failed to save refreshed token: {e:#}");
        }
    });
    Ok(client)
}

// ── login / logout / token ──

fn cmd_login(
    store: &TokenStore,
    email: Option<String>,
    password: Option<String>,
    device: bool,
) -> Result<()> {
    let config = ClientConfig::from_env()?;
    let client = if device {
        device_login(config)?
    } else {
        let email = email.context("--email is required")?;
        let password = password.context("--password is required")?;
        SeedrClient::from_password(&email, &password, config).context("login failed")?
    };
    store.save(&client.token())?;
    println!("Logged in. Token saved to {}", store.path().display());
    Ok(())
}

fn device_login(config: ClientConfig) -> Result<SeedrClient> {
    let code = SeedrClient::get_device_code(&config).context("failed to request a device code")?;

    println!("Open {} and enter the code: {}", code.verification_url, code.user_code);
    match QrCode::new(&code.verification_url) {
        Ok(qr) => println!("\n{}\n", qr.render::<Dense1x2>().quiet_zone(true).build()),
        Err(e) => tracing::debug!(error = %e, "cannot render QR code"),
    }
    print!("Press Enter once the device is approved...");
    std::io::stdout().flush()?;
    std::io::stdin().lock().read_line(&mut String::new())?;

    SeedrClient::from_device_code(&code.device_code, config).context("device authorization failed")
}

fn cmd_logout(store: &TokenStore) -> Result<()> {
    store.clear()?;
    println!("Token removed.");
    Ok(())
}

fn cmd_token(store: &TokenStore, format: &TokenFormat) -> Result<()> {
    let token = store.load()?.context("not logged in")?;
    match format {
        TokenFormat::Json => println!("{}", token.to_json()),
        TokenFormat::Base64 => println!("{}", token.to_base64()),
    }
    Ok(())
}

// ── account ──

fn cmd_whoami(client: &SeedrClient) -> Result<()> {
    let s = client.get_settings()?;
    let a = &s.account;
    println!("User:    {} (id={})", a.username, a.user_id);
    println!("Email:   {}", a.email);
    println!("Plan:    {}", if a.premium { a.package_name.as_str() } else { "free" });
    println!("Country: {}", s.country);
    println!("Storage: {} / {}", human_size(a.space_used), human_size(a.space_max));
    Ok(())
}

fn cmd_usage(client: &SeedrClient) -> Result<()> {
    let u = client.get_memory_bandwidth()?;
    println!("Storage:   {} / {}", human_size(u.space_used), human_size(u.space_max));
    println!("Bandwidth: {} / {}", human_size(u.bandwidth_used), human_size(u.bandwidth_max));
    Ok(())
}

fn cmd_devices(client: &SeedrClient) -> Result<()> {
    let devices = client.get_devices()?;
    if devices.is_empty() {
        println!("No devices.");
    }
    for d in devices {
        println!("  {} ({})", d.client_name, d.client_id);
    }
    Ok(())
}

// ── files / torrents ──

fn cmd_ls(client: &SeedrClient, folder: &str) -> Result<()> {
    let listing = client.list_contents(folder)?;
    print_folder(&listing.folder);
    println!(
        "\n{} used of {}",
        human_size(listing.space_used),
        human_size(listing.space_max)
    );
    Ok(())
}

fn cmd_add(client: &SeedrClient, source: TorrentSource, folder: Option<&str>) -> Result<()> {
    let added = client.add_torrent(source, folder)?;
    println!("Added [{}] {}", added.user_torrent_id, added.title);
    Ok(())
}

fn cmd_scan(client: &SeedrClient, url: &str) -> Result<()> {
    let page = client.scan_page(url)?;
    if page.torrents.is_empty() {
        println!("No torrents found.");
    }
    for t in &page.torrents {
        println!("  {} ({})", t.title, human_size(t.size));
        println!("    {}", t.magnet);
    }
    Ok(())
}

fn print_folder(folder: &Folder) {
    for f in &folder.folders {
        println!("  [{}] {}/  {}", f.id, f.name, human_size(f.size));
    }
    for f in &folder.files {
        println!("  [{}] {}  {}", f.id, f.name, human_size(f.size));
    }
    for t in &folder.torrents {
        println!("  [{}] {}  downloading {}%", t.id, t.name, t.progress);
    }
}

#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
