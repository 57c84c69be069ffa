//! Exercises the full pipeline end to end: mount a server/export, then stat a path, against the
//! in-memory `LoopbackTransport`. Mirrors the teacher crate's `demofs`/`mirrorfs` examples in
//! spirit, driving the library's public API instead of a real network connection.

use clap::Parser;
use nfs4_mamont::config::ClientConfig;
use nfs4_mamont::transport::loopback::LoopbackTransport;
use nfs4_mamont::Context;

#[derive(Parser, Debug)]
#[command(about = "Mount an NFSv4 export and stat a path against it")]
struct Args {
    /// Server address to mount from.
    #[arg(long)]
    server: Option<String>,

    /// Export path to mount.
    #[arg(long)]
    export: Option<String>,

    /// Path to stat, resolved against the export root once mounted.
    #[arg(long, default_value = "/")]
    path: String,

    /// Path to a TOML config file supplying defaults for --server/--export.
    #[arg(long, default_value = "mount_stat.toml")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = ClientConfig::load(&args.config).unwrap_or_default();

    let server = args.server.or(config.server).unwrap_or_else(|| "127.0.0.1".to_string());
    let export = args.export.or(config.export).unwrap_or_else(|| "/".to_string());
    let client_name = config.client_name.unwrap_or_else(|| "mount_stat-demo".to_string());

    let transport = LoopbackTransport::new();
    transport.insert_file("/hello.txt", 13).await;

    let mut ctx = Context::new(client_name);
    if let Err(err) = ctx.mount(&transport, &server, &export).await {
        eprintln!("mount failed: {err}");
        std::process::exit(1);
    }

    match ctx.stat(&transport, &args.path, false).await {
        Ok(stat) => println!("{:#?}", stat),
        Err(err) => {
            eprintln!("stat failed: {err}");
            std::process::exit(1);
        }
    }
}
