use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "eiendom",
    about = "Local map server with cached Kartverket property polygons",
    version
)]
pub struct Cli {
    /// Config file [default: ./eiendom.json, fallback ~/.config/eiendom/config.json]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Owners file (array of {matrikkelnummer, eier})
    #[arg(long, global = true, value_name = "FILE")]
    pub owners: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve static files, GPX tracks and the property API (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        bind: Option<IpAddr>,
    },
    /// Fetch every owner's polygons into a static GeoJSON file
    Prefetch {
        /// Output file [default: owners_polygons.geo.json]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Keep only the first polygon per property
        #[arg(long)]
        first_only: bool,
    },
}
