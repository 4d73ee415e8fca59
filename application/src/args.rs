//! Command line [`Args`].

use clap::Parser;

/// Pricing and billing server of a boarding house.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "CONF_FILE", default_value = "config.toml")]
    pub config: String,

    /// Apply the pending database migrations and exit without serving.
    #[arg(long)]
    pub migrate_only: bool,
}

impl Args {
    /// Parses [`Args`] of the current process.
    ///
    /// # Errors
    ///
    /// If the provided arguments are invalid or help is requested.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}
