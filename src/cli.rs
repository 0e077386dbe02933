use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory holding config.yaml
    #[clap(long, env = "FORVO_AUDIO_BASE_PATH")]
    pub base_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve audio source lists over http
    Serve {
        /// Port to listen on, overrides config
        #[clap(short, long)]
        port: Option<u16>,

        /// Default site language, overrides config
        #[clap(short, long)]
        language: Option<String>,
    },

    /// Resolve a single term and print the audio source list
    Lookup {
        term: String,

        /// Kana reading, tried when the term itself has no pronunciations
        #[clap(short, long, default_value = "")]
        reading: String,

        /// Site language, overrides config
        #[clap(short, long)]
        language: Option<String>,

        /// Print every lookup stage instead of the first non-empty one
        #[clap(long, default_value = "false")]
        debug: bool,
    },
}
