use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Terminal chat client for Google's Gemini models")]
pub struct Cli {
    /// Optional command to run; without one the full-screen chat starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a one-off message and stream the reply to stdout
    Ask {
        /// The message to send
        #[arg(required = true)]
        message: Vec<String>,

        /// File to attach for analysis
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Generate an image and write the JPEG to disk
    Image {
        /// The image description
        #[arg(required = true)]
        prompt: Vec<String>,

        /// Output path
        #[arg(short, long, default_value = "charty-image.jpg")]
        output: PathBuf,
    },
}
