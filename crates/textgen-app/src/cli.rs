use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "textgen",
    about = "Load the Gemma and gpt-oss text-generation pipelines and run one example prompt on each"
)]
pub struct Cli {
    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_is_valid() {
        let cli = Cli::try_parse_from(["textgen"]).unwrap();
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag() {
        let cli = Cli::try_parse_from(["textgen", "--config", "cfg.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
    }

    #[test]
    fn unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["textgen", "--model", "x"]).is_err());
    }
}
