use clap::{command, Parser};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = r###"
gptreply sends a prompt to any OpenAI-compatible chat completions API and prints the reply.

Requests are retried up to three times with a short linear backoff. The API url, key and model
are read from gptreply.toml in your config directory on every attempt, and can be overridden
with the GPTREPLY_API_URL, GPTREPLY_API_KEY and GPTREPLY_MODEL environment variables.
"###
)]
pub struct Args {
    #[command(subcommand)]
    pub subcmd: Option<SubCommands>,
}

#[derive(Parser, Debug)]
pub enum SubCommands {
    /// Send a prompt and print the reply.
    Ask(AskSubCommand),
    /// Set or get default configuration values with your gptreply.toml.
    Config(ConfigSubCommand),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Send a prompt and print the reply", long_about = None)]
pub struct AskSubCommand {
    /// The prompt to send. Multiple words are joined with spaces.
    #[arg(required = true)]
    pub prompt: Vec<String>,

    /// Give up after this many seconds, across all attempts.
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Set or get configuration values", long_about = None)]
pub struct ConfigSubCommand {
    /// Set a configuration value. Use the format key=value.
    /// `gptreply config --set model=gpt-4o`
    #[arg(short, long)]
    pub set: Option<String>,

    /// Get your current configuration value.
    /// `gptreply config --get model`
    #[arg(short, long)]
    pub get: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let args = Args::parse_from(["gptreply", "ask", "--timeout", "30", "hello", "world"]);
        match args.subcmd {
            Some(SubCommands::Ask(ask)) => {
                assert_eq!(ask.prompt, vec!["hello", "world"]);
                assert_eq!(ask.timeout, Some(30));
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn test_ask_requires_prompt() {
        assert!(Args::try_parse_from(["gptreply", "ask"]).is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let args = Args::parse_from(["gptreply", "config", "--set", "model=gpt-4o"]);
        match args.subcmd {
            Some(SubCommands::Config(config)) => {
                assert_eq!(config.set.as_deref(), Some("model=gpt-4o"));
                assert!(config.get.is_none());
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }
}
