use std::io::Write;

use anyhow::Error;
use tracing::info;

use crate::args::ConfigSubCommand;
use crate::repos::config::{FileConfig, CONFIG_KEYS};

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn display_value(key: &str, value: &str) -> String {
    if key == "api_key" {
        mask_key(value)
    } else {
        value.to_string()
    }
}

pub fn execute<W: Write>(
    source: &FileConfig,
    cmd: &ConfigSubCommand,
    out: &mut W,
) -> Result<(), Error> {
    if let Some(assignment) = &cmd.set {
        source.set_value(assignment)?;
        info!("Updated {}", source.path().display());
    }

    if let Some(key) = &cmd.get {
        let value = source.get_value(key)?;
        writeln!(out, "{}", display_value(key, &value))?;
    }

    if cmd.set.is_none() && cmd.get.is_none() {
        writeln!(out, "# {}", source.path().display())?;
        for key in CONFIG_KEYS {
            let value = source.get_value(key)?;
            writeln!(out, "{} = {}", key, display_value(key, &value))?;
        }
    }
    Ok(())
}

pub fn run(source: &FileConfig, cmd: &ConfigSubCommand) -> Result<(), Error> {
    execute(source, cmd, &mut std::io::stdout())
}
