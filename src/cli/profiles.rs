//! List the built-in profiles.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::process::ExitCode;

use crate::profile::Profile;

/// Command to show the built-in profiles and their patterns.
#[derive(Args, Debug)]
pub struct ProfilesCommand {
    /// Only show this profile
    name: Option<String>,
}

impl ProfilesCommand {
    /// Execute the profiles command.
    pub fn execute(self) -> Result<ExitCode> {
        let profiles = match &self.name {
            Some(name) => vec![name.parse::<Profile>()?],
            None => Profile::ALL.to_vec(),
        };

        for (index, profile) in profiles.iter().enumerate() {
            if index > 0 {
                println!();
            }
            println!("{}", profile.name().cyan().bold());
            for (key, pattern) in profile.sources() {
                println!("  {:<18} {}", key.name(), pattern);
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}
