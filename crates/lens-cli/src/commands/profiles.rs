//! Profiles command implementation.

use crate::error::Result;
use crate::output::Formatter;
use lens_extractor::Profile;

/// Execute the profiles command.
pub fn execute_profiles(formatter: &Formatter) -> Result<()> {
    let profiles = Profile::builtins()?;
    println!("{}", formatter.profiles(&profiles)?);
    Ok(())
}
