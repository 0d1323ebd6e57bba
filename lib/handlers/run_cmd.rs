//! Program runner handler.

use super::common::{EnvOptions, absolute_dir};
use crate::env::ModusToolboxEnvironment;
use crate::error::{MtbError, MtbResult};
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Run a program and stream its output lines.
pub async fn run_program(
    options: &EnvOptions,
    program: &str,
    args: &[String],
    cwd: Option<PathBuf>,
) -> MtbResult<()> {
    let cwd = absolute_dir(cwd)?;
    let env = ModusToolboxEnvironment::new(options.to_config()?);

    let mut streamed = Vec::new();
    let mut print_line = |line: &str| {
        println!("{}", line);
        streamed.push(line.to_string());
    };
    let callback: &mut (dyn FnMut(&str) + Send) = &mut print_line;
    let (code, output) = env.run_command(program, args, &cwd, Some(callback)).await?;

    for line in unstreamed(&output, &streamed) {
        println!("{}", line);
    }

    if code != 0 {
        return Err(MtbError::Command {
            command: std::iter::once(program.to_string())
                .chain(args.iter().cloned())
                .collect::<Vec<_>>()
                .join(" "),
            code,
            output: Vec::new(),
        });
    }
    Ok(())
}

/// Output lines the callback never saw.
///
/// Streamed lines appear in `output` in the order they were streamed, so the
/// rest are the unterminated ends of stdout or stderr, wherever they landed.
fn unstreamed<'a>(output: &'a [String], streamed: &[String]) -> Vec<&'a str> {
    let mut pending = streamed.iter().peekable();
    output
        .iter()
        .filter(|line| {
            if pending.peek() == Some(line) {
                pending.next();
                false
            } else {
                true
            }
        })
        .map(String::as_str)
        .collect()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
