//! `nativepack list` command

use anyhow::Result;

use nativepack::ops::pipeline;
use nativepack::util::Shell;

pub fn execute(shell: &Shell) -> Result<()> {
    let graph = pipeline()?;
    let default = graph.default_target();

    let width = graph
        .listed()
        .map(|t| t.name().len())
        .max()
        .unwrap_or(0);

    for target in graph.listed() {
        let marker = if Some(target.name()) == default {
            " (default)"
        } else {
            ""
        };
        shell.print(format!(
            "{:<width$}  {}{}",
            target.name(),
            target.get_description(),
            marker,
            width = width
        ));
    }

    Ok(())
}
