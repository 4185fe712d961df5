use super::EXIT_SUCCESS;
use clap::{Command, CommandFactory};
use std::path::Path;

fn write_page(cmd: Command, dir: &Path, page: &str) -> Result<(), String> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.name(page.to_owned()))
        .render(&mut buf)
        .map_err(|e| format!("man page render failed for {page}: {e}"))?;
    let path = dir.join(format!("{page}.1"));
    std::fs::write(&path, &buf).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

/// One page for the binary plus one `<bin>-<command>.1` page per subcommand.
pub fn run<C: CommandFactory>(dir: &Path) -> Result<u8, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
    let cmd = C::command();
    let bin = cmd.get_name().to_owned();
    write_page(cmd.clone(), dir, &bin)?;
    let mut written = 1;
    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "help") {
        write_page(sub.clone(), dir, &format!("{bin}-{}", sub.get_name()))?;
        written += 1;
    }
    println!("{written} man pages written to {}", dir.display());
    Ok(EXIT_SUCCESS)
}
