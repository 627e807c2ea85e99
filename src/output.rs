use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};

/// Consistent, colored user-facing messages. Colors are enabled only when
/// the stream being written is a TTY.
fn stdout_is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_is_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if stdout_is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

/// Print a plain line (no prefix). Per-item results such as
/// "Moved X -> Y" go through here so scripts can match on them.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Ask a yes/no question on stderr and read one line from stdin.
/// Returns the raw answer; EOF yields an empty string.
pub fn ask(question: &str) -> io::Result<String> {
    let mut err = io::stderr().lock();
    if stderr_is_tty() {
        write!(err, "{} {} [y/N] ", "?".magenta().bold(), question)?;
    } else {
        write!(err, "? {} [y/N] ", question)?;
    }
    err.flush()?;
    drop(err);

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer)
}
