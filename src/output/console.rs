//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = format!(
        r#"
╔═══════════════════════════════════════════════════════╗
║     StreamVault {:<38}║
║     Pausable, resumable media stream downloads        ║
╚═══════════════════════════════════════════════════════╝
"#,
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(url: &str, download_dir: &str, resume_policy: &str, chunk_size: usize) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  URL: {}", url);
    println!("  Directory: {}", download_dir);
    println!("  Resume policy: {}", resume_policy);
    println!("  Chunk size: {} bytes", chunk_size);
    println!();
}

/// Print the interactive controls available while a download runs.
pub fn print_controls() {
    println!(
        "{} {} pause/resume, {} cancel, {} cancel",
        style("Controls:").dim(),
        style("p + Enter").bold(),
        style("c + Enter").bold(),
        style("Ctrl-C").bold()
    );
}
