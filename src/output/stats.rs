//! Session and stream reporting.

use console::style;
use indicatif::HumanBytes;

use crate::download::{SessionSnapshot, SessionState};
use crate::fs::display_title;
use crate::provider::StreamDescriptor;

/// Human-readable size, or `unknown size` when the provider gave none.
fn size_label(total: u64) -> String {
    if total == 0 {
        "unknown size".to_string()
    } else {
        HumanBytes(total).to_string()
    }
}

/// Print the streams a provider offers, best last.
pub fn print_stream_list(title: &str, streams: &[StreamDescriptor]) {
    println!();
    println!(
        "{}",
        style(format!("Streams for {}:", display_title(title))).bold()
    );
    for stream in streams {
        println!(
            "  {:<10} {:<6} {}",
            style(&stream.quality_label).cyan(),
            stream.container,
            size_label(stream.total_bytes)
        );
    }
}

/// Print the final state of a session.
pub fn print_session_summary(snapshot: &SessionSnapshot) {
    let state = match snapshot.state {
        SessionState::Completed => style(snapshot.status_text.clone()).green(),
        SessionState::Errored => style(snapshot.status_text.clone()).red(),
        _ => style(snapshot.status_text.clone()).yellow(),
    };

    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Session Summary:").bold());
    println!("  Title:    {}", display_title(&snapshot.title));
    println!("  Quality:  {}", snapshot.quality_label);
    println!("  File:     {}", snapshot.destination.display());
    println!(
        "  Received: {} of {}",
        HumanBytes(snapshot.bytes_received),
        size_label(snapshot.total_bytes)
    );
    println!("  Status:   {}", state);
    println!(
        "  Started:  {}",
        snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{}", style("═".repeat(50)).dim());
}
