use std::time::Duration;

use onionskin::View;

use super::{DiffStats, SideInfo, Summary};

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

fn format_side(side: &SideInfo) -> String {
    format!("{} ({}x{})", side.source, side.width, side.height)
}

/// Print a notice for a source that degraded to absent.
pub fn print_notice(msg: &str) {
    println!("  \x1b[33mWARN\x1b[0m  {msg}");
}

/// Status line for the comparison as a whole.
pub fn print_line(summary: &Summary) {
    let time_suffix = format!("  \x1b[2m{}\x1b[0m", format_duration(summary.elapsed));

    match (&summary.previous, &summary.current) {
        (None, None) => {
            println!("  \x1b[2mNONE\x1b[0m  nothing to compare{time_suffix}");
        }
        (None, Some(cur)) => {
            println!(
                "  \x1b[32m NEW\x1b[0m  {}  (no previous version){time_suffix}",
                format_side(cur)
            );
        }
        (Some(prev), None) => {
            println!(
                "  \x1b[31mGONE\x1b[0m  {}  (deleted){time_suffix}",
                format_side(prev)
            );
        }
        (Some(prev), Some(cur)) => match &summary.diff {
            Some(stats) if stats.changed_pixels == 0 => {
                println!(
                    "  \x1b[32mSAME\x1b[0m  {} -> {}{}{time_suffix}",
                    format_side(prev),
                    format_side(cur),
                    diff_suffix(stats),
                );
            }
            Some(stats) => {
                println!(
                    "  \x1b[35mDIFF\x1b[0m  {} -> {}{}{time_suffix}",
                    format_side(prev),
                    format_side(cur),
                    diff_suffix(stats),
                );
            }
            None => {
                println!(
                    "  \x1b[36mVIEW\x1b[0m  {} -> {}{time_suffix}",
                    format_side(prev),
                    format_side(cur)
                );
            }
        },
    }
}

fn diff_suffix(stats: &DiffStats) -> String {
    let mut s = format!(
        "  ({} of {} pixels changed, {:.2}%)",
        stats.changed_pixels,
        stats.total_pixels,
        stats.change_ratio * 100.0
    );
    if let Some((pw, ph, cw, ch)) = stats.dimension_mismatch {
        let ow = pw.min(cw);
        let oh = ph.min(ch);
        s.push_str(&format!(
            "  (dimensions changed: {pw}x{ph} -> {cw}x{ch}, compared {ow}x{oh})"
        ));
    }
    s
}

/// Describe the active mode and the controls it exposes.
pub fn format_controls(view: &View) -> String {
    match view {
        View::OnionSkin { opacity, zoom, pan } => format!(
            "onion skin  {opacity}% new / {}% old  zoom {zoom}%  pan ({}, {})",
            100 - u16::from(*opacity),
            pan.x,
            pan.y
        ),
        View::SideBySide => "side by side".to_string(),
        View::Diff { sensitivity } => format!("diff  sensitivity {sensitivity}"),
    }
}

pub fn print_summary(summary: &Summary) {
    for notice in &summary.notices {
        print_notice(notice);
    }
    print_line(summary);
    if let Some(view) = &summary.view {
        println!("Mode:       {}", format_controls(view));
    }
    if let Some(path) = &summary.output {
        println!("Output:     {path}");
    }
}
