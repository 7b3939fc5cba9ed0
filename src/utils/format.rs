//! Human-readable sizes, speeds and durations for terminal output

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// `512 KB`, `12.3 MB`, `1.50 GB`. Zero or unknown sizes render empty.
pub fn format_file_size(bytes: Option<u64>) -> String {
    let bytes = match bytes {
        Some(b) if b > 0 => b as f64,
        _ => return String::new(),
    };

    if bytes < MIB {
        format!("{:.0} KB", bytes / KIB)
    } else if bytes < GIB {
        format!("{:.1} MB", bytes / MIB)
    } else {
        format!("{:.2} GB", bytes / GIB)
    }
}

pub fn format_speed(bytes_per_sec: Option<f64>) -> String {
    match bytes_per_sec {
        Some(s) if s > 0.0 && s < MIB => format!("{:.0} KB/s", s / KIB),
        Some(s) if s >= MIB => format!("{:.1} MB/s", s / MIB),
        _ => String::new(),
    }
}

/// `42s`, `3m 5s`, `1h 2m`
pub fn format_eta(seconds: Option<f64>) -> String {
    let seconds = match seconds {
        Some(s) if s > 0.0 => s,
        _ => return String::new(),
    };

    if seconds < 60.0 {
        format!("{}s", seconds.round() as u64)
    } else if seconds < 3600.0 {
        let whole = seconds as u64;
        format!("{}m {}s", whole / 60, (seconds % 60.0).round() as u64)
    } else {
        let whole = seconds as u64;
        format!("{}h {}m", whole / 3600, (whole % 3600) / 60)
    }
}
