pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}

/// Lower-cases a chromosome label and strips a leading `chr`, so that
/// `Chr1`, `chr1` and `1` all refer to the same chromosome.
pub fn normalize_chrom_label(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    match lower.strip_prefix("chr") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}
