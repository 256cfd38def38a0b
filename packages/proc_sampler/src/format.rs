/// Formats a byte count with decimal (power of 1000) units and two decimals.
///
/// Values of at least one gigabyte use `G`, values of at least one megabyte use `M` and
/// everything smaller uses `K`, so small values render as fractional kilobytes.
///
/// # Examples
///
/// ```
/// use proc_sampler::format_bytes;
///
/// assert_eq!(format_bytes(2_500_000_000), "2.50G");
/// assert_eq!(format_bytes(1_000_000), "1.00M");
/// assert_eq!(format_bytes(512), "0.51K");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    #[expect(clippy::cast_precision_loss, reason = "two decimals are all we print")]
    let value = bytes as f64;

    if bytes >= 1_000_000_000 {
        format!("{:.2}G", value / 1e9)
    } else if bytes >= 1_000_000 {
        format!("{:.2}M", value / 1e6)
    } else {
        format!("{:.2}K", value / 1e3)
    }
}
